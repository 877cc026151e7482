use serde::{de, Deserialize, Deserializer, Serialize};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};

use super::{
    items::{Exercise, Meal, PlanItem},
    repo::{NewPlan, Plan},
};

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (read as UTC) or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_scheduled_date(raw: &str) -> Result<OffsetDateTime, String> {
    let raw = raw.trim();
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(dt);
    }
    if let Ok(naive) = PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Ok(naive.assume_utc());
    }
    if let Ok(day) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Ok(day.midnight().assume_utc());
    }
    Err(format!("invalid date `{raw}`: expected RFC 3339 or YYYY-MM-DD"))
}

pub fn de_scheduled_date<'de, D: Deserializer<'de>>(d: D) -> Result<OffsetDateTime, D::Error> {
    let raw = String::deserialize(d)?;
    parse_scheduled_date(&raw).map_err(de::Error::custom)
}

/// Form-driven clients post ids as strings.
pub fn de_user_id<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }
    match Raw::deserialize(d)? {
        Raw::Int(v) => Ok(v),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid user id `{s}`"))),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateWorkoutPlanRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(alias = "date", deserialize_with = "de_scheduled_date")]
    pub scheduled_date: OffsetDateTime,
    pub exercises: Vec<Exercise>,
    #[serde(alias = "assigned_user_id", deserialize_with = "de_user_id")]
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateMealPlanRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(alias = "date", deserialize_with = "de_scheduled_date")]
    pub scheduled_date: OffsetDateTime,
    pub meals: Vec<Meal>,
    #[serde(alias = "assigned_user_id", deserialize_with = "de_user_id")]
    pub user_id: i64,
}

/// Common view over both create payloads.
pub trait CreatePlanRequest {
    type Item: PlanItem;

    fn target_user(&self) -> i64;
    fn into_new_plan(self) -> NewPlan<Self::Item>;
}

impl CreatePlanRequest for CreateWorkoutPlanRequest {
    type Item = Exercise;

    fn target_user(&self) -> i64 {
        self.user_id
    }

    fn into_new_plan(self) -> NewPlan<Exercise> {
        NewPlan {
            owner_id: self.user_id,
            title: self.title,
            description: self.description,
            scheduled_date: self.scheduled_date,
            items: self.exercises,
        }
    }
}

impl CreatePlanRequest for CreateMealPlanRequest {
    type Item = Meal;

    fn target_user(&self) -> i64 {
        self.user_id
    }

    fn into_new_plan(self) -> NewPlan<Meal> {
        NewPlan {
            owner_id: self.user_id,
            title: self.title,
            description: self.description,
            scheduled_date: self.scheduled_date,
            items: self.meals,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WorkoutPlanResponse {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub exercises: Vec<Exercise>,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Plan<Exercise>> for WorkoutPlanResponse {
    fn from(p: Plan<Exercise>) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            title: p.title,
            description: p.description,
            exercises: p.items,
            scheduled_date: p.scheduled_date,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MealPlanResponse {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub meals: Vec<Meal>,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Plan<Meal>> for MealPlanResponse {
    fn from(p: Plan<Meal>) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            title: p.title,
            description: p.description,
            meals: p.items,
            scheduled_date: p.scheduled_date,
            created_at: p.created_at,
        }
    }
}
