use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanKind {
    Workout,
    Meal,
}

impl PlanKind {
    pub fn table(self) -> &'static str {
        match self {
            PlanKind::Workout => "workout_plans",
            PlanKind::Meal => "meal_plans",
        }
    }

    /// Column holding the JSON-encoded item list.
    pub fn items_column(self) -> &'static str {
        match self {
            PlanKind::Workout => "exercises",
            PlanKind::Meal => "meals",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlanKind::Workout => "workout plan",
            PlanKind::Meal => "meal plan",
        }
    }
}

/// Plan row as stored; `items` is still the raw encoded text.
#[derive(Debug, Clone, FromRow)]
pub struct PlanRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub items: String,
    pub scheduled_date: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewPlanRow {
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub items: String,
    pub scheduled_date: OffsetDateTime,
}
