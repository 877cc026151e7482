use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    error::AppError,
    plans::{
        dto::{de_scheduled_date, de_user_id, MealPlanResponse},
        items::{validate_items, Meal},
    },
};

pub const MAX_MEALS_PER_DAY: u32 = 10;

/// Request body for both drafting endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftRequest {
    pub prompt: String,
    #[serde(default = "default_meals_per_day")]
    pub meals_per_day: u32,
    #[serde(default)]
    pub dietary_preferences: Option<String>,
    #[serde(default)]
    pub calories_target: Option<i32>,
    #[serde(default)]
    pub protein_target: Option<f64>,
    #[serde(default)]
    pub carbs_target: Option<f64>,
    #[serde(default)]
    pub fats_target: Option<f64>,
    #[serde(alias = "date", deserialize_with = "de_scheduled_date")]
    pub scheduled_date: OffsetDateTime,
    #[serde(alias = "assigned_user_id", deserialize_with = "de_user_id")]
    pub user_id: i64,
}

fn default_meals_per_day() -> u32 {
    3
}

impl DraftRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.prompt.trim().is_empty() {
            return Err(AppError::Validation("prompt must not be empty".into()));
        }
        if !(1..=MAX_MEALS_PER_DAY).contains(&self.meals_per_day) {
            return Err(AppError::Validation(format!(
                "meals_per_day must be between 1 and {MAX_MEALS_PER_DAY}"
            )));
        }
        if self.calories_target.is_some_and(|c| c < 0) {
            return Err(AppError::Validation("calories_target must be >= 0".into()));
        }
        for (field, target) in [
            ("protein_target", self.protein_target),
            ("carbs_target", self.carbs_target),
            ("fats_target", self.fats_target),
        ] {
            if target.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(AppError::Validation(format!("{field} must be a finite number >= 0")));
            }
        }
        Ok(())
    }
}

/// Arguments of the `create_meal_plan` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftedMealPlan {
    pub title: String,
    pub description: String,
    pub meals: Vec<Meal>,
    pub reasoning: String,
}

impl DraftedMealPlan {
    /// Rejects drafts that could not be stored as a meal plan.
    pub fn check(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("plan has no title".into());
        }
        if self.meals.is_empty() {
            return Err("plan has no meals".into());
        }
        validate_items(&self.meals).map_err(|e| e.to_string())
    }
}

/// Unsaved draft, shaped like a meal-plan create payload.
#[derive(Debug, Serialize)]
pub struct DraftedPlanView {
    pub title: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_date: OffsetDateTime,
    pub meals: Vec<Meal>,
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub meal_plan: DraftedPlanView,
    pub reasoning: String,
}

#[derive(Debug, Serialize)]
pub struct SavedDraftResponse {
    pub meal_plan: MealPlanResponse,
    pub reasoning: String,
}
