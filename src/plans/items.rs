use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use super::repo_types::PlanKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub sets: i32,
    pub reps: i32,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub name: String,
    pub time: String,
    pub calories: i32,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub ingredients: String,
}

/// A problem with one field of one item.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: &'static str,
}

/// Element type of a plan's item list.
pub trait PlanItem: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: PlanKind;

    fn check(&self) -> Result<(), FieldError>;
}

fn not_blank(field: &'static str, v: &str) -> Result<(), FieldError> {
    if v.trim().is_empty() {
        return Err(FieldError { field, reason: "must not be empty" });
    }
    Ok(())
}

fn non_negative_int(field: &'static str, v: i32) -> Result<(), FieldError> {
    if v < 0 {
        return Err(FieldError { field, reason: "must be >= 0" });
    }
    Ok(())
}

fn non_negative(field: &'static str, v: f64) -> Result<(), FieldError> {
    if !v.is_finite() || v < 0.0 {
        return Err(FieldError { field, reason: "must be a finite number >= 0" });
    }
    Ok(())
}

impl PlanItem for Exercise {
    const KIND: PlanKind = PlanKind::Workout;

    fn check(&self) -> Result<(), FieldError> {
        not_blank("name", &self.name)?;
        non_negative_int("sets", self.sets)?;
        non_negative_int("reps", self.reps)?;
        non_negative("weight", self.weight)
    }
}

impl PlanItem for Meal {
    const KIND: PlanKind = PlanKind::Meal;

    fn check(&self) -> Result<(), FieldError> {
        not_blank("name", &self.name)?;
        non_negative_int("calories", self.calories)?;
        non_negative("protein", self.protein)?;
        non_negative("carbs", self.carbs)?;
        non_negative("fats", self.fats)
    }
}

#[derive(Debug, Error)]
pub enum ItemsError {
    #[error("item list is not valid JSON for this plan type: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),
}

/// Validates every item; the message names the first offending field, e.g. `meals[1].calories`.
pub fn validate_items<I: PlanItem>(items: &[I]) -> Result<(), ItemsError> {
    for (idx, item) in items.iter().enumerate() {
        if let Err(FieldError { field, reason }) = item.check() {
            return Err(ItemsError::Invalid(format!(
                "{}[{idx}].{field} {reason}",
                I::KIND.items_column()
            )));
        }
    }
    Ok(())
}

pub fn encode_items<I: PlanItem>(items: &[I]) -> Result<String, ItemsError> {
    Ok(serde_json::to_string(items)?)
}

/// Decodes stored item text and re-validates it.
pub fn decode_items<I: PlanItem>(raw: &str) -> Result<Vec<I>, ItemsError> {
    let items: Vec<I> = serde_json::from_str(raw)?;
    validate_items(&items)?;
    Ok(items)
}
