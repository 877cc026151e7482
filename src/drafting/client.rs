use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::dto::{DraftRequest, DraftedMealPlan};
use crate::{config::DraftingConfig, error::AppError};

pub const TOOL_NAME: &str = "create_meal_plan";

const SYSTEM_PROMPT: &str = "You are a professional nutritionist who writes practical meal plans.";

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("meal plan drafting is not configured")]
    Unavailable,

    #[error("drafting request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("drafting service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("drafting service returned an unusable plan: {0}")]
    InvalidOutput(String),
}

impl DraftError {
    fn is_retryable(&self) -> bool {
        match self {
            DraftError::Transport(_) => true,
            DraftError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub const UNAVAILABLE_DETAIL: &str = "Meal plan drafting is unavailable";

// Upstream bodies and URLs stay in the logs.
impl From<DraftError> for AppError {
    fn from(_: DraftError) -> Self {
        AppError::Upstream(UNAVAILABLE_DETAIL.into())
    }
}

/// Produces a meal plan draft from a free-text brief. Nothing is persisted.
#[async_trait]
pub trait PlanDrafter: Send + Sync {
    async fn draft(&self, req: &DraftRequest) -> Result<DraftedMealPlan, DraftError>;
}

/// Chat-completions client that forces a single `create_meal_plan` tool call.
pub struct OpenAiDrafter {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    max_retries: u32,
}

impl OpenAiDrafter {
    pub fn new(cfg: &DraftingConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .build()
            .context("failed to build drafting http client")?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            base_url: cfg.base_url.clone(),
            max_retries: cfg.max_retries,
        })
    }

    fn request_body(&self, req: &DraftRequest) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user_prompt(req)},
            ],
            "tools": [{"type": "function", "function": tool_schema()}],
            "tool_choice": {"type": "function", "function": {"name": TOOL_NAME}},
        })
    }

    async fn send_once(&self, api_key: &str, body: &Value) -> Result<Value, DraftError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read body".to_string());
            return Err(DraftError::Status { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| DraftError::InvalidOutput(format!("response is not JSON: {e}")))
    }
}

#[async_trait]
impl PlanDrafter for OpenAiDrafter {
    #[instrument(skip_all, fields(user_id = req.user_id, model = %self.model))]
    async fn draft(&self, req: &DraftRequest) -> Result<DraftedMealPlan, DraftError> {
        let api_key = self.api_key.as_deref().ok_or(DraftError::Unavailable)?;
        let body = self.request_body(req);

        let mut attempt = 0;
        let completion = loop {
            match self.send_once(api_key, &body).await {
                Ok(v) => break v,
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, error = %e, "drafting call failed, retrying");
                }
                Err(e) => return Err(e),
            }
        };

        let plan = parse_completion(&completion)?;
        debug!(meals = plan.meals.len(), "meal plan drafted");
        Ok(plan)
    }
}

fn tool_schema() -> Value {
    json!({
        "name": TOOL_NAME,
        "description": "Create a structured meal plan that follows the given requirements",
        "parameters": {
            "type": "object",
            "properties": {
                "title": {"type": "string", "description": "Short descriptive title"},
                "description": {"type": "string", "description": "Goals and overview of the plan"},
                "meals": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "time": {"type": "string"},
                            "calories": {"type": "integer"},
                            "protein": {"type": "number"},
                            "carbs": {"type": "number"},
                            "fats": {"type": "number"},
                            "ingredients": {"type": "string"}
                        },
                        "required": ["name", "time", "calories", "protein", "carbs", "fats", "ingredients"]
                    }
                },
                "reasoning": {"type": "string", "description": "Why these meals were chosen"}
            },
            "required": ["title", "description", "meals", "reasoning"]
        }
    })
}

fn target<T: std::fmt::Display>(value: Option<T>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v}{unit}"),
        None => "not specified".to_string(),
    }
}

pub(crate) fn user_prompt(req: &DraftRequest) -> String {
    format!(
        "Write a meal plan for this brief: {}\n\n\
         Meals per day: {}\n\
         Dietary preferences: {}\n\
         Daily targets: calories {}, protein {}, carbs {}, fats {}\n\n\
         Hit the targets where given, respect the preferences, keep meals realistic, \
         list concrete ingredients for each meal and spread macros across the day.",
        req.prompt.trim(),
        req.meals_per_day,
        req.dietary_preferences.as_deref().unwrap_or("none"),
        target(req.calories_target, " kcal"),
        target(req.protein_target, "g"),
        target(req.carbs_target, "g"),
        target(req.fats_target, "g"),
    )
}

/// Extracts the `create_meal_plan` arguments from a chat completion.
///
/// Reads `tool_calls` first and falls back to the legacy `function_call` field.
pub fn parse_completion(completion: &Value) -> Result<DraftedMealPlan, DraftError> {
    let message = &completion["choices"][0]["message"];
    let call = if message["tool_calls"][0]["function"].is_object() {
        &message["tool_calls"][0]["function"]
    } else {
        &message["function_call"]
    };

    if let Some(name) = call["name"].as_str() {
        if name != TOOL_NAME {
            return Err(DraftError::InvalidOutput(format!("unexpected function `{name}`")));
        }
    }
    let args = call["arguments"]
        .as_str()
        .ok_or_else(|| DraftError::InvalidOutput(format!("no {TOOL_NAME} call in response")))?;

    let plan: DraftedMealPlan =
        serde_json::from_str(args).map_err(|e| DraftError::InvalidOutput(e.to_string()))?;
    plan.check().map_err(DraftError::InvalidOutput)?;
    Ok(plan)
}
