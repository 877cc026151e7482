use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::client::DraftError;
use super::dto::{DraftRequest, DraftResponse, DraftedMealPlan, DraftedPlanView, SavedDraftResponse};
use crate::{
    auth::{extractors::AuthUser, policy::require_admin},
    error::AppError,
    plans::{items::Meal, repo::NewPlan, services::create_for_client},
    state::AppState,
    users::repo_types::User,
};

pub fn drafting_routes() -> Router<AppState> {
    Router::new()
        .route("/meal-plans/ai-generate/", post(generate_meal_plan))
        .route("/meal-plans/ai-generate-and-save/", post(generate_and_save_meal_plan))
}

async fn draft_for_client(
    state: &AppState,
    admin: &User,
    req: &DraftRequest,
) -> Result<DraftedMealPlan, AppError> {
    require_admin(admin, "generate meal plans")?;
    req.validate()?;
    if state.store.find_user(req.user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", req.user_id)));
    }

    let drafted = state
        .drafter
        .draft(req)
        .await
        .and_then(|plan| plan.check().map(|_| plan).map_err(DraftError::InvalidOutput))
        .map_err(|e| {
            warn!(client_id = req.user_id, error = %e, "meal plan drafting failed");
            AppError::from(e)
        })?;
    Ok(drafted)
}

#[instrument(skip_all, fields(admin_id = user.id))]
pub async fn generate_meal_plan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<DraftRequest>, JsonRejection>,
) -> Result<Json<DraftResponse>, AppError> {
    let Json(req) = payload?;
    let drafted = draft_for_client(&state, &user, &req).await?;
    info!(client_id = req.user_id, meals = drafted.meals.len(), "meal plan drafted");

    Ok(Json(DraftResponse {
        meal_plan: DraftedPlanView {
            title: drafted.title,
            description: drafted.description,
            scheduled_date: req.scheduled_date,
            meals: drafted.meals,
            user_id: req.user_id,
        },
        reasoning: drafted.reasoning,
    }))
}

#[instrument(skip_all, fields(admin_id = user.id))]
pub async fn generate_and_save_meal_plan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<DraftRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SavedDraftResponse>), AppError> {
    let Json(req) = payload?;
    let drafted = draft_for_client(&state, &user, &req).await?;

    let new = NewPlan::<Meal> {
        owner_id: req.user_id,
        title: drafted.title,
        description: Some(drafted.description),
        scheduled_date: req.scheduled_date,
        items: drafted.meals,
    };
    let plan = create_for_client(state.store.as_ref(), &user, new).await?;
    info!(plan_id = plan.id, client_id = req.user_id, "drafted meal plan saved");

    Ok((
        StatusCode::CREATED,
        Json(SavedDraftResponse {
            meal_plan: plan.into(),
            reasoning: drafted.reasoning,
        }),
    ))
}
