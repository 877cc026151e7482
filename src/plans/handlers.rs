use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{
        CreateMealPlanRequest, CreatePlanRequest, CreateWorkoutPlanRequest, MealPlanResponse,
        WorkoutPlanResponse,
    },
    items::{Exercise, Meal, PlanItem},
    repo::{Plan, PlanRepository},
    services::create_for_client,
};
use crate::{
    auth::{extractors::AuthUser, policy::plan_list_scope},
    db::Pagination,
    error::AppError,
    state::AppState,
    users::repo_types::User,
};

pub fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/workout-plans/", get(list_workout_plans).post(create_workout_plan))
        .route("/workout-plans/user", get(list_my_workout_plans))
        .route("/meal-plans/", get(list_meal_plans).post(create_meal_plan))
        .route("/meal-plans/user", get(list_my_meal_plans))
}

async fn list_scoped<I: PlanItem>(
    state: &AppState,
    user: &User,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Vec<Plan<I>>, AppError> {
    let Query(p) = query?;
    PlanRepository::<I>::new(state.store.as_ref())
        .list(plan_list_scope(user), p.page()?)
        .await
}

async fn list_own<I: PlanItem>(
    state: &AppState,
    user_id: i64,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Vec<Plan<I>>, AppError> {
    let Query(p) = query?;
    PlanRepository::<I>::new(state.store.as_ref())
        .list_for_user(user_id, p.page()?)
        .await
}

async fn create_from<R: CreatePlanRequest>(
    state: &AppState,
    admin: &User,
    payload: Result<Json<R>, JsonRejection>,
) -> Result<Plan<R::Item>, AppError> {
    let Json(body) = payload?;
    let client_id = body.target_user();
    let plan = create_for_client(state.store.as_ref(), admin, body.into_new_plan()).await?;
    info!(plan_id = plan.id, admin_id = admin.id, client_id, "plan created by admin");
    Ok(plan)
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn list_workout_plans(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<WorkoutPlanResponse>>, AppError> {
    let plans = list_scoped::<Exercise>(&state, &user, query).await?;
    Ok(Json(plans.into_iter().map(Into::into).collect()))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn list_my_workout_plans(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<WorkoutPlanResponse>>, AppError> {
    let plans = list_own::<Exercise>(&state, user.id, query).await?;
    Ok(Json(plans.into_iter().map(Into::into).collect()))
}

#[instrument(skip_all, fields(admin_id = user.id))]
pub async fn create_workout_plan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateWorkoutPlanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WorkoutPlanResponse>), AppError> {
    let plan = create_from(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(plan.into())))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn list_meal_plans(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<MealPlanResponse>>, AppError> {
    let plans = list_scoped::<Meal>(&state, &user, query).await?;
    Ok(Json(plans.into_iter().map(Into::into).collect()))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn list_my_meal_plans(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<MealPlanResponse>>, AppError> {
    let plans = list_own::<Meal>(&state, user.id, query).await?;
    Ok(Json(plans.into_iter().map(Into::into).collect()))
}

#[instrument(skip_all, fields(admin_id = user.id))]
pub async fn create_meal_plan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateMealPlanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MealPlanResponse>), AppError> {
    let plan = create_from(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(plan.into())))
}
