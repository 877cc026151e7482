use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{AssignmentResponse, CreateUserRequest, UserListQuery},
    repo_types::User,
    services::register_user,
};
use crate::{
    assignments::AssignmentRegistry,
    auth::{
        extractors::{AuthUser, MaybeAuthUser},
        policy::require_admin,
    },
    db::Pagination,
    error::AppError,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/", post(create_user).get(list_users))
        .route("/users/me", get(read_users_me))
        .route("/users/assigned", get(list_assigned_users))
        .route("/users/assign/:user_id", post(assign_user))
}

#[instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let Json(body) = payload?;
    let user = register_user(
        state.store.as_ref(),
        state.config.admin_code.as_deref(),
        body,
        caller.as_ref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn read_users_me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

#[instrument(skip_all, fields(admin_id = user.id))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<UserListQuery>, QueryRejection>,
) -> Result<Json<Vec<User>>, AppError> {
    require_admin(&user, "view users")?;
    let Query(q) = query?;
    let page = Pagination { skip: q.skip, limit: q.limit }.page()?;

    let users = if q.assigned {
        AssignmentRegistry::new(state.store.as_ref())
            .list_clients_page(user.id, page)
            .await?
    } else {
        state.store.list_non_admin_users(page).await?
    };
    Ok(Json(users))
}

#[instrument(skip_all, fields(admin_id = user.id))]
pub async fn list_assigned_users(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<User>>, AppError> {
    require_admin(&user, "view assigned users")?;
    let Query(p) = query?;
    let clients = AssignmentRegistry::new(state.store.as_ref())
        .list_clients_page(user.id, p.page()?)
        .await?;
    Ok(Json(clients))
}

#[instrument(skip_all, fields(admin_id = user.id))]
pub async fn assign_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    client_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<AssignmentResponse>, AppError> {
    require_admin(&user, "assign users")?;
    let Path(client_id) = client_id?;
    let assignment = AssignmentRegistry::new(state.store.as_ref())
        .assign(user.id, client_id)
        .await?;
    info!(client_id, created = assignment.created, "assignment confirmed");
    Ok(Json(AssignmentResponse {
        admin_id: assignment.admin_id,
        created: assignment.created,
        user: assignment.client,
    }))
}
