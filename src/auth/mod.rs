use crate::state::AppState;
use axum::Router;

mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod policy;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
