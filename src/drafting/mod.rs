use crate::state::AppState;
use axum::Router;

mod client;
pub mod dto;
pub mod handlers;

pub use client::{DraftError, OpenAiDrafter, PlanDrafter};

pub fn router() -> Router<AppState> {
    handlers::drafting_routes()
}
