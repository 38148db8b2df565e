use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod query;
mod repo;

pub fn router() -> Router<AppState> {
    handlers::metrics_routes()
}
