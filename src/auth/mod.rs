use axum::Router;

use crate::state::AppState;

pub mod claims;
mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
