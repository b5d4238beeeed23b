use crate::state::AppState;
use axum::Router;

mod dto;
pub(crate) mod extractors;
pub mod handlers;
mod repo;
pub mod repo_types;
mod services;
pub mod token;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
