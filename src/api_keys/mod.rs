pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod worker;

pub use repo::{ApiKeyRepo, PgApiKeyRepo};
pub use worker::LastUsedTracker;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::api_key_routes()
}
