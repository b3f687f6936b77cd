use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use repo::{PgSettingsRepo, SettingsRepo};

pub fn router() -> Router<AppState> {
    handlers::settings_routes()
}
