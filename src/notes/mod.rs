pub mod dto;
pub mod handlers;
pub mod reconcile;
pub mod repo;
pub mod repo_types;
pub mod services;

pub(crate) use dto::{blank_to_none, is_http_url};
pub use repo::{NoteRepo, PgNoteRepo};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}
