pub mod handlers;
pub mod services;
pub mod signer;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::upload_routes()
}
