use axum::{extract::State, routing::get, Router};
use tracing::instrument;

use super::services::{self, StatsResponse};
use crate::{
    auth::extractors::AuthUser,
    response::{ApiResponse, ApiResult},
    state::AppState,
};

pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/stats", get(get_stats))
}

#[instrument(skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<StatsResponse> {
    let stats = services::collect(&state, user_id).await?;
    Ok(ApiResponse::ok(stats))
}
