use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::instrument;

use super::{repo_types::UserSettings, services};
use crate::{
    auth::extractors::AuthUser,
    response::{ApiResponse, ApiResult, AppJson},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ToggleCollectionRequest {
    pub enabled: bool,
}

pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/user-settings", get(get_settings))
        .route("/user-settings/toggle-collection", post(toggle_collection))
}

#[instrument(skip(state))]
pub async fn get_settings(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<UserSettings> {
    let settings = services::get_settings(&state, user_id).await?;
    Ok(ApiResponse::ok(settings))
}

#[instrument(skip(state))]
pub async fn toggle_collection(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(body): AppJson<ToggleCollectionRequest>,
) -> ApiResult<UserSettings> {
    let settings = services::toggle_collection(&state, user_id, body.enabled).await?;
    Ok(ApiResponse::ok(settings))
}
