use axum::{
    extract::State,
    routing::{delete, get, patch},
    Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{ApiKeyView, CreateApiKeyRequest, ValidatedKey},
    repo_types::ApiKeyStats,
    services,
};
use crate::{
    auth::extractors::{ApiKeyUser, AuthUser},
    notes::dto::Deleted,
    response::{ApiResponse, ApiResult, AppJson, AppPath},
    state::AppState,
};

pub fn api_key_routes() -> Router<AppState> {
    Router::new()
        .route("/api-keys", get(list_keys).post(create_key))
        .route("/api-keys/get-or-create", get(get_or_create))
        .route("/api-keys/stats", get(key_stats))
        .route("/api-keys/validate", get(validate_key))
        .route("/api-keys/:id", delete(delete_key))
        .route("/api-keys/:id/deactivate", patch(deactivate_key))
}

#[instrument(skip(state))]
pub async fn get_or_create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<ApiKeyView> {
    let key = services::get_or_create(&state, user_id).await?;
    Ok(ApiResponse::ok(key))
}

#[instrument(skip(state, payload))]
pub async fn create_key(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CreateApiKeyRequest>,
) -> ApiResult<ApiKeyView> {
    let key = services::create(&state, user_id, payload).await?;
    Ok(ApiResponse::ok(key))
}

#[instrument(skip(state))]
pub async fn list_keys(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Vec<ApiKeyView>> {
    let keys = services::list(&state, user_id).await?;
    Ok(ApiResponse::ok(keys))
}

#[instrument(skip(state))]
pub async fn key_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<ApiKeyStats> {
    let stats = services::stats(&state, user_id).await?;
    Ok(ApiResponse::ok(stats))
}

#[instrument(skip(state))]
pub async fn deactivate_key(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Deleted> {
    services::deactivate(&state, user_id, id).await?;
    Ok(ApiResponse::ok(Deleted { id, status: "deactivated" }))
}

#[instrument(skip(state))]
pub async fn delete_key(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Deleted> {
    services::delete(&state, user_id, id).await?;
    Ok(ApiResponse::ok(Deleted { id, status: "deleted" }))
}

/// The extractor already validated the key; this echoes the owner back to the plugin.
pub async fn validate_key(ApiKeyUser(user_id): ApiKeyUser) -> ApiResult<ValidatedKey> {
    Ok(ApiResponse::ok(ValidatedKey { valid: true, user_id }))
}
