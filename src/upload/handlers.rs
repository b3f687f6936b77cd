use axum::{extract::State, routing::get, Router};
use tracing::instrument;

use super::services::{self, UploadToken};
use crate::{
    auth::extractors::SyncUser,
    response::{ApiResponse, ApiResult},
    state::AppState,
};

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/upload/token", get(upload_token))
        .route("/qiniu/upload-token", get(upload_token))
}

#[instrument(skip(state))]
pub async fn upload_token(
    State(state): State<AppState>,
    SyncUser(user_id): SyncUser,
) -> ApiResult<UploadToken> {
    let token = services::issue_token(&state, user_id).await?;
    Ok(ApiResponse::ok(token))
}
