use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateUserRequest, UpdateUserRequest},
    repo_types::User,
    services,
};
use crate::{
    auth::extractors::AuthUser,
    response::{ApiResponse, ApiResult, AppJson, AppPath},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/sync/:external_id", get(sync_user))
        .route("/users/auth-center/:external_id", get(get_by_external_id))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> ApiResult<User> {
    let user = services::create_user(&state, payload).await?;
    Ok(ApiResponse::ok(user))
}

#[instrument(skip(state))]
pub async fn sync_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    AppPath(external_id): AppPath<String>,
) -> ApiResult<User> {
    let user = services::sync_own(&state, caller, &external_id).await?;
    Ok(ApiResponse::ok(user))
}

#[instrument(skip(state))]
pub async fn get_by_external_id(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    AppPath(external_id): AppPath<String>,
) -> ApiResult<User> {
    let user = services::get_own_by_external_id(&state, caller, &external_id).await?;
    Ok(ApiResponse::ok(user))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<User> {
    let user = services::get_own(&state, caller, id).await?;
    Ok(ApiResponse::ok(user))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> ApiResult<User> {
    let user = services::update_own(&state, caller, id, payload).await?;
    Ok(ApiResponse::ok(user))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<()> {
    services::delete_own(&state, caller, id).await?;
    Ok(ApiResponse::ok(()))
}
