use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateBloggerRequest, ListBloggersQuery, ListBloggersResponse, UpdateBloggerRequest},
    repo_types::Blogger,
    services,
};
use crate::{
    auth::extractors::{AuthUser, SyncUser},
    notes::dto::{BatchResult, Deleted},
    response::{ApiResponse, ApiResult, AppJson, AppPath, AppQuery},
    state::AppState,
};

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/bloggers", post(upsert_blogger))
        .route("/bloggers/upsert", post(upsert_blogger))
        .route("/bloggers/batch", post(batch_upsert))
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/bloggers", get(list_bloggers))
        .route("/bloggers/platform/:platform_id", get(get_by_platform_id))
        .route("/bloggers/xhs/:platform_id", get(get_by_platform_id))
        .route(
            "/bloggers/:id",
            get(get_blogger).put(update_blogger).delete(delete_blogger),
        )
}

#[instrument(skip(state, payload))]
pub async fn upsert_blogger(
    State(state): State<AppState>,
    SyncUser(user_id): SyncUser,
    AppJson(payload): AppJson<CreateBloggerRequest>,
) -> ApiResult<Blogger> {
    let blogger = services::upsert_blogger(&state, user_id, payload).await?;
    Ok(ApiResponse::ok(blogger))
}

#[instrument(skip(state, payload), fields(count = payload.len()))]
pub async fn batch_upsert(
    State(state): State<AppState>,
    SyncUser(user_id): SyncUser,
    AppJson(payload): AppJson<Vec<CreateBloggerRequest>>,
) -> ApiResult<BatchResult> {
    let result = services::batch_upsert_bloggers(&state, user_id, payload).await?;
    Ok(ApiResponse::ok(result))
}

#[instrument(skip(state, query))]
pub async fn list_bloggers(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(query): AppQuery<ListBloggersQuery>,
) -> ApiResult<ListBloggersResponse> {
    let page = services::list_bloggers(&state, user_id, query).await?;
    Ok(ApiResponse::ok(page))
}

#[instrument(skip(state))]
pub async fn get_blogger(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Blogger> {
    let blogger = services::get_blogger(&state, user_id, id).await?;
    Ok(ApiResponse::ok(blogger))
}

#[instrument(skip(state))]
pub async fn get_by_platform_id(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(platform_id): AppPath<String>,
) -> ApiResult<Blogger> {
    let blogger = services::get_by_platform_id(&state, user_id, &platform_id).await?;
    Ok(ApiResponse::ok(blogger))
}

#[instrument(skip(state, payload))]
pub async fn update_blogger(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateBloggerRequest>,
) -> ApiResult<Blogger> {
    let blogger = services::update_blogger(&state, user_id, id, payload).await?;
    Ok(ApiResponse::ok(blogger))
}

#[instrument(skip(state))]
pub async fn delete_blogger(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Deleted> {
    services::delete_blogger(&state, user_id, id).await?;
    Ok(ApiResponse::ok(Deleted { id, status: "deleted" }))
}
