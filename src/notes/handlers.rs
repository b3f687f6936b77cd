use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{
        BatchResult, CreateNoteRequest, Deleted, ListNotesQuery, ListNotesResponse,
        UpdateNoteRequest,
    },
    repo_types::Note,
    services,
};
use crate::{
    auth::extractors::{AuthUser, SyncUser},
    response::{ApiResponse, ApiResult, AppJson, AppPath, AppQuery},
    state::AppState,
};

/// Extension-facing capture endpoints.
pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/notes", post(create_note))
        .route("/notes/batch", post(batch_create))
}

/// Dashboard-facing endpoints.
pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/notes", get(list_notes))
        .route(
            "/notes/:id",
            get(get_note).put(update_note).delete(delete_note),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_note(
    State(state): State<AppState>,
    SyncUser(user_id): SyncUser,
    AppJson(payload): AppJson<CreateNoteRequest>,
) -> ApiResult<Note> {
    let note = services::create_note(&state, user_id, payload).await?;
    Ok(ApiResponse::ok(note))
}

#[instrument(skip(state, payload), fields(count = payload.len()))]
pub async fn batch_create(
    State(state): State<AppState>,
    SyncUser(user_id): SyncUser,
    AppJson(payload): AppJson<Vec<CreateNoteRequest>>,
) -> ApiResult<BatchResult> {
    let result = services::batch_create_notes(&state, user_id, payload).await?;
    Ok(ApiResponse::ok(result))
}

#[instrument(skip(state, query))]
pub async fn list_notes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(query): AppQuery<ListNotesQuery>,
) -> ApiResult<ListNotesResponse> {
    let page = services::list_notes(&state, user_id, query).await?;
    Ok(ApiResponse::ok(page))
}

#[instrument(skip(state))]
pub async fn get_note(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Note> {
    let note = services::get_note(&state, user_id, id).await?;
    Ok(ApiResponse::ok(note))
}

#[instrument(skip(state, payload))]
pub async fn update_note(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateNoteRequest>,
) -> ApiResult<Note> {
    let note = services::update_note(&state, user_id, id, payload).await?;
    Ok(ApiResponse::ok(note))
}

#[instrument(skip(state))]
pub async fn delete_note(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Deleted> {
    services::delete_note(&state, user_id, id).await?;
    Ok(ApiResponse::ok(Deleted { id, status: "deleted" }))
}
