use tracing::info;
use uuid::Uuid;

use super::{
    dto::{CreateBloggerRequest, ListBloggersQuery, ListBloggersResponse, UpdateBloggerRequest},
    repo_types::Blogger,
};
use crate::{
    error::AppError, notes::dto::BatchResult, settings::services::ensure_enabled,
    state::AppState,
};

pub async fn upsert_blogger(
    state: &AppState,
    owner: Uuid,
    req: CreateBloggerRequest,
) -> Result<Blogger, AppError> {
    let draft = req.into_draft()?;
    ensure_enabled(state, owner).await?;
    let blogger = state.bloggers.upsert(owner, draft).await?;
    info!(user_id = %owner, blogger_id = %blogger.id, "blogger stored");
    Ok(blogger)
}

pub async fn batch_upsert_bloggers(
    state: &AppState,
    owner: Uuid,
    reqs: Vec<CreateBloggerRequest>,
) -> Result<BatchResult, AppError> {
    let drafts = reqs
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            r.into_draft().map_err(|e| match e {
                AppError::Validation(msg) => AppError::Validation(format!("bloggers[{i}]: {msg}")),
                other => other,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if drafts.is_empty() {
        return Ok(BatchResult { count: 0, status: "success" });
    }

    ensure_enabled(state, owner).await?;
    let count = drafts.len();
    for draft in drafts {
        state.bloggers.upsert(owner, draft).await?;
    }
    info!(user_id = %owner, count, "blogger batch stored");
    Ok(BatchResult { count, status: "success" })
}

pub async fn list_bloggers(
    state: &AppState,
    owner: Uuid,
    query: ListBloggersQuery,
) -> Result<ListBloggersResponse, AppError> {
    let page = query.page();
    let (bloggers, total) = state.bloggers.list(owner, page).await?;
    Ok(ListBloggersResponse {
        bloggers,
        total,
        page: page.page,
        size: page.size,
        total_pages: page.total_pages(total),
    })
}

pub async fn get_blogger(state: &AppState, owner: Uuid, id: Uuid) -> Result<Blogger, AppError> {
    state
        .bloggers
        .find(owner, id)
        .await?
        .ok_or_else(|| AppError::not_found("blogger"))
}

pub async fn get_by_platform_id(
    state: &AppState,
    owner: Uuid,
    platform_id: &str,
) -> Result<Blogger, AppError> {
    state
        .bloggers
        .find_by_platform_id(owner, platform_id)
        .await?
        .ok_or_else(|| AppError::not_found("blogger"))
}

pub async fn update_blogger(
    state: &AppState,
    owner: Uuid,
    id: Uuid,
    patch: UpdateBloggerRequest,
) -> Result<Blogger, AppError> {
    let mut blogger = get_blogger(state, owner, id).await?;
    patch.apply(&mut blogger)?;
    state
        .bloggers
        .update(&blogger)
        .await?
        .ok_or_else(|| AppError::not_found("blogger"))
}

pub async fn delete_blogger(state: &AppState, owner: Uuid, id: Uuid) -> Result<(), AppError> {
    if !state.bloggers.delete(owner, id).await? {
        return Err(AppError::not_found("blogger"));
    }
    info!(user_id = %owner, blogger_id = %id, "blogger deleted");
    Ok(())
}
