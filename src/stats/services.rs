use serde::Serialize;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_notes: i64,
    pub total_bloggers: i64,
    pub total_likes: i64,
    pub total_collects: i64,
    pub total_comments: i64,
    pub image_notes: i64,
    pub video_notes: i64,
}

/// Computed on every request; nothing is cached.
pub async fn collect(state: &AppState, owner: Uuid) -> Result<StatsResponse, AppError> {
    let totals = state.notes.totals(owner).await?;
    let total_bloggers = state.bloggers.count(owner).await?;
    Ok(StatsResponse {
        total_notes: totals.total_notes,
        total_bloggers,
        total_likes: totals.total_likes,
        total_collects: totals.total_collects,
        total_comments: totals.total_comments,
        image_notes: totals.image_notes,
        video_notes: totals.video_notes,
    })
}
