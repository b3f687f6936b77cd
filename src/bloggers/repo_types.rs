use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Author profile captured from the source platform, one per (owner, platform id).
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Blogger {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform_id: String,
    pub blogger_name: String,
    pub avatar_url: Option<String>,
    pub description: String,
    pub followers_count: i64,
    pub blogger_url: Option<String>,
    pub capture_timestamp: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BloggerDraft {
    pub platform_id: String,
    pub blogger_name: String,
    pub avatar_url: Option<String>,
    pub description: String,
    pub followers_count: i64,
    pub blogger_url: Option<String>,
    pub capture_timestamp: i64,
}

impl Blogger {
    pub fn from_draft(owner: Uuid, d: BloggerDraft, now: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: owner,
            platform_id: d.platform_id,
            blogger_name: d.blogger_name,
            avatar_url: d.avatar_url,
            description: d.description,
            followers_count: d.followers_count,
            blogger_url: d.blogger_url,
            capture_timestamp: d.capture_timestamp,
            created_at: now,
            updated_at: now,
        }
    }

    /// Full overwrite; `id`, owner and `createdAt` survive.
    pub fn overwrite(&mut self, d: BloggerDraft, now: OffsetDateTime) {
        self.blogger_name = d.blogger_name;
        self.avatar_url = d.avatar_url;
        self.description = d.description;
        self.followers_count = d.followers_count;
        self.blogger_url = d.blogger_url;
        self.capture_timestamp = d.capture_timestamp;
        self.updated_at = now;
    }
}
