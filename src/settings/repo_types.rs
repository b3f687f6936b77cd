use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_DAILY_LIMIT: i32 = 500;
pub const DEFAULT_BATCH_LIMIT: i32 = 50;

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub user_id: Uuid,
    pub collection_enabled: bool,
    pub collection_daily_limit: i32,
    pub collection_batch_limit: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl UserSettings {
    pub fn defaults(user_id: Uuid, now: OffsetDateTime) -> Self {
        Self {
            user_id,
            collection_enabled: true,
            collection_daily_limit: DEFAULT_DAILY_LIMIT,
            collection_batch_limit: DEFAULT_BATCH_LIMIT,
            created_at: now,
            updated_at: now,
        }
    }
}
