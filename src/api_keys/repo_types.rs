use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const KEY_PREFIX: &str = "nsk_";

/// The owner already holds a key; raised by the store, so concurrent issues cannot both win.
#[derive(Debug, thiserror::Error)]
#[error("an api key already exists for this user")]
pub struct KeyLimitReached;

/// Long-lived secret the browser extension sends instead of a session token.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ApiKey {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub key: String,
    pub is_active: bool,
    pub last_used: Option<OffsetDateTime>,
    pub expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl ApiKey {
    pub fn new(
        user_id: Uuid,
        name: String,
        key: String,
        expires_at: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            key,
            is_active: true,
            last_used: None,
            expires_at,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_usable(&self, now: OffsetDateTime) -> bool {
        self.is_active && self.expires_at.map_or(true, |exp| exp > now)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyStats {
    pub total_keys: i64,
    pub active_keys: i64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_used: Option<OffsetDateTime>,
}
