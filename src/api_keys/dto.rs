use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::ApiKey;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyRequest {
    pub name: String,
    /// Days until expiry; absent or non-positive means never.
    pub expires_in: Option<i64>,
}

/// Key as shown to its owner. `key` is either the full secret or its mask.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyView {
    pub id: Uuid,
    pub name: String,
    pub key: String,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_used: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ApiKeyView {
    pub fn revealed(k: ApiKey) -> Self {
        Self::with_key(k.key.clone(), k)
    }

    pub fn masked(k: ApiKey) -> Self {
        Self::with_key(mask(&k.key), k)
    }

    fn with_key(key: String, k: ApiKey) -> Self {
        Self {
            id: k.id,
            name: k.name,
            key,
            is_active: k.is_active,
            last_used: k.last_used,
            expires_at: k.expires_at,
            created_at: k.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedKey {
    pub valid: bool,
    pub user_id: Uuid,
}

/// First 8 and last 4 characters; short secrets are fully hidden.
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() < 12 {
        return "****".into();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
