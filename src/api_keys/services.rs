use rand::{rngs::OsRng, RngCore};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    dto::{ApiKeyView, CreateApiKeyRequest},
    repo_types::{ApiKey, ApiKeyStats, KeyLimitReached, KEY_PREFIX},
};
use crate::{error::AppError, state::AppState};

pub const DEFAULT_KEY_NAME: &str = "Browser extension";
pub const MAX_KEYS_PER_USER: usize = 1;

pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    format!("{KEY_PREFIX}{}", hex::encode(bytes))
}

/// Returns the caller's usable key in full, replacing stale ones when needed.
pub async fn get_or_create(state: &AppState, owner: Uuid) -> Result<ApiKeyView, AppError> {
    let now = OffsetDateTime::now_utc();
    let keys = state.api_keys.list_for_user(owner).await?;
    if let Some(k) = keys.iter().find(|k| k.is_usable(now)) {
        return Ok(ApiKeyView::revealed(k.clone()));
    }
    for stale in &keys {
        state.api_keys.delete(owner, stale.id).await?;
    }

    let key = ApiKey::new(owner, DEFAULT_KEY_NAME.into(), generate_secret(), None);
    if let Err(err) = state.api_keys.create(&key).await {
        if !err.is::<KeyLimitReached>() {
            return Err(err.into());
        }
        // A concurrent call issued first; hand back its key.
        let keys = state.api_keys.list_for_user(owner).await?;
        return keys
            .into_iter()
            .find(|k| k.is_usable(now))
            .map(ApiKeyView::revealed)
            .ok_or_else(|| AppError::Conflict(KeyLimitReached.to_string()));
    }
    info!(user_id = %owner, key_id = %key.id, replaced = keys.len(), "api key issued");
    Ok(ApiKeyView::revealed(key))
}

pub async fn create(
    state: &AppState,
    owner: Uuid,
    req: CreateApiKeyRequest,
) -> Result<ApiKeyView, AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    let existing = state.api_keys.list_for_user(owner).await?;
    if existing.len() >= MAX_KEYS_PER_USER {
        return Err(AppError::Conflict(KeyLimitReached.to_string()));
    }

    let expires_at = match req.expires_in.filter(|days| *days > 0) {
        Some(days) => Some(expiry_after(OffsetDateTime::now_utc(), days)?),
        None => None,
    };
    let key = ApiKey::new(owner, name.to_string(), generate_secret(), expires_at);
    state.api_keys.create(&key).await.map_err(|err| {
        if err.is::<KeyLimitReached>() {
            AppError::Conflict(KeyLimitReached.to_string())
        } else {
            err.into()
        }
    })?;
    info!(user_id = %owner, key_id = %key.id, "api key created");
    Ok(ApiKeyView::revealed(key))
}

fn expiry_after(now: OffsetDateTime, days: i64) -> Result<OffsetDateTime, AppError> {
    days.checked_mul(86_400)
        .map(Duration::seconds)
        .and_then(|ttl| now.checked_add(ttl))
        .ok_or_else(|| AppError::Validation("expiresIn is out of range".into()))
}

pub async fn list(state: &AppState, owner: Uuid) -> Result<Vec<ApiKeyView>, AppError> {
    let keys = state.api_keys.list_for_user(owner).await?;
    Ok(keys.into_iter().map(ApiKeyView::masked).collect())
}

pub async fn stats(state: &AppState, owner: Uuid) -> Result<ApiKeyStats, AppError> {
    Ok(state.api_keys.stats(owner).await?)
}

pub async fn deactivate(state: &AppState, owner: Uuid, id: Uuid) -> Result<(), AppError> {
    if !state.api_keys.deactivate(owner, id).await? {
        return Err(AppError::not_found("api key"));
    }
    info!(user_id = %owner, key_id = %id, "api key deactivated");
    Ok(())
}

pub async fn delete(state: &AppState, owner: Uuid, id: Uuid) -> Result<(), AppError> {
    if !state.api_keys.delete(owner, id).await? {
        return Err(AppError::not_found("api key"));
    }
    info!(user_id = %owner, key_id = %id, "api key deleted");
    Ok(())
}

/// Resolves a secret to its owner and queues the last-used write.
pub async fn validate(state: &AppState, secret: &str) -> Result<Uuid, AppError> {
    let key = state
        .api_keys
        .find_by_secret(secret)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid api key".into()))?;
    if !key.is_active {
        debug!(key_id = %key.id, "inactive api key presented");
        return Err(AppError::Unauthorized("api key is inactive".into()));
    }
    if !key.is_usable(OffsetDateTime::now_utc()) {
        debug!(key_id = %key.id, "expired api key presented");
        return Err(AppError::Unauthorized("api key has expired".into()));
    }
    state.last_used.record(key.id);
    Ok(key.user_id)
}
