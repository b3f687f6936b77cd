use time::{OffsetDateTime, Time};
use tracing::{info, warn};
use uuid::Uuid;

use super::repo_types::UserSettings;
use crate::{error::AppError, state::AppState};

pub async fn get_settings(state: &AppState, owner: Uuid) -> Result<UserSettings, AppError> {
    Ok(state.settings.get_or_create(owner).await?)
}

pub async fn toggle_collection(
    state: &AppState,
    owner: Uuid,
    enabled: bool,
) -> Result<UserSettings, AppError> {
    let settings = state.settings.set_collection_enabled(owner, enabled).await?;
    info!(user_id = %owner, enabled, "collection toggled");
    Ok(settings)
}

/// Gate in front of every note write. `batch_size` is 1 for a single capture.
///
/// The daily count is read, not reserved: concurrent batches can overshoot the cap.
pub async fn ensure_quota(
    state: &AppState,
    owner: Uuid,
    batch_size: usize,
) -> Result<(), AppError> {
    let settings = state.settings.get_or_create(owner).await?;
    if !settings.collection_enabled {
        warn!(user_id = %owner, "capture rejected: collection disabled");
        return Err(AppError::CollectionDisabled);
    }
    check_batch(&settings, batch_size)?;

    let since = start_of_utc_day(OffsetDateTime::now_utc());
    let today = state.notes.count_created_since(owner, since).await?;
    check_daily(&settings, today).inspect_err(|_| {
        warn!(user_id = %owner, today, "capture rejected: daily limit reached");
    })
}

/// Bloggers are only gated by the enabled flag.
pub async fn ensure_enabled(state: &AppState, owner: Uuid) -> Result<(), AppError> {
    let settings = state.settings.get_or_create(owner).await?;
    if !settings.collection_enabled {
        warn!(user_id = %owner, "capture rejected: collection disabled");
        return Err(AppError::CollectionDisabled);
    }
    Ok(())
}

fn check_batch(settings: &UserSettings, batch_size: usize) -> Result<(), AppError> {
    let limit = settings.collection_batch_limit;
    if batch_size > limit.max(0) as usize {
        return Err(AppError::BatchLimitExceeded { limit });
    }
    Ok(())
}

fn check_daily(settings: &UserSettings, created_today: i64) -> Result<(), AppError> {
    let limit = settings.collection_daily_limit;
    if created_today >= i64::from(limit) {
        return Err(AppError::DailyLimitExceeded { limit });
    }
    Ok(())
}

pub fn start_of_utc_day(now: OffsetDateTime) -> OffsetDateTime {
    now.to_offset(time::UtcOffset::UTC).replace_time(Time::MIDNIGHT)
}
