use anyhow::Context;
use serde::Serialize;
use time::{macros::format_description, Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use super::signer::UploadSigner;
use crate::{error::AppError, state::AppState};

pub const UPLOAD_URL: &str = "https://upload.qiniup.com";
pub const TOKEN_TTL_SECS: i64 = 86_400;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadToken {
    pub upload_token: String,
    pub upload_url: &'static str,
    pub cdn_domain: String,
    pub key_prefix: String,
    pub expires_in: i64,
}

pub async fn issue_token(state: &AppState, owner: Uuid) -> Result<UploadToken, AppError> {
    let cfg = state
        .config
        .upload
        .as_ref()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("upload storage is not configured")))?;

    let now = OffsetDateTime::now_utc();
    let deadline = (now + Duration::seconds(TOKEN_TTL_SECS)).unix_timestamp();
    let upload_token = UploadSigner::new(cfg).sign(deadline)?;
    let key_prefix = key_prefix(now)?;
    info!(user_id = %owner, %key_prefix, "upload token issued");

    Ok(UploadToken {
        upload_token,
        upload_url: UPLOAD_URL,
        cdn_domain: cfg.cdn_domain.clone(),
        key_prefix,
        expires_in: TOKEN_TTL_SECS,
    })
}

fn key_prefix(now: OffsetDateTime) -> anyhow::Result<String> {
    let day = now
        .format(format_description!("[year]/[month]/[day]"))
        .context("format upload key prefix")?;
    Ok(format!("notes/{day}"))
}
