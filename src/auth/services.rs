use axum::extract::FromRef;
use tracing::{error, info, warn};

use super::{
    dto::{CallbackQuery, SessionResponse},
    jwt::JwtKeys,
};
use crate::{
    error::AppError,
    identity::IdentityError,
    state::AppState,
    users::{services::sync_from_profile, User},
};

impl From<IdentityError> for AppError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::Rejected(msg) => AppError::Unauthorized(msg),
            IdentityError::Transport(msg) => AppError::Upstream(msg),
        }
    }
}

/// Why the browser callback bounced back to the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackError {
    MissingParams,
    VerifyFailed,
    InvalidToken,
    UserInfoFailed,
    UserCreationFailed,
    TokenGenerationFailed,
}

impl CallbackError {
    pub fn code(self) -> &'static str {
        match self {
            CallbackError::MissingParams => "missing_params",
            CallbackError::VerifyFailed => "verify_failed",
            CallbackError::InvalidToken => "invalid_token",
            CallbackError::UserInfoFailed => "user_info_failed",
            CallbackError::UserCreationFailed => "user_creation_failed",
            CallbackError::TokenGenerationFailed => "token_generation_failed",
        }
    }
}

pub fn issue_session(state: &AppState, user: User) -> Result<SessionResponse, AppError> {
    let token = JwtKeys::from_ref(state).sign(user.id)?;
    Ok(SessionResponse { token, user })
}

/// Exchanges a provider login code for a local session.
pub async fn login_with_code(
    state: &AppState,
    code: &str,
    login_type: &str,
) -> Result<SessionResponse, AppError> {
    if code.trim().is_empty() {
        return Err(AppError::Validation("authCode is required".into()));
    }
    let profile = state.identity.exchange_code(code, login_type).await?;
    let user = sync_from_profile(state, profile).await?;
    info!(user_id = %user.id, "login with code");
    issue_session(state, user)
}

/// Trades a provider bearer token for a local session, refreshing the cached profile.
pub async fn login_with_provider_token(
    state: &AppState,
    token: &str,
) -> Result<SessionResponse, AppError> {
    let profile = state.identity.fetch_profile(token).await?;
    let user = sync_from_profile(state, profile).await?;
    issue_session(state, user)
}

/// Browser callback after provider login. Returns the session token for the cookie.
pub async fn complete_callback(
    state: &AppState,
    query: CallbackQuery,
) -> Result<String, CallbackError> {
    let (Some(external_id), Some(token)) = (
        query.user_id.filter(|v| !v.is_empty()),
        query.token.filter(|v| !v.is_empty()),
    ) else {
        return Err(CallbackError::MissingParams);
    };

    let verified = state.identity.verify_token(&token).await.map_err(|e| {
        warn!(error = %e, "callback token verification failed");
        CallbackError::VerifyFailed
    })?;
    if !verified.valid || verified.user_id != external_id {
        warn!(%external_id, "callback token does not match user");
        return Err(CallbackError::InvalidToken);
    }

    let profile = state.identity.fetch_profile(&token).await.map_err(|e| {
        warn!(error = %e, "callback profile fetch failed");
        CallbackError::UserInfoFailed
    })?;
    let user = sync_from_profile(state, profile).await.map_err(|e| {
        error!(error = %e, "callback user sync failed");
        CallbackError::UserCreationFailed
    })?;
    let session = JwtKeys::from_ref(state).sign(user.id).map_err(|e| {
        error!(error = %e, "callback session signing failed");
        CallbackError::TokenGenerationFailed
    })?;
    info!(user_id = %user.id, "login via callback");
    Ok(session)
}
