use axum::{
    extract::{FromRef, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use tracing::{instrument, warn};

use super::{
    cookie::session_cookie,
    dto::{CallbackQuery, SessionResponse, WechatLoginRequest},
    extractors::AuthUser,
    jwt::JwtKeys,
    services,
};
use crate::{
    error::AppError,
    response::{ApiResponse, ApiResult, AppJson, AppQuery},
    state::AppState,
    users::{services::current_user, User},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/wechat/login", get(wechat_login))
        .route("/auth/wechat/callback", get(wechat_callback))
        .route("/auth/wechat", post(wechat_code_login))
        .route("/auth/me", get(get_me))
}

/// Provider-token login used by the extension popup.
pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/user/me", get(provider_me))
        .route("/users/me", get(provider_me))
}

#[instrument(skip(state))]
pub async fn wechat_login(State(state): State<AppState>) -> Redirect {
    let url = state.identity.login_url(&state.config.auth_center.callback_url);
    Redirect::to(&url)
}

#[instrument(skip(state, query))]
pub async fn wechat_callback(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CallbackQuery>,
) -> Response {
    let cfg = &state.config.auth_center;
    match services::complete_callback(&state, query).await {
        Ok(token) => {
            let max_age = JwtKeys::from_ref(&state).ttl_secs();
            let cookie = session_cookie(cfg, &token, max_age);
            (
                AppendHeaders([(header::SET_COOKIE, cookie)]),
                Redirect::to(&cfg.dashboard_path),
            )
                .into_response()
        }
        Err(e) => {
            warn!(code = e.code(), "login callback failed");
            Redirect::to(&format!("{}?error={}", cfg.login_path, e.code())).into_response()
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn wechat_code_login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<WechatLoginRequest>,
) -> ApiResult<SessionResponse> {
    let session =
        services::login_with_code(&state, &payload.auth_code, &payload.login_type).await?;
    Ok(ApiResponse::ok(session))
}

#[instrument(skip(state, headers))]
pub async fn provider_me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<SessionResponse> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing provider token".into()))?;
    let session = services::login_with_provider_token(&state, token).await?;
    Ok(ApiResponse::ok(session))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<User> {
    let user = current_user(&state, user_id).await?;
    Ok(ApiResponse::ok(user))
}
