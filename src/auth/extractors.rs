use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use super::{cookie::read_session_cookie, jwt::JwtKeys};
use crate::{api_keys::services as api_keys, error::AppError, state::AppState};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Dashboard session: `Authorization: Bearer <jwt>` or the `token` cookie.
pub struct AuthUser(pub Uuid);

/// Extension routes: an API key, or a session JWT in the bearer slot.
pub struct SyncUser(pub Uuid);

/// API key only; used by the plugin to check its stored key.
pub struct ApiKeyUser(pub Uuid);

fn bearer(parts: &Parts) -> Option<&str> {
    let auth = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn api_key_header(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
}

fn session_token(parts: &Parts) -> Option<&str> {
    bearer(parts).or_else(|| {
        parts
            .headers
            .get(header::COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(read_session_cookie)
    })
}

fn missing() -> AppError {
    AppError::Unauthorized("missing credentials".into())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = session_token(parts).ok_or_else(missing)?;
        let claims = JwtKeys::from_ref(state).verify(token).map_err(|_| {
            warn!("invalid or expired session token");
            AppError::Unauthorized("invalid or expired token".into())
        })?;
        Ok(AuthUser(claims.sub))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SyncUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        if let Some(key) = api_key_header(parts) {
            return api_keys::validate(state, key).await.map(SyncUser);
        }
        let token = bearer(parts).ok_or_else(missing)?;
        if let Ok(claims) = JwtKeys::from_ref(state).verify(token) {
            return Ok(SyncUser(claims.sub));
        }
        api_keys::validate(state, token).await.map(SyncUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ApiKeyUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let parts: &Parts = parts;
        let key = api_key_header(parts)
            .or_else(|| bearer(parts))
            .ok_or_else(missing)?;
        api_keys::validate(state, key).await.map(ApiKeyUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_keys::{dto::CreateApiKeyRequest, services::create};
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut req = Request::builder().uri("/");
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        req.body(()).unwrap().into_parts().0
    }

    async fn issued_key(state: &AppState, owner: Uuid) -> String {
        create(state, owner, CreateApiKeyRequest { name: "plugin".into(), expires_in: None })
            .await
            .unwrap()
            .key
    }

    #[tokio::test]
    async fn session_from_bearer_or_cookie() {
        let state = AppState::fake();
        let user = Uuid::new_v4();
        let token = JwtKeys::from_ref(&state).sign(user).unwrap();

        let mut p = parts(&[("authorization", format!("Bearer {token}").as_str())]);
        assert_eq!(AuthUser::from_request_parts(&mut p, &state).await.unwrap().0, user);

        let mut p = parts(&[("cookie", format!("lang=zh; token={token}").as_str())]);
        assert_eq!(AuthUser::from_request_parts(&mut p, &state).await.unwrap().0, user);
    }

    #[tokio::test]
    async fn session_rejects_missing_or_garbage_tokens() {
        let state = AppState::fake();
        let mut p = parts(&[]);
        assert!(matches!(
            AuthUser::from_request_parts(&mut p, &state).await,
            Err(AppError::Unauthorized(_))
        ));
        let mut p = parts(&[("authorization", "Bearer nope")]);
        assert!(matches!(
            AuthUser::from_request_parts(&mut p, &state).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn session_routes_do_not_accept_api_keys() {
        let state = AppState::fake();
        let key = issued_key(&state, Uuid::new_v4()).await;
        let mut p = parts(&[("authorization", format!("Bearer {key}").as_str())]);
        assert!(AuthUser::from_request_parts(&mut p, &state).await.is_err());
    }

    #[tokio::test]
    async fn sync_accepts_every_credential_form() {
        let state = AppState::fake();
        let owner = Uuid::new_v4();
        let key = issued_key(&state, owner).await;
        let jwt = JwtKeys::from_ref(&state).sign(owner).unwrap();

        for headers in [
            vec![("x-api-key", key.clone())],
            vec![("authorization", format!("Bearer {key}"))],
            vec![("authorization", format!("Bearer {jwt}"))],
        ] {
            let pairs: Vec<(&str, &str)> =
                headers.iter().map(|(n, v)| (*n, v.as_str())).collect();
            let mut p = parts(&pairs);
            assert_eq!(SyncUser::from_request_parts(&mut p, &state).await.unwrap().0, owner);
        }
    }

    #[tokio::test]
    async fn sync_rejects_unknown_key() {
        let state = AppState::fake();
        let mut p = parts(&[("x-api-key", "nsk_unknown")]);
        assert!(matches!(
            SyncUser::from_request_parts(&mut p, &state).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn api_key_user_ignores_session_tokens() {
        let state = AppState::fake();
        let jwt = JwtKeys::from_ref(&state).sign(Uuid::new_v4()).unwrap();
        let mut p = parts(&[("authorization", format!("Bearer {jwt}").as_str())]);
        assert!(ApiKeyUser::from_request_parts(&mut p, &state).await.is_err());
    }
}
