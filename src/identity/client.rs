use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{ExternalProfile, IdentityError, IdentityProvider, VerifiedToken};

/// `{success, message, data}` wrapper every account-center endpoint answers with.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfilePayload {
    user_id: String,
    #[serde(default)]
    union_id: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    profile: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyPayload {
    #[serde(default)]
    valid: bool,
    #[serde(default)]
    user_id: String,
}

impl From<ProfilePayload> for ExternalProfile {
    fn from(p: ProfilePayload) -> Self {
        let text = |key: &str| {
            p.profile
                .as_ref()
                .and_then(|v| v.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        ExternalProfile {
            nickname: text("nickname"),
            avatar_url: text("avatarUrl").or_else(|| text("headimgurl")),
            user_id: p.user_id,
            union_id: p.union_id,
            phone_number: p.phone_number,
            email: p.email,
            raw: p.profile.filter(Value::is_object),
        }
    }
}

#[derive(Clone)]
pub struct AuthCenterClient {
    http: reqwest::Client,
    base_url: String,
}

impl AuthCenterClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_envelope<T: DeserializeOwned>(
        resp: Result<reqwest::Response, reqwest::Error>,
        endpoint: &str,
    ) -> Result<T, IdentityError> {
        let resp = resp.map_err(|e| {
            warn!(error = %e, endpoint, "account center request failed");
            IdentityError::Transport(e.to_string())
        })?;
        let status = resp.status();
        let body: Envelope<T> = resp.json().await.map_err(|e| {
            warn!(error = %e, %status, endpoint, "account center body not understood");
            IdentityError::Transport(e.to_string())
        })?;
        debug!(endpoint, success = body.success, "account center replied");
        match (body.success, body.data) {
            (true, Some(data)) => Ok(data),
            (_, _) if body.message.is_empty() => {
                Err(IdentityError::Rejected(format!("{endpoint} rejected")))
            }
            (_, _) => Err(IdentityError::Rejected(body.message)),
        }
    }
}

#[async_trait]
impl IdentityProvider for AuthCenterClient {
    async fn exchange_code(
        &self,
        code: &str,
        login_type: &str,
    ) -> Result<ExternalProfile, IdentityError> {
        let resp = self
            .http
            .post(self.url("/api/auth/wechat/login"))
            .json(&json!({ "code": code, "type": login_type }))
            .send()
            .await;
        let payload: ProfilePayload = Self::read_envelope(resp, "wechat/login").await?;
        Ok(payload.into())
    }

    async fn verify_token(&self, token: &str) -> Result<VerifiedToken, IdentityError> {
        let resp = self
            .http
            .post(self.url("/api/auth/verify-token"))
            .json(&json!({ "token": token }))
            .send()
            .await;
        let payload: VerifyPayload = Self::read_envelope(resp, "verify-token").await?;
        Ok(VerifiedToken {
            valid: payload.valid,
            user_id: payload.user_id,
        })
    }

    async fn fetch_profile(&self, token: &str) -> Result<ExternalProfile, IdentityError> {
        let resp = self
            .http
            .get(self.url("/api/auth/user-info"))
            .bearer_auth(token)
            .send()
            .await;
        let payload: ProfilePayload = Self::read_envelope(resp, "user-info").await?;
        Ok(payload.into())
    }

    fn login_url(&self, callback_url: &str) -> String {
        let mut url = match reqwest::Url::parse(&self.url("/api/auth/wechat/login")) {
            Ok(url) => url,
            Err(_) => return self.url("/api/auth/wechat/login"),
        };
        url.query_pairs_mut().append_pair("callbackUrl", callback_url);
        url.to_string()
    }
}
