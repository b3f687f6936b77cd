use async_trait::async_trait;
use serde_json::Value;

pub mod client;

pub use client::AuthCenterClient;

/// Profile fields the account center returns for a user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalProfile {
    pub user_id: String,
    pub union_id: Option<String>,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    /// Provider's raw `profile` object, merged into the local one.
    pub raw: Option<Value>,
}

/// Result of checking a provider token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub valid: bool,
    pub user_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The provider answered, but said no.
    #[error("{0}")]
    Rejected(String),
    /// Network failure or an unparseable body.
    #[error("account center unavailable: {0}")]
    Transport(String),
}

/// External account center. Everything auth-related beyond our own session JWT is
/// delegated here.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// One-time authorization code to the user's profile (PC QR-code login).
    async fn exchange_code(&self, code: &str, login_type: &str)
        -> Result<ExternalProfile, IdentityError>;

    async fn verify_token(&self, token: &str) -> Result<VerifiedToken, IdentityError>;

    async fn fetch_profile(&self, token: &str) -> Result<ExternalProfile, IdentityError>;

    /// Browser-facing login page that will redirect back to `callback_url`.
    fn login_url(&self, callback_url: &str) -> String;
}
