use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha1::Sha1;

use crate::config::UploadConfig;

type HmacSha1 = Hmac<Sha1>;

#[derive(Serialize)]
struct PutPolicy<'a> {
    scope: &'a str,
    deadline: i64,
}

/// Issues bucket-scoped upload tokens for direct browser uploads.
#[derive(Clone)]
pub struct UploadSigner {
    access_key: String,
    secret_key: String,
    bucket: String,
}

impl UploadSigner {
    pub fn new(cfg: &UploadConfig) -> Self {
        Self {
            access_key: cfg.access_key.clone(),
            secret_key: cfg.secret_key.clone(),
            bucket: cfg.bucket.clone(),
        }
    }

    /// `accessKey:base64(hmac-sha1(encodedPolicy)):encodedPolicy`, URL-safe base64 throughout.
    pub fn sign(&self, deadline: i64) -> anyhow::Result<String> {
        let policy = serde_json::to_string(&PutPolicy {
            scope: &self.bucket,
            deadline,
        })?;
        let encoded_policy = URL_SAFE.encode(policy);

        let mut mac = HmacSha1::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid upload secret: {e}"))?;
        mac.update(encoded_policy.as_bytes());
        let signature = URL_SAFE.encode(mac.finalize().into_bytes());

        Ok(format!("{}:{}:{}", self.access_key, signature, encoded_policy))
    }
}
