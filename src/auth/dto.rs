use serde::{Deserialize, Serialize};

use crate::users::User;

/// PC QR-code login: the one-time code handed to the dashboard by the provider.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WechatLoginRequest {
    pub auth_code: String,
    #[serde(rename = "type", default = "default_login_type")]
    pub login_type: String,
}

fn default_login_type() -> String {
    "pc".into()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackQuery {
    pub user_id: Option<String>,
    pub token: Option<String>,
}

/// Session token plus the local user it is bound to.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}
