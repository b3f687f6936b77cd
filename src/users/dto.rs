use serde::Deserialize;
use serde_json::Value;

use super::repo_types::UserUpsert;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub auth_center_user_id: String,
    pub union_id: Option<String>,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub profile: Option<Value>,
}

impl From<CreateUserRequest> for UserUpsert {
    fn from(req: CreateUserRequest) -> Self {
        UserUpsert {
            auth_center_user_id: req.auth_center_user_id.trim().to_string(),
            role: None,
            union_id: req.union_id,
            nickname: req.nickname,
            avatar_url: req.avatar_url,
            phone_number: req.phone_number,
            email: req.email,
            profile: req.profile,
        }
    }
}

/// Partial update; absent fields are left alone. An empty string clears the field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub union_id: Option<String>,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub profile: Option<Value>,
}
