use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_ROLE: &str = "USER";

/// Local user record, one per external identity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub auth_center_user_id: String,
    pub role: String,
    pub union_id: Option<String>,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub profile: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Another user already holds this `union_id`, `phone_number` or `email`.
#[derive(Debug, thiserror::Error)]
#[error("contact details are already linked to another account")]
pub struct ContactTaken;

/// Insert-or-merge input keyed by `auth_center_user_id`.
///
/// `None` fields never clear a cached value; `profile` is shallow-merged into the
/// stored object. `role` only applies when the row is first created.
#[derive(Debug, Clone, Default)]
pub struct UserUpsert {
    pub auth_center_user_id: String,
    pub role: Option<String>,
    pub union_id: Option<String>,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub profile: Option<Value>,
}

impl UserUpsert {
    pub fn for_identity(auth_center_user_id: impl Into<String>) -> Self {
        Self {
            auth_center_user_id: auth_center_user_id.into(),
            ..Default::default()
        }
    }

    /// Empty strings become `None` so unique columns never collide on `''`.
    pub fn normalized(self) -> Self {
        Self {
            union_id: non_empty(self.union_id),
            nickname: non_empty(self.nickname),
            avatar_url: non_empty(self.avatar_url),
            phone_number: non_empty(self.phone_number),
            email: non_empty(self.email),
            profile: self.profile.filter(Value::is_object),
            role: non_empty(self.role),
            ..self
        }
    }

    pub fn into_new_user(self, now: OffsetDateTime) -> User {
        User {
            id: Uuid::new_v4(),
            auth_center_user_id: self.auth_center_user_id,
            role: self.role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            union_id: self.union_id,
            nickname: self.nickname,
            avatar_url: self.avatar_url,
            phone_number: self.phone_number,
            email: self.email,
            profile: self.profile.unwrap_or_else(|| Value::Object(Default::default())),
            created_at: now,
            updated_at: now,
        }
    }
}

impl User {
    pub fn shares_contact_with(&self, other: &User) -> bool {
        fn clash(a: &Option<String>, b: &Option<String>) -> bool {
            a.is_some() && a == b
        }
        clash(&self.union_id, &other.union_id)
            || clash(&self.phone_number, &other.phone_number)
            || clash(&self.email, &other.email)
    }

    /// Applies an upsert on top of an existing row: overwrite-if-present per field.
    pub fn absorb(&mut self, input: UserUpsert, now: OffsetDateTime) {
        fn keep_or(slot: &mut Option<String>, incoming: Option<String>) {
            if incoming.is_some() {
                *slot = incoming;
            }
        }
        keep_or(&mut self.union_id, input.union_id);
        keep_or(&mut self.nickname, input.nickname);
        keep_or(&mut self.avatar_url, input.avatar_url);
        keep_or(&mut self.phone_number, input.phone_number);
        keep_or(&mut self.email, input.email);
        if let Some(profile) = input.profile {
            merge_profile(&mut self.profile, profile);
        }
        self.updated_at = now;
    }
}

/// Shallow JSON merge, same semantics as Postgres `jsonb || jsonb` on objects.
pub fn merge_profile(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(dst), Value::Object(src)) => {
            for (k, v) in src {
                dst.insert(k, v);
            }
        }
        (dst, src @ Value::Object(_)) => *dst = src,
        _ => {}
    }
}

pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
