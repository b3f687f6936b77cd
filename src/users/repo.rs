use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{ContactTaken, User, UserUpsert, DEFAULT_ROLE};

/// Writes fail with [`ContactTaken`] when a unique contact column collides.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<User>>;
    /// Insert, or merge into the row with the same external id.
    async fn upsert(&self, input: UserUpsert) -> anyhow::Result<User>;
    /// Insert only; `None` when the external id is already taken.
    async fn create(&self, input: UserUpsert) -> anyhow::Result<Option<User>>;
    async fn update(&self, user: &User) -> anyhow::Result<User>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

const USER_COLUMNS: &str = "id, auth_center_user_id, role, union_id, nickname, avatar_url, \
                            phone_number, email, profile, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const UNIQUE_VIOLATION: &str = "23505";

fn write_error(err: sqlx::Error, action: &'static str) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            ContactTaken.into()
        }
        _ => anyhow::Error::new(err).context(action),
    }
}

fn profile_or_empty(profile: Option<Value>) -> Value {
    profile.unwrap_or_else(|| Value::Object(Default::default()))
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE auth_center_user_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(&self.db)
        .await
        .context("find user by external id")?;
        Ok(user)
    }

    async fn upsert(&self, input: UserUpsert) -> anyhow::Result<User> {
        let input = input.normalized();
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, auth_center_user_id, role, union_id, nickname, avatar_url,
                               phone_number, email, profile)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (auth_center_user_id) DO UPDATE SET
                union_id     = COALESCE(EXCLUDED.union_id, users.union_id),
                nickname     = COALESCE(EXCLUDED.nickname, users.nickname),
                avatar_url   = COALESCE(EXCLUDED.avatar_url, users.avatar_url),
                phone_number = COALESCE(EXCLUDED.phone_number, users.phone_number),
                email        = COALESCE(EXCLUDED.email, users.email),
                profile      = users.profile || EXCLUDED.profile,
                updated_at   = now()
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&input.auth_center_user_id)
        .bind(input.role.as_deref().unwrap_or(DEFAULT_ROLE))
        .bind(&input.union_id)
        .bind(&input.nickname)
        .bind(&input.avatar_url)
        .bind(&input.phone_number)
        .bind(&input.email)
        .bind(profile_or_empty(input.profile.clone()))
        .fetch_one(&self.db)
        .await
        .map_err(|e| write_error(e, "upsert user"))?;
        Ok(user)
    }

    async fn create(&self, input: UserUpsert) -> anyhow::Result<Option<User>> {
        let input = input.normalized();
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, auth_center_user_id, role, union_id, nickname, avatar_url,
                               phone_number, email, profile)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (auth_center_user_id) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&input.auth_center_user_id)
        .bind(input.role.as_deref().unwrap_or(DEFAULT_ROLE))
        .bind(&input.union_id)
        .bind(&input.nickname)
        .bind(&input.avatar_url)
        .bind(&input.phone_number)
        .bind(&input.email)
        .bind(profile_or_empty(input.profile.clone()))
        .fetch_optional(&self.db)
        .await
        .map_err(|e| write_error(e, "create user"))?;
        Ok(user)
    }

    async fn update(&self, user: &User) -> anyhow::Result<User> {
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET role = $2, union_id = $3, nickname = $4, avatar_url = $5,
                   phone_number = $6, email = $7, profile = $8, updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.role)
        .bind(&user.union_id)
        .bind(&user.nickname)
        .bind(&user.avatar_url)
        .bind(&user.phone_number)
        .bind(&user.email)
        .bind(&user.profile)
        .fetch_one(&self.db)
        .await
        .map_err(|e| write_error(e, "update user"))?;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(res.rows_affected() > 0)
    }
}
