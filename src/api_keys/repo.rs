use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{ApiKey, ApiKeyStats, KeyLimitReached};

#[async_trait]
pub trait ApiKeyRepo: Send + Sync {
    /// Fails with [`KeyLimitReached`] when the owner already has a key.
    async fn create(&self, key: &ApiKey) -> anyhow::Result<()>;
    /// Oldest first.
    async fn list_for_user(&self, owner: Uuid) -> anyhow::Result<Vec<ApiKey>>;
    async fn find_by_secret(&self, secret: &str) -> anyhow::Result<Option<ApiKey>>;
    async fn deactivate(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool>;
    async fn delete(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool>;
    async fn touch_last_used(&self, id: Uuid, at: OffsetDateTime) -> anyhow::Result<()>;
    async fn stats(&self, owner: Uuid) -> anyhow::Result<ApiKeyStats>;
}

const ONE_PER_USER: &str = "api_keys_one_per_user";

const KEY_COLUMNS: &str = "id, user_id, name, key, is_active, last_used, expires_at, created_at";

#[derive(Clone)]
pub struct PgApiKeyRepo {
    db: PgPool,
}

impl PgApiKeyRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ApiKeyRepo for PgApiKeyRepo {
    async fn create(&self, k: &ApiKey) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO api_keys (id, user_id, name, key, is_active, last_used, expires_at,
                                  created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(k.id)
        .bind(k.user_id)
        .bind(&k.name)
        .bind(&k.key)
        .bind(k.is_active)
        .bind(k.last_used)
        .bind(k.expires_at)
        .bind(k.created_at)
        .execute(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.constraint() == Some(ONE_PER_USER) => {
                anyhow::Error::new(KeyLimitReached)
            }
            _ => anyhow::Error::new(e).context("insert api key"),
        })?;
        Ok(())
    }

    async fn list_for_user(&self, owner: Uuid) -> anyhow::Result<Vec<ApiKey>> {
        let keys = sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {KEY_COLUMNS} FROM api_keys WHERE user_id = $1 ORDER BY created_at ASC"
        ))
        .bind(owner)
        .fetch_all(&self.db)
        .await
        .context("list api keys")?;
        Ok(keys)
    }

    async fn find_by_secret(&self, secret: &str) -> anyhow::Result<Option<ApiKey>> {
        let key = sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {KEY_COLUMNS} FROM api_keys WHERE key = $1"
        ))
        .bind(secret)
        .fetch_optional(&self.db)
        .await
        .context("find api key")?;
        Ok(key)
    }

    async fn deactivate(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res =
            sqlx::query("UPDATE api_keys SET is_active = FALSE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(owner)
                .execute(&self.db)
                .await
                .context("deactivate api key")?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM api_keys WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await
            .context("delete api key")?;
        Ok(res.rows_affected() > 0)
    }

    async fn touch_last_used(&self, id: Uuid, at: OffsetDateTime) -> anyhow::Result<()> {
        sqlx::query("UPDATE api_keys SET last_used = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.db)
            .await
            .context("touch api key")?;
        Ok(())
    }

    async fn stats(&self, owner: Uuid) -> anyhow::Result<ApiKeyStats> {
        let stats = sqlx::query_as::<_, ApiKeyStats>(
            r#"
            SELECT COUNT(*)                                AS total_keys,
                   COUNT(*) FILTER (WHERE is_active)       AS active_keys,
                   MAX(last_used)                          AS last_used
            FROM api_keys
            WHERE user_id = $1
            "#,
        )
        .bind(owner)
        .fetch_one(&self.db)
        .await
        .context("api key stats")?;
        Ok(stats)
    }
}
