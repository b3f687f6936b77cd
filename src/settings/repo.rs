use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{UserSettings, DEFAULT_BATCH_LIMIT, DEFAULT_DAILY_LIMIT};

#[async_trait]
pub trait SettingsRepo: Send + Sync {
    /// Row for `user_id`, inserted with defaults on first access.
    async fn get_or_create(&self, user_id: Uuid) -> anyhow::Result<UserSettings>;
    async fn set_collection_enabled(&self, user_id: Uuid, enabled: bool)
        -> anyhow::Result<UserSettings>;
}

#[derive(Clone)]
pub struct PgSettingsRepo {
    db: PgPool,
}

impl PgSettingsRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SettingsRepo for PgSettingsRepo {
    async fn get_or_create(&self, user_id: Uuid) -> anyhow::Result<UserSettings> {
        sqlx::query(
            r#"
            INSERT INTO user_settings (user_id, collection_enabled, collection_daily_limit,
                                       collection_batch_limit)
            VALUES ($1, TRUE, $2, $3)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(DEFAULT_DAILY_LIMIT)
        .bind(DEFAULT_BATCH_LIMIT)
        .execute(&self.db)
        .await
        .context("seed user settings")?;

        let settings = sqlx::query_as::<_, UserSettings>(
            r#"
            SELECT user_id, collection_enabled, collection_daily_limit, collection_batch_limit,
                   created_at, updated_at
            FROM user_settings
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await
        .context("load user settings")?;
        Ok(settings)
    }

    async fn set_collection_enabled(
        &self,
        user_id: Uuid,
        enabled: bool,
    ) -> anyhow::Result<UserSettings> {
        let settings = sqlx::query_as::<_, UserSettings>(
            r#"
            INSERT INTO user_settings (user_id, collection_enabled, collection_daily_limit,
                                       collection_batch_limit)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                collection_enabled = EXCLUDED.collection_enabled,
                updated_at = now()
            RETURNING user_id, collection_enabled, collection_daily_limit, collection_batch_limit,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(enabled)
        .bind(DEFAULT_DAILY_LIMIT)
        .bind(DEFAULT_BATCH_LIMIT)
        .fetch_one(&self.db)
        .await
        .context("toggle collection")?;
        Ok(settings)
    }
}
