use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Blogger, BloggerDraft};
use crate::response::Page;

#[async_trait]
pub trait BloggerRepo: Send + Sync {
    async fn upsert(&self, owner: Uuid, draft: BloggerDraft) -> anyhow::Result<Blogger>;
    async fn find(&self, owner: Uuid, id: Uuid) -> anyhow::Result<Option<Blogger>>;
    async fn find_by_platform_id(&self, owner: Uuid, platform_id: &str)
        -> anyhow::Result<Option<Blogger>>;
    /// Most followed first.
    async fn list(&self, owner: Uuid, page: Page) -> anyhow::Result<(Vec<Blogger>, i64)>;
    async fn update(&self, blogger: &Blogger) -> anyhow::Result<Option<Blogger>>;
    async fn delete(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool>;
    async fn count(&self, owner: Uuid) -> anyhow::Result<i64>;
}

const BLOGGER_COLUMNS: &str = "id, user_id, platform_id, blogger_name, avatar_url, description, \
                               followers_count, blogger_url, capture_timestamp, created_at, \
                               updated_at";

#[derive(Clone)]
pub struct PgBloggerRepo {
    db: PgPool,
}

impl PgBloggerRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BloggerRepo for PgBloggerRepo {
    async fn upsert(&self, owner: Uuid, d: BloggerDraft) -> anyhow::Result<Blogger> {
        let blogger = sqlx::query_as::<_, Blogger>(&format!(
            r#"
            INSERT INTO bloggers (id, user_id, platform_id, blogger_name, avatar_url, description,
                                  followers_count, blogger_url, capture_timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id, platform_id) DO UPDATE SET
                blogger_name      = EXCLUDED.blogger_name,
                avatar_url        = EXCLUDED.avatar_url,
                description       = EXCLUDED.description,
                followers_count   = EXCLUDED.followers_count,
                blogger_url       = EXCLUDED.blogger_url,
                capture_timestamp = EXCLUDED.capture_timestamp,
                updated_at        = now()
            RETURNING {BLOGGER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&d.platform_id)
        .bind(&d.blogger_name)
        .bind(&d.avatar_url)
        .bind(&d.description)
        .bind(d.followers_count)
        .bind(&d.blogger_url)
        .bind(d.capture_timestamp)
        .fetch_one(&self.db)
        .await
        .context("upsert blogger")?;
        Ok(blogger)
    }

    async fn find(&self, owner: Uuid, id: Uuid) -> anyhow::Result<Option<Blogger>> {
        let blogger = sqlx::query_as::<_, Blogger>(&format!(
            "SELECT {BLOGGER_COLUMNS} FROM bloggers WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await
        .context("find blogger")?;
        Ok(blogger)
    }

    async fn find_by_platform_id(
        &self,
        owner: Uuid,
        platform_id: &str,
    ) -> anyhow::Result<Option<Blogger>> {
        let blogger = sqlx::query_as::<_, Blogger>(&format!(
            "SELECT {BLOGGER_COLUMNS} FROM bloggers WHERE user_id = $1 AND platform_id = $2"
        ))
        .bind(owner)
        .bind(platform_id)
        .fetch_optional(&self.db)
        .await
        .context("find blogger by platform id")?;
        Ok(blogger)
    }

    async fn list(&self, owner: Uuid, page: Page) -> anyhow::Result<(Vec<Blogger>, i64)> {
        let total = self.count(owner).await?;
        let bloggers = sqlx::query_as::<_, Blogger>(&format!(
            "SELECT {BLOGGER_COLUMNS} FROM bloggers WHERE user_id = $1 \
             ORDER BY followers_count DESC, created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(owner)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await
        .context("list bloggers")?;
        Ok((bloggers, total))
    }

    async fn update(&self, b: &Blogger) -> anyhow::Result<Option<Blogger>> {
        let blogger = sqlx::query_as::<_, Blogger>(&format!(
            r#"
            UPDATE bloggers
               SET blogger_name = $3, avatar_url = $4, description = $5, followers_count = $6,
                   blogger_url = $7, capture_timestamp = $8, updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING {BLOGGER_COLUMNS}
            "#
        ))
        .bind(b.id)
        .bind(b.user_id)
        .bind(&b.blogger_name)
        .bind(&b.avatar_url)
        .bind(&b.description)
        .bind(b.followers_count)
        .bind(&b.blogger_url)
        .bind(b.capture_timestamp)
        .fetch_optional(&self.db)
        .await
        .context("update blogger")?;
        Ok(blogger)
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM bloggers WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await
            .context("delete blogger")?;
        Ok(res.rows_affected() > 0)
    }

    async fn count(&self, owner: Uuid) -> anyhow::Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bloggers WHERE user_id = $1")
            .bind(owner)
            .fetch_one(&self.db)
            .await
            .context("count bloggers")?;
        Ok(total)
    }
}
