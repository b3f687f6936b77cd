use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::{
    reconcile::{reconcile, Reconciled},
    repo_types::{
        Note, NoteDraft, NoteFilter, NoteRow, NoteTotals, IMAGE_NOTE_TYPE, VIDEO_NOTE_TYPE,
    },
};
use crate::response::Page;

#[async_trait]
pub trait NoteRepo: Send + Sync {
    /// Looks up (owner, url), merges the draft and persists, atomically.
    async fn reconcile(&self, owner: Uuid, draft: NoteDraft) -> anyhow::Result<Reconciled>;
    async fn find(&self, owner: Uuid, id: Uuid) -> anyhow::Result<Option<Note>>;
    /// Newest capture first, plus the unpaged total.
    async fn list(
        &self,
        owner: Uuid,
        filter: &NoteFilter,
        page: Page,
    ) -> anyhow::Result<(Vec<Note>, i64)>;
    /// Full-row update scoped to `note.user_id`; `None` if the row is gone.
    async fn update(&self, note: &Note) -> anyhow::Result<Option<Note>>;
    async fn delete(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool>;
    async fn count_created_since(&self, owner: Uuid, since: OffsetDateTime)
        -> anyhow::Result<i64>;
    async fn totals(&self, owner: Uuid) -> anyhow::Result<NoteTotals>;
}

const NOTE_COLUMNS: &str = "id, user_id, url, title, author, content, tags, image_urls, \
                            video_url, note_type, cover_image_url, likes, collects, comments, \
                            publish_date, capture_timestamp, source, created_at, updated_at";

#[derive(Clone)]
pub struct PgNoteRepo {
    db: PgPool,
}

impl PgNoteRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

async fn lock_by_url(
    conn: &mut PgConnection,
    owner: Uuid,
    url: &str,
) -> anyhow::Result<Option<Note>> {
    let row = sqlx::query_as::<_, NoteRow>(&format!(
        "SELECT {NOTE_COLUMNS} FROM notes WHERE user_id = $1 AND url = $2 FOR UPDATE"
    ))
    .bind(owner)
    .bind(url)
    .fetch_optional(conn)
    .await
    .context("lock note by url")?;
    row.map(Note::try_from).transpose()
}

/// `false` when a concurrent capture inserted the same (owner, url) first.
async fn insert_note(conn: &mut PgConnection, n: &Note) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        INSERT INTO notes (id, user_id, url, title, author, content, tags, image_urls,
                           video_url, note_type, cover_image_url, likes, collects, comments,
                           publish_date, capture_timestamp, source, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                $18, $19)
        ON CONFLICT (user_id, url) DO NOTHING
        "#,
    )
    .bind(n.id)
    .bind(n.user_id)
    .bind(&n.url)
    .bind(&n.title)
    .bind(&n.author)
    .bind(&n.content)
    .bind(&n.tags)
    .bind(&n.image_urls)
    .bind(&n.video_url)
    .bind(&n.note_type)
    .bind(&n.cover_image_url)
    .bind(n.likes)
    .bind(n.collects)
    .bind(n.comments)
    .bind(n.publish_date)
    .bind(n.capture_timestamp)
    .bind(n.source.as_str())
    .bind(n.created_at)
    .bind(n.updated_at)
    .execute(conn)
    .await
    .context("insert note")?;
    Ok(res.rows_affected() == 1)
}

async fn update_note(conn: &mut PgConnection, n: &Note) -> anyhow::Result<Option<Note>> {
    let row = sqlx::query_as::<_, NoteRow>(&format!(
        r#"
        UPDATE notes
           SET title = $3, author = $4, content = $5, tags = $6, image_urls = $7,
               video_url = $8, note_type = $9, cover_image_url = $10, likes = $11,
               collects = $12, comments = $13, publish_date = $14, capture_timestamp = $15,
               source = $16, updated_at = $17
         WHERE id = $1 AND user_id = $2
        RETURNING {NOTE_COLUMNS}
        "#
    ))
    .bind(n.id)
    .bind(n.user_id)
    .bind(&n.title)
    .bind(&n.author)
    .bind(&n.content)
    .bind(&n.tags)
    .bind(&n.image_urls)
    .bind(&n.video_url)
    .bind(&n.note_type)
    .bind(&n.cover_image_url)
    .bind(n.likes)
    .bind(n.collects)
    .bind(n.comments)
    .bind(n.publish_date)
    .bind(n.capture_timestamp)
    .bind(n.source.as_str())
    .bind(n.updated_at)
    .fetch_optional(conn)
    .await
    .context("update note")?;
    row.map(Note::try_from).transpose()
}

#[async_trait]
impl NoteRepo for PgNoteRepo {
    async fn reconcile(&self, owner: Uuid, draft: NoteDraft) -> anyhow::Result<Reconciled> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.db.begin().await.context("begin reconcile")?;

        let existing = lock_by_url(&mut tx, owner, &draft.url).await?;
        let mut outcome = reconcile(existing, owner, draft.clone(), now);

        let lost_race = match &outcome {
            Reconciled::Insert(note) => !insert_note(&mut tx, note).await?,
            _ => false,
        };
        if lost_race {
            debug!(user_id = %owner, url = %draft.url, "lost insert race, merging into winner");
            let winner = lock_by_url(&mut tx, owner, &draft.url)
                .await?
                .context("note vanished after insert conflict")?;
            outcome = reconcile(Some(winner), owner, draft, now);
        }
        if let Reconciled::Update(note) = &outcome {
            update_note(&mut tx, note)
                .await?
                .context("locked note missing on update")?;
        }

        tx.commit().await.context("commit reconcile")?;
        Ok(outcome)
    }

    async fn find(&self, owner: Uuid, id: Uuid) -> anyhow::Result<Option<Note>> {
        let row = sqlx::query_as::<_, NoteRow>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await
        .context("find note")?;
        row.map(Note::try_from).transpose()
    }

    async fn list(
        &self,
        owner: Uuid,
        filter: &NoteFilter,
        page: Page,
    ) -> anyhow::Result<(Vec<Note>, i64)> {
        const WHERE: &str = r#"
            WHERE user_id = $1
              AND ($2::text IS NULL OR author = $2)
              AND ($3::text[] IS NULL OR tags && $3)
              AND ($4::text IS NULL OR source = $4)
        "#;
        let source = filter.source.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM notes {WHERE}"))
            .bind(owner)
            .bind(&filter.author)
            .bind(&filter.tags)
            .bind(source)
            .fetch_one(&self.db)
            .await
            .context("count notes")?;

        let rows = sqlx::query_as::<_, NoteRow>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes {WHERE} \
             ORDER BY capture_timestamp DESC, created_at DESC LIMIT $5 OFFSET $6"
        ))
        .bind(owner)
        .bind(&filter.author)
        .bind(&filter.tags)
        .bind(source)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await
        .context("list notes")?;

        let notes = rows
            .into_iter()
            .map(Note::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok((notes, total))
    }

    async fn update(&self, note: &Note) -> anyhow::Result<Option<Note>> {
        let mut conn = self.db.acquire().await.context("acquire connection")?;
        update_note(&mut conn, note).await
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await
            .context("delete note")?;
        Ok(res.rows_affected() > 0)
    }

    async fn count_created_since(
        &self,
        owner: Uuid,
        since: OffsetDateTime,
    ) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notes WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(owner)
        .bind(since)
        .fetch_one(&self.db)
        .await
        .context("count today's notes")?;
        Ok(count)
    }

    async fn totals(&self, owner: Uuid) -> anyhow::Result<NoteTotals> {
        let totals = sqlx::query_as::<_, NoteTotals>(
            r#"
            SELECT COUNT(*)                                  AS total_notes,
                   COALESCE(SUM(likes), 0)::BIGINT           AS total_likes,
                   COALESCE(SUM(collects), 0)::BIGINT        AS total_collects,
                   COALESCE(SUM(comments), 0)::BIGINT        AS total_comments,
                   COUNT(*) FILTER (WHERE note_type = $2)    AS image_notes,
                   COUNT(*) FILTER (WHERE note_type = $3)    AS video_notes
            FROM notes
            WHERE user_id = $1
            "#,
        )
        .bind(owner)
        .bind(IMAGE_NOTE_TYPE)
        .bind(VIDEO_NOTE_TYPE)
        .fetch_one(&self.db)
        .await
        .context("note totals")?;
        Ok(totals)
    }
}
