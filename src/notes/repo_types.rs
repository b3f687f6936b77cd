use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const IMAGE_NOTE_TYPE: &str = "图文";
pub const VIDEO_NOTE_TYPE: &str = "视频";

/// How a note was last captured: a full detail-page scrape or a list-page skim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Single,
    Batch,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::Single => "single",
            Provenance::Batch => "batch",
        }
    }

    /// Notes carrying body text come from a detail page.
    pub fn classify(content: &str) -> Self {
        if has_content(content) {
            Provenance::Single
        } else {
            Provenance::Batch
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provenance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Provenance::Single),
            "batch" => Ok(Provenance::Batch),
            other => Err(format!("source must be 'single' or 'batch', got '{other}'")),
        }
    }
}

pub fn has_content(content: &str) -> bool {
    !content.trim().is_empty()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub title: String,
    pub author: String,
    pub content: String,
    pub tags: Vec<String>,
    pub image_urls: Vec<String>,
    pub video_url: Option<String>,
    pub note_type: String,
    pub cover_image_url: Option<String>,
    pub likes: i64,
    pub collects: i64,
    pub comments: i64,
    pub publish_date: Option<i64>,
    pub capture_timestamp: i64,
    pub source: Provenance,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// `notes` row as stored; `source` is TEXT.
#[derive(Debug, FromRow)]
pub struct NoteRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub title: String,
    pub author: String,
    pub content: String,
    pub tags: Vec<String>,
    pub image_urls: Vec<String>,
    pub video_url: Option<String>,
    pub note_type: String,
    pub cover_image_url: Option<String>,
    pub likes: i64,
    pub collects: i64,
    pub comments: i64,
    pub publish_date: Option<i64>,
    pub capture_timestamp: i64,
    pub source: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<NoteRow> for Note {
    type Error = anyhow::Error;

    fn try_from(r: NoteRow) -> Result<Self, Self::Error> {
        let source = r.source.parse::<Provenance>().map_err(anyhow::Error::msg)?;
        Ok(Note {
            id: r.id,
            user_id: r.user_id,
            url: r.url,
            title: r.title,
            author: r.author,
            content: r.content,
            tags: r.tags,
            image_urls: r.image_urls,
            video_url: r.video_url,
            note_type: r.note_type,
            cover_image_url: r.cover_image_url,
            likes: r.likes,
            collects: r.collects,
            comments: r.comments,
            publish_date: r.publish_date,
            capture_timestamp: r.capture_timestamp,
            source,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Validated, normalized capture ready for reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteDraft {
    pub url: String,
    pub title: String,
    pub author: String,
    pub content: String,
    pub tags: Vec<String>,
    pub image_urls: Vec<String>,
    pub video_url: Option<String>,
    pub note_type: String,
    pub cover_image_url: Option<String>,
    pub likes: i64,
    pub collects: i64,
    pub comments: i64,
    pub publish_date: Option<i64>,
    pub capture_timestamp: i64,
    pub source: Option<Provenance>,
}

/// List filters; all present filters must match.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub author: Option<String>,
    /// Matches notes sharing at least one tag.
    pub tags: Option<Vec<String>>,
    pub source: Option<Provenance>,
}

impl NoteFilter {
    pub fn matches(&self, note: &Note) -> bool {
        self.author.as_ref().map_or(true, |a| &note.author == a)
            && self
                .tags
                .as_ref()
                .map_or(true, |tags| note.tags.iter().any(|t| tags.contains(t)))
            && self.source.map_or(true, |s| note.source == s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct NoteTotals {
    pub total_notes: i64,
    pub total_likes: i64,
    pub total_collects: i64,
    pub total_comments: i64,
    pub image_notes: i64,
    pub video_notes: i64,
}
