use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::repo_types::{Note, NoteDraft, NoteFilter, Provenance};
use crate::{error::AppError, response::Page};

lazy_static! {
    static ref HTTP_URL: Regex =
        Regex::new(r"^https?://[^\s/?#]+[^\s]*$").expect("url pattern compiles");
}

pub(crate) fn is_http_url(url: &str) -> bool {
    HTTP_URL.is_match(url)
}

/// One capture as sent by the browser extension.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// List pages only carry a single cover image.
    #[serde(default)]
    pub image: Option<String>,
    pub video_url: Option<String>,
    #[serde(default)]
    pub note_type: String,
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub collects: i64,
    #[serde(default)]
    pub comments: i64,
    pub publish_date: Option<i64>,
    pub source: Option<String>,
    pub capture_timestamp: Option<i64>,
}

impl CreateNoteRequest {
    /// Validates and normalizes into a draft; nothing is written on error.
    pub fn into_draft(self) -> Result<NoteDraft, AppError> {
        let url = self.url.trim().to_string();
        if url.is_empty() {
            return Err(AppError::Validation("url is required".into()));
        }
        if !is_http_url(&url) {
            return Err(AppError::Validation(format!("url must be an http(s) URL: {url}")));
        }
        let capture_timestamp = match self.capture_timestamp {
            Some(ts) if ts > 0 => ts,
            Some(_) => {
                return Err(AppError::Validation("captureTimestamp must be positive".into()))
            }
            None => return Err(AppError::Validation("captureTimestamp is required".into())),
        };
        check_counters(self.likes, self.collects, self.comments)?;
        let source = parse_source(self.source.as_deref())?;

        let mut image_urls = clean_list(self.image_urls);
        if image_urls.is_empty() {
            if let Some(image) = blank_to_none(self.image) {
                image_urls.push(image);
            }
        }
        let cover_image_url =
            blank_to_none(self.cover_image_url).or_else(|| image_urls.first().cloned());

        Ok(NoteDraft {
            url,
            title: self.title,
            author: self.author,
            content: self.content,
            tags: clean_list(self.tags),
            image_urls,
            video_url: blank_to_none(self.video_url),
            note_type: self.note_type,
            cover_image_url,
            likes: self.likes,
            collects: self.collects,
            comments: self.comments,
            publish_date: self.publish_date,
            capture_timestamp,
            source,
        })
    }
}

/// Partial edit from the dashboard. `id`, owner and `createdAt` cannot change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image_urls: Option<Vec<String>>,
    pub video_url: Option<String>,
    pub note_type: Option<String>,
    pub cover_image_url: Option<String>,
    pub likes: Option<i64>,
    pub collects: Option<i64>,
    pub comments: Option<i64>,
    pub publish_date: Option<i64>,
    pub source: Option<String>,
}

impl UpdateNoteRequest {
    pub fn apply(self, note: &mut Note) -> Result<(), AppError> {
        check_counters(
            self.likes.unwrap_or(0),
            self.collects.unwrap_or(0),
            self.comments.unwrap_or(0),
        )?;
        if let Some(source) = parse_source(self.source.as_deref())? {
            note.source = source;
        }
        if let Some(v) = self.title {
            note.title = v;
        }
        if let Some(v) = self.author {
            note.author = v;
        }
        if let Some(v) = self.content {
            note.content = v;
        }
        if let Some(v) = self.tags {
            note.tags = clean_list(v);
        }
        if let Some(v) = self.image_urls {
            note.image_urls = clean_list(v);
        }
        if self.video_url.is_some() {
            note.video_url = blank_to_none(self.video_url);
        }
        if let Some(v) = self.note_type {
            note.note_type = v;
        }
        if self.cover_image_url.is_some() {
            note.cover_image_url = blank_to_none(self.cover_image_url);
        }
        if let Some(v) = self.likes {
            note.likes = v;
        }
        if let Some(v) = self.collects {
            note.collects = v;
        }
        if let Some(v) = self.comments {
            note.comments = v;
        }
        if self.publish_date.is_some() {
            note.publish_date = self.publish_date;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListNotesQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub author: Option<String>,
    /// Comma-separated.
    pub tags: Option<String>,
    pub source: Option<String>,
}

impl ListNotesQuery {
    pub fn into_parts(self) -> Result<(NoteFilter, Page), AppError> {
        let tags = self
            .tags
            .map(|raw| clean_list(raw.split(',').map(String::from).collect()))
            .filter(|t| !t.is_empty());
        let filter = NoteFilter {
            author: blank_to_none(self.author),
            tags,
            source: parse_source(self.source.as_deref())?,
        };
        Ok((filter, Page::new(self.page, self.size)))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotesResponse {
    pub notes: Vec<Note>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub count: usize,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: uuid::Uuid,
    pub status: &'static str,
}

fn parse_source(raw: Option<&str>) -> Result<Option<Provenance>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(AppError::Validation),
    }
}

fn check_counters(likes: i64, collects: i64, comments: i64) -> Result<(), AppError> {
    if likes < 0 || collects < 0 || comments < 0 {
        return Err(AppError::Validation(
            "likes, collects and comments must be non-negative".into(),
        ));
    }
    Ok(())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(url: &str) -> CreateNoteRequest {
        CreateNoteRequest {
            url: url.into(),
            capture_timestamp: Some(1_700_000_000_000),
            ..Default::default()
        }
    }

    #[test]
    fn single_image_is_promoted_to_list_and_cover() {
        let draft = CreateNoteRequest {
            image: Some("https://img/x.jpg".into()),
            ..req("https://www.xiaohongshu.com/explore/1")
        }
        .into_draft()
        .unwrap();
        assert_eq!(draft.image_urls, vec!["https://img/x.jpg".to_string()]);
        assert_eq!(draft.cover_image_url.as_deref(), Some("https://img/x.jpg"));
    }

    #[test]
    fn explicit_cover_is_kept() {
        let draft = CreateNoteRequest {
            image_urls: vec!["https://img/1.jpg".into(), "https://img/2.jpg".into()],
            cover_image_url: Some("https://img/2.jpg".into()),
            ..req("https://www.xiaohongshu.com/explore/1")
        }
        .into_draft()
        .unwrap();
        assert_eq!(draft.cover_image_url.as_deref(), Some("https://img/2.jpg"));
        assert_eq!(draft.image_urls.len(), 2);
    }

    #[test]
    fn url_and_timestamp_are_required() {
        assert!(matches!(req("").into_draft(), Err(AppError::Validation(_))));
        assert!(matches!(req("ftp://x/1").into_draft(), Err(AppError::Validation(_))));
        let missing_ts = CreateNoteRequest {
            capture_timestamp: None,
            ..req("https://x.com/1")
        };
        assert!(matches!(missing_ts.into_draft(), Err(AppError::Validation(_))));
    }

    #[test]
    fn unknown_source_and_negative_counts_are_rejected() {
        let bad_source = CreateNoteRequest {
            source: Some("manual".into()),
            ..req("https://x.com/1")
        };
        assert!(bad_source.into_draft().is_err());
        let negative = CreateNoteRequest {
            likes: -1,
            ..req("https://x.com/1")
        };
        assert!(negative.into_draft().is_err());
    }

    #[test]
    fn empty_source_means_auto_classify() {
        let draft = CreateNoteRequest {
            source: Some(String::new()),
            ..req("https://x.com/1")
        }
        .into_draft()
        .unwrap();
        assert_eq!(draft.source, None);
    }

    #[test]
    fn list_query_splits_tags_and_clamps_page() {
        let (filter, page) = ListNotesQuery {
            tags: Some("travel, food,,".into()),
            size: Some(1000),
            source: Some("batch".into()),
            ..Default::default()
        }
        .into_parts()
        .unwrap();
        assert_eq!(filter.tags, Some(vec!["travel".to_string(), "food".to_string()]));
        assert_eq!(filter.source, Some(Provenance::Batch));
        assert_eq!(page.size, Page::MAX_SIZE);
    }
}
