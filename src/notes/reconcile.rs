//! Merge rule for a capture of a URL the owner may already have.
//!
//! The plugin captures the same post twice in practice: once skimmed from a list
//! page (no body text) and once from the detail page (full body). Whichever order
//! they arrive in, the stored note keeps the richest content seen and the latest
//! engagement counters.

use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{has_content, Note, NoteDraft, Provenance};

/// What the repository must do with the outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    /// No note for (owner, url) yet.
    Insert(Note),
    /// Detail already stored and the capture has none; nothing to write.
    Unchanged(Note),
    /// Full-row update of an existing note.
    Update(Note),
}

impl Reconciled {
    pub fn note(&self) -> &Note {
        match self {
            Reconciled::Insert(n) | Reconciled::Unchanged(n) | Reconciled::Update(n) => n,
        }
    }

    pub fn into_note(self) -> Note {
        match self {
            Reconciled::Insert(n) | Reconciled::Unchanged(n) | Reconciled::Update(n) => n,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Reconciled::Insert(_) => "insert",
            Reconciled::Unchanged(_) => "unchanged",
            Reconciled::Update(_) => "update",
        }
    }
}

pub fn reconcile(
    existing: Option<Note>,
    owner: Uuid,
    draft: NoteDraft,
    now: OffsetDateTime,
) -> Reconciled {
    let Some(mut note) = existing else {
        return Reconciled::Insert(new_note(owner, draft, now));
    };

    let incoming_detail = has_content(&draft.content);
    if has_content(&note.content) && !incoming_detail {
        return Reconciled::Unchanged(note);
    }

    note.title = draft.title;
    note.author = draft.author;
    note.likes = draft.likes;
    note.collects = draft.collects;
    note.comments = draft.comments;
    note.publish_date = draft.publish_date;
    note.capture_timestamp = draft.capture_timestamp;

    if incoming_detail {
        note.content = draft.content;
        note.tags = draft.tags;
        note.image_urls = draft.image_urls;
        note.video_url = draft.video_url;
        note.note_type = draft.note_type;
        note.cover_image_url = draft.cover_image_url;
        note.source = Provenance::Single;
    } else {
        note.source = Provenance::Batch;
    }
    note.updated_at = now;
    Reconciled::Update(note)
}

fn new_note(owner: Uuid, draft: NoteDraft, now: OffsetDateTime) -> Note {
    let source = draft
        .source
        .unwrap_or_else(|| Provenance::classify(&draft.content));
    Note {
        id: Uuid::new_v4(),
        user_id: owner,
        url: draft.url,
        title: draft.title,
        author: draft.author,
        content: draft.content,
        tags: draft.tags,
        image_urls: draft.image_urls,
        video_url: draft.video_url,
        note_type: draft.note_type,
        cover_image_url: draft.cover_image_url,
        likes: draft.likes,
        collects: draft.collects,
        comments: draft.comments,
        publish_date: draft.publish_date,
        capture_timestamp: draft.capture_timestamp,
        source,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    const URL: &str = "https://www.xiaohongshu.com/explore/abc";

    fn skim(likes: i64) -> NoteDraft {
        NoteDraft {
            url: URL.into(),
            title: "Weekend in Hangzhou".into(),
            author: "lin".into(),
            likes,
            capture_timestamp: 1_700_000_000_000 + likes,
            image_urls: vec!["https://img/cover.jpg".into()],
            cover_image_url: Some("https://img/cover.jpg".into()),
            ..Default::default()
        }
    }

    fn detail(likes: i64) -> NoteDraft {
        NoteDraft {
            content: "Day one: West Lake at sunrise".into(),
            tags: vec!["travel".into(), "hangzhou".into()],
            image_urls: vec!["https://img/1.jpg".into(), "https://img/2.jpg".into()],
            cover_image_url: Some("https://img/1.jpg".into()),
            note_type: "图文".into(),
            ..skim(likes)
        }
    }

    #[test]
    fn first_capture_inserts_with_classified_source() {
        let owner = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let out = reconcile(None, owner, skim(10), now);
        let Reconciled::Insert(note) = out else {
            panic!("expected insert");
        };
        assert_eq!(note.user_id, owner);
        assert_eq!(note.source, Provenance::Batch);
        assert_eq!(note.created_at, now);

        let out = reconcile(None, owner, detail(10), now);
        assert_eq!(out.note().source, Provenance::Single);
    }

    #[test]
    fn declared_source_wins_on_insert() {
        let draft = NoteDraft {
            source: Some(Provenance::Single),
            ..skim(1)
        };
        let out = reconcile(None, Uuid::new_v4(), draft, OffsetDateTime::now_utc());
        assert_eq!(out.note().source, Provenance::Single);
    }

    #[test]
    fn batch_then_single_then_batch_keeps_detail_and_latest_counts() {
        let owner = Uuid::new_v4();
        let t0 = OffsetDateTime::now_utc();

        let first = reconcile(None, owner, skim(10), t0).into_note();

        let t1 = t0 + Duration::minutes(5);
        let second = reconcile(Some(first.clone()), owner, detail(20), t1);
        assert_eq!(second.label(), "update");
        let second = second.into_note();
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, t0);
        assert_eq!(second.updated_at, t1);
        assert_eq!(second.source, Provenance::Single);
        assert_eq!(second.likes, 20);
        assert_eq!(second.content, "Day one: West Lake at sunrise");
        assert_eq!(second.image_urls.len(), 2);

        let t2 = t1 + Duration::minutes(5);
        let third = reconcile(Some(second.clone()), owner, skim(30), t2);
        let Reconciled::Unchanged(third) = third else {
            panic!("detail must not be overwritten by a skim");
        };
        assert_eq!(third, second);
    }

    #[test]
    fn skim_over_skim_refreshes_metadata_only() {
        let owner = Uuid::new_v4();
        let t0 = OffsetDateTime::now_utc();
        let first = reconcile(None, owner, skim(10), t0).into_note();

        let mut again = skim(42);
        again.title = "Weekend in Hangzhou (updated)".into();
        again.image_urls = vec!["https://img/other.jpg".into()];
        let out = reconcile(Some(first.clone()), owner, again, t0).into_note();

        assert_eq!(out.title, "Weekend in Hangzhou (updated)");
        assert_eq!(out.likes, 42);
        assert_eq!(out.image_urls, first.image_urls);
        assert_eq!(out.source, Provenance::Batch);
    }

    #[test]
    fn detail_over_detail_overwrites_detail_fields() {
        let owner = Uuid::new_v4();
        let t0 = OffsetDateTime::now_utc();
        let first = reconcile(None, owner, detail(1), t0).into_note();

        let mut newer = detail(2);
        newer.content = "edited body".into();
        newer.tags = vec!["food".into()];
        newer.video_url = Some("https://video/1.mp4".into());
        newer.note_type = "视频".into();
        let out = reconcile(Some(first), owner, newer, t0).into_note();

        assert_eq!(out.content, "edited body");
        assert_eq!(out.tags, vec!["food".to_string()]);
        assert_eq!(out.video_url.as_deref(), Some("https://video/1.mp4"));
        assert_eq!(out.note_type, "视频");
    }

    #[test]
    fn reapplying_the_same_capture_is_stable() {
        let owner = Uuid::new_v4();
        let t0 = OffsetDateTime::now_utc();
        let first = reconcile(None, owner, detail(5), t0).into_note();
        let again = reconcile(Some(first.clone()), owner, detail(5), t0).into_note();
        assert_eq!(again, first);
    }
}
