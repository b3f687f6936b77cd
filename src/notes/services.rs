use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    dto::{BatchResult, CreateNoteRequest, ListNotesQuery, ListNotesResponse, UpdateNoteRequest},
    repo_types::{Note, NoteDraft},
};
use crate::{error::AppError, settings::services::ensure_quota, state::AppState};

pub async fn create_note(
    state: &AppState,
    owner: Uuid,
    req: CreateNoteRequest,
) -> Result<Note, AppError> {
    let draft = req.into_draft()?;
    ensure_quota(state, owner, 1).await?;
    store(state, owner, draft).await
}

/// All items are validated before the quota gate, and the gate runs once for the batch.
pub async fn batch_create_notes(
    state: &AppState,
    owner: Uuid,
    reqs: Vec<CreateNoteRequest>,
) -> Result<BatchResult, AppError> {
    let drafts = reqs
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            r.into_draft().map_err(|e| match e {
                AppError::Validation(msg) => AppError::Validation(format!("notes[{i}]: {msg}")),
                other => other,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if drafts.is_empty() {
        return Ok(BatchResult { count: 0, status: "success" });
    }

    ensure_quota(state, owner, drafts.len()).await?;
    let count = drafts.len();
    for draft in drafts {
        store(state, owner, draft).await?;
    }
    info!(user_id = %owner, count, "note batch stored");
    Ok(BatchResult { count, status: "success" })
}

async fn store(state: &AppState, owner: Uuid, draft: NoteDraft) -> Result<Note, AppError> {
    let outcome = state.notes.reconcile(owner, draft).await?;
    debug!(
        user_id = %owner,
        note_id = %outcome.note().id,
        outcome = outcome.label(),
        "reconcile outcome"
    );
    Ok(outcome.into_note())
}

pub async fn list_notes(
    state: &AppState,
    owner: Uuid,
    query: ListNotesQuery,
) -> Result<ListNotesResponse, AppError> {
    let (filter, page) = query.into_parts()?;
    let (notes, total) = state.notes.list(owner, &filter, page).await?;
    Ok(ListNotesResponse {
        notes,
        total,
        page: page.page,
        size: page.size,
        total_pages: page.total_pages(total),
    })
}

pub async fn get_note(state: &AppState, owner: Uuid, id: Uuid) -> Result<Note, AppError> {
    state
        .notes
        .find(owner, id)
        .await?
        .ok_or_else(|| AppError::not_found("note"))
}

pub async fn update_note(
    state: &AppState,
    owner: Uuid,
    id: Uuid,
    patch: UpdateNoteRequest,
) -> Result<Note, AppError> {
    let mut note = get_note(state, owner, id).await?;
    patch.apply(&mut note)?;
    note.updated_at = OffsetDateTime::now_utc();
    state
        .notes
        .update(&note)
        .await?
        .ok_or_else(|| AppError::not_found("note"))
}

pub async fn delete_note(state: &AppState, owner: Uuid, id: Uuid) -> Result<(), AppError> {
    if !state.notes.delete(owner, id).await? {
        return Err(AppError::not_found("note"));
    }
    info!(user_id = %owner, note_id = %id, "note deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::repo_types::Provenance;

    const URL: &str = "https://www.xiaohongshu.com/explore/abc";

    fn skim(url: &str, likes: i64) -> CreateNoteRequest {
        CreateNoteRequest {
            url: url.into(),
            title: "Weekend in Hangzhou".into(),
            author: "lin".into(),
            likes,
            image: Some("https://img/cover.jpg".into()),
            capture_timestamp: Some(1_700_000_000_000),
            ..Default::default()
        }
    }

    fn detail(url: &str, likes: i64) -> CreateNoteRequest {
        CreateNoteRequest {
            content: "Day one: West Lake at sunrise".into(),
            tags: vec!["travel".into()],
            image: None,
            image_urls: vec!["https://img/1.jpg".into(), "https://img/2.jpg".into()],
            ..skim(url, likes)
        }
    }

    #[tokio::test]
    async fn capture_sequence_keeps_one_note_with_detail() {
        let state = AppState::fake();
        let owner = Uuid::new_v4();

        let a = create_note(&state, owner, skim(URL, 10)).await.unwrap();
        assert_eq!(a.source, Provenance::Batch);
        assert_eq!(a.image_urls, vec!["https://img/cover.jpg".to_string()]);

        let b = create_note(&state, owner, detail(URL, 20)).await.unwrap();
        assert_eq!(b.id, a.id);
        assert_eq!(b.source, Provenance::Single);
        assert_eq!(b.likes, 20);

        let c = create_note(&state, owner, skim(URL, 30)).await.unwrap();
        assert_eq!(c, b);

        let (_, total) = state
            .notes
            .list(owner, &Default::default(), crate::response::Page::new(None, None))
            .await
            .unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn same_url_for_different_owners_are_separate_notes() {
        let state = AppState::fake();
        let a = create_note(&state, Uuid::new_v4(), skim(URL, 1)).await.unwrap();
        let b = create_note(&state, Uuid::new_v4(), skim(URL, 1)).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn disabled_collection_writes_nothing() {
        let state = AppState::fake();
        let owner = Uuid::new_v4();
        state.settings.set_collection_enabled(owner, false).await.unwrap();

        let err = create_note(&state, owner, skim(URL, 1)).await.unwrap_err();
        assert!(matches!(err, AppError::CollectionDisabled));
        let err = batch_create_notes(&state, owner, vec![skim(URL, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CollectionDisabled));

        let since = OffsetDateTime::UNIX_EPOCH;
        assert_eq!(state.notes.count_created_since(owner, since).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn daily_limit_rejects_the_501st_capture() {
        let state = AppState::fake();
        let owner = Uuid::new_v4();
        for chunk in 0..10 {
            let batch = (0..50)
                .map(|i| skim(&format!("https://x.com/n/{}", chunk * 50 + i), 1))
                .collect();
            batch_create_notes(&state, owner, batch).await.unwrap();
        }

        let err = create_note(&state, owner, skim("https://x.com/n/500", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DailyLimitExceeded { limit: 500 }));
        assert_eq!(err.status(), axum::http::StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn batch_over_limit_is_rejected_whole() {
        let state = AppState::fake();
        let owner = Uuid::new_v4();
        let batch = (0..51)
            .map(|i| skim(&format!("https://x.com/n/{i}"), 1))
            .collect();
        let err = batch_create_notes(&state, owner, batch).await.unwrap_err();
        assert!(matches!(err, AppError::BatchLimitExceeded { limit: 50 }));
        let since = OffsetDateTime::UNIX_EPOCH;
        assert_eq!(state.notes.count_created_since(owner, since).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn invalid_item_rejects_the_batch_before_any_write() {
        let state = AppState::fake();
        let owner = Uuid::new_v4();
        let batch = vec![skim("https://x.com/ok", 1), skim("", 1)];
        let err = batch_create_notes(&state, owner, batch).await.unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.starts_with("notes[1]")),
            other => panic!("unexpected {other:?}"),
        }
        let since = OffsetDateTime::UNIX_EPOCH;
        assert_eq!(state.notes.count_created_since(owner, since).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn resubmitting_a_batch_is_idempotent() {
        let state = AppState::fake();
        let owner = Uuid::new_v4();
        let batch = || vec![detail("https://x.com/1", 5), skim("https://x.com/2", 6)];

        batch_create_notes(&state, owner, batch()).await.unwrap();
        let page = crate::response::Page::new(None, None);
        let (before, _) = state.notes.list(owner, &Default::default(), page).await.unwrap();

        let res = batch_create_notes(&state, owner, batch()).await.unwrap();
        assert_eq!(res.count, 2);
        let (after, total) = state.notes.list(owner, &Default::default(), page).await.unwrap();
        assert_eq!(total, 2);
        for (x, y) in before.iter().zip(after.iter()) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.content, y.content);
            assert_eq!(x.source, y.source);
            assert_eq!(x.likes, y.likes);
        }
    }

    #[tokio::test]
    async fn foreign_notes_read_update_and_delete_as_not_found() {
        let state = AppState::fake();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let note = create_note(&state, owner, skim(URL, 1)).await.unwrap();

        assert!(matches!(
            get_note(&state, intruder, note.id).await,
            Err(AppError::NotFound(_))
        ));
        let patch = UpdateNoteRequest {
            title: Some("hijacked".into()),
            ..Default::default()
        };
        assert!(matches!(
            update_note(&state, intruder, note.id, patch).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            delete_note(&state, intruder, note.id).await,
            Err(AppError::NotFound(_))
        ));

        let unchanged = get_note(&state, owner, note.id).await.unwrap();
        assert_eq!(unchanged.title, "Weekend in Hangzhou");
    }

    #[tokio::test]
    async fn list_filters_combine() {
        let state = AppState::fake();
        let owner = Uuid::new_v4();
        create_note(&state, owner, detail("https://x.com/1", 1)).await.unwrap();
        create_note(&state, owner, skim("https://x.com/2", 1)).await.unwrap();
        let mut other_author = detail("https://x.com/3", 1);
        other_author.author = "wu".into();
        create_note(&state, owner, other_author).await.unwrap();

        let res = list_notes(
            &state,
            owner,
            ListNotesQuery {
                author: Some("lin".into()),
                tags: Some("travel".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(res.total, 1);
        assert_eq!(res.notes[0].url, "https://x.com/1");
        assert_eq!(res.total_pages, 1);
    }

    #[tokio::test]
    async fn update_edits_fields_but_keeps_identity() {
        let state = AppState::fake();
        let owner = Uuid::new_v4();
        let note = create_note(&state, owner, skim(URL, 1)).await.unwrap();
        let updated = update_note(
            &state,
            owner,
            note.id,
            UpdateNoteRequest {
                title: Some("renamed".into()),
                tags: Some(vec!["saved".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.id, note.id);
        assert_eq!(updated.created_at, note.created_at);
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.tags, vec!["saved".to_string()]);
    }
}
