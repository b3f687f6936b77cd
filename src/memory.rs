//! In-memory repositories and a scripted identity provider for tests.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    api_keys::{
        repo_types::{ApiKey, ApiKeyStats, KeyLimitReached},
        ApiKeyRepo,
    },
    bloggers::{
        repo_types::{Blogger, BloggerDraft},
        BloggerRepo,
    },
    identity::{ExternalProfile, IdentityError, IdentityProvider, VerifiedToken},
    notes::{
        reconcile::{reconcile, Reconciled},
        repo_types::{Note, NoteDraft, NoteFilter, NoteTotals, IMAGE_NOTE_TYPE, VIDEO_NOTE_TYPE},
        NoteRepo,
    },
    response::Page,
    settings::{repo_types::UserSettings, SettingsRepo},
    users::{
        repo_types::{ContactTaken, UserUpsert},
        User, UserRepo,
    },
};

fn paged<T>(rows: Vec<T>, page: Page) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let rows = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.size as usize)
        .collect();
    (rows, total)
}

#[derive(Default)]
pub struct MemoryUserRepo {
    rows: Mutex<HashMap<Uuid, User>>,
}

fn check_contacts(rows: &HashMap<Uuid, User>, candidate: &User) -> anyhow::Result<()> {
    if rows
        .values()
        .any(|u| u.id != candidate.id && u.shares_contact_with(candidate))
    {
        return Err(ContactTaken.into());
    }
    Ok(())
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .find(|u| u.auth_center_user_id == external_id)
            .cloned())
    }

    async fn upsert(&self, input: UserUpsert) -> anyhow::Result<User> {
        let input = input.normalized();
        let now = OffsetDateTime::now_utc();
        let mut rows = self.rows.lock().unwrap();
        let user = match rows
            .values()
            .find(|u| u.auth_center_user_id == input.auth_center_user_id)
        {
            Some(existing) => {
                let mut merged = existing.clone();
                merged.absorb(input, now);
                merged
            }
            None => input.into_new_user(now),
        };
        check_contacts(&rows, &user)?;
        rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn create(&self, input: UserUpsert) -> anyhow::Result<Option<User>> {
        let input = input.normalized();
        let mut rows = self.rows.lock().unwrap();
        if rows
            .values()
            .any(|u| u.auth_center_user_id == input.auth_center_user_id)
        {
            return Ok(None);
        }
        let user = input.into_new_user(OffsetDateTime::now_utc());
        check_contacts(&rows, &user)?;
        rows.insert(user.id, user.clone());
        Ok(Some(user))
    }

    async fn update(&self, user: &User) -> anyhow::Result<User> {
        let mut rows = self.rows.lock().unwrap();
        check_contacts(&rows, user)?;
        let slot = rows
            .get_mut(&user.id)
            .ok_or_else(|| anyhow::anyhow!("user {} vanished", user.id))?;
        *slot = user.clone();
        Ok(slot.clone())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.rows.lock().unwrap().remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemorySettingsRepo {
    rows: Mutex<HashMap<Uuid, UserSettings>>,
}

#[async_trait]
impl SettingsRepo for MemorySettingsRepo {
    async fn get_or_create(&self, user_id: Uuid) -> anyhow::Result<UserSettings> {
        let mut rows = self.rows.lock().unwrap();
        let settings = rows
            .entry(user_id)
            .or_insert_with(|| UserSettings::defaults(user_id, OffsetDateTime::now_utc()));
        Ok(settings.clone())
    }

    async fn set_collection_enabled(
        &self,
        user_id: Uuid,
        enabled: bool,
    ) -> anyhow::Result<UserSettings> {
        let now = OffsetDateTime::now_utc();
        let mut rows = self.rows.lock().unwrap();
        let settings = rows
            .entry(user_id)
            .or_insert_with(|| UserSettings::defaults(user_id, now));
        settings.collection_enabled = enabled;
        settings.updated_at = now;
        Ok(settings.clone())
    }
}

#[derive(Default)]
pub struct MemoryNoteRepo {
    rows: Mutex<Vec<Note>>,
}

#[async_trait]
impl NoteRepo for MemoryNoteRepo {
    async fn reconcile(&self, owner: Uuid, draft: NoteDraft) -> anyhow::Result<Reconciled> {
        let mut rows = self.rows.lock().unwrap();
        let existing = rows
            .iter()
            .find(|n| n.user_id == owner && n.url == draft.url)
            .cloned();
        let outcome = reconcile(existing, owner, draft, OffsetDateTime::now_utc());
        match &outcome {
            Reconciled::Insert(note) => rows.push(note.clone()),
            Reconciled::Update(note) => {
                if let Some(slot) = rows.iter_mut().find(|n| n.id == note.id) {
                    *slot = note.clone();
                }
            }
            Reconciled::Unchanged(_) => {}
        }
        Ok(outcome)
    }

    async fn find(&self, owner: Uuid, id: Uuid) -> anyhow::Result<Option<Note>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|n| n.id == id && n.user_id == owner).cloned())
    }

    async fn list(
        &self,
        owner: Uuid,
        filter: &NoteFilter,
        page: Page,
    ) -> anyhow::Result<(Vec<Note>, i64)> {
        let mut notes: Vec<Note> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == owner && filter.matches(n))
            .cloned()
            .collect();
        notes.sort_by(|a, b| {
            b.capture_timestamp
                .cmp(&a.capture_timestamp)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(paged(notes, page))
    }

    async fn update(&self, note: &Note) -> anyhow::Result<Option<Note>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter_mut()
            .find(|n| n.id == note.id && n.user_id == note.user_id)
            .map(|slot| {
                *slot = note.clone();
                slot.clone()
            }))
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|n| !(n.id == id && n.user_id == owner));
        Ok(rows.len() != before)
    }

    async fn count_created_since(
        &self,
        owner: Uuid,
        since: OffsetDateTime,
    ) -> anyhow::Result<i64> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|n| n.user_id == owner && n.created_at >= since)
            .count() as i64)
    }

    async fn totals(&self, owner: Uuid) -> anyhow::Result<NoteTotals> {
        let rows = self.rows.lock().unwrap();
        let mut t = NoteTotals::default();
        for n in rows.iter().filter(|n| n.user_id == owner) {
            t.total_notes += 1;
            t.total_likes += n.likes;
            t.total_collects += n.collects;
            t.total_comments += n.comments;
            t.image_notes += i64::from(n.note_type == IMAGE_NOTE_TYPE);
            t.video_notes += i64::from(n.note_type == VIDEO_NOTE_TYPE);
        }
        Ok(t)
    }
}

#[derive(Default)]
pub struct MemoryBloggerRepo {
    rows: Mutex<Vec<Blogger>>,
}

#[async_trait]
impl BloggerRepo for MemoryBloggerRepo {
    async fn upsert(&self, owner: Uuid, draft: BloggerDraft) -> anyhow::Result<Blogger> {
        let now = OffsetDateTime::now_utc();
        let mut rows = self.rows.lock().unwrap();
        if let Some(b) = rows
            .iter_mut()
            .find(|b| b.user_id == owner && b.platform_id == draft.platform_id)
        {
            b.overwrite(draft, now);
            return Ok(b.clone());
        }
        let blogger = Blogger::from_draft(owner, draft, now);
        rows.push(blogger.clone());
        Ok(blogger)
    }

    async fn find(&self, owner: Uuid, id: Uuid) -> anyhow::Result<Option<Blogger>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|b| b.id == id && b.user_id == owner).cloned())
    }

    async fn find_by_platform_id(
        &self,
        owner: Uuid,
        platform_id: &str,
    ) -> anyhow::Result<Option<Blogger>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|b| b.user_id == owner && b.platform_id == platform_id)
            .cloned())
    }

    async fn list(&self, owner: Uuid, page: Page) -> anyhow::Result<(Vec<Blogger>, i64)> {
        let mut bloggers: Vec<Blogger> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.user_id == owner)
            .cloned()
            .collect();
        bloggers.sort_by(|a, b| {
            b.followers_count
                .cmp(&a.followers_count)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(paged(bloggers, page))
    }

    async fn update(&self, blogger: &Blogger) -> anyhow::Result<Option<Blogger>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter_mut()
            .find(|b| b.id == blogger.id && b.user_id == blogger.user_id)
            .map(|slot| {
                *slot = blogger.clone();
                slot.clone()
            }))
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|b| !(b.id == id && b.user_id == owner));
        Ok(rows.len() != before)
    }

    async fn count(&self, owner: Uuid) -> anyhow::Result<i64> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().filter(|b| b.user_id == owner).count() as i64)
    }
}

#[derive(Default)]
pub struct MemoryApiKeyRepo {
    rows: Mutex<Vec<ApiKey>>,
}

#[async_trait]
impl ApiKeyRepo for MemoryApiKeyRepo {
    async fn create(&self, key: &ApiKey) -> anyhow::Result<()> {
        let mut rows = self.rows.lock().unwrap();
        anyhow::ensure!(rows.iter().all(|k| k.key != key.key), "duplicate api key");
        if rows.iter().any(|k| k.user_id == key.user_id) {
            return Err(KeyLimitReached.into());
        }
        rows.push(key.clone());
        Ok(())
    }

    async fn list_for_user(&self, owner: Uuid) -> anyhow::Result<Vec<ApiKey>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().filter(|k| k.user_id == owner).cloned().collect())
    }

    async fn find_by_secret(&self, secret: &str) -> anyhow::Result<Option<ApiKey>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|k| k.key == secret).cloned())
    }

    async fn deactivate(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|k| k.id == id && k.user_id == owner) {
            Some(k) => {
                k.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|k| !(k.id == id && k.user_id == owner));
        Ok(rows.len() != before)
    }

    async fn touch_last_used(&self, id: Uuid, at: OffsetDateTime) -> anyhow::Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let key = rows
            .iter_mut()
            .find(|k| k.id == id)
            .ok_or_else(|| anyhow::anyhow!("api key {id} not found"))?;
        key.last_used = Some(at);
        Ok(())
    }

    async fn stats(&self, owner: Uuid) -> anyhow::Result<ApiKeyStats> {
        let rows = self.rows.lock().unwrap();
        let mine: Vec<&ApiKey> = rows.iter().filter(|k| k.user_id == owner).collect();
        Ok(ApiKeyStats {
            total_keys: mine.len() as i64,
            active_keys: mine.iter().filter(|k| k.is_active).count() as i64,
            last_used: mine.iter().filter_map(|k| k.last_used).max(),
        })
    }
}

/// Identity provider answering from fixed code and token tables.
#[derive(Default)]
pub struct FakeIdentity {
    codes: HashMap<String, ExternalProfile>,
    tokens: HashMap<String, ExternalProfile>,
    unreachable: bool,
}

impl FakeIdentity {
    pub fn with_code(mut self, code: &str, profile: ExternalProfile) -> Self {
        self.codes.insert(code.into(), profile);
        self
    }

    pub fn with_token(mut self, token: &str, profile: ExternalProfile) -> Self {
        self.tokens.insert(token.into(), profile);
        self
    }

    /// Every call fails as if the network were down.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    fn reachable(&self) -> Result<(), IdentityError> {
        if self.unreachable {
            return Err(IdentityError::Transport("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn exchange_code(
        &self,
        code: &str,
        _login_type: &str,
    ) -> Result<ExternalProfile, IdentityError> {
        self.reachable()?;
        self.codes
            .get(code)
            .cloned()
            .ok_or_else(|| IdentityError::Rejected("invalid authorization code".into()))
    }

    async fn verify_token(&self, token: &str) -> Result<VerifiedToken, IdentityError> {
        self.reachable()?;
        Ok(match self.tokens.get(token) {
            Some(p) => VerifiedToken { valid: true, user_id: p.user_id.clone() },
            None => VerifiedToken { valid: false, user_id: String::new() },
        })
    }

    async fn fetch_profile(&self, token: &str) -> Result<ExternalProfile, IdentityError> {
        self.reachable()?;
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::Rejected("invalid token".into()))
    }

    fn login_url(&self, callback_url: &str) -> String {
        format!("https://auth.test/login?callbackUrl={callback_url}")
    }
}
