use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CreateUserRequest, UpdateUserRequest},
    repo_types::{merge_profile, non_empty, ContactTaken, User, UserUpsert},
};
use crate::{error::AppError, identity::ExternalProfile, state::AppState};

impl From<ExternalProfile> for UserUpsert {
    fn from(p: ExternalProfile) -> Self {
        UserUpsert {
            auth_center_user_id: p.user_id,
            role: None,
            union_id: p.union_id,
            nickname: p.nickname,
            avatar_url: p.avatar_url,
            phone_number: p.phone_number,
            email: p.email,
            profile: p.raw,
        }
    }
}

fn contact_conflict(err: anyhow::Error) -> AppError {
    if err.is::<ContactTaken>() {
        AppError::Conflict(ContactTaken.to_string())
    } else {
        err.into()
    }
}

/// Creates or refreshes the local user for a provider identity.
pub async fn sync_from_profile(
    state: &AppState,
    profile: ExternalProfile,
) -> Result<User, AppError> {
    if profile.user_id.trim().is_empty() {
        return Err(AppError::Upstream("account center returned no user id".into()));
    }
    let user = state
        .users
        .upsert(profile.into())
        .await
        .map_err(contact_conflict)?;
    info!(user_id = %user.id, external_id = %user.auth_center_user_id, "user synced");
    Ok(user)
}

/// Resolves a session's user, treating a vanished row as an expired session.
pub async fn current_user(state: &AppState, user_id: Uuid) -> Result<User, AppError> {
    state.users.find_by_id(user_id).await?.ok_or_else(|| {
        warn!(%user_id, "session refers to a missing user");
        AppError::Unauthorized("user not found".into())
    })
}

pub async fn create_user(state: &AppState, req: CreateUserRequest) -> Result<User, AppError> {
    let input = UserUpsert::from(req);
    if input.auth_center_user_id.is_empty() {
        return Err(AppError::Validation("authCenterUserId is required".into()));
    }
    if input.profile.as_ref().is_some_and(|p| !p.is_object()) {
        return Err(AppError::Validation("profile must be a JSON object".into()));
    }
    match state.users.create(input).await.map_err(contact_conflict)? {
        Some(user) => {
            info!(user_id = %user.id, "user created");
            Ok(user)
        }
        None => Err(AppError::Conflict("user already exists".into())),
    }
}

/// Foreign or unknown ids are indistinguishable.
pub async fn get_own(state: &AppState, caller: Uuid, id: Uuid) -> Result<User, AppError> {
    if caller != id {
        return Err(AppError::not_found("user"));
    }
    state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("user"))
}

pub async fn get_own_by_external_id(
    state: &AppState,
    caller: Uuid,
    external_id: &str,
) -> Result<User, AppError> {
    match state.users.find_by_external_id(external_id).await? {
        Some(user) if user.id == caller => Ok(user),
        _ => Err(AppError::not_found("user")),
    }
}

/// Touches the caller's own row; nothing is fetched from the provider.
pub async fn sync_own(state: &AppState, caller: Uuid, external_id: &str) -> Result<User, AppError> {
    let user = get_own_by_external_id(state, caller, external_id).await?;
    let user = state
        .users
        .upsert(UserUpsert::for_identity(user.auth_center_user_id))
        .await
        .map_err(contact_conflict)?;
    Ok(user)
}

pub async fn update_own(
    state: &AppState,
    caller: Uuid,
    id: Uuid,
    req: UpdateUserRequest,
) -> Result<User, AppError> {
    let mut user = get_own(state, caller, id).await?;
    apply_update(&mut user, req)?;
    let user = state.users.update(&user).await.map_err(contact_conflict)?;
    info!(user_id = %user.id, "user updated");
    Ok(user)
}

pub async fn delete_own(state: &AppState, caller: Uuid, id: Uuid) -> Result<(), AppError> {
    if caller != id || !state.users.delete(id).await? {
        return Err(AppError::not_found("user"));
    }
    info!(user_id = %id, "user deleted");
    Ok(())
}

fn apply_update(user: &mut User, req: UpdateUserRequest) -> Result<(), AppError> {
    fn set(slot: &mut Option<String>, incoming: Option<String>) {
        if incoming.is_some() {
            *slot = non_empty(incoming);
        }
    }
    if let Some(profile) = req.profile {
        if !profile.is_object() {
            return Err(AppError::Validation("profile must be a JSON object".into()));
        }
        merge_profile(&mut user.profile, profile);
    }
    set(&mut user.union_id, req.union_id);
    set(&mut user.nickname, req.nickname);
    set(&mut user.avatar_url, req.avatar_url);
    set(&mut user.phone_number, req.phone_number);
    set(&mut user.email, req.email);
    user.updated_at = OffsetDateTime::now_utc();
    Ok(())
}
