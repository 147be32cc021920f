use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{ProfileView, UpdateProfileRequest},
    repo,
};
use crate::{
    auth::{repo_types::User, AuthUser},
    error::{is_unique_violation, AppError},
    posts::{self, dto::PostView, repo_types::PostRow},
    state::AppState,
};

pub async fn get_profile(state: &AppState, id: Uuid) -> Result<ProfileView, AppError> {
    repo::get_profile(&state.db, id)
        .await?
        .map(ProfileView::from)
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// The owner sees all their posts, anonymous ones included and under their
/// own name; everyone else only sees the named ones.
pub async fn list_user_posts(
    state: &AppState,
    target: Uuid,
    viewer: Option<&AuthUser>,
) -> Result<Vec<PostView>, AppError> {
    if !repo::exists(&state.db, target).await? {
        return Err(AppError::not_found("User not found"));
    }
    let is_owner = viewer.is_some_and(|v| v.id == target);
    let rows = posts::repo::list_by_user(&state.db, target, is_owner).await?;
    let project: fn(PostRow) -> PostView = if is_owner {
        PostView::for_owner
    } else {
        PostView::public
    };
    Ok(rows.into_iter().map(project).collect())
}

pub async fn update_profile(
    state: &AppState,
    requester: &AuthUser,
    target: Uuid,
    req: UpdateProfileRequest,
) -> Result<ProfileView, AppError> {
    if requester.id != target {
        warn!(user_id = %requester.id, %target, "profile update denied");
        return Err(AppError::forbidden("You can only update your own profile"));
    }

    let username = match req.username.as_deref().map(str::trim) {
        Some("") => return Err(AppError::validation("Username cannot be empty")),
        other => other,
    };
    let bio = req.bio.as_deref().map(str::trim);
    let avatar_url = req.avatar_url.as_deref().map(str::trim);

    if let Some(name) = username {
        if User::username_taken(&state.db, name, Some(target)).await? {
            return Err(AppError::conflict("Username already taken"));
        }
    }

    let updated = repo::update_profile(&state.db, target, username, bio, avatar_url)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("Username already taken")
            } else {
                e.into()
            }
        })?;
    if !updated {
        return Err(AppError::not_found("User not found"));
    }

    info!(user_id = %target, "profile updated");
    get_profile(state, target).await
}
