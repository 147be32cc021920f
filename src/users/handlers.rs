use axum::{extract::State, routing::get, Router};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{ProfileView, UpdateProfileRequest},
    services,
};
use crate::{
    auth::AuthUser,
    error::AppError,
    extract::{Json, Path},
    posts::dto::PostView,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/:id", get(get_profile).put(update_profile))
        .route("/users/:id/posts", get(list_user_posts))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileView>, AppError> {
    Ok(Json(services::get_profile(&state, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileView>, AppError> {
    Ok(Json(services::update_profile(&state, &user, id, payload).await?))
}

/// Authentication is optional here; a bad token just means "not the owner".
#[instrument(skip(state))]
pub async fn list_user_posts(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PostView>>, AppError> {
    Ok(Json(
        services::list_user_posts(&state, id, viewer.as_ref()).await?,
    ))
}
