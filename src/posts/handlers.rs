use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{
        CreatePostRequest, LikeResponse, ListPostsQuery, PostResponse, PostView,
        SearchPostsQuery, UpdatePostRequest,
    },
    services,
};
use crate::{
    auth::{dto::MessageResponse, AuthUser},
    error::AppError,
    extract::{Json, Path, Query},
    pagination::Paged,
    state::AppState,
};

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post).get(list_posts))
        .route("/posts/search", get(search_posts))
        .route(
            "/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/posts/:id/like", post(toggle_like))
}

#[instrument(skip(state, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let post = services::create_post(&state, &user, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            message: "Post created successfully".into(),
            post,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(q): Query<ListPostsQuery>,
) -> Result<Json<Paged<PostView>>, AppError> {
    Ok(Json(services::list_posts(&state, &q).await?))
}

#[instrument(skip(state))]
pub async fn search_posts(
    State(state): State<AppState>,
    Query(q): Query<SearchPostsQuery>,
) -> Result<Json<Paged<PostView>>, AppError> {
    Ok(Json(services::search_posts(&state, &q).await?))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PostView>, AppError> {
    Ok(Json(services::get_post(&state, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    let post = services::update_post(&state, &user, id, payload).await?;
    Ok(Json(PostResponse {
        message: "Post updated successfully".into(),
        post,
    }))
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    services::delete_own_post(&state, &user, id).await?;
    Ok(Json(MessageResponse::new("Post deleted successfully")))
}

#[instrument(skip(state))]
pub async fn toggle_like(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LikeResponse>, AppError> {
    let outcome = services::toggle_like(&state, id, user.id).await?;
    let message = if outcome.liked {
        "Post liked"
    } else {
        "Post unliked"
    };
    Ok(Json(LikeResponse {
        message: message.into(),
        liked: outcome.liked,
        likes_count: outcome.likes_count,
    }))
}
