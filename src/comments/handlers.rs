use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, post},
    Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CommentResponse, CommentView, CreateCommentRequest},
    services,
};
use crate::{
    auth::{dto::MessageResponse, AuthUser},
    error::AppError,
    extract::{Json, Path},
    state::AppState,
};

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/posts/:id/comments", post(add_comment).get(list_comments))
        .route("/comments/:id", delete(delete_comment))
}

#[instrument(skip(state, payload))]
pub async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let comment = services::add_comment(&state, &user, post_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            message: "Comment added successfully".into(),
            comment,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Vec<CommentView>>, AppError> {
    Ok(Json(services::list_comments(&state, post_id).await?))
}

#[instrument(skip(state))]
pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    services::delete_comment(&state, &user, id).await?;
    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}
