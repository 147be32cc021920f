use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{
        FeaturedPostView, FeaturedPostsQuery, ReviewResponse, TransferRequestList,
        TransferRequestResponse, TransferRequestsQuery,
    },
    repo_types::{ManagerPostRow, TransferStatus},
    services,
};
use crate::{
    auth::{dto::MessageResponse, AuthUser, ManagerUser},
    error::AppError,
    extract::{Json, Path, Query},
    pagination::{PageQuery, Paged},
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/useful-posts", get(list_featured))
        .route("/posts/:id/request-transfer", post(request_transfer))
}

pub fn manager_routes() -> Router<AppState> {
    Router::new()
        .route("/manager/all-posts", get(list_all_posts))
        .route("/manager/transfer-requests", get(list_requests))
        .route("/manager/transfer-requests/:id/approve", post(approve_request))
        .route("/manager/transfer-requests/:id/reject", post(reject_request))
        .route("/manager/posts/:id", delete(delete_post))
}

#[instrument(skip(state))]
pub async fn list_featured(
    State(state): State<AppState>,
    Query(q): Query<FeaturedPostsQuery>,
) -> Result<Json<Paged<FeaturedPostView>>, AppError> {
    Ok(Json(services::list_featured(&state, &q).await?))
}

#[instrument(skip(state))]
pub async fn request_transfer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<TransferRequestResponse>), AppError> {
    let request = services::request_transfer(&state, &user, id).await?;
    Ok((
        StatusCode::CREATED,
        Json(TransferRequestResponse {
            message: "Transfer request submitted".into(),
            request,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_all_posts(
    State(state): State<AppState>,
    ManagerUser(_manager): ManagerUser,
    Query(q): Query<PageQuery>,
) -> Result<Json<Paged<ManagerPostRow>>, AppError> {
    Ok(Json(services::list_all_posts(&state, &q).await?))
}

#[instrument(skip(state))]
pub async fn list_requests(
    State(state): State<AppState>,
    ManagerUser(_manager): ManagerUser,
    Query(q): Query<TransferRequestsQuery>,
) -> Result<Json<TransferRequestList>, AppError> {
    let requests = services::list_requests(&state, q.status.as_deref()).await?;
    Ok(Json(TransferRequestList { requests }))
}

#[instrument(skip(state))]
pub async fn approve_request(
    State(state): State<AppState>,
    ManagerUser(manager): ManagerUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ReviewResponse>, AppError> {
    let reviewed =
        services::review_request(&state, &manager, id, TransferStatus::Approved).await?;
    Ok(Json(reviewed.into()))
}

#[instrument(skip(state))]
pub async fn reject_request(
    State(state): State<AppState>,
    ManagerUser(manager): ManagerUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ReviewResponse>, AppError> {
    let reviewed =
        services::review_request(&state, &manager, id, TransferStatus::Rejected).await?;
    Ok(Json(reviewed.into()))
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    ManagerUser(manager): ManagerUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    services::delete_post(&state, &manager, id).await?;
    Ok(Json(MessageResponse::new("Post deleted successfully")))
}
