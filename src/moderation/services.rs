use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{FeaturedPostView, FeaturedPostsQuery},
    repo,
    repo_types::{ManagerPostRow, TransferRequest, TransferRequestRow, TransferStatus},
};
use crate::{
    auth::AuthUser,
    error::AppError,
    pagination::{non_empty, PageQuery, Paged, PostSort},
    posts,
    state::AppState,
};

/// `None` or blank means every status.
pub(crate) fn parse_status_filter(raw: Option<&str>) -> Result<Option<TransferStatus>, AppError> {
    match non_empty(raw) {
        None => Ok(None),
        Some(s) => TransferStatus::parse(s)
            .map(Some)
            .ok_or_else(|| AppError::validation("Invalid status filter")),
    }
}

fn already_held(existing: Option<&TransferRequest>) -> AppError {
    match existing.and_then(|r| TransferStatus::parse(&r.status)) {
        Some(TransferStatus::Approved) => AppError::conflict("Post is already in useful posts"),
        _ => AppError::conflict("A transfer request is already pending for this post"),
    }
}

/// Asks managers to feature a post. The post row stays locked until the
/// request is written, so a concurrent delete or second request waits.
pub async fn request_transfer(
    state: &AppState,
    user: &AuthUser,
    post_id: Uuid,
) -> Result<TransferRequest, AppError> {
    let mut tx = state.db.begin().await?;
    if !posts::repo::lock(&mut tx, post_id).await? {
        return Err(AppError::not_found("Post not found"));
    }
    if repo::is_featured(&mut *tx, post_id).await? {
        return Err(AppError::conflict("Post is already in useful posts"));
    }

    let request = match repo::submit(&mut tx, post_id, user.id).await? {
        Some(r) => r,
        None => {
            let existing = repo::find_by_post(&mut *tx, post_id).await?;
            return Err(already_held(existing.as_ref()));
        }
    };

    tx.commit().await?;
    info!(
        request_id = %request.id,
        %post_id,
        user_id = %user.id,
        username = %user.username,
        "transfer requested"
    );
    Ok(request)
}

/// Decides a pending request. Approval also features the post; a post that
/// is already featured fails with a conflict and leaves the request pending.
pub async fn review_request(
    state: &AppState,
    manager: &AuthUser,
    request_id: Uuid,
    decision: TransferStatus,
) -> Result<TransferRequest, AppError> {
    let mut tx = state.db.begin().await?;
    let current = repo::lock(&mut tx, request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Transfer request not found"))?;

    if !current.status()?.can_review_to(decision) {
        warn!(%request_id, status = %current.status, "request already reviewed");
        return Err(AppError::conflict("Transfer request has already been reviewed"));
    }

    if decision == TransferStatus::Approved && !repo::feature(&mut tx, current.post_id).await? {
        return Err(AppError::conflict("Post is already in useful posts"));
    }
    let reviewed = repo::mark_reviewed(&mut tx, request_id, decision).await?;

    tx.commit().await?;
    info!(
        %request_id,
        post_id = %reviewed.post_id,
        manager = %manager.email,
        status = decision.as_str(),
        "transfer request reviewed"
    );
    Ok(reviewed)
}

pub async fn list_requests(
    state: &AppState,
    status: Option<&str>,
) -> Result<Vec<TransferRequestRow>, AppError> {
    let status = parse_status_filter(status)?;
    Ok(repo::list_requests(&state.db, status).await?)
}

pub async fn list_featured(
    state: &AppState,
    q: &FeaturedPostsQuery,
) -> Result<Paged<FeaturedPostView>, AppError> {
    let window = q.window();
    let sort = PostSort::parse(q.sort_by.as_deref());
    let rows = repo::list_featured(&state.db, sort, window).await?;
    let total = repo::count_featured(&state.db).await?;
    Ok(Paged::new(
        rows.into_iter().map(FeaturedPostView::from).collect(),
        total,
        window,
    ))
}

pub async fn list_all_posts(
    state: &AppState,
    q: &PageQuery,
) -> Result<Paged<ManagerPostRow>, AppError> {
    let window = q.window();
    let rows = repo::list_all_posts(&state.db, window).await?;
    let total = posts::repo::count(&state.db, None).await?;
    Ok(Paged::new(rows, total, window))
}

/// Removes any post; its comments, likes, featured row and request cascade.
pub async fn delete_post(state: &AppState, manager: &AuthUser, post_id: Uuid) -> Result<(), AppError> {
    if !posts::repo::delete(&state.db, post_id).await? {
        return Err(AppError::not_found("Post not found"));
    }
    info!(%post_id, manager = %manager.email, "post deleted by manager");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn status_filter_accepts_known_values_and_blank() {
        assert_eq!(parse_status_filter(None).unwrap(), None);
        assert_eq!(parse_status_filter(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_status_filter(Some("pending")).unwrap(),
            Some(TransferStatus::Pending)
        );
        assert_eq!(
            parse_status_filter(Some("rejected")).unwrap(),
            Some(TransferStatus::Rejected)
        );
    }

    #[test]
    fn status_filter_rejects_unknown_values() {
        let err = parse_status_filter(Some("archived")).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn conflict_message_names_what_holds_the_post() {
        let mut existing = TransferRequest {
            id: Uuid::new_v4(),
            post_id: Uuid::new_v4(),
            requester_id: Uuid::new_v4(),
            status: "pending".into(),
            created_at: OffsetDateTime::now_utc(),
            reviewed_at: None,
        };
        assert_eq!(
            already_held(Some(&existing)).to_string(),
            "A transfer request is already pending for this post"
        );
        existing.status = "approved".into();
        assert_eq!(
            already_held(Some(&existing)).to_string(),
            "Post is already in useful posts"
        );
    }

    use crate::testing;

    const FEATURED_ROWS: &str = "SELECT COUNT(*) FROM useful_posts";

    #[sqlx::test(migrations = "./migrations")]
    async fn second_request_blocked_while_pending(pool: sqlx::PgPool) {
        let state = AppState::for_tests(pool);
        let alice = testing::user(&state.db, "alice").await;
        let bob = testing::user(&state.db, "bob").await;
        let post = testing::post(&state.db, &alice, false).await;

        let req = request_transfer(&state, &alice, post.id).await.unwrap();
        assert_eq!(req.status, "pending");
        assert!(req.reviewed_at.is_none());

        let err = request_transfer(&state, &bob, post.id).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "A transfer request is already pending for this post"
        );

        let err = request_transfer(&state, &bob, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn approval_features_once_and_blocks_new_requests(pool: sqlx::PgPool) {
        let state = AppState::for_tests(pool);
        let alice = testing::user(&state.db, "alice").await;
        let boss = testing::user(&state.db, "boss").await;
        let post = testing::post(&state.db, &alice, true).await;
        let req = request_transfer(&state, &alice, post.id).await.unwrap();

        let approved = review_request(&state, &boss, req.id, TransferStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, "approved");
        assert!(approved.reviewed_at.is_some());
        assert_eq!(testing::count(&state.db, FEATURED_ROWS).await, 1);

        let err = review_request(&state, &boss, req.id, TransferStatus::Rejected)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Transfer request has already been reviewed");

        let err = request_transfer(&state, &alice, post.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Post is already in useful posts");

        let q = FeaturedPostsQuery {
            page: None,
            limit: None,
            sort_by: None,
        };
        let featured = list_featured(&state, &q).await.unwrap();
        assert_eq!(featured.total, 1);
        assert_eq!(featured.posts[0].post.id, post.id);
        assert!(featured.posts[0].post.user_id.is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn concurrent_approvals_leave_one_featured_row(pool: sqlx::PgPool) {
        let state = AppState::for_tests(pool);
        let alice = testing::user(&state.db, "alice").await;
        let boss = testing::user(&state.db, "boss").await;
        let post = testing::post(&state.db, &alice, false).await;
        let req = request_transfer(&state, &alice, post.id).await.unwrap();

        let (a, b) = tokio::join!(
            review_request(&state, &boss, req.id, TransferStatus::Approved),
            review_request(&state, &boss, req.id, TransferStatus::Approved)
        );
        let oks = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(oks, 1);
        let err = a.err().or(b.err()).unwrap();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(testing::count(&state.db, FEATURED_ROWS).await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn rejected_request_can_be_resubmitted(pool: sqlx::PgPool) {
        let state = AppState::for_tests(pool);
        let alice = testing::user(&state.db, "alice").await;
        let bob = testing::user(&state.db, "bob").await;
        let boss = testing::user(&state.db, "boss").await;
        let post = testing::post(&state.db, &alice, false).await;
        let first = request_transfer(&state, &alice, post.id).await.unwrap();

        let rejected = review_request(&state, &boss, first.id, TransferStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(rejected.status, "rejected");
        assert_eq!(testing::count(&state.db, FEATURED_ROWS).await, 0);

        let again = request_transfer(&state, &bob, post.id).await.unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(again.status, "pending");
        assert_eq!(again.requester_id, bob.id);
        assert!(again.reviewed_at.is_none());

        let pending = list_requests(&state, Some("pending")).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].requester_username.as_deref(), Some("bob"));
        assert_eq!(pending[0].author_username.as_deref(), Some("alice"));
        assert!(list_requests(&state, Some("rejected")).await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn manager_delete_cascades(pool: sqlx::PgPool) {
        let state = AppState::for_tests(pool);
        let alice = testing::user(&state.db, "alice").await;
        let boss = testing::user(&state.db, "boss").await;
        let post = testing::post(&state.db, &alice, false).await;
        let req = request_transfer(&state, &alice, post.id).await.unwrap();
        review_request(&state, &boss, req.id, TransferStatus::Approved)
            .await
            .unwrap();

        let all = list_all_posts(&state, &PageQuery::default()).await.unwrap();
        assert_eq!(all.total, 1);
        assert_eq!(all.posts[0].email.as_deref(), Some("alice@illinois.edu"));

        delete_post(&state, &boss, post.id).await.unwrap();
        assert_eq!(testing::count(&state.db, FEATURED_ROWS).await, 0);
        assert_eq!(
            testing::count(&state.db, "SELECT COUNT(*) FROM transfer_requests").await,
            0
        );
        let err = delete_post(&state, &boss, post.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
