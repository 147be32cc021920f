use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use super::repo_types::{
    FeaturedPostRow, ManagerPostRow, TransferRequest, TransferRequestRow, TransferStatus,
};
use crate::pagination::{PostSort, Window};

const REQUEST_COLUMNS: &str = "id, post_id, requester_id, status, created_at, reviewed_at";

// ---- Transfer requests ----

pub async fn find_by_post<'e>(
    db: impl PgExecutor<'e>,
    post_id: Uuid,
) -> sqlx::Result<Option<TransferRequest>> {
    sqlx::query_as::<_, TransferRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM transfer_requests WHERE post_id = $1"
    ))
    .bind(post_id)
    .fetch_optional(db)
    .await
}

/// Creates the post's request, or puts a rejected one back to pending.
/// `None` when a pending or approved request already holds the post.
pub async fn submit(
    conn: &mut PgConnection,
    post_id: Uuid,
    requester_id: Uuid,
) -> sqlx::Result<Option<TransferRequest>> {
    sqlx::query_as::<_, TransferRequest>(&format!(
        r#"
        INSERT INTO transfer_requests (post_id, requester_id)
        VALUES ($1, $2)
        ON CONFLICT (post_id) DO UPDATE SET
            requester_id = EXCLUDED.requester_id,
            status = 'pending',
            created_at = now(),
            reviewed_at = NULL
        WHERE transfer_requests.status = 'rejected'
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(post_id)
    .bind(requester_id)
    .fetch_optional(conn)
    .await
}

/// Row-locks the request for the rest of the transaction.
pub async fn lock(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<Option<TransferRequest>> {
    sqlx::query_as::<_, TransferRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM transfer_requests WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn mark_reviewed(
    conn: &mut PgConnection,
    id: Uuid,
    status: TransferStatus,
) -> sqlx::Result<TransferRequest> {
    sqlx::query_as::<_, TransferRequest>(&format!(
        r#"
        UPDATE transfer_requests SET status = $2, reviewed_at = now()
        WHERE id = $1
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status.as_str())
    .fetch_one(conn)
    .await
}

pub async fn list_requests<'e>(
    db: impl PgExecutor<'e>,
    status: Option<TransferStatus>,
) -> sqlx::Result<Vec<TransferRequestRow>> {
    sqlx::query_as::<_, TransferRequestRow>(
        r#"
        SELECT t.id AS request_id, t.post_id, t.status,
               t.created_at AS requested_at, t.reviewed_at,
               p.title, p.content, p.category, p.is_anonymous,
               p.likes_count, p.comments_count,
               a.username AS author_username, a.email AS author_email,
               t.requester_id,
               r.username AS requester_username, r.email AS requester_email
        FROM transfer_requests t
        JOIN posts p ON p.id = t.post_id
        LEFT JOIN users a ON a.id = p.user_id
        LEFT JOIN users r ON r.id = t.requester_id
        WHERE ($1::text IS NULL OR t.status = $1)
        ORDER BY t.created_at DESC
        "#,
    )
    .bind(status.map(TransferStatus::as_str))
    .fetch_all(db)
    .await
}

// ---- Featured posts ----

pub async fn is_featured<'e>(db: impl PgExecutor<'e>, post_id: Uuid) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM useful_posts WHERE post_id = $1)")
        .bind(post_id)
        .fetch_one(db)
        .await
}

/// False when the post is already featured.
pub async fn feature(conn: &mut PgConnection, post_id: Uuid) -> sqlx::Result<bool> {
    let res = sqlx::query(
        "INSERT INTO useful_posts (post_id) VALUES ($1) ON CONFLICT (post_id) DO NOTHING",
    )
    .bind(post_id)
    .execute(conn)
    .await?;
    Ok(res.rows_affected() == 1)
}

pub async fn list_featured<'e>(
    db: impl PgExecutor<'e>,
    sort: PostSort,
    window: Window,
) -> sqlx::Result<Vec<FeaturedPostRow>> {
    sqlx::query_as::<_, FeaturedPostRow>(&format!(
        r#"
        SELECT p.id, p.user_id, p.title, p.content, p.category, p.is_anonymous,
               p.likes_count, p.comments_count, p.created_at,
               u.username, u.avatar_url, f.approved_at
        FROM useful_posts f
        JOIN posts p ON p.id = f.post_id
        LEFT JOIN users u ON u.id = p.user_id
        ORDER BY {}
        LIMIT $1 OFFSET $2
        "#,
        sort.order_by("f.approved_at")
    ))
    .bind(window.limit)
    .bind(window.offset())
    .fetch_all(db)
    .await
}

pub async fn count_featured<'e>(db: impl PgExecutor<'e>) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM useful_posts")
        .fetch_one(db)
        .await
}

// ---- Manager listing ----

pub async fn list_all_posts<'e>(
    db: impl PgExecutor<'e>,
    window: Window,
) -> sqlx::Result<Vec<ManagerPostRow>> {
    sqlx::query_as::<_, ManagerPostRow>(
        r#"
        SELECT p.id, p.title, p.content, p.category, p.is_anonymous,
               p.likes_count, p.comments_count, p.created_at,
               p.user_id, u.username, u.email
        FROM posts p
        LEFT JOIN users u ON u.id = p.user_id
        ORDER BY p.created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(window.limit)
    .bind(window.offset())
    .fetch_all(db)
    .await
}
