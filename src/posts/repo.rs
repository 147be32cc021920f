use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use super::repo_types::{Post, PostRow};
use crate::pagination::{PostSort, Window};

const POST_COLUMNS: &str =
    "id, user_id, title, content, category, is_anonymous, likes_count, comments_count, created_at";

/// Posts joined with their author, aliased `p` and `u`.
pub(crate) const POST_ROW_SELECT: &str = r#"
    SELECT p.id, p.user_id, p.title, p.content, p.category, p.is_anonymous,
           p.likes_count, p.comments_count, p.created_at,
           u.username, u.avatar_url
    FROM posts p
    LEFT JOIN users u ON u.id = p.user_id
"#;

const SEARCH_FILTER: &str = r#"
    ($1::text IS NULL OR p.category = $1)
    AND (
        p.title ILIKE $2
        OR p.content ILIKE $2
        OR EXISTS (
            SELECT 1 FROM comments c
            WHERE c.post_id = p.id AND c.content ILIKE $2
        )
    )
"#;

pub async fn insert<'e>(
    db: impl PgExecutor<'e>,
    user_id: Uuid,
    title: &str,
    content: &str,
    category: &str,
    is_anonymous: bool,
) -> sqlx::Result<Post> {
    sqlx::query_as::<_, Post>(&format!(
        r#"
        INSERT INTO posts (user_id, title, content, category, is_anonymous)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(title)
    .bind(content)
    .bind(category)
    .bind(is_anonymous)
    .fetch_one(db)
    .await
}

pub async fn find<'e>(db: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<Option<Post>> {
    sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Row-locks the post for the rest of the transaction; false if it does not exist.
pub async fn lock(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<bool> {
    let row: Option<Uuid> = sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}

pub async fn get_row<'e>(db: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<Option<PostRow>> {
    sqlx::query_as::<_, PostRow>(&format!("{POST_ROW_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list<'e>(
    db: impl PgExecutor<'e>,
    category: Option<&str>,
    sort: PostSort,
    window: Window,
) -> sqlx::Result<Vec<PostRow>> {
    sqlx::query_as::<_, PostRow>(&format!(
        "{POST_ROW_SELECT} WHERE ($1::text IS NULL OR p.category = $1) ORDER BY {} LIMIT $2 OFFSET $3",
        sort.order_by("p.created_at")
    ))
    .bind(category)
    .bind(window.limit)
    .bind(window.offset())
    .fetch_all(db)
    .await
}

pub async fn count<'e>(db: impl PgExecutor<'e>, category: Option<&str>) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM posts WHERE ($1::text IS NULL OR category = $1)",
    )
    .bind(category)
    .fetch_one(db)
    .await
}

/// `pattern` is a complete ILIKE pattern, already escaped.
pub async fn search<'e>(
    db: impl PgExecutor<'e>,
    pattern: &str,
    category: Option<&str>,
    sort: PostSort,
    window: Window,
) -> sqlx::Result<Vec<PostRow>> {
    sqlx::query_as::<_, PostRow>(&format!(
        "{POST_ROW_SELECT} WHERE {SEARCH_FILTER} ORDER BY {} LIMIT $3 OFFSET $4",
        sort.order_by("p.created_at")
    ))
    .bind(category)
    .bind(pattern)
    .bind(window.limit)
    .bind(window.offset())
    .fetch_all(db)
    .await
}

pub async fn count_search<'e>(
    db: impl PgExecutor<'e>,
    pattern: &str,
    category: Option<&str>,
) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM posts p WHERE {SEARCH_FILTER}"))
        .bind(category)
        .bind(pattern)
        .fetch_one(db)
        .await
}

pub async fn list_by_user<'e>(
    db: impl PgExecutor<'e>,
    user_id: Uuid,
    include_anonymous: bool,
) -> sqlx::Result<Vec<PostRow>> {
    sqlx::query_as::<_, PostRow>(&format!(
        "{POST_ROW_SELECT} WHERE p.user_id = $1 AND ($2 OR NOT p.is_anonymous) ORDER BY p.created_at DESC"
    ))
    .bind(user_id)
    .bind(include_anonymous)
    .fetch_all(db)
    .await
}

pub async fn update<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    title: Option<&str>,
    content: Option<&str>,
    category: Option<&str>,
    is_anonymous: Option<bool>,
) -> sqlx::Result<Post> {
    sqlx::query_as::<_, Post>(&format!(
        r#"
        UPDATE posts SET
            title = COALESCE($2, title),
            content = COALESCE($3, content),
            category = COALESCE($4, category),
            is_anonymous = COALESCE($5, is_anonymous)
        WHERE id = $1
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(title)
    .bind(content)
    .bind(category)
    .bind(is_anonymous)
    .fetch_one(db)
    .await
}

/// Comments, likes, featured entry and transfer request go with it (FK cascade).
pub async fn delete<'e>(db: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<bool> {
    let res = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

// ---- Likes ----

pub async fn remove_like(conn: &mut PgConnection, post_id: Uuid, user_id: Uuid) -> sqlx::Result<bool> {
    let res = sqlx::query("DELETE FROM likes WHERE post_id = $1 AND user_id = $2")
        .bind(post_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected() > 0)
}

/// False when the (post, user) pair already exists.
pub async fn add_like(conn: &mut PgConnection, post_id: Uuid, user_id: Uuid) -> sqlx::Result<bool> {
    let res = sqlx::query(
        "INSERT INTO likes (post_id, user_id) VALUES ($1, $2) ON CONFLICT (post_id, user_id) DO NOTHING",
    )
    .bind(post_id)
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(res.rows_affected() == 1)
}

/// Adds `delta` to likes_count, never going below zero; returns the new count.
pub async fn bump_likes(conn: &mut PgConnection, post_id: Uuid, delta: i32) -> sqlx::Result<i32> {
    sqlx::query_scalar::<_, i32>(
        "UPDATE posts SET likes_count = GREATEST(likes_count + $2, 0) WHERE id = $1 RETURNING likes_count",
    )
    .bind(post_id)
    .bind(delta)
    .fetch_one(conn)
    .await
}

pub async fn likes_count(conn: &mut PgConnection, post_id: Uuid) -> sqlx::Result<i32> {
    sqlx::query_scalar::<_, i32>("SELECT likes_count FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_one(conn)
        .await
}

/// Same contract as `bump_likes`, for comments_count.
pub async fn bump_comments(conn: &mut PgConnection, post_id: Uuid, delta: i32) -> sqlx::Result<i32> {
    sqlx::query_scalar::<_, i32>(
        "UPDATE posts SET comments_count = GREATEST(comments_count + $2, 0) WHERE id = $1 RETURNING comments_count",
    )
    .bind(post_id)
    .bind(delta)
    .fetch_one(conn)
    .await
}
