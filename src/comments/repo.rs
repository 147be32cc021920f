use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use super::repo_types::CommentRow;

const COMMENT_ROW_SELECT: &str = r#"
    SELECT c.id, c.post_id, c.user_id, c.content, c.is_anonymous, c.created_at,
           u.username, u.avatar_url
    FROM comments c
    LEFT JOIN users u ON u.id = c.user_id
"#;

pub async fn insert(
    conn: &mut PgConnection,
    post_id: Uuid,
    user_id: Uuid,
    content: &str,
    is_anonymous: bool,
) -> sqlx::Result<Uuid> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO comments (post_id, user_id, content, is_anonymous)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .bind(content)
    .bind(is_anonymous)
    .fetch_one(conn)
    .await
}

pub async fn get_row<'e>(db: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<Option<CommentRow>> {
    sqlx::query_as::<_, CommentRow>(&format!("{COMMENT_ROW_SELECT} WHERE c.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Oldest first.
pub async fn list_for_post<'e>(
    db: impl PgExecutor<'e>,
    post_id: Uuid,
) -> sqlx::Result<Vec<CommentRow>> {
    sqlx::query_as::<_, CommentRow>(&format!(
        "{COMMENT_ROW_SELECT} WHERE c.post_id = $1 ORDER BY c.created_at ASC"
    ))
    .bind(post_id)
    .fetch_all(db)
    .await
}

/// (post_id, author_id) of a comment, locking it for the transaction.
pub async fn lock(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<Option<(Uuid, Uuid)>> {
    sqlx::query_as::<_, (Uuid, Uuid)>(
        "SELECT post_id, user_id FROM comments WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn delete(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<bool> {
    let res = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected() > 0)
}
