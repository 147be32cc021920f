use sqlx::PgExecutor;
use uuid::Uuid;

use super::repo_types::ProfileRow;

pub async fn get_profile<'e>(db: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<Option<ProfileRow>> {
    sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT u.id, u.username, u.email, u.bio, u.avatar_url, u.created_at,
               (SELECT COUNT(*) FROM posts p WHERE p.user_id = u.id) AS total_posts,
               (SELECT COALESCE(SUM(p.likes_count), 0)::BIGINT FROM posts p WHERE p.user_id = u.id)
                   AS total_likes,
               (SELECT COUNT(*) FROM comments c WHERE c.user_id = u.id) AS total_comments
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn exists<'e>(db: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(db)
        .await
}

/// `None` keeps the stored value.
pub async fn update_profile<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    username: Option<&str>,
    bio: Option<&str>,
    avatar_url: Option<&str>,
) -> sqlx::Result<bool> {
    let res = sqlx::query(
        r#"
        UPDATE users SET
            username = COALESCE($2, username),
            bio = COALESCE($3, bio),
            avatar_url = COALESCE($4, avatar_url)
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(username)
    .bind(bio)
    .bind(avatar_url)
    .execute(db)
    .await?;
    Ok(res.rows_affected() > 0)
}
