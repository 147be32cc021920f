use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User profile with read-time aggregates.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub total_posts: i64,
    pub total_likes: i64,
    pub total_comments: i64,
}
