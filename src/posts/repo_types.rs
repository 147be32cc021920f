use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Post record as stored.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    pub is_anonymous: bool,
    pub likes_count: i32,
    pub comments_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Post joined with its author; never serialised directly, see `PostView`.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    pub is_anonymous: bool,
    pub likes_count: i32,
    pub comments_count: i32,
    pub created_at: OffsetDateTime,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}
