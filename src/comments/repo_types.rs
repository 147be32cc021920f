use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Comment joined with its author.
#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub is_anonymous: bool,
    pub created_at: OffsetDateTime,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}
