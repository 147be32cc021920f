use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::ProfileRow;

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub total_posts: i64,
    pub total_likes: i64,
    pub total_comments: i64,
}

impl From<ProfileRow> for ProfileView {
    fn from(r: ProfileRow) -> Self {
        Self {
            id: r.id,
            username: r.username,
            email: r.email,
            bio: r.bio,
            avatar_url: r.avatar_url,
            created_at: r.created_at,
            total_posts: r.total_posts,
            total_likes: r.total_likes,
            total_comments: r.total_comments,
        }
    }
}
