use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::CommentRow;
use crate::posts::dto::ANONYMOUS;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Comment as shown to a reader. `user_id` is only present for named
/// comments so the client can offer "delete" on its own ones.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub is_anonymous: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub author: String,
    pub author_avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

impl From<CommentRow> for CommentView {
    fn from(row: CommentRow) -> Self {
        let (author, author_avatar, user_id) = if row.is_anonymous {
            (ANONYMOUS.to_string(), None, None)
        } else {
            (
                row.username.unwrap_or_else(|| ANONYMOUS.to_string()),
                row.avatar_url,
                Some(row.user_id),
            )
        };
        Self {
            id: row.id,
            post_id: row.post_id,
            content: row.content,
            is_anonymous: row.is_anonymous,
            created_at: row.created_at,
            author,
            author_avatar,
            user_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub message: String,
    pub comment: CommentView,
}
