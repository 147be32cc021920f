use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Post, PostRow};
use crate::pagination::{PageQuery, Window};

pub const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Partial update; absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub is_anonymous: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPostsQuery {
    pub query: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub category: Option<String>,
}

impl ListPostsQuery {
    pub fn window(&self) -> Window {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
        .window()
    }
}

impl SearchPostsQuery {
    pub fn window(&self) -> Window {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
        .window()
    }
}

/// Post as shown to a reader.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    pub is_anonymous: bool,
    pub likes_count: i32,
    pub comments_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub author: String,
    pub author_avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

impl PostView {
    /// Anonymous posts lose every trace of their author.
    pub fn public(row: PostRow) -> Self {
        let hide = row.is_anonymous;
        Self::build(row, hide)
    }

    /// The owner always sees their own name, anonymous or not.
    pub fn for_owner(row: PostRow) -> Self {
        Self::build(row, false)
    }

    fn build(row: PostRow, hide_author: bool) -> Self {
        let (author, author_avatar, user_id) = if hide_author {
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
            title: row.title,
            content: row.content,
            category: row.category,
            is_anonymous: row.is_anonymous,
            likes_count: row.likes_count,
            comments_count: row.comments_count,
            created_at: row.created_at,
            author,
            author_avatar,
            user_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub message: String,
    pub post: Post,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub message: String,
    pub liked: bool,
    pub likes_count: i32,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn row(is_anonymous: bool) -> PostRow {
        PostRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Lost keys".into(),
            content: "Near the Union".into(),
            category: "Lost & Found".into(),
            is_anonymous,
            likes_count: 3,
            comments_count: 1,
            created_at: OffsetDateTime::now_utc(),
            username: Some("alice".into()),
            avatar_url: Some("https://img/alice.png".into()),
        }
    }

    #[test]
    fn public_view_of_named_post_shows_author() {
        let r = row(false);
        let owner = r.user_id;
        let view = PostView::public(r);
        assert_eq!(view.author, "alice");
        assert_eq!(view.author_avatar.as_deref(), Some("https://img/alice.png"));
        assert_eq!(view.user_id, Some(owner));
    }

    #[test]
    fn public_view_of_anonymous_post_hides_author() {
        let view = PostView::public(row(true));
        assert_eq!(view.author, ANONYMOUS);
        assert!(view.author_avatar.is_none());
        assert!(view.user_id.is_none());

        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("alice"));
        assert!(!json.contains("user_id"));
    }

    #[test]
    fn owner_view_of_anonymous_post_keeps_author() {
        let view = PostView::for_owner(row(true));
        assert_eq!(view.author, "alice");
        assert!(view.is_anonymous);
    }

    #[test]
    fn create_request_reads_is_anonymous() {
        let req: CreatePostRequest = serde_json::from_str(
            r#"{"title":"t","content":"c","category":"General","isAnonymous":true}"#,
        )
        .unwrap();
        assert!(req.is_anonymous);

        let req: CreatePostRequest =
            serde_json::from_str(r#"{"title":"t","content":"c","category":"General"}"#).unwrap();
        assert!(!req.is_anonymous);
    }
}
