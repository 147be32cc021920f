use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{FeaturedPostRow, TransferRequest, TransferRequestRow};
use crate::{
    pagination::{PageQuery, Window},
    posts::{dto::PostView, repo_types::PostRow},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedPostsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
}

impl FeaturedPostsQuery {
    pub fn window(&self) -> Window {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
        .window()
    }
}

#[derive(Debug, Deserialize)]
pub struct TransferRequestsQuery {
    pub status: Option<String>,
}

/// Public projection of a featured post.
#[derive(Debug, Serialize)]
pub struct FeaturedPostView {
    #[serde(flatten)]
    pub post: PostView,
    #[serde(with = "time::serde::rfc3339")]
    pub approved_at: OffsetDateTime,
}

impl From<FeaturedPostRow> for FeaturedPostView {
    fn from(r: FeaturedPostRow) -> Self {
        let approved_at = r.approved_at;
        let post = PostView::public(PostRow {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            content: r.content,
            category: r.category,
            is_anonymous: r.is_anonymous,
            likes_count: r.likes_count,
            comments_count: r.comments_count,
            created_at: r.created_at,
            username: r.username,
            avatar_url: r.avatar_url,
        });
        Self { post, approved_at }
    }
}

#[derive(Debug, Serialize)]
pub struct TransferRequestResponse {
    pub message: String,
    pub request: TransferRequest,
}

#[derive(Debug, Serialize)]
pub struct TransferRequestList {
    pub requests: Vec<TransferRequestRow>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub message: String,
    pub request_id: Uuid,
    pub post_id: Uuid,
    pub status: String,
}

impl From<TransferRequest> for ReviewResponse {
    fn from(r: TransferRequest) -> Self {
        let message = match r.status.as_str() {
            "approved" => "Post moved to useful posts",
            _ => "Transfer request rejected",
        };
        Self {
            message: message.into(),
            request_id: r.id,
            post_id: r.post_id,
            status: r.status,
        }
    }
}
