use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle of a transfer request: `pending` then exactly one of
/// `approved` / `rejected`. A rejected request may be resubmitted, which
/// puts the same row back to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
}

impl TransferStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Approved => "approved",
            TransferStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(TransferStatus::Pending),
            "approved" => Some(TransferStatus::Approved),
            "rejected" => Some(TransferStatus::Rejected),
            _ => None,
        }
    }

    /// Manager review: only a pending request can be decided.
    pub fn can_review_to(self, to: TransferStatus) -> bool {
        self == TransferStatus::Pending && to != TransferStatus::Pending
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TransferRequest {
    pub id: Uuid,
    pub post_id: Uuid,
    pub requester_id: Uuid,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub reviewed_at: Option<OffsetDateTime>,
}

impl TransferRequest {
    pub fn status(&self) -> anyhow::Result<TransferStatus> {
        TransferStatus::parse(&self.status)
            .ok_or_else(|| anyhow::anyhow!("unknown transfer status {:?}", self.status))
    }
}

/// Manager view of a request: post, its real author, and the requester.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TransferRequestRow {
    pub request_id: Uuid,
    pub post_id: Uuid,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub requested_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub reviewed_at: Option<OffsetDateTime>,
    pub title: String,
    pub content: String,
    pub category: String,
    pub is_anonymous: bool,
    pub likes_count: i32,
    pub comments_count: i32,
    pub author_username: Option<String>,
    pub author_email: Option<String>,
    pub requester_id: Uuid,
    pub requester_username: Option<String>,
    pub requester_email: Option<String>,
}

/// Manager view of a post; anonymity is not applied.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ManagerPostRow {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    pub is_anonymous: bool,
    pub likes_count: i32,
    pub comments_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub user_id: Uuid,
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Featured post joined with its author, plus the approval time.
#[derive(Debug, Clone, FromRow)]
pub struct FeaturedPostRow {
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
    pub approved_at: OffsetDateTime,
}
