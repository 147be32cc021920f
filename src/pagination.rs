use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// `?page=&limit=` as sent by the client; both optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Clamped page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub page: i64,
    pub limit: i64,
}

impl PageQuery {
    pub fn window(&self) -> Window {
        Window {
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }
}

impl Window {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total + self.limit - 1) / self.limit
        }
    }
}

/// Ordering requested through `sortBy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSort {
    #[default]
    Recent,
    Likes,
    Comments,
    /// Accepted for search; orders like `Recent`.
    Relevance,
}

impl PostSort {
    /// Unknown values fall back to recency.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("likes") => PostSort::Likes,
            Some("comments") => PostSort::Comments,
            Some("relevance") => PostSort::Relevance,
            _ => PostSort::Recent,
        }
    }

    /// ORDER BY body for a posts query aliased `p`; `time_col` is the recency column.
    pub fn order_by(self, time_col: &str) -> String {
        match self {
            PostSort::Likes => format!("p.likes_count DESC, {time_col} DESC"),
            PostSort::Comments => format!("p.comments_count DESC, {time_col} DESC"),
            PostSort::Recent | PostSort::Relevance => format!("{time_col} DESC"),
        }
    }
}

/// Paged list envelope shared by every post listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub posts: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

impl<T> Paged<T> {
    pub fn new(posts: Vec<T>, total: i64, window: Window) -> Self {
        Self {
            posts,
            total,
            page: window.page,
            total_pages: window.total_pages(total),
        }
    }
}

/// Empty or whitespace-only filters mean "no filter".
pub fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_defaults_and_clamps() {
        assert_eq!(PageQuery::default().window(), Window { page: 1, limit: 20 });
        let q = PageQuery {
            page: Some(-3),
            limit: Some(10_000),
        };
        assert_eq!(q.window(), Window { page: 1, limit: 100 });
        let q = PageQuery {
            page: Some(3),
            limit: Some(0),
        };
        assert_eq!(q.window(), Window { page: 3, limit: 1 });
    }

    #[test]
    fn offset_and_total_pages() {
        let w = Window { page: 3, limit: 20 };
        assert_eq!(w.offset(), 40);
        assert_eq!(w.total_pages(0), 0);
        assert_eq!(w.total_pages(1), 1);
        assert_eq!(w.total_pages(20), 1);
        assert_eq!(w.total_pages(21), 2);
    }

    #[test]
    fn sort_parsing_falls_back_to_recent() {
        assert_eq!(PostSort::parse(Some("likes")), PostSort::Likes);
        assert_eq!(PostSort::parse(Some("comments")), PostSort::Comments);
        assert_eq!(PostSort::parse(Some("relevance")), PostSort::Relevance);
        assert_eq!(PostSort::parse(Some("created_at")), PostSort::Recent);
        assert_eq!(PostSort::parse(Some("; DROP TABLE posts")), PostSort::Recent);
        assert_eq!(PostSort::parse(None), PostSort::Recent);
    }

    #[test]
    fn secondary_order_is_recency() {
        assert_eq!(
            PostSort::Likes.order_by("p.created_at"),
            "p.likes_count DESC, p.created_at DESC"
        );
        assert_eq!(
            PostSort::Comments.order_by("f.approved_at"),
            "p.comments_count DESC, f.approved_at DESC"
        );
        assert_eq!(
            PostSort::Relevance.order_by("p.created_at"),
            PostSort::Recent.order_by("p.created_at")
        );
    }

    #[test]
    fn paged_envelope_keys() {
        let json = serde_json::to_string(&Paged::new(vec![1, 2], 41, Window { page: 2, limit: 20 }))
            .unwrap();
        assert_eq!(json, r#"{"posts":[1,2],"total":41,"page":2,"totalPages":3}"#);
    }

    #[test]
    fn non_empty_filter() {
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some(" Housing ")), Some("Housing"));
        assert_eq!(non_empty(None), None);
    }
}
