use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CreatePostRequest, ListPostsQuery, PostView, SearchPostsQuery, UpdatePostRequest},
    repo,
    repo_types::Post,
};
use crate::{
    auth::AuthUser,
    error::AppError,
    pagination::{non_empty, Paged, PostSort},
    state::AppState,
};

/// Escapes LIKE metacharacters so the query matches literally.
pub(crate) fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn required(value: &str, what: &str) -> Result<String, AppError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(AppError::validation(format!("{what} is required")));
    }
    Ok(v.to_string())
}

/// `Some("")` is rejected; `None` means unchanged.
fn optional_non_empty(value: Option<&str>, what: &str) -> Result<Option<String>, AppError> {
    value.map(|v| required(v, what)).transpose()
}

pub async fn create_post(
    state: &AppState,
    user: &AuthUser,
    req: CreatePostRequest,
) -> Result<Post, AppError> {
    if req.title.trim().is_empty() || req.content.trim().is_empty() || req.category.trim().is_empty()
    {
        return Err(AppError::validation(
            "Title, content, and category are required",
        ));
    }
    let post = repo::insert(
        &state.db,
        user.id,
        req.title.trim(),
        req.content.trim(),
        req.category.trim(),
        req.is_anonymous,
    )
    .await?;
    info!(
        post_id = %post.id,
        user_id = %user.id,
        username = %user.username,
        anonymous = post.is_anonymous,
        "post created"
    );
    Ok(post)
}

pub async fn list_posts(state: &AppState, q: &ListPostsQuery) -> Result<Paged<PostView>, AppError> {
    let window = q.window();
    let sort = PostSort::parse(q.sort_by.as_deref());
    let category = non_empty(q.category.as_deref());

    let rows = repo::list(&state.db, category, sort, window).await?;
    let total = repo::count(&state.db, category).await?;
    Ok(Paged::new(
        rows.into_iter().map(PostView::public).collect(),
        total,
        window,
    ))
}

pub async fn search_posts(
    state: &AppState,
    q: &SearchPostsQuery,
) -> Result<Paged<PostView>, AppError> {
    let term = non_empty(q.query.as_deref())
        .ok_or_else(|| AppError::validation("Search query is required"))?;
    let pattern = format!("%{}%", escape_like(term));
    let window = q.window();
    let sort = PostSort::parse(q.sort_by.as_deref());
    let category = non_empty(q.category.as_deref());

    let rows = repo::search(&state.db, &pattern, category, sort, window).await?;
    let total = repo::count_search(&state.db, &pattern, category).await?;
    Ok(Paged::new(
        rows.into_iter().map(PostView::public).collect(),
        total,
        window,
    ))
}

pub async fn get_post(state: &AppState, id: Uuid) -> Result<PostView, AppError> {
    repo::get_row(&state.db, id)
        .await?
        .map(PostView::public)
        .ok_or_else(|| AppError::not_found("Post not found"))
}

#[derive(Debug)]
pub struct LikeOutcome {
    pub liked: bool,
    pub likes_count: i32,
}

/// First call likes, second call unlikes. The post row is locked so
/// concurrent toggles on one post serialise and the counter cannot drift.
pub async fn toggle_like(state: &AppState, post_id: Uuid, user_id: Uuid) -> Result<LikeOutcome, AppError> {
    let mut tx = state.db.begin().await?;
    if !repo::lock(&mut tx, post_id).await? {
        return Err(AppError::not_found("Post not found"));
    }

    let outcome = if repo::remove_like(&mut tx, post_id, user_id).await? {
        LikeOutcome {
            liked: false,
            likes_count: repo::bump_likes(&mut tx, post_id, -1).await?,
        }
    } else if repo::add_like(&mut tx, post_id, user_id).await? {
        LikeOutcome {
            liked: true,
            likes_count: repo::bump_likes(&mut tx, post_id, 1).await?,
        }
    } else {
        LikeOutcome {
            liked: true,
            likes_count: repo::likes_count(&mut tx, post_id).await?,
        }
    };

    tx.commit().await?;
    info!(%post_id, %user_id, liked = outcome.liked, "like toggled");
    Ok(outcome)
}

async fn owned_post(state: &AppState, user: &AuthUser, id: Uuid) -> Result<Post, AppError> {
    let post = repo::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;
    if post.user_id != user.id {
        warn!(post_id = %id, user_id = %user.id, "post ownership check failed");
        return Err(AppError::forbidden("You can only modify your own posts"));
    }
    Ok(post)
}

pub async fn update_post(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    req: UpdatePostRequest,
) -> Result<Post, AppError> {
    let title = optional_non_empty(req.title.as_deref(), "Title")?;
    let content = optional_non_empty(req.content.as_deref(), "Content")?;
    let category = optional_non_empty(req.category.as_deref(), "Category")?;

    owned_post(state, user, id).await?;
    let post = repo::update(
        &state.db,
        id,
        title.as_deref(),
        content.as_deref(),
        category.as_deref(),
        req.is_anonymous,
    )
    .await?;
    info!(post_id = %id, "post updated");
    Ok(post)
}

pub async fn delete_own_post(state: &AppState, user: &AuthUser, id: Uuid) -> Result<(), AppError> {
    owned_post(state, user, id).await?;
    repo::delete(&state.db, id).await?;
    info!(post_id = %id, user_id = %user.id, "post deleted by owner");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_quotes_metacharacters() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain text"), "plain text");
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("  hi ", "Title").unwrap(), "hi");
        let err = required("   ", "Title").unwrap_err();
        assert_eq!(err.to_string(), "Title is required");
    }

    #[test]
    fn optional_fields_distinguish_absent_and_blank() {
        assert_eq!(optional_non_empty(None, "Title").unwrap(), None);
        assert_eq!(
            optional_non_empty(Some(" New "), "Title").unwrap().as_deref(),
            Some("New")
        );
        assert!(optional_non_empty(Some(""), "Title").is_err());
    }

    use crate::{state::AppState, testing};

    #[sqlx::test(migrations = "./migrations")]
    async fn like_toggles_and_tracks_count(pool: sqlx::PgPool) {
        let state = AppState::for_tests(pool);
        let alice = testing::user(&state.db, "alice").await;
        let bob = testing::user(&state.db, "bob").await;
        let post = testing::post(&state.db, &alice, false).await;

        let first = toggle_like(&state, post.id, bob.id).await.unwrap();
        assert!(first.liked);
        assert_eq!(first.likes_count, 1);
        assert_eq!(get_post(&state, post.id).await.unwrap().likes_count, 1);

        let second = toggle_like(&state, post.id, bob.id).await.unwrap();
        assert!(!second.liked);
        assert_eq!(second.likes_count, 0);
        assert_eq!(get_post(&state, post.id).await.unwrap().likes_count, 0);
        assert_eq!(testing::count(&state.db, "SELECT COUNT(*) FROM likes").await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn concurrent_likes_keep_count_in_step_with_rows(pool: sqlx::PgPool) {
        let state = AppState::for_tests(pool);
        let alice = testing::user(&state.db, "alice").await;
        let bob = testing::user(&state.db, "bob").await;
        let carol = testing::user(&state.db, "carol").await;
        let post = testing::post(&state.db, &alice, false).await;

        let (a, b) = tokio::join!(
            toggle_like(&state, post.id, bob.id),
            toggle_like(&state, post.id, carol.id)
        );
        a.unwrap();
        b.unwrap();

        let rows = testing::count(&state.db, "SELECT COUNT(*) FROM likes").await;
        assert_eq!(rows, 2);
        assert_eq!(get_post(&state, post.id).await.unwrap().likes_count, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn like_on_missing_post_is_not_found(pool: sqlx::PgPool) {
        let state = AppState::for_tests(pool);
        let bob = testing::user(&state.db, "bob").await;
        let err = toggle_like(&state, Uuid::new_v4(), bob.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn search_matches_metacharacters_literally(pool: sqlx::PgPool) {
        let state = AppState::for_tests(pool);
        let alice = testing::user(&state.db, "alice").await;
        for title in ["100% sure", "1000 sure"] {
            repo::insert(&state.db, alice.id, title, "body", "General", false)
                .await
                .unwrap();
        }

        let q = SearchPostsQuery {
            query: Some("100%".into()),
            page: None,
            limit: None,
            sort_by: None,
            category: None,
        };
        let found = search_posts(&state, &q).await.unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.posts[0].title, "100% sure");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn only_the_owner_edits_or_deletes(pool: sqlx::PgPool) {
        let state = AppState::for_tests(pool);
        let alice = testing::user(&state.db, "alice").await;
        let bob = testing::user(&state.db, "bob").await;
        let post = testing::post(&state.db, &alice, false).await;

        let edit = UpdatePostRequest {
            title: Some("Found keys".into()),
            ..Default::default()
        };
        let err = update_post(&state, &bob, post.id, edit).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(matches!(
            delete_own_post(&state, &bob, post.id).await.unwrap_err(),
            AppError::Forbidden(_)
        ));

        let edit = UpdatePostRequest {
            title: Some("Found keys".into()),
            ..Default::default()
        };
        let updated = update_post(&state, &alice, post.id, edit).await.unwrap();
        assert_eq!(updated.title, "Found keys");
        assert_eq!(updated.content, "Near the Union");

        delete_own_post(&state, &alice, post.id).await.unwrap();
        assert!(matches!(
            get_post(&state, post.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
