use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CommentView, CreateCommentRequest},
    repo,
};
use crate::{auth::AuthUser, error::AppError, posts, state::AppState};

pub async fn add_comment(
    state: &AppState,
    user: &AuthUser,
    post_id: Uuid,
    req: CreateCommentRequest,
) -> Result<CommentView, AppError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::validation("Content is required"));
    }

    let mut tx = state.db.begin().await?;
    if !posts::repo::lock(&mut tx, post_id).await? {
        return Err(AppError::not_found("Post not found"));
    }
    let id = repo::insert(&mut tx, post_id, user.id, content, req.is_anonymous).await?;
    posts::repo::bump_comments(&mut tx, post_id, 1).await?;
    let row = repo::get_row(&mut *tx, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("comment {id} vanished inside its own transaction"))?;
    tx.commit().await?;

    info!(comment_id = %id, %post_id, user_id = %user.id, "comment added");
    Ok(row.into())
}

pub async fn list_comments(state: &AppState, post_id: Uuid) -> Result<Vec<CommentView>, AppError> {
    let rows = repo::list_for_post(&state.db, post_id).await?;
    Ok(rows.into_iter().map(CommentView::from).collect())
}

/// Author only; the post's comments_count is decremented, floored at zero.
pub async fn delete_comment(state: &AppState, user: &AuthUser, id: Uuid) -> Result<(), AppError> {
    let mut tx = state.db.begin().await?;
    let (post_id, author_id) = repo::lock(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment not found"))?;

    if author_id != user.id {
        warn!(comment_id = %id, user_id = %user.id, "comment delete denied");
        return Err(AppError::forbidden("You can only delete your own comments"));
    }

    repo::delete(&mut tx, id).await?;
    posts::repo::bump_comments(&mut tx, post_id, -1).await?;
    tx.commit().await?;

    info!(comment_id = %id, %post_id, "comment deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn comment(content: &str, is_anonymous: bool) -> CreateCommentRequest {
        CreateCommentRequest {
            content: content.into(),
            is_anonymous,
        }
    }

    async fn comments_count(state: &AppState, post_id: Uuid) -> i32 {
        posts::services::get_post(state, post_id)
            .await
            .unwrap()
            .comments_count
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn add_and_delete_move_the_counter(pool: sqlx::PgPool) {
        let state = AppState::for_tests(pool);
        let alice = testing::user(&state.db, "alice").await;
        let bob = testing::user(&state.db, "bob").await;
        let post = testing::post(&state.db, &alice, false).await;

        let view = add_comment(&state, &bob, post.id, comment(" same here ", false))
            .await
            .unwrap();
        assert_eq!(view.content, "same here");
        assert_eq!(view.author, "bob");
        assert_eq!(comments_count(&state, post.id).await, 1);

        delete_comment(&state, &bob, view.id).await.unwrap();
        assert_eq!(comments_count(&state, post.id).await, 0);
        assert!(list_comments(&state, post.id).await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn delete_never_takes_the_counter_below_zero(pool: sqlx::PgPool) {
        let state = AppState::for_tests(pool);
        let alice = testing::user(&state.db, "alice").await;
        let post = testing::post(&state.db, &alice, false).await;
        let view = add_comment(&state, &alice, post.id, comment("first", false))
            .await
            .unwrap();

        sqlx::query("UPDATE posts SET comments_count = 0 WHERE id = $1")
            .bind(post.id)
            .execute(&state.db)
            .await
            .unwrap();

        delete_comment(&state, &alice, view.id).await.unwrap();
        assert_eq!(comments_count(&state, post.id).await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn only_the_author_deletes(pool: sqlx::PgPool) {
        let state = AppState::for_tests(pool);
        let alice = testing::user(&state.db, "alice").await;
        let bob = testing::user(&state.db, "bob").await;
        let post = testing::post(&state.db, &alice, false).await;
        let view = add_comment(&state, &bob, post.id, comment("mine", true))
            .await
            .unwrap();
        assert_eq!(view.author, "Anonymous");
        assert!(view.user_id.is_none());

        let err = delete_comment(&state, &alice, view.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(comments_count(&state, post.id).await, 1);

        let err = delete_comment(&state, &bob, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn comments_need_an_existing_post(pool: sqlx::PgPool) {
        let state = AppState::for_tests(pool);
        let bob = testing::user(&state.db, "bob").await;
        let missing = Uuid::new_v4();

        let err = add_comment(&state, &bob, missing, comment("hello", false))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(list_comments(&state, missing).await.unwrap().is_empty());
    }
}
