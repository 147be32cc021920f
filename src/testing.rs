//! Fixtures for tests that run against a migrated database.

use crate::{
    auth::{repo_types::User, AuthUser},
    posts::{self, repo_types::Post},
};
use sqlx::PgPool;

pub(crate) async fn user(db: &PgPool, name: &str) -> AuthUser {
    let user = User::create(db, name, &format!("{name}@illinois.edu"), "unused-hash")
        .await
        .expect("insert user");
    AuthUser {
        id: user.id,
        email: user.email,
        username: user.username,
    }
}

pub(crate) async fn post(db: &PgPool, author: &AuthUser, is_anonymous: bool) -> Post {
    posts::repo::insert(db, author.id, "Lost keys", "Near the Union", "Lost & Found", is_anonymous)
        .await
        .expect("insert post")
}

pub(crate) async fn count(db: &PgPool, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .fetch_one(db)
        .await
        .expect("count query")
}
