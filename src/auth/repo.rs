use crate::auth::repo_types::{CodePurpose, User, VerificationCode};
use sqlx::PgExecutor;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, avatar_url, bio, verified, created_at";

impl User {
    /// Find a user by email.
    pub async fn find_by_email<'e>(
        db: impl PgExecutor<'e>,
        email: &str,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(db)
            .await
    }

    /// True when another account already uses `username`.
    pub async fn username_taken<'e>(
        db: impl PgExecutor<'e>,
        username: &str,
        except: Option<Uuid>,
    ) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(username)
        .bind(except)
        .fetch_one(db)
        .await
    }

    /// Create a verified user; registration always consumes a code first.
    pub async fn create<'e>(
        db: impl PgExecutor<'e>,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, verified)
            VALUES ($1, $2, $3, TRUE)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    pub async fn set_password<'e>(
        db: impl PgExecutor<'e>,
        email: &str,
        password_hash: &str,
    ) -> sqlx::Result<bool> {
        let res = sqlx::query("UPDATE users SET password_hash = $1 WHERE email = $2")
            .bind(password_hash)
            .bind(email)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

impl VerificationCode {
    pub async fn insert<'e>(
        db: impl PgExecutor<'e>,
        email: &str,
        code: &str,
        purpose: CodePurpose,
        ttl_minutes: i64,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO verification_codes (email, code, purpose, expires_at)
            VALUES ($1, $2, $3, now() + make_interval(mins => $4))
            "#,
        )
        .bind(email)
        .bind(code)
        .bind(purpose.as_str())
        .bind(ttl_minutes as i32)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Most recent unexpired code for (email, code); `purpose == None` matches any.
    pub async fn find_live<'e>(
        db: impl PgExecutor<'e>,
        email: &str,
        code: &str,
        purpose: Option<CodePurpose>,
    ) -> sqlx::Result<Option<VerificationCode>> {
        sqlx::query_as::<_, VerificationCode>(
            r#"
            SELECT id
            FROM verification_codes
            WHERE email = $1 AND code = $2
              AND ($3::text IS NULL OR purpose = $3)
              AND expires_at > now()
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(code)
        .bind(purpose.map(CodePurpose::as_str))
        .fetch_optional(db)
        .await
    }

    /// Deletes the row; false if a concurrent request already spent it.
    pub async fn consume<'e>(db: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<bool> {
        let res = sqlx::query("DELETE FROM verification_codes WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() == 1)
    }
}

pub struct Managers;

impl Managers {
    pub async fn contains<'e>(db: impl PgExecutor<'e>, email: &str) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM managers WHERE email = $1)")
            .bind(email)
            .fetch_one(db)
            .await
    }

    pub async fn seed<'e>(db: impl PgExecutor<'e>, emails: &[String]) -> sqlx::Result<u64> {
        let res = sqlx::query(
            "INSERT INTO managers (email) SELECT UNNEST($1::text[]) ON CONFLICT (email) DO NOTHING",
        )
        .bind(emails)
        .execute(db)
        .await?;
        Ok(res.rows_affected())
    }
}
