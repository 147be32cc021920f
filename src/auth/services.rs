use axum::extract::FromRef;
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        jwt::JwtKeys,
        password::{hash_password, meets_min_length, verify_password},
        repo::Managers,
        repo_types::{CodePurpose, User, VerificationCode},
    },
    error::{is_unique_violation, AppError},
    mail::verification_mail,
    state::AppState,
};

/// Shown by the verify-code check.
const UNKNOWN_CODE: &str = "Invalid or expired code";
/// Shown when register or reset cannot spend the code.
const STALE_CODE: &str = "Invalid or expired verification code";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// `email` must already be normalised.
pub(crate) fn in_domain(email: &str, domain: &str) -> bool {
    let domain = domain.trim_start_matches('@').to_lowercase();
    email
        .rsplit_once('@')
        .map(|(local, d)| !local.is_empty() && d == domain)
        .unwrap_or(false)
}

/// Uniform six-digit code, 100000..=999999.
pub(crate) fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

fn check_password(state: &AppState, password: &str) -> Result<(), AppError> {
    let min = state.config.accounts.min_password_len;
    if !meets_min_length(password, min) {
        return Err(AppError::validation(format!(
            "Password must be at least {min} characters"
        )));
    }
    Ok(())
}

fn check_registration_email(state: &AppState, email: &str) -> Result<(), AppError> {
    let domain = &state.config.accounts.email_domain;
    if !is_valid_email(email) || !in_domain(email, domain) {
        return Err(AppError::validation(format!(
            "Email must be @{}",
            domain.trim_start_matches('@')
        )));
    }
    Ok(())
}

pub async fn send_verification(state: &AppState, email: &str, purpose: &str) -> Result<(), AppError> {
    let email = normalize_email(email);
    if email.is_empty() || purpose.is_empty() {
        return Err(AppError::validation("Email and type are required"));
    }
    let purpose = CodePurpose::parse(purpose)
        .ok_or_else(|| AppError::validation("Type must be 'register' or 'reset'"))?;

    if purpose == CodePurpose::Register {
        check_registration_email(state, &email)?;
    }

    let existing = User::find_by_email(&state.db, &email).await?;
    match purpose {
        CodePurpose::Register => {
            if existing.is_some() {
                return Err(AppError::conflict("Email already registered"));
            }
        }
        CodePurpose::Reset => {
            if existing.is_none() {
                return Err(AppError::validation("Email not found"));
            }
        }
    }

    let code = generate_code();
    let ttl = state.config.accounts.code_ttl_minutes;
    VerificationCode::insert(&state.db, &email, &code, purpose, ttl).await?;

    state
        .mailer
        .send(verification_mail(&email, &code, ttl))
        .await
        .map_err(AppError::Delivery)?;

    info!(email = %email, purpose = purpose.as_str(), "verification code issued");
    Ok(())
}

/// Existence check only; the code stays spendable.
pub async fn verify_code(state: &AppState, email: &str, code: &str) -> Result<(), AppError> {
    let email = normalize_email(email);
    let code = code.trim();
    if email.is_empty() || code.is_empty() {
        return Err(AppError::validation("Email and code are required"));
    }
    VerificationCode::find_live(&state.db, &email, code, None)
        .await?
        .ok_or(AppError::InvalidCode(UNKNOWN_CODE))?;
    Ok(())
}

pub async fn register(
    state: &AppState,
    username: &str,
    email: &str,
    password: &str,
    code: &str,
) -> Result<User, AppError> {
    let username = username.trim();
    let email = normalize_email(email);
    let code = code.trim();
    if username.is_empty() || email.is_empty() || password.is_empty() || code.is_empty() {
        return Err(AppError::validation("All fields are required"));
    }
    check_registration_email(state, &email)?;
    check_password(state, password)?;

    let hash = hash_password(password)?;

    let mut tx = state.db.begin().await?;

    let live = VerificationCode::find_live(&mut *tx, &email, code, Some(CodePurpose::Register))
        .await?
        .ok_or(AppError::InvalidCode(STALE_CODE))?;

    if User::find_by_email(&mut *tx, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::conflict("Email already registered"));
    }
    if User::username_taken(&mut *tx, username, None).await? {
        warn!(username = %username, "username already taken");
        return Err(AppError::conflict("Username already taken"));
    }

    if !VerificationCode::consume(&mut *tx, live.id).await? {
        return Err(AppError::InvalidCode(STALE_CODE));
    }

    let user = User::create(&mut *tx, username, &email, &hash)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("Username or email already registered")
            } else {
                e.into()
            }
        })?;

    tx.commit().await?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
    pub is_manager: bool,
}

pub async fn login(state: &AppState, email: &str, password: &str) -> Result<LoginOutcome, AppError> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = JwtKeys::from_ref(state).sign(&user)?;
    let is_manager = Managers::contains(&state.db, &user.email).await?;

    info!(user_id = %user.id, is_manager, "user logged in");
    Ok(LoginOutcome {
        user,
        token,
        is_manager,
    })
}

pub async fn reset_password(
    state: &AppState,
    email: &str,
    code: &str,
    new_password: &str,
) -> Result<(), AppError> {
    let email = normalize_email(email);
    let code = code.trim();
    if email.is_empty() || code.is_empty() || new_password.is_empty() {
        return Err(AppError::validation("All fields are required"));
    }
    check_password(state, new_password)?;

    let hash = hash_password(new_password)?;
    let mut tx = state.db.begin().await?;

    let live = VerificationCode::find_live(&mut *tx, &email, code, Some(CodePurpose::Reset))
        .await?
        .ok_or(AppError::InvalidCode(STALE_CODE))?;

    if !User::set_password(&mut *tx, &email, &hash).await? {
        return Err(AppError::validation("User not found"));
    }
    if !VerificationCode::consume(&mut *tx, live.id).await? {
        return Err(AppError::InvalidCode(STALE_CODE));
    }

    tx.commit().await?;
    info!(email = %email, "password reset");
    Ok(())
}
