use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

fn argon_err(what: &'static str) -> impl Fn(argon2::password_hash::Error) -> anyhow::Error {
    move |e| {
        error!(error = %e, "argon2 {what} failed");
        anyhow::anyhow!("argon2 {what}: {e}")
    }
}

/// Length is counted in characters, not bytes.
pub fn meets_min_length(plain: &str, min_len: usize) -> bool {
    plain.chars().count() >= min_len
}

/// PHC string with a fresh random salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(argon_err("hash"))?
        .to_string())
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(argon_err("parse"))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
