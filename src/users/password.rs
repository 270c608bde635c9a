use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

use crate::error::AppError;

lazy_static! {
    /// Verified against when the username is unknown, so both rejection
    /// paths cost one argon2 verification.
    static ref DUMMY_HASH: Option<String> = hash_password("not-a-real-password").ok();
}

pub fn hash_password(plain: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            AppError::Internal(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Constant-time check of `plain` against a stored PHC hash.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        AppError::Internal(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Runs [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(plain: &str) -> Result<String, AppError> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| AppError::Internal(format!("hash task failed: {e}")))?
}

/// Runs [`verify_password`] on the blocking pool. With `hash == None` a dummy
/// hash is verified instead and the result is always `false`.
pub async fn verify_password_blocking(plain: &str, hash: Option<&str>) -> Result<bool, AppError> {
    let plain = plain.to_owned();
    let stored = hash.map(str::to_owned);
    tokio::task::spawn_blocking(move || match stored {
        Some(hash) => verify_password(&plain, &hash),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(&plain, dummy);
            }
            Ok(false)
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("verify task failed: {e}")))?
}
