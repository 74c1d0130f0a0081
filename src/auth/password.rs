use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::{LedgerError, LedgerResult};

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_password(plain: &str) -> LedgerResult<()> {
    if plain.chars().count() < MIN_PASSWORD_LEN {
        return Err(LedgerError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn hash_password(plain: &str) -> LedgerResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            LedgerError::Internal(format!("password hashing: {e}"))
        })?
        .to_string();
    Ok(hash)
}

/// `false` for a wrong password or a user registered without one.
pub fn verify_password(plain: &str, hash: Option<&str>) -> LedgerResult<bool> {
    let Some(hash) = hash else {
        return Ok(false);
    };
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        LedgerError::Internal(format!("stored password hash: {e}"))
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
