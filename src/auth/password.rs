//! Password hashing and verification.
//!
//! Uses Argon2id with the argon2 crate's default parameters
//! (19 MiB memory, 2 iterations, 1 lane). Both operations are CPU-bound;
//! async callers should go through [`hash_password_blocking`] and
//! [`verify_password_blocking`], which run them on the blocking pool.

use std::sync::OnceLock;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use thiserror::Error;

/// Password-related errors.
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    HashError(String),

    /// Stored hash is not a valid PHC string.
    #[error("invalid password hash format")]
    InvalidHash,

    /// Password verification failed (wrong password).
    #[error("password verification failed")]
    VerificationFailed,

    /// The blocking task running the hasher did not complete.
    #[error("password task failed: {0}")]
    Task(String),
}

/// Hash a password, returning a PHC string that embeds salt and parameters.
///
/// # Examples
///
/// ```
/// use vpspanel::hash_password;
///
/// let hash = hash_password("correct horse").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verify a password against a stored hash.
///
/// Parameters are read from the stored hash, so hashes created with other
/// Argon2 settings still verify.
///
/// # Examples
///
/// ```
/// use vpspanel::{hash_password, verify_password};
///
/// let hash = hash_password("correct horse").unwrap();
/// assert!(verify_password("correct horse", &hash).is_ok());
/// assert!(verify_password("battery staple", &hash).is_err());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::VerificationFailed)
}

/// [`hash_password`] on the blocking thread pool.
pub async fn hash_password_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::Task(e.to_string()))?
}

/// [`verify_password`] on the blocking thread pool.
pub async fn verify_password_blocking(password: String, hash: String) -> Result<(), PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PasswordError::Task(e.to_string()))?
}

/// Spend the same work as a real verification when no account matched,
/// so response time does not reveal whether an identifier exists.
pub async fn verify_against_dummy(password: String) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    let Some(hash) = DUMMY_HASH
        .get_or_init(|| hash_password("vpspanel-dummy-password").ok())
        .clone()
    else {
        return;
    };
    let _ = verify_password_blocking(password, hash).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_format() {
        let hash = hash_password("test_password_123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("$v=19$"));
        assert!(hash.contains("m=19456,t=2,p=1"));
    }

    #[test]
    fn test_hash_password_is_salted() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_wrong() {
        let hash = hash_password("correct_password").unwrap();

        assert!(verify_password("correct_password", &hash).is_ok());
        assert!(matches!(
            verify_password("Correct_password", &hash),
            Err(PasswordError::VerificationFailed)
        ));
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(matches!(
            verify_password("any_password", "not_a_valid_hash"),
            Err(PasswordError::InvalidHash)
        ));
    }

    #[test]
    fn test_password_with_unicode() {
        let hash = hash_password("pässwörd-密码").unwrap();
        assert!(verify_password("pässwörd-密码", &hash).is_ok());
    }

    #[tokio::test]
    async fn test_blocking_variants() {
        let hash = hash_password_blocking("Secret123!".to_string()).await.unwrap();

        assert!(verify_password_blocking("Secret123!".to_string(), hash.clone())
            .await
            .is_ok());
        assert!(verify_password_blocking("secret123!".to_string(), hash)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_verify_against_dummy_completes() {
        verify_against_dummy("whatever".to_string()).await;
    }
}
