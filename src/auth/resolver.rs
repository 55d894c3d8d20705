//! Credential resolution: identifier + password to exactly one account.
//!
//! A login identifier may be either the account's username or its email;
//! both are compared case-insensitively. Resolution succeeds only when a
//! single account matches, the password verifies against its stored hash,
//! and the account is still allowed to authenticate.

use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::password::{verify_against_dummy, verify_password_blocking, PasswordError};
use crate::db::{Account, AccountRepository};

/// Shown for every credential failure, whatever the cause.
pub const GENERIC_LOGIN_ERROR: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Why a resolution attempt failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No account has this username or email.
    #[error("no account matches the identifier")]
    NotFound,

    /// An account matched but the password did not verify.
    #[error("invalid credential for account {account_id}")]
    InvalidCredential { account_id: i64 },

    /// The password verified but the account may not authenticate.
    #[error("account is disabled")]
    AccountDisabled,

    /// More than one account matched. The store should make this impossible.
    #[error("identifier matches more than one account")]
    Ambiguous,

    /// The account store or the hasher failed.
    #[error("credential store error: {0}")]
    Store(String),
}

impl ResolveError {
    /// True for failures caused by what the user typed (as opposed to a
    /// server-side fault). These all share [`GENERIC_LOGIN_ERROR`].
    pub fn is_credential_failure(&self) -> bool {
        !matches!(self, ResolveError::Store(_))
    }
}

/// Resolves login credentials to an account.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, identifier: &str, password: &str) -> Result<Account, ResolveError>;
}

/// Matches the identifier against username or email, case-insensitively.
#[derive(Clone)]
pub struct UsernameOrEmailResolver {
    pool: SqlitePool,
}

impl UsernameOrEmailResolver {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialResolver for UsernameOrEmailResolver {
    async fn resolve(&self, identifier: &str, password: &str) -> Result<Account, ResolveError> {
        let repo = AccountRepository::new(&self.pool);
        let mut matches = repo
            .find_by_identifier(identifier)
            .await
            .map_err(|e| ResolveError::Store(e.to_string()))?;

        let account = match matches.len() {
            0 => {
                verify_against_dummy(password.to_string()).await;
                debug!(identifier = %identifier, "No account for identifier");
                return Err(ResolveError::NotFound);
            }
            1 => matches.remove(0),
            _ => {
                error!(
                    identifier = %identifier,
                    "Identifier matches more than one account"
                );
                return Err(ResolveError::Ambiguous);
            }
        };

        match verify_password_blocking(password.to_string(), account.password.clone()).await {
            Ok(()) => {}
            Err(PasswordError::VerificationFailed) => {
                debug!(account_id = account.id, "Password mismatch");
                return Err(ResolveError::InvalidCredential {
                    account_id: account.id,
                });
            }
            Err(PasswordError::InvalidHash) => {
                warn!(account_id = account.id, "Stored password hash is unreadable");
                return Err(ResolveError::InvalidCredential {
                    account_id: account.id,
                });
            }
            Err(e) => return Err(ResolveError::Store(e.to_string())),
        }

        if !account.can_authenticate() {
            warn!(account_id = account.id, "Login refused: account inactive");
            return Err(ResolveError::AccountDisabled);
        }

        Ok(account)
    }
}
