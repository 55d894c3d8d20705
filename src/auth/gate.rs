//! Access gating for the superuser panel.
//!
//! Access is decided by an ordered list of guards; the first guard that
//! fails decides the outcome.

use thiserror::Error;
use tracing::{debug, info};

use crate::db::{Account, AccountRepository};

/// Shown when an authenticated account lacks the privilege.
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to access this page.";

/// The authenticated identity behind a request.
///
/// Rebuilt from the account store on every request, so privilege changes
/// apply without logging in again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub account_id: i64,
    pub username: String,
    pub is_superuser: bool,
}

impl From<&Account> for Principal {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id,
            username: account.username.clone(),
            is_superuser: account.is_superuser,
        }
    }
}

/// Access-gate errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// No authenticated principal.
    #[error("authentication required")]
    Unauthorized,

    /// Authenticated but lacking the required privilege.
    #[error("permission denied")]
    Forbidden,

    /// Account store failure while serving an authorized request.
    #[error("store error: {0}")]
    Store(String),
}

/// A single access requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// A principal must be present.
    Authenticated,
    /// The principal must hold the superuser flag.
    Superuser,
}

impl Guard {
    /// Check this guard against the request's principal.
    ///
    /// # Examples
    ///
    /// ```
    /// use vpspanel::auth::{AccessError, Guard, Principal};
    ///
    /// let alice = Principal { account_id: 2, username: "alice".into(), is_superuser: false };
    ///
    /// assert_eq!(Guard::Authenticated.check(None), Err(AccessError::Unauthorized));
    /// assert!(Guard::Authenticated.check(Some(&alice)).is_ok());
    /// assert_eq!(Guard::Superuser.check(Some(&alice)), Err(AccessError::Forbidden));
    /// ```
    pub fn check(self, principal: Option<&Principal>) -> Result<(), AccessError> {
        match (self, principal) {
            (_, None) => Err(AccessError::Unauthorized),
            (Guard::Authenticated, Some(_)) => Ok(()),
            (Guard::Superuser, Some(p)) if p.is_superuser => Ok(()),
            (Guard::Superuser, Some(_)) => Err(AccessError::Forbidden),
        }
    }
}

/// Guards protecting the administrative panel, in evaluation order.
pub const PANEL_GUARDS: &[Guard] = &[Guard::Authenticated, Guard::Superuser];

/// Run guards in order, stopping at the first failure.
pub fn check_guards(guards: &[Guard], principal: Option<&Principal>) -> Result<(), AccessError> {
    guards.iter().try_for_each(|guard| guard.check(principal))
}

/// Decide panel access and, when granted, load every account ordered by ID.
pub async fn authorize_panel_access(
    principal: Option<&Principal>,
    repo: &AccountRepository<'_>,
) -> Result<Vec<Account>, AccessError> {
    if let Err(e) = check_guards(PANEL_GUARDS, principal) {
        debug!(
            account_id = principal.map(|p| p.account_id),
            reason = %e,
            "Panel access denied"
        );
        return Err(e);
    }

    let accounts = repo
        .list_all()
        .await
        .map_err(|e| AccessError::Store(e.to_string()))?;

    if let Some(p) = principal {
        info!(
            account_id = p.account_id,
            count = accounts.len(),
            "Panel viewed"
        );
    }
    Ok(accounts)
}
