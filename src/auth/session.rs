//! Authentication session management.
//!
//! Sessions are opaque UUID tokens mapped to account IDs, with an absolute
//! lifetime and an idle timeout. The manager also owns the login limiter
//! that throttles repeated failures per account or identifier.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SessionConfig;

/// Session-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Too many failed attempts for this identifier.
    #[error("login locked for {0} seconds")]
    Locked(u64),

    /// Session has expired (absolute or idle timeout).
    #[error("session expired")]
    Expired,

    /// Session not found.
    #[error("session not found")]
    NotFound,
}

/// Authentication session for a logged-in account.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Unique session token (UUID v4).
    pub token: String,
    /// Account this session belongs to.
    pub account_id: i64,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session expires (absolute timeout).
    pub expires_at: DateTime<Utc>,
    last_activity: Instant,
}

impl AuthSession {
    /// Create a session lasting `duration`.
    pub fn new(account_id: i64, duration: Duration) -> Self {
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(duration)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            token: Uuid::new_v4().to_string(),
            account_id,
            created_at: now,
            expires_at,
            last_activity: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn is_idle(&self, idle_timeout: Duration) -> bool {
        self.last_activity.elapsed() >= idle_timeout
    }

    /// Not expired and not idle.
    pub fn is_valid(&self, idle_timeout: Duration) -> bool {
        !self.is_expired() && !self.is_idle(idle_timeout)
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}

/// Result of a login attempt rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitResult {
    Allowed,
    /// Locked for the remaining duration.
    Locked(Duration),
}

/// What a failed login is counted against.
///
/// A wrong password for a known account counts against the account, so
/// switching between its username and its email shares one budget. Other
/// failures count against the lower-cased identifier that was typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LimitKey {
    Identifier(String),
    Account(i64),
}

impl LimitKey {
    pub fn identifier(identifier: &str) -> Self {
        LimitKey::Identifier(identifier.trim().to_lowercase())
    }
}

#[derive(Debug, Default)]
struct Failures {
    recent: Vec<Instant>,
    locked_until: Option<Instant>,
}

/// Login attempt rate limiter.
///
/// `max_attempts` failures within the window lock the key for the full
/// lockout duration. The identifier does not have to belong to an account,
/// so lockouts reveal nothing about which usernames exist.
#[derive(Debug)]
pub struct LoginLimiter {
    failures: HashMap<LimitKey, Failures>,
    max_attempts: u32,
    window: Duration,
    lockout: Duration,
}

impl LoginLimiter {
    /// Create a limiter; the counting window equals the lockout duration.
    pub fn new(max_attempts: u32, lockout_secs: u64) -> Self {
        Self {
            failures: HashMap::new(),
            max_attempts,
            window: Duration::from_secs(lockout_secs),
            lockout: Duration::from_secs(lockout_secs),
        }
    }

    /// Check if a login attempt is allowed for the given key.
    pub fn check(&mut self, key: &LimitKey) -> LimitResult {
        let now = Instant::now();
        match self.failures.get(key).and_then(|f| f.locked_until) {
            Some(until) if until > now => LimitResult::Locked(until - now),
            Some(_) => {
                self.failures.remove(key);
                LimitResult::Allowed
            }
            None => LimitResult::Allowed,
        }
    }

    /// Record a failed login attempt, locking the key once the limit is hit.
    pub fn record_failure(&mut self, key: LimitKey) {
        let now = Instant::now();
        let window = self.window;
        let failures = self.failures.entry(key.clone()).or_default();
        failures.recent.retain(|t| now.duration_since(*t) < window);
        failures.recent.push(now);

        debug!(key = ?key, attempt_count = failures.recent.len(), "Recorded failed login attempt");

        if failures.recent.len() >= self.max_attempts as usize {
            let until = now
                .checked_add(self.lockout)
                .unwrap_or_else(|| now + Duration::from_secs(u32::MAX as u64));
            failures.locked_until = Some(until);
            failures.recent.clear();
            warn!(key = ?key, lockout_secs = self.lockout.as_secs(), "Login locked");
        }
    }

    /// Forget failures for a key (after a successful login).
    pub fn clear(&mut self, key: &LimitKey) {
        self.failures.remove(key);
    }

    /// Drop entries that are neither locked nor holding recent failures.
    pub fn cleanup(&mut self) {
        let now = Instant::now();
        let window = self.window;
        self.failures.retain(|_, failures| {
            failures.recent.retain(|t| now.duration_since(*t) < window);
            failures.locked_until.is_some_and(|until| until > now) || !failures.recent.is_empty()
        });
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.failures.len()
    }
}

/// Session manager for tracking active sessions.
#[derive(Debug)]
pub struct SessionManager {
    sessions: HashMap<String, AuthSession>,
    limiter: LoginLimiter,
    duration: Duration,
    idle_timeout: Duration,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

impl SessionManager {
    /// Create a session manager from configuration.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            limiter: LoginLimiter::new(config.max_login_attempts, config.lockout_secs),
            duration: Duration::from_secs(config.duration_secs),
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
        }
    }

    /// Fail with [`SessionError::Locked`] if the key is throttled.
    pub fn check_login_allowed(&mut self, key: &LimitKey) -> Result<(), SessionError> {
        match self.limiter.check(key) {
            LimitResult::Allowed => Ok(()),
            LimitResult::Locked(remaining) => {
                warn!(
                    key = ?key,
                    remaining_secs = remaining.as_secs(),
                    "Login attempt blocked: locked"
                );
                Err(SessionError::Locked(remaining.as_secs().max(1)))
            }
        }
    }

    /// Count a failed login against the key.
    pub fn record_failure(&mut self, key: LimitKey) {
        self.limiter.record_failure(key);
    }

    /// Start a session after a successful login, clearing the failure
    /// counts of both the identifier and the account.
    pub fn login(&mut self, identifier: &str, account_id: i64) -> AuthSession {
        self.limiter.clear(&LimitKey::identifier(identifier));
        self.limiter.clear(&LimitKey::Account(account_id));
        self.create(account_id)
    }

    /// Start a session for an account.
    pub fn create(&mut self, account_id: i64) -> AuthSession {
        let session = AuthSession::new(account_id, self.duration);
        self.sessions.insert(session.token.clone(), session.clone());

        info!(account_id = account_id, "Session created");
        session
    }

    /// Look up a valid session and refresh its activity time.
    ///
    /// Expired or idle sessions are removed.
    pub fn get(&mut self, token: &str) -> Result<&AuthSession, SessionError> {
        let valid = match self.sessions.get(token) {
            Some(session) => session.is_valid(self.idle_timeout),
            None => return Err(SessionError::NotFound),
        };
        if !valid {
            self.sessions.remove(token);
            debug!("Removed expired session");
            return Err(SessionError::Expired);
        }

        match self.sessions.get_mut(token) {
            Some(session) => {
                session.touch();
                Ok(&*session)
            }
            None => Err(SessionError::NotFound),
        }
    }

    /// Log out a session by token.
    pub fn logout(&mut self, token: &str) -> bool {
        match self.sessions.remove(token) {
            Some(session) => {
                info!(account_id = session.account_id, "Session logged out");
                true
            }
            None => {
                debug!("Logout: session not found");
                false
            }
        }
    }

    /// Log out all sessions of an account.
    pub fn logout_account(&mut self, account_id: i64) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.account_id != account_id);

        let count = before - self.sessions.len();
        if count > 0 {
            info!(account_id = account_id, count = count, "All account sessions logged out");
        }
        count
    }

    /// Purge expired sessions and stale limiter entries.
    pub fn cleanup(&mut self) -> usize {
        let before = self.sessions.len();
        let idle_timeout = self.idle_timeout;
        self.sessions.retain(|_, s| s.is_valid(idle_timeout));
        self.limiter.cleanup();

        let removed = before - self.sessions.len();
        if removed > 0 {
            debug!(removed = removed, "Cleaned up expired sessions");
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
