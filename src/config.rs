//! Configuration module for vpspanel.

use serde::Deserialize;
use std::path::Path;

use crate::{PanelError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/vpspanel.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/vpspanel.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Upper bound for every duration in [`SessionConfig`] (ten years).
pub const MAX_DURATION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Session and login throttling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Mark the cookie `Secure` (only sent over HTTPS).
    #[serde(default)]
    pub cookie_secure: bool,
    /// Absolute session lifetime in seconds.
    #[serde(default = "default_session_duration")]
    pub duration_secs: u64,
    /// Idle timeout in seconds.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    /// Failed logins per account (or unknown identifier) before lockout.
    #[serde(default = "default_max_login_attempts")]
    pub max_login_attempts: u32,
    /// Lockout duration in seconds.
    #[serde(default = "default_lockout")]
    pub lockout_secs: u64,
}

fn default_cookie_name() -> String {
    "vpspanel_session".to_string()
}

fn default_session_duration() -> u64 {
    14 * 24 * 60 * 60 // two weeks
}

fn default_idle_timeout() -> u64 {
    2 * 60 * 60
}

fn default_max_login_attempts() -> u32 {
    5
}

fn default_lockout() -> u64 {
    5 * 60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            cookie_secure: false,
            duration_secs: default_session_duration(),
            idle_timeout_secs: default_idle_timeout(),
            max_login_attempts: default_max_login_attempts(),
            lockout_secs: default_lockout(),
        }
    }
}

/// Initial superuser, created at startup when no superuser exists yet.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Username of the bootstrap superuser.
    #[serde(default)]
    pub username: String,
    /// Password of the bootstrap superuser.
    #[serde(default)]
    pub password: String,
    /// Optional email address.
    #[serde(default)]
    pub email: Option<String>,
}

impl AdminConfig {
    /// Whether enough is configured to create the bootstrap account.
    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| PanelError::Config(format!("config parse error: {e}")))
    }

    /// Apply overrides from `VPSPANEL_*` environment variables.
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = non_empty_env("VPSPANEL_DATABASE_PATH") {
            self.database.path = v;
        }
        if let Some(v) = non_empty_env("VPSPANEL_ADMIN_USERNAME") {
            self.admin.username = v;
        }
        if let Some(v) = non_empty_env("VPSPANEL_ADMIN_PASSWORD") {
            self.admin.password = v;
        }
        if let Some(v) = non_empty_env("VPSPANEL_ADMIN_EMAIL") {
            self.admin.email = Some(v);
        }
    }

    /// Check values that serde defaults cannot guard.
    pub fn validate(&self) -> Result<()> {
        if self.session.cookie_name.is_empty() {
            return Err(PanelError::Config(
                "session.cookie_name must not be empty".to_string(),
            ));
        }
        if self.session.duration_secs == 0 || self.session.idle_timeout_secs == 0 {
            return Err(PanelError::Config(
                "session.duration_secs and session.idle_timeout_secs must be positive".to_string(),
            ));
        }
        for (name, secs) in [
            ("session.duration_secs", self.session.duration_secs),
            ("session.idle_timeout_secs", self.session.idle_timeout_secs),
            ("session.lockout_secs", self.session.lockout_secs),
        ] {
            if secs > MAX_DURATION_SECS {
                return Err(PanelError::Config(format!(
                    "{name} must be at most {MAX_DURATION_SECS} seconds"
                )));
            }
        }
        if self.session.max_login_attempts == 0 {
            return Err(PanelError::Config(
                "session.max_login_attempts must be at least 1".to_string(),
            ));
        }
        if self.admin.username.is_empty() != self.admin.password.is_empty() {
            return Err(PanelError::Config(
                "admin.username and admin.password must be set together".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
