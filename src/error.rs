//! Error types for vpspanel.

use thiserror::Error;

/// Common error type for vpspanel.
#[derive(Error, Debug)]
pub enum PanelError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// A uniqueness constraint on the accounts table was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Template error.
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for PanelError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            // Cross-field collisions are raised by a trigger, not by an index,
            // so they only show up in the message.
            if db_err.is_unique_violation() || db_err.message().contains("UNIQUE constraint failed")
            {
                return PanelError::Conflict(db_err.message().to_string());
            }
        }
        PanelError::Database(e.to_string())
    }
}

/// Result type alias for vpspanel operations.
pub type Result<T> = std::result::Result<T, PanelError>;
