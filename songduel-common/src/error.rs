//! Common error types for songduel

use thiserror::Error;

/// Common result type for songduel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the store, the vote ledger and the HTTP layer
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Conditional write lost against a concurrent writer
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store unreachable, locked, or retries exhausted
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether retrying the same operation may succeed.
    ///
    /// Conflicts and busy/locked SQLite errors are transient; pool timeouts
    /// and closed pools are treated the same way so that a brief outage does
    /// not surface as a hard failure on the first attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Conflict(_) | Error::Unavailable(_) => true,
            Error::Database(sqlx::Error::PoolTimedOut) => true,
            Error::Database(sqlx::Error::Io(_)) => true,
            Error::Database(db_err) => {
                let msg = db_err.to_string();
                msg.contains("database is locked") || msg.contains("database is busy")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_is_transient() {
        assert!(Error::Conflict("song abc".to_string()).is_transient());
        assert!(Error::Unavailable("down".to_string()).is_transient());
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        assert!(Error::Database(sqlx::Error::PoolTimedOut).is_transient());
    }

    #[test]
    fn test_user_errors_are_not_transient() {
        assert!(!Error::NotFound("song".to_string()).is_transient());
        assert!(!Error::InvalidInput("missing id".to_string()).is_transient());
        assert!(!Error::Database(sqlx::Error::RowNotFound).is_transient());
    }
}
