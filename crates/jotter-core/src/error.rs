//! Error types for jotter.

use thiserror::Error;

/// Result type alias using jotter's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// PostgreSQL SQLSTATE for `unique_violation`.
const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for `foreign_key_violation`.
const SQLSTATE_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Core error type for jotter operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Storage unreachable or a query failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(i64),

    /// Tag not found
    #[error("Tag not found: {0}")]
    TagNotFound(i64),

    /// A search observed its cancellation signal
    #[error("Operation cancelled")]
    Cancelled,

    /// Unique or referential constraint rejected a write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for every member of the not-found family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::NoteNotFound(_) | Error::TagNotFound(_)
        )
    }

    /// True when the operation was aborted through its cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = e {
            return Error::NotFound("row".to_string());
        }

        let constraint = e.as_database_error().and_then(|db_err| {
            match db_err.code().as_deref() {
                Some(SQLSTATE_UNIQUE_VIOLATION) | Some(SQLSTATE_FOREIGN_KEY_VIOLATION) => {
                    Some(match db_err.constraint() {
                        Some(name) => format!("{} ({})", db_err.message(), name),
                        None => db_err.message().to_string(),
                    })
                }
                _ => None,
            }
        });

        match constraint {
            Some(msg) => Error::ConstraintViolation(msg),
            None => Error::Database(e),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        if e.is_cancelled() {
            Error::Cancelled
        } else {
            Error::Internal(format!("worker task failed: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_note_not_found() {
        let err = Error::NoteNotFound(42);
        assert_eq!(err.to_string(), "Note not found: 42");
    }

    #[test]
    fn test_error_display_tag_not_found() {
        let err = Error::TagNotFound(7);
        assert_eq!(err.to_string(), "Tag not found: 7");
    }

    #[test]
    fn test_error_display_cancelled() {
        assert_eq!(Error::Cancelled.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_error_display_constraint_violation() {
        let err = Error::ConstraintViolation("duplicate tag".to_string());
        assert_eq!(err.to_string(), "Constraint violation: duplicate tag");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("missing DATABASE_URL".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing DATABASE_URL");
    }

    #[test]
    fn test_is_not_found_family() {
        assert!(Error::NotFound("x".to_string()).is_not_found());
        assert!(Error::NoteNotFound(1).is_not_found());
        assert!(Error::TagNotFound(1).is_not_found());
        assert!(!Error::Cancelled.is_not_found());
        assert!(!Error::Database(sqlx::Error::PoolTimedOut).is_not_found());
    }

    #[test]
    fn test_cancelled_is_distinct_from_not_found() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::NoteNotFound(1).is_cancelled());
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_from_sqlx_pool_timeout_is_storage_error() {
        let err: Error = sqlx::Error::PoolTimedOut.into();
        match err {
            Error::Database(sqlx::Error::PoolTimedOut) => {}
            other => panic!("Expected Database error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_from_join_error_cancelled() {
        let handle = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        });
        handle.abort();
        let join_err = handle.await.unwrap_err();
        let err: Error = join_err.into();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
