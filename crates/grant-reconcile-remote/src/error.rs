//! Error types for remote statement execution.

use thiserror::Error;

/// Errors returned by a [`RemoteExecutor`](crate::RemoteExecutor).
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The object a statement refers to does not exist.
    #[error("{kind} {name:?} does not exist or not authorized")]
    ObjectNotFound { kind: String, name: String },

    /// The remote system refused the statement.
    #[error("statement rejected: {0}")]
    Rejected(String),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data in the grant catalog.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The blocking task running a statement failed.
    #[error("executor task failed: {0}")]
    Task(String),
}

impl RemoteError {
    /// Whether the error means the target object is gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::ObjectNotFound { .. })
    }
}

/// Result type for remote operations.
pub type Result<T> = std::result::Result<T, RemoteError>;
