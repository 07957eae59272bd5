//! Read-model error types.

use thiserror::Error;

/// Errors that can occur while updating or querying read models.
#[derive(Debug, Error)]
pub enum ReadModelError {
    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for read-model operations.
pub type Result<T> = std::result::Result<T, ReadModelError>;
