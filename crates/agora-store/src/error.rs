//! Error types for the store backends.

use thiserror::Error;

/// Errors that can occur during backend operations.
///
/// Absent data is not an error: lookups return `Option`/empty pages.
#[derive(Debug, Error)]
pub enum BackendError {
    /// SQLite reported a failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Envelope serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored or submitted envelope is structurally unusable.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A private delivery could not reach its recipient.
    #[error("delivery to {recipient} failed: {reason}")]
    DeliveryFailed { recipient: String, reason: String },

    /// The backend is not reachable.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Schema migration could not be applied.
    #[error("migration error: {0}")]
    Migration(String),

    /// Filesystem trouble underneath the database.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
