//! Error types for the Exchange.

use agora_core::{CoreError, ValidationError};
use agora_store::BackendError;
use thiserror::Error;

/// Errors that can occur during Exchange operations.
///
/// Absent data is `Option`, not an error: an unknown address comes back as
/// `Ok(None)` and an empty page as `Ok(vec![])`.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Malformed input: unsupported payload values, duplicate mapping keys,
    /// bad addresses or timestamps.
    #[error("malformed input: {0}")]
    Core(#[from] CoreError),

    /// An envelope failed proof verification.
    #[error("invalid proof: {0}")]
    Validation(#[from] ValidationError),

    /// Storage or delivery error from the backend.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Result type for Exchange operations.
pub type Result<T> = std::result::Result<T, ExchangeError>;
