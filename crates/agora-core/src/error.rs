//! Error types for the Agora core.

use thiserror::Error;

/// Core errors that can occur while building or decoding expressions.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("duplicate mapping key: {0:?}")]
    DuplicateKey(String),

    #[error("malformed address: {0}")]
    MalformedAddress(String),

    #[error("malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("malformed expression: {0}")]
    MalformedExpression(String),
}

/// Validation errors for envelope structure and proofs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("signature verification failed")]
    SignatureFailed,

    #[error("proof key is not a valid verifying key")]
    InvalidKey,

    #[error("expression has an empty author")]
    MissingAuthor,
}
