//! Expression validation: structural checks and proof verification.

use crate::canonical::signable_bytes;
use crate::crypto::Ed25519PublicKey;
use crate::error::ValidationError;
use crate::expression::SignedExpression;

/// Verify an expression's proof.
///
/// This performs:
/// - Structural checks (non-empty author)
/// - Proof key parsing
/// - Signature verification over the recomputed signing input
///
/// A passing proof shows that the holder of `proof.key` signed exactly this
/// author, payload, and timestamp. Whether that key is entitled to speak
/// for the author identity is outside the envelope's scope.
pub fn verify_expression(expression: &SignedExpression) -> Result<(), ValidationError> {
    // 1. Structure
    verify_expression_structure(expression)?;

    // 2. Parse the proof key
    let key = Ed25519PublicKey::from_hex(&expression.proof.key)
        .map_err(|_| ValidationError::InvalidKey)?;

    // 3. Verify the signature over the recomputed signing input
    let message = signable_bytes(&expression.author, &expression.timestamp, &expression.data);
    key.verify(&message, &expression.proof.signature)
}

/// Structural checks without signature verification.
///
/// Useful when the envelope comes from trusted storage and only basic
/// well-formedness matters.
pub fn verify_expression_structure(expression: &SignedExpression) -> Result<(), ValidationError> {
    if expression.author.id().is_empty() {
        return Err(ValidationError::MissingAuthor);
    }
    Ok(())
}
