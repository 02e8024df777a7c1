//! Signed expression envelopes.
//!
//! An expression is an immutable signed record. Once signed it cannot be
//! edited; corrections are published as new expressions.
//!
//! Fields are declared in canonical (sorted) key order so the serde form
//! and the canonical byte form agree.

use serde::{Deserialize, Serialize};

use crate::canonical;
use crate::crypto::{Ed25519Signature, Signer};
use crate::error::CoreError;
use crate::types::{Author, Timestamp};
use crate::value::CanonicalValue;

/// Cryptographic proof attached to an expression.
///
/// `key` is the hex-encoded Ed25519 verifying key; `signature` covers the
/// canonical signing input (author, data, timestamp under the signing
/// domain). The proof binds the content to the key; binding the key to the
/// author identity is the embedding application's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionProof {
    pub key: String,
    pub signature: Ed25519Signature,
}

/// A complete signed expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedExpression {
    /// Who authored the expression.
    pub author: Author,

    /// The canonical payload.
    pub data: CanonicalValue,

    /// Signature and signing key.
    pub proof: ExpressionProof,

    /// Author-claimed creation time. Untrusted.
    pub timestamp: Timestamp,
}

impl SignedExpression {
    /// The canonical envelope bytes. Address derivation hashes these.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical::envelope_bytes(self)
    }

    /// The canonical envelope as JSON text.
    pub fn canonical_json(&self) -> Result<String, CoreError> {
        String::from_utf8(self.canonical_bytes())
            .map_err(|e| CoreError::MalformedExpression(format!("envelope not valid UTF-8: {e}")))
    }

    /// Parse an envelope from JSON text.
    ///
    /// The payload must already be in canonical form; out-of-order or
    /// duplicated mapping keys are rejected rather than fixed up.
    pub fn from_json(s: &str) -> Result<Self, CoreError> {
        serde_json::from_str(s).map_err(|e| CoreError::MalformedExpression(e.to_string()))
    }
}

/// Builder for signing expressions.
///
/// Payloads enter already canonicalized; the builder cannot be constructed
/// around an unsorted mapping.
pub struct ExpressionBuilder {
    author: Author,
    timestamp: Timestamp,
    data: CanonicalValue,
}

impl ExpressionBuilder {
    /// Start building an expression for the given author and payload.
    pub fn new(author: Author, data: CanonicalValue) -> Self {
        Self {
            author,
            timestamp: Timestamp::now(),
            data,
        }
    }

    /// Override the timestamp (defaults to the current time).
    pub fn timestamp(mut self, ts: Timestamp) -> Self {
        self.timestamp = ts;
        self
    }

    /// Build and sign the expression.
    pub fn sign<S: Signer + ?Sized>(self, signer: &S) -> SignedExpression {
        let message = canonical::signable_bytes(&self.author, &self.timestamp, &self.data);
        let signature = signer.sign(&message);

        SignedExpression {
            author: self.author,
            data: self.data,
            proof: ExpressionProof {
                key: signer.verifying_key_hex(),
                signature,
            },
            timestamp: self.timestamp,
        }
    }
}
