//! # Agora Core
//!
//! Pure primitives for the Agora exchange: payload values, canonicalization,
//! and signed expression envelopes.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`Value`] / [`CanonicalValue`] - Structured payloads and their
//!   canonical (recursively key-sorted) form
//! - [`SignedExpression`] - The immutable signed envelope
//! - [`Address`] - Content-addressed identifier (Blake3 over canonical
//!   envelope bytes)
//! - [`Signer`] - The signing capability an exchange is constructed with
//!
//! ## Canonicalization
//!
//! Envelopes are encoded as canonical JSON with sorted keys. See the
//! [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod delivery;
pub mod error;
pub mod expression;
pub mod types;
pub mod validation;
pub mod value;

pub use canonical::{derive_address, envelope_bytes, payload_bytes, signable_bytes};
pub use crypto::{AgentSigner, Ed25519PublicKey, Ed25519Signature, Keypair, Signer};
pub use delivery::{DeliveryReceipt, InboxEntry};
pub use error::{CoreError, ValidationError};
pub use expression::{ExpressionBuilder, ExpressionProof, SignedExpression};
pub use types::{Address, Author, Page, TimeRange, Timestamp};
pub use validation::{verify_expression, verify_expression_structure};
pub use value::{CanonicalValue, Number, Value};
