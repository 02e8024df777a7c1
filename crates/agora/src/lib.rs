//! # Agora
//!
//! The unified API for the Agora exchange - content-addressed, signed
//! expressions between autonomous agents.
//!
//! ## Overview
//!
//! Agora provides a portable library for:
//!
//! - **Expressions**: Immutable, signed payloads that form the atomic unit
//!   of exchange
//! - **Content addressing**: Every expression is fetchable by the hash of
//!   its canonical bytes
//! - **Author listings**: Public expressions are enumerable per author,
//!   newest first, paginated
//! - **Private delivery**: Expressions sent to one recipient's inbox
//!   instead of the public store
//!
//! ## Key Concepts
//!
//! - **Expression**: Immutable. Never edited. Changes are new expressions.
//! - **Address**: Derived from canonical envelope bytes; identical content
//!   has an identical address.
//! - **Canonical form**: One byte representation per payload, so agents on
//!   different machines agree on addresses.
//! - **Inbox**: Owner-isolated; ordered by when the backend received each
//!   delivery, not by what the sender claims.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use agora::Exchange;
//! use agora::core::{AgentSigner, Author, Value};
//! use agora::store::SqliteBackend;
//!
//! async fn example() {
//!     // An identity for this agent
//!     let signer = AgentSigner::generate(Author::new("did:key:alice"));
//!
//!     // Storage on disk
//!     let backend = SqliteBackend::open("agora.db").unwrap();
//!
//!     // Create the exchange
//!     let exchange = Exchange::new(signer, backend);
//!
//!     // Publish a thought
//!     let address = exchange
//!         .publish(Value::from(serde_json::json!({ "body": "hello" })))
//!         .await
//!         .unwrap();
//!
//!     // Fetch it back by address
//!     let expression = exchange.fetch_by_address(&address).await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! The component crates stay reachable without extra dependencies:
//!
//! - `agora::core` - Core primitives (SignedExpression, Address, etc.)
//! - `agora::store` - Storage abstraction and SQLite

pub mod error;
pub mod exchange;

// Component crates under their own names
pub use agora_core as core;
pub use agora_store as store;

pub use error::{ExchangeError, Result};
pub use exchange::{Exchange, ExchangeConfig};

// The types most callers touch, flattened to the crate root
pub use agora_core::{
    Address, AgentSigner, Author, CanonicalValue, DeliveryReceipt, InboxEntry, Keypair, Page,
    SignedExpression, Signer, TimeRange, Timestamp, Value,
};
