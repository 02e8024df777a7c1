//! # Agora Store
//!
//! Storage abstraction for the Agora exchange. Provides a trait-based
//! interface for expression persistence and private delivery, with SQLite
//! and in-memory implementations.
//!
//! ## Overview
//!
//! The store module abstracts storage behind the [`Backend`] trait,
//! allowing the exchange to be storage-agnostic. The primary implementation
//! is [`SqliteBackend`], with [`MemoryBackend`] for testing.
//!
//! ## Key Types
//!
//! - [`Backend`] - The async trait for all storage and delivery operations
//! - [`SqliteBackend`] - SQLite-based persistent storage
//! - [`MemoryBackend`] - In-memory storage for tests
//! - [`BackendError`] - What can go wrong below the exchange
//!
//! ## Usage
//!
//! ```rust,no_run
//! use agora_store::{Backend, SqliteBackend};
//! use agora_core::Page;
//!
//! async fn example() {
//!     // On disk
//!     let backend = SqliteBackend::open("agora.db").unwrap();
//!
//!     // Or ephemeral, for tests
//!     let backend = SqliteBackend::open_memory().unwrap();
//!
//!     // Publish an envelope
//!     // let expression: SignedExpression = ...;
//!     // let address = backend.create_public_expression(&expression).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Content addressing**: the address of an envelope is derived from its
//!   canonical bytes, so publishing the same envelope twice yields one
//!   stored row and the same address
//! - **Listing per publish**: the author listing records every publish call
//! - **Private stays private**: delivered envelopes never appear in public
//!   lookups or author listings
//! - **Absence is `None`**: unknown addresses and empty pages are not errors
//!
//! [`BackendError`]: error::BackendError

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{BackendError, Result};
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
pub use traits::{Backend, DEFAULT_PAGE_SIZE};
