//! # Agora Testkit
//!
//! Testing utilities for the Agora exchange.
//!
//! ## Overview
//!
//! Three pieces:
//!
//! - **Golden vectors**: Known payloads with their exact canonical encoding
//! - **Generators**: Proptest strategies over payloads and identities
//! - **Fixtures**: Pre-wired signers and backends for integration tests
//!
//! ## Golden Vectors
//!
//! Golden vectors pin the canonical encoding across implementations:
//!
//! ```rust
//! use agora_core::derive_address;
//! use agora_testkit::vectors::{all_vectors, expression_from_vector};
//!
//! for vector in all_vectors() {
//!     let expression = expression_from_vector(&vector);
//!     println!("{}: {}", vector.name, derive_address(&expression).to_hex());
//! }
//! ```
//!
//! ## Property Testing
//!
//! Whole signed expressions can appear as proptest arguments:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use agora_testkit::generators::{expression_from_params, ExpressionParams};
//!
//! proptest! {
//!     #[test]
//!     fn address_is_deterministic(params: ExpressionParams) {
//!         let e1 = expression_from_params(&params);
//!         let e2 = expression_from_params(&params);
//!         prop_assert_eq!(agora_core::derive_address(&e1), agora_core::derive_address(&e2));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! A fixture is a signer plus a fresh memory backend:
//!
//! ```rust
//! use agora_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let expression = fixture.make_expression("hello agora");
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{exchange_pair, multi_agent_fixtures, TestFixture};
pub use generators::{expression_from_params, ExpressionParams};
pub use vectors::{all_vectors, expression_from_vector, verify_all_vectors, GoldenVector};
