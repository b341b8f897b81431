//! # Decision Ledger Testkit
//!
//! Testing utilities for the Decision Ledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known records with their expected canonical bytes
//! - **Generators**: Proptest strategies for valid and invalid entries
//! - **Fixtures**: A controllable caller context, a ready-made ledger, a
//!   store that fails on demand and one that holds appends at a gate
//!
//! ## Golden Vectors
//!
//! ```rust
//! use decision_ledger_testkit::vectors::verify_all_vectors;
//!
//! verify_all_vectors().unwrap();
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use decision_ledger_testkit::generators::valid_entry;
//!
//! proptest! {
//!     #[test]
//!     fn accepted(entry in valid_entry()) {
//!         // ...
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use decision_ledger_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let (ledger, events) = fixture.ledger();
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    multi_party_contexts, FailingStore, GatedStore, ManualContext, TestFixture,
};
pub use generators::{valid_entry, EntryParams};
pub use vectors::{all_vectors, record_from_vector, verify_all_vectors, GoldenVector};
