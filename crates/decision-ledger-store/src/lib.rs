//! # Decision Ledger Store
//!
//! The Record Store: an append-only collection of committed decision
//! records and the counter that sequences them.
//!
//! ## Overview
//!
//! Storage sits behind the [`RecordStore`] trait so the ledger is
//! storage-agnostic. [`SqliteStore`] is the persistent backend;
//! [`MemoryStore`] keeps everything in process and is what tests use.
//!
//! ## Key Types
//!
//! - [`RecordStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage
//! - [`Committed`] - What a successful append hands back
//!
//! ## Usage
//!
//! ```rust,no_run
//! use decision_ledger_core::{Keypair, NewRecord};
//! use decision_ledger_store::{RecordStore, SqliteStore};
//!
//! async fn example() {
//!     let store = SqliteStore::create("ledger.db").unwrap();
//!     let author = Keypair::generate().author();
//!
//!     let committed = store
//!         .append_internal(NewRecord::new("bootstrap", "first on-chain log", author, 0))
//!         .await
//!         .unwrap();
//!     assert_eq!(committed.record.sequence_id().value(), 0);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Gapless sequencing**: `append_internal` assigns `count()` as the new id
//! - **Atomic commit**: a record, its receipt and the counter move together
//! - **Monotonic time**: a `recorded_at` older than the previous record is refused
//! - **No mutation**: there is no update or delete operation

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{clamp_range, Committed, RecordStore};
