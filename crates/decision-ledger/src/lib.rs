//! # Decision Ledger
//!
//! A permanent, append-only ledger of decisions. Each entry is a category
//! label and a free-text message; the ledger sequences it, stamps it with
//! the caller's identity and a logical commit time, stores it, and
//! announces it.
//!
//! ## Overview
//!
//! - **Append**: [`Ledger::log_decision`] validates, authorizes, commits
//!   atomically and emits exactly one [`DecisionLogged`] event
//! - **Query**: [`Ledger::get_record`], [`Ledger::record_count`] and
//!   [`Ledger::list_records`] read straight from the store
//! - **Notify**: a [`Notifier`] receives events in sequence order
//!
//! ## Key Concepts
//!
//! - **Record**: Immutable. Never edited, never deleted.
//! - **Sequence id**: Gapless from 0; always the record count at commit time.
//! - **Receipt**: Content-addressed proof of a specific append on a
//!   specific ledger.
//! - **Caller context**: The execution environment supplies identity and
//!   time, never the caller's arguments.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use decision_ledger::{ChannelNotifier, Ledger, LedgerConfig, SystemContext};
//! use decision_ledger::core::Keypair;
//! use decision_ledger::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::create("ledger.db").unwrap();
//!     let context = SystemContext::new(Keypair::generate());
//!     let (notifier, mut events) = ChannelNotifier::new();
//!
//!     let ledger = Ledger::new(
//!         store,
//!         Arc::new(context),
//!         Arc::new(notifier),
//!         LedgerConfig::default(),
//!     );
//!
//!     let outcome = ledger.log_decision("bootstrap", "first on-chain log").await.unwrap();
//!     assert_eq!(outcome.sequence_id.value(), 0);
//!
//!     let event = events.recv().await.unwrap();
//!     assert_eq!(event.message, "first on-chain log");
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `decision_ledger::core` - Core primitives (DecisionRecord, SequenceId, etc.)
//! - `decision_ledger::store` - Record store abstraction and SQLite

pub mod config;
pub mod context;
pub mod cursor;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod policy;

// Re-export component crates
pub use decision_ledger_core as core;
pub use decision_ledger_store as store;

// Re-export main types for convenience
pub use config::LedgerConfig;
pub use context::{CallerContext, SystemContext};
pub use cursor::RecordCursor;
pub use error::{LedgerError, Result};
pub use ledger::{AppendOutcome, Ledger};
pub use notify::{
    BroadcastNotifier, ChannelNotifier, DecisionEvents, Notifier, NullNotifier,
    DEFAULT_EVENT_CAPACITY,
};
pub use policy::{AllowList, AppendPolicy, OpenWrite};

// Re-export commonly used core types
pub use decision_ledger_core::{
    Author, DecisionLogged, DecisionRecord, EntryLimits, Keypair, LedgerId, OperationReceipt,
    SequenceId,
};
