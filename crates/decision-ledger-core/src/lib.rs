//! # Decision Ledger Core
//!
//! Pure primitives for the decision ledger: records, events, receipts and
//! canonicalization.
//!
//! This crate contains no I/O, no storage, no async. It is pure computation
//! over the ledger's data model.
//!
//! ## Key Types
//!
//! - [`DecisionRecord`] - One immutable, committed ledger entry
//! - [`SequenceId`] - Position of a record in its ledger (0-based, gapless)
//! - [`Author`] - Identity of the caller that submitted a record
//! - [`DecisionLogged`] - Event announcing a newly committed record
//! - [`OperationReceipt`] - Content-addressed proof that an append committed
//! - [`EntryLimits`] - Configurable bounds on category and message length
//!
//! ## Canonicalization
//!
//! Records are encoded as deterministic CBOR before hashing. See [`canonical`].

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod record;
pub mod types;
pub mod validation;

pub use canonical::{canonical_record_bytes, compute_receipt};
pub use crypto::{Author, Blake3Hash, Keypair};
pub use error::{CoreError, ValidationError};
pub use record::{DecisionLogged, DecisionRecord, NewRecord};
pub use types::{LedgerId, OperationReceipt, SequenceId};
pub use validation::{
    validate_entry, EntryLimits, DEFAULT_MAX_CATEGORY_LEN, DEFAULT_MAX_MESSAGE_LEN,
};
