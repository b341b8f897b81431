//! RecordStore trait: the abstract interface for ledger persistence.
//!
//! This trait allows the ledger to be storage-agnostic. Implementations
//! include SQLite (persistent) and in-memory (for tests).

use async_trait::async_trait;
use decision_ledger_core::{DecisionRecord, LedgerId, NewRecord, OperationReceipt, SequenceId};

use crate::error::Result;

/// A record that has just been committed, with its operation receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub record: DecisionRecord,
    pub receipt: OperationReceipt,
}

/// The RecordStore trait: async interface for ledger persistence.
///
/// All methods are async to support both blocking (SQLite) and in-memory
/// backends. For SQLite, `spawn_blocking` keeps the runtime free.
///
/// # Invariants
///
/// - Sequence ids form a gapless run from 0; the next id is always `count()`.
/// - Committed records never change and are never removed.
/// - `recorded_at` is non-decreasing in sequence order.
/// - Readers observe either the state before an append or the state after
///   it, never a record without its receipt or a counter without its record.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The identifier fixed when this ledger was deployed.
    fn ledger_id(&self) -> LedgerId;

    /// Number of committed records.
    async fn count(&self) -> Result<u64>;

    /// Get the record at `sequence_id`.
    ///
    /// Fails with [`StoreError::NotFound`](crate::StoreError::NotFound) if
    /// `sequence_id >= count()`.
    async fn get(&self, sequence_id: SequenceId) -> Result<DecisionRecord>;

    /// Get the records with `from <= seq < to`, ordered by seq.
    ///
    /// Positions past the end are skipped, so an out-of-range window yields
    /// fewer records rather than an error.
    async fn range(&self, from: u64, to: u64) -> Result<Vec<DecisionRecord>>;

    /// The most recently committed record, if any.
    async fn last(&self) -> Result<Option<DecisionRecord>>;

    /// Resolve an operation receipt to the position it acknowledges.
    async fn sequence_for_receipt(&self, receipt: &OperationReceipt)
        -> Result<Option<SequenceId>>;

    /// Commit a validated entry at the next position.
    ///
    /// The only mutating primitive. Assigns `sequence_id = count()`, stores
    /// the record with its receipt and advances the counter, atomically.
    /// On error nothing has changed.
    async fn append_internal(&self, entry: NewRecord) -> Result<Committed>;
}

/// Clamp a half-open window `[from, to)` to `[0, count)`.
///
/// Callers are expected to have rejected `from > to` already; an inverted
/// window still clamps to an empty one.
pub fn clamp_range(from: u64, to: u64, count: u64) -> (u64, u64) {
    let end = to.min(count);
    let start = from.min(end);
    (start, end)
}
