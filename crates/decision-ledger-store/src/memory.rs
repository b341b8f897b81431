//! In-memory implementation of the RecordStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use decision_ledger_core::{
    compute_receipt, DecisionRecord, LedgerId, NewRecord, OperationReceipt, SequenceId,
};

use crate::error::{Result, StoreError};
use crate::traits::{clamp_range, Committed, RecordStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock: an
/// append holds the write lock for the whole commit, so readers see either
/// none or all of it.
pub struct MemoryStore {
    ledger_id: LedgerId,
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Records in sequence order; index == sequence id.
    records: Vec<DecisionRecord>,

    /// Receipt index: receipt -> sequence id.
    receipts: HashMap<OperationReceipt, SequenceId>,
}

impl MemoryStore {
    /// Create a new empty ledger with a random id.
    pub fn new() -> Self {
        Self::with_ledger_id(LedgerId::generate())
    }

    /// Create a new empty ledger with a fixed id.
    pub fn with_ledger_id(ledger_id: LedgerId) -> Self {
        Self {
            ledger_id,
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn ledger_id(&self) -> LedgerId {
        self.ledger_id
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.read()?.records.len() as u64)
    }

    async fn get(&self, sequence_id: SequenceId) -> Result<DecisionRecord> {
        let inner = self.read()?;
        usize::try_from(sequence_id.value())
            .ok()
            .and_then(|idx| inner.records.get(idx))
            .cloned()
            .ok_or(StoreError::NotFound(sequence_id))
    }

    async fn range(&self, from: u64, to: u64) -> Result<Vec<DecisionRecord>> {
        let inner = self.read()?;
        let (start, end) = clamp_range(from, to, inner.records.len() as u64);
        Ok(inner.records[start as usize..end as usize].to_vec())
    }

    async fn last(&self) -> Result<Option<DecisionRecord>> {
        Ok(self.read()?.records.last().cloned())
    }

    async fn sequence_for_receipt(
        &self,
        receipt: &OperationReceipt,
    ) -> Result<Option<SequenceId>> {
        Ok(self.read()?.receipts.get(receipt).copied())
    }

    async fn append_internal(&self, entry: NewRecord) -> Result<Committed> {
        let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;

        if let Some(previous) = inner.records.last() {
            let previous = previous.recorded_at();
            if entry.recorded_at < previous {
                return Err(StoreError::TimestampRegression {
                    previous,
                    attempted: entry.recorded_at,
                });
            }
        }

        let sequence_id = SequenceId(inner.records.len() as u64);
        let record = entry.into_record(sequence_id);
        let receipt = compute_receipt(&self.ledger_id, &record)
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;

        // Everything fallible is done; the two inserts below cannot fail.
        inner.receipts.insert(receipt, sequence_id);
        inner.records.push(record.clone());

        debug!(seq = sequence_id.value(), "memory store committed record");
        Ok(Committed { record, receipt })
    }
}
