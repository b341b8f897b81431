//! Paging cursor over a window of committed records.

use std::collections::VecDeque;
use std::sync::Arc;

use decision_ledger_core::DecisionRecord;
use decision_ledger_store::RecordStore;

use crate::error::{LedgerError, Result};

/// Lazy, restartable walk over records `[start, end)`.
///
/// The window is clamped to the record count when the cursor is created, so
/// records appended afterwards never show up in it. Records are fetched from
/// the store one page at a time; because committed records never change, a
/// cursor can be restarted and will yield exactly the same sequence again.
pub struct RecordCursor<S: RecordStore> {
    store: Arc<S>,
    start: u64,
    end: u64,
    next: u64,
    page_size: usize,
    buffer: VecDeque<DecisionRecord>,
}

impl<S: RecordStore> RecordCursor<S> {
    pub(crate) fn new(store: Arc<S>, start: u64, end: u64, page_size: usize) -> Self {
        Self {
            store,
            start,
            end,
            next: start,
            page_size: page_size.max(1),
            buffer: VecDeque::new(),
        }
    }

    /// First sequence id in the window.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// One past the last sequence id in the window.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Total records in the window.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Records not yet yielded.
    pub fn remaining(&self) -> u64 {
        self.end - self.next + self.buffer.len() as u64
    }

    /// Yield the next record, fetching a new page when the buffer runs dry.
    pub async fn next(&mut self) -> Result<Option<DecisionRecord>> {
        if self.buffer.is_empty() && self.next < self.end {
            let page_end = self.next.saturating_add(self.page_size as u64).min(self.end);
            let page = self
                .store
                .range(self.next, page_end)
                .await
                .map_err(LedgerError::from_read)?;
            self.next = page_end;
            self.buffer.extend(page);
        }
        Ok(self.buffer.pop_front())
    }

    /// Rewind to the start of the window.
    pub fn restart(&mut self) {
        self.next = self.start;
        self.buffer.clear();
    }

    /// Restart and read the whole window.
    pub async fn collect_all(&mut self) -> Result<Vec<DecisionRecord>> {
        self.restart();
        self.collect_remaining().await
    }

    /// Drain everything not yet yielded.
    pub async fn collect_remaining(&mut self) -> Result<Vec<DecisionRecord>> {
        let mut records = Vec::with_capacity(self.remaining() as usize);
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        Ok(records)
    }
}

impl<S: RecordStore> std::fmt::Debug for RecordCursor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCursor")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("next", &self.next)
            .field("page_size", &self.page_size)
            .field("buffered", &self.buffer.len())
            .finish()
    }
}
