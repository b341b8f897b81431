//! Ledger configuration.

use decision_ledger_core::EntryLimits;

/// Default number of records a cursor fetches per store round-trip.
pub const DEFAULT_PAGE_SIZE: usize = 256;

/// Configuration for the Ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Length bounds for category and message.
    pub limits: EntryLimits,
    /// Records fetched per page by [`RecordCursor`](crate::RecordCursor).
    pub page_size: usize,
}

impl LedgerConfig {
    pub fn with_limits(mut self, limits: EntryLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            limits: EntryLimits::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
