//! Error types for the Ledger.

use decision_ledger_core::{Author, OperationReceipt, SequenceId, ValidationError};
use decision_ledger_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Ledger operations.
///
/// Every error is reported synchronously to the caller and none is retried
/// internally. Apart from `Store` on a read, each variant guarantees the
/// ledger is unchanged and no event was emitted.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Category or message failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// No record at this position.
    #[error("record not found: {0}")]
    NotFound(SequenceId),

    /// No record carries this receipt.
    #[error("receipt not found: {0}")]
    ReceiptNotFound(OperationReceipt),

    /// `from` is past `to` in a listing request.
    #[error("invalid range: from {from} is greater than to {to}")]
    InvalidRange { from: u64, to: u64 },

    /// The append policy refused this author.
    #[error("not authorized to append: {0}")]
    Unauthorized(Author),

    /// The store could not commit the append; nothing was recorded.
    #[error("commit failed: {0}")]
    CommitFailure(#[source] StoreError),

    /// Storage error on a read path.
    #[error("storage error: {0}")]
    Store(#[source] StoreError),
}

impl LedgerError {
    /// Map a read-path store error, lifting `NotFound` to the ledger's own.
    pub(crate) fn from_read(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(seq) => LedgerError::NotFound(seq),
            other => LedgerError::Store(other),
        }
    }
}

/// Result type for Ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
