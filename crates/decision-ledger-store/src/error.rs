//! Error types for the store module.

use std::path::PathBuf;

use decision_ledger_core::SequenceId;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No record at this position.
    #[error("record not found: {0}")]
    NotFound(SequenceId),

    /// A commit timestamp older than the previous record's.
    #[error("recorded_at {attempted} precedes previous record at {previous}")]
    TimestampRegression { previous: u64, attempted: u64 },

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A ledger already exists at this location.
    #[error("ledger already exists at {0}")]
    AlreadyExists(PathBuf),

    /// No ledger has been deployed at this location.
    #[error("no ledger deployed at {0}")]
    NotDeployed(PathBuf),

    /// A writer panicked while holding the store lock.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// A blocking storage task failed to complete.
    #[error("storage task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
