//! Decision records: the immutable unit of the ledger.
//!
//! A record is built from a validated [`NewRecord`] exactly once, when the
//! store assigns it a sequence id. There are no setters; a committed record
//! can only be read.

use serde::{Deserialize, Serialize};

use crate::crypto::Author;
use crate::types::SequenceId;

/// A candidate entry that has passed validation and is ready to commit.
///
/// Carries everything except the sequence id, which only the store may
/// assign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub category: String,
    pub message: String,
    pub author: Author,
    pub recorded_at: u64,
}

impl NewRecord {
    pub fn new(
        category: impl Into<String>,
        message: impl Into<String>,
        author: Author,
        recorded_at: u64,
    ) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
            author,
            recorded_at,
        }
    }

    /// Freeze this entry at the given position.
    pub fn into_record(self, sequence_id: SequenceId) -> DecisionRecord {
        DecisionRecord {
            sequence_id,
            category: self.category,
            message: self.message,
            author: self.author,
            recorded_at: self.recorded_at,
        }
    }
}

/// One committed ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    sequence_id: SequenceId,
    category: String,
    message: String,
    author: Author,
    /// Logical commit time, Unix milliseconds.
    recorded_at: u64,
}

impl DecisionRecord {
    pub fn sequence_id(&self) -> SequenceId {
        self.sequence_id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn author(&self) -> Author {
        self.author
    }

    pub fn recorded_at(&self) -> u64 {
        self.recorded_at
    }
}

/// Event emitted once for every committed record, in sequence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionLogged {
    pub sequence_id: SequenceId,
    pub category: String,
    pub message: String,
    pub author: Author,
    pub recorded_at: u64,
}

impl From<&DecisionRecord> for DecisionLogged {
    fn from(record: &DecisionRecord) -> Self {
        Self {
            sequence_id: record.sequence_id,
            category: record.category.clone(),
            message: record.message.clone(),
            author: record.author,
            recorded_at: record.recorded_at,
        }
    }
}
