//! Caller context: what the execution environment tells the ledger about
//! an incoming append.

use std::time::{SystemTime, UNIX_EPOCH};

use decision_ledger_core::{Author, Keypair};

/// Capability supplying the caller's identity and the logical clock.
///
/// Neither value ever comes from the append's arguments, so a caller cannot
/// impersonate another author or backdate a record.
pub trait CallerContext: Send + Sync {
    /// Identity of the caller submitting the append.
    fn identity(&self) -> Author;

    /// Current logical time in Unix milliseconds.
    fn now(&self) -> u64;
}

/// Context backed by a local keypair and the system wall clock.
#[derive(Debug, Clone)]
pub struct SystemContext {
    keypair: Keypair,
}

impl SystemContext {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }
}

impl CallerContext for SystemContext {
    fn identity(&self) -> Author {
        self.keypair.author()
    }

    fn now(&self) -> u64 {
        // A clock before the epoch reads as 0; the ledger keeps time monotonic.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}
