//! The Ledger: validated sequenced appends over a record store.
//!
//! The Ledger ties together a [`RecordStore`], a [`CallerContext`], an
//! [`AppendPolicy`] and a [`Notifier`] into the public append and query API.

use std::sync::Arc;

use decision_ledger_core::{
    validate_entry, DecisionLogged, DecisionRecord, LedgerId, NewRecord, OperationReceipt,
    SequenceId,
};
use decision_ledger_store::{Committed, RecordStore, StoreError};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::context::CallerContext;
use crate::cursor::RecordCursor;
use crate::error::{LedgerError, Result};
use crate::notify::Notifier;
use crate::policy::{AppendPolicy, OpenWrite};

/// Acknowledgment of a committed append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Position assigned to the new record.
    pub sequence_id: SequenceId,
    /// Receipt identifying this append on this ledger.
    pub receipt: OperationReceipt,
    /// The event handed to the notifier.
    pub event: DecisionLogged,
}

/// The main Ledger struct.
///
/// Appends are serialized through an internal writer lock held from
/// validation until the event has been handed to the notifier, so sequence
/// ids, timestamps and events all follow the same order. The commit and the
/// notification run on a spawned task that owns the lock, which keeps them
/// together even if the caller goes away. Reads go straight to the store and
/// never take the writer lock.
pub struct Ledger<S: RecordStore> {
    store: Arc<S>,
    context: Arc<dyn CallerContext>,
    notifier: Arc<dyn Notifier>,
    policy: Arc<dyn AppendPolicy>,
    config: LedgerConfig,
    writer: Arc<Mutex<()>>,
}

impl<S: RecordStore + 'static> Ledger<S> {
    /// Create a ledger over `store` with the open-write policy.
    pub fn new(
        store: S,
        context: Arc<dyn CallerContext>,
        notifier: Arc<dyn Notifier>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            store: Arc::new(store),
            context,
            notifier,
            policy: Arc::new(OpenWrite),
            config,
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Replace the append policy.
    pub fn with_policy(mut self, policy: Arc<dyn AppendPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// The identifier fixed when this ledger was deployed.
    pub fn ledger_id(&self) -> LedgerId {
        self.store.ledger_id()
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Limits and paging in effect for this ledger.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Append
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a decision on behalf of the ledger's own caller context.
    pub async fn log_decision(&self, category: &str, message: &str) -> Result<AppendOutcome> {
        let context = Arc::clone(&self.context);
        self.log_decision_with(context.as_ref(), category, message).await
    }

    /// Append a decision on behalf of an explicit caller.
    ///
    /// Identity and time come from `caller`, never from the arguments. On
    /// any error the ledger is unchanged and no event is emitted.
    ///
    /// Once the commit has started it runs to completion on its own task, so
    /// dropping the returned future can lose the outcome but never the event.
    pub async fn log_decision_with(
        &self,
        caller: &dyn CallerContext,
        category: &str,
        message: &str,
    ) -> Result<AppendOutcome> {
        let writer = Arc::clone(&self.writer).lock_owned().await;

        if let Err(e) = validate_entry(category, message, &self.config.limits) {
            warn!(field = e.field(), "rejected append: {}", e);
            return Err(e.into());
        }

        let author = caller.identity();
        if !self.policy.authorize(&author) {
            warn!(author = ?author, "rejected append: unauthorized");
            return Err(LedgerError::Unauthorized(author));
        }

        let now = caller.now();
        let entry = NewRecord::new(category, message, author, now);
        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);

        let commit = tokio::spawn(async move {
            let _writer = writer;
            let committed = commit_entry(store.as_ref(), entry).await?;
            let event = DecisionLogged::from(&committed.record);
            notifier.notify(event.clone());
            Ok::<_, LedgerError>((committed, event))
        });

        let (committed, event) = commit
            .await
            .map_err(|e| LedgerError::CommitFailure(StoreError::Task(e.to_string())))??;

        info!(
            seq = committed.record.sequence_id().value(),
            category,
            author = ?author,
            "decision logged"
        );

        Ok(AppendOutcome {
            sequence_id: committed.record.sequence_id(),
            receipt: committed.receipt,
            event,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the record at `sequence_id`.
    pub async fn get_record(&self, sequence_id: SequenceId) -> Result<DecisionRecord> {
        self.store
            .get(sequence_id)
            .await
            .map_err(LedgerError::from_read)
    }

    /// Number of committed records.
    pub async fn record_count(&self) -> Result<u64> {
        self.store.count().await.map_err(LedgerError::from_read)
    }

    /// Cursor over records `[from, to)`, clamped to the current count.
    pub async fn list_records(&self, from: u64, to: u64) -> Result<RecordCursor<S>> {
        if from > to {
            return Err(LedgerError::InvalidRange { from, to });
        }
        let count = self.record_count().await?;
        let (start, end) = decision_ledger_store::clamp_range(from, to, count);
        Ok(RecordCursor::new(
            Arc::clone(&self.store),
            start,
            end,
            self.config.page_size,
        ))
    }

    /// Resolve a receipt to the position of the append it acknowledges.
    pub async fn confirm_receipt(&self, receipt: &OperationReceipt) -> Result<SequenceId> {
        self.store
            .sequence_for_receipt(receipt)
            .await
            .map_err(LedgerError::from_read)?
            .ok_or(LedgerError::ReceiptNotFound(*receipt))
    }
}

/// Stamp `entry` with a time no earlier than the last record and commit it.
///
/// Callers must hold the writer lock.
async fn commit_entry<S: RecordStore>(store: &S, mut entry: NewRecord) -> Result<Committed> {
    let previous = store
        .last()
        .await
        .map_err(LedgerError::CommitFailure)?
        .map(|r| r.recorded_at())
        .unwrap_or(0);
    if entry.recorded_at < previous {
        debug!(now = entry.recorded_at, previous, "caller clock behind last record; holding time");
        entry.recorded_at = previous;
    }

    store.append_internal(entry).await.map_err(|e| {
        warn!(error = %e, "append failed to commit");
        LedgerError::CommitFailure(e)
    })
}
