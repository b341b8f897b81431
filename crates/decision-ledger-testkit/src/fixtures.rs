//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use decision_ledger::{CallerContext, ChannelNotifier, DecisionEvents, Ledger, LedgerConfig};
use decision_ledger_core::{
    Author, DecisionRecord, Keypair, LedgerId, NewRecord, OperationReceipt, SequenceId,
};
use decision_ledger_store::{Committed, MemoryStore, RecordStore, Result, StoreError};

/// Fixed starting time for fixtures: 2025-01-14T16:00:00Z.
pub const FIXTURE_EPOCH_MS: u64 = 1_736_870_400_000;

/// Caller context with a fixed identity and a hand-driven clock.
#[derive(Debug)]
pub struct ManualContext {
    author: Author,
    clock: AtomicU64,
}

impl ManualContext {
    pub fn new(author: Author, start_ms: u64) -> Self {
        Self {
            author,
            clock: AtomicU64::new(start_ms),
        }
    }

    pub fn from_keypair(keypair: &Keypair) -> Self {
        Self::new(keypair.author(), FIXTURE_EPOCH_MS)
    }

    /// Jump the clock to `ms`, backwards included.
    pub fn set_time(&self, ms: u64) {
        self.clock.store(ms, Ordering::SeqCst);
    }

    /// Move the clock forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.clock.fetch_add(ms, Ordering::SeqCst);
    }
}

impl CallerContext for ManualContext {
    fn identity(&self) -> Author {
        self.author
    }

    fn now(&self) -> u64 {
        self.clock.load(Ordering::SeqCst)
    }
}

/// A test fixture with a keypair and a manual caller context.
pub struct TestFixture {
    pub keypair: Keypair,
    pub context: Arc<ManualContext>,
}

impl TestFixture {
    /// Create a new test fixture with a random keypair.
    pub fn new() -> Self {
        Self::from_keypair(Keypair::generate())
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::from_keypair(Keypair::from_seed(&seed))
    }

    fn from_keypair(keypair: Keypair) -> Self {
        let context = Arc::new(ManualContext::from_keypair(&keypair));
        Self { keypair, context }
    }

    pub fn author(&self) -> Author {
        self.keypair.author()
    }

    /// An empty in-memory ledger driven by this fixture's context.
    pub fn ledger(&self) -> (Ledger<MemoryStore>, DecisionEvents) {
        self.ledger_with_store(MemoryStore::new())
    }

    /// A ledger over `store` driven by this fixture's context.
    pub fn ledger_with_store<S: RecordStore + 'static>(
        &self,
        store: S,
    ) -> (Ledger<S>, DecisionEvents) {
        let (notifier, events) = ChannelNotifier::new();
        let ledger = Ledger::new(
            store,
            self.context.clone(),
            Arc::new(notifier),
            LedgerConfig::default(),
        );
        (ledger, events)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create caller contexts for multi-party tests, one per deterministic author.
pub fn multi_party_contexts(count: usize) -> Vec<ManualContext> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            ManualContext::from_keypair(&Keypair::from_seed(&seed))
        })
        .collect()
}

/// In-memory store whose appends can be made to fail.
///
/// Stands in for a backend that runs out of resources mid-commit. A failed
/// append leaves the inner store untouched.
pub struct FailingStore {
    inner: MemoryStore,
    fail_appends: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_appends: AtomicBool::new(false),
        }
    }

    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for FailingStore {
    fn ledger_id(&self) -> LedgerId {
        self.inner.ledger_id()
    }

    async fn count(&self) -> Result<u64> {
        self.inner.count().await
    }

    async fn get(&self, sequence_id: SequenceId) -> Result<DecisionRecord> {
        self.inner.get(sequence_id).await
    }

    async fn range(&self, from: u64, to: u64) -> Result<Vec<DecisionRecord>> {
        self.inner.range(from, to).await
    }

    async fn last(&self) -> Result<Option<DecisionRecord>> {
        self.inner.last().await
    }

    async fn sequence_for_receipt(
        &self,
        receipt: &OperationReceipt,
    ) -> Result<Option<SequenceId>> {
        self.inner.sequence_for_receipt(receipt).await
    }

    async fn append_internal(&self, entry: NewRecord) -> Result<Committed> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other(
                "simulated resource exhaustion",
            )));
        }
        self.inner.append_internal(entry).await
    }
}

/// In-memory store whose appends wait until the gate is opened.
///
/// Lets a test hold an append mid-commit and do something else meanwhile,
/// such as drop the caller.
pub struct GatedStore {
    inner: MemoryStore,
    gate: Semaphore,
    waiting: AtomicU64,
}

impl GatedStore {
    /// A store with the gate closed.
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            gate: Semaphore::new(0),
            waiting: AtomicU64::new(0),
        }
    }

    /// Let every pending and future append through.
    pub fn open_gate(&self) {
        self.gate.add_permits(1);
    }

    /// Appends currently parked at the gate.
    pub fn waiting(&self) -> u64 {
        self.waiting.load(Ordering::SeqCst)
    }
}

impl Default for GatedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for GatedStore {
    fn ledger_id(&self) -> LedgerId {
        self.inner.ledger_id()
    }

    async fn count(&self) -> Result<u64> {
        self.inner.count().await
    }

    async fn get(&self, sequence_id: SequenceId) -> Result<DecisionRecord> {
        self.inner.get(sequence_id).await
    }

    async fn range(&self, from: u64, to: u64) -> Result<Vec<DecisionRecord>> {
        self.inner.range(from, to).await
    }

    async fn last(&self) -> Result<Option<DecisionRecord>> {
        self.inner.last().await
    }

    async fn sequence_for_receipt(
        &self,
        receipt: &OperationReceipt,
    ) -> Result<Option<SequenceId>> {
        self.inner.sequence_for_receipt(receipt).await
    }

    async fn append_internal(&self, entry: NewRecord) -> Result<Committed> {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let permit = self.gate.acquire().await;
        self.waiting.fetch_sub(1, Ordering::SeqCst);
        let _permit = permit.map_err(|e| StoreError::Task(e.to_string()))?;
        self.inner.append_internal(entry).await
    }
}
