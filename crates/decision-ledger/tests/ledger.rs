//! End-to-end ledger behaviour over both store backends.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};
use std::time::Duration;

use proptest::prelude::*;
use tempfile::TempDir;
use tokio::time::timeout;

use decision_ledger::core::validate_entry;
use decision_ledger::store::{MemoryStore, RecordStore, SqliteStore};
use decision_ledger::{
    BroadcastNotifier, CallerContext, ChannelNotifier, Ledger, LedgerConfig, LedgerError,
    OperationReceipt, SequenceId,
};
use decision_ledger_testkit::fixtures::{
    multi_party_contexts, FailingStore, GatedStore, ManualContext, TestFixture,
};
use decision_ledger_testkit::generators::{invalid_entry, keypair, tight_limits, valid_entry};

/// Route ledger logs to the test harness; set RUST_LOG to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn test_bootstrap_scenario() {
    init_tracing();
    let fixture = TestFixture::new();
    let (ledger, mut events) = fixture.ledger();

    let first = ledger
        .log_decision("bootstrap", "first on-chain log")
        .await
        .unwrap();
    fixture.context.advance(1_000);
    let second = ledger
        .log_decision("bootstrap", "second on-chain log")
        .await
        .unwrap();

    assert_eq!(first.sequence_id, SequenceId(0));
    assert_eq!(second.sequence_id, SequenceId(1));
    assert_eq!(ledger.record_count().await.unwrap(), 2);

    let records = ledger.list_records(0, 2).await.unwrap().collect_all().await.unwrap();
    let messages: Vec<&str> = records.iter().map(|r| r.message()).collect();
    assert_eq!(messages, vec!["first on-chain log", "second on-chain log"]);
    for record in &records {
        assert_eq!(record.category(), "bootstrap");
        assert_eq!(record.author(), fixture.author());
    }

    assert_eq!(events.recv().await, Some(first.event));
    assert_eq!(events.recv().await, Some(second.event));
    assert!(events.try_recv().is_none());
}

#[tokio::test]
async fn test_count_tracks_appends() {
    let fixture = TestFixture::new();
    let (ledger, _events) = fixture.ledger();

    for i in 0..10u64 {
        let before = ledger.record_count().await.unwrap();
        let outcome = ledger.log_decision("c", &format!("m{i}")).await.unwrap();
        assert_eq!(outcome.sequence_id.value(), before);
        assert_eq!(ledger.record_count().await.unwrap(), before + 1);
    }
}

#[tokio::test]
async fn test_reads_are_idempotent() {
    let fixture = TestFixture::new();
    let (ledger, _events) = fixture.ledger();
    ledger.log_decision("c", "m").await.unwrap();

    let a = ledger.get_record(SequenceId(0)).await.unwrap();
    let b = ledger.get_record(SequenceId(0)).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(ledger.record_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_boundaries() {
    let fixture = TestFixture::new();
    let (ledger, _events) = fixture.ledger();
    for i in 0..3 {
        ledger.log_decision("c", &format!("m{i}")).await.unwrap();
    }
    let count = ledger.record_count().await.unwrap();

    assert!(matches!(
        ledger.get_record(SequenceId(count)).await,
        Err(LedgerError::NotFound(_))
    ));
    assert!(ledger.list_records(count, count).await.unwrap().is_empty());
    assert!(matches!(
        ledger.list_records(2, 1).await,
        Err(LedgerError::InvalidRange { from: 2, to: 1 })
    ));

    let mut tail = ledger.list_records(1, u64::MAX).await.unwrap();
    assert_eq!(tail.len(), 2);
    assert_eq!(tail.next().await.unwrap().unwrap().sequence_id(), SequenceId(1));
}

#[tokio::test]
async fn test_rejections_leave_no_trace() {
    let fixture = TestFixture::new();
    let (ledger, mut events) = fixture.ledger();
    ledger.log_decision("c", "kept").await.unwrap();
    let _ = events.recv().await;

    assert!(ledger.log_decision("", "m").await.is_err());
    assert!(ledger.log_decision("c", "").await.is_err());
    assert!(ledger
        .log_decision(&"c".repeat(65), "m")
        .await
        .is_err());

    assert_eq!(ledger.record_count().await.unwrap(), 1);
    assert!(events.try_recv().is_none());
}

#[tokio::test]
async fn test_commit_failure_is_atomic() {
    init_tracing();
    let fixture = TestFixture::new();
    let (ledger, mut events) = fixture.ledger_with_store(FailingStore::new());
    ledger.log_decision("c", "before").await.unwrap();
    let _ = events.recv().await;

    ledger.store().set_fail_appends(true);
    let result = ledger.log_decision("c", "lost").await;
    assert!(matches!(result, Err(LedgerError::CommitFailure(_))));
    assert_eq!(ledger.record_count().await.unwrap(), 1);
    assert!(events.try_recv().is_none());

    ledger.store().set_fail_appends(false);
    let outcome = ledger.log_decision("c", "after").await.unwrap();
    assert_eq!(outcome.sequence_id, SequenceId(1));
}

#[tokio::test]
async fn test_timestamps_non_decreasing_under_clock_skew() {
    let fixture = TestFixture::new();
    let (ledger, _events) = fixture.ledger();

    for step in [500i64, -200, 0, -1_000, 300] {
        let now = fixture.context.now();
        fixture.context.set_time(now.saturating_add_signed(step));
        ledger.log_decision("c", "m").await.unwrap();
    }

    let records = ledger.list_records(0, 5).await.unwrap().collect_all().await.unwrap();
    for pair in records.windows(2) {
        assert!(pair[0].recorded_at() <= pair[1].recorded_at());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_are_gapless() {
    const WRITERS: usize = 8;
    const PER_WRITER: usize = 25;
    init_tracing();

    let fixture = TestFixture::new();
    let (ledger, mut events) = fixture.ledger();
    let ledger = Arc::new(ledger);

    let mut handles = Vec::new();
    for (w, context) in multi_party_contexts(WRITERS).into_iter().enumerate() {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            for i in 0..PER_WRITER {
                ledger
                    .log_decision_with(&context, "load", &format!("w{w}-{i}"))
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let total = (WRITERS * PER_WRITER) as u64;
    assert_eq!(ledger.record_count().await.unwrap(), total);

    let records = ledger.list_records(0, total).await.unwrap().collect_all().await.unwrap();
    let emitted = events.drain();
    assert_eq!(emitted.len(), records.len());
    for (i, (record, event)) in records.iter().zip(&emitted).enumerate() {
        assert_eq!(record.sequence_id(), SequenceId(i as u64));
        assert_eq!(event.sequence_id, record.sequence_id());
        assert_eq!(event.message, record.message());
        assert_eq!(event.author, record.author());
    }
}

#[tokio::test]
async fn test_dropped_append_still_commits_and_notifies() {
    init_tracing();
    let fixture = TestFixture::new();
    let (ledger, mut events) = fixture.ledger_with_store(GatedStore::new());

    let dropped = timeout(
        Duration::from_millis(50),
        ledger.log_decision("bootstrap", "dropped caller"),
    )
    .await;
    assert!(dropped.is_err());
    assert_eq!(ledger.store().waiting(), 1);

    ledger.store().open_gate();
    let event = timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("commit abandoned with its caller")
        .unwrap();
    assert_eq!(event.sequence_id, SequenceId(0));
    assert_eq!(event.message, "dropped caller");
    assert_eq!(ledger.record_count().await.unwrap(), 1);

    // The writer lock went with the commit, not with the caller.
    let next = ledger.log_decision("bootstrap", "next").await.unwrap();
    assert_eq!(next.sequence_id, SequenceId(1));
    assert_eq!(events.recv().await, Some(next.event));
}

struct NoopWake;

impl Wake for NoopWake {
    fn wake(self: Arc<Self>) {}
}

#[tokio::test]
async fn test_sqlite_append_dropped_mid_commit_emits_once() {
    let fixture = TestFixture::new();
    let (ledger, mut events) = fixture.ledger_with_store(SqliteStore::open_memory().unwrap());

    let waker = Waker::from(Arc::new(NoopWake));
    let mut cx = Context::from_waker(&waker);
    let mut append = Box::pin(ledger.log_decision("bootstrap", "dropped caller"));
    assert!(matches!(append.as_mut().poll(&mut cx), Poll::Pending));
    drop(append);

    let event = timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("commit abandoned with its caller")
        .unwrap();
    assert_eq!(event.sequence_id, SequenceId(0));
    assert_eq!(ledger.record_count().await.unwrap(), 1);
    assert!(events.try_recv().is_none());
}

/// Run writers and readers together; every read must see whole appends only.
async fn readers_see_whole_appends<S: RecordStore + 'static>(store: S) {
    const WRITERS: usize = 4;
    const PER_WRITER: usize = 20;
    const READERS: usize = 4;

    let fixture = TestFixture::new();
    let (ledger, _events) = fixture.ledger_with_store(store);
    let ledger = Arc::new(ledger);
    let done = Arc::new(AtomicBool::new(false));

    let mut readers = Vec::new();
    for _ in 0..READERS {
        let ledger = Arc::clone(&ledger);
        let done = Arc::clone(&done);
        readers.push(tokio::spawn(async move {
            let mut seen = 0u64;
            loop {
                let finished = done.load(Ordering::SeqCst);
                let count = ledger.record_count().await.unwrap();
                assert!(count >= seen, "count went backwards: {seen} -> {count}");
                seen = count;

                if count > 0 {
                    let newest = ledger.get_record(SequenceId(count - 1)).await.unwrap();
                    assert_eq!(newest.sequence_id(), SequenceId(count - 1));
                }

                let window = ledger
                    .list_records(0, count)
                    .await
                    .unwrap()
                    .collect_all()
                    .await
                    .unwrap();
                assert_eq!(window.len() as u64, count);
                for (i, record) in window.iter().enumerate() {
                    assert_eq!(record.sequence_id(), SequenceId(i as u64));
                }

                if finished {
                    break;
                }
                tokio::task::yield_now().await;
            }
        }));
    }

    let mut writers = Vec::new();
    for (w, context) in multi_party_contexts(WRITERS).into_iter().enumerate() {
        let ledger = Arc::clone(&ledger);
        writers.push(tokio::spawn(async move {
            for i in 0..PER_WRITER {
                ledger
                    .log_decision_with(&context, "load", &format!("w{w}-{i}"))
                    .await
                    .unwrap();
            }
        }));
    }
    for writer in writers {
        writer.await.unwrap();
    }
    done.store(true, Ordering::SeqCst);
    for reader in readers {
        reader.await.unwrap();
    }

    let total = (WRITERS * PER_WRITER) as u64;
    assert_eq!(ledger.record_count().await.unwrap(), total);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_memory_readers_during_appends() {
    readers_see_whole_appends(MemoryStore::new()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sqlite_readers_during_appends() {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::create(dir.path().join("ledger.db")).unwrap();
    readers_see_whole_appends(store).await;
}

#[tokio::test]
async fn test_receipts_confirm_and_are_unique() {
    let fixture = TestFixture::new();
    let (ledger, _events) = fixture.ledger();

    let a = ledger.log_decision("c", "same").await.unwrap();
    let b = ledger.log_decision("c", "same").await.unwrap();
    assert_ne!(a.receipt, b.receipt);

    assert_eq!(ledger.confirm_receipt(&a.receipt).await.unwrap(), SequenceId(0));
    assert_eq!(ledger.confirm_receipt(&b.receipt).await.unwrap(), SequenceId(1));
    assert!(matches!(
        ledger
            .confirm_receipt(&OperationReceipt::from_bytes([7; 32]))
            .await,
        Err(LedgerError::ReceiptNotFound(_))
    ));

    // Same content on another ledger yields a different receipt.
    let (other, _events) = fixture.ledger();
    let c = other.log_decision("c", "same").await.unwrap();
    assert_ne!(a.receipt, c.receipt);
}

#[tokio::test]
async fn test_sqlite_ledger_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.db");
    let fixture = TestFixture::new();

    let (ledger_id, outcomes, records) = {
        let (ledger, _events) = fixture.ledger_with_store(SqliteStore::create(&path).unwrap());
        let mut outcomes = Vec::new();
        for msg in ["first on-chain log", "second on-chain log"] {
            outcomes.push(ledger.log_decision("bootstrap", msg).await.unwrap());
        }
        let records = ledger.list_records(0, 2).await.unwrap().collect_all().await.unwrap();
        (ledger.ledger_id(), outcomes, records)
    };

    let (reopened, _events) = fixture.ledger_with_store(SqliteStore::open(&path).unwrap());
    assert_eq!(reopened.ledger_id(), ledger_id);
    assert_eq!(reopened.record_count().await.unwrap(), 2);
    assert_eq!(
        reopened.list_records(0, 2).await.unwrap().collect_all().await.unwrap(),
        records
    );
    for outcome in &outcomes {
        assert_eq!(
            reopened.confirm_receipt(&outcome.receipt).await.unwrap(),
            outcome.sequence_id
        );
    }

    let next = reopened.log_decision("bootstrap", "third").await.unwrap();
    assert_eq!(next.sequence_id, SequenceId(2));
}

#[tokio::test]
async fn test_cursor_pages_and_restarts() {
    let fixture = TestFixture::new();
    let ledger = Ledger::new(
        MemoryStore::new(),
        fixture.context.clone(),
        Arc::new(BroadcastNotifier::new()),
        LedgerConfig::default().with_page_size(3),
    );
    for i in 0..10 {
        ledger.log_decision("c", &format!("m{i}")).await.unwrap();
    }

    let mut cursor = ledger.list_records(2, 8).await.unwrap();
    let first_pass = cursor.collect_remaining().await.unwrap();
    assert_eq!(first_pass.len(), 6);
    assert_eq!(first_pass[0].message(), "m2");

    cursor.restart();
    let second_pass = cursor.collect_remaining().await.unwrap();
    assert_eq!(first_pass, second_pass);

    // Records appended after the cursor was created stay out of it.
    let mut all = ledger.list_records(0, u64::MAX).await.unwrap();
    ledger.log_decision("c", "late").await.unwrap();
    assert_eq!(all.len(), 10);
    assert_eq!(all.collect_all().await.unwrap().len(), 10);
}

#[tokio::test]
async fn test_broadcast_subscribers_see_commits_in_order() {
    let fixture = TestFixture::new();
    let notifier = Arc::new(BroadcastNotifier::with_capacity(16));
    let mut subscriber = notifier.subscribe();

    let ledger = Ledger::new(
        MemoryStore::new(),
        fixture.context.clone(),
        notifier.clone(),
        LedgerConfig::default(),
    );
    for i in 0..3 {
        ledger.log_decision("c", &format!("m{i}")).await.unwrap();
    }

    for i in 0..3 {
        let event = subscriber.recv().await.unwrap();
        assert_eq!(event.sequence_id, SequenceId(i));
    }
    assert_eq!(ledger.store().count().await.unwrap(), 3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn valid_entries_round_trip(entries in prop::collection::vec(valid_entry(), 1..20)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let fixture = TestFixture::new();
            let (ledger, mut events) = fixture.ledger();

            for (i, (category, message)) in entries.iter().enumerate() {
                let outcome = ledger.log_decision(category, message).await.unwrap();
                prop_assert_eq!(outcome.sequence_id, SequenceId(i as u64));

                let record = ledger.get_record(outcome.sequence_id).await.unwrap();
                prop_assert_eq!(record.category(), category.as_str());
                prop_assert_eq!(record.message(), message.as_str());
                prop_assert_eq!(record.author(), fixture.author());
            }
            prop_assert_eq!(events.drain().len(), entries.len());
            Ok(())
        })?;
    }

    #[test]
    fn invalid_entries_never_mutate((category, message) in invalid_entry()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let fixture = TestFixture::new();
            let (ledger, mut events) = fixture.ledger();

            let result = ledger.log_decision(&category, &message).await;
            prop_assert!(matches!(result, Err(LedgerError::InvalidInput(_))));
            prop_assert_eq!(ledger.record_count().await.unwrap(), 0);
            prop_assert!(events.try_recv().is_none());
            Ok(())
        })?;
    }

    #[test]
    fn configured_limits_decide_acceptance(
        limits in tight_limits(),
        (category, message) in valid_entry(),
        signer in keypair(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (notifier, mut events) = ChannelNotifier::new();
            let ledger = Ledger::new(
                MemoryStore::new(),
                Arc::new(ManualContext::from_keypair(&signer)),
                Arc::new(notifier),
                LedgerConfig::default().with_limits(limits),
            );
            prop_assert_eq!(ledger.config().limits, limits);

            let expected = validate_entry(&category, &message, &limits);
            match ledger.log_decision(&category, &message).await {
                Ok(outcome) => {
                    prop_assert!(expected.is_ok());
                    prop_assert_eq!(outcome.event.author, signer.author());
                    prop_assert_eq!(events.try_recv(), Some(outcome.event));
                }
                Err(LedgerError::InvalidInput(e)) => {
                    prop_assert_eq!(Err(e), expected);
                    prop_assert_eq!(ledger.record_count().await.unwrap(), 0);
                    prop_assert!(events.try_recv().is_none());
                }
                Err(e) => prop_assert!(false, "unexpected error: {}", e),
            }
            Ok(())
        })?;
    }
}
