//! Notification channel: how committed decisions reach outside observers.
//!
//! The ledger calls [`Notifier::notify`] exactly once per committed append,
//! while still holding its write lock, so events leave in sequence order.
//! What happens after that (a slow consumer, a dropped receiver) is the
//! consumer's concern and never affects the commit.

use std::sync::atomic::{AtomicU64, Ordering};

use decision_ledger_core::DecisionLogged;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

/// Default buffer size for [`BroadcastNotifier`].
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Outbound side of the notification channel.
pub trait Notifier: Send + Sync {
    /// Publish one event. Must not block and must not fail the append.
    fn notify(&self, event: DecisionLogged);

    /// Total events handed to this notifier.
    fn events_published(&self) -> u64;
}

/// Discards every event. For ledgers nobody observes.
#[derive(Debug, Default)]
pub struct NullNotifier {
    published: AtomicU64,
}

impl NullNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for NullNotifier {
    fn notify(&self, _event: DecisionLogged) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

/// Single-consumer, unbounded, ordered queue.
///
/// Appends never wait on the consumer. The paired [`DecisionEvents`]
/// receives every event in the order the ledger committed them.
#[derive(Debug)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<DecisionLogged>,
    published: AtomicU64,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver its events arrive on.
    pub fn new() -> (Self, DecisionEvents) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let notifier = Self {
            sender,
            published: AtomicU64::new(0),
        };
        (notifier, DecisionEvents { receiver })
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, event: DecisionLogged) {
        self.published.fetch_add(1, Ordering::Relaxed);
        let seq = event.sequence_id;
        if self.sender.send(event).is_err() {
            warn!(seq = seq.value(), "event receiver dropped; notification not delivered");
        }
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

/// Receiving end of a [`ChannelNotifier`].
#[derive(Debug)]
pub struct DecisionEvents {
    receiver: mpsc::UnboundedReceiver<DecisionLogged>,
}

impl DecisionEvents {
    /// Wait for the next event. `None` once the notifier is dropped and the
    /// queue drained.
    pub async fn recv(&mut self) -> Option<DecisionLogged> {
        self.receiver.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<DecisionLogged> {
        self.receiver.try_recv().ok()
    }

    /// Take every event queued right now.
    pub fn drain(&mut self) -> Vec<DecisionLogged> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Fan-out to any number of observers.
///
/// Uses `tokio::sync::broadcast`: each subscriber sees events in order from
/// the point it subscribed. A subscriber that falls more than `capacity`
/// events behind gets `RecvError::Lagged` and must catch up from the ledger
/// itself.
#[derive(Debug)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<DecisionLogged>,
    published: AtomicU64,
    capacity: usize,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Start receiving events committed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DecisionLogged> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, event: DecisionLogged) {
        self.published.fetch_add(1, Ordering::Relaxed);
        let seq = event.sequence_id;
        match self.sender.send(event) {
            Ok(receivers) => debug!(seq = seq.value(), receivers, "event broadcast"),
            Err(_) => debug!(seq = seq.value(), "no subscribers for event"),
        }
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
