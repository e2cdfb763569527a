//! In-process pub/sub with bounded per-subscriber channels and
//! slow-consumer-drop semantics (spec §4.3).
//!
//! The subscriber set is the shared mutable structure the teacher protects
//! with a mutex around plain state (`session_daemon::server::DaemonState`);
//! the non-blocking `try_send`-and-swallow-`Full` pattern that realizes
//! "drops never propagate back to the publisher" mirrors the teacher's own
//! use of `try_send` in `mcp/server.rs::handle_submit_review`.

use crate::session_store::types::Event;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Default bounded channel size per subscriber (spec §4.3).
pub const DEFAULT_BUFFER_SIZE: usize = 256;

type SubscriberId = u64;

struct Subscriber {
    sender: mpsc::Sender<Event>,
    dropped: Arc<AtomicU64>,
}

/// Handle returned by `subscribe()`: a receive end plus a cancel function.
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<Event>,
    pub dropped_count: Arc<AtomicU64>,
    bus: EventBus,
}

impl Subscription {
    /// Drains and closes the channel and removes this subscriber from the bus.
    pub fn cancel(mut self) {
        self.receiver.close();
        self.bus.unsubscribe(self.id);
    }
}

/// In-process event broadcaster. Cheaply `Clone`-able (an `Arc` inside),
/// the way the teacher's `AppState` wraps its `broadcast::Sender` for reuse
/// across axum handlers.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

struct Inner {
    subscribers: Mutex<HashMap<SubscriberId, Subscriber>>,
    next_id: AtomicU64,
    buffer_size: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl EventBus {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                subscribers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                buffer_size,
            }),
        }
    }

    /// Registers a new subscriber and returns its handle.
    pub fn subscribe(&self) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.inner.buffer_size);
        let dropped = Arc::new(AtomicU64::new(0));
        self.inner.subscribers.lock().unwrap().insert(
            id,
            Subscriber {
                sender: tx,
                dropped: dropped.clone(),
            },
        );
        Subscription {
            id,
            receiver: rx,
            dropped_count: dropped,
            bus: self.clone(),
        }
    }

    fn unsubscribe(&self, id: SubscriberId) {
        self.inner.subscribers.lock().unwrap().remove(&id);
    }

    /// Non-blocking fan-out publish. Never blocks on a slow or absent
    /// subscriber: a full channel increments that subscriber's drop counter
    /// and the event is silently dropped for it (spec §4.3).
    pub fn publish(&self, event: Event) {
        let subscribers = self.inner.subscribers.lock().unwrap();
        for sub in subscribers.values() {
            if let Err(mpsc::error::TrySendError::Full(_)) = sub.sender.try_send(event.clone()) {
                sub.dropped.fetch_add(1, Ordering::Relaxed);
            }
            // `Closed` means the subscriber already dropped its receiver;
            // it will be reaped on its own `cancel()` / drop path.
        }
    }

    /// Number of currently-registered subscribers (diagnostics only).
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().unwrap().len()
    }
}
