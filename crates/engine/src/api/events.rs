//! Event bridge - typed publish/subscribe for mystery events.
//!
//! Subscribers are either unbounded channels (async consumers such as the
//! binary's printer task) or synchronous callbacks (UI re-render hooks).
//! Each subscription is tied to a `Subscription` handle; dropping the
//! handle unsubscribes.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use retrodesk_domain::PatternEvent;
use tokio::sync::mpsc;

/// Synchronous subscriber.
///
/// Invoked on the publishing thread, possibly while the engine lock is held,
/// so it must not record actions synchronously.
pub type EventCallback = Arc<dyn Fn(&PatternEvent) + Send + Sync>;

#[derive(Clone)]
enum Subscriber {
    Channel(mpsc::UnboundedSender<PatternEvent>),
    Callback(EventCallback),
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<(u64, Subscriber)>,
}

type Shared = Arc<Mutex<Subscribers>>;

fn lock(shared: &Mutex<Subscribers>) -> MutexGuard<'_, Subscribers> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fan-out point for `PatternEvent`s.
///
/// Events are delivered to every subscriber in subscription order. A single
/// publisher (the engine, under its lock) plus FIFO channels keeps events
/// for the same pattern in production order.
#[derive(Clone, Default)]
pub struct EventBridge {
    subscribers: Shared,
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe with a channel. The receiver ends once the handle is dropped.
    pub fn subscribe(&self) -> (Subscription, mpsc::UnboundedReceiver<PatternEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (self.register(Subscriber::Channel(tx)), rx)
    }

    /// Subscribe with a callback.
    pub fn subscribe_fn<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&PatternEvent) + Send + Sync + 'static,
    {
        self.register(Subscriber::Callback(Arc::new(callback)))
    }

    fn register(&self, subscriber: Subscriber) -> Subscription {
        let mut subscribers = lock(&self.subscribers);
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.entries.push((id, subscriber));
        tracing::debug!(subscriber_id = id, "Event subscriber registered");

        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Deliver `event` to every live subscriber.
    ///
    /// Callbacks run after the subscriber list is released, so they may
    /// subscribe or unsubscribe. Channels whose receiver is gone are pruned.
    pub fn publish(&self, event: PatternEvent) {
        let targets: Vec<(u64, Subscriber)> = lock(&self.subscribers).entries.clone();
        if targets.is_empty() {
            return;
        }

        tracing::trace!(event_type = event.event_type(), "Publishing event");

        let mut closed = Vec::new();
        for (id, subscriber) in targets {
            match subscriber {
                Subscriber::Channel(tx) => {
                    if tx.send(event.clone()).is_err() {
                        closed.push(id);
                    }
                }
                Subscriber::Callback(callback) => callback(&event),
            }
        }

        if !closed.is_empty() {
            let mut subscribers = lock(&self.subscribers);
            subscribers.entries.retain(|(id, _)| !closed.contains(id));
            tracing::debug!(pruned = closed.len(), "Pruned closed event channels");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).entries.len()
    }
}

/// Handle for one subscription. Dropping it unsubscribes.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    id: u64,
    subscribers: Weak<Mutex<Subscribers>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            let mut subscribers = lock(&subscribers);
            subscribers.entries.retain(|(id, _)| *id != self.id);
            tracing::debug!(subscriber_id = self.id, "Event subscriber removed");
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
