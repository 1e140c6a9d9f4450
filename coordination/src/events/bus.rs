//! Fan-out event bus for game observers
//!
//! Every subscriber owns an unbounded queue, so a slow reader never blocks
//! the game loop. Subscribers whose receiver has been dropped are pruned on
//! the next publish.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::history::EventLog;
use super::types::{EventEnvelope, GameEvent};

/// Error type for event bus operations
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Unknown subscriber: {0}")]
    UnknownSubscriber(SubscriberId),

    #[error("Channel closed")]
    ChannelClosed,
}

/// Result type for event bus operations
pub type EventBusResult<T> = Result<T, EventBusError>;

/// Shared reference to EventBus
pub type SharedEventBus = Arc<EventBus>;

/// Opaque subscriber handle
pub type SubscriberId = u64;

type Subscribers = HashMap<SubscriberId, mpsc::UnboundedSender<Arc<EventEnvelope>>>;

/// A live subscription: events arrive on `receiver` in emission order.
#[derive(Debug)]
pub struct EventSubscription {
    pub id: SubscriberId,
    pub receiver: mpsc::UnboundedReceiver<Arc<EventEnvelope>>,
}

impl EventSubscription {
    /// Wait for the next event. `None` once the subscription is removed.
    pub async fn recv(&mut self) -> Option<Arc<EventEnvelope>> {
        self.receiver.recv().await
    }

    /// Take whatever is already queued without waiting.
    pub fn drain(&mut self) -> Vec<Arc<EventEnvelope>> {
        let mut out = Vec::new();
        while let Ok(envelope) = self.receiver.try_recv() {
            out.push(envelope);
        }
        out
    }
}

/// Event bus with per-subscriber queues and an optional in-memory log
pub struct EventBus {
    subscribers: Mutex<Subscribers>,
    next_id: AtomicU64,
    sequence: AtomicU64,
    log: Option<Arc<EventLog>>,
}

impl EventBus {
    /// Create a new event bus without a log
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            sequence: AtomicU64::new(0),
            log: None,
        }
    }

    /// Create an event bus that also records every event in `log`
    pub fn with_log(log: Arc<EventLog>) -> Self {
        Self {
            log: Some(log),
            ..Self::new()
        }
    }

    /// Create a shared reference to this event bus
    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    pub fn log(&self) -> Option<&Arc<EventLog>> {
        self.log.as_ref()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Publish an event to all subscribers.
    ///
    /// Sequence assignment and delivery happen under the subscriber lock,
    /// so every subscriber observes the same total order.
    pub fn publish(&self, event: GameEvent) -> Arc<EventEnvelope> {
        let event_type = event.event_type();
        let mut subscribers = self.lock();
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = Arc::new(EventEnvelope::new(sequence, event));

        if let Some(log) = &self.log {
            log.record(Arc::clone(&envelope));
        }

        let mut dead = Vec::new();
        for (id, sender) in subscribers.iter() {
            if sender.send(Arc::clone(&envelope)).is_err() {
                dead.push(*id);
            }
        }
        for id in &dead {
            subscribers.remove(id);
            warn!(subscriber = id, event_type, "Pruned disconnected subscriber");
        }

        debug!(
            event_type,
            sequence,
            receivers = subscribers.len(),
            "Event published"
        );
        envelope
    }

    /// Subscribe to receive all events published from now on
    pub fn subscribe(&self) -> EventSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.lock().insert(id, sender);
        debug!(subscriber = id, "Subscriber added");
        EventSubscription { id, receiver }
    }

    /// Subscribe with a filter applied on the receiving side
    pub fn subscribe_filtered(&self, filter: EventFilter) -> FilteredSubscription {
        FilteredSubscription {
            inner: self.subscribe(),
            filter,
        }
    }

    /// Remove a subscriber. Its receiver yields `None` once drained.
    pub fn unsubscribe(&self, id: SubscriberId) -> EventBusResult<()> {
        match self.lock().remove(&id) {
            Some(_) => {
                debug!(subscriber = id, "Subscriber removed");
                Ok(())
            }
            None => Err(EventBusError::UnknownSubscriber(id)),
        }
    }

    /// Get the number of current subscribers
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Check if the bus has any subscribers
    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }

    /// Number of events published so far
    pub fn published(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Event filter for selective subscription
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Filter by event types
    pub event_types: Option<Vec<String>>,
    /// Drop runner_paused / runner_resumed
    pub skip_control_markers: bool,
}

impl EventFilter {
    /// Create a new empty filter (matches all events)
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by event types
    pub fn types(mut self, event_types: Vec<&str>) -> Self {
        self.event_types = Some(event_types.into_iter().map(String::from).collect());
        self
    }

    pub fn without_control_markers(mut self) -> Self {
        self.skip_control_markers = true;
        self
    }

    /// Check if an event matches this filter
    pub fn matches(&self, event: &GameEvent) -> bool {
        if self.skip_control_markers && event.is_control_marker() {
            return false;
        }
        if let Some(ref types) = self.event_types {
            if !types.iter().any(|t| t == event.event_type()) {
                return false;
            }
        }
        true
    }
}

/// Subscription that only yields matching events
pub struct FilteredSubscription {
    inner: EventSubscription,
    filter: EventFilter,
}

impl FilteredSubscription {
    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Receive the next matching event
    pub async fn recv(&mut self) -> EventBusResult<Arc<EventEnvelope>> {
        loop {
            let envelope = self
                .inner
                .recv()
                .await
                .ok_or(EventBusError::ChannelClosed)?;
            if self.filter.matches(&envelope.event) {
                return Ok(envelope);
            }
        }
    }
}
