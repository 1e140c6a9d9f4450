//! In-memory event log for replay and inspection

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::types::EventEnvelope;

/// Bounded ring of recently published events.
///
/// Oldest events are evicted once `capacity` is reached.
#[derive(Debug)]
pub struct EventLog {
    entries: Mutex<VecDeque<Arc<EventEnvelope>>>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Arc<EventEnvelope>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, envelope: Arc<EventEnvelope>) {
        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(envelope);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn all(&self) -> Vec<Arc<EventEnvelope>> {
        self.lock().iter().cloned().collect()
    }

    /// Last `n` events, oldest first
    pub fn recent(&self, n: usize) -> Vec<Arc<EventEnvelope>> {
        let entries = self.lock();
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    /// Events with a sequence number strictly greater than `sequence`
    pub fn since(&self, sequence: u64) -> Vec<Arc<EventEnvelope>> {
        self.lock()
            .iter()
            .filter(|e| e.sequence > sequence)
            .cloned()
            .collect()
    }

    pub fn of_type(&self, event_type: &str) -> Vec<Arc<EventEnvelope>> {
        self.lock()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .cloned()
            .collect()
    }

    /// Event type tags in order, for quick assertions and summaries
    pub fn types(&self) -> Vec<&'static str> {
        self.lock().iter().map(|e| e.event_type()).collect()
    }

    pub fn clear(&self) {
        let mut entries = self.lock();
        debug!(dropped = entries.len(), "Event log cleared");
        entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::GameEvent;

    fn envelope(sequence: u64, step_mode: bool) -> Arc<EventEnvelope> {
        Arc::new(EventEnvelope::new(
            sequence,
            GameEvent::RunnerResumed { step_mode },
        ))
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let log = EventLog::new(2);
        log.record(envelope(0, false));
        log.record(envelope(1, false));
        log.record(envelope(2, false));

        let seqs: Vec<u64> = log.all().iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn test_recent_and_since() {
        let log = EventLog::new(10);
        for i in 0..5 {
            log.record(envelope(i, i % 2 == 0));
        }
        assert_eq!(log.recent(2).len(), 2);
        assert_eq!(log.recent(2)[0].sequence, 3);
        assert_eq!(log.since(2).len(), 2);
        assert_eq!(log.recent(50).len(), 5);
    }

    #[test]
    fn test_of_type_and_clear() {
        let log = EventLog::new(10);
        log.record(envelope(0, false));
        assert_eq!(log.of_type("runner_resumed").len(), 1);
        assert!(log.of_type("game_ended").is_empty());
        assert_eq!(log.types(), vec!["runner_resumed"]);

        log.clear();
        assert!(log.is_empty());
    }
}
