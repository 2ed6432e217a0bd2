//! In-process FIFO queues for replication events
//!
//! Queues are process-local and unbounded; a crash or restart loses
//! whatever is pending. That trade-off is accepted for this pipeline, and
//! the queue sits behind an `Arc` handle so a durable implementation can
//! replace it without touching the notifiers or schedulers.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use syncline_domain::Event;

/// Thread-safe FIFO queue of replication events
#[derive(Debug, Default)]
pub struct EventQueue {
    inner: Mutex<VecDeque<Event>>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event at the tail
    pub fn push(&self, event: Event) {
        self.inner.lock().push_back(event);
    }

    /// Remove and return the head event, if any.
    ///
    /// The pop is atomic: two concurrent consumers can never observe the
    /// same event.
    pub fn pop(&self) -> Option<Event> {
        self.inner.lock().pop_front()
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True when nothing is pending
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// The two queues of the pipeline, wired explicitly into notifiers and
/// schedulers rather than reached through globals.
#[derive(Debug, Clone, Default)]
pub struct ReplayQueues {
    /// Fan-out of confirmed local mutations
    pub propagate: Arc<EventQueue>,
    /// Failed upstream mutations awaiting replay
    pub retry: Arc<EventQueue>,
}

impl ReplayQueues {
    /// Create a fresh pair of empty queues
    pub fn new() -> Self {
        Self::default()
    }
}
