//! Queue-backed replay notifiers
//!
//! Two notifier values exist per pipeline: one bound to the propagate
//! queue tagging events `PROPAGATE`, one bound to the retry queue tagging
//! events `RETRY`. The binding is chosen at construction, so nothing ever
//! inspects a notifier's type at runtime to decide where an event goes.

use std::sync::Arc;

use syncline_domain::{Event, EventAction, ProductPayload, ReplayReason};
use tracing::debug;

use super::ports::ReplayNotifier;
use super::queue::EventQueue;

/// Notifier bound to one queue and one replay reason
#[derive(Debug, Clone)]
pub struct QueueNotifier {
    queue: Arc<EventQueue>,
    reason: ReplayReason,
}

impl QueueNotifier {
    /// Notifier for the propagate path: confirmed local mutations fanning
    /// out to the upstream.
    pub fn propagate(queue: Arc<EventQueue>) -> Self {
        Self { queue, reason: ReplayReason::Propagate }
    }

    /// Notifier for the retry path: failed upstream mutations awaiting
    /// replay.
    pub fn retry(queue: Arc<EventQueue>) -> Self {
        Self { queue, reason: ReplayReason::Retry }
    }

    /// The reason this notifier stamps on events
    pub const fn reason(&self) -> ReplayReason {
        self.reason
    }
}

impl ReplayNotifier for QueueNotifier {
    fn notify(&self, snapshot: &ProductPayload, action: EventAction) {
        let event = Event::from_payload(snapshot, action, self.reason);
        debug!(%event, pending = self.queue.len() + 1, "Queued replication event");
        self.queue.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ProductPayload {
        ProductPayload {
            id: Some("p-1".to_string()),
            name: Some("widget".to_string()),
            price: Some(2.0),
            quantity: Some(5),
        }
    }

    /// Validates that the propagate variant stamps `PROPAGATE` and targets
    /// only its own queue.
    #[test]
    fn test_propagate_notifier() {
        let queue = Arc::new(EventQueue::new());
        let notifier = QueueNotifier::propagate(Arc::clone(&queue));
        assert_eq!(notifier.reason(), ReplayReason::Propagate);

        notifier.notify(&snapshot(), EventAction::Create);

        let event = queue.pop().unwrap();
        assert_eq!(event.reason(), ReplayReason::Propagate);
        assert_eq!(event.action(), EventAction::Create);
        assert_eq!(event.payload(), snapshot());
    }

    /// Validates that the retry variant stamps `RETRY` and preserves the
    /// snapshot fields.
    #[test]
    fn test_retry_notifier() {
        let queue = Arc::new(EventQueue::new());
        let notifier = QueueNotifier::retry(Arc::clone(&queue));

        notifier.notify(&snapshot(), EventAction::Update);
        notifier.notify(&ProductPayload::for_delete("p-2"), EventAction::Delete);

        let first = queue.pop().unwrap();
        assert_eq!(first.reason(), ReplayReason::Retry);
        assert_eq!(first.action(), EventAction::Update);
        let second = queue.pop().unwrap();
        assert_eq!(second.id(), Some("p-2"));
        assert_eq!(second.action(), EventAction::Delete);
        assert!(queue.is_empty());
    }
}
