//! Immutable replication events
//!
//! Every guarded mutation of the upstream dependency is mirrored by an
//! [`Event`]: the propagate path records successful local mutations for
//! fan-out, the retry path records failed upstream mutations for later
//! replay. Events are constructed once and never mutated; replay failures
//! produce a brand-new event rather than editing the old one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ProductPatch, ProductPayload};

/// Mutation kind carried by a replication event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "CREATE"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// Why an event was queued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplayReason {
    /// Fan-out of a successful local mutation
    Propagate,
    /// Replay of a failed upstream mutation
    Retry,
}

impl fmt::Display for ReplayReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Propagate => write!(f, "PROPAGATE"),
            Self::Retry => write!(f, "RETRY"),
        }
    }
}

/// Immutable value object describing one queued mutation.
///
/// Fields are private; the snapshot is captured at construction and read
/// back through [`payload`](Event::payload) / [`patch`](Event::patch) when
/// a scheduler replays the event. `id` is always present for update and
/// delete events; create events carry one only after upstream persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    action: EventAction,
    reason: ReplayReason,
    id: Option<String>,
    name: Option<String>,
    price: Option<f64>,
    quantity: Option<u32>,
}

impl Event {
    /// Capture a product snapshot as an event.
    pub fn from_payload(payload: &ProductPayload, action: EventAction, reason: ReplayReason) -> Self {
        Self {
            action,
            reason,
            id: payload.id.clone(),
            name: payload.name.clone(),
            price: payload.price,
            quantity: payload.quantity,
        }
    }

    /// Mutation kind.
    pub const fn action(&self) -> EventAction {
        self.action
    }

    /// Queueing reason.
    pub const fn reason(&self) -> ReplayReason {
        self.reason
    }

    /// Product id, when the snapshot carries one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Rebuild the full snapshot for create replays.
    pub fn payload(&self) -> ProductPayload {
        ProductPayload {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
            quantity: self.quantity,
        }
    }

    /// Rebuild the partial update for update replays.
    pub fn patch(&self) -> ProductPatch {
        ProductPatch { name: self.name.clone(), price: self.price, quantity: self.quantity }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} id={}",
            self.reason,
            self.action,
            self.id.as_deref().unwrap_or("<unassigned>")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ProductPayload {
        ProductPayload {
            id: Some("p-1".to_string()),
            name: Some("widget".to_string()),
            price: Some(4.5),
            quantity: Some(7),
        }
    }

    /// Validates snapshot capture and read-back.
    ///
    /// Assertions:
    /// - `payload()` reproduces the captured snapshot exactly.
    /// - Action and reason are preserved.
    #[test]
    fn test_event_round_trips_payload() {
        let event = Event::from_payload(&snapshot(), EventAction::Update, ReplayReason::Retry);
        assert_eq!(event.action(), EventAction::Update);
        assert_eq!(event.reason(), ReplayReason::Retry);
        assert_eq!(event.id(), Some("p-1"));
        assert_eq!(event.payload(), snapshot());
    }

    /// Validates patch reconstruction drops the id.
    #[test]
    fn test_event_patch_excludes_id() {
        let event = Event::from_payload(&snapshot(), EventAction::Update, ReplayReason::Retry);
        let patch = event.patch();
        assert_eq!(patch.name.as_deref(), Some("widget"));
        assert_eq!(patch.price, Some(4.5));
        assert_eq!(patch.quantity, Some(7));
    }

    /// Validates structural equality between identically built events.
    #[test]
    fn test_event_structural_equality() {
        let a = Event::from_payload(&snapshot(), EventAction::Create, ReplayReason::Propagate);
        let b = Event::from_payload(&snapshot(), EventAction::Create, ReplayReason::Propagate);
        let c = Event::from_payload(&snapshot(), EventAction::Create, ReplayReason::Retry);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    /// Validates enum wire names match the upstream contract.
    #[test]
    fn test_enum_serialization() {
        assert_eq!(serde_json::to_string(&EventAction::Create).unwrap(), "\"CREATE\"");
        assert_eq!(serde_json::to_string(&ReplayReason::Retry).unwrap(), "\"RETRY\"");
    }

    /// Validates the log-friendly Display rendering.
    #[test]
    fn test_event_display() {
        let event = Event::from_payload(&snapshot(), EventAction::Delete, ReplayReason::Retry);
        assert_eq!(event.to_string(), "RETRY DELETE id=p-1");

        let no_id = Event::from_payload(
            &ProductPayload::default(),
            EventAction::Create,
            ReplayReason::Propagate,
        );
        assert_eq!(no_id.to_string(), "PROPAGATE CREATE id=<unassigned>");
    }
}
