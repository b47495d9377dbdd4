//! # ledgerstream-types: core data model for the ledgerstream runtime
//!
//! This crate contains the types shared across the persistence pipeline:
//! - The stored-event data model ([`StoredEvent`], [`Notification`],
//!   [`Tracking`]).
//! - The shared error type ([`error::PersistenceError`]).
//!
//! It has no knowledge of transcoding, ciphering, or storage back-ends —
//! those live in their own crates and depend on this one.

pub mod error;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use error::{PersistenceError, PersistenceResult};

/// The persisted form of a single domain event, after the mapper pipeline
/// has turned it into an opaque byte payload.
///
/// `topic` is a stable, process-restart-safe label identifying the
/// concrete event type so a [`Mapper`](crate) (defined in
/// `ledgerstream-storage`) can reconstruct the right variant on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub originator_id: Uuid,
    pub originator_version: u64,
    pub topic: String,
    pub state: Vec<u8>,
}

impl StoredEvent {
    pub fn new(originator_id: Uuid, originator_version: u64, topic: impl Into<String>, state: Vec<u8>) -> Self {
        Self {
            originator_id,
            originator_version,
            topic: topic.into(),
            state,
        }
    }
}

/// A [`StoredEvent`] annotated with a notification id assigned globally,
/// across all aggregates, by an [`ApplicationRecorder`](crate) (defined in
/// `ledgerstream-storage`).
///
/// Ids are strictly increasing and gap-free as observed by any reader —
/// see `spec.md` §3 invariant 2 and `SPEC_FULL.md` §5.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub originator_id: Uuid,
    pub originator_version: u64,
    pub topic: String,
    pub state: Vec<u8>,
}

impl Notification {
    pub fn from_stored_event(id: u64, event: StoredEvent) -> Self {
        Self {
            id,
            originator_id: event.originator_id,
            originator_version: event.originator_version,
            topic: event.topic,
            state: event.state,
        }
    }

    pub fn as_stored_event(&self) -> StoredEvent {
        StoredEvent {
            originator_id: self.originator_id,
            originator_version: self.originator_version,
            topic: self.topic.clone(),
            state: self.state.clone(),
        }
    }
}

/// A record that `application_name` has consumed upstream notification
/// `notification_id`. Used by a [`ProcessRecorder`](crate) (defined in
/// `ledgerstream-storage`) to make cross-application processing
/// idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tracking {
    pub application_name: String,
    pub notification_id: u64,
}

impl Tracking {
    pub fn new(application_name: impl Into<String>, notification_id: u64) -> Self {
        Self {
            application_name: application_name.into(),
            notification_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_event_roundtrips_through_json() {
        let event = StoredEvent::new(Uuid::nil(), 0, "topic1", b"state1".to_vec());
        let json = serde_json::to_string(&event).unwrap();
        let back: StoredEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn notification_carries_stored_event_fields() {
        let event = StoredEvent::new(Uuid::nil(), 3, "topic2", b"state2".to_vec());
        let notification = Notification::from_stored_event(42, event.clone());
        assert_eq!(notification.id, 42);
        assert_eq!(notification.as_stored_event(), event);
    }

    #[test]
    fn tracking_equality_is_by_value() {
        let a = Tracking::new("upstream_app", 1);
        let b = Tracking::new("upstream_app", 1);
        let c = Tracking::new("upstream_app", 2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
