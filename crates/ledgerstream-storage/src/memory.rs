//! An in-process reference recorder backend.
//!
//! Not a production storage engine: it holds everything in a
//! `Mutex`-guarded state and serializes every insert behind a single
//! critical section (the "naive approach" for the notification-ID
//! invariant). It exists to make the recorder contracts testable
//! end-to-end and to give callers a working recorder with no database
//! dependency, the same role the original library's in-memory "POPO"
//! recorder plays in its own test suite.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use ledgerstream_types::{Notification, PersistenceError, PersistenceResult, StoredEvent, Tracking};
use uuid::Uuid;

use crate::recorder::{AggregateRecorder, ApplicationRecorder, ProcessRecorder};

#[derive(Default)]
struct State {
    aggregates: HashMap<Uuid, Vec<StoredEvent>>,
    notifications: Vec<Notification>,
    tracking: HashMap<String, HashSet<u64>>,
    tracking_max: HashMap<String, u64>,
}

impl State {
    fn check_no_conflicts(&self, events: &[StoredEvent]) -> PersistenceResult<()> {
        let mut seen_in_batch: HashMap<Uuid, HashSet<u64>> = HashMap::new();
        for event in events {
            let existing = self
                .aggregates
                .get(&event.originator_id)
                .map(|v| v.iter().any(|e| e.originator_version == event.originator_version))
                .unwrap_or(false);
            if existing {
                tracing::warn!(
                    originator_id = %event.originator_id,
                    originator_version = event.originator_version,
                    "rejecting insert: version already recorded for this aggregate"
                );
                return Err(PersistenceError::integrity(format!(
                    "duplicate version {} for aggregate {}",
                    event.originator_version, event.originator_id
                )));
            }
            if !seen_in_batch.entry(event.originator_id).or_default().insert(event.originator_version) {
                tracing::warn!(
                    originator_id = %event.originator_id,
                    originator_version = event.originator_version,
                    "rejecting insert: duplicate version within the same batch"
                );
                return Err(PersistenceError::integrity(format!(
                    "duplicate version {} for aggregate {} within the same batch",
                    event.originator_version, event.originator_id
                )));
            }
        }
        Ok(())
    }

    fn apply(&mut self, events: Vec<StoredEvent>, tracking: Option<Tracking>) -> PersistenceResult<Vec<u64>> {
        self.check_no_conflicts(&events)?;
        if let Some(t) = &tracking {
            let consumed = self.tracking.get(&t.application_name).map(|s| s.contains(&t.notification_id)).unwrap_or(false);
            if consumed {
                tracing::warn!(
                    application_name = %t.application_name,
                    notification_id = t.notification_id,
                    "rejecting insert: notification already tracked for this application"
                );
                return Err(PersistenceError::integrity(format!(
                    "duplicate tracking ({}, {})",
                    t.application_name, t.notification_id
                )));
            }
        }

        let mut ids = Vec::with_capacity(events.len());
        for event in events {
            self.aggregates.entry(event.originator_id).or_default().push(event.clone());
            let id = self.notifications.len() as u64 + 1;
            self.notifications.push(Notification::from_stored_event(id, event));
            ids.push(id);
        }
        for aggregate in self.aggregates.values_mut() {
            aggregate.sort_by_key(|e| e.originator_version);
        }

        if let Some(t) = tracking {
            self.tracking.entry(t.application_name.clone()).or_default().insert(t.notification_id);
            let max = self.tracking_max.entry(t.application_name).or_insert(0);
            *max = (*max).max(t.notification_id);
        }

        tracing::debug!(inserted = ids.len(), "recorder insert committed");
        Ok(ids)
    }
}

/// A thread-safe in-process recorder implementing all three recorder
/// contracts over the same underlying state.
pub struct MemoryRecorder {
    state: Mutex<State>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self { state: Mutex::new(State::default()) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("MemoryRecorder mutex poisoned")
    }
}

impl Default for MemoryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregateRecorder for MemoryRecorder {
    fn insert_events(&self, events: Vec<StoredEvent>) -> PersistenceResult<()> {
        if events.is_empty() {
            return Ok(());
        }
        self.lock().apply(events, None)?;
        Ok(())
    }

    fn select_events(
        &self,
        originator_id: Uuid,
        gt: Option<u64>,
        lte: Option<u64>,
        desc: bool,
        limit: Option<usize>,
    ) -> PersistenceResult<Vec<StoredEvent>> {
        let state = self.lock();
        let mut events: Vec<StoredEvent> = state
            .aggregates
            .get(&originator_id)
            .into_iter()
            .flatten()
            .filter(|e| gt.map(|v| e.originator_version > v).unwrap_or(true))
            .filter(|e| lte.map(|v| e.originator_version <= v).unwrap_or(true))
            .cloned()
            .collect();
        if desc {
            events.reverse();
        }
        if let Some(limit) = limit {
            events.truncate(limit);
        }
        Ok(events)
    }
}

impl ApplicationRecorder for MemoryRecorder {
    fn insert_events_for_notifications(&self, events: Vec<StoredEvent>) -> PersistenceResult<Vec<u64>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }
        self.lock().apply(events, None)
    }

    fn max_notification_id(&self) -> PersistenceResult<u64> {
        Ok(self.lock().notifications.len() as u64)
    }

    fn select_notifications(
        &self,
        start: u64,
        limit: usize,
        stop: Option<u64>,
        topics: Option<&[String]>,
    ) -> PersistenceResult<Vec<Notification>> {
        let state = self.lock();
        let stop = stop.unwrap_or(u64::MAX);
        let notifications = state
            .notifications
            .iter()
            .filter(|n| n.id >= start && n.id <= stop)
            .filter(|n| topics.map(|ts| ts.iter().any(|t| t == &n.topic)).unwrap_or(true))
            .take(limit)
            .cloned()
            .collect();
        Ok(notifications)
    }
}

impl ProcessRecorder for MemoryRecorder {
    fn insert_events_with_tracking(
        &self,
        events: Vec<StoredEvent>,
        tracking: Option<Tracking>,
    ) -> PersistenceResult<Vec<u64>> {
        if events.is_empty() && tracking.is_none() {
            return Ok(Vec::new());
        }
        self.lock().apply(events, tracking)
    }

    fn max_tracking_id(&self, application_name: &str) -> PersistenceResult<u64> {
        Ok(self.lock().tracking_max.get(application_name).copied().unwrap_or(0))
    }

    fn has_tracking_id(&self, application_name: &str, notification_id: u64) -> PersistenceResult<bool> {
        Ok(self
            .lock()
            .tracking
            .get(application_name)
            .map(|set| set.contains(&notification_id))
            .unwrap_or(false))
    }
}
