//! The three recorder contracts: [`AggregateRecorder`], layered into
//! [`ApplicationRecorder`], layered into [`ProcessRecorder`].
//!
//! Each contract is additive; a back-end implementing `ProcessRecorder`
//! necessarily implements the other two. Because the layered contracts
//! each add an `insert_events`-shaped operation with a different return
//! type, the methods are given distinct names here rather than
//! overloading one name across three traits — the same name on three
//! supertraits is legal Rust but forces callers into fully-qualified
//! disambiguation on every call, which is a footgun, not a feature.

use std::fmt;

use ledgerstream_types::{Notification, PersistenceResult, StoredEvent, Tracking};
use uuid::Uuid;

impl fmt::Debug for dyn AggregateRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn AggregateRecorder")
    }
}

/// Per-aggregate append-only log with optimistic concurrency.
pub trait AggregateRecorder: Send + Sync {
    /// Atomically persists `events`: either all are persisted or none.
    /// An empty batch is a no-op that succeeds.
    fn insert_events(&self, events: Vec<StoredEvent>) -> PersistenceResult<()>;

    /// Returns events for `originator_id`, filtered by `gt` (exclusive
    /// lower bound) / `lte` (inclusive upper bound), ordered by
    /// `originator_version` ascending unless `desc`, truncated to
    /// `limit`.
    fn select_events(
        &self,
        originator_id: Uuid,
        gt: Option<u64>,
        lte: Option<u64>,
        desc: bool,
        limit: Option<usize>,
    ) -> PersistenceResult<Vec<StoredEvent>>;
}

/// [`AggregateRecorder`] plus a global notification log with monotonic,
/// gap-free IDs.
pub trait ApplicationRecorder: AggregateRecorder {
    /// Same atomicity contract as [`AggregateRecorder::insert_events`],
    /// additionally assigning and returning one notification id per
    /// event, in input order.
    fn insert_events_for_notifications(&self, events: Vec<StoredEvent>) -> PersistenceResult<Vec<u64>>;

    /// The largest assigned notification id, or 0 if none have been
    /// assigned.
    fn max_notification_id(&self) -> PersistenceResult<u64>;

    /// Notifications with `start <= id <= stop` (default stop =
    /// unbounded), at most `limit` entries, ascending by id, optionally
    /// filtered to `topics`.
    fn select_notifications(
        &self,
        start: u64,
        limit: usize,
        stop: Option<u64>,
        topics: Option<&[String]>,
    ) -> PersistenceResult<Vec<Notification>>;
}

/// [`ApplicationRecorder`] plus durable tracking of upstream positions,
/// for idempotent cross-application processing.
pub trait ProcessRecorder: ApplicationRecorder {
    /// Same atomic insert as [`ApplicationRecorder::insert_events_for_notifications`].
    /// When `tracking` is `Some`, its `(application_name,
    /// notification_id)` is persisted in the same atomic operation; a
    /// duplicate tracking pair fails with `IntegrityError` and the
    /// events are not persisted. An empty event list with a tracking
    /// token is legal.
    fn insert_events_with_tracking(
        &self,
        events: Vec<StoredEvent>,
        tracking: Option<Tracking>,
    ) -> PersistenceResult<Vec<u64>>;

    /// The largest notification id `application_name` has recorded
    /// consuming, or 0 if none.
    fn max_tracking_id(&self, application_name: &str) -> PersistenceResult<u64>;

    /// Whether `application_name` has already recorded consuming
    /// `notification_id`.
    fn has_tracking_id(&self, application_name: &str, notification_id: u64) -> PersistenceResult<bool>;
}
