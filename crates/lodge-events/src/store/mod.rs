//! The append-only event log.
//!
//! [`EventLog`] is the seam the orchestrator depends on. [`SqliteEventLog`]
//! is the durable implementation; [`MemoryEventLog`] keeps the same record
//! layout and consolidation behaviour in process and is what tests inject.
//!
//! Version counts are returned everywhere a write finishes: after creating
//! an aggregate with `n` seed events the count is `n`, and the next append
//! must pass `n` as its expected next version.
//!
//! Every create mints a fresh [`IncarnationId`]. Reads return it with the
//! events so cached values computed for a deleted aggregate of the same id
//! are never mistaken for current ones.

mod memory;
mod sqlite;

pub use memory::MemoryEventLog;
pub use sqlite::SqliteEventLog;

use lodge_core::{AggregateId, IncarnationId};

use crate::consolidate::Consolidator;
use crate::errors::{EventStoreError, Result};
use crate::types::{Event, EventPayload};

/// Cache resource holding the full decoded event list.
pub const VERSIONED_EVENTS_KEY: &str = "VERSIONED_EVENTS";

/// Cache resource written after every append, stamped with the new last
/// version. Its value is that version as decimal text.
pub const CURRENT_VERSION_KEY: &str = "CURRENT_VERSION";

/// The events of one incarnation of an aggregate, read from one snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct EventStream {
    /// Incarnation the events belong to.
    pub incarnation: IncarnationId,
    /// Every event, ordered by version.
    pub events: Vec<Event>,
}

/// Per-aggregate append-only event log.
pub trait EventLog: Send + Sync {
    /// Register `id` and store `seed` as versions `0..n`. Returns `n`.
    fn create_aggregate(&self, id: &AggregateId, seed: &[EventPayload]) -> Result<i64>;

    /// Append `events` starting at `expected_next_version`, after letting
    /// `consolidator` merge older records in the same transaction. Returns
    /// the new version count.
    fn append_events(
        &self,
        id: &AggregateId,
        expected_next_version: i64,
        events: &[EventPayload],
        consolidator: &Consolidator,
    ) -> Result<i64>;

    /// Every event of `id` with the incarnation they belong to.
    fn read_stream(&self, id: &AggregateId) -> Result<EventStream>;

    /// Every event of `id`, ordered by version.
    fn get_events(&self, id: &AggregateId) -> Result<Vec<Event>> {
        Ok(self.read_stream(id)?.events)
    }

    /// Version of the last stored event.
    fn current_version(&self, id: &AggregateId) -> Result<i64>;

    /// Remove every record of `id` and its index entry.
    fn delete_aggregate(&self, id: &AggregateId) -> Result<()>;

    /// Number of physical records backing `id`.
    fn count_storage_records(&self, id: &AggregateId) -> Result<usize>;

    /// Every registered aggregate, in creation order.
    fn list_aggregates(&self) -> Result<Vec<AggregateId>>;
}

/// Attach versions `first..` to `payloads`.
pub(crate) fn number_events(first: i64, payloads: &[EventPayload]) -> Vec<Event> {
    payloads
        .iter()
        .cloned()
        .zip(first..)
        .map(|(payload, version)| Event::new(version, payload))
        .collect()
}

pub(crate) fn ensure_non_empty(payloads: &[EventPayload], what: &str) -> Result<()> {
    if payloads.is_empty() {
        return Err(EventStoreError::Validation(format!("{what} must not be empty")));
    }
    Ok(())
}

/// Count after the last event of `events`.
pub(crate) fn version_count(first: i64, events: &[Event]) -> i64 {
    events.last().map_or(first, |e| e.version + 1)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewVersionPayload;

    #[test]
    fn numbering_is_dense_from_first() {
        let payloads: Vec<EventPayload> = (0..3)
            .map(|v| NewVersionPayload { version: v }.into())
            .collect();
        let events = number_events(7, &payloads);
        let versions: Vec<i64> = events.iter().map(|e| e.version).collect();
        assert_eq!(versions, vec![7, 8, 9]);
        assert_eq!(version_count(7, &events), 10);
        assert_eq!(version_count(7, &[]), 7);
    }

    #[test]
    fn empty_batches_rejected() {
        assert!(ensure_non_empty(&[], "seed").is_err());
    }
}
