//! In-process [`EventLog`].
//!
//! Keeps encoded [`StorageRecord`]s exactly like the `SQLite` log does, so
//! consolidation and decoding behave the same, but holds them behind one
//! mutex. Nothing is cached; reads always decode.

use std::collections::HashMap;

use lodge_core::{AggregateId, IncarnationId};
use parking_lot::Mutex;
use tracing::{debug, error, info};

use super::{EventLog, EventStream, ensure_non_empty, number_events, version_count};
use crate::codec::{RecordSummary, StorageRecord, first_gap, merge_records, next_version};
use crate::consolidate::Consolidator;
use crate::errors::{EventStoreError, Result};
use crate::types::EventPayload;

#[derive(Default)]
struct MemoryState {
    index: Vec<AggregateId>,
    incarnations: HashMap<AggregateId, IncarnationId>,
    records: HashMap<AggregateId, Vec<(i64, StorageRecord)>>,
    next_seq: i64,
}

impl MemoryState {
    fn push(&mut self, id: &AggregateId, record: StorageRecord) {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.records.entry(id.clone()).or_default().push((seq, record));
    }

    fn summaries(&self, id: &AggregateId) -> Vec<RecordSummary> {
        self.records.get(id).map_or_else(Vec::new, |records| {
            records
                .iter()
                .map(|(seq, r)| RecordSummary {
                    seq: *seq,
                    first: r.first,
                    last: r.last,
                    size: r.size(),
                })
                .collect()
        })
    }
}

/// Event log held entirely in memory.
#[derive(Default)]
pub struct MemoryEventLog {
    state: Mutex<MemoryState>,
}

impl MemoryEventLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventLog for MemoryEventLog {
    fn create_aggregate(&self, id: &AggregateId, seed: &[EventPayload]) -> Result<i64> {
        ensure_non_empty(seed, "seed")?;
        let mut state = self.state.lock();
        if state.records.contains_key(id) {
            return Err(EventStoreError::AggregateExists(id.to_string()));
        }

        let events = number_events(0, seed);
        let record = StorageRecord::encode(&events, false)?;
        let incarnation = IncarnationId::generate();
        state.index.push(id.clone());
        let _ = state.incarnations.insert(id.clone(), incarnation.clone());
        state.push(id, record);
        info!(aggregate_id = %id, %incarnation, events = events.len(), "created aggregate");
        Ok(version_count(0, &events))
    }

    fn append_events(
        &self,
        id: &AggregateId,
        expected_next_version: i64,
        events: &[EventPayload],
        consolidator: &Consolidator,
    ) -> Result<i64> {
        ensure_non_empty(events, "event batch")?;
        let mut state = self.state.lock();
        let summaries = state.summaries(id);
        if summaries.is_empty() {
            return Err(EventStoreError::AggregateNotFound(id.to_string()));
        }
        let actual = next_version(&summaries);
        if actual != expected_next_version {
            return Err(EventStoreError::VersionConflict {
                aggregate_id: id.to_string(),
                expected: expected_next_version,
                actual,
            });
        }

        // Nothing is mutated until every record is built.
        let merged = match consolidator.select(&summaries) {
            Some(selected) => {
                let seqs: Vec<i64> = selected.iter().map(|r| r.seq).collect();
                let records: Vec<StorageRecord> = state
                    .records
                    .get(id)
                    .into_iter()
                    .flatten()
                    .filter(|(seq, _)| seqs.contains(seq))
                    .map(|(_, r)| r.clone())
                    .collect();
                Some((seqs, consolidator.merge(&records)?))
            }
            None => None,
        };
        let numbered = number_events(actual, events);
        let record = StorageRecord::encode(&numbered, false)?;

        if let Some((seqs, merged)) = merged {
            debug!(
                aggregate_id = %id,
                merged = seqs.len(),
                first = merged.first,
                last = merged.last,
                "consolidated records"
            );
            if let Some(records) = state.records.get_mut(id) {
                records.retain(|(seq, _)| !seqs.contains(seq));
            }
            state.push(id, merged);
        }
        state.push(id, record);
        Ok(version_count(actual, &numbered))
    }

    fn read_stream(&self, id: &AggregateId) -> Result<EventStream> {
        let (incarnation, records): (IncarnationId, Vec<StorageRecord>) = {
            let state = self.state.lock();
            let (Some(incarnation), Some(records)) =
                (state.incarnations.get(id), state.records.get(id))
            else {
                return Err(EventStoreError::AggregateNotFound(id.to_string()));
            };
            (
                incarnation.clone(),
                records.iter().map(|(_, r)| r.clone()).collect(),
            )
        };
        let events = merge_records(&records)?;
        if let Some(gap) = first_gap(&events) {
            error!(aggregate_id = %id, missing = gap, "event log is not dense");
        }
        Ok(EventStream {
            incarnation,
            events,
        })
    }

    fn current_version(&self, id: &AggregateId) -> Result<i64> {
        let state = self.state.lock();
        let summaries = state.summaries(id);
        if summaries.is_empty() {
            return Err(EventStoreError::AggregateNotFound(id.to_string()));
        }
        Ok(next_version(&summaries) - 1)
    }

    fn delete_aggregate(&self, id: &AggregateId) -> Result<()> {
        let mut state = self.state.lock();
        if state.records.remove(id).is_none() {
            return Err(EventStoreError::AggregateNotFound(id.to_string()));
        }
        let _ = state.incarnations.remove(id);
        state.index.retain(|known| known != id);
        info!(aggregate_id = %id, "deleted aggregate");
        Ok(())
    }

    fn count_storage_records(&self, id: &AggregateId) -> Result<usize> {
        Ok(self.state.lock().records.get(id).map_or(0, Vec::len))
    }

    fn list_aggregates(&self) -> Result<Vec<AggregateId>> {
        Ok(self.state.lock().index.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
