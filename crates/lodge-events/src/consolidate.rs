//! Storage record consolidation.
//!
//! Every non-seed append first asks the [`Consolidator`] whether the
//! aggregate has accumulated enough small records. If it has, the oldest
//! contiguous run of them is merged into one record before the new batch is
//! stored, inside the same transaction. This bounds how many fragments a
//! read has to stitch together.

use lodge_settings::ConsolidationSettings;

use crate::codec::{RecordSummary, StorageRecord, merge_records};
use crate::errors::{EventStoreError, Result};

/// Policy for merging small storage records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Consolidator {
    num_records: usize,
    max_size: usize,
    compress: bool,
}

impl Default for Consolidator {
    fn default() -> Self {
        Self::from_settings(&ConsolidationSettings::default())
    }
}

impl Consolidator {
    /// Merge once `num_records` contiguous records each smaller than
    /// `max_size` bytes are available.
    pub fn new(num_records: usize, max_size: usize, compress: bool) -> Self {
        Self {
            num_records: num_records.max(2),
            max_size,
            compress,
        }
    }

    /// Build from loaded settings.
    pub fn from_settings(settings: &ConsolidationSettings) -> Self {
        Self::new(settings.num_records, settings.max_size, settings.compress)
    }

    /// A policy that never merges.
    pub fn disabled() -> Self {
        Self {
            num_records: usize::MAX,
            max_size: 0,
            compress: false,
        }
    }

    /// Records per merge.
    pub fn num_records(&self) -> usize {
        self.num_records
    }

    /// Size at which a record is left alone.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Whether merged records are compressed.
    pub fn compress(&self) -> bool {
        self.compress
    }

    /// Pick the records to merge, oldest first.
    ///
    /// Scans by start version, skipping records already at `max_size`, and
    /// returns the first contiguous run of `num_records` small records. A
    /// large record or a version gap restarts the run. Returns `None` when no
    /// run is long enough.
    pub fn select(&self, records: &[RecordSummary]) -> Option<Vec<RecordSummary>> {
        let mut ordered = records.to_vec();
        ordered.sort_by_key(|r| (r.first, r.seq));

        let mut run: Vec<RecordSummary> = Vec::new();
        for record in ordered {
            if record.size >= self.max_size {
                run.clear();
                continue;
            }
            if let Some(prev) = run.last() {
                if record.first != prev.last + 1 {
                    run.clear();
                }
            }
            run.push(record);
            if run.len() == self.num_records {
                return Some(run);
            }
        }
        None
    }

    /// Merge the selected records into one record spanning their range.
    pub fn merge(&self, records: &[StorageRecord]) -> Result<StorageRecord> {
        let first = records.iter().map(|r| r.first).min();
        let last = records.iter().map(|r| r.last).max();
        let (Some(first), Some(last)) = (first, last) else {
            return Err(EventStoreError::Validation("nothing to consolidate".into()));
        };

        let events = merge_records(records)?;
        let dense = events.iter().zip(first..).all(|(e, v)| e.version == v);
        if !dense || events.last().map(|e| e.version) != Some(last) {
            return Err(EventStoreError::Internal(
                "wrong version after consolidation".into(),
            ));
        }

        StorageRecord::encode(&events, self.compress)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Event, EventPayload, NewVersionPayload};
    use assert_matches::assert_matches;

    fn summary(seq: i64, first: i64, last: i64, size: usize) -> RecordSummary {
        RecordSummary {
            seq,
            first,
            last,
            size,
        }
    }

    fn record(range: std::ops::RangeInclusive<i64>) -> StorageRecord {
        let events: Vec<Event> = range
            .map(|v| Event::new(v, EventPayload::from(NewVersionPayload { version: v })))
            .collect();
        StorageRecord::encode(&events, false).unwrap()
    }

    #[test]
    fn too_few_records_selects_nothing() {
        let policy = Consolidator::new(5, 1000, false);
        let records: Vec<_> = (0..4).map(|i| summary(i, i, i, 10)).collect();
        assert!(policy.select(&records).is_none());
    }

    #[test]
    fn selects_oldest_run() {
        let policy = Consolidator::new(3, 1000, false);
        let records: Vec<_> = (0..6).rev().map(|i| summary(i, i, i, 10)).collect();
        let selected = policy.select(&records).unwrap();
        let firsts: Vec<i64> = selected.iter().map(|r| r.first).collect();
        assert_eq!(firsts, vec![0, 1, 2]);
    }

    #[test]
    fn skips_leading_large_records() {
        let policy = Consolidator::new(3, 100, false);
        let records = vec![
            summary(1, 0, 40, 500),
            summary(2, 41, 41, 10),
            summary(3, 42, 42, 10),
            summary(4, 43, 43, 10),
        ];
        let selected = policy.select(&records).unwrap();
        assert_eq!(selected[0].first, 41);
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn large_record_in_middle_restarts_run() {
        let policy = Consolidator::new(3, 100, false);
        let records = vec![
            summary(1, 0, 0, 10),
            summary(2, 1, 1, 10),
            summary(3, 2, 2, 500),
            summary(4, 3, 3, 10),
            summary(5, 4, 4, 10),
        ];
        assert!(policy.select(&records).is_none());

        let mut more = records;
        more.push(summary(6, 5, 5, 10));
        let selected = policy.select(&more).unwrap();
        let firsts: Vec<i64> = selected.iter().map(|r| r.first).collect();
        assert_eq!(firsts, vec![3, 4, 5]);
    }

    #[test]
    fn disabled_never_selects() {
        let records: Vec<_> = (0..100).map(|i| summary(i, i, i, 1)).collect();
        assert!(Consolidator::disabled().select(&records).is_none());
    }

    #[test]
    fn merge_spans_combined_range() {
        let policy = Consolidator::new(3, 1000, true);
        let merged = policy
            .merge(&[record(0..=1), record(2..=2), record(3..=5)])
            .unwrap();
        assert_eq!((merged.first, merged.last), (0, 5));
        assert!(merged.compressed);
        assert_eq!(merged.decode().unwrap().len(), 6);
    }

    #[test]
    fn merge_with_gap_fails() {
        let policy = Consolidator::new(2, 1000, false);
        assert_matches!(
            policy.merge(&[record(0..=1), record(3..=4)]),
            Err(EventStoreError::Internal(msg)) if msg.contains("wrong version")
        );
    }

    #[test]
    fn merge_nothing_fails() {
        assert_matches!(
            Consolidator::default().merge(&[]),
            Err(EventStoreError::Validation(_))
        );
    }

    #[test]
    fn defaults_follow_settings() {
        let policy = Consolidator::default();
        assert_eq!(policy.num_records(), 5);
        assert_eq!(policy.max_size(), 943_719);
        assert!(policy.compress());
    }
}
