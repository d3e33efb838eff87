//! Storage records: the physical fragments of each aggregate's log.

use rusqlite::{Connection, Row, params};

use crate::codec::{RecordKind, RecordSummary, StorageRecord};
use crate::errors::{EventStoreError, Result};

/// Storage record repository.
pub struct RecordRepo;

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<RecordSummary> {
    let size: i64 = row.get(3)?;
    Ok(RecordSummary {
        seq: row.get(0)?,
        first: row.get(1)?,
        last: row.get(2)?,
        size: usize::try_from(size).unwrap_or(0),
    })
}

type RawRecord = (i64, i64, i64, bool, i64, Vec<u8>);

fn raw_from_row(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn into_record(raw: RawRecord) -> Result<(i64, StorageRecord)> {
    let (seq, first, last, compressed, kind, events) = raw;
    Ok((
        seq,
        StorageRecord {
            first,
            last,
            compressed,
            kind: RecordKind::from_code(kind)?,
            events,
        },
    ))
}

impl RecordRepo {
    /// Store `record` for `aggregate_id`; returns its sequence number.
    pub fn insert(
        conn: &Connection,
        aggregate_id: &str,
        record: &StorageRecord,
        written_at: &str,
    ) -> Result<i64> {
        let size = i64::try_from(record.size())
            .map_err(|_| EventStoreError::Validation("record too large".into()))?;
        let _ = conn.execute(
            "INSERT INTO event_records
               (aggregate_id, first_version, last_version, size, compressed, kind, events, written_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                aggregate_id,
                record.first,
                record.last,
                size,
                record.compressed,
                record.kind.code(),
                record.events,
                written_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Position and size of every record, ordered by start version then
    /// write order.
    pub fn summaries(conn: &Connection, aggregate_id: &str) -> Result<Vec<RecordSummary>> {
        let mut stmt = conn.prepare(
            "SELECT seq, first_version, last_version, size FROM event_records
             WHERE aggregate_id = ?1
             ORDER BY first_version ASC, seq ASC",
        )?;
        let rows = stmt.query_map(params![aggregate_id], summary_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Every record in write order.
    pub fn load(conn: &Connection, aggregate_id: &str) -> Result<Vec<StorageRecord>> {
        let mut stmt = conn.prepare(
            "SELECT seq, first_version, last_version, compressed, kind, events
             FROM event_records WHERE aggregate_id = ?1 ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map(params![aggregate_id], raw_from_row)?;
        let mut records = Vec::new();
        for raw in rows {
            let (_, record) = into_record(raw?)?;
            records.push(record);
        }
        Ok(records)
    }

    /// The records with the given sequence numbers, in write order.
    pub fn load_by_seq(conn: &Connection, seqs: &[i64]) -> Result<Vec<StorageRecord>> {
        let mut stmt = conn.prepare(
            "SELECT seq, first_version, last_version, compressed, kind, events
             FROM event_records WHERE seq = ?1",
        )?;
        let mut ordered = seqs.to_vec();
        ordered.sort_unstable();

        let mut records = Vec::with_capacity(ordered.len());
        for seq in ordered {
            let raw = stmt
                .query_row(params![seq], raw_from_row)
                .map_err(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => {
                        EventStoreError::Internal(format!("storage record {seq} vanished"))
                    }
                    other => other.into(),
                })?;
            let (_, record) = into_record(raw)?;
            records.push(record);
        }
        Ok(records)
    }

    /// Delete the records with the given sequence numbers.
    pub fn delete_by_seq(conn: &Connection, seqs: &[i64]) -> Result<usize> {
        let mut stmt = conn.prepare("DELETE FROM event_records WHERE seq = ?1")?;
        let mut deleted = 0;
        for seq in seqs {
            deleted += stmt.execute(params![seq])?;
        }
        Ok(deleted)
    }

    /// Delete every record of `aggregate_id`.
    pub fn delete_all(conn: &Connection, aggregate_id: &str) -> Result<usize> {
        Ok(conn.execute(
            "DELETE FROM event_records WHERE aggregate_id = ?1",
            params![aggregate_id],
        )?)
    }

    /// Number of stored records for `aggregate_id`.
    pub fn count(conn: &Connection, aggregate_id: &str) -> Result<usize> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM event_records WHERE aggregate_id = ?1",
            params![aggregate_id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Highest stored version, or `None` when the aggregate has no records.
    pub fn max_last_version(conn: &Connection, aggregate_id: &str) -> Result<Option<i64>> {
        Ok(conn.query_row(
            "SELECT MAX(last_version) FROM event_records WHERE aggregate_id = ?1",
            params![aggregate_id],
            |row| row.get(0),
        )?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::sqlite::migrations::run_migrations;
    use crate::sqlite::repositories::AggregateRepo;
    use crate::types::{Event, EventPayload, NewVersionPayload};
    use assert_matches::assert_matches;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        AggregateRepo::insert(&conn, "p1", "i1", "t").unwrap();
        conn
    }

    fn record(range: std::ops::Range<i64>, compress: bool) -> StorageRecord {
        let events: Vec<Event> = range
            .map(|v| Event::new(v, EventPayload::from(NewVersionPayload { version: v })))
            .collect();
        StorageRecord::encode(&events, compress).unwrap()
    }

    #[test]
    fn insert_and_load_round_trip() {
        let conn = setup();
        let original = record(0..3, true);
        let seq = RecordRepo::insert(&conn, "p1", &original, "t").unwrap();
        assert!(seq > 0);

        let loaded = RecordRepo::load(&conn, "p1").unwrap();
        assert_eq!(loaded, vec![original]);
        assert_eq!(RecordRepo::count(&conn, "p1").unwrap(), 1);
        assert_eq!(RecordRepo::max_last_version(&conn, "p1").unwrap(), Some(2));
    }

    #[test]
    fn summaries_order_by_first_version() {
        let conn = setup();
        RecordRepo::insert(&conn, "p1", &record(3..5, false), "t").unwrap();
        RecordRepo::insert(&conn, "p1", &record(0..3, false), "t").unwrap();

        let summaries = RecordRepo::summaries(&conn, "p1").unwrap();
        let ranges: Vec<(i64, i64)> = summaries.iter().map(|s| (s.first, s.last)).collect();
        assert_eq!(ranges, vec![(0, 2), (3, 4)]);
        assert!(summaries.iter().all(|s| s.size > 0));
    }

    #[test]
    fn load_by_seq_and_delete() {
        let conn = setup();
        let a = RecordRepo::insert(&conn, "p1", &record(0..1, false), "t").unwrap();
        let b = RecordRepo::insert(&conn, "p1", &record(1..2, false), "t").unwrap();
        RecordRepo::insert(&conn, "p1", &record(2..3, false), "t").unwrap();

        let loaded = RecordRepo::load_by_seq(&conn, &[b, a]).unwrap();
        assert_eq!(loaded[0].first, 0);
        assert_eq!(loaded[1].first, 1);

        assert_eq!(RecordRepo::delete_by_seq(&conn, &[a, b]).unwrap(), 2);
        assert_eq!(RecordRepo::count(&conn, "p1").unwrap(), 1);
        assert_matches!(
            RecordRepo::load_by_seq(&conn, &[a]),
            Err(EventStoreError::Internal(_))
        );
    }

    #[test]
    fn empty_aggregate_has_no_version() {
        let conn = setup();
        assert_eq!(RecordRepo::max_last_version(&conn, "p1").unwrap(), None);
        assert!(RecordRepo::summaries(&conn, "p1").unwrap().is_empty());
    }

    #[test]
    fn deleting_aggregate_cascades() {
        let conn = setup();
        RecordRepo::insert(&conn, "p1", &record(0..2, false), "t").unwrap();
        AggregateRepo::delete(&conn, "p1").unwrap();
        assert_eq!(RecordRepo::count(&conn, "p1").unwrap(), 0);
    }

    #[test]
    fn unknown_aggregate_rejected() {
        let conn = setup();
        assert!(RecordRepo::insert(&conn, "ghost", &record(0..1, false), "t").is_err());
    }
}
