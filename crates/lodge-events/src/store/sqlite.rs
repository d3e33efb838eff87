//! `SQLite`-backed [`EventLog`].
//!
//! Writers take `BEGIN IMMEDIATE`, so the version check, consolidation and
//! insert of one append are serialized against every other writer on the
//! same database file. Readers get a consistent snapshot from a deferred
//! transaction and consult the cache against the incarnation and version
//! found in it.

use std::sync::Arc;

use lodge_core::{AggregateId, IncarnationId};
use lodge_core::time::now_rfc3339;
use lodge_settings::LodgeSettings;
use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, error, info, instrument, warn};

use super::{
    CURRENT_VERSION_KEY, EventLog, EventStream, VERSIONED_EVENTS_KEY, ensure_non_empty,
    number_events, version_count,
};
use crate::cache::VersionCache;
use crate::codec::{RecordSummary, StorageRecord, first_gap, merge_records, next_version};
use crate::consolidate::Consolidator;
use crate::errors::{EventStoreError, Result};
use crate::sqlite::connection::{self, ConnectionConfig, ConnectionPool, PooledConnection};
use crate::sqlite::migrations::run_migrations;
use crate::sqlite::repositories::{AggregateRepo, RecordRepo};
use crate::types::{Event, EventPayload};

/// Durable event log over a pooled `SQLite` database.
pub struct SqliteEventLog {
    pool: ConnectionPool,
    cache: Arc<VersionCache>,
}

impl std::fmt::Debug for SqliteEventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteEventLog")
            .field("pool_size", &self.pool.max_size())
            .field("cache", &self.cache)
            .finish()
    }
}

impl SqliteEventLog {
    /// Wrap an already-migrated pool.
    pub fn new(pool: ConnectionPool, cache: Arc<VersionCache>) -> Self {
        Self { pool, cache }
    }

    /// Open the database named by `settings`, creating and migrating it if
    /// needed.
    pub fn open(settings: &LodgeSettings, cache: Arc<VersionCache>) -> Result<Self> {
        let config = ConnectionConfig::from_settings(&settings.database);
        let pool = connection::new_file(&settings.database.resolved_path(), &config)?;
        let _ = run_migrations(&*pool.get()?)?;
        Ok(Self::new(pool, cache))
    }

    /// A migrated in-memory database.
    pub fn in_memory(cache: Arc<VersionCache>) -> Result<Self> {
        let pool = connection::new_in_memory(&ConnectionConfig::default())?;
        let _ = run_migrations(&*pool.get()?)?;
        Ok(Self::new(pool, cache))
    }

    /// The cache this log reads through.
    pub fn cache(&self) -> &Arc<VersionCache> {
        &self.cache
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Store `events` as versions `first_version..` in one record.
    ///
    /// Performs no version check and no consolidation; the caller owns the
    /// open transaction and has already established `first_version`.
    /// Returns the new version count.
    pub fn append_events_in_transaction(
        &self,
        tx: &Connection,
        id: &AggregateId,
        first_version: i64,
        events: &[EventPayload],
    ) -> Result<i64> {
        ensure_non_empty(events, "event batch")?;
        let numbered = number_events(first_version, events);
        let record = StorageRecord::encode(&numbered, false)?;
        let seq = RecordRepo::insert(tx, id.as_str(), &record, &now_rfc3339())?;
        debug!(
            aggregate_id = %id,
            seq,
            first = record.first,
            last = record.last,
            size = record.size(),
            "stored record"
        );
        Ok(version_count(first_version, &numbered))
    }

    fn consolidate(
        tx: &Connection,
        id: &AggregateId,
        selected: &[RecordSummary],
        consolidator: &Consolidator,
    ) -> Result<()> {
        let seqs: Vec<i64> = selected.iter().map(|r| r.seq).collect();
        let records = RecordRepo::load_by_seq(tx, &seqs)?;
        let merged = consolidator.merge(&records)?;
        let _ = RecordRepo::insert(tx, id.as_str(), &merged, &now_rfc3339())?;
        let _ = RecordRepo::delete_by_seq(tx, &seqs)?;
        debug!(
            aggregate_id = %id,
            merged = seqs.len(),
            first = merged.first,
            last = merged.last,
            size = merged.size(),
            compressed = merged.compressed,
            "consolidated records"
        );
        Ok(())
    }

    fn incarnation(tx: &Connection, id: &AggregateId) -> Result<IncarnationId> {
        AggregateRepo::incarnation(tx, id.as_str())?
            .map(IncarnationId::from)
            .ok_or_else(|| EventStoreError::AggregateNotFound(id.to_string()))
    }

    fn write_marker(&self, id: &AggregateId, incarnation: &IncarnationId, version: i64) {
        let text = version.to_string();
        if let Err(e) = self
            .cache
            .write(id, incarnation, version, CURRENT_VERSION_KEY, text.as_bytes())
        {
            warn!(aggregate_id = %id, version, error = %e, "failed to write version marker");
        }
    }

    fn cached_events(
        &self,
        id: &AggregateId,
        incarnation: &IncarnationId,
        current: i64,
    ) -> Option<Vec<Event>> {
        let mut snapshot = match self.cache.read(
            id,
            incarnation,
            &[VERSIONED_EVENTS_KEY, CURRENT_VERSION_KEY],
        ) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(aggregate_id = %id, error = %e, "event cache read failed");
                return None;
            }
        };
        if snapshot.version != current || !snapshot.contains(CURRENT_VERSION_KEY) {
            debug!(aggregate_id = %id, cached = snapshot.version, current, "event cache miss");
            return None;
        }
        let bytes = snapshot.take(VERSIONED_EVENTS_KEY)?;
        match serde_json::from_slice::<Vec<Event>>(&bytes) {
            Ok(events) if events.last().map(|e| e.version) == Some(current) => {
                debug!(aggregate_id = %id, current, "event cache hit");
                Some(events)
            }
            Ok(_) => {
                warn!(aggregate_id = %id, current, "cached events end at the wrong version");
                None
            }
            Err(e) => {
                warn!(aggregate_id = %id, error = %e, "cached events undecodable");
                None
            }
        }
    }

    fn populate_cache(
        &self,
        id: &AggregateId,
        incarnation: &IncarnationId,
        current: i64,
        events: &[Event],
    ) {
        if !self.cache.is_enabled() {
            return;
        }
        let bytes = match serde_json::to_vec(events) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(aggregate_id = %id, error = %e, "failed to encode events for cache");
                return;
            }
        };
        if let Err(e) = self
            .cache
            .write(id, incarnation, current, VERSIONED_EVENTS_KEY, &bytes)
        {
            warn!(aggregate_id = %id, current, error = %e, "failed to cache events");
            return;
        }
        self.write_marker(id, incarnation, current);
    }

    fn drop_cached(&self, id: &AggregateId, keys: &[&str]) {
        if let Err(e) = self.cache.delete_many(id, keys) {
            warn!(aggregate_id = %id, error = %e, "failed to drop cached events");
        }
    }
}

impl EventLog for SqliteEventLog {
    #[instrument(skip_all, fields(aggregate_id = %id))]
    fn create_aggregate(&self, id: &AggregateId, seed: &[EventPayload]) -> Result<i64> {
        ensure_non_empty(seed, "seed")?;

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if AggregateRepo::exists(&tx, id.as_str())? {
            return Err(EventStoreError::AggregateExists(id.to_string()));
        }
        let incarnation = IncarnationId::generate();
        let list_index =
            AggregateRepo::insert(&tx, id.as_str(), incarnation.as_str(), &now_rfc3339())?;
        let count = self.append_events_in_transaction(&tx, id, 0, seed)?;
        tx.commit()?;
        drop(conn);

        info!(aggregate_id = %id, %incarnation, list_index, events = count, "created aggregate");
        self.drop_cached(id, &[VERSIONED_EVENTS_KEY]);
        self.write_marker(id, &incarnation, count - 1);
        Ok(count)
    }

    #[instrument(skip_all, fields(aggregate_id = %id, expected = expected_next_version))]
    fn append_events(
        &self,
        id: &AggregateId,
        expected_next_version: i64,
        events: &[EventPayload],
        consolidator: &Consolidator,
    ) -> Result<i64> {
        ensure_non_empty(events, "event batch")?;

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let incarnation = Self::incarnation(&tx, id)?;
        let summaries = RecordRepo::summaries(&tx, id.as_str())?;
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

        if let Some(selected) = consolidator.select(&summaries) {
            Self::consolidate(&tx, id, &selected, consolidator)?;
        }
        let count = self.append_events_in_transaction(&tx, id, actual, events)?;
        tx.commit()?;
        drop(conn);

        self.write_marker(id, &incarnation, count - 1);
        Ok(count)
    }

    #[instrument(skip_all, fields(aggregate_id = %id))]
    fn read_stream(&self, id: &AggregateId) -> Result<EventStream> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        let incarnation = Self::incarnation(&tx, id)?;
        let Some(current) = RecordRepo::max_last_version(&tx, id.as_str())? else {
            return Err(EventStoreError::AggregateNotFound(id.to_string()));
        };

        if let Some(events) = self.cached_events(id, &incarnation, current) {
            return Ok(EventStream {
                incarnation,
                events,
            });
        }

        let records = RecordRepo::load(&tx, id.as_str())?;
        tx.commit()?;
        drop(conn);

        let events = merge_records(&records)?;
        if let Some(gap) = first_gap(&events) {
            error!(aggregate_id = %id, missing = gap, current, "event log is not dense");
        } else if events.last().map(|e| e.version) != Some(current) {
            error!(aggregate_id = %id, current, len = events.len(), "event count does not match last version");
        }

        self.populate_cache(id, &incarnation, current, &events);
        Ok(EventStream {
            incarnation,
            events,
        })
    }

    fn current_version(&self, id: &AggregateId) -> Result<i64> {
        RecordRepo::max_last_version(&*self.conn()?, id.as_str())?
            .ok_or_else(|| EventStoreError::AggregateNotFound(id.to_string()))
    }

    #[instrument(skip_all, fields(aggregate_id = %id))]
    fn delete_aggregate(&self, id: &AggregateId) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let records = RecordRepo::delete_all(&tx, id.as_str())?;
        let removed = AggregateRepo::delete(&tx, id.as_str())?;
        tx.commit()?;
        drop(conn);

        if !removed && records == 0 {
            return Err(EventStoreError::AggregateNotFound(id.to_string()));
        }
        info!(aggregate_id = %id, records, "deleted aggregate");
        self.drop_cached(id, &[VERSIONED_EVENTS_KEY, CURRENT_VERSION_KEY]);
        Ok(())
    }

    fn count_storage_records(&self, id: &AggregateId) -> Result<usize> {
        RecordRepo::count(&*self.conn()?, id.as_str())
    }

    fn list_aggregates(&self) -> Result<Vec<AggregateId>> {
        let ids = AggregateRepo::list(&*self.conn()?)?;
        Ok(ids.into_iter().map(AggregateId::from).collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
