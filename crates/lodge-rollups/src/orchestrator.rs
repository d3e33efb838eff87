//! Load and commit orchestration.
//!
//! [`AggregateStore`] is handed its event log, cache and consolidation
//! policy at construction. Every commit ends in a full reload, so a
//! [`LoadedAggregate`] is never patched in place.

use std::sync::Arc;

use lodge_core::AggregateId;
use lodge_events::{Consolidator, EventLog, EventPayload, SqliteEventLog, VersionCache};
use lodge_settings::LodgeSettings;
use tracing::{debug, info, instrument, warn};

use crate::aggregate::LoadedAggregate;
use crate::duplicate::is_duplicate;
use crate::errors::Result;
use crate::rollup::RollupKind;

/// Outcome of [`AggregateStore::submit`].
#[derive(Debug)]
pub enum Submission {
    /// The request was appended; holds the reloaded aggregate.
    Committed(LoadedAggregate),
    /// The request had already been applied; holds the aggregate unchanged.
    Duplicate(LoadedAggregate),
}

impl Submission {
    /// The resulting aggregate.
    pub fn aggregate(&self) -> &LoadedAggregate {
        match self {
            Self::Committed(agg) | Self::Duplicate(agg) => agg,
        }
    }

    /// Take the resulting aggregate.
    pub fn into_aggregate(self) -> LoadedAggregate {
        match self {
            Self::Committed(agg) | Self::Duplicate(agg) => agg,
        }
    }

    /// True if nothing was appended.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

/// Entry point for reading and writing aggregates.
pub struct AggregateStore {
    log: Arc<dyn EventLog>,
    cache: Arc<VersionCache>,
    consolidator: Consolidator,
}

impl std::fmt::Debug for AggregateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateStore")
            .field("cache", &self.cache)
            .field("consolidator", &self.consolidator)
            .finish_non_exhaustive()
    }
}

impl AggregateStore {
    /// Compose a store from its parts.
    pub fn new(log: Arc<dyn EventLog>, cache: Arc<VersionCache>, consolidator: Consolidator) -> Self {
        Self {
            log,
            cache,
            consolidator,
        }
    }

    /// `SQLite`-backed store configured from `settings`.
    pub fn open(settings: &LodgeSettings) -> Result<Self> {
        let cache = Arc::new(VersionCache::from_settings(&settings.cache));
        let log = SqliteEventLog::open(settings, Arc::clone(&cache))?;
        Ok(Self::new(
            Arc::new(log),
            cache,
            Consolidator::from_settings(&settings.consolidation),
        ))
    }

    /// Store over an in-memory `SQLite` database and in-process cache.
    pub fn in_memory() -> Result<Self> {
        let cache = Arc::new(VersionCache::in_memory());
        let log = SqliteEventLog::in_memory(Arc::clone(&cache))?;
        Ok(Self::new(Arc::new(log), cache, Consolidator::default()))
    }

    /// The underlying event log.
    pub fn log(&self) -> &Arc<dyn EventLog> {
        &self.log
    }

    /// The shared cache.
    pub fn cache(&self) -> &Arc<VersionCache> {
        &self.cache
    }

    /// The consolidation policy applied on every commit.
    pub fn consolidator(&self) -> &Consolidator {
        &self.consolidator
    }

    /// Create `id` from `seed` and load it.
    #[instrument(skip_all, fields(aggregate_id = %id))]
    pub fn create_aggregate(&self, id: &AggregateId, seed: &[EventPayload]) -> Result<LoadedAggregate> {
        let _ = self.log.create_aggregate(id, seed)?;
        // A deleted aggregate of the same id may have left projections behind.
        self.drop_projections(id);
        self.load_aggregate(id)
    }

    /// Read every event of `id`. Projections stay unmaterialized unless the
    /// cache holds them at exactly the loaded version.
    #[instrument(skip_all, fields(aggregate_id = %id))]
    pub fn load_aggregate(&self, id: &AggregateId) -> Result<LoadedAggregate> {
        let stream = self.log.read_stream(id)?;
        let aggregate = LoadedAggregate::new(id.clone(), stream, Arc::clone(&self.cache))?;
        aggregate.prime_from_cache();
        debug!(aggregate_id = %id, version = aggregate.version(), "loaded aggregate");
        Ok(aggregate)
    }

    /// Append `events` after `expected_version` and reload.
    ///
    /// Fails with a version conflict, leaving the log untouched, when
    /// `expected_version` is no longer the latest.
    #[instrument(skip_all, fields(aggregate_id = %id, expected = expected_version))]
    pub fn commit(
        &self,
        id: &AggregateId,
        expected_version: i64,
        events: &[EventPayload],
    ) -> Result<LoadedAggregate> {
        let _ = self
            .log
            .append_events(id, expected_version + 1, events, &self.consolidator)?;
        self.load_aggregate(id)
    }

    /// Apply a client `request` to `aggregate` unless it is a repeat of one
    /// already applied.
    #[instrument(skip_all, fields(aggregate_id = %aggregate.id(), event_type = %request.event_type()))]
    pub fn submit(&self, aggregate: LoadedAggregate, request: EventPayload) -> Result<Submission> {
        if is_duplicate(&request, &aggregate)? {
            info!(
                aggregate_id = %aggregate.id(),
                event_type = %request.event_type(),
                for_version = request.for_version(),
                "suppressed duplicate request"
            );
            return Ok(Submission::Duplicate(aggregate));
        }
        let reloaded = self.commit(aggregate.id(), aggregate.version(), &[request])?;
        Ok(Submission::Committed(reloaded))
    }

    /// Delete `id` and its cached projections.
    #[instrument(skip_all, fields(aggregate_id = %id))]
    pub fn delete_aggregate(&self, id: &AggregateId) -> Result<()> {
        self.log.delete_aggregate(id)?;
        self.drop_projections(id);
        Ok(())
    }

    /// Every aggregate id, in creation order.
    pub fn list_aggregates(&self) -> Result<Vec<AggregateId>> {
        Ok(self.log.list_aggregates()?)
    }

    fn drop_projections(&self, id: &AggregateId) {
        if let Err(e) = self
            .cache
            .delete_many(id, &RollupKind::all_cache_keys())
        {
            warn!(aggregate_id = %id, error = %e, "failed to drop cached projections");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
