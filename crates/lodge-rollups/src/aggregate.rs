//! A loaded aggregate and its lazily materialized projections.
//!
//! Each projection kind has one memo slot. The first reader of a kind
//! replays the full event list into a fresh [`RollupHistory`] and writes it
//! through to the cache; concurrent first readers block on the same slot
//! and all receive the one result, including a failed replay.
//!
//! Cached histories are stamped with the incarnation and version they were
//! replayed from, so a handle that outlives a delete and recreate of its id
//! cannot feed its history to loads of the new aggregate.

use std::sync::{Arc, OnceLock};

use lodge_core::{AggregateId, IncarnationId};
use lodge_events::{
    CacheSnapshot, Event, EventPayload, EventStoreError, EventStream, VersionCache,
};
use tracing::{debug, warn};

use crate::errors::{AggregateError, RollupError};
use crate::history::{RollupHistory, RollupQuery};
use crate::kinds::{
    ContentRollup, LedgerRollup, MembershipRollup, NotificationRollup, ReservationRollup,
    RestrictionRollup, SettingsRollup, UserRollup,
};
use crate::rollup::{Rollup, RollupKind};

/// Memo cell holding one kind's history, or the error its replay produced.
pub type RollupSlot<R> = OnceLock<Result<Arc<RollupHistory<R>>, RollupError>>;

/// One memo slot per projection kind.
#[derive(Default)]
pub struct RollupSlots {
    pub(crate) user: RollupSlot<UserRollup>,
    pub(crate) reservation: RollupSlot<ReservationRollup>,
    pub(crate) ledger: RollupSlot<LedgerRollup>,
    pub(crate) membership_status: RollupSlot<MembershipRollup>,
    pub(crate) settings: RollupSlot<SettingsRollup>,
    pub(crate) restriction: RollupSlot<RestrictionRollup>,
    pub(crate) notification: RollupSlot<NotificationRollup>,
    pub(crate) contents: RollupSlot<ContentRollup>,
}

/// The full event list of one aggregate at one version, plus memoized
/// projections over it.
///
/// Immutable once built: a commit produces a new `LoadedAggregate` rather
/// than changing this one. Safe to share between threads.
pub struct LoadedAggregate {
    id: AggregateId,
    incarnation: IncarnationId,
    events: Vec<Event>,
    version: i64,
    created_at: Option<String>,
    cache: Arc<VersionCache>,
    slots: RollupSlots,
}

impl std::fmt::Debug for LoadedAggregate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedAggregate")
            .field("id", &self.id)
            .field("incarnation", &self.incarnation)
            .field("version", &self.version)
            .field("events", &self.events.len())
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl LoadedAggregate {
    /// Wrap `stream`, whose events must be the aggregate's dense history
    /// from version 0.
    pub fn new(
        id: AggregateId,
        stream: EventStream,
        cache: Arc<VersionCache>,
    ) -> Result<Self, AggregateError> {
        let EventStream {
            incarnation,
            events,
        } = stream;
        let Some(last) = events.last() else {
            return Err(EventStoreError::AggregateNotFound(id.to_string()).into());
        };
        let version = last.version;
        let created_at = events.iter().rev().find_map(|e| match &e.payload {
            EventPayload::NewProperty(p) => Some(p.create_date_time.clone()),
            _ => None,
        });
        Ok(Self {
            id,
            incarnation,
            events,
            version,
            created_at,
            cache,
            slots: RollupSlots::default(),
        })
    }

    /// Aggregate id.
    pub fn id(&self) -> &AggregateId {
        &self.id
    }

    /// Incarnation the events were read from.
    pub fn incarnation(&self) -> &IncarnationId {
        &self.incarnation
    }

    /// Every event, in version order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Version of the newest event.
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Creation time recorded by the property's `NewProperty` event.
    pub fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    /// Full history of kind `R`, replaying on first use.
    pub fn projection_history<R: Rollup>(&self) -> Result<Arc<RollupHistory<R>>, RollupError> {
        R::slot(&self.slots)
            .get_or_init(|| self.replay::<R>().map(Arc::new))
            .clone()
    }

    /// Snapshots of kind `R` selected by `query`.
    pub fn projections<R: Rollup>(&self, query: &RollupQuery) -> Result<Vec<R>, RollupError> {
        Ok(self.projection_history::<R>()?.query(query))
    }

    /// The snapshot of entity `id` visible at `max_version`.
    pub fn projection<R: Rollup>(
        &self,
        id: &str,
        max_version: Option<i64>,
    ) -> Result<Option<R>, RollupError> {
        Ok(self
            .projection_history::<R>()?
            .visible(id, max_version)
            .cloned())
    }

    /// Whether kind `R` has been replayed or primed on this load.
    pub fn is_materialized<R: Rollup>(&self) -> bool {
        R::slot(&self.slots).get().is_some()
    }

    fn replay<R: Rollup>(&self) -> Result<RollupHistory<R>, RollupError> {
        let mut history = RollupHistory::new();
        for event in &self.events {
            if let Some((entity, snapshot)) = R::apply(&history, event, self)? {
                history.push(entity, snapshot)?;
            }
        }
        debug!(
            aggregate_id = %self.id,
            kind = %R::KIND,
            version = self.version,
            entities = history.len(),
            "replayed projection"
        );
        self.store(&history);
        Ok(history)
    }

    fn store<R: Rollup>(&self, history: &RollupHistory<R>) {
        let bytes = match history.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(aggregate_id = %self.id, kind = %R::KIND, error = %e, "failed to encode projection");
                return;
            }
        };
        if let Err(e) = self.cache.write(
            &self.id,
            &self.incarnation,
            self.version,
            R::KIND.cache_key(),
            &bytes,
        ) {
            warn!(aggregate_id = %self.id, kind = %R::KIND, error = %e, "failed to cache projection");
        }
    }

    /// Fill slots from cached histories stamped with exactly this
    /// incarnation and version.
    pub(crate) fn prime_from_cache(&self) {
        let keys = RollupKind::all_cache_keys();
        let mut snapshot = match self.cache.read(&self.id, &self.incarnation, &keys) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(aggregate_id = %self.id, error = %e, "projection cache read failed");
                return;
            }
        };
        if snapshot.is_empty() || snapshot.version != self.version {
            debug!(
                aggregate_id = %self.id,
                cached = snapshot.version,
                version = self.version,
                "no current projections cached"
            );
            return;
        }

        self.prime::<UserRollup>(&mut snapshot);
        self.prime::<ReservationRollup>(&mut snapshot);
        self.prime::<LedgerRollup>(&mut snapshot);
        self.prime::<MembershipRollup>(&mut snapshot);
        self.prime::<SettingsRollup>(&mut snapshot);
        self.prime::<RestrictionRollup>(&mut snapshot);
        self.prime::<NotificationRollup>(&mut snapshot);
        self.prime::<ContentRollup>(&mut snapshot);
    }

    fn prime<R: Rollup>(&self, snapshot: &mut CacheSnapshot) {
        let Some(bytes) = snapshot.take(R::KIND.cache_key()) else {
            return;
        };
        match RollupHistory::<R>::from_slice(&bytes) {
            Ok(history) => {
                let _ = R::slot(&self.slots).set(Ok(Arc::new(history)));
            }
            Err(e) => {
                warn!(aggregate_id = %self.id, kind = %R::KIND, error = %e, "discarding cached projection");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use assert_matches::assert_matches;
    use lodge_core::UserId;
    use lodge_core::logging::capture_logs;
    use lodge_events::types::{
        NewPropertyPayload, NewUserPayload, NewVersionPayload, UpdateUserPayload,
    };
    use lodge_events::{CacheBackend, CacheError};
    use lodge_settings::CacheSettings;
    use tracing::Level;

    mockall::mock! {
        Backend {}
        impl CacheBackend for Backend {
            fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>, CacheError>;
            fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;
            fn delete(&self, key: &str) -> Result<(), CacheError>;
        }
    }

    fn events() -> Vec<Event> {
        let payloads: Vec<EventPayload> = vec![
            NewVersionPayload { version: 2 }.into(),
            NewPropertyPayload {
                property_name: "Ridge Lodge".into(),
                create_date_time: "2026-01-02T03:04:05Z".into(),
                ..Default::default()
            }
            .into(),
            NewUserPayload {
                for_version: 1,
                user_id: UserId::from("u1"),
                nickname: "Ann".into(),
                ..Default::default()
            }
            .into(),
            UpdateUserPayload {
                for_version: 2,
                user_id: UserId::from("u1"),
                nickname: "Annie".into(),
                ..Default::default()
            }
            .into(),
        ];
        payloads
            .into_iter()
            .enumerate()
            .map(|(v, p)| Event::new(i64::try_from(v).unwrap(), p))
            .collect()
    }

    fn incarnation() -> IncarnationId {
        IncarnationId::from("inc-1")
    }

    fn stream(events: Vec<Event>) -> EventStream {
        EventStream {
            incarnation: incarnation(),
            events,
        }
    }

    fn loaded(cache: Arc<VersionCache>) -> LoadedAggregate {
        LoadedAggregate::new(AggregateId::from("p1"), stream(events()), cache).unwrap()
    }

    #[test]
    fn empty_event_list_is_not_found() {
        let err = LoadedAggregate::new(
            AggregateId::from("p1"),
            stream(Vec::new()),
            Arc::new(VersionCache::in_memory()),
        )
        .unwrap_err();
        assert_matches!(
            err,
            AggregateError::Store(EventStoreError::AggregateNotFound(_))
        );
    }

    #[test]
    fn metadata_from_events() {
        let agg = loaded(Arc::new(VersionCache::in_memory()));
        assert_eq!(agg.version(), 3);
        assert_eq!(agg.events().len(), 4);
        assert_eq!(agg.created_at(), Some("2026-01-02T03:04:05Z"));
    }

    #[test]
    fn replay_is_lazy_and_memoized() {
        let agg = loaded(Arc::new(VersionCache::in_memory()));
        assert!(!agg.is_materialized::<UserRollup>());

        let first = agg.projection_history::<UserRollup>().unwrap();
        assert!(agg.is_materialized::<UserRollup>());
        assert!(!agg.is_materialized::<LedgerRollup>());
        let second = agg.projection_history::<UserRollup>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let user = agg.projection::<UserRollup>("u1", None).unwrap().unwrap();
        assert_eq!(user.nickname, "Annie");
        let before = agg.projection::<UserRollup>("u1", Some(2)).unwrap().unwrap();
        assert_eq!(before.nickname, "Ann");
    }

    #[test]
    fn concurrent_readers_share_one_replay() {
        let agg = loaded(Arc::new(VersionCache::in_memory()));
        let histories: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| agg.projection_history::<UserRollup>().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(histories.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn replay_writes_through_and_primes_next_load() {
        let cache = Arc::new(VersionCache::in_memory());
        let agg = loaded(cache.clone());
        let _ = agg.projection_history::<UserRollup>().unwrap();

        let snapshot = cache
            .read(agg.id(), agg.incarnation(), &[RollupKind::User.cache_key()])
            .unwrap();
        assert_eq!(snapshot.version, 3);

        let next = loaded(cache);
        next.prime_from_cache();
        assert!(next.is_materialized::<UserRollup>());
        assert!(!next.is_materialized::<SettingsRollup>());
    }

    #[test]
    fn stale_cached_projection_is_ignored() {
        let cache = Arc::new(VersionCache::in_memory());
        let id = AggregateId::from("p1");
        let bytes = RollupHistory::<UserRollup>::new().to_bytes().unwrap();
        cache
            .write(&id, &incarnation(), 2, RollupKind::User.cache_key(), &bytes)
            .unwrap();

        let agg = loaded(cache);
        agg.prime_from_cache();
        assert!(!agg.is_materialized::<UserRollup>());
        assert_eq!(agg.projections::<UserRollup>(&RollupQuery::latest()).unwrap().len(), 1);
    }

    #[test]
    fn projection_from_another_incarnation_is_ignored() {
        let cache = Arc::new(VersionCache::in_memory());
        let other = LoadedAggregate::new(
            AggregateId::from("p1"),
            EventStream {
                incarnation: IncarnationId::from("inc-0"),
                events: events(),
            },
            cache.clone(),
        )
        .unwrap();
        let _ = other.projection_history::<UserRollup>().unwrap();

        let agg = loaded(cache);
        agg.prime_from_cache();
        assert!(!agg.is_materialized::<UserRollup>());
    }

    #[test]
    fn undecodable_cached_projection_is_replayed() {
        let cache = Arc::new(VersionCache::in_memory());
        let id = AggregateId::from("p1");
        cache
            .write(&id, &incarnation(), 3, RollupKind::User.cache_key(), b"{not json")
            .unwrap();

        let (logs, _guard) = capture_logs();
        let agg = loaded(cache);
        agg.prime_from_cache();
        assert!(!agg.is_materialized::<UserRollup>());
        assert!(logs.has_event(Level::WARN, "discarding cached projection"));
        assert!(agg.projection::<UserRollup>("u1", None).unwrap().is_some());
    }

    #[test]
    fn failing_cache_still_serves_projections() {
        let mut backend = MockBackend::new();
        backend
            .expect_get_multi()
            .returning(|_| Err(CacheError::Backend("down".into())));
        backend
            .expect_set()
            .returning(|_, _, _| Err(CacheError::Backend("down".into())));
        backend
            .expect_delete()
            .returning(|_| Err(CacheError::Backend("down".into())));
        let cache = Arc::new(VersionCache::new(Arc::new(backend), &CacheSettings::default()));

        let (logs, _guard) = capture_logs();
        let agg = loaded(cache);
        agg.prime_from_cache();
        let users = agg.projections::<UserRollup>(&RollupQuery::latest()).unwrap();
        assert_eq!(users.len(), 1);
        assert!(logs.has_event(Level::WARN, "projection cache read failed"));
        assert!(logs.has_event(Level::WARN, "failed to cache projection"));
    }

    #[test]
    fn failed_replay_is_memoized() {
        let mut events = events();
        events.push(Event::new(
            4,
            UpdateUserPayload {
                for_version: 3,
                user_id: UserId::from("ghost"),
                ..Default::default()
            }
            .into(),
        ));
        let agg = LoadedAggregate::new(
            AggregateId::from("p1"),
            stream(events),
            Arc::new(VersionCache::in_memory()),
        )
        .unwrap();

        let first = agg.projection_history::<UserRollup>().unwrap_err();
        assert_matches!(first, RollupError::MissingEntity { ref id, version: 4, .. } if id == "ghost");
        assert!(agg.is_materialized::<UserRollup>());
        assert_eq!(agg.projection_history::<UserRollup>().unwrap_err(), first);
    }
}
