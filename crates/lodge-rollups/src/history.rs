//! Per-kind projection history: entity id → snapshots in version order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::RollupError;
use crate::rollup::Rollup;

/// Read arguments for [`RollupHistory::query`].
///
/// The default selects the latest snapshot of every entity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RollupQuery {
    /// Restrict to one entity.
    pub id: Option<String>,
    /// Ignore snapshots taken after this version.
    pub max_version: Option<i64>,
    /// Return every qualifying snapshot instead of only the visible one.
    pub all_versions: bool,
}

impl RollupQuery {
    /// Latest snapshot of every entity.
    pub fn latest() -> Self {
        Self::default()
    }

    /// Scope to the entity `id`.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// As of `version`.
    #[must_use]
    pub fn max_version(mut self, version: i64) -> Self {
        self.max_version = Some(version);
        self
    }

    /// Every snapshot rather than the visible one.
    #[must_use]
    pub fn all_versions(mut self) -> Self {
        self.all_versions = true;
        self
    }
}

/// Append-only snapshots of every entity of one kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RollupHistory<R> {
    entities: BTreeMap<String, Vec<R>>,
}

impl<R> Default for RollupHistory<R> {
    fn default() -> Self {
        Self {
            entities: BTreeMap::new(),
        }
    }
}

impl<R: Rollup> RollupHistory<R> {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a history serialized with [`RollupHistory::to_bytes`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self, RollupError> {
        serde_json::from_slice(bytes).map_err(|e| RollupError::Decode(format!("{}: {e}", R::KIND)))
    }

    /// Serialize for the cache.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RollupError> {
        serde_json::to_vec(self).map_err(|e| RollupError::Decode(format!("{}: {e}", R::KIND)))
    }

    /// Append `snapshot` as the newest version of `id`.
    ///
    /// Rejects a snapshot whose version does not exceed the entity's latest.
    pub fn push(&mut self, id: impl Into<String>, snapshot: R) -> Result<(), RollupError> {
        let id = id.into();
        let attempted = snapshot.version();
        if let Some(last) = self.latest(&id).map(Rollup::version) {
            if last >= attempted {
                return Err(RollupError::NonIncreasingVersion {
                    kind: R::KIND,
                    id,
                    last,
                    attempted,
                });
            }
        }
        self.entities.entry(id).or_default().push(snapshot);
        Ok(())
    }

    /// Newest snapshot of `id`.
    pub fn latest(&self, id: &str) -> Option<&R> {
        self.entities.get(id).and_then(|v| v.last())
    }

    /// Snapshot of `id` visible at `max_version`: the newest one at or below
    /// it, or the newest overall when `max_version` is `None`.
    pub fn visible(&self, id: &str, max_version: Option<i64>) -> Option<&R> {
        self.entities
            .get(id)
            .and_then(|versions| visible_in(versions, max_version))
    }

    /// Every snapshot of `id`, oldest first.
    pub fn versions(&self, id: &str) -> &[R] {
        self.entities.get(id).map_or(&[], Vec::as_slice)
    }

    /// Entity ids with at least one snapshot.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True if no entity has a snapshot.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Apply `query`. Unknown ids and empty windows give an empty result.
    ///
    /// With `all_versions`, every snapshot at or below `max_version` (all of
    /// them when it is `None`) is returned; otherwise the one visible
    /// snapshot per entity. Entities are visited in id order.
    pub fn query(&self, query: &RollupQuery) -> Vec<R> {
        let selected: Box<dyn Iterator<Item = &Vec<R>> + '_> = match &query.id {
            Some(id) => Box::new(self.entities.get(id).into_iter()),
            None => Box::new(self.entities.values()),
        };

        let mut out = Vec::new();
        for versions in selected {
            if query.all_versions {
                out.extend(
                    versions
                        .iter()
                        .filter(|r| query.max_version.is_none_or(|max| r.version() <= max))
                        .cloned(),
                );
            } else if let Some(r) = visible_in(versions, query.max_version) {
                out.push(r.clone());
            }
        }
        out
    }
}

fn visible_in<R: Rollup>(versions: &[R], max_version: Option<i64>) -> Option<&R> {
    match max_version {
        None => versions.last(),
        Some(max) => versions.iter().rev().find(|r| r.version() <= max),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::kinds::ContentRollup;
    use assert_matches::assert_matches;
    use lodge_events::types::{ContentName, NewContentPayload};
    use proptest::prelude::*;

    fn snapshot(version: i64) -> ContentRollup {
        ContentRollup {
            input: NewContentPayload {
                for_version: version - 1,
                name: ContentName::MemberHome,
                template: format!("v{version}"),
                ..Default::default()
            },
            version,
        }
    }

    fn history(ids: &[(&str, &[i64])]) -> RollupHistory<ContentRollup> {
        let mut history = RollupHistory::new();
        for (id, versions) in ids {
            for v in *versions {
                history.push(*id, snapshot(*v)).unwrap();
            }
        }
        history
    }

    fn versions(rollups: &[ContentRollup]) -> Vec<i64> {
        rollups.iter().map(|r| r.version).collect()
    }

    #[test]
    fn push_rejects_non_increasing() {
        let mut h = history(&[("a", &[3, 5])]);
        assert_matches!(
            h.push("a", snapshot(5)),
            Err(RollupError::NonIncreasingVersion { last: 5, attempted: 5, .. })
        );
        assert_matches!(h.push("a", snapshot(4)), Err(_));
        h.push("b", snapshot(1)).unwrap();
        assert_eq!(h.versions("a").len(), 2);
    }

    #[test]
    fn latest_of_every_entity() {
        let h = history(&[("a", &[1, 4]), ("b", &[2])]);
        assert_eq!(versions(&h.query(&RollupQuery::latest())), vec![4, 2]);
    }

    #[test]
    fn visible_at_max_version() {
        let h = history(&[("a", &[1, 4, 9])]);
        let at = |v| versions(&h.query(&RollupQuery::latest().id("a").max_version(v)));
        assert_eq!(at(0), Vec::<i64>::new());
        assert_eq!(at(1), vec![1]);
        assert_eq!(at(8), vec![4]);
        assert_eq!(at(100), vec![9]);
    }

    #[test]
    fn all_versions_truncated_at_max() {
        let h = history(&[("a", &[1, 4, 9]), ("b", &[2, 12])]);
        let all = h.query(&RollupQuery::latest().all_versions());
        assert_eq!(versions(&all), vec![1, 4, 9, 2, 12]);
        let upto = h.query(&RollupQuery::latest().all_versions().max_version(4));
        assert_eq!(versions(&upto), vec![1, 4, 2]);
        let one = h.query(&RollupQuery::latest().id("b").all_versions());
        assert_eq!(versions(&one), vec![2, 12]);
    }

    #[test]
    fn unknown_id_is_empty() {
        let h = history(&[("a", &[1])]);
        assert!(h.query(&RollupQuery::latest().id("zzz")).is_empty());
        assert!(h.visible("zzz", None).is_none());
        assert!(h.versions("zzz").is_empty());
    }

    #[test]
    fn bytes_round_trip() {
        let h = history(&[("a", &[1, 2]), ("b", &[3])]);
        let decoded = RollupHistory::<ContentRollup>::from_slice(&h.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, h);
        assert_matches!(
            RollupHistory::<ContentRollup>::from_slice(b"[1,2"),
            Err(RollupError::Decode(_))
        );
    }

    proptest! {
        #[test]
        fn visible_is_greatest_at_or_below(
            raw in prop::collection::btree_set(0_i64..200, 1..30),
            max in -5_i64..210,
        ) {
            let mut h = RollupHistory::new();
            for v in &raw {
                h.push("e", snapshot(*v)).unwrap();
            }
            let expected = raw.iter().copied().filter(|v| *v <= max).max();
            let got = h.visible("e", Some(max)).map(|r| r.version);
            prop_assert_eq!(got, expected);
            let stored = versions(h.versions("e"));
            prop_assert!(stored.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
