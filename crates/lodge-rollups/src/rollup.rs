//! The [`Rollup`] trait and the closed set of projection kinds.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use lodge_events::Event;

use crate::aggregate::{LoadedAggregate, RollupSlot, RollupSlots};
use crate::errors::RollupError;
use crate::history::RollupHistory;

/// Every projection kind, each cached under its own resource key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RollupKind {
    /// Users by user id.
    User,
    /// Reservations by reservation id.
    Reservation,
    /// Ledger lines by user id.
    Ledger,
    /// Membership purchase state by restriction id.
    MembershipStatus,
    /// Property settings under a single id.
    Settings,
    /// Restrictions by restriction id.
    Restriction,
    /// Notifications by notification id.
    Notification,
    /// Page content by content name.
    Contents,
}

impl RollupKind {
    /// All kinds, in the order they are primed from the cache.
    pub const ALL: [Self; 8] = [
        Self::User,
        Self::Reservation,
        Self::Ledger,
        Self::MembershipStatus,
        Self::Settings,
        Self::Restriction,
        Self::Notification,
        Self::Contents,
    ];

    /// Cache resource key for this kind's serialized history.
    pub fn cache_key(self) -> &'static str {
        match self {
            Self::User => "USER_ROLLUP",
            Self::Reservation => "RESERVATION_ROLLUP",
            Self::Ledger => "LEDGER_ROLLUP",
            Self::MembershipStatus => "MEMBERSHIP_STATUS_ROLLUP",
            Self::Settings => "SETTINGS_ROLLUP",
            Self::Restriction => "RESTRICTION_ROLLUP",
            Self::Notification => "NOTIFICATION_ROLLUP",
            Self::Contents => "CONTENTS_ROLLUP",
        }
    }

    /// Cache keys of every kind.
    pub fn all_cache_keys() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.cache_key()).collect()
    }
}

impl fmt::Display for RollupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cache_key())
    }
}

/// A versioned snapshot of one entity, rebuilt by replaying events.
///
/// Implementations never mutate a stored snapshot: [`Rollup::apply`] clones
/// the latest one out of the history, changes the copy and returns it
/// stamped with the event's version.
pub trait Rollup: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Which kind this is.
    const KIND: RollupKind;

    /// Event version this snapshot was taken at.
    fn version(&self) -> i64;

    /// Fold one event. Returns the entity id and its new snapshot, or `None`
    /// when the event does not concern this kind.
    ///
    /// `aggregate` gives access to other kinds' projections; a kind must not
    /// read its own.
    fn apply(
        history: &RollupHistory<Self>,
        event: &Event,
        aggregate: &LoadedAggregate,
    ) -> Result<Option<(String, Self)>, RollupError>;

    /// Memo slot for this kind on a loaded aggregate.
    fn slot(slots: &RollupSlots) -> &RollupSlot<Self>;
}

/// Latest snapshot of `id`, cloned, or [`RollupError::MissingEntity`].
pub(crate) fn latest_of<R: Rollup>(
    history: &RollupHistory<R>,
    id: &str,
    version: i64,
) -> Result<R, RollupError> {
    history
        .latest(id)
        .cloned()
        .ok_or_else(|| RollupError::MissingEntity {
            kind: R::KIND,
            id: id.to_owned(),
            version,
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn cache_keys_are_unique() {
        let keys: HashSet<_> = RollupKind::all_cache_keys().into_iter().collect();
        assert_eq!(keys.len(), RollupKind::ALL.len());
        assert!(keys.contains("MEMBERSHIP_STATUS_ROLLUP"));
        assert!(keys.contains("CONTENTS_ROLLUP"));
    }

    #[test]
    fn display_is_cache_key() {
        assert_eq!(RollupKind::Ledger.to_string(), "LEDGER_ROLLUP");
    }
}
