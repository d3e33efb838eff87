use lodge_events::types::NewRestrictionPayload;
use lodge_events::{Event, EventPayload};
use serde::{Deserialize, Serialize};

use crate::aggregate::{LoadedAggregate, RollupSlot, RollupSlots};
use crate::errors::RollupError;
use crate::history::RollupHistory;
use crate::rollup::{Rollup, RollupKind};

/// A blackout or membership restriction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictionRollup {
    /// The request that added it.
    pub input: NewRestrictionPayload,
    /// Event version of this snapshot.
    pub version: i64,
}

impl Rollup for RestrictionRollup {
    const KIND: RollupKind = RollupKind::Restriction;

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(
        _history: &RollupHistory<Self>,
        event: &Event,
        _aggregate: &LoadedAggregate,
    ) -> Result<Option<(String, Self)>, RollupError> {
        match &event.payload {
            EventPayload::NewRestriction(p) => Ok(Some((
                p.restriction_id.to_string(),
                Self {
                    input: p.clone(),
                    version: event.version,
                },
            ))),
            EventPayload::NewVersion(_)
            | EventPayload::NewProperty(_)
            | EventPayload::NewUser(_)
            | EventPayload::UpdateUser(_)
            | EventPayload::UpdateSystemUser(_)
            | EventPayload::AcceptInvitation(_)
            | EventPayload::NewReservation(_)
            | EventPayload::CancelReservation(_)
            | EventPayload::UpdateBalance(_)
            | EventPayload::UpdateMembershipStatus(_)
            | EventPayload::UpdateSettings(_)
            | EventPayload::NewNotification(_)
            | EventPayload::NotificationRead(_)
            | EventPayload::NewContent(_) => Ok(None),
        }
    }

    fn slot(slots: &RollupSlots) -> &RollupSlot<Self> {
        &slots.restriction
    }
}
