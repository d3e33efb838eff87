use lodge_events::types::NewContentPayload;
use lodge_events::{Event, EventPayload};
use serde::{Deserialize, Serialize};

use crate::aggregate::{LoadedAggregate, RollupSlot, RollupSlots};
use crate::errors::RollupError;
use crate::history::RollupHistory;
use crate::rollup::{Rollup, RollupKind};

/// Published content for one page; each publication is a new version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRollup {
    /// The publishing request.
    pub input: NewContentPayload,
    /// Event version of this snapshot.
    pub version: i64,
}

impl Rollup for ContentRollup {
    const KIND: RollupKind = RollupKind::Contents;

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(
        _history: &RollupHistory<Self>,
        event: &Event,
        _aggregate: &LoadedAggregate,
    ) -> Result<Option<(String, Self)>, RollupError> {
        match &event.payload {
            EventPayload::NewContent(p) => Ok(Some((
                p.name.as_str().to_owned(),
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
            | EventPayload::NewRestriction(_)
            | EventPayload::NewNotification(_)
            | EventPayload::NotificationRead(_) => Ok(None),
        }
    }

    fn slot(slots: &RollupSlots) -> &RollupSlot<Self> {
        &slots.contents
    }
}
