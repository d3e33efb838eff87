use lodge_events::types::NewReservationPayload;
use lodge_events::{Event, EventPayload};
use serde::{Deserialize, Serialize};

use crate::aggregate::{LoadedAggregate, RollupSlot, RollupSlots};
use crate::errors::RollupError;
use crate::history::RollupHistory;
use crate::rollup::{Rollup, RollupKind, latest_of};

/// A reservation as booked, plus whether it has since been canceled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRollup {
    /// The booking request.
    pub input: NewReservationPayload,
    /// Canceled after booking.
    pub canceled: bool,
    /// Time of the last change.
    pub update_date_time: String,
    /// Event version of this snapshot.
    pub version: i64,
}

impl ReservationRollup {
    /// Total charged for the stay.
    pub fn amount(&self) -> i64 {
        self.input.amount()
    }
}

impl Rollup for ReservationRollup {
    const KIND: RollupKind = RollupKind::Reservation;

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(
        history: &RollupHistory<Self>,
        event: &Event,
        _aggregate: &LoadedAggregate,
    ) -> Result<Option<(String, Self)>, RollupError> {
        let version = event.version;
        let next = match &event.payload {
            EventPayload::NewReservation(p) => Self {
                input: p.clone(),
                canceled: false,
                update_date_time: p.create_date_time.clone(),
                version,
            },
            EventPayload::CancelReservation(p) => Self {
                canceled: true,
                update_date_time: p.create_date_time.clone(),
                version,
                ..latest_of(history, p.reservation_id.as_str(), version)?
            },
            EventPayload::NewVersion(_)
            | EventPayload::NewProperty(_)
            | EventPayload::NewUser(_)
            | EventPayload::UpdateUser(_)
            | EventPayload::UpdateSystemUser(_)
            | EventPayload::AcceptInvitation(_)
            | EventPayload::UpdateBalance(_)
            | EventPayload::UpdateMembershipStatus(_)
            | EventPayload::UpdateSettings(_)
            | EventPayload::NewRestriction(_)
            | EventPayload::NewNotification(_)
            | EventPayload::NotificationRead(_)
            | EventPayload::NewContent(_) => return Ok(None),
        };
        Ok(Some((next.input.reservation_id.to_string(), next)))
    }

    fn slot(slots: &RollupSlots) -> &RollupSlot<Self> {
        &slots.reservation
    }
}
