use lodge_core::UserId;
use lodge_events::{Event, EventPayload};
use serde::{Deserialize, Serialize};

use super::{MembershipRollup, MembershipStatus, ReservationRollup};
use crate::aggregate::{LoadedAggregate, RollupSlot, RollupSlots};
use crate::errors::RollupError;
use crate::history::RollupHistory;
use crate::rollup::{Rollup, RollupKind, latest_of};

/// What moved a user's balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEntry {
    /// Account opened with a zero balance.
    Start,
    /// Stay booked.
    Reservation,
    /// Stay canceled and refunded.
    CancelReservation,
    /// Money received.
    Payment,
    /// Money charged.
    Expense,
    /// Membership purchased.
    MembershipPayment,
    /// Membership declined, refunding any earlier purchase.
    MembershipOptout,
}

/// One line of a user's ledger, carrying the running balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRollup {
    /// Account holder.
    pub user_id: UserId,
    /// Kind of movement.
    pub entry: LedgerEntry,
    /// When the movement happened.
    pub event_date_time: String,
    /// Balance after the movement.
    pub balance: i64,
    /// Signed change; negative is a charge.
    pub amount: i64,
    /// Event version of this snapshot.
    pub version: i64,
}

impl LedgerRollup {
    fn line(
        prev: Self,
        entry: LedgerEntry,
        amount: i64,
        event_date_time: &str,
        version: i64,
    ) -> Self {
        Self {
            entry,
            balance: prev.balance + amount,
            amount,
            event_date_time: event_date_time.to_owned(),
            version,
            ..prev
        }
    }
}

impl Rollup for LedgerRollup {
    const KIND: RollupKind = RollupKind::Ledger;

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(
        history: &RollupHistory<Self>,
        event: &Event,
        aggregate: &LoadedAggregate,
    ) -> Result<Option<(String, Self)>, RollupError> {
        let version = event.version;
        let next = match &event.payload {
            EventPayload::NewUser(p) => Self {
                user_id: p.user_id.clone(),
                entry: LedgerEntry::Start,
                event_date_time: p.create_date_time.clone(),
                balance: 0,
                amount: 0,
                version,
            },
            EventPayload::NewReservation(p) => {
                let prev = latest_of(history, p.reserved_for_user_id.as_str(), version)?;
                Self::line(
                    prev,
                    LedgerEntry::Reservation,
                    -p.amount(),
                    &p.create_date_time,
                    version,
                )
            }
            EventPayload::CancelReservation(p) => {
                let prev = latest_of(history, p.reserved_for_user_id.as_str(), version)?;
                let reservation = aggregate
                    .projection::<ReservationRollup>(p.reservation_id.as_str(), Some(version))?
                    .ok_or_else(|| RollupError::MissingEntity {
                        kind: RollupKind::Reservation,
                        id: p.reservation_id.to_string(),
                        version,
                    })?;
                Self::line(
                    prev,
                    LedgerEntry::CancelReservation,
                    reservation.amount(),
                    &p.create_date_time,
                    version,
                )
            }
            EventPayload::UpdateBalance(p) => {
                let prev = latest_of(history, p.update_for_user_id.as_str(), version)?;
                let (entry, amount) = if p.increase {
                    (LedgerEntry::Payment, p.amount)
                } else {
                    (LedgerEntry::Expense, -p.amount)
                };
                Self::line(prev, entry, amount, &p.create_date_time, version)
            }
            EventPayload::UpdateMembershipStatus(p) => {
                let prev = latest_of(history, p.update_for_user_id.as_str(), version)?;
                // Status as it stood just before this event.
                let membership = aggregate
                    .projection::<MembershipRollup>(p.restriction_id.as_str(), Some(version - 1))?
                    .ok_or_else(|| RollupError::MissingEntity {
                        kind: RollupKind::MembershipStatus,
                        id: p.restriction_id.to_string(),
                        version,
                    })?;
                let (entry, amount) = if p.purchase {
                    (LedgerEntry::MembershipPayment, -membership.amount)
                } else if membership.status(&p.update_for_user_id) == MembershipStatus::Purchased {
                    (LedgerEntry::MembershipOptout, membership.amount)
                } else {
                    (LedgerEntry::MembershipOptout, 0)
                };
                Self::line(prev, entry, amount, &p.create_date_time, version)
            }
            EventPayload::NewVersion(_)
            | EventPayload::NewProperty(_)
            | EventPayload::UpdateUser(_)
            | EventPayload::UpdateSystemUser(_)
            | EventPayload::AcceptInvitation(_)
            | EventPayload::UpdateSettings(_)
            | EventPayload::NewRestriction(_)
            | EventPayload::NewNotification(_)
            | EventPayload::NotificationRead(_)
            | EventPayload::NewContent(_) => return Ok(None),
        };
        Ok(Some((next.user_id.to_string(), next)))
    }

    fn slot(slots: &RollupSlots) -> &RollupSlot<Self> {
        &slots.ledger
    }
}
