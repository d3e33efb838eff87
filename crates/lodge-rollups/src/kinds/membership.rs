use std::collections::BTreeMap;

use lodge_core::{RestrictionId, UserId};
use lodge_events::{Event, EventPayload};
use serde::{Deserialize, Serialize};

use crate::aggregate::{LoadedAggregate, RollupSlot, RollupSlots};
use crate::errors::RollupError;
use crate::history::RollupHistory;
use crate::rollup::{Rollup, RollupKind, latest_of};

/// A member's standing within one membership period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MembershipStatus {
    /// Neither purchased nor declined yet.
    #[default]
    Open,
    /// Purchased; stays in the period are allowed.
    Purchased,
    /// Declined; stays in the period are refused.
    Optout,
}

/// A membership restriction and each member's status in it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRollup {
    /// Restriction that defines the period.
    pub restriction_id: RestrictionId,
    /// Earliest date a purchase is accepted.
    pub pre_pay_start_date: String,
    /// First day covered.
    pub in_date: String,
    /// Last day covered.
    pub out_date: String,
    /// Last day a late purchase is accepted.
    pub grace_period_out_date: String,
    /// Administrator description.
    pub description: String,
    /// Price of the membership.
    pub amount: i64,
    /// Status per user; absent users are [`MembershipStatus::Open`].
    pub users: BTreeMap<UserId, MembershipStatus>,
    /// Event version of this snapshot.
    pub version: i64,
}

impl MembershipRollup {
    /// Status of `user` in this period.
    pub fn status(&self, user: &UserId) -> MembershipStatus {
        self.users.get(user).copied().unwrap_or_default()
    }
}

impl Rollup for MembershipRollup {
    const KIND: RollupKind = RollupKind::MembershipStatus;

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
            EventPayload::NewRestriction(p) => {
                let Some(period) = p.rule.membership() else {
                    return Ok(None);
                };
                Self {
                    restriction_id: p.restriction_id.clone(),
                    pre_pay_start_date: period.pre_pay_start_date.clone(),
                    in_date: period.in_date.clone(),
                    out_date: period.out_date.clone(),
                    grace_period_out_date: period.grace_period_out_date.clone(),
                    description: p.description.clone(),
                    amount: period.amount,
                    users: BTreeMap::new(),
                    version,
                }
            }
            EventPayload::UpdateMembershipStatus(p) => {
                let mut next = latest_of(history, p.restriction_id.as_str(), version)?;
                let status = if p.purchase {
                    MembershipStatus::Purchased
                } else {
                    MembershipStatus::Optout
                };
                let _ = next.users.insert(p.update_for_user_id.clone(), status);
                next.version = version;
                next
            }
            EventPayload::NewVersion(_)
            | EventPayload::NewProperty(_)
            | EventPayload::NewUser(_)
            | EventPayload::UpdateUser(_)
            | EventPayload::UpdateSystemUser(_)
            | EventPayload::AcceptInvitation(_)
            | EventPayload::NewReservation(_)
            | EventPayload::CancelReservation(_)
            | EventPayload::UpdateBalance(_)
            | EventPayload::UpdateSettings(_)
            | EventPayload::NewNotification(_)
            | EventPayload::NotificationRead(_)
            | EventPayload::NewContent(_) => return Ok(None),
        };
        Ok(Some((next.restriction_id.to_string(), next)))
    }

    fn slot(slots: &RollupSlots) -> &RollupSlot<Self> {
        &slots.membership_status
    }
}
