use lodge_core::UserId;
use lodge_events::types::UserState;
use lodge_events::{Event, EventPayload};
use serde::{Deserialize, Serialize};

use crate::aggregate::{LoadedAggregate, RollupSlot, RollupSlots};
use crate::errors::RollupError;
use crate::history::RollupHistory;
use crate::rollup::{Rollup, RollupKind, latest_of};

/// A user of the property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRollup {
    /// User id.
    pub user_id: UserId,
    /// May administer the property.
    pub is_admin: bool,
    /// Holds a membership.
    pub is_member: bool,
    /// Service account.
    pub is_system: bool,
    /// Invitation state.
    pub state: UserState,
    /// Display name.
    pub nickname: String,
    /// Login email.
    pub email_id: String,
    /// Event version of this snapshot.
    pub version: i64,
}

impl Rollup for UserRollup {
    const KIND: RollupKind = RollupKind::User;

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
            EventPayload::NewUser(p) => Self {
                user_id: p.user_id.clone(),
                is_admin: p.is_admin,
                is_member: p.is_member,
                is_system: p.is_system,
                state: p.state,
                nickname: p.nickname.clone(),
                email_id: p.email_id.clone(),
                version,
            },
            EventPayload::UpdateUser(p) => Self {
                is_admin: p.is_admin,
                is_member: p.is_member,
                is_system: p.is_system,
                state: p.state,
                nickname: p.nickname.clone(),
                email_id: p.email_id.clone(),
                version,
                ..latest_of(history, p.user_id.as_str(), version)?
            },
            EventPayload::UpdateSystemUser(p) => Self {
                nickname: p.nickname.clone(),
                email_id: p.email_id.clone(),
                version,
                ..latest_of(history, p.user_id.as_str(), version)?
            },
            // The invitation is answered by the invited user themselves.
            EventPayload::AcceptInvitation(p) => Self {
                state: if p.accept {
                    UserState::Accepted
                } else {
                    UserState::Declined
                },
                version,
                ..latest_of(history, p.author_user_id.as_str(), version)?
            },
            EventPayload::NewVersion(_)
            | EventPayload::NewProperty(_)
            | EventPayload::NewReservation(_)
            | EventPayload::CancelReservation(_)
            | EventPayload::UpdateBalance(_)
            | EventPayload::UpdateMembershipStatus(_)
            | EventPayload::UpdateSettings(_)
            | EventPayload::NewRestriction(_)
            | EventPayload::NewNotification(_)
            | EventPayload::NotificationRead(_)
            | EventPayload::NewContent(_) => return Ok(None),
        };
        Ok(Some((next.user_id.to_string(), next)))
    }

    fn slot(slots: &RollupSlots) -> &RollupSlot<Self> {
        &slots.user
    }
}
