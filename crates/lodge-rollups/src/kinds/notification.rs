use std::collections::BTreeSet;

use lodge_core::UserId;
use lodge_events::types::NewNotificationPayload;
use lodge_events::{Event, EventPayload};
use serde::{Deserialize, Serialize};

use crate::aggregate::{LoadedAggregate, RollupSlot, RollupSlots};
use crate::errors::RollupError;
use crate::history::RollupHistory;
use crate::rollup::{Rollup, RollupKind, latest_of};

/// A notification and who has read it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRollup {
    /// The notification as issued.
    pub input: NewNotificationPayload,
    /// Direct and copied recipients.
    pub targets: BTreeSet<UserId>,
    /// Users who have read it.
    pub readers: BTreeSet<UserId>,
    /// Event version of this snapshot.
    pub version: i64,
}

impl NotificationRollup {
    /// Whether `user` was sent or copied on it.
    pub fn is_target(&self, user: &UserId) -> bool {
        self.targets.contains(user)
    }

    /// Whether `user` has read it.
    pub fn is_read_by(&self, user: &UserId) -> bool {
        self.readers.contains(user)
    }
}

impl Rollup for NotificationRollup {
    const KIND: RollupKind = RollupKind::Notification;

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
            EventPayload::NewNotification(p) => Self {
                input: p.clone(),
                targets: p.to_user_ids.iter().chain(&p.cc_user_ids).cloned().collect(),
                readers: BTreeSet::new(),
                version,
            },
            EventPayload::NotificationRead(p) => {
                let mut next = latest_of(history, p.notification_id.as_str(), version)?;
                let _ = next.readers.insert(p.author_user_id.clone());
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
            | EventPayload::UpdateMembershipStatus(_)
            | EventPayload::UpdateSettings(_)
            | EventPayload::NewRestriction(_)
            | EventPayload::NewContent(_) => return Ok(None),
        };
        Ok(Some((next.input.notification_id.to_string(), next)))
    }

    fn slot(slots: &RollupSlots) -> &RollupSlot<Self> {
        &slots.notification
    }
}
