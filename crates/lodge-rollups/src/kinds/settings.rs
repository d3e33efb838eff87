use lodge_events::types::Currency;
use lodge_events::{Event, EventPayload};
use serde::{Deserialize, Serialize};

use crate::aggregate::{LoadedAggregate, RollupSlot, RollupSlots};
use crate::errors::RollupError;
use crate::history::RollupHistory;
use crate::rollup::{Rollup, RollupKind, latest_of};

/// Entity id of the property's single settings record.
pub const SETTINGS_ID: &str = "0";

const DEFAULT_MAX_OUT_DAYS: i64 = 365;
const DEFAULT_MIN_IN_DAYS: i64 = 0;
const DEFAULT_MIN_BALANCE: i64 = -100_000;
const DEFAULT_RESERVATION_REMINDER_DAYS: i64 = 3;
const DEFAULT_BALANCE_REMINDER_INTERVAL_DAYS: i64 = 2;

/// Property-wide settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRollup {
    /// Display name of the property.
    pub property_name: String,
    /// Billing currency.
    pub currency: Currency,
    /// Nightly member rate.
    pub member_rate: i64,
    /// Whether members may book for guests.
    pub allow_non_members: bool,
    /// Nightly guest rate.
    pub non_member_rate: i64,
    /// IANA timezone.
    pub timezone: String,
    /// Lowest balance allowed before booking is refused.
    pub min_balance: i64,
    /// Latest check-out, in days from today.
    pub max_out_days: i64,
    /// Earliest check-in, in days from today.
    pub min_in_days: i64,
    /// Days before a stay to send a reminder.
    pub reservation_reminder_days_before: i64,
    /// Days between low-balance reminders.
    pub balance_reminder_interval_days: i64,
    /// Event version of this snapshot.
    pub version: i64,
}

impl Rollup for SettingsRollup {
    const KIND: RollupKind = RollupKind::Settings;

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
            EventPayload::NewProperty(p) => Self {
                property_name: p.property_name.clone(),
                currency: p.currency,
                member_rate: p.member_rate,
                allow_non_members: p.allow_non_members,
                non_member_rate: p.non_member_rate,
                timezone: p.timezone.clone(),
                min_balance: DEFAULT_MIN_BALANCE,
                max_out_days: DEFAULT_MAX_OUT_DAYS,
                min_in_days: DEFAULT_MIN_IN_DAYS,
                reservation_reminder_days_before: DEFAULT_RESERVATION_REMINDER_DAYS,
                balance_reminder_interval_days: DEFAULT_BALANCE_REMINDER_INTERVAL_DAYS,
                version,
            },
            EventPayload::UpdateSettings(p) => {
                // Every field is replaced; the lookup only proves the property was seeded.
                let _ = latest_of(history, SETTINGS_ID, version)?;
                Self {
                    property_name: p.property_name.clone(),
                    currency: p.currency,
                    member_rate: p.member_rate,
                    allow_non_members: p.allow_non_members,
                    non_member_rate: p.non_member_rate,
                    timezone: p.timezone.clone(),
                    min_balance: p.min_balance,
                    max_out_days: p.max_out_days,
                    min_in_days: p.min_in_days,
                    reservation_reminder_days_before: p.reservation_reminder_days_before,
                    balance_reminder_interval_days: p.balance_reminder_interval_days,
                    version,
                }
            }
            EventPayload::NewVersion(_)
            | EventPayload::NewUser(_)
            | EventPayload::UpdateUser(_)
            | EventPayload::UpdateSystemUser(_)
            | EventPayload::AcceptInvitation(_)
            | EventPayload::NewReservation(_)
            | EventPayload::CancelReservation(_)
            | EventPayload::UpdateBalance(_)
            | EventPayload::UpdateMembershipStatus(_)
            | EventPayload::NewRestriction(_)
            | EventPayload::NewNotification(_)
            | EventPayload::NotificationRead(_)
            | EventPayload::NewContent(_) => return Ok(None),
        };
        Ok(Some((SETTINGS_ID.to_owned(), next)))
    }

    fn slot(slots: &RollupSlots) -> &RollupSlot<Self> {
        &slots.settings
    }
}
