use lodge_core::UserId;
use serde::{Deserialize, Serialize};

/// Billing currency of a property.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US dollars.
    #[default]
    Usd,
    /// Euros.
    Eur,
}

/// Storage schema marker.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVersionPayload {
    /// Schema revision the aggregate was created under.
    pub version: i64,
}

/// A property was created.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPropertyPayload {
    /// Display name of the property.
    pub property_name: String,
    /// Billing currency.
    pub currency: Currency,
    /// Nightly rate for members.
    pub member_rate: i64,
    /// Whether members may book guests.
    pub allow_non_members: bool,
    /// Nightly rate for guests.
    pub non_member_rate: i64,
    /// Whether the user is a member.
    pub is_member: bool,
    /// Display name.
    pub nickname: String,
    /// IANA timezone of the property.
    pub timezone: String,
    /// When the request was made.
    pub create_date_time: String,
    /// User who made the request.
    pub author_user_id: UserId,
}

/// Property settings were replaced wholesale.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsPayload {
    /// Aggregate version the client last observed.
    pub for_version: i64,
    /// Display name of the property.
    pub property_name: String,
    /// Billing currency.
    pub currency: Currency,
    /// Nightly rate for members.
    pub member_rate: i64,
    /// Whether members may book guests.
    pub allow_non_members: bool,
    /// Nightly rate for guests.
    pub non_member_rate: i64,
    /// IANA timezone of the property.
    pub timezone: String,
    /// Lowest balance allowed before booking is refused.
    pub min_balance: i64,
    /// Furthest checkout date, in days from today.
    pub max_out_days: i64,
    /// Earliest check-in date, in days from today.
    pub min_in_days: i64,
    /// Days before check-in to send a reminder.
    pub reservation_reminder_days_before: i64,
    /// Days between low-balance reminders.
    pub balance_reminder_interval_days: i64,
    /// When the request was made.
    pub create_date_time: String,
    /// User who made the request.
    pub author_user_id: UserId,
}
