use lodge_core::{ReservationId, UserId};
use serde::{Deserialize, Serialize};

/// Price of one night.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRate {
    /// Night, as `YYYY-MM-DD`.
    pub date: String,
    /// Amount in minor currency units.
    pub amount: i64,
}

/// A reservation was booked.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReservationPayload {
    /// Aggregate version the client last observed.
    pub for_version: i64,
    /// Reservation being created or changed.
    pub reservation_id: ReservationId,
    /// User the stay is booked for.
    pub reserved_for_user_id: UserId,
    /// First night, as `YYYY-MM-DD`.
    pub start_date: String,
    /// Checkout day, as `YYYY-MM-DD`.
    pub end_date: String,
    /// Whether the stay is for the member themselves.
    pub member: bool,
    /// Guest name for non-member stays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_member_name: Option<String>,
    /// Free-form guest details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_member_info: Option<String>,
    /// Made by an administrator on the user's behalf.
    pub admin_request: bool,
    /// Price of each night.
    pub rate: Vec<DailyRate>,
    /// When the request was made.
    pub create_date_time: String,
    /// User who made the request.
    pub author_user_id: UserId,
}

impl NewReservationPayload {
    /// Total price: the sum of the nightly rates.
    pub fn amount(&self) -> i64 {
        self.rate.iter().map(|r| r.amount).sum()
    }
}

/// A reservation was canceled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReservationPayload {
    /// Aggregate version the client last observed.
    pub for_version: i64,
    /// Reservation being created or changed.
    pub reservation_id: ReservationId,
    /// User the stay is booked for.
    pub reserved_for_user_id: UserId,
    /// Made by an administrator on the user's behalf.
    pub admin_request: bool,
    /// When the request was made.
    pub create_date_time: String,
    /// User who made the request.
    pub author_user_id: UserId,
}
