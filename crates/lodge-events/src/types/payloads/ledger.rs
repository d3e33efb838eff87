use lodge_core::{PaymentId, RestrictionId, UserId};
use serde::{Deserialize, Serialize};

/// A payment (increase) or expense (decrease) against a user's balance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBalancePayload {
    /// Aggregate version the client last observed.
    pub for_version: i64,
    /// Identifier of this adjustment.
    pub payment_id: PaymentId,
    /// User whose balance or status changes.
    pub update_for_user_id: UserId,
    /// Always non-negative; `increase` gives the direction.
    pub amount: i64,
    /// True for a payment, false for an expense.
    pub increase: bool,
    /// Human-readable description.
    pub description: String,
    /// When the request was made.
    pub create_date_time: String,
    /// User who made the request.
    pub author_user_id: UserId,
}

/// A user purchased, or opted out of, a membership period.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMembershipStatusPayload {
    /// Aggregate version the client last observed.
    pub for_version: i64,
    /// User whose balance or status changes.
    pub update_for_user_id: UserId,
    /// Membership restriction affected.
    pub restriction_id: RestrictionId,
    /// True to purchase, false to opt out.
    pub purchase: bool,
    /// Made by an administrator on the user's behalf.
    pub admin_update: bool,
    /// Administrator comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// When the request was made.
    pub create_date_time: String,
    /// User who made the request.
    pub author_user_id: UserId,
}
