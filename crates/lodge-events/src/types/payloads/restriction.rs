use lodge_core::{RestrictionId, UserId};
use serde::{Deserialize, Serialize};

/// Dates during which nobody may stay.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlackoutPeriod {
    /// First night, as `YYYY-MM-DD`.
    pub start_date: String,
    /// Checkout day, as `YYYY-MM-DD`.
    pub end_date: String,
}

/// A paid membership period.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPeriod {
    /// First day the membership can be purchased.
    pub pre_pay_start_date: String,
    /// First check-in day covered.
    pub in_date: String,
    /// Last checkout day covered.
    pub out_date: String,
    /// Last checkout day including the grace period.
    pub grace_period_out_date: String,
    /// Price of the membership in minor currency units.
    pub amount: i64,
}

/// Exactly one kind of restriction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RestrictionRule {
    /// No stays between the dates.
    Blackout(BlackoutPeriod),
    /// Stays require a purchased membership.
    Membership(MembershipPeriod),
}

impl RestrictionRule {
    /// The membership period, if this is a membership restriction.
    pub fn membership(&self) -> Option<&MembershipPeriod> {
        match self {
            Self::Membership(period) => Some(period),
            Self::Blackout(_) => None,
        }
    }
}

/// A restriction was added.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRestrictionPayload {
    /// Aggregate version the client last observed.
    pub for_version: i64,
    /// Membership restriction affected.
    pub restriction_id: RestrictionId,
    /// What the restriction restricts.
    pub rule: RestrictionRule,
    /// Human-readable description.
    pub description: String,
    /// When the request was made.
    pub create_date_time: String,
    /// User who made the request.
    pub author_user_id: UserId,
}
