use lodge_core::UserId;
use serde::{Deserialize, Serialize};

/// Membership state of a user within a property.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserState {
    /// Invited, has not answered.
    #[default]
    WaitingAccept,
    /// Accepted the invitation.
    Accepted,
    /// Disabled by an administrator.
    Disabled,
    /// Declined the invitation.
    Declined,
}

/// A user was added to the property.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserPayload {
    /// Aggregate version the client last observed.
    pub for_version: i64,
    /// Subject user.
    pub user_id: UserId,
    /// Opaque handle to the user's email address.
    pub email_id: String,
    /// Display name.
    pub nickname: String,
    /// Whether the user administers the property.
    pub is_admin: bool,
    /// Whether the user is a member.
    pub is_member: bool,
    /// Whether this is the built-in system user.
    pub is_system: bool,
    /// Invitation state.
    pub state: UserState,
    /// When the request was made.
    pub create_date_time: String,
    /// User who made the request.
    pub author_user_id: UserId,
}

/// A user's profile, role or state was changed by an administrator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    /// Aggregate version the client last observed.
    pub for_version: i64,
    /// Subject user.
    pub user_id: UserId,
    /// Opaque handle to the user's email address.
    pub email_id: String,
    /// Display name.
    pub nickname: String,
    /// Whether the user administers the property.
    pub is_admin: bool,
    /// Whether the user is a member.
    pub is_member: bool,
    /// Whether this is the built-in system user.
    pub is_system: bool,
    /// Invitation state.
    pub state: UserState,
    /// When the change was made.
    pub update_date_time: String,
    /// User who made the request.
    pub author_user_id: UserId,
}

/// The system user's contact details changed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSystemUserPayload {
    /// Aggregate version the client last observed.
    pub for_version: i64,
    /// Subject user.
    pub user_id: UserId,
    /// Opaque handle to the user's email address.
    pub email_id: String,
    /// Display name.
    pub nickname: String,
    /// When the change was made.
    pub update_date_time: String,
    /// User who made the request.
    pub author_user_id: UserId,
}

/// The author answered their own invitation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInvitationPayload {
    /// Aggregate version the client last observed.
    pub for_version: i64,
    /// True to accept, false to decline.
    pub accept: bool,
    /// When the change was made.
    pub update_date_time: String,
    /// User who made the request.
    pub author_user_id: UserId,
}
