//! Typed payload structs, one per event kind.
//!
//! Field names serialize as camelCase. Every kind that originates from a
//! client request carries `for_version`, the aggregate version the client
//! last observed; duplicate suppression keys on it.

mod content;
mod ledger;
mod notification;
mod property;
mod reservation;
mod restriction;
mod user;

pub use content::*;
pub use ledger::*;
pub use notification::*;
pub use property::*;
pub use reservation::*;
pub use restriction::*;
pub use user::*;

/// Behaviour shared by every payload type.
pub trait EventData {
    /// Version the submitting client last observed; `None` for kinds the
    /// service writes on its own.
    fn for_version(&self) -> Option<i64> {
        None
    }
}

/// Implements [`EventData`] for payloads with a `for_version` field.
macro_rules! client_request {
    ($($ty:ty),* $(,)?) => {
        $(
            impl EventData for $ty {
                fn for_version(&self) -> Option<i64> {
                    Some(self.for_version)
                }
            }
        )*
    };
}

client_request!(
    NewUserPayload,
    UpdateUserPayload,
    UpdateSystemUserPayload,
    AcceptInvitationPayload,
    NewReservationPayload,
    CancelReservationPayload,
    UpdateBalancePayload,
    UpdateMembershipStatusPayload,
    UpdateSettingsPayload,
    NewRestrictionPayload,
    NotificationReadPayload,
    NewContentPayload,
);

impl EventData for NewVersionPayload {}
impl EventData for NewPropertyPayload {}
impl EventData for NewNotificationPayload {}
