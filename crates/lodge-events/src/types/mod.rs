//! Event kinds, payloads, and the stored [`Event`] unit.

#[macro_use]
mod macros;
mod event;
pub mod payloads;

pub use event::Event;
pub use payloads::*;

use serde::{Deserialize, Serialize};

define_events! {
    events {
        /// Schema marker written as the first seed event.
        NewVersion => "version.new" => NewVersionPayload,
        /// Property created; seeds settings.
        NewProperty => "property.new" => NewPropertyPayload,
        /// User invited or created.
        NewUser => "user.new" => NewUserPayload,
        /// User profile or role changed.
        UpdateUser => "user.update" => UpdateUserPayload,
        /// System user renamed.
        UpdateSystemUser => "user.update_system" => UpdateSystemUserPayload,
        /// Invitation accepted or declined by its recipient.
        AcceptInvitation => "user.accept_invitation" => AcceptInvitationPayload,
        /// Reservation booked.
        NewReservation => "reservation.new" => NewReservationPayload,
        /// Reservation canceled.
        CancelReservation => "reservation.cancel" => CancelReservationPayload,
        /// Payment or expense recorded against a user's balance.
        UpdateBalance => "ledger.update_balance" => UpdateBalancePayload,
        /// Membership purchased or opted out of.
        UpdateMembershipStatus => "membership.update_status" => UpdateMembershipStatusPayload,
        /// Property settings replaced.
        UpdateSettings => "settings.update" => UpdateSettingsPayload,
        /// Blackout or membership restriction added.
        NewRestriction => "restriction.new" => NewRestrictionPayload,
        /// Notification issued by the service.
        NewNotification => "notification.new" => NewNotificationPayload,
        /// Notification read by a user.
        NotificationRead => "notification.read" => NotificationReadPayload,
        /// Home page content published.
        NewContent => "content.new" => NewContentPayload,
    }
    domain_groups {
        /// Kinds written by the service itself rather than a client request.
        is_system_event => [NewVersion, NewProperty, NewNotification],
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
