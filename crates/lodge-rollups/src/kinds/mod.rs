//! One module per projection kind.
//!
//! Each `apply` matches every [`EventPayload`](lodge_events::EventPayload)
//! variant explicitly, so adding an event kind forces a decision in every
//! projection.

mod content;
mod ledger;
mod membership;
mod notification;
mod reservation;
mod restriction;
mod settings;
mod user;

pub use content::ContentRollup;
pub use ledger::{LedgerEntry, LedgerRollup};
pub use membership::{MembershipRollup, MembershipStatus};
pub use notification::NotificationRollup;
pub use reservation::ReservationRollup;
pub use restriction::RestrictionRollup;
pub use settings::{SETTINGS_ID, SettingsRollup};
pub use user::UserRollup;
