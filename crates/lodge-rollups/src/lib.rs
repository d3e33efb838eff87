//! # lodge-rollups
//!
//! Projections and the load/commit path for lodge aggregates.
//!
//! - **Projection kinds**: one [`Rollup`] per entity kind, each folding the
//!   event list into per-entity snapshots with strictly increasing versions
//! - **Projection engine**: [`LoadedAggregate`] replays a kind on first read,
//!   memoizes it for the lifetime of the load and writes it to the cache
//! - **Duplicate suppression**: [`is_duplicate`] matches retried client
//!   requests by event type and `for_version`
//! - **Orchestrator**: [`AggregateStore`] creates, loads, commits and
//!   deletes aggregates over any [`EventLog`](lodge_events::EventLog)

#![deny(unsafe_code)]

pub mod aggregate;
pub mod duplicate;
pub mod errors;
pub mod history;
pub mod kinds;
pub mod orchestrator;
pub mod rollup;

pub use aggregate::{LoadedAggregate, RollupSlot, RollupSlots};
pub use duplicate::is_duplicate;
pub use errors::{AggregateError, Result, RollupError};
pub use history::{RollupHistory, RollupQuery};
pub use kinds::{
    ContentRollup, LedgerEntry, LedgerRollup, MembershipRollup, MembershipStatus,
    NotificationRollup, ReservationRollup, RestrictionRollup, SETTINGS_ID, SettingsRollup,
    UserRollup,
};
pub use orchestrator::{AggregateStore, Submission};
pub use rollup::{Rollup, RollupKind};
