//! # lodge-core
//!
//! Shared vocabulary for the lodge aggregate store:
//!
//! - **Branded IDs**: `AggregateId`, `UserId`, `ReservationId` and friends as
//!   string newtypes so an aggregate id never stands in for a user id
//! - **Timestamps**: RFC 3339 helpers used when stamping rows and events
//! - **Logging**: `tracing` subscriber setup plus an in-memory capture layer
//!   for asserting on log output in tests

#![deny(unsafe_code)]

pub mod ids;
pub mod logging;
pub mod time;

pub use ids::{
    AggregateId, IncarnationId, NotificationId, PaymentId, ReservationId, RestrictionId, UserId,
};
