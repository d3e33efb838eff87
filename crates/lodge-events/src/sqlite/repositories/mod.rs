//! Stateless repositories. Every method takes a `&Connection`, so the same
//! code runs on a pooled connection or inside an open transaction.

pub mod aggregate;
pub mod record;

pub use aggregate::AggregateRepo;
pub use record::RecordRepo;
