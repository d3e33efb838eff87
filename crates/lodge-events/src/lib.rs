//! # lodge-events
//!
//! Append-only event log for the lodge aggregate store.
//!
//! - **Event registry**: closed [`EventPayload`] union generated by
//!   `define_events!`, adjacently tagged on the wire
//! - **Record codec**: [`StorageRecord`] batches with optional zlib
//!   compression, merged by version on read
//! - **Consolidator**: folds runs of small records into one inside the
//!   appending transaction
//! - **Version-stamped cache**: [`VersionCache`] over any [`CacheBackend`]
//! - **Event log**: [`EventLog`] with the `SQLite` ([`SqliteEventLog`]) and
//!   in-process ([`MemoryEventLog`]) implementations
//! - **Migrations**: embedded, version-tracked schema bootstrap

#![deny(unsafe_code)]

pub mod cache;
pub mod codec;
pub mod consolidate;
pub mod errors;
pub mod sqlite;
pub mod store;
pub mod types;

pub use cache::{CacheBackend, CacheRecord, CacheSnapshot, MemoryCacheBackend, VersionCache};
pub use codec::{RecordKind, RecordSummary, StorageRecord};
pub use consolidate::Consolidator;
pub use errors::{CacheError, ErrorKind, EventStoreError, Result};
pub use store::{
    CURRENT_VERSION_KEY, EventLog, EventStream, MemoryEventLog, SqliteEventLog,
    VERSIONED_EVENTS_KEY,
};
pub use types::{ALL_EVENT_TYPES, Event, EventData, EventPayload, EventType};
