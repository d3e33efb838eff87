//! Version-stamped byte cache.
//!
//! [`VersionCache`] stores each value together with the aggregate
//! incarnation and version it was computed at. Readers compare both against
//! what they read from the log and only trust an exact match. The storage behind
//! it is any [`CacheBackend`]; [`MemoryCacheBackend`] is the in-process one.

mod backend;
mod versioned;

pub use backend::{CacheBackend, MemoryCacheBackend};
pub use versioned::{CacheRecord, CacheSnapshot, VersionCache};

#[cfg(test)]
pub use backend::MockCacheBackend;
