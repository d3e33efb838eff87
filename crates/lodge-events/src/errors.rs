//! Error types for the event log and the version-stamped cache.
//!
//! [`EventStoreError`] is returned by every log operation. [`CacheError`] is
//! its own type because cache failures never fail a log operation: the log
//! logs them and falls back to storage.

use thiserror::Error;

/// Coarse classification shared by every lodge error type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Aggregate or entity does not exist.
    NotFound,
    /// Aggregate id is already registered.
    AlreadyExists,
    /// Expected append version did not match; reload and retry.
    VersionConflict,
    /// Caller supplied malformed input.
    Validation,
    /// Bytes did not round-trip.
    Encoding,
    /// Cache backend failure.
    Cache,
    /// Storage backend failure.
    Storage,
    /// Broken internal invariant.
    Internal,
}

/// Errors raised by the version-stamped cache and its backends.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Backend unavailable or refused the request.
    #[error("cache backend error: {0}")]
    Backend(String),

    /// Value exceeds the per-entry limit even after compression.
    #[error("cache value for {key} too big: {size} bytes")]
    TooLarge {
        /// Full backend key.
        key: String,
        /// Size that was refused.
        size: usize,
    },

    /// Cache record could not be encoded or decoded.
    #[error("cache encoding error: {0}")]
    Encoding(String),
}

/// Errors that can occur during event log operations.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON serialization/deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Filesystem error while opening the database.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// A stored record could not be decoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Aggregate has no index entry or no records.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(String),

    /// Aggregate id is already registered.
    #[error("aggregate already exists: {0}")]
    AggregateExists(String),

    /// Append raced with another writer or used a stale version.
    #[error("version conflict on {aggregate_id}: expected next version {expected}, actual {actual}")]
    VersionConflict {
        /// Aggregate being appended to.
        aggregate_id: String,
        /// Next version the caller expected.
        expected: i64,
        /// Next version the log actually has.
        actual: i64,
    },

    /// Caller supplied malformed input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Cache failure surfaced by a direct cache call.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Internal invariant broken.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EventStoreError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Sqlite(_) | Self::Pool(_) | Self::Io(_) | Self::Migration { .. } => {
                ErrorKind::Storage
            }
            Self::Serde(_) | Self::Encoding(_) => ErrorKind::Encoding,
            Self::AggregateNotFound(_) => ErrorKind::NotFound,
            Self::AggregateExists(_) => ErrorKind::AlreadyExists,
            Self::VersionConflict { .. } => ErrorKind::VersionConflict,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Cache(_) => ErrorKind::Cache,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True when the caller should reload the aggregate and retry.
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Convenience type alias for event log results.
pub type Result<T> = std::result::Result<T, EventStoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
