//! Error types for projections and the orchestrator.

use lodge_events::{ErrorKind, EventStoreError};
use thiserror::Error;

use crate::rollup::RollupKind;

/// Errors raised while replaying events into projections.
///
/// `Clone` so a failed replay can be memoized and handed to every reader of
/// the same load.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RollupError {
    /// A new snapshot did not advance its entity's version.
    #[error("{kind} {id}: version {attempted} does not exceed {last}")]
    NonIncreasingVersion {
        /// Projection kind.
        kind: RollupKind,
        /// Entity id.
        id: String,
        /// Latest stored version.
        last: i64,
        /// Rejected version.
        attempted: i64,
    },

    /// An event refers to an entity with no earlier snapshot.
    #[error("{kind} has no entity {id} before version {version}")]
    MissingEntity {
        /// Projection kind that was looked up.
        kind: RollupKind,
        /// Entity id.
        id: String,
        /// Version of the event doing the lookup.
        version: i64,
    },

    /// A serialized history could not be decoded.
    #[error("rollup decode error: {0}")]
    Decode(String),
}

impl RollupError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NonIncreasingVersion { .. } | Self::MissingEntity { .. } => ErrorKind::Internal,
            Self::Decode(_) => ErrorKind::Encoding,
        }
    }
}

/// Errors returned by [`AggregateStore`](crate::AggregateStore).
#[derive(Debug, Error)]
pub enum AggregateError {
    /// Event log failure, including version conflicts.
    #[error(transparent)]
    Store(#[from] EventStoreError),

    /// Projection replay failure.
    #[error(transparent)]
    Rollup(#[from] RollupError),

    /// Malformed request.
    #[error("validation error: {0}")]
    Validation(String),
}

impl AggregateError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(e) => e.kind(),
            Self::Rollup(e) => e.kind(),
            Self::Validation(_) => ErrorKind::Validation,
        }
    }

    /// True when the caller should reload the aggregate and retry.
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_version_conflict())
    }
}

/// Convenience type alias for orchestrator results.
pub type Result<T> = std::result::Result<T, AggregateError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
