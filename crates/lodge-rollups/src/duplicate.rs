//! Duplicate suppression for client requests.
//!
//! A client names the version it last saw in `for_version`. A request for
//! the current version always goes through. An older one is either a retry
//! of something already applied, recognised by an earlier event of the same
//! type carrying the same `for_version`, or a stale but legitimate request.

use lodge_events::EventPayload;
use tracing::debug;

use crate::aggregate::LoadedAggregate;
use crate::errors::AggregateError;

/// Whether `request` was already applied to `aggregate`.
///
/// Errors with [`AggregateError::Validation`] when the request carries no
/// `for_version` or names a version outside `1..=aggregate.version()`.
pub fn is_duplicate(
    request: &EventPayload,
    aggregate: &LoadedAggregate,
) -> Result<bool, AggregateError> {
    let event_type = request.event_type();
    let Some(for_version) = request.for_version() else {
        return Err(AggregateError::Validation(format!(
            "{event_type} does not carry a for_version"
        )));
    };
    let current = aggregate.version();
    if for_version == current {
        return Ok(false);
    }
    if for_version <= 0 || for_version > current {
        return Err(AggregateError::Validation(format!(
            "{event_type}: for_version {for_version} outside 1..={current}"
        )));
    }

    // Version 0 is the seed.
    let duplicate = aggregate
        .events()
        .iter()
        .skip(1)
        .rev()
        .any(|e| e.event_type() == event_type && e.for_version() == Some(for_version));
    debug!(
        aggregate_id = %aggregate.id(),
        %event_type,
        for_version,
        current,
        duplicate,
        "checked stale request"
    );
    Ok(duplicate)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
