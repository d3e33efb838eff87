//! Storage record layout and the zlib helpers shared with the cache.
//!
//! A [`StorageRecord`] holds the events for an inclusive version range
//! `[first, last]`. An aggregate's history is the union of its records:
//! decoded, deduplicated by version with the later write winning, and
//! sorted. See [`merge_records`].

use std::collections::BTreeMap;
use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::Deserialize;

use crate::errors::{EventStoreError, Result};
use crate::types::{Event, EventPayload};

/// Byte layout of a record's `events` blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    /// Legacy layout: a list of `{"id": version, "value": payload}` pairs.
    Keyed,
    /// A list of [`Event`]s.
    Batch,
}

impl RecordKind {
    /// Integer stored in the `kind` column.
    pub fn code(self) -> i64 {
        match self {
            Self::Keyed => 0,
            Self::Batch => 1,
        }
    }

    /// Parse the `kind` column.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(Self::Keyed),
            1 => Ok(Self::Batch),
            other => Err(EventStoreError::Encoding(format!(
                "unknown record kind {other}"
            ))),
        }
    }
}

/// One physical fragment of an aggregate's log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageRecord {
    /// First version held (inclusive).
    pub first: i64,
    /// Last version held (inclusive).
    pub last: i64,
    /// Whether `events` is zlib-compressed.
    pub compressed: bool,
    /// Layout of the decompressed bytes.
    pub kind: RecordKind,
    /// Encoded events.
    pub events: Vec<u8>,
}

/// Position and size of a stored record, without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordSummary {
    /// Backend identity of the record; later writes have larger values.
    pub seq: i64,
    /// First version held (inclusive).
    pub first: i64,
    /// Last version held (inclusive).
    pub last: i64,
    /// Encoded size in bytes.
    pub size: usize,
}

#[derive(Deserialize)]
struct KeyedEntry {
    id: i64,
    value: EventPayload,
}

impl StorageRecord {
    /// Encode a non-empty, contiguous run of events.
    pub fn encode(events: &[Event], compress: bool) -> Result<Self> {
        let (Some(head), Some(tail)) = (events.first(), events.last()) else {
            return Err(EventStoreError::Validation(
                "cannot encode an empty record".into(),
            ));
        };
        if let Some(pair) = events.windows(2).find(|w| w[1].version != w[0].version + 1) {
            return Err(EventStoreError::Internal(format!(
                "non-contiguous versions {} and {} in one record",
                pair[0].version, pair[1].version
            )));
        }

        let json = serde_json::to_vec(events)?;
        let bytes = if compress { zlib_compress(&json)? } else { json };
        Ok(Self {
            first: head.version,
            last: tail.version,
            compressed: compress,
            kind: RecordKind::Batch,
            events: bytes,
        })
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        self.events.len()
    }

    /// Decode the events held by this record, in stored order.
    pub fn decode(&self) -> Result<Vec<Event>> {
        let inflated;
        let bytes = if self.compressed {
            inflated = zlib_decompress(&self.events)?;
            inflated.as_slice()
        } else {
            self.events.as_slice()
        };

        match self.kind {
            RecordKind::Batch => Ok(serde_json::from_slice(bytes)?),
            RecordKind::Keyed => {
                let entries: Vec<KeyedEntry> = serde_json::from_slice(bytes)?;
                Ok(entries
                    .into_iter()
                    .map(|e| Event::new(e.id, e.value))
                    .collect())
            }
        }
    }
}

/// Union of several records' events: one event per version, the record
/// later in `records` winning a tie, sorted by version.
pub fn merge_records(records: &[StorageRecord]) -> Result<Vec<Event>> {
    let mut by_version = BTreeMap::new();
    for record in records {
        for event in record.decode()? {
            let _ = by_version.insert(event.version, event);
        }
    }
    Ok(by_version.into_values().collect())
}

/// Next version after the highest `last` among `records`, or 0 if none.
pub fn next_version(records: &[RecordSummary]) -> i64 {
    records.iter().map(|r| r.last + 1).max().unwrap_or(0)
}

/// Version of the first event whose position breaks `events[i].version == i`.
pub fn first_gap(events: &[Event]) -> Option<i64> {
    events
        .iter()
        .zip(0_i64..)
        .find(|(event, expected)| event.version != *expected)
        .map(|(_, expected)| expected)
}

/// Zlib-compress `bytes` at the default level.
pub fn zlib_compress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::default());
    encoder
        .write_all(bytes)
        .and_then(|()| encoder.finish())
        .map_err(|e| EventStoreError::Encoding(format!("zlib compress: {e}")))
}

/// Inflate zlib-compressed `bytes`.
pub fn zlib_decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(bytes.len() * 4);
    let _ = ZlibDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(|e| EventStoreError::Encoding(format!("zlib decompress: {e}")))?;
    Ok(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
