use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lodge_core::{AggregateId, IncarnationId};
use lodge_settings::CacheSettings;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::backend::{CacheBackend, MemoryCacheBackend};
use crate::codec::{zlib_compress, zlib_decompress};
use crate::errors::CacheError;

/// Envelope stored in the backend for every cached value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Incarnation of the aggregate the value was computed from.
    pub incarnation: IncarnationId,
    /// Aggregate version the value was computed at.
    pub version: i64,
    /// Whether `value` is zlib-compressed.
    pub compressed: bool,
    /// The cached bytes, base64 on the wire.
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// Result of [`VersionCache::read`]: the newest version found for the
/// requested incarnation and the values stamped with exactly that version.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheSnapshot {
    /// Highest version among the entries found, 0 when none were.
    pub version: i64,
    entries: HashMap<String, Vec<u8>>,
}

impl CacheSnapshot {
    /// Value for `key`, if it was present at [`Self::version`].
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Whether `key` was present at [`Self::version`].
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Move the value for `key` out of the snapshot.
    pub fn take(&mut self, key: &str) -> Option<Vec<u8>> {
        self.entries.remove(key)
    }

    /// Number of values held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no value was found.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Write-through byte cache keyed by (aggregate, resource), each value
/// stamped with the incarnation and version it was computed at.
pub struct VersionCache {
    backend: Arc<dyn CacheBackend>,
    enabled: bool,
    ttl: Duration,
    compress_threshold: usize,
    max_entry_size: usize,
}

impl std::fmt::Debug for VersionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionCache")
            .field("enabled", &self.enabled)
            .field("ttl", &self.ttl)
            .field("compress_threshold", &self.compress_threshold)
            .field("max_entry_size", &self.max_entry_size)
            .finish_non_exhaustive()
    }
}

impl VersionCache {
    /// Wrap `backend` with the given settings.
    pub fn new(backend: Arc<dyn CacheBackend>, settings: &CacheSettings) -> Self {
        Self {
            backend,
            enabled: settings.enabled,
            ttl: Duration::from_secs(settings.expiration_secs),
            compress_threshold: settings.compress_threshold,
            max_entry_size: settings.max_entry_size,
        }
    }

    /// In-process cache configured from `settings`.
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(Arc::new(MemoryCacheBackend::new()), settings)
    }

    /// In-process cache with default settings.
    pub fn in_memory() -> Self {
        Self::from_settings(&CacheSettings::default())
    }

    /// A cache that stores nothing; every read is a miss.
    pub fn disabled() -> Self {
        let settings = CacheSettings {
            enabled: false,
            ..CacheSettings::default()
        };
        Self::from_settings(&settings)
    }

    /// Whether reads can ever hit.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn full_key(id: &AggregateId, key: &str) -> String {
        format!("{id}_{key}")
    }

    /// Store `value` for (`id`, `key`) stamped with `incarnation` and
    /// `version`, replacing any previous entry.
    pub fn write(
        &self,
        id: &AggregateId,
        incarnation: &IncarnationId,
        version: i64,
        key: &str,
        value: &[u8],
    ) -> Result<(), CacheError> {
        if !self.enabled {
            return Ok(());
        }
        let full_key = Self::full_key(id, key);

        let (compressed, stored) = if value.len() > self.compress_threshold {
            let packed =
                zlib_compress(value).map_err(|e| CacheError::Encoding(e.to_string()))?;
            (true, packed)
        } else {
            (false, value.to_vec())
        };
        if stored.len() > self.max_entry_size {
            return Err(CacheError::TooLarge {
                key: full_key,
                size: stored.len(),
            });
        }

        let record = CacheRecord {
            incarnation: incarnation.clone(),
            version,
            compressed,
            value: stored,
        };
        let bytes = serde_json::to_vec(&record).map_err(|e| CacheError::Encoding(e.to_string()))?;
        self.backend.set(&full_key, &bytes, self.ttl)?;
        debug!(key = %full_key, version, compressed, "cache write");
        Ok(())
    }

    /// Fetch `keys` for `id`.
    ///
    /// Only entries stamped with `incarnation` count. The snapshot's version
    /// is the highest version among those; entries stamped with a lower
    /// version are left out. Entries that fail to decode are skipped with a
    /// warning.
    pub fn read(
        &self,
        id: &AggregateId,
        incarnation: &IncarnationId,
        keys: &[&str],
    ) -> Result<CacheSnapshot, CacheError> {
        if !self.enabled || keys.is_empty() {
            return Ok(CacheSnapshot::default());
        }

        let full_keys: Vec<String> = keys.iter().map(|k| Self::full_key(id, k)).collect();
        let found = self.backend.get_multi(&full_keys)?;

        let mut records = Vec::with_capacity(found.len());
        for (key, full_key) in keys.iter().zip(&full_keys) {
            let Some(bytes) = found.get(full_key) else {
                continue;
            };
            match serde_json::from_slice::<CacheRecord>(bytes) {
                Ok(record) if record.incarnation == *incarnation => {
                    records.push(((*key).to_owned(), record));
                }
                Ok(record) => debug!(
                    key = %full_key,
                    cached = %record.incarnation,
                    %incarnation,
                    "skipping entry from another incarnation"
                ),
                Err(e) => warn!(key = %full_key, error = %e, "skipping undecodable cache entry"),
            }
        }

        let version = records.iter().map(|(_, r)| r.version).max().unwrap_or(0);
        let mut entries = HashMap::with_capacity(records.len());
        for (key, record) in records {
            if record.version != version {
                continue;
            }
            let value = if record.compressed {
                match zlib_decompress(&record.value) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(%key, error = %e, "skipping corrupt cache entry");
                        continue;
                    }
                }
            } else {
                record.value
            };
            let _ = entries.insert(key, value);
        }

        Ok(CacheSnapshot { version, entries })
    }

    /// Remove the entry for (`id`, `key`).
    pub fn delete(&self, id: &AggregateId, key: &str) -> Result<(), CacheError> {
        if !self.enabled {
            return Ok(());
        }
        self.backend.delete(&Self::full_key(id, key))
    }

    /// Remove every listed entry, attempting all of them; returns the first
    /// failure.
    pub fn delete_many(&self, id: &AggregateId, keys: &[&str]) -> Result<(), CacheError> {
        let mut first_err = None;
        for key in keys {
            if let Err(e) = self.delete(id, key) {
                let _ = first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
