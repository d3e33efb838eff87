use serde::{Deserialize, Serialize};

/// Upper bound for a single stored value in the storage and cache
/// backends, minus a 10% margin for envelope overhead.
pub const DEFAULT_MAX_RECORD_SIZE: usize = 1_048_576 - 104_857;

/// When and how small storage records are merged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsolidationSettings {
    /// Number of qualifying records that triggers a merge.
    pub num_records: usize,
    /// Records at or above this encoded size are left alone.
    pub max_size: usize,
    /// Zlib-compress merged records.
    pub compress: bool,
}

impl Default for ConsolidationSettings {
    fn default() -> Self {
        Self {
            num_records: 5,
            max_size: DEFAULT_MAX_RECORD_SIZE,
            compress: true,
        }
    }
}

/// Version-stamped cache settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// When false, every read recomputes from the event log.
    pub enabled: bool,
    /// Per-entry expiration.
    pub expiration_secs: u64,
    /// Values larger than this are zlib-compressed before storing.
    pub compress_threshold: usize,
    /// Values still larger than this after compression are refused.
    pub max_entry_size: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            expiration_secs: 300,
            compress_threshold: 1024,
            max_entry_size: DEFAULT_MAX_RECORD_SIZE,
        }
    }
}
