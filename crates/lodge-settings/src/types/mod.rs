//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a partial
//! JSON document fills the gaps from [`Default`].

mod database;
mod store;

pub use database::*;
pub use store::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "consolidation": { "numRecords": 10, "compress": false },
///   "cache": { "expirationSecs": 60 }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LodgeSettings {
    /// Storage-record consolidation policy.
    pub consolidation: ConsolidationSettings,
    /// Version-stamped cache settings.
    pub cache: CacheSettings,
    /// `SQLite` location and pool tuning.
    pub database: DatabaseSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl LodgeSettings {
    /// Reject combinations the store cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.consolidation.num_records < 2 {
            return Err(SettingsError::InvalidValue(format!(
                "consolidation.numRecords must be at least 2, got {}",
                self.consolidation.num_records
            )));
        }
        if self.consolidation.max_size == 0 {
            return Err(SettingsError::InvalidValue(
                "consolidation.maxSize must be positive".into(),
            ));
        }
        if self.cache.compress_threshold > self.cache.max_entry_size {
            return Err(SettingsError::InvalidValue(format!(
                "cache.compressThreshold ({}) exceeds cache.maxEntrySize ({})",
                self.cache.compress_threshold, self.cache.max_entry_size
            )));
        }
        if self.database.pool_size == 0 {
            return Err(SettingsError::InvalidValue(
                "database.poolSize must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults_validate() {
        LodgeSettings::default().validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: LodgeSettings =
            serde_json::from_str(r#"{"consolidation": {"numRecords": 20}}"#).unwrap();
        assert_eq!(settings.consolidation.num_records, 20);
        assert!(settings.consolidation.compress);
        assert_eq!(settings.cache.expiration_secs, 300);
    }

    #[test]
    fn camel_case_wire_names() {
        let json = serde_json::to_value(LodgeSettings::default()).unwrap();
        assert_eq!(json["consolidation"]["maxSize"], 943_719);
        assert_eq!(json["cache"]["compressThreshold"], 1024);
        assert_eq!(json["database"]["busyTimeoutMs"], 30_000);
    }

    #[test]
    fn rejects_single_record_consolidation() {
        let mut settings = LodgeSettings::default();
        settings.consolidation.num_records = 1;
        assert_matches!(settings.validate(), Err(SettingsError::InvalidValue(_)));
    }

    #[test]
    fn rejects_threshold_above_entry_limit() {
        let mut settings = LodgeSettings::default();
        settings.cache.compress_threshold = settings.cache.max_entry_size + 1;
        assert_matches!(settings.validate(), Err(SettingsError::InvalidValue(_)));
    }
}
