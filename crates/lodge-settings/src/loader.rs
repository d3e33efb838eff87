//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`LodgeSettings::default()`]
//! 2. If `~/.lodge/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `LODGE_*` environment variable overrides
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::LodgeSettings;

/// Resolve the path to the settings file (`~/.lodge/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".lodge").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<LodgeSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; a file with invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<LodgeSettings> {
    load_with_env(path, |name| std::env::var(name).ok())
}

fn load_with_env<F>(path: &Path, env: F) -> Result<LodgeSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = serde_json::to_value(LodgeSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: LodgeSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, env);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `LODGE_*` overrides read through `env`.
///
/// Integers must parse and fall within range; booleans accept
/// `true`/`1`/`yes`/`on` and `false`/`0`/`no`/`off`. Anything else is
/// ignored with a warning.
pub fn apply_env_overrides<F>(settings: &mut LodgeSettings, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let reader = EnvReader { env };

    // ── Consolidation ───────────────────────────────────────────────
    if let Some(v) = reader.usize("LODGE_CONSOLIDATE_NUM_RECORDS", 2, 10_000) {
        settings.consolidation.num_records = v;
    }
    if let Some(v) = reader.usize("LODGE_CONSOLIDATE_MAX_SIZE", 1024, 64 * 1024 * 1024) {
        settings.consolidation.max_size = v;
    }
    if let Some(v) = reader.bool("LODGE_CONSOLIDATE_COMPRESS") {
        settings.consolidation.compress = v;
    }

    // ── Cache ───────────────────────────────────────────────────────
    if let Some(v) = reader.bool("LODGE_CACHE_ENABLED") {
        settings.cache.enabled = v;
    }
    if let Some(v) = reader.u64("LODGE_CACHE_EXPIRATION_SECS", 1, 86_400) {
        settings.cache.expiration_secs = v;
    }

    // ── Database / logging ──────────────────────────────────────────
    if let Some(v) = reader.string("LODGE_DB_PATH") {
        settings.database.path = v;
    }
    if let Some(v) = reader.u64("LODGE_DB_POOL_SIZE", 1, 256) {
        settings.database.pool_size = u32::try_from(v).unwrap_or(settings.database.pool_size);
    }
    if let Some(v) = reader.string("LODGE_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

/// Parse a boolean env value.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `usize` within an inclusive range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

// ── Env readers ─────────────────────────────────────────────────────────────

struct EnvReader<F> {
    env: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.env)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        self.parsed(name, "boolean", parse_bool)
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        self.parsed(name, "integer", |v| parse_u64_range(v, min, max))
    }

    fn usize(&self, name: &str, min: usize, max: usize) -> Option<usize> {
        self.parsed(name, "integer", |v| parse_usize_range(v, min, max))
    }

    fn parsed<T>(&self, name: &str, kind: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        let val = (self.env)(name)?;
        let result = parse(&val);
        if result.is_none() {
            warn!(key = name, value = %val, kind, "invalid env var, ignoring");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::errors::SettingsError;
    use assert_matches::assert_matches;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"cache": {"enabled": true, "expirationSecs": 300}});
        let source = serde_json::json!({"cache": {"expirationSecs": 60}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["cache"]["expirationSecs"], 60);
        assert_eq!(merged["cache"]["enabled"], true);
    }

    #[test]
    fn merge_skips_null() {
        let target = serde_json::json!({"a": 1});
        let merged = deep_merge(target, serde_json::json!({"a": null}));
        assert_eq!(merged["a"], 1);
    }

    #[test]
    fn merge_replaces_arrays() {
        let target = serde_json::json!({"a": [1, 2, 3]});
        let merged = deep_merge(target, serde_json::json!({"a": [9]}));
        assert_eq!(merged["a"], serde_json::json!([9]));
    }

    // ── file loading ────────────────────────────────────────────────

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_with_env(&dir.path().join("absent.json"), env_of(&[])).unwrap();
        assert_eq!(settings, LodgeSettings::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"consolidation": {"numRecords": 20, "compress": false}}"#,
        )
        .unwrap();

        let settings = load_with_env(&path, env_of(&[])).unwrap();
        assert_eq!(settings.consolidation.num_records, 20);
        assert!(!settings.consolidation.compress);
        assert_eq!(settings.consolidation.max_size, 943_719);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_matches!(load_with_env(&path, env_of(&[])), Err(SettingsError::Json(_)));
    }

    #[test]
    fn invalid_combination_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"database": {"poolSize": 0}}"#).unwrap();
        assert_matches!(
            load_with_env(&path, env_of(&[])),
            Err(SettingsError::InvalidValue(_))
        );
    }

    // ── env overrides ───────────────────────────────────────────────

    #[test]
    fn env_beats_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"consolidation": {"numRecords": 20}}"#).unwrap();

        let settings = load_with_env(
            &path,
            env_of(&[
                ("LODGE_CONSOLIDATE_NUM_RECORDS", "10"),
                ("LODGE_CONSOLIDATE_MAX_SIZE", "4096"),
                ("LODGE_CONSOLIDATE_COMPRESS", "off"),
                ("LODGE_CACHE_EXPIRATION_SECS", "60"),
                ("LODGE_DB_PATH", "/data/lodge.db"),
                ("LODGE_DB_POOL_SIZE", "4"),
                ("LODGE_LOG_LEVEL", "lodge_events=debug"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.consolidation.num_records, 10);
        assert_eq!(settings.consolidation.max_size, 4096);
        assert!(!settings.consolidation.compress);
        assert_eq!(settings.cache.expiration_secs, 60);
        assert_eq!(settings.database.path, "/data/lodge.db");
        assert_eq!(settings.database.pool_size, 4);
        assert_eq!(settings.logging.level, "lodge_events=debug");
    }

    #[test]
    fn out_of_range_env_is_ignored() {
        let mut settings = LodgeSettings::default();
        apply_env_overrides(
            &mut settings,
            env_of(&[
                ("LODGE_CONSOLIDATE_NUM_RECORDS", "1"),
                ("LODGE_CACHE_ENABLED", "maybe"),
                ("LODGE_DB_PATH", ""),
            ]),
        );
        assert_eq!(settings, LodgeSettings::default());
    }

    #[test]
    fn parse_helpers() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("2"), None);
        assert_eq!(parse_u64_range("60", 1, 86_400), Some(60));
        assert_eq!(parse_u64_range("0", 1, 86_400), None);
        assert_eq!(parse_usize_range("abc", 0, 10), None);
    }
}
