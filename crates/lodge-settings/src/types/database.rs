use serde::{Deserialize, Serialize};

/// `SQLite` database settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// Database file path. A leading `~/` expands to `$HOME`.
    pub path: String,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// How long a writer waits on a locked database.
    pub busy_timeout_ms: u32,
    /// Page cache size per connection in KiB.
    pub cache_size_kib: i64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "~/.lodge/events.db".to_string(),
            pool_size: 16,
            busy_timeout_ms: 30_000,
            cache_size_kib: 8192,
        }
    }
}

impl DatabaseSettings {
    /// Path with `~/` expanded against `$HOME`.
    pub fn resolved_path(&self) -> String {
        match self.path.strip_prefix("~/") {
            Some(rest) => {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                format!("{home}/{rest}")
            }
            None => self.path.clone(),
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_path_is_untouched() {
        let settings = DatabaseSettings {
            path: "/var/lib/lodge.db".into(),
            ..DatabaseSettings::default()
        };
        assert_eq!(settings.resolved_path(), "/var/lib/lodge.db");
    }

    #[test]
    fn tilde_expands() {
        let resolved = DatabaseSettings::default().resolved_path();
        assert!(!resolved.starts_with('~'));
        assert!(resolved.ends_with("/.lodge/events.db"));
    }
}
