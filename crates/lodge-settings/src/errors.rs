//! Settings error types.

use thiserror::Error;

/// Errors that can occur when loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the settings file from disk.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse JSON in the settings file.
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A settings value was invalid (e.g., out of range).
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_display() {
        let err = SettingsError::InvalidValue("consolidation.numRecords must be >= 2".into());
        assert_eq!(
            err.to_string(),
            "invalid settings value: consolidation.numRecords must be >= 2"
        );
    }

    #[test]
    fn from_serde_error() {
        let serde_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: SettingsError = serde_err.into();
        assert!(matches!(err, SettingsError::Json(_)));
    }
}
