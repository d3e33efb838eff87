//! Timestamp helpers.

use chrono::{SecondsFormat, Utc};

/// Current UTC time as RFC 3339 with millisecond precision
/// (e.g. `2026-03-01T12:00:00.000Z`).
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_back_as_rfc3339() {
        let ts = now_rfc3339();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
