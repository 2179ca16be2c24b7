//! Timestamp utilities

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{Error, Result};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp the way it is stored in the database.
///
/// Fixed-width microsecond RFC 3339 so that lexical order in SQLite
/// matches chronological order.
pub fn to_db_string(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub fn from_db_string(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid stored timestamp '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01 00:00:00 UTC
    }

    #[tokio::test]
    async fn test_db_strings_sort_chronologically() {
        let first = now();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = now();

        let a = to_db_string(&first);
        let b = to_db_string(&second);
        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }

    #[test]
    fn test_db_string_parses_back() {
        let ts = now();
        let parsed = from_db_string(&to_db_string(&ts)).unwrap();
        assert_eq!(parsed.timestamp_micros(), ts.timestamp_micros());
    }

    #[test]
    fn test_garbage_timestamp_is_rejected() {
        assert!(from_db_string("yesterday").is_err());
    }
}
