//! Date/time utilities for FileVault.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Timestamp format used by SQLite's `datetime('now')`.
pub const SQLITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time in SQLite format.
pub fn now_sqlite() -> String {
    Utc::now().format(SQLITE_FORMAT).to_string()
}

/// Convert a database datetime string (YYYY-MM-DD HH:MM:SS) to RFC3339 format.
///
/// The database stores times in UTC, so the result carries a `Z` suffix.
/// Strings that are already RFC3339 are normalized to UTC; anything else is
/// returned unchanged.
pub fn to_rfc3339(datetime_str: &str) -> String {
    if let Ok(naive) = NaiveDateTime::parse_from_str(datetime_str, SQLITE_FORMAT) {
        return format!("{}Z", naive.format("%Y-%m-%dT%H:%M:%S"));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(datetime_str) {
        return dt
            .with_timezone(&Utc)
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();
    }
    datetime_str.to_string()
}
