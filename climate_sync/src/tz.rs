//! Timestamp helpers.
//!
//! All database writes are RFC-3339 UTC strings with millisecond precision.
//! One timestamp is taken per ingestion run and stamped on every row the run
//! writes, so rows touched together compare equal.

use chrono::{DateTime, Utc};

/// Format a UTC datetime as an RFC-3339 string with millisecond precision.
pub fn to_rfc3339_millis(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Current time in the storage format.
pub fn now_rfc3339() -> String {
    to_rfc3339_millis(Utc::now())
}
