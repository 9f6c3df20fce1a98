//! Round-trip timestamp formatting for the `time` attribute.
//!
//! The wire format is ISO-8601 in UTC with exactly seven fractional digits
//! (`2024-01-01T00:00:00.0000000Z`), i.e. 100ns ticks.

use chrono::{DateTime, Timelike, Utc};

/// Render an instant in the round-trip wire format.
pub fn format_round_trip(instant: &DateTime<Utc>) -> String {
    let ticks = instant.nanosecond() % 1_000_000_000 / 100;
    format!("{}.{:07}Z", instant.format("%Y-%m-%dT%H:%M:%S"), ticks)
}

/// Parse an ISO-8601 / RFC 3339 timestamp into UTC.
///
/// Accepts any fractional precision and any offset.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
