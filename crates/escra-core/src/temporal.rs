//! # Temporal Types — UTC-Only Timestamps
//!
//! Defines [`Timestamp`], a UTC-only timestamp truncated to seconds
//! precision. Every `created_at`/`submitted_at`/`resolved_at` column in
//! the stack uses this type, which keeps timeline reconstruction
//! (sorting heterogeneous entity timestamps) deterministic.
//!
//! Non-UTC inputs are rejected at construction — there is no silent
//! conversion that could reorder a reconstructed timeline.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A UTC-only timestamp, truncated to seconds precision.
///
/// # Construction
///
/// - [`Timestamp::now()`] — current UTC time, truncated.
/// - [`Timestamp::from_utc()`] — from a `DateTime<Utc>`, truncating sub-seconds.
/// - [`Timestamp::parse()`] — from an RFC 3339 string, rejecting non-UTC offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from the current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse a timestamp from an RFC 3339 string.
    ///
    /// Only timestamps with the `Z` suffix are accepted. Explicit offsets
    /// like `+05:00` — and even `+00:00` — are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTimestamp`] if the string is not valid
    /// RFC 3339 or uses a non-Z timezone offset.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if !s.ends_with('Z') {
            return Err(CoreError::InvalidTimestamp(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| CoreError::InvalidTimestamp(format!("{s:?}: {e}")))?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Create a timestamp from a Unix epoch timestamp (seconds).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTimestamp`] for out-of-range values.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, CoreError> {
        let dt = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| CoreError::InvalidTimestamp(format!("epoch seconds: {secs}")))?;
        Ok(Self(dt))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// The Unix epoch timestamp in seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Whole days elapsed from this timestamp to `later`.
    ///
    /// Returns zero if `later` precedes this timestamp. Used by the
    /// dispute auto-resolution window check.
    pub fn days_until(&self, later: Timestamp) -> i64 {
        (later.0 - self.0).num_days().max(0)
    }

    /// This timestamp shifted backwards by the given number of days.
    pub fn minus_days(&self, days: i64) -> Timestamp {
        Self(self.0 - Duration::days(days))
    }

    /// Render as ISO 8601 with Z suffix (e.g. `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// Truncate a `DateTime<Utc>` to seconds precision (discard nanoseconds).
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn from_utc_truncates() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 45).unwrap();
        let with_nanos = dt.with_nanosecond(123_456_789).unwrap();
        let ts = Timestamp::from_utc(with_nanos);
        assert_eq!(ts.to_iso8601(), "2026-03-01T09:30:45Z");
    }

    #[test]
    fn parse_z_suffix_accepted() {
        let ts = Timestamp::parse("2026-03-01T09:00:00Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2026-03-01T09:00:00Z");
    }

    #[test]
    fn parse_offsets_rejected() {
        assert!(Timestamp::parse("2026-03-01T09:00:00+00:00").is_err());
        assert!(Timestamp::parse("2026-03-01T14:00:00+05:00").is_err());
        assert!(Timestamp::parse("2026-03-01T05:00:00-04:00").is_err());
    }

    #[test]
    fn parse_invalid_format() {
        assert!(Timestamp::parse("not-a-date").is_err());
        assert!(Timestamp::parse("2026-03-01").is_err());
        assert!(Timestamp::parse("").is_err());
    }

    #[test]
    fn parse_subseconds_truncated() {
        let ts = Timestamp::parse("2026-03-01T09:00:00.987654Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2026-03-01T09:00:00Z");
    }

    #[test]
    fn epoch_roundtrip() {
        let ts = Timestamp::parse("2026-03-01T09:00:00Z").unwrap();
        assert_eq!(Timestamp::from_epoch_secs(ts.epoch_secs()).unwrap(), ts);
    }

    #[test]
    fn ordering() {
        let earlier = Timestamp::parse("2026-03-01T09:00:00Z").unwrap();
        let later = Timestamp::parse("2026-03-01T09:00:01Z").unwrap();
        assert!(earlier < later);
    }

    #[test]
    fn days_until_counts_whole_days() {
        let filed = Timestamp::parse("2026-03-01T09:00:00Z").unwrap();
        let now = Timestamp::parse("2026-03-09T08:59:59Z").unwrap();
        assert_eq!(filed.days_until(now), 7);
        let now = Timestamp::parse("2026-03-09T09:00:00Z").unwrap();
        assert_eq!(filed.days_until(now), 8);
    }

    #[test]
    fn days_until_clamps_negative() {
        let later = Timestamp::parse("2026-03-09T09:00:00Z").unwrap();
        let earlier = Timestamp::parse("2026-03-01T09:00:00Z").unwrap();
        assert_eq!(later.days_until(earlier), 0);
    }

    #[test]
    fn minus_days_shifts_backwards() {
        let ts = Timestamp::parse("2026-03-09T09:00:00Z").unwrap();
        assert_eq!(ts.minus_days(8).to_iso8601(), "2026-03-01T09:00:00Z");
    }

    #[test]
    fn serde_roundtrip() {
        let ts = Timestamp::parse("2026-03-01T09:00:00Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn display_matches_iso8601() {
        let dt = Utc.with_ymd_and_hms(2026, 6, 30, 23, 59, 59).unwrap();
        let ts = Timestamp::from_utc(dt);
        assert_eq!(format!("{ts}"), ts.to_iso8601());
    }
}
