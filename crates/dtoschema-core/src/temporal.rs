//! # Temporal Values
//!
//! Defines [`Timestamp`], the runtime representation of a calendar instant
//! carried inside a [`crate::Value`]. Unlike a bare `DateTime<Utc>`, a
//! `Timestamp` can be *invalid*: parsing garbage produces an invalid
//! timestamp rather than an error, and the validation engine is the place
//! that reports it (`"must be a valid date"`).
//!
//! ## Wire Formats
//!
//! - `date`: `YYYY-MM-DD`, always rendered in UTC.
//! - `date-time`: `YYYY-MM-DDTHH:MM:SS.sssZ`, millisecond precision, `Z` suffix.
//!
//! The syntactic checks [`is_iso_date`] and [`is_iso_date_time`] are the
//! format validators shared by the validation engine and the coercion layer.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// A UTC instant that may be invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(Option<DateTime<Utc>>);

impl Timestamp {
    /// Wrap a valid UTC instant.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(Some(dt))
    }

    /// The invalid timestamp.
    pub fn invalid() -> Self {
        Self(None)
    }

    /// Current UTC time.
    pub fn now() -> Self {
        Self(Some(Utc::now()))
    }

    /// Build from milliseconds since the Unix epoch. Out-of-range inputs
    /// produce an invalid timestamp.
    pub fn from_epoch_millis(millis: i64) -> Self {
        Self(DateTime::from_timestamp_millis(millis))
    }

    /// Parse an ISO 8601 string.
    ///
    /// Accepts RFC 3339 date-times (any offset, normalized to UTC) and bare
    /// `YYYY-MM-DD` dates (midnight UTC). Anything else yields an invalid
    /// timestamp; this never fails.
    pub fn parse(s: &str) -> Self {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Self(Some(dt.with_timezone(&Utc)));
        }
        if is_iso_date(s) {
            let midnight = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0));
            if let Some(naive) = midnight {
                return Self(Some(Utc.from_utc_datetime(&naive)));
            }
        }
        Self(None)
    }

    /// Whether the timestamp denotes a real instant.
    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    /// Access the inner instant, if valid.
    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        self.0.as_ref()
    }

    /// Milliseconds since the Unix epoch, if valid.
    pub fn epoch_millis(&self) -> Option<i64> {
        self.0.map(|dt| dt.timestamp_millis())
    }

    /// Render as `YYYY-MM-DDTHH:MM:SS.sssZ`, if valid.
    pub fn to_iso8601(&self) -> Option<String> {
        self.0
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
    }

    /// Render the UTC calendar date as `YYYY-MM-DD`, if valid.
    pub fn to_date_string(&self) -> Option<String> {
        self.0.map(|dt| dt.format("%Y-%m-%d").to_string())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_utc(dt)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_iso8601() {
            Some(iso) => f.write_str(&iso),
            None => f.write_str("invalid timestamp"),
        }
    }
}

/// Whether `s` is a syntactically valid `YYYY-MM-DD` calendar date.
///
/// Exactly ten characters with zero-padded fields; the date must exist
/// (`2023-02-30` is rejected).
pub fn is_iso_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    digits_ok && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Whether `s` is an RFC 3339 date-time with a time component and zone.
pub fn is_iso_date_time(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
}
