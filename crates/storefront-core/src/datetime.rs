//! # Date/Time Formatting
//!
//! Every timestamp written to or compared against the database goes through
//! this module, so stored values and query cutoffs share one format and one
//! timezone (UTC).
//!
//! ## Storage Format
//! ```text
//! 2026-10-19 08:30:00
//! └─ YYYY-MM-DD HH:MM:SS, whole seconds, no offset
//! ```
//!
//! Values in this format sort lexicographically in time order, which is what
//! lets SQLite compare them as plain TEXT.

use chrono::{Duration, NaiveDateTime, SubsecRound, Utc};

use crate::error::ValidationError;

/// Storage format for timestamps.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(0)
}

/// Formats a timestamp in the storage format.
pub fn format_datetime(value: NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

/// Parses a timestamp in the storage format.
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime, ValidationError> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT).map_err(|e| {
        ValidationError::InvalidFormat {
            field: "datetime".to_string(),
            reason: e.to_string(),
        }
    })
}

/// The instant `days` whole days before `from`.
pub fn days_before(from: NaiveDateTime, days: u32) -> NaiveDateTime {
    from - Duration::days(i64::from(days))
}

/// Formatted cutoff `days` days before `from`.
///
/// ## Example
/// ```rust
/// use storefront_core::datetime::{cutoff_days_before, now, parse_datetime};
///
/// let cutoff = cutoff_days_before(now(), 30);
/// assert!(parse_datetime(&cutoff).is_ok());
/// ```
pub fn cutoff_days_before(from: NaiveDateTime, days: u32) -> String {
    format_datetime(days_before(from, days))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_and_parse() {
        let value = parse_datetime("2026-10-19 08:30:00").unwrap();
        assert_eq!(format_datetime(value), "2026-10-19 08:30:00");
    }

    #[test]
    fn test_parse_rejects_other_formats() {
        assert!(parse_datetime("2026-10-19T08:30:00Z").is_err());
        assert!(parse_datetime("19/10/2026").is_err());
        assert!(parse_datetime("").is_err());
    }

    #[test]
    fn test_days_before_crosses_month() {
        let from = parse_datetime("2026-03-02 12:00:00").unwrap();
        let cutoff = days_before(from, 2);
        assert_eq!(format_datetime(cutoff), "2026-02-28 12:00:00");
    }

    #[test]
    fn test_zero_days_is_identity() {
        let from = parse_datetime("2026-10-19 08:30:00").unwrap();
        assert_eq!(days_before(from, 0), from);
    }

    #[test]
    fn test_now_has_no_fraction() {
        let formatted = format_datetime(now());
        assert_eq!(formatted.len(), 19);
    }

    #[test]
    fn test_storage_format_sorts_in_time_order() {
        let earlier = format_datetime(parse_datetime("2026-09-30 23:59:59").unwrap());
        let later = format_datetime(parse_datetime("2026-10-01 00:00:00").unwrap());
        assert!(earlier < later);
    }
}
