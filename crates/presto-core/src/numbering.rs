//! # Transaction Numbering
//!
//! Formatting for the sequential, per-store, per-day display identifier:
//! `TRX-<YYYYMMDD>-<seq>`.
//!
//! ## Collision Policy
//! Transaction numbers are advisory display identifiers, not primary keys.
//! The real key is a UUID generated separately, so a collision (possible
//! under the fallback scheme, or when two checkouts race the daily count)
//! can never corrupt transaction identity.
//!
//! The count query itself lives in the engine layer; this module is the
//! pure formatting half, including the time-derived fallback used when the
//! count cannot be read - checkout must not abort just because a counter
//! query failed.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

/// Prefix shared by all transaction numbers.
pub const TRANSACTION_NUMBER_PREFIX: &str = "TRX";

/// Formats a sequential transaction number for a calendar day.
///
/// `sequence` is 1-based: the first sale of the day is `-001`. The field is
/// zero-padded to three digits and simply grows wider past 999.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use presto_core::numbering::transaction_number;
///
/// let day = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
/// assert_eq!(transaction_number(day, 1), "TRX-20260806-001");
/// assert_eq!(transaction_number(day, 42), "TRX-20260806-042");
/// ```
pub fn transaction_number(day: NaiveDate, sequence: u32) -> String {
    format!(
        "{}-{:04}{:02}{:02}-{:03}",
        TRANSACTION_NUMBER_PREFIX,
        day.year(),
        day.month(),
        day.day(),
        sequence
    )
}

/// Fallback number used when the daily count query fails.
///
/// Keeps the date prefix and substitutes a time-derived suffix
/// (`HHMMSS` + milliseconds) that is unique with high probability within a
/// store, so checkout proceeds instead of aborting on a counter fault.
pub fn fallback_transaction_number(now: DateTime<Utc>) -> String {
    format!(
        "{}-{:04}{:02}{:02}-{:02}{:02}{:02}{:03}",
        TRANSACTION_NUMBER_PREFIX,
        now.year(),
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        now.timestamp_subsec_millis().min(999)
    )
}

/// UTC bounds of the calendar day containing `now`: `[00:00:00.000, 23:59:59.999]`.
///
/// Used by the daily count and the today-summary queries.
pub fn day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let day = now.date_naive();
    let start = day
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc();
    let end = day
        .and_hms_milli_opt(23, 59, 59, 999)
        .expect("end of day is always valid")
        .and_utc();
    (start, end)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sequential_format() {
        let day = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert_eq!(transaction_number(day, 1), "TRX-20260806-001");
        assert_eq!(transaction_number(day, 999), "TRX-20260806-999");
        // grows past three digits instead of wrapping
        assert_eq!(transaction_number(day, 1000), "TRX-20260806-1000");
    }

    #[test]
    fn test_single_digit_month_and_day_padded() {
        let day = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        assert_eq!(transaction_number(day, 7), "TRX-20260103-007");
    }

    #[test]
    fn test_fallback_keeps_date_prefix() {
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 14, 35, 12).unwrap();
        let number = fallback_transaction_number(now);
        assert!(number.starts_with("TRX-20260806-"));
        assert_eq!(number, "TRX-20260806-143512000");
    }

    #[test]
    fn test_day_bounds_cover_whole_day() {
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 14, 35, 12).unwrap();
        let (start, end) = day_bounds(now);

        assert_eq!(start.to_rfc3339(), "2026-08-06T00:00:00+00:00");
        assert!(start <= now && now <= end);
        assert_eq!(end.date_naive(), now.date_naive());
        assert_eq!((end.hour(), end.minute(), end.second()), (23, 59, 59));
    }
}
