//! Time helpers for query filters, statistics and exports
//!
//! Storage uses UTC epoch milliseconds; the API accepts plain dates
//! ("YYYY-MM-DD") for range filters.

use chrono::{Duration, NaiveDate, TimeZone, Utc};

/// Parse "YYYY-MM-DD" into the first millisecond of that UTC day
pub fn parse_date_start(value: &str) -> Option<i64> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let dt = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&dt).timestamp_millis())
}

/// Parse "YYYY-MM-DD" into the last millisecond of that UTC day
pub fn parse_date_end(value: &str) -> Option<i64> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let dt = date.and_hms_milli_opt(23, 59, 59, 999)?;
    Some(Utc.from_utc_datetime(&dt).timestamp_millis())
}

/// First millisecond of the current UTC day
pub fn start_of_today() -> i64 {
    let now = Utc::now();
    let dt = now.date_naive().and_hms_opt(0, 0, 0).expect("valid midnight");
    Utc.from_utc_datetime(&dt).timestamp_millis()
}

/// Timestamp `days` days before now
pub fn days_ago_millis(days: i64) -> i64 {
    (Utc::now() - Duration::days(days)).timestamp_millis()
}

/// Format a millisecond timestamp as "YYYY-MM-DD"
pub fn format_date(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Format a millisecond timestamp as "YYYY-MM-DD HH:MM"
pub fn format_datetime(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_range() {
        let start = parse_date_start("2025-03-10").unwrap();
        let end = parse_date_end("2025-03-10").unwrap();
        assert!(start < end);
        // Exactly one day minus one millisecond apart
        assert_eq!(end - start, 24 * 60 * 60 * 1000 - 1);
    }

    #[test]
    fn test_parse_invalid_date() {
        assert!(parse_date_start("not-a-date").is_none());
        assert!(parse_date_end("2025-13-40").is_none());
    }

    #[test]
    fn test_format_date_round_trip() {
        let millis = parse_date_start("2025-03-10").unwrap();
        assert_eq!(format_date(millis), "2025-03-10");
    }
}
