//! Shared utility functions for AQT crates.

/// Date utility functions
pub mod dates {
    use chrono::{Datelike, NaiveDate, NaiveDateTime};

    /// ISO date format used by the PM2.5 CSV tables: "YYYY-MM-DD"
    pub const ISO_FORMAT: &str = "%Y-%m-%d";

    /// Compact date format: "YYYYMMDD"
    pub const COMPACT_FORMAT: &str = "%Y%m%d";

    /// Timestamp format written by spreadsheet exports: "YYYY-MM-DD HH:MM:SS"
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(ISO_FORMAT).to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, ISO_FORMAT)?)
    }

    /// Parse a date string in "YYYYMMDD" format
    pub fn parse_date_compact(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, COMPACT_FORMAT)?)
    }

    /// Parse a date in any of the accepted layouts: ISO, ISO with a time
    /// of day (the time is dropped), or compact.
    pub fn parse_date_any(s: &str) -> anyhow::Result<NaiveDate> {
        let s = s.trim();
        if let Ok(date) = parse_date(s) {
            return Ok(date);
        }
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
            return Ok(timestamp.date());
        }
        parse_date_compact(s)
            .map_err(|_| anyhow::anyhow!("unrecognized date '{}', expected YYYY-MM-DD", s))
    }

    /// Day number in the proleptic Gregorian calendar, 0001-01-01 = day 1.
    ///
    /// Used as the x axis of trend fits, so slopes come out per day.
    pub fn ordinal_day(date: &NaiveDate) -> i64 {
        i64::from(date.num_days_from_ce())
    }

    /// Whole days from `start` to `end` (negative if `end` precedes `start`).
    pub fn days_between(start: &NaiveDate, end: &NaiveDate) -> i64 {
        (*end - *start).num_days()
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        #[test]
        fn test_format_and_parse() {
            let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
            let formatted = format_date(&date);
            assert_eq!(formatted, "2024-06-15");
            let parsed = parse_date(&formatted).unwrap();
            assert_eq!(parsed, date);
        }

        #[test]
        fn test_parse_date_any_layouts() {
            let expected = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
            assert_eq!(parse_date_any("2024-01-31").unwrap(), expected);
            assert_eq!(parse_date_any(" 2024-01-31 ").unwrap(), expected);
            assert_eq!(parse_date_any("2024-01-31 13:45:00").unwrap(), expected);
            assert_eq!(parse_date_any("20240131").unwrap(), expected);
            assert!(parse_date_any("31/01/2024").is_err());
            assert!(parse_date_any("").is_err());
        }

        #[test]
        fn test_ordinal_day() {
            let first = NaiveDate::from_ymd_opt(1, 1, 1).unwrap();
            assert_eq!(ordinal_day(&first), 1);

            let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            let jan2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
            assert_eq!(ordinal_day(&jan2) - ordinal_day(&jan1), 1);
            assert_eq!(ordinal_day(&jan1), 738_886);
        }

        #[test]
        fn test_days_between() {
            let feb28 = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
            let mar1 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
            assert_eq!(days_between(&feb28, &mar1), 2); // leap year
            assert_eq!(days_between(&mar1, &feb28), -2);
        }
    }
}
