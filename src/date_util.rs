//! Date and timezone helpers shared by the parser and crawl loop.
//!
//! Grounded on `original_source/src/utils/date_utils.py`.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Parses the CLI's `YYYY_M_D` date format (e.g. `2021_9_1`). No
/// leading-zero padding is required.
pub fn parse_cli_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.trim().split('_');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses the platform's `created_at` timestamp format
/// (`Day Mon DD HH:MM:SS +0000 YYYY`) and normalizes to UTC.
pub fn parse_x_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let parsed = DateTime::parse_from_str(raw, "%a %b %d %H:%M:%S %z %Y").ok()?;
    Some(parsed.with_timezone(&Utc))
}

/// Converts a UTC instant to a local calendar date in the given IANA
/// timezone.
pub fn to_local_date(ts_utc: DateTime<Utc>, tz: Tz) -> NaiveDate {
    tz.from_utc_datetime(&ts_utc.naive_utc()).date_naive()
}

/// Inclusive date-range check in the given local timezone.
pub fn in_date_range(ts_utc: DateTime<Utc>, start: NaiveDate, end: NaiveDate, tz: Tz) -> bool {
    let local_day = to_local_date(ts_utc, tz);
    start <= local_day && local_day <= end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cli_date_without_padding() {
        assert_eq!(
            parse_cli_date("2021_9_1"),
            Some(NaiveDate::from_ymd_opt(2021, 9, 1).unwrap())
        );
    }

    #[test]
    fn rejects_malformed_cli_date() {
        assert_eq!(parse_cli_date("2021-09-01"), None);
        assert_eq!(parse_cli_date("2021_9"), None);
        assert_eq!(parse_cli_date("2021_13_1"), None);
    }

    #[test]
    fn parses_x_created_at_as_utc() {
        let parsed = parse_x_created_at("Wed Sep 01 01:30:00 +0000 2021").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2021-09-01T01:30:00+00:00");
    }

    #[test]
    fn local_date_conversion_shifts_day_in_shanghai() {
        // 2021-09-01T23:00:00Z is 2021-09-02 in Asia/Shanghai (+08:00).
        let ts = parse_x_created_at("Wed Sep 01 23:00:00 +0000 2021").unwrap();
        let tz: Tz = "Asia/Shanghai".parse().unwrap();
        assert_eq!(to_local_date(ts, tz), NaiveDate::from_ymd_opt(2021, 9, 2).unwrap());
    }

    #[test]
    fn in_date_range_is_inclusive() {
        let tz: Tz = "Asia/Shanghai".parse().unwrap();
        let start = NaiveDate::from_ymd_opt(2021, 9, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2021, 9, 30).unwrap();
        let inside = parse_x_created_at("Wed Sep 01 01:00:00 +0000 2021").unwrap();
        let before = parse_x_created_at("Tue Aug 31 10:00:00 +0000 2021").unwrap();
        assert!(in_date_range(inside, start, end, tz));
        assert!(!in_date_range(before, start, end, tz));
    }
}
