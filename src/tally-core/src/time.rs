//! Timestamp parsing and calendar-month arithmetic.
//!
//! Timestamps are naive wall-clock instants stored as milliseconds in Arrow
//! `Timestamp(Millisecond, None)` columns.

use std::fmt;

use chrono::{DateTime, Datelike, Month, NaiveDate, NaiveDateTime, NaiveTime};

use common_error::{TallyError, TallyResult, value_err};

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a timestamp as exported by the cleaning step.
///
/// Accepts `YYYY-MM-DD HH:MM:SS`, the ISO `T` separator, optional fractional
/// seconds, and bare dates (midnight). Returns `None` when nothing matches.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Parse a calendar date (`YYYY-MM-DD`).
pub fn parse_date(value: &str) -> TallyResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| TallyError::invalid_parameter(format!("invalid date '{value}': {e}")))
}

/// Milliseconds since the epoch for a naive timestamp.
pub fn to_millis(ts: &NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_millis()
}

/// Inverse of [`to_millis`].
pub fn from_millis(millis: i64) -> TallyResult<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| TallyError::value_error(format!("timestamp {millis}ms out of range")))
}

/// Milliseconds at 00:00:00 of the given day.
pub fn start_of_day_millis(date: NaiveDate) -> i64 {
    to_millis(&date.and_time(NaiveTime::MIN))
}

/// A calendar month (the bucket used for resampling and recency).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Create a month, validating `month` is in `1..=12`.
    pub fn new(year: i32, month: u32) -> TallyResult<Self> {
        if !(1..=12).contains(&month) {
            value_err!("month {month} out of range");
        }
        Ok(Self { year, month })
    }

    /// The month containing `ts`.
    pub fn of(ts: &NaiveDateTime) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
        }
    }

    /// The month containing a millisecond timestamp.
    pub fn from_millis(millis: i64) -> TallyResult<Self> {
        from_millis(millis).map(|ts| Self::of(&ts))
    }

    /// Calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month number, 1-based.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Full English month name, e.g. `"March"`.
    pub fn name(&self) -> &'static str {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map_or("", |m| m.name())
    }

    /// Whole months from `earlier` to `self`; negative when `earlier` is later.
    pub fn months_since(&self, earlier: &YearMonth) -> i64 {
        self.ordinal() - earlier.ordinal()
    }

    fn ordinal(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2017, 10, 2)
            .unwrap()
            .and_hms_opt(10, 56, 33)
            .unwrap();
        assert_eq!(parse_timestamp("2017-10-02 10:56:33"), Some(expected));
        assert_eq!(parse_timestamp("2017-10-02T10:56:33"), Some(expected));
        assert_eq!(parse_timestamp(" 2017-10-02 10:56:33 "), Some(expected));
        assert!(parse_timestamp("2017-10-02 10:56:33.250").is_some());

        let midnight = NaiveDate::from_ymd_opt(2018, 1, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2018-01-05"), Some(midnight));

        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("02/10/2017"), None);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2018-08-29").unwrap(),
            NaiveDate::from_ymd_opt(2018, 8, 29).unwrap()
        );
        assert!(matches!(
            parse_date("29-08-2018"),
            Err(TallyError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_millis_roundtrip() {
        let ts = parse_timestamp("2016-09-04 21:15:19").unwrap();
        assert_eq!(from_millis(to_millis(&ts)).unwrap(), ts);
    }

    #[test]
    fn test_start_of_day() {
        let date = NaiveDate::from_ymd_opt(2018, 3, 1).unwrap();
        let ts = parse_timestamp("2018-03-01 00:00:00").unwrap();
        assert_eq!(start_of_day_millis(date), to_millis(&ts));
    }

    #[test]
    fn test_year_month_validation() {
        assert!(YearMonth::new(2018, 12).is_ok());
        assert!(YearMonth::new(2018, 0).is_err());
        assert!(YearMonth::new(2018, 13).is_err());
    }

    #[test]
    fn test_months_since() {
        let aug_2018 = YearMonth::new(2018, 8).unwrap();
        let sep_2016 = YearMonth::new(2016, 9).unwrap();
        assert_eq!(aug_2018.months_since(&sep_2016), 23);
        assert_eq!(sep_2016.months_since(&aug_2018), -23);
        assert_eq!(aug_2018.months_since(&aug_2018), 0);

        let dec = YearMonth::new(2017, 12).unwrap();
        let jan = YearMonth::new(2018, 1).unwrap();
        assert_eq!(jan.months_since(&dec), 1);
    }

    #[test]
    fn test_month_is_day_independent() {
        let early = YearMonth::of(&parse_timestamp("2018-07-01 00:00:01").unwrap());
        let late = YearMonth::of(&parse_timestamp("2018-07-31 23:59:59").unwrap());
        assert_eq!(early, late);
    }

    #[test]
    fn test_ordering_and_display() {
        let a = YearMonth::new(2017, 12).unwrap();
        let b = YearMonth::new(2018, 1).unwrap();
        assert!(a < b);
        assert_eq!(a.name(), "December");
        assert_eq!(b.to_string(), "January 2018");
    }
}
