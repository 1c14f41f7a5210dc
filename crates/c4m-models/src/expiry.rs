//! Job expiry rules.
//!
//! All comparisons are made in UTC. "Expired" is decided at day granularity;
//! time remaining is bucketed into days, weeks or months.

use std::fmt;

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, Utc};
use serde::{Serialize, Serializer};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Largest remaining span still reported in days.
const DAYS_BUCKET_MAX: i64 = 14;

/// Largest remaining span still reported in weeks.
const WEEKS_BUCKET_MAX: i64 = 60;

/// How far ahead an employer may set an expiry.
const MAX_WINDOW_MONTHS: u32 = 2;

/// Parse a stored or submitted expiry value.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (interpreted as UTC) and
/// `YYYY-MM-DD` (midnight UTC). Anything else yields `None`.
pub fn parse_expiry(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// True iff the expiry day is strictly before today.
///
/// A job without an expiry never expires.
pub fn is_expired(expiry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expiry {
        Some(expiry) => expiry.date_naive() < now.date_naive(),
        None => false,
    }
}

/// True iff `candidate` is after today and at most two months out.
pub fn is_valid_future_window(candidate: NaiveDate, today: NaiveDate) -> bool {
    if candidate <= today {
        return false;
    }

    match today.checked_add_months(Months::new(MAX_WINDOW_MONTHS)) {
        Some(limit) => candidate <= limit,
        None => false,
    }
}

/// Remaining lifetime of a posting, bucketed for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRemaining {
    Expired,
    Days(i64),
    Weeks(i64),
    Months(i64),
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRemaining::Expired => write!(f, "Expired"),
            TimeRemaining::Days(n) => write!(f, "{} {}", n, plural(*n, "day")),
            TimeRemaining::Weeks(n) => write!(f, "{} {}", n, plural(*n, "week")),
            TimeRemaining::Months(n) => write!(f, "{} {}", n, plural(*n, "month")),
        }
    }
}

impl Serialize for TimeRemaining {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        unit.to_string()
    } else {
        format!("{}s", unit)
    }
}

/// Ceiling division that also rounds negative quotients toward zero.
fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    -((-numerator).div_euclid(denominator))
}

/// Bucket the time left until `expiry`.
pub fn time_remaining(expiry: DateTime<Utc>, now: DateTime<Utc>) -> TimeRemaining {
    let remaining_ms = (expiry - now).num_milliseconds();
    let days = ceil_div(remaining_ms, MS_PER_DAY);

    if days <= 0 {
        TimeRemaining::Expired
    } else if days <= DAYS_BUCKET_MAX {
        TimeRemaining::Days(days)
    } else if days <= WEEKS_BUCKET_MAX {
        TimeRemaining::Weeks(ceil_div(days, 7))
    } else {
        TimeRemaining::Months(ceil_div(days, 30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 15, 0, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_no_expiry_never_expires() {
        assert!(!is_expired(None, now()));
    }

    #[test]
    fn test_expiry_uses_day_granularity() {
        // Earlier today is still today, so not expired.
        let this_morning = Utc.with_ymd_and_hms(2026, 5, 10, 0, 1, 0).unwrap();
        assert!(!is_expired(Some(this_morning), now()));

        let yesterday_evening = Utc.with_ymd_and_hms(2026, 5, 9, 23, 59, 0).unwrap();
        assert!(is_expired(Some(yesterday_evening), now()));

        assert!(!is_expired(Some(now() + Duration::days(3)), now()));
    }

    #[test]
    fn test_unparseable_expiry_is_not_expired() {
        let parsed = parse_expiry("next tuesday-ish");
        assert!(parsed.is_none());
        assert!(!is_expired(parsed, now()));
    }

    #[test]
    fn test_parse_expiry_formats() {
        assert_eq!(
            parse_expiry("2026-06-01T12:30:00Z"),
            Some(Utc.with_ymd_and_hms(2026, 6, 1, 12, 30, 0).unwrap())
        );
        assert_eq!(
            parse_expiry("2026-06-01T12:30:00+02:00"),
            Some(Utc.with_ymd_and_hms(2026, 6, 1, 10, 30, 0).unwrap())
        );
        assert_eq!(
            parse_expiry("2026-06-01T08:15"),
            Some(Utc.with_ymd_and_hms(2026, 6, 1, 8, 15, 0).unwrap())
        );
        assert_eq!(
            parse_expiry(" 2026-06-01 "),
            Some(Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_expiry(""), None);
        assert_eq!(parse_expiry("2026-13-40"), None);
    }

    #[test]
    fn test_future_window() {
        let today = day(2026, 5, 10);
        assert!(!is_valid_future_window(today, today));
        assert!(!is_valid_future_window(day(2026, 5, 9), today));
        assert!(is_valid_future_window(day(2026, 5, 11), today));
        assert!(is_valid_future_window(day(2026, 7, 10), today));
        assert!(!is_valid_future_window(day(2026, 7, 11), today));
    }

    #[test]
    fn test_future_window_month_end() {
        // Two months after Dec 31 clamps to the end of February.
        let today = day(2026, 12, 31);
        assert!(is_valid_future_window(day(2027, 2, 28), today));
        assert!(!is_valid_future_window(day(2027, 3, 1), today));
    }

    #[test]
    fn test_time_remaining_buckets() {
        let now = now();
        assert_eq!(time_remaining(now + Duration::days(10), now).to_string(), "10 days");
        assert_eq!(time_remaining(now + Duration::days(45), now).to_string(), "7 weeks");
        assert_eq!(time_remaining(now + Duration::days(90), now).to_string(), "3 months");
        assert_eq!(time_remaining(now - Duration::days(1), now).to_string(), "Expired");
        assert_eq!(time_remaining(now, now), TimeRemaining::Expired);
    }

    #[test]
    fn test_time_remaining_rounds_up_and_singular() {
        let now = now();
        assert_eq!(time_remaining(now + Duration::hours(2), now).to_string(), "1 day");
        assert_eq!(time_remaining(now + Duration::days(14), now), TimeRemaining::Days(14));
        assert_eq!(time_remaining(now + Duration::days(15), now), TimeRemaining::Weeks(3));
        assert_eq!(time_remaining(now + Duration::days(61), now), TimeRemaining::Months(3));
        assert_eq!(time_remaining(now - Duration::hours(5), now), TimeRemaining::Expired);
    }
}
