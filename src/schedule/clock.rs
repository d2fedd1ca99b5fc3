//! Wall-clock helpers for due timestamps

use crate::core::{Error, Result};
use chrono::{Local, Utc};

/// Current Unix time in whole seconds
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}

/// Unix timestamp of `value` (`HH:MM:SS`) today in the local time zone.
///
/// Every field must be exactly two ASCII digits; hour is 0–23, minute and
/// second 0–59.
///
/// # Errors
///
/// Returns [`Error::InvalidTimeOfDay`] naming the malformed part, or
/// `"local time"` when the time does not exist today (skipped by a DST
/// transition).
///
/// # Example
///
/// ```rust
/// use chrono::{Local, TimeZone, Timelike};
/// use rust_schedule_kit::schedule::today_time;
///
/// let ts = today_time("18:53:00").unwrap();
/// let local = Local.timestamp_opt(ts, 0).unwrap();
/// assert_eq!((local.hour(), local.minute(), local.second()), (18, 53, 0));
///
/// assert!(today_time("24:00:00").is_err());
/// ```
pub fn today_time(value: &str) -> Result<i64> {
    let (hour, minute, second) = parse_time_of_day(value)?;

    Local::now()
        .date_naive()
        .and_hms_opt(hour, minute, second)
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
        .map(|time| time.timestamp())
        .ok_or_else(|| Error::invalid_time_of_day(value, "local time"))
}

fn parse_time_of_day(value: &str) -> Result<(u32, u32, u32)> {
    let bytes = value.as_bytes();
    if bytes.len() != 8 || bytes[2] != b':' || bytes[5] != b':' {
        return Err(Error::invalid_time_of_day(value, "format"));
    }

    let hour = two_digits(&bytes[0..2], 23).ok_or_else(|| Error::invalid_time_of_day(value, "hour"))?;
    let minute =
        two_digits(&bytes[3..5], 59).ok_or_else(|| Error::invalid_time_of_day(value, "minute"))?;
    let second =
        two_digits(&bytes[6..8], 59).ok_or_else(|| Error::invalid_time_of_day(value, "second"))?;

    Ok((hour, minute, second))
}

fn two_digits(field: &[u8], max: u32) -> Option<u32> {
    match *field {
        [tens @ b'0'..=b'9', ones @ b'0'..=b'9'] => {
            let value = u32::from(tens - b'0') * 10 + u32::from(ones - b'0');
            (value <= max).then_some(value)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn field_of(value: &str) -> &'static str {
        match today_time(value) {
            Err(Error::InvalidTimeOfDay { field, .. }) => field,
            other => panic!("expected InvalidTimeOfDay for {:?}, got {:?}", value, other),
        }
    }

    #[test]
    fn test_today_time_decodes_to_local_fields() {
        let ts = today_time("18:53:00").expect("valid time");
        let local = Local.timestamp_opt(ts, 0).unwrap();

        assert_eq!(local.hour(), 18);
        assert_eq!(local.minute(), 53);
        assert_eq!(local.second(), 0);
        assert_eq!(local.date_naive(), Local::now().date_naive());
    }

    #[test]
    fn test_today_time_bounds() {
        assert!(today_time("00:00:00").is_ok());
        assert!(today_time("23:59:59").is_ok());

        assert_eq!(field_of("24:00:00"), "hour");
        assert_eq!(field_of("23:60:00"), "minute");
        assert_eq!(field_of("23:59:60"), "second");
    }

    #[test]
    fn test_today_time_rejects_malformed_input() {
        assert_eq!(field_of("12：30：00"), "format");
        assert_eq!(field_of("1:30:00"), "format");
        assert_eq!(field_of("12-30-00"), "format");
        assert_eq!(field_of("12:30:000"), "format");
        assert_eq!(field_of(""), "format");
        assert_eq!(field_of("+1:30:00"), "hour");
        assert_eq!(field_of("12:-1:00"), "minute");
        assert_eq!(field_of("12:30:x0"), "second");
    }

    #[test]
    fn test_now_unix_is_monotonic_enough() {
        let before = now_unix();
        let after = now_unix();
        assert!(after >= before);
        assert!(before > 1_600_000_000);
    }
}
