//! Time values, expressed as seconds since 2000-01-01T00:00:00.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use common_error::{QuarryError, QuarryResult, StorageErrorKind};

const SECONDS_PER_DAY: f64 = 86400.0;

/// Convert days to seconds, rounded to the nearest microsecond.
pub fn day2sec(days: f64) -> f64 {
    (days * SECONDS_PER_DAY * 1e6 + 0.5).floor() / 1e6
}

/// Convert seconds to days, rounding the seconds to the nearest microsecond first.
pub fn sec2day(seconds: f64) -> f64 {
    (seconds * 1e6 + 0.5).floor() / (SECONDS_PER_DAY * 1e6)
}

fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

fn datetime_error(msg: String) -> QuarryError {
    QuarryError::storage(StorageErrorKind::InvalidDatetime, msg)
}

/// Format a time as `yyyy-MM-dd HH:mm:ss.SSSSSS`.
pub fn time_to_string(seconds: f64) -> QuarryResult<String> {
    if !seconds.is_finite() {
        return Err(datetime_error(format!("time value {seconds} is not finite")));
    }
    let micros = (seconds * 1e6).round();
    if micros.abs() > i64::MAX as f64 {
        return Err(datetime_error(format!("time value {seconds} out of range")));
    }
    epoch()
        .checked_add_signed(Duration::microseconds(micros as i64))
        .map(|datetime| datetime.format("%Y-%m-%d %H:%M:%S%.6f").to_string())
        .ok_or_else(|| datetime_error(format!("time value {seconds} out of range")))
}

/// Parse an ISO-like date/time string into seconds since 2000.
///
/// Accepts `T` or a space as separator and an optional fractional part;
/// a bare date means midnight.
pub fn parse_time(text: &str) -> QuarryResult<f64> {
    let text = text.trim();
    let datetime = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| datetime_error(format!("invalid date/time string '{text}'")))?;
    let micros = (datetime - epoch())
        .num_microseconds()
        .ok_or_else(|| datetime_error(format!("date/time '{text}' out of range")))?;
    Ok(micros as f64 / 1e6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_formatting() {
        assert_eq!(time_to_string(0.0).unwrap(), "2000-01-01 00:00:00.000000");
        assert_eq!(time_to_string(86400.5).unwrap(), "2000-01-02 00:00:00.500000");
        assert_eq!(time_to_string(-1.0).unwrap(), "1999-12-31 23:59:59.000000");
    }

    #[test]
    fn test_non_finite_time() {
        assert_eq!(time_to_string(f64::NAN).unwrap_err().code(), -104);
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("2000-01-01T00:00:00").unwrap(), 0.0);
        assert_eq!(parse_time("2000-01-02 00:00:01.25").unwrap(), 86401.25);
        assert_eq!(parse_time("2000-01-03").unwrap(), 172800.0);
        assert!(parse_time("yesterday").is_err());
    }

    #[test]
    fn test_day_second_conversion() {
        assert_eq!(day2sec(1.0), 86400.0);
        assert_eq!(sec2day(43200.0), 0.5);
    }
}
