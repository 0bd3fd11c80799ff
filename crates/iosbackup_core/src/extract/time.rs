//! Timestamp conversions for Core Data and legacy databases.
//!
//! Zero and NULL timestamps mean "not set" and map to `None`.

use chrono::{DateTime, Utc};

/// Seconds between the unix epoch and 2001-01-01T00:00:00Z.
pub const APPLE_EPOCH_OFFSET_SECS: i64 = 978_307_200;

/// `message.date` values above this are nanoseconds.
const NANOSECOND_THRESHOLD: i64 = 1_000_000_000_000;

/// Core Data timestamp: fractional seconds since 2001-01-01.
pub fn from_apple_seconds(value: f64) -> Option<DateTime<Utc>> {
    if value == 0.0 || !value.is_finite() {
        return None;
    }
    from_fractional_unix(value + APPLE_EPOCH_OFFSET_SECS as f64)
}

/// `sms.db` timestamp: seconds since 2001-01-01, or nanoseconds on iOS 11+.
pub fn from_apple_message_date(value: i64) -> Option<DateTime<Utc>> {
    if value == 0 {
        return None;
    }
    if value > NANOSECOND_THRESHOLD {
        let secs = value.div_euclid(1_000_000_000);
        let nanos = value.rem_euclid(1_000_000_000) as u32;
        return DateTime::from_timestamp(secs.checked_add(APPLE_EPOCH_OFFSET_SECS)?, nanos);
    }
    DateTime::from_timestamp(value.checked_add(APPLE_EPOCH_OFFSET_SECS)?, 0)
}

/// Unix seconds, as stored by the legacy `call_history.db`.
pub fn from_unix_seconds(value: f64) -> Option<DateTime<Utc>> {
    if value == 0.0 || !value.is_finite() {
        return None;
    }
    from_fractional_unix(value)
}

fn from_fractional_unix(value: f64) -> Option<DateTime<Utc>> {
    let secs = value.floor();
    let nanos = ((value - secs) * 1_000_000_000.0) as u32;
    DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
}

#[cfg(test)]
mod tests {
    use super::{from_apple_message_date, from_apple_seconds, from_unix_seconds};

    #[test]
    fn apple_seconds_start_in_2001() {
        let date = from_apple_seconds(86_400.0).unwrap();
        assert_eq!(date.to_rfc3339(), "2001-01-02T00:00:00+00:00");
        assert_eq!(from_apple_seconds(0.0), None);
    }

    #[test]
    fn message_dates_accept_seconds_and_nanoseconds() {
        let seconds = from_apple_message_date(700_000_000).unwrap();
        let nanos = from_apple_message_date(700_000_000_000_000_000).unwrap();
        assert_eq!(seconds, nanos);
        assert_eq!(seconds.to_rfc3339(), "2023-03-08T20:26:40+00:00");
        assert_eq!(from_apple_message_date(0), None);
    }

    #[test]
    fn unix_seconds_are_taken_as_is() {
        let date = from_unix_seconds(1_600_000_000.5).unwrap();
        assert_eq!(date.timestamp(), 1_600_000_000);
        assert_eq!(date.timestamp_subsec_millis(), 500);
    }
}
