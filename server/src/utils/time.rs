//! Time utility functions

use chrono::{DateTime, TimeZone, Utc};

/// Convert nanoseconds since Unix epoch to DateTime<Utc>
pub fn nanos_to_datetime(nanos: u64) -> DateTime<Utc> {
    let secs = (nanos / 1_000_000_000) as i64;
    let nsecs = (nanos % 1_000_000_000) as u32;
    Utc.timestamp_opt(secs, nsecs).single().unwrap_or_else(|| {
        tracing::warn!(nanos, "Invalid timestamp, using epoch");
        DateTime::UNIX_EPOCH
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_nanos_to_datetime_epoch() {
        assert_eq!(nanos_to_datetime(0), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_nanos_to_datetime_day_boundary() {
        // 2024-01-01T23:59:59.999999999Z stays on Jan 1
        let nanos = 1_704_153_599_u64 * 1_000_000_000 + 999_999_999;
        let dt = nanos_to_datetime(nanos);
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 1, 1));
        assert_eq!(dt.hour(), 23);

        let next = nanos_to_datetime(nanos + 1);
        assert_eq!(next.day(), 2);
    }

    #[test]
    fn test_nanos_to_datetime_with_subsecond() {
        let dt = nanos_to_datetime(1_500_000_000);
        assert_eq!(dt.timestamp(), 1);
        assert_eq!(dt.timestamp_subsec_nanos(), 500_000_000);
    }
}
