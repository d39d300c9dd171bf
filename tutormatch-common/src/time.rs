//! Timestamp utilities

use chrono::{DateTime, Duration, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Unix timestamp (seconds) `ttl` from `from`
pub fn expiry_after(from: DateTime<Utc>, ttl: Duration) -> i64 {
    (from + ttl).timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        // Should be reasonably recent (before year 2100)
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01 00:00:00 UTC
    }

    #[tokio::test]
    async fn test_now_successive_calls_advance() {
        let time1 = now();
        tokio::time::sleep(StdDuration::from_millis(10)).await;
        let time2 = now();
        assert!(time2 > time1);
    }

    #[test]
    fn test_expiry_after_adds_ttl() {
        let from = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(expiry_after(from, Duration::hours(1)), 1_700_003_600);
    }

    #[test]
    fn test_expiry_after_zero_ttl() {
        let from = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(expiry_after(from, Duration::zero()), 1_700_000_000);
    }
}
