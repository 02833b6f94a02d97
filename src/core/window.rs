use chrono::{DateTime, Duration, Utc};

/// Default compatibility window in minutes
pub const DEFAULT_WINDOW_MINUTES: i64 = 15;

/// Default compatibility window
pub fn default_window() -> Duration {
    Duration::minutes(DEFAULT_WINDOW_MINUTES)
}

/// Check whether two desired times are at most `window` apart
///
/// Symmetric and inclusive: a difference of exactly `window` is compatible.
#[inline]
pub fn within_window(a: DateTime<Utc>, b: DateTime<Utc>, window: Duration) -> bool {
    let diff = if a >= b { a - b } else { b - a };
    diff <= window
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_within_window_inclusive() {
        let window = default_window();
        assert!(within_window(at(12, 0), at(12, 15), window));
        assert!(within_window(at(12, 15), at(12, 0), window));
        assert!(!within_window(at(12, 0), at(12, 16), window));
    }

    #[test]
    fn test_within_window_same_time() {
        assert!(within_window(at(12, 0), at(12, 0), default_window()));
        assert!(within_window(at(12, 0), at(12, 0), Duration::zero()));
    }

    #[test]
    fn test_one_second_past_window() {
        let a = at(12, 0);
        let b = a + Duration::minutes(15) + Duration::seconds(1);
        assert!(!within_window(a, b, default_window()));
    }
}
