//! Adaptive UI refresh throttle
//!
//! Successful edits shrink the interval by 10% (floored at the minimum);
//! rate-limited edits grow it by 50% (capped at the maximum). Attempts made
//! sooner than the interval after the last success are skipped unless
//! forced.

use std::time::Duration;
use tokio::time::Instant;

const SUCCESS_FACTOR: f64 = 0.9;
const BACKOFF_FACTOR: f64 = 1.5;

#[derive(Debug, Clone)]
pub struct RefreshThrottle {
    interval: Duration,
    min_interval: Duration,
    max_interval: Duration,
    last_success: Option<Instant>,
}

impl RefreshThrottle {
    /// Start at the floor interval with no prior edit
    pub fn new(min_interval: Duration, max_interval: Duration) -> Self {
        let max_interval = max_interval.max(min_interval);
        Self {
            interval: min_interval,
            min_interval,
            max_interval,
            last_success: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether an edit should be attempted at `now`
    pub fn should_attempt(&self, now: Instant, force: bool) -> bool {
        if force {
            return true;
        }
        match self.last_success {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    pub fn record_success(&mut self, now: Instant) {
        self.last_success = Some(now);
        self.interval = self.interval.mul_f64(SUCCESS_FACTOR).max(self.min_interval);
    }

    pub fn record_rate_limited(&mut self) {
        self.interval = self.interval.mul_f64(BACKOFF_FACTOR).min(self.max_interval);
    }

    /// Back to the floor interval (new track)
    pub fn reset(&mut self) {
        self.interval = self.min_interval;
        self.last_success = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle() -> RefreshThrottle {
        RefreshThrottle::new(Duration::from_secs(1), Duration::from_secs(5))
    }

    #[test]
    fn test_starts_at_floor() {
        assert_eq!(throttle().interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_successes_stay_at_or_above_floor_and_never_grow() {
        let mut throttle = throttle();
        throttle.record_rate_limited();
        throttle.record_rate_limited();

        let now = Instant::now();
        let mut previous = throttle.interval();
        for _ in 0..5 {
            throttle.record_success(now);
            assert!(throttle.interval() <= previous);
            assert!(throttle.interval() >= Duration::from_secs(1));
            previous = throttle.interval();
        }
    }

    #[test]
    fn test_rate_limit_grows_until_cap() {
        let mut throttle = throttle();
        let mut previous = throttle.interval();

        throttle.record_rate_limited();
        assert!(throttle.interval() > previous);
        assert_eq!(throttle.interval(), Duration::from_millis(1500));

        for _ in 0..10 {
            previous = throttle.interval();
            throttle.record_rate_limited();
            assert!(throttle.interval() >= previous);
        }
        assert_eq!(throttle.interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_attempt_gated_by_interval() {
        let mut throttle = throttle();
        let start = Instant::now();
        assert!(throttle.should_attempt(start, false));

        throttle.record_success(start);
        assert!(!throttle.should_attempt(start + Duration::from_millis(500), false));
        assert!(throttle.should_attempt(start + Duration::from_secs(1), false));
    }

    #[test]
    fn test_forced_attempt_ignores_interval() {
        let mut throttle = throttle();
        let start = Instant::now();
        throttle.record_success(start);
        assert!(throttle.should_attempt(start, true));
    }

    #[test]
    fn test_reset_returns_to_floor() {
        let mut throttle = throttle();
        throttle.record_rate_limited();
        throttle.record_success(Instant::now());
        throttle.reset();
        assert_eq!(throttle.interval(), Duration::from_secs(1));
        assert!(throttle.should_attempt(Instant::now(), false));
    }
}
