//! Activity and playback-position clock
//!
//! Uses `tokio::time::Instant` so paused-clock tests drive it
//! deterministically.
//!
//! Invariant: `elapsed = (now - start) - (paused_total + (now - paused_at))`,
//! clamped at zero.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct ActivityClock {
    last_activity: Instant,
    /// None until the first track starts
    started_at: Option<Instant>,
    paused_total: Duration,
    paused_at: Option<Instant>,
}

impl ActivityClock {
    pub fn new() -> Self {
        Self {
            last_activity: Instant::now(),
            started_at: None,
            paused_total: Duration::ZERO,
            paused_at: None,
        }
    }

    /// Record a user interaction; resets idle timers
    pub fn mark_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// Time since the last recorded interaction
    pub fn idle_for(&self) -> Duration {
        Instant::now().saturating_duration_since(self.last_activity)
    }

    /// Start timing a new track: clears paused state
    pub fn reset_for_new_track(&mut self) {
        self.started_at = Some(Instant::now());
        self.paused_total = Duration::ZERO;
        self.paused_at = None;
    }

    /// Forget the current track's timing (nothing playing)
    pub fn clear_track(&mut self) {
        self.started_at = None;
        self.paused_total = Duration::ZERO;
        self.paused_at = None;
    }

    /// No-op when already paused
    pub fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(Instant::now());
        }
    }

    /// No-op when not paused
    pub fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += Instant::now().saturating_duration_since(paused_at);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Playback time of the current track, excluding pauses
    pub fn elapsed(&self) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let now = Instant::now();
        let paused_extra = self
            .paused_at
            .map(|p| now.saturating_duration_since(p))
            .unwrap_or(Duration::ZERO);

        now.saturating_duration_since(started_at)
            .saturating_sub(self.paused_total + paused_extra)
    }

    /// Time left in a track of `duration` seconds; None when unknown
    pub fn remaining(&self, duration: Option<u64>) -> Option<Duration> {
        duration.map(|secs| Duration::from_secs(secs).saturating_sub(self.elapsed()))
    }
}

impl Default for ActivityClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_zero_after_reset() {
        let mut clock = ActivityClock::new();
        advance(Duration::from_secs(10)).await;
        clock.reset_for_new_track();
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_zero_before_first_track() {
        let clock = ActivityClock::new();
        advance(Duration::from_secs(3)).await;
        assert_eq!(clock.elapsed(), Duration::ZERO);
        assert_eq!(clock.remaining(Some(60)), Some(Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_excludes_paused_interval() {
        let mut clock = ActivityClock::new();
        clock.reset_for_new_track();

        advance(Duration::from_secs(5)).await;
        clock.pause();
        advance(Duration::from_secs(20)).await;
        assert_eq!(clock.elapsed(), Duration::from_secs(5));
        clock.resume();

        advance(Duration::from_secs(3)).await;
        assert_eq!(clock.elapsed(), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_pause_same_as_single() {
        let mut clock = ActivityClock::new();
        clock.reset_for_new_track();

        advance(Duration::from_secs(2)).await;
        clock.pause();
        advance(Duration::from_secs(4)).await;
        clock.pause();
        advance(Duration::from_secs(4)).await;
        clock.resume();
        clock.resume();

        assert_eq!(clock.elapsed(), Duration::from_secs(2));
        assert!(!clock.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_saturates() {
        let mut clock = ActivityClock::new();
        clock.reset_for_new_track();
        advance(Duration::from_secs(90)).await;

        assert_eq!(clock.remaining(Some(60)), Some(Duration::ZERO));
        assert_eq!(clock.remaining(Some(100)), Some(Duration::from_secs(10)));
        assert_eq!(clock.remaining(None), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_activity_resets_idle() {
        let mut clock = ActivityClock::new();
        advance(Duration::from_secs(40)).await;
        assert_eq!(clock.idle_for(), Duration::from_secs(40));
        clock.mark_activity();
        assert_eq!(clock.idle_for(), Duration::ZERO);
    }
}
