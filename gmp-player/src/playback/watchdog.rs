//! Idle / empty-room trip logic
//!
//! Pure decision state for the session watchdog loop. Two independent
//! conditions:
//! - empty room: audience stays at zero for `empty_timeout` (any listener
//!   clears the timer)
//! - idle: nothing in flight, nothing queued, no activity for `idle_timeout`
//!
//! Trips at most once per instance.

use gmp_common::events::StopReason;
use std::time::Duration;
use tokio::time::Instant;

/// One poll's view of the session
#[derive(Debug, Clone, Copy)]
pub struct WatchdogObservation {
    pub now: Instant,
    /// Non-automated listeners; None when the channel is unknown
    pub audience: Option<usize>,
    /// A track is resolving, playing, paused or draining
    pub busy: bool,
    pub queue_empty: bool,
    pub last_activity: Instant,
}

#[derive(Debug, Clone)]
pub struct IdleWatchdog {
    empty_timeout: Duration,
    idle_timeout: Duration,
    empty_since: Option<Instant>,
    tripped: bool,
}

impl IdleWatchdog {
    pub fn new(empty_timeout: Duration, idle_timeout: Duration) -> Self {
        Self {
            empty_timeout,
            idle_timeout,
            empty_since: None,
            tripped: false,
        }
    }

    /// Evaluate one poll; returns the reason the first time a condition trips
    pub fn evaluate(&mut self, obs: WatchdogObservation) -> Option<StopReason> {
        if self.tripped {
            return None;
        }

        // Channel not known yet: nothing to judge this round
        let audience = obs.audience?;

        if audience == 0 {
            let since = *self.empty_since.get_or_insert(obs.now);
            if obs.now.saturating_duration_since(since) >= self.empty_timeout {
                return self.trip(StopReason::EmptyChannel);
            }
        } else {
            self.empty_since = None;
        }

        if !obs.busy
            && obs.queue_empty
            && obs.now.saturating_duration_since(obs.last_activity) >= self.idle_timeout
        {
            return self.trip(StopReason::Idle);
        }

        None
    }

    pub fn has_tripped(&self) -> bool {
        self.tripped
    }

    /// When the room was first seen empty, if it still is
    pub fn empty_since(&self) -> Option<Instant> {
        self.empty_since
    }

    fn trip(&mut self, reason: StopReason) -> Option<StopReason> {
        self.tripped = true;
        Some(reason)
    }
}
