//! Playback building blocks owned by a session
//!
//! Queue, history, clock, refresh throttle and watchdog logic. None of these
//! spawn tasks or lock; the session composes them under its state lock.

pub mod clock;
pub mod history;
pub mod queue;
pub mod throttle;
pub mod watchdog;

pub use clock::ActivityClock;
pub use history::History;
pub use queue::TrackQueue;
pub use throttle::RefreshThrottle;
pub use watchdog::{IdleWatchdog, WatchdogObservation};
