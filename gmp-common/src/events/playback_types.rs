//! Playback-related type definitions
//!
//! Supporting types for the per-session player state machine.

use serde::{Deserialize, Serialize};

/// Player loop state
///
/// `Stopped` is terminal: a stopped session never returns to `Idle`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No current track, consumer waiting on the queue
    Idle,
    /// Current track popped, awaiting stream resolution
    Resolving,
    Playing,
    Paused,
    /// Transport signalled completion, about to loop
    Draining,
    /// Session torn down
    Stopped,
}

impl PlaybackState {
    /// True while a track is in flight (resolving, playing, paused or draining)
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            PlaybackState::Resolving
                | PlaybackState::Playing
                | PlaybackState::Paused
                | PlaybackState::Draining
        )
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Resolving => write!(f, "resolving"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Draining => write!(f, "draining"),
            PlaybackState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Why a session was torn down
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Explicit stop command
    Requested,
    /// Nobody left in the voice channel
    EmptyChannel,
    /// Nothing playing, nothing queued, no recent activity
    Idle,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Requested => write!(f, "stop requested"),
            StopReason::EmptyChannel => write!(f, "nobody is in the voice channel"),
            StopReason::Idle => write!(f, "idle (no playback/queue/activity)"),
        }
    }
}
