//! Event types for the GMP session event system
//!
//! Provides the shared event vocabulary and the broadcast-backed `EventBus`
//! each playback session publishes on.

mod playback_types;

pub use playback_types::{PlaybackState, StopReason};

use crate::TenantId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Session event types
///
/// Every event names the tenant it belongs to, so subscribers of several
/// sessions can multiplex them. Events serialize with a `type` tag for
/// export to external monitors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Player loop moved between states
    StateChanged {
        tenant: TenantId,
        old_state: PlaybackState,
        new_state: PlaybackState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Transport started playing a resolved track
    TrackStarted {
        tenant: TenantId,
        track_id: Uuid,
        title: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Track ended (naturally or skipped) and was recorded in history
    TrackFinished {
        tenant: TenantId,
        track_id: Uuid,
        title: String,
        /// Runtime error reported by the transport, if any
        error: Option<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Track could not be resolved or started and was dropped
    TrackFailed {
        tenant: TenantId,
        track_id: Uuid,
        query: String,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Pending queue contents changed
    QueueChanged {
        tenant: TenantId,
        queue_len: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    VolumeChanged {
        tenant: TenantId,
        volume: f32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session torn down (terminal)
    SessionStopped {
        tenant: TenantId,
        reason: StopReason,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SessionEvent {
    /// Tenant the event belongs to
    pub fn tenant(&self) -> TenantId {
        match self {
            SessionEvent::StateChanged { tenant, .. }
            | SessionEvent::TrackStarted { tenant, .. }
            | SessionEvent::TrackFinished { tenant, .. }
            | SessionEvent::TrackFailed { tenant, .. }
            | SessionEvent::QueueChanged { tenant, .. }
            | SessionEvent::VolumeChanged { tenant, .. }
            | SessionEvent::SessionStopped { tenant, .. } => *tenant,
        }
    }
}

/// Event distribution bus
///
/// Wraps `tokio::sync::broadcast`:
/// - Non-blocking publish (slow subscribers don't block the player loop)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use gmp_common::events::{EventBus, SessionEvent};
///
/// let bus = EventBus::new(16);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(SessionEvent::QueueChanged {
///     tenant: 7,
///     queue_len: 3,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert_eq!(rx.try_recv().unwrap().tenant(), 7);
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: SessionEvent,
    ) -> Result<usize, broadcast::error::SendError<SessionEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
