//! External collaborator contracts
//!
//! The scheduler never talks to a voice gateway, search backend or chat UI
//! directly; it drives these traits. Implementations live outside the core
//! (see [`crate::sim`] for in-process simulations).

use crate::error::Result;
use crate::session::SessionStatus;
use crate::track::{ResolvedStream, StreamHandle, Track};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Turns a search query or URL into a playable stream
#[async_trait]
pub trait Resolver: Send + Sync {
    /// May block on network I/O; fails with `Error::Resolution`
    async fn resolve(&self, query: &str) -> Result<ResolvedStream>;
}

/// One-shot completion callback handed to [`Transport::start`]
///
/// Consumed on use, so a transport can report completion at most once per
/// start. Dropping it unused is treated as a silent completion.
#[derive(Debug)]
pub struct CompletionSignal {
    tx: oneshot::Sender<Option<String>>,
}

impl CompletionSignal {
    pub fn channel() -> (Self, oneshot::Receiver<Option<String>>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Report natural end, explicit stop (`None`) or a runtime failure
    pub fn complete(self, error: Option<String>) {
        let _ = self.tx.send(error);
    }
}

/// Where the transport is connected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub guild: Option<String>,
    pub channel: Option<String>,
}

/// Audio output for one tenant's voice connection
///
/// Synchronous methods are called while the session holds its state lock
/// and must not call back into the session.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Begin playing `stream`; `on_complete` fires exactly once afterwards
    fn start(&self, stream: &StreamHandle, volume: f32, on_complete: CompletionSignal)
        -> Result<()>;
    /// Stop the current stream (fires its completion)
    fn stop(&self);
    fn pause(&self);
    fn resume(&self);
    fn set_volume(&self, volume: f32);
    fn is_playing(&self) -> bool;
    fn is_paused(&self) -> bool;
    fn is_connected(&self) -> bool;
    fn connection_info(&self) -> Option<ConnectionInfo>;
    /// Leave the voice channel
    async fn disconnect(&self) -> Result<()>;
}

/// Result of one UI edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Edited,
    /// Back off and retry later
    RateLimited,
    /// Surface no longer exists; stop until re-attached
    Gone,
}

/// Renderable status display (e.g. a pinned chat message)
#[async_trait]
pub trait UiSurface: Send + Sync {
    async fn render(&self, status: &SessionStatus) -> RenderOutcome;
}

/// Counts listeners in the transport's channel
pub trait AudienceSource: Send + Sync {
    /// Non-automated members; None when the channel cannot be inspected
    fn current_participants(&self, channel: &ConnectionInfo) -> Option<usize>;
}

/// Expands one request (a playlist or album link) into many tracks
pub trait TrackSource: Send + Sync {
    fn accepts(&self, query: &str) -> bool;
    fn expand(&self, query: &str, requested_by: &str) -> BoxStream<'static, Result<Track>>;
}

/// Per-session collaborator bundle
#[derive(Clone)]
pub struct SessionCollaborators {
    pub resolver: Arc<dyn Resolver>,
    pub transport: Arc<dyn Transport>,
    pub audience: Arc<dyn AudienceSource>,
}
