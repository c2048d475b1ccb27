//! In-process collaborators for running the scheduler without a voice
//! gateway
//!
//! - [`SimResolver`]: deterministic titles and durations; queries starting
//!   with `fail:` do not resolve
//! - [`SimTransport`]: timer-driven playback honoring pause and stop
//! - [`SimAudience`]: adjustable listener count
//! - [`LogSurface`]: renders status lines through tracing
//! - [`ListTrackSource`]: expands `list:a,b,c` into three tracks

use crate::collaborators::{
    AudienceSource, CompletionSignal, ConnectionInfo, RenderOutcome, Resolver,
    SessionCollaborators, TrackSource, Transport, UiSurface,
};
use crate::error::{Error, Result};
use crate::manager::SessionFactory;
use crate::session::SessionStatus;
use crate::track::{ResolvedStream, StreamHandle, Track};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use gmp_common::TenantId;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const STREAM_SCHEME: &str = "sim://";
const FAIL_PREFIX: &str = "fail:";
const LIST_PREFIX: &str = "list:";
const PLAYBACK_STEP: Duration = Duration::from_millis(100);

/// Resolves any query to a fake stream of deterministic length
#[derive(Debug, Clone)]
pub struct SimResolver {
    max_track_secs: u64,
}

impl SimResolver {
    /// Durations fall between half of and the full `max_track_secs`
    pub fn new(max_track_secs: u64) -> Self {
        Self {
            max_track_secs: max_track_secs.max(2),
        }
    }

    fn duration_for(&self, query: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        query.hash(&mut hasher);
        let half = self.max_track_secs / 2;
        half + hasher.finish() % (self.max_track_secs - half + 1)
    }
}

#[async_trait]
impl Resolver for SimResolver {
    async fn resolve(&self, query: &str) -> Result<ResolvedStream> {
        let query = query.trim();
        if query.is_empty() || query.starts_with(FAIL_PREFIX) {
            return Err(Error::Resolution(format!("no results for '{}'", query)));
        }

        let (artist, title) = match query.split_once(" - ") {
            Some((artist, title)) => (Some(artist.trim().to_string()), title.trim().to_string()),
            None => (None, title_from_query(query)),
        };
        let duration = self.duration_for(query);

        Ok(ResolvedStream {
            title,
            artist,
            url: Some(if query.starts_with("http") {
                query.to_string()
            } else {
                format!("https://example.invalid/search?q={}", query.replace(' ', "+"))
            }),
            duration: Some(duration),
            stream: StreamHandle(format!("{}{}/{}", STREAM_SCHEME, duration, query)),
            thumbnail: None,
        })
    }
}

/// Last URL path segment, or the query itself
fn title_from_query(query: &str) -> String {
    if query.starts_with("http") {
        if let Some(segment) = query.trim_end_matches('/').rsplit('/').next() {
            return segment.to_string();
        }
    }
    query.to_string()
}

/// Seconds encoded in a `sim://<secs>/<query>` handle
fn stream_length(stream: &StreamHandle) -> Option<Duration> {
    let rest = stream.0.strip_prefix(STREAM_SCHEME)?;
    let (secs, _) = rest.split_once('/')?;
    secs.parse().ok().map(Duration::from_secs)
}

#[derive(Default)]
struct SimPlayback {
    playing: bool,
    paused: bool,
    volume: f32,
    /// Cancels the running playback timer
    job: Option<CancellationToken>,
    generation: u64,
}

/// Voice connection stand-in: "plays" a stream by waiting out its length
pub struct SimTransport {
    connection: Mutex<Option<ConnectionInfo>>,
    fallback_length: Duration,
    playback: Arc<Mutex<SimPlayback>>,
}

impl SimTransport {
    pub fn connected(guild: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            connection: Mutex::new(Some(ConnectionInfo {
                guild: Some(guild.into()),
                channel: Some(channel.into()),
            })),
            fallback_length: Duration::from_secs(30),
            playback: Arc::new(Mutex::new(SimPlayback::default())),
        }
    }

    pub fn volume(&self) -> f32 {
        lock(&self.playback).volume
    }

    fn connection(&self) -> MutexGuard<'_, Option<ConnectionInfo>> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock(playback: &Mutex<SimPlayback>) -> MutexGuard<'_, SimPlayback> {
    playback.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl Transport for SimTransport {
    fn start(
        &self,
        stream: &StreamHandle,
        volume: f32,
        on_complete: CompletionSignal,
    ) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::Transport("not connected".to_string()));
        }

        let length = stream_length(stream).unwrap_or(self.fallback_length);
        let token = CancellationToken::new();
        let generation = {
            let mut playback = lock(&self.playback);
            if let Some(previous) = playback.job.replace(token.clone()) {
                previous.cancel();
            }
            playback.playing = true;
            playback.paused = false;
            playback.volume = volume;
            playback.generation += 1;
            playback.generation
        };

        debug!("Sim playback of {} for {}s", stream, length.as_secs());
        let playback = Arc::clone(&self.playback);
        tokio::spawn(async move {
            let mut remaining = length;
            while !remaining.is_zero() {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(PLAYBACK_STEP) => {}
                }
                if !lock(&playback).paused {
                    remaining = remaining.saturating_sub(PLAYBACK_STEP);
                }
            }

            {
                let mut state = lock(&playback);
                if state.generation == generation {
                    state.playing = false;
                    state.paused = false;
                    state.job = None;
                }
            }
            on_complete.complete(None);
        });

        Ok(())
    }

    fn stop(&self) {
        if let Some(job) = lock(&self.playback).job.take() {
            job.cancel();
        }
    }

    fn pause(&self) {
        let mut playback = lock(&self.playback);
        if playback.playing {
            playback.paused = true;
        }
    }

    fn resume(&self) {
        lock(&self.playback).paused = false;
    }

    fn set_volume(&self, volume: f32) {
        lock(&self.playback).volume = volume;
    }

    fn is_playing(&self) -> bool {
        let playback = lock(&self.playback);
        playback.playing && !playback.paused
    }

    fn is_paused(&self) -> bool {
        lock(&self.playback).paused
    }

    fn is_connected(&self) -> bool {
        self.connection().is_some()
    }

    fn connection_info(&self) -> Option<ConnectionInfo> {
        self.connection().clone()
    }

    async fn disconnect(&self) -> Result<()> {
        self.stop();
        if let Some(info) = self.connection().take() {
            debug!(channel = ?info.channel, "Sim transport disconnected");
        }
        Ok(())
    }
}

/// Fixed, adjustable listener count
#[derive(Debug, Default)]
pub struct SimAudience {
    listeners: AtomicUsize,
}

impl SimAudience {
    pub fn new(listeners: usize) -> Self {
        Self {
            listeners: AtomicUsize::new(listeners),
        }
    }

    pub fn set_listeners(&self, listeners: usize) {
        self.listeners.store(listeners, Ordering::Relaxed);
    }
}

impl AudienceSource for SimAudience {
    fn current_participants(&self, _channel: &ConnectionInfo) -> Option<usize> {
        Some(self.listeners.load(Ordering::Relaxed))
    }
}

/// Writes each render to the log
#[derive(Debug, Default)]
pub struct LogSurface;

#[async_trait]
impl UiSurface for LogSurface {
    async fn render(&self, status: &SessionStatus) -> RenderOutcome {
        info!(tenant = status.tenant, "{}", status.summary_line());
        RenderOutcome::Edited
    }
}

/// Expands `list:a,b,c` into one track per comma-separated entry
#[derive(Debug, Default)]
pub struct ListTrackSource;

impl TrackSource for ListTrackSource {
    fn accepts(&self, query: &str) -> bool {
        query.trim_start().starts_with(LIST_PREFIX)
    }

    fn expand(&self, query: &str, requested_by: &str) -> BoxStream<'static, Result<Track>> {
        let entries = query.trim_start().strip_prefix(LIST_PREFIX).unwrap_or(query);
        let tracks: Vec<Result<Track>> = entries
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| Ok(Track::new(entry, requested_by)))
            .collect();
        stream::iter(tracks).boxed()
    }
}

/// One connected [`SimTransport`] per tenant, shared resolver and audience
pub struct SimFactory {
    resolver: Arc<SimResolver>,
    audience: Arc<SimAudience>,
}

impl SimFactory {
    pub fn new(resolver: Arc<SimResolver>, audience: Arc<SimAudience>) -> Self {
        Self { resolver, audience }
    }
}

impl SessionFactory for SimFactory {
    fn collaborators(&self, tenant: TenantId) -> SessionCollaborators {
        SessionCollaborators {
            resolver: self.resolver.clone(),
            transport: Arc::new(SimTransport::connected(format!("tenant-{}", tenant), "General")),
            audience: self.audience.clone(),
        }
    }

    fn surface(&self, _tenant: TenantId) -> Option<Arc<dyn UiSurface>> {
        Some(Arc::new(LogSurface))
    }
}
