//! Text command console
//!
//! Line format: `<tenant> <command> [argument]`, or a bare `status` for the
//! instance-wide view. Queue positions are 1-based.

use crate::collaborators::{Resolver, TrackSource};
use crate::error::{Error, Result};
use crate::manager::SessionManager;
use crate::session::{BufferedEnqueue, PlaybackSession, SurfaceKind};
use crate::track::Track;
use futures::StreamExt;
use gmp_common::events::StopReason;
use gmp_common::TenantId;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Fallback label when a query cannot be resolved at enqueue time
pub const UNKNOWN_TITLE: &str = "Unknown title";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play(String),
    PlayNext(String),
    Skip,
    Previous,
    Pause,
    Resume,
    /// Percent, 0..=200
    Volume(f32),
    VolumeUp,
    VolumeDown,
    Shuffle,
    Clear,
    Remove(i64),
    SkipTo(i64),
    Queue,
    Status,
    Stop,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, arg) = match s.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (s, ""),
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "play" | "p" => Command::Play(required(name, arg)?.to_string()),
            "playnext" | "pn" => Command::PlayNext(required(name, arg)?.to_string()),
            "skip" | "s" => Command::Skip,
            "prev" | "previous" => Command::Previous,
            "pause" => Command::Pause,
            "resume" => Command::Resume,
            "vol" | "volume" => Command::Volume(percent(name, arg)?),
            "volup" => Command::VolumeUp,
            "voldown" => Command::VolumeDown,
            "shuffle" => Command::Shuffle,
            "clear" => Command::Clear,
            "remove" | "rm" => Command::Remove(number(name, arg)?),
            "skipto" => Command::SkipTo(number(name, arg)?),
            "queue" | "q" => Command::Queue,
            "status" => Command::Status,
            "stop" | "leave" => Command::Stop,
            other => return Err(Error::InvalidCommand(format!("unknown command '{}'", other))),
        };
        Ok(command)
    }
}

fn required<'a>(name: &str, arg: &'a str) -> Result<&'a str> {
    if arg.is_empty() {
        return Err(Error::InvalidCommand(format!("'{}' needs an argument", name)));
    }
    Ok(arg)
}

fn number<T: FromStr>(name: &str, arg: &str) -> Result<T> {
    required(name, arg)?
        .parse()
        .map_err(|_| Error::InvalidCommand(format!("'{}' needs a number, got '{}'", name, arg)))
}

fn percent(name: &str, arg: &str) -> Result<f32> {
    let value: f32 = number(name, arg)?;
    if !value.is_finite() {
        return Err(Error::InvalidCommand(format!(
            "'{}' needs a finite number, got '{}'",
            name, arg
        )));
    }
    Ok(value)
}

/// One parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleRequest {
    InstanceStatus,
    Session { tenant: TenantId, command: Command },
}

pub fn parse_line(line: &str) -> Result<ConsoleRequest> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("status") {
        return Ok(ConsoleRequest::InstanceStatus);
    }

    let (tenant, rest) = line
        .split_once(char::is_whitespace)
        .ok_or_else(|| Error::InvalidCommand("expected '<tenant> <command>'".to_string()))?;
    let tenant = tenant
        .parse()
        .map_err(|_| Error::InvalidCommand(format!("bad tenant id '{}'", tenant)))?;

    Ok(ConsoleRequest::Session {
        tenant,
        command: rest.parse()?,
    })
}

/// Executes console commands against a session manager
pub struct Console {
    manager: Arc<SessionManager>,
    resolver: Arc<dyn Resolver>,
    track_source: Option<Arc<dyn TrackSource>>,
    requester: String,
}

impl Console {
    pub fn new(
        manager: Arc<SessionManager>,
        resolver: Arc<dyn Resolver>,
        track_source: Option<Arc<dyn TrackSource>>,
        requester: impl Into<String>,
    ) -> Self {
        Self {
            manager,
            resolver,
            track_source,
            requester: requester.into(),
        }
    }

    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// Parse and execute one line; returns the reply text
    pub async fn handle_line(&self, line: &str) -> Result<String> {
        match parse_line(line)? {
            ConsoleRequest::InstanceStatus => {
                let status = self.manager.instance_status().await;
                Ok(serde_json::to_string_pretty(&status).unwrap_or_else(|e| e.to_string()))
            }
            ConsoleRequest::Session { tenant, command } => self.execute(tenant, command).await,
        }
    }

    pub async fn execute(&self, tenant: TenantId, command: Command) -> Result<String> {
        debug!(tenant, ?command, "Executing command");

        match command {
            Command::Play(query) => self.play(tenant, &query).await,
            Command::PlayNext(query) => self.play_next(tenant, &query).await,
            command => {
                let session = self.live_session(tenant).await?;
                self.control(&session, command).await
            }
        }
    }

    async fn play(&self, tenant: TenantId, query: &str) -> Result<String> {
        let session = self.manager.get_or_create(tenant).await;
        self.ensure_surface(&session).await;

        if let Some(source) = self.accepting_source(query) {
            let BufferedEnqueue {
                first,
                position,
                done,
            } = session
                .enqueue_stream(source.expand(query, &self.requester))
                .await?;
            tokio::spawn(async move {
                if let Ok(count) = done.await {
                    info!(tenant, "Finished buffering {} track(s)", count);
                }
            });
            return Ok(format!(
                "Queued: {} (position #{}), buffering the rest",
                first.label(),
                position
            ));
        }

        let track = self.lookup(query).await;
        let label = track.title.clone().unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        let position = session.enqueue(track)?;
        Ok(format!("Queued: {} (position #{})", label, position))
    }

    async fn play_next(&self, tenant: TenantId, query: &str) -> Result<String> {
        let session = self.manager.get_or_create(tenant).await;
        self.ensure_surface(&session).await;

        let track = match self.accepting_source(query) {
            // Only the first entry of an expansion jumps the queue
            Some(source) => {
                let mut tracks = source.expand(query, &self.requester);
                tracks
                    .next()
                    .await
                    .ok_or_else(|| Error::Empty("queue from that source".to_string()))??
            }
            None => self.lookup(query).await,
        };

        let label = track.title.clone().unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        session.enqueue_front(track)?;
        session.refresh_ui(true).await;
        Ok(format!("Playing next: {}", label))
    }

    async fn control(&self, session: &Arc<PlaybackSession>, command: Command) -> Result<String> {
        let reply = match command {
            Command::Skip => {
                if !session.skip() {
                    return Err(Error::Empty("skip".to_string()));
                }
                "Skipped".to_string()
            }
            Command::Previous => {
                session.previous()?;
                session.refresh_ui(true).await;
                "Going back to the previous track".to_string()
            }
            Command::Pause => {
                if !session.pause() {
                    return Err(Error::Empty("pause".to_string()));
                }
                session.refresh_ui(true).await;
                "Paused".to_string()
            }
            Command::Resume => {
                if !session.resume() {
                    return Err(Error::Empty("resume".to_string()));
                }
                session.refresh_ui(true).await;
                "Resumed".to_string()
            }
            Command::Volume(percent) => {
                let volume = session.set_volume(percent / 100.0);
                session.refresh_ui(true).await;
                volume_reply(volume)
            }
            Command::VolumeUp => {
                let volume = session.volume_up();
                session.refresh_ui(true).await;
                volume_reply(volume)
            }
            Command::VolumeDown => {
                let volume = session.volume_down();
                session.refresh_ui(true).await;
                volume_reply(volume)
            }
            Command::Shuffle => {
                let count = session.shuffle();
                if count == 0 {
                    return Err(Error::Empty("shuffle".to_string()));
                }
                session.refresh_ui(true).await;
                format!("Shuffled {} track(s)", count)
            }
            Command::Clear => format!("Cleared {} track(s)", session.clear()),
            Command::Remove(position) => {
                let position = queue_position(session, position)?;
                let removed = session.remove(position)?;
                format!("Removed: {}", removed.label())
            }
            Command::SkipTo(position) => {
                let index = queue_position(session, position)?;
                session.skip_to(index)?;
                format!("Skipped to #{}", position)
            }
            Command::Queue => session.format_queue(session.config().queue_display_len),
            Command::Status => {
                serde_json::to_string_pretty(&session.status()).unwrap_or_else(|e| e.to_string())
            }
            Command::Stop => {
                session.stop(StopReason::Requested).await;
                "Stopped".to_string()
            }
            Command::Play(_) | Command::PlayNext(_) => {
                return Err(Error::InvalidCommand("play needs a session".to_string()))
            }
        };
        Ok(reply)
    }

    async fn live_session(&self, tenant: TenantId) -> Result<Arc<PlaybackSession>> {
        match self.manager.get(tenant).await {
            Some(session) if !session.is_stopped() => Ok(session),
            _ => Err(Error::Empty("control, nothing is playing here".to_string())),
        }
    }

    fn accepting_source(&self, query: &str) -> Option<&Arc<dyn TrackSource>> {
        self.track_source.as_ref().filter(|source| source.accepts(query))
    }

    /// Build a track with up-front metadata when the resolver can provide it
    async fn lookup(&self, query: &str) -> Track {
        let mut track = Track::new(query, self.requester.as_str());
        match self.resolver.resolve(query).await {
            Ok(info) => track.enrich(&info),
            Err(e) => debug!("Title lookup for '{}' failed: {}", query, e),
        }
        track
    }

    /// New sessions get a panel surface when the factory does not provide one
    async fn ensure_surface(&self, session: &Arc<PlaybackSession>) {
        if session.surface_kind().await.is_none() {
            if let Some(surface) = self.manager.default_surface(session.tenant()) {
                session.attach_surface(SurfaceKind::Panel, surface).await;
            }
        }
    }
}

fn volume_reply(volume: f32) -> String {
    format!("Volume: {}%", (volume * 100.0).round() as i64)
}

/// Validate a user-supplied 1-based position
fn queue_position(session: &PlaybackSession, position: i64) -> Result<usize> {
    usize::try_from(position)
        .ok()
        .filter(|p| *p >= 1)
        .ok_or_else(|| Error::OutOfRange {
            position,
            len: session.queue_len(),
        })
}
