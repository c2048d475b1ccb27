//! Per-tenant playback session
//!
//! A [`PlaybackSession`] owns one tenant's queue, history, clock and volume
//! and drives a single consumer loop (the player) against its transport.
//! All mutable state sits behind one lock; every operation commits as a
//! single step with respect to the player loop and the lock is never held
//! across an await.
//!
//! Background work (player loop, watchdog, UI updater, buffered enqueues)
//! hangs off the session's cancellation token and is torn down by
//! [`PlaybackSession::stop`].

mod buffered;
mod monitor;
mod player;
mod status;
mod ui;

pub use buffered::BufferedEnqueue;
pub use status::{CurrentTrackStatus, SessionStatus, VoiceStatus};
pub use ui::{RefreshOutcome, SurfaceKind};

use crate::collaborators::{AudienceSource, Resolver, SessionCollaborators, Transport};
use crate::config::PlayerConfig;
use crate::error::{Error, Result};
use crate::playback::{ActivityClock, History, TrackQueue};
use crate::track::Track;
use gmp_common::config::{clamp_volume, DEFAULT_VOLUME};
use gmp_common::events::{EventBus, PlaybackState, SessionEvent, StopReason};
use gmp_common::TenantId;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use ui::UiSlot;

/// Mutable session state, guarded by `PlaybackSession::state`
struct SessionState {
    phase: PlaybackState,
    current: Option<Track>,
    queue: TrackQueue,
    history: History,
    clock: ActivityClock,
    volume: f32,
    /// Skip requested while the current track was still resolving
    skip_pending: bool,
}

#[derive(Default)]
struct SessionTasks {
    player: Option<JoinHandle<()>>,
    watchdog: Option<JoinHandle<()>>,
    updater: Option<JoinHandle<()>>,
    background: Vec<JoinHandle<()>>,
}

impl SessionTasks {
    fn drain(&mut self) -> Vec<JoinHandle<()>> {
        let mut handles: Vec<_> = [self.player.take(), self.watchdog.take(), self.updater.take()]
            .into_iter()
            .flatten()
            .collect();
        handles.append(&mut self.background);
        handles
    }
}

/// One tenant's playback scheduler
pub struct PlaybackSession {
    tenant: TenantId,
    config: PlayerConfig,
    state: Mutex<SessionState>,
    /// Wakes the player loop when the queue gains a head
    track_ready: Notify,
    resolver: Arc<dyn Resolver>,
    transport: Arc<dyn Transport>,
    audience: Arc<dyn AudienceSource>,
    events: EventBus,
    ui: tokio::sync::Mutex<UiSlot>,
    cancel: CancellationToken,
    tasks: Mutex<SessionTasks>,
}

impl PlaybackSession {
    pub fn new(
        tenant: TenantId,
        config: PlayerConfig,
        collaborators: SessionCollaborators,
    ) -> Arc<Self> {
        let state = SessionState {
            phase: PlaybackState::Idle,
            current: None,
            queue: TrackQueue::new(),
            history: History::new(config.history_capacity),
            clock: ActivityClock::new(),
            volume: clamp_volume(config.default_volume).unwrap_or(DEFAULT_VOLUME),
            skip_pending: false,
        };

        Arc::new(Self {
            tenant,
            events: EventBus::new(config.event_capacity),
            ui: tokio::sync::Mutex::new(UiSlot::new(&config)),
            config,
            state: Mutex::new(state),
            track_ready: Notify::new(),
            resolver: collaborators.resolver,
            transport: collaborators.transport,
            audience: collaborators.audience,
            cancel: CancellationToken::new(),
            tasks: Mutex::new(SessionTasks::default()),
        })
    }

    pub fn tenant(&self) -> TenantId {
        self.tenant
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn state(&self) -> PlaybackState {
        self.lock_state().phase
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == PlaybackState::Stopped
    }

    /// Subscribe to this session's events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Start the player loop if it is not already running
    ///
    /// Called implicitly by every enqueue; a loop that exited because the
    /// transport dropped is restarted here.
    pub fn start(self: &Arc<Self>) {
        if self.cancel.is_cancelled() {
            return;
        }
        {
            let mut tasks = self.lock_tasks();
            let running = tasks.player.as_ref().is_some_and(|h| !h.is_finished());
            if !running {
                debug!(tenant = self.tenant, "Starting player loop");
                tasks.player = Some(tokio::spawn(player::run(Arc::clone(self))));
            }
        }
        self.ensure_watchdog();
    }

    /// Append a track; returns its 1-based queue position
    pub fn enqueue(self: &Arc<Self>, track: Track) -> Result<usize> {
        let (position, len) = {
            let mut state = self.lock_state();
            self.ensure_running(&state)?;
            state.clock.mark_activity();
            let position = state.queue.enqueue(track);
            (position, state.queue.len())
        };

        self.track_ready.notify_one();
        self.queue_changed(len);
        self.start();
        Ok(position)
    }

    /// Insert a track at the head so it plays next
    pub fn enqueue_front(self: &Arc<Self>, track: Track) -> Result<()> {
        let len = {
            let mut state = self.lock_state();
            self.ensure_running(&state)?;
            state.clock.mark_activity();
            state.queue.enqueue_front(track);
            state.queue.len()
        };

        self.track_ready.notify_one();
        self.queue_changed(len);
        self.start();
        Ok(())
    }

    /// Position a track appended now would take
    pub fn position_for_append(&self) -> usize {
        self.lock_state().queue.len() + 1
    }

    /// Remove the pending track at 1-based `position`
    pub fn remove(&self, position: usize) -> Result<Track> {
        let (removed, len) = {
            let mut state = self.lock_state();
            state.clock.mark_activity();
            let removed = state.queue.remove(position)?;
            (removed, state.queue.len())
        };
        self.queue_changed(len);
        Ok(removed)
    }

    /// Drop everything before `position` and skip the current track so the
    /// target plays next; returns the number of tracks dropped
    pub fn skip_to(&self, position: usize) -> Result<usize> {
        let (dropped, len) = {
            let mut state = self.lock_state();
            state.clock.mark_activity();
            let dropped = state.queue.skip_to(position)?;
            self.skip_locked(&mut state);
            (dropped, state.queue.len())
        };
        self.queue_changed(len);
        Ok(dropped)
    }

    /// Returns the number of pending tracks shuffled
    pub fn shuffle(&self) -> usize {
        let count = {
            let mut state = self.lock_state();
            state.clock.mark_activity();
            state.queue.shuffle()
        };
        self.queue_changed(count);
        count
    }

    /// Returns the number of pending tracks removed
    pub fn clear(&self) -> usize {
        let removed = {
            let mut state = self.lock_state();
            state.clock.mark_activity();
            state.queue.clear()
        };
        self.queue_changed(0);
        removed
    }

    /// End the current track early
    ///
    /// Returns false when nothing is in flight. A skip during resolution
    /// takes effect once resolution completes: the track is recorded as
    /// played and never reaches the transport.
    pub fn skip(&self) -> bool {
        let mut state = self.lock_state();
        state.clock.mark_activity();
        self.skip_locked(&mut state)
    }

    /// Skip with the state lock already held; a queue edit made under the
    /// same guard commits together with the skip
    fn skip_locked(&self, state: &mut SessionState) -> bool {
        match state.phase {
            PlaybackState::Playing | PlaybackState::Paused => {
                debug!(tenant = self.tenant, "Skipping current track");
                self.transport.stop();
                true
            }
            PlaybackState::Resolving => {
                state.skip_pending = true;
                true
            }
            _ => false,
        }
    }

    /// Go back one track
    ///
    /// The most recent history entry is placed at the head of the queue,
    /// followed by the interrupted current track, and the current track is
    /// skipped. Fails with `Error::Empty` when history is empty.
    pub fn previous(self: &Arc<Self>) -> Result<()> {
        let len = {
            let mut state = self.lock_state();
            self.ensure_running(&state)?;
            state.clock.mark_activity();
            let previous = state
                .history
                .pop()
                .ok_or_else(|| Error::Empty("go back to".to_string()))?;
            if let Some(current) = state.current.clone() {
                state.queue.enqueue_front(current);
            }
            state.queue.enqueue_front(previous);
            self.skip_locked(&mut state);
            state.queue.len()
        };

        self.track_ready.notify_one();
        self.queue_changed(len);
        self.start();
        Ok(())
    }

    /// Returns false unless a track was playing
    pub fn pause(&self) -> bool {
        let mut state = self.lock_state();
        state.clock.mark_activity();
        if state.phase != PlaybackState::Playing {
            return false;
        }
        self.transport.pause();
        state.clock.pause();
        self.set_phase(&mut state, PlaybackState::Paused);
        true
    }

    /// Returns false unless a track was paused
    pub fn resume(&self) -> bool {
        let mut state = self.lock_state();
        state.clock.mark_activity();
        if state.phase != PlaybackState::Paused {
            return false;
        }
        self.transport.resume();
        state.clock.resume();
        self.set_phase(&mut state, PlaybackState::Playing);
        true
    }

    /// Pause when playing, resume when paused; returns the resulting state
    pub fn toggle_pause(&self) -> PlaybackState {
        if !self.pause() {
            self.resume();
        }
        self.state()
    }

    pub fn volume(&self) -> f32 {
        self.lock_state().volume
    }

    /// Set the volume (clamped to 0.0..=2.0); returns the applied value
    ///
    /// A NaN or infinite request leaves the volume unchanged.
    pub fn set_volume(&self, volume: f32) -> f32 {
        self.update_volume(|_| volume)
    }

    pub fn volume_up(&self) -> f32 {
        let step = self.config.volume_step;
        self.update_volume(|v| v + step)
    }

    pub fn volume_down(&self) -> f32 {
        let step = self.config.volume_step;
        self.update_volume(|v| v - step)
    }

    fn update_volume(&self, f: impl FnOnce(f32) -> f32) -> f32 {
        let volume = {
            let mut state = self.lock_state();
            state.clock.mark_activity();
            let Some(volume) = clamp_volume(f(state.volume)) else {
                warn!(tenant = self.tenant, "Ignoring non-finite volume");
                return state.volume;
            };
            state.volume = volume;
            if matches!(state.phase, PlaybackState::Playing | PlaybackState::Paused) {
                self.transport.set_volume(volume);
            }
            volume
        };

        self.emit(SessionEvent::VolumeChanged {
            tenant: self.tenant,
            volume,
            timestamp: chrono::Utc::now(),
        });
        volume
    }

    /// Record a user interaction without changing anything else
    pub fn mark_activity(&self) {
        self.lock_state().clock.mark_activity();
    }

    pub fn current(&self) -> Option<Track> {
        self.lock_state().current.clone()
    }

    pub fn queue_len(&self) -> usize {
        self.lock_state().queue.len()
    }

    pub fn queue_snapshot(&self) -> Vec<Track> {
        self.lock_state().queue.snapshot()
    }

    /// History entries oldest-first
    pub fn history_snapshot(&self) -> Vec<Track> {
        self.lock_state().history.snapshot()
    }

    pub fn status(&self) -> SessionStatus {
        let voice = self.transport.connection_info().map(|connection| VoiceStatus {
            connection,
            playing: self.transport.is_playing(),
            paused: self.transport.is_paused(),
        });

        let state = self.lock_state();
        let current = state.current.as_ref().map(|track| CurrentTrackStatus {
            title: track.title.clone(),
            query: track.query.clone(),
            artist: track.artist.clone(),
            url: track.url.clone(),
            requested_by: track.requested_by.clone(),
            duration: track.duration,
            elapsed: state.clock.elapsed().as_secs(),
            remaining: state.clock.remaining(track.duration).map(|d| d.as_secs()),
            thumbnail: track.thumbnail.clone(),
        });

        SessionStatus {
            tenant: self.tenant,
            state: state.phase,
            current,
            queue_len: state.queue.len(),
            queue_preview: state.queue.preview(self.config.queue_preview_len),
            history_len: state.history.len(),
            volume: state.volume,
            voice,
        }
    }

    /// Human-readable listing of the current track and up to `limit`
    /// pending ones
    pub fn format_queue(&self, limit: usize) -> String {
        let state = self.lock_state();

        let mut out = match (&state.current, state.phase) {
            (Some(track), PlaybackState::Resolving) => format!("Now: {} (loading)\n", track.label()),
            (Some(track), PlaybackState::Paused) => format!("Now: {} (paused)\n", track.label()),
            (Some(track), _) => format!("Now: {}\n", track.label()),
            (None, _) => "Now: nothing playing\n".to_string(),
        };

        if state.queue.is_empty() {
            out.push_str("Queue: (empty)");
            return out;
        }

        out.push_str("Queue:");
        for (i, label) in state.queue.preview(limit).iter().enumerate() {
            out.push_str(&format!("\n{}. {}", i + 1, label));
        }
        let hidden = state.queue.len().saturating_sub(limit);
        if hidden > 0 {
            out.push_str(&format!("\n...and {} more", hidden));
        }
        out
    }

    /// Tear the session down
    ///
    /// Clears the queue, cancels every background task and waits for them,
    /// stops and disconnects the transport, then renders a final idle panel.
    /// Idempotent: later calls return immediately. Must not be awaited from
    /// one of the session's own tasks.
    pub async fn stop(&self, reason: StopReason) {
        let (was_playing, cleared) = {
            let mut state = self.lock_state();
            if state.phase == PlaybackState::Stopped {
                debug!(tenant = self.tenant, "Session already stopped");
                return;
            }
            let was_playing = matches!(state.phase, PlaybackState::Playing | PlaybackState::Paused);
            self.set_phase(&mut state, PlaybackState::Stopped);
            state.current = None;
            state.skip_pending = false;
            state.clock.clear_track();
            (was_playing, state.queue.clear())
        };

        info!(tenant = self.tenant, cleared, "Stopping session: {}", reason);

        self.cancel.cancel();
        let handles = self.lock_tasks().drain();
        for handle in &handles {
            handle.abort();
        }
        for handle in handles {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    warn!(tenant = self.tenant, "Session task panicked: {}", e);
                }
            }
        }

        if was_playing {
            self.transport.stop();
        }
        if self.transport.is_connected() {
            if let Err(e) = self.transport.disconnect().await {
                warn!(tenant = self.tenant, "Failed to disconnect transport: {}", e);
            }
        }

        self.render_final_panel().await;

        if cleared > 0 {
            self.queue_changed(0);
        }
        self.emit(SessionEvent::SessionStopped {
            tenant: self.tenant,
            reason,
            timestamp: chrono::Utc::now(),
        });
    }

    fn ensure_running(&self, state: &SessionState) -> Result<()> {
        if state.phase == PlaybackState::Stopped {
            return Err(Error::SessionStopped(self.tenant));
        }
        Ok(())
    }

    /// Run `task` as tracked background work, cancelled by `stop`
    fn spawn_background<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.lock_tasks();
        tasks.background.retain(|h| !h.is_finished());
        if self.cancel.is_cancelled() {
            return;
        }
        tasks.background.push(tokio::spawn(task));
    }

    fn set_phase(&self, state: &mut SessionState, new_state: PlaybackState) {
        if state.phase == new_state {
            return;
        }
        let old_state = std::mem::replace(&mut state.phase, new_state);
        debug!(tenant = self.tenant, "State: {} -> {}", old_state, new_state);
        self.emit(SessionEvent::StateChanged {
            tenant: self.tenant,
            old_state,
            new_state,
            timestamp: chrono::Utc::now(),
        });
    }

    fn queue_changed(&self, queue_len: usize) {
        self.emit(SessionEvent::QueueChanged {
            tenant: self.tenant,
            queue_len,
            timestamp: chrono::Utc::now(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        self.events.emit_lossy(event);
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_tasks(&self) -> MutexGuard<'_, SessionTasks> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
