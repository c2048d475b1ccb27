//! Consumer loop: pop, resolve, play, await completion, repeat

use super::PlaybackSession;
use crate::collaborators::CompletionSignal;
use crate::error::Error;
use crate::track::Track;
use gmp_common::events::{PlaybackState, SessionEvent};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

enum Launch {
    Started,
    /// Skip arrived while resolving
    Skipped,
    Failed(Error),
    /// Session stopped while resolving
    Abandoned,
}

/// Player loop body; exits on cancellation or when the transport drops
pub(super) async fn run(session: Arc<PlaybackSession>) {
    let tenant = session.tenant;
    let cancel = session.cancel.clone();
    debug!(tenant, "Player loop started");

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = session.next_track() => next,
        };
        let Some(track) = next else {
            break;
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = session.play_track(track) => {}
        }
    }

    debug!(tenant, "Player loop exited");
}

impl PlaybackSession {
    /// Wait for the queue head and make it current (`Resolving`)
    ///
    /// Returns None when the session stopped, or when the transport is no
    /// longer connected; the popped track is then put back at the head.
    async fn next_track(&self) -> Option<Track> {
        loop {
            {
                let mut state = self.lock_state();
                if state.phase == PlaybackState::Stopped {
                    return None;
                }
                if let Some(track) = state.queue.pop_front() {
                    if !self.transport.is_connected() {
                        warn!(
                            tenant = self.tenant,
                            "Transport disconnected, leaving {} queued",
                            track.label()
                        );
                        state.queue.enqueue_front(track);
                        return None;
                    }
                    state.current = Some(track.clone());
                    state.skip_pending = false;
                    self.set_phase(&mut state, PlaybackState::Resolving);
                    self.queue_changed(state.queue.len());
                    return Some(track);
                }
            }

            self.track_ready.notified().await;
        }
    }

    async fn play_track(self: &Arc<Self>, mut track: Track) {
        let tenant = self.tenant;

        let resolved = match self.resolver.resolve(&track.query).await {
            Ok(resolved) => resolved,
            Err(e) => {
                self.drop_current(&track, &e);
                return;
            }
        };
        track.enrich(&resolved);

        let (signal, completion) = CompletionSignal::channel();
        let launch = {
            let mut state = self.lock_state();
            if state.phase != PlaybackState::Resolving {
                Launch::Abandoned
            } else {
                state.current = Some(track.clone());
                if std::mem::take(&mut state.skip_pending) {
                    Launch::Skipped
                } else {
                    match self.transport.start(&resolved.stream, state.volume, signal) {
                        Ok(()) => {
                            state.clock.reset_for_new_track();
                            state.clock.mark_activity();
                            self.set_phase(&mut state, PlaybackState::Playing);
                            Launch::Started
                        }
                        Err(e) => Launch::Failed(e),
                    }
                }
            }
        };

        match launch {
            Launch::Started => {}
            Launch::Abandoned => return,
            Launch::Skipped => {
                info!(tenant, "Skipped {} before playback started", track.label());
                self.finish_current(None);
                return;
            }
            Launch::Failed(e) => {
                self.drop_current(&track, &e);
                return;
            }
        }

        info!(
            tenant,
            requested_by = %track.requested_by,
            "Now playing: {}",
            track.label()
        );
        self.emit(SessionEvent::TrackStarted {
            tenant,
            track_id: track.id,
            title: track.label().to_string(),
            timestamp: chrono::Utc::now(),
        });

        self.ensure_watchdog();
        self.start_updater();

        let error = completion.await.unwrap_or_else(|_| {
            debug!(tenant, "Transport dropped completion signal");
            None
        });
        self.stop_updater();

        if let Some(e) = &error {
            warn!(tenant, "Playback of {} ended with error: {}", track.label(), e);
        }
        self.finish_current(error);
    }

    /// Drain the current track into history and return to `Idle`
    fn finish_current(&self, error: Option<String>) {
        let finished = {
            let mut state = self.lock_state();
            if state.phase == PlaybackState::Stopped {
                return;
            }
            self.set_phase(&mut state, PlaybackState::Draining);
            state.clock.clear_track();
            let finished = state.current.take();
            if let Some(track) = &finished {
                state.history.push(track.clone());
            }
            self.set_phase(&mut state, PlaybackState::Idle);
            finished
        };

        if let Some(track) = finished {
            self.emit(SessionEvent::TrackFinished {
                tenant: self.tenant,
                track_id: track.id,
                title: track.label().to_string(),
                error,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    /// Discard a track that could not be resolved or started
    ///
    /// Failed tracks are not recorded in history.
    fn drop_current(&self, track: &Track, reason: &Error) {
        error!(
            tenant = self.tenant,
            query = %track.query,
            "Dropping track: {}",
            reason
        );

        {
            let mut state = self.lock_state();
            if state.phase == PlaybackState::Stopped {
                return;
            }
            state.current = None;
            state.skip_pending = false;
            self.set_phase(&mut state, PlaybackState::Idle);
        }

        self.emit(SessionEvent::TrackFailed {
            tenant: self.tenant,
            track_id: track.id,
            query: track.query.clone(),
            reason: reason.to_string(),
            timestamp: chrono::Utc::now(),
        });
    }
}
