//! Background monitoring tasks for a session

use super::PlaybackSession;
use crate::playback::{IdleWatchdog, WatchdogObservation};
use gmp_common::events::PlaybackState;
use std::sync::Arc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

impl PlaybackSession {
    /// Start the idle/empty-room watchdog unless one is already running
    pub(super) fn ensure_watchdog(self: &Arc<Self>) {
        if self.cancel.is_cancelled() {
            return;
        }
        let mut tasks = self.lock_tasks();
        if tasks.watchdog.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        tasks.watchdog = Some(tokio::spawn(watchdog_task(Arc::clone(self))));
    }

    /// (Re)start the per-track UI updater
    pub(super) fn start_updater(self: &Arc<Self>) {
        if self.cancel.is_cancelled() {
            return;
        }
        let mut tasks = self.lock_tasks();
        if let Some(old) = tasks.updater.take() {
            old.abort();
        }
        tasks.updater = Some(tokio::spawn(updater_task(Arc::clone(self))));
    }

    pub(super) fn stop_updater(&self) {
        if let Some(handle) = self.lock_tasks().updater.take() {
            handle.abort();
        }
    }

    fn observe(&self) -> WatchdogObservation {
        let audience = self
            .transport
            .connection_info()
            .and_then(|info| self.audience.current_participants(&info));

        let state = self.lock_state();
        WatchdogObservation {
            now: Instant::now(),
            audience,
            busy: state.phase.is_busy(),
            queue_empty: state.queue.is_empty(),
            last_activity: state.clock.last_activity(),
        }
    }
}

/// Watchdog task - polls every `watchdog_poll` while the transport is connected
///
/// On trip it hands `stop` to a fresh task (stop waits for this one) and
/// exits.
async fn watchdog_task(session: Arc<PlaybackSession>) {
    let tenant = session.tenant;
    let poll = session.config.watchdog_poll;
    let mut watchdog = IdleWatchdog::new(
        session.config.empty_channel_timeout,
        session.config.idle_timeout,
    );
    let mut interval = time::interval_at(Instant::now() + poll, poll);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(tenant, "Watchdog started ({}ms poll)", poll.as_millis());

    loop {
        tokio::select! {
            _ = session.cancel.cancelled() => return,
            _ = interval.tick() => {}
        }

        if !session.transport.is_connected() {
            debug!(tenant, "Transport disconnected, watchdog exiting");
            return;
        }

        if let Some(reason) = watchdog.evaluate(session.observe()) {
            info!(tenant, "Disconnecting: {}", reason);
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.stop(reason).await });
            return;
        }
    }
}

/// UI updater task - forced render at track start, then throttled ticks
/// while the track is playing or paused
async fn updater_task(session: Arc<PlaybackSession>) {
    let tick = session.config.refresh_tick;

    session.reset_refresh_throttle().await;
    session.refresh_ui(true).await;

    let mut interval = time::interval_at(Instant::now() + tick, tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = session.cancel.cancelled() => return,
            _ = interval.tick() => {}
        }

        if !matches!(session.state(), PlaybackState::Playing | PlaybackState::Paused) {
            return;
        }
        session.refresh_ui(false).await;
    }
}
