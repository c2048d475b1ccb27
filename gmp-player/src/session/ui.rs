//! UI surface attachment and throttled refresh

use super::PlaybackSession;
use crate::collaborators::{RenderOutcome, UiSurface};
use crate::config::PlayerConfig;
use crate::error::Error;
use crate::playback::RefreshThrottle;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// How a surface is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    /// Persistent control panel; shows the idle layout after stop
    Panel,
    /// One-off now-playing message; left as is after stop
    NowPlaying,
}

/// What a refresh attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Rendered,
    /// Too soon after the last successful edit
    Throttled,
    RateLimited,
    /// Surface reported gone and was detached
    Detached,
    NoSurface,
    /// Nothing playing and the refresh was not forced
    NothingPlaying,
}

#[derive(Clone)]
struct AttachedSurface {
    kind: SurfaceKind,
    surface: Arc<dyn UiSurface>,
}

pub(super) struct UiSlot {
    attached: Option<AttachedSurface>,
    throttle: RefreshThrottle,
}

impl UiSlot {
    pub(super) fn new(config: &PlayerConfig) -> Self {
        Self {
            attached: None,
            throttle: RefreshThrottle::new(config.refresh_min_interval, config.refresh_max_interval),
        }
    }
}

impl PlaybackSession {
    /// Attach (or replace) the surface refreshed by this session
    pub async fn attach_surface(&self, kind: SurfaceKind, surface: Arc<dyn UiSurface>) {
        let mut ui = self.ui.lock().await;
        ui.attached = Some(AttachedSurface { kind, surface });
        ui.throttle.reset();
        debug!(tenant = self.tenant, ?kind, "Surface attached");
    }

    /// Returns false when no surface was attached
    pub async fn detach_surface(&self) -> bool {
        self.ui.lock().await.attached.take().is_some()
    }

    pub async fn surface_kind(&self) -> Option<SurfaceKind> {
        self.ui.lock().await.attached.as_ref().map(|a| a.kind)
    }

    /// Push the current status to the attached surface
    ///
    /// Unforced refreshes are skipped while nothing is playing or when the
    /// throttle interval has not elapsed. Forced refreshes bypass the
    /// interval check but still feed the throttle.
    pub async fn refresh_ui(&self, force: bool) -> RefreshOutcome {
        let mut ui = self.ui.lock().await;
        let Some(attached) = ui.attached.clone() else {
            return RefreshOutcome::NoSurface;
        };

        if !force && self.current().is_none() {
            return RefreshOutcome::NothingPlaying;
        }

        let now = Instant::now();
        if !ui.throttle.should_attempt(now, force) {
            return RefreshOutcome::Throttled;
        }

        let status = self.status();
        match attached.surface.render(&status).await {
            RenderOutcome::Edited => {
                ui.throttle.record_success(now);
                RefreshOutcome::Rendered
            }
            RenderOutcome::RateLimited => {
                ui.throttle.record_rate_limited();
                debug!(
                    tenant = self.tenant,
                    interval_ms = ui.throttle.interval().as_millis() as u64,
                    "Surface rate limited, backing off"
                );
                RefreshOutcome::RateLimited
            }
            RenderOutcome::Gone => {
                ui.attached = None;
                warn!(
                    tenant = self.tenant,
                    "{}",
                    Error::Surface("surface is gone, detaching".to_string())
                );
                RefreshOutcome::Detached
            }
        }
    }

    /// Back to the floor interval (new track)
    pub(super) async fn reset_refresh_throttle(&self) {
        self.ui.lock().await.throttle.reset();
    }

    /// Show the idle layout on a panel surface after teardown
    pub(super) async fn render_final_panel(&self) {
        if self.surface_kind().await == Some(SurfaceKind::Panel) {
            self.refresh_ui(true).await;
        }
    }
}
