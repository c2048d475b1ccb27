//! gmp-player specific configuration
//!
//! Typed view of `gmp_common::config::PlayerSettings` with durations.

use gmp_common::config::{clamp_volume, PlayerSettings, TomlConfig, DEFAULT_VOLUME};
use std::time::Duration;

/// Scheduler configuration shared by every session of an instance
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub default_volume: f32,
    pub volume_step: f32,
    pub history_capacity: usize,
    pub queue_preview_len: usize,
    pub queue_display_len: usize,
    pub idle_timeout: Duration,
    pub empty_channel_timeout: Duration,
    pub watchdog_poll: Duration,
    pub refresh_tick: Duration,
    pub refresh_min_interval: Duration,
    pub refresh_max_interval: Duration,
    /// Per-session event channel capacity
    pub event_capacity: usize,
}

impl PlayerConfig {
    pub fn from_settings(settings: &PlayerSettings) -> Self {
        Self {
            default_volume: clamp_volume(settings.default_volume).unwrap_or(DEFAULT_VOLUME),
            volume_step: Some(settings.volume_step)
                .filter(|step| step.is_finite())
                .unwrap_or_else(|| PlayerSettings::default().volume_step),
            history_capacity: settings.history_capacity.max(1),
            queue_preview_len: settings.queue_preview_len,
            queue_display_len: settings.queue_display_len,
            idle_timeout: Duration::from_secs(settings.idle_disconnect_secs),
            empty_channel_timeout: Duration::from_secs(settings.empty_channel_disconnect_secs),
            watchdog_poll: Duration::from_millis(settings.watchdog_poll_ms),
            refresh_tick: Duration::from_millis(settings.refresh_tick_ms),
            refresh_min_interval: Duration::from_millis(settings.refresh_min_interval_ms),
            refresh_max_interval: Duration::from_millis(settings.refresh_max_interval_ms),
            event_capacity: 256,
        }
    }
}

impl From<&TomlConfig> for PlayerConfig {
    fn from(config: &TomlConfig) -> Self {
        Self::from_settings(&config.player)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self::from_settings(&PlayerSettings::default())
    }
}
