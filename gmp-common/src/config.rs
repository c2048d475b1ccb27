//! Configuration loading
//!
//! Configuration file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. `GMP_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/gmp/config.toml`), if present
//! 4. Compiled defaults (no file)
//!
//! A missing file never prevents startup: a warning is logged and the
//! compiled defaults are used. Individual settings can then be overridden
//! through `GMP_*` environment variables.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "GMP_CONFIG";

/// Volume range accepted by the transport (1.0 is unity gain)
pub const MIN_VOLUME: f32 = 0.0;
pub const MAX_VOLUME: f32 = 2.0;
pub const DEFAULT_VOLUME: f32 = 1.0;

/// Clamp `volume` into `MIN_VOLUME..=MAX_VOLUME`; None for NaN or infinity
pub fn clamp_volume(volume: f32) -> Option<f32> {
    volume
        .is_finite()
        .then(|| volume.clamp(MIN_VOLUME, MAX_VOLUME))
}

/// Top-level TOML configuration
///
/// Every field has a default, so an empty file (or no file) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Name reported by the status export
    pub instance_name: String,
    pub logging: LoggingConfig,
    pub player: PlayerSettings,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            instance_name: "instance-1".to_string(),
            logging: LoggingConfig::default(),
            player: PlayerSettings::default(),
        }
    }
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Per-session scheduler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Volume applied to newly created sessions (0.0-2.0)
    pub default_volume: f32,
    /// Increment used by volume up/down commands
    pub volume_step: f32,
    /// Number of played tracks remembered for "previous"
    pub history_capacity: usize,
    /// Number of queued titles included in a status snapshot
    pub queue_preview_len: usize,
    /// Number of queued titles shown by the queue listing
    pub queue_display_len: usize,
    /// Idle time (no playback, empty queue, no commands) before teardown
    pub idle_disconnect_secs: u64,
    /// Time with nobody listening before teardown
    pub empty_channel_disconnect_secs: u64,
    /// Watchdog poll period
    pub watchdog_poll_ms: u64,
    /// UI updater tick period
    pub refresh_tick_ms: u64,
    /// Floor of the adaptive UI refresh interval
    pub refresh_min_interval_ms: u64,
    /// Cap of the adaptive UI refresh interval
    pub refresh_max_interval_ms: u64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            default_volume: DEFAULT_VOLUME,
            volume_step: 0.1,
            history_capacity: 25,
            queue_preview_len: 10,
            queue_display_len: 15,
            idle_disconnect_secs: 300,
            empty_channel_disconnect_secs: 30,
            watchdog_poll_ms: 5_000,
            refresh_tick_ms: 500,
            refresh_min_interval_ms: 1_000,
            refresh_max_interval_ms: 5_000,
        }
    }
}

impl TomlConfig {
    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply `GMP_*` environment overrides on top of file values
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(name) = std::env::var("GMP_INSTANCE_NAME") {
            if !name.trim().is_empty() {
                self.instance_name = name.trim().to_string();
            }
        }
        env_override("GMP_DEFAULT_VOLUME", &mut self.player.default_volume);
        env_override("GMP_VOLUME_STEP", &mut self.player.volume_step);
        env_override("GMP_IDLE_DISCONNECT_SECONDS", &mut self.player.idle_disconnect_secs);
        env_override(
            "GMP_EMPTY_CHANNEL_DISCONNECT_SECONDS",
            &mut self.player.empty_channel_disconnect_secs,
        );
    }

    /// Normalise values that have a safe interpretation and reject the rest
    pub fn validate(&mut self) -> Result<()> {
        let volume = clamp_volume(self.player.default_volume).ok_or_else(|| {
            Error::Config(format!(
                "default_volume must be a finite number, got {}",
                self.player.default_volume
            ))
        })?;
        if !self.player.volume_step.is_finite() {
            return Err(Error::Config(format!(
                "volume_step must be a finite number, got {}",
                self.player.volume_step
            )));
        }
        if volume != self.player.default_volume {
            warn!(
                "default_volume {} outside {}-{}, clamped to {}",
                self.player.default_volume, MIN_VOLUME, MAX_VOLUME, volume
            );
            self.player.default_volume = volume;
        }

        if self.player.history_capacity == 0 {
            return Err(Error::Config("history_capacity must be at least 1".to_string()));
        }
        if self.player.watchdog_poll_ms == 0 || self.player.refresh_tick_ms == 0 {
            return Err(Error::Config(
                "watchdog_poll_ms and refresh_tick_ms must be non-zero".to_string(),
            ));
        }
        if self.player.refresh_min_interval_ms > self.player.refresh_max_interval_ms {
            return Err(Error::Config(format!(
                "refresh_min_interval_ms ({}) exceeds refresh_max_interval_ms ({})",
                self.player.refresh_min_interval_ms, self.player.refresh_max_interval_ms
            )));
        }
        Ok(())
    }
}

/// Resolves and loads the configuration file
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    /// Create a resolver; `cli_path` is the `--config` argument, if given
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Configuration file to read, by priority
    ///
    /// Explicit paths (CLI, env) are returned even when missing so the
    /// caller can warn about them; the platform default only when it exists.
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        default_config_file().filter(|p| p.exists())
    }

    /// Load, apply environment overrides and validate
    pub fn load(&self) -> Result<TomlConfig> {
        let mut config = match self.config_path() {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                TomlConfig::from_file(&path)?
            }
            Some(path) => {
                warn!(
                    "Configuration file {} not found, using defaults",
                    path.display()
                );
                TomlConfig::default()
            }
            None => {
                debug!("No configuration file, using compiled defaults");
                TomlConfig::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

/// Platform configuration file location
fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gmp").join("config.toml"))
}

fn env_override<T: FromStr>(name: &str, target: &mut T) {
    if let Ok(raw) = std::env::var(name) {
        match raw.trim().parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => warn!("Ignoring unparseable {}={:?}", name, raw),
        }
    }
}
