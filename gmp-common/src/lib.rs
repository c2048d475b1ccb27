//! # GMP Common Library
//!
//! Shared code for the guild music player crates:
//! - Error type and `Result` alias
//! - Configuration loading (TOML file, environment overrides, compiled defaults)
//! - Session event vocabulary (`SessionEvent`, `PlaybackState`) and `EventBus`
//! - Human-readable time and progress formatting

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;

pub use error::{Error, Result};

/// Identifier of one independent playback tenant (one per server/guild)
pub type TenantId = u64;
