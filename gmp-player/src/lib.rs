//! # GMP Player Library (gmp-player)
//!
//! Per-tenant audio playback scheduler.
//!
//! **Purpose:** Keep one ordered queue per tenant, play it through an
//! external transport, keep a bounded history for "previous", refresh a
//! status surface without tripping rate limits, and disconnect idle or
//! empty sessions.
//!
//! **Architecture:** [`manager::SessionManager`] maps tenants to
//! [`session::PlaybackSession`]s. Each session runs one consumer loop over
//! its [`playback::TrackQueue`] and drives the collaborator traits in
//! [`collaborators`]; [`sim`] provides in-process implementations.

pub mod collaborators;
pub mod commands;
pub mod config;
pub mod error;
pub mod manager;
pub mod playback;
pub mod session;
pub mod sim;
pub mod track;

pub use error::{Error, Result};
pub use manager::SessionManager;
pub use session::PlaybackSession;
