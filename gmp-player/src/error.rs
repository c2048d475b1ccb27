//! Error types for gmp-player
//!
//! Only `OutOfRange` and `Empty` reach command callers as user-visible
//! failures. Resolution, transport and surface errors are recovered inside
//! the session (logged, track dropped or refresh backed off).

use thiserror::Error;

/// Main error type for gmp-player
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid 1-based queue position
    #[error("Position {position} is out of range (queue has {len} track(s))")]
    OutOfRange { position: i64, len: usize },

    /// Operation needs an entry that does not exist (history, current track, expansion)
    #[error("Nothing to {0}")]
    Empty(String),

    /// Resolver could not turn a query into a playable stream
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Transport failed to start or play a stream
    #[error("Transport error: {0}")]
    Transport(String),

    /// UI surface edit failed
    #[error("Surface error: {0}")]
    Surface(String),

    /// Session already torn down
    #[error("Session for tenant {0} is stopped")]
    SessionStopped(gmp_common::TenantId),

    /// Console command could not be parsed
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Errors from the common crate (configuration)
    #[error(transparent)]
    Common(#[from] gmp_common::Error),
}

/// Convenience Result type using gmp-player Error
pub type Result<T> = std::result::Result<T, Error>;
