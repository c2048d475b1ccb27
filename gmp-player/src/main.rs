//! GMP Player (gmp-player) - Main entry point
//!
//! Runs the playback scheduler against simulated collaborators and reads
//! `<tenant> <command>` lines from stdin.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gmp_common::config::ConfigResolver;
use gmp_common::events::StopReason;
use gmp_player::commands::Console;
use gmp_player::config::PlayerConfig;
use gmp_player::sim::{ListTrackSource, SimAudience, SimFactory, SimResolver};
use gmp_player::SessionManager;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for gmp-player
#[derive(Parser, Debug)]
#[command(name = "gmp-player")]
#[command(about = "Per-tenant playback scheduler (simulated transport)")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long, env = "GMP_CONFIG")]
    config: Option<PathBuf>,

    /// Instance name reported by `status`
    #[arg(long, env = "GMP_INSTANCE_NAME")]
    instance_name: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "GMP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Upper bound for simulated track lengths in seconds
    #[arg(long, default_value = "30")]
    sim_track_secs: u64,

    /// Listener count reported for every simulated channel
    #[arg(long, default_value = "1")]
    sim_listeners: usize,

    /// Requester name recorded on queued tracks
    #[arg(long, default_value = "console")]
    requester: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Loaded before tracing so the file can pick the log level
    let resolver = ConfigResolver::new(args.config.clone());
    let config = resolver.load();

    let level = args
        .log_level
        .clone()
        .or_else(|| config.as_ref().ok().map(|c| c.logging.level.clone()))
        .unwrap_or_else(|| "info".to_string());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gmp_player={0},gmp_common={0}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = config.context("Failed to load configuration")?;
    match resolver.config_path() {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: compiled defaults"),
    }
    if let Some(name) = args.instance_name {
        config.instance_name = name;
    }

    info!(
        "Starting GMP Player instance '{}' (sim tracks up to {}s, {} listener(s))",
        config.instance_name, args.sim_track_secs, args.sim_listeners
    );

    let player_config = PlayerConfig::from(&config);
    let sim_resolver = Arc::new(SimResolver::new(args.sim_track_secs));
    let audience = Arc::new(SimAudience::new(args.sim_listeners));
    let factory = Arc::new(SimFactory::new(sim_resolver.clone(), audience));
    let manager = Arc::new(SessionManager::new(
        config.instance_name.clone(),
        player_config,
        factory,
    ));
    let console = Console::new(
        manager.clone(),
        sim_resolver,
        Some(Arc::new(ListTrackSource)),
        args.requester,
    );

    info!("Ready: enter '<tenant> <command>' lines, or 'status'");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next_line() => {
                match line.context("Failed to read console input")? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => match console.handle_line(&line).await {
                        Ok(reply) => println!("{}", reply),
                        Err(e) => println!("error: {}", e),
                    },
                    None => {
                        info!("Console input closed; waiting for shutdown signal");
                        (&mut shutdown).await;
                        break;
                    }
                }
            }
        }
    }

    manager.stop_all(StopReason::Requested).await;
    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
