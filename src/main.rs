//! q2discord - Discord command bridge for Quake II game servers
//!
//! Standalone console host: runs the bridge against a stand-in game server
//! that prints dispatched commands and mirrors lines typed on stdin.

use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info, warn};

use q2discord::config::env::get_config_path;
use q2discord::config::load_and_validate;
use q2discord::{Bridge, GameHost, Severity};

/// Server frame length (10 Hz, like the game).
const FRAME: Duration = Duration::from_millis(100);

/// Stand-in game server.
struct ConsoleHost;

impl GameHost for ConsoleHost {
    fn execute_command(&mut self, command: &str) {
        info!(target: "game", "exec: {}", command.trim_end());
    }

    fn broadcast_chat(&mut self, message: &str) {
        print!("{}", message);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("q2discord v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        e
    })?;

    info!("Configuration loaded successfully");
    match config.channel_id() {
        Some(id) => info!("  Channel: {}", id),
        None => warn!("  Channel: none, mirroring disabled"),
    }
    info!("  Command prefix: {}", config.discord.command_prefix);

    let mut bridge = Bridge::initialize(config)?;
    let mut host = ConsoleHost;

    let mut frames = tokio::time::interval(FRAME);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            _ = frames.tick() => {
                bridge.drain_inbound(&mut host);
            }
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => mirror_console_line(&bridge, &line),
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    stdin_open = false;
                }
            },
        }
    }

    // Shutdown blocks for up to the grace period plus the join timeout
    let report = tokio::task::spawn_blocking(move || bridge.shutdown()).await?;
    if let Some(report) = report {
        if report.abandoned() {
            warn!("Discord thread abandoned");
        }
    }

    info!("Exiting...");
    Ok(())
}

/// `say text` is mirrored as console chat, anything else as a server notice.
fn mirror_console_line(bridge: &Bridge, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match line.strip_prefix("say ") {
        Some(text) => bridge.mirror(Severity::Chat, &format!("console: {}", text)),
        None => bridge.mirror(Severity::High, line),
    };
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
