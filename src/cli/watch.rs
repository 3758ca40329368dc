//! Watch command implementation

use crate::cli::output::{format_status_table, service_views};
use crate::cli::WatchArgs;
use crate::config::PulseConfig;
use crate::logging::init_tracing;
use crate::monitor::{ConnectionManager, Strategy};
use crate::status::{StatusStore, StatusesMap};
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shown until the monitor has produced its first results.
pub const LOADING_MESSAGE: &str = "Checking service status...";

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

/// Load configuration with watch-specific CLI overrides
pub fn load_config_with_overrides(
    args: &WatchArgs,
) -> Result<PulseConfig, Box<dyn std::error::Error>> {
    let mut config = args.connection.load_config()?;

    if let Some(strategy) = args.strategy {
        config.monitor.strategy = strategy;
    }
    if args.no_color {
        config.display.color = false;
    }

    Ok(config)
}

/// Render one frame of the watch view.
pub fn render_frame(strategy: Strategy, statuses: &StatusesMap) -> String {
    let views = service_views(statuses);
    format!(
        "Pulse ({} strategy) - {}\n{}\nPress Ctrl-C to exit.\n",
        strategy,
        chrono::Local::now().format("%H:%M:%S"),
        format_status_table(&views)
    )
}

/// Wait for Ctrl-C or SIGTERM, then cancel `cancel_token`.
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }

    cancel_token.cancel();
}

/// Drive the watch view until `cancel_token` fires.
pub async fn watch(
    config: &PulseConfig,
    store: Arc<StatusStore>,
    cancel_token: CancellationToken,
    out: &mut (dyn Write + Send),
) -> Result<(), Box<dyn std::error::Error>> {
    let manager = ConnectionManager::from_config(config, Arc::clone(&store))?;
    let strategy = manager.strategy();
    let handle = manager.mount();

    if store.is_loading() {
        writeln!(out, "{}", LOADING_MESSAGE)?;
        out.flush()?;
    }

    tokio::select! {
        _ = cancel_token.cancelled() => {}
        _ = store.wait_ready() => {}
    }

    let mut refresh = tokio::time::interval(config.display.refresh_interval());
    refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    while !cancel_token.is_cancelled() {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = refresh.tick() => {
                write!(out, "{}{}", CLEAR_SCREEN, render_frame(strategy, &store.snapshot()))?;
                out.flush()?;
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

/// Handle `pulse watch` command
pub async fn run_watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load and merge configuration
    let config = load_config_with_overrides(&args)?;
    config.validate()?;

    // 2. Initialize tracing
    init_tracing(&config.logging)?;
    if !config.display.color {
        colored::control::set_override(false);
    }

    tracing::info!(strategy = %config.monitor.strategy, "Starting Pulse watch");
    tracing::debug!(?config, "Loaded configuration");

    // 3. Watch until interrupted
    let cancel_token = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel_token.clone()));

    let store = Arc::new(StatusStore::new());
    let mut stdout = std::io::stdout();
    watch(&config, store, cancel_token, &mut stdout).await?;

    tracing::info!("Pulse watch stopped");
    Ok(())
}
