//! obsidian-note-gen-web - local web UI for the note generator
//!
//! Serves a single page on http://127.0.0.1:8789 by default. Settings
//! submitted through the page are saved for the next visit.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use notegen_common::{SettingsOverrides, SettingsStore};
use notegen_web::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for obsidian-note-gen-web
#[derive(Parser, Debug)]
#[command(name = "obsidian-note-gen-web")]
#[command(about = "Local web UI for the two-call Obsidian note generator")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1", env = "NOTEGEN_HOST")]
    host: std::net::IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value = "8789", env = "NOTEGEN_PORT")]
    port: u16,

    /// Open the page in the default browser once listening
    #[arg(long)]
    open: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "notegen=info,notegen_common=info,notegen_web=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before anything that can stall
    info!(
        "Starting obsidian-note-gen-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let settings_store = SettingsStore::default_location();
    info!("Settings file: {}", settings_store.path().display());

    // Fail fast on a broken environment rather than on the first request
    let settings = settings_store
        .resolve(SettingsOverrides::default())
        .context("Failed to resolve settings")?;
    info!(
        api_url = %settings.api_url,
        notes_dir = %settings.notes_dir.display(),
        "Default settings resolved"
    );

    let http_client = reqwest::Client::builder()
        .build()
        .context("Failed to create HTTP client")?;

    let state = AppState::new(http_client, settings_store);
    let app = build_router(state);

    let addr = SocketAddr::new(args.host, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    let url = format!("http://{}", addr);
    info!("Open {}", url);
    info!("Health check: {}/health", url);

    if args.open {
        if let Err(e) = open::that(&url) {
            warn!("Could not open browser at {}: {}", url, e);
        }
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
