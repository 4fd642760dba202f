//! Curio viewer - main entry point

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use curio_common::config::load_config_or_default;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use curio_viewer::config::{Args, Config};
use curio_viewer::{build_router, AppState};

const DEFAULT_LOG_FILTER: &str = "curio_viewer=info,curio_common=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config file is read before tracing so it can set the log level
    let file_config = load_config_or_default(args.config.as_deref()).context("Failed to load config file")?;

    let fallback_filter = file_config
        .log_level
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Curio viewer v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE"),
    );

    let config = Config::resolve(args, file_config).context("Invalid configuration")?;
    config.log_summary();

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config)
        .await
        .context("Failed to initialize application state")?;
    let app = build_router(state);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

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
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
