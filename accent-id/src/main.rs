//! accent-id - US accent confidence microservice
//!
//! Accepts an uploaded recording on `POST /classify-us-accent` and reports the
//! pretrained classifier's probability that the speaker has a US accent.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use accent_common::config::load_config;
use accent_id::{classifier::load_classifier, AppState, UploadSettings};

/// Command-line arguments for accent-id
#[derive(Parser, Debug)]
#[command(name = "accent-id")]
#[command(about = "US accent confidence microservice")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "ACCENT_ID_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("accent_id={0},accent_common={0},tower_http=info", config.logging.level)
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting accent-id (US accent confidence) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Model: {}", config.model.name);

    // The classifier must be ready before the listener binds; any failure
    // here, including an unknown model name, stops the process.
    let model_config = config.model.clone();
    let classifier = tokio::task::spawn_blocking(move || load_classifier(&model_config))
        .await
        .context("Classifier loading task failed")?
        .context("Failed to load accent classifier")?;

    let state = AppState::new(
        classifier,
        config.model.name.clone(),
        UploadSettings::from(&config.upload),
    );
    let app = accent_id::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

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
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
