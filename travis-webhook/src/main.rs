//! Travis Webhook server - relays Travis CI build results to a chat webhook.
//!
//! This binary:
//! - Receives Travis CI webhook deliveries
//! - Verifies their signature against the Travis public key
//! - Posts a build status card to the configured chat webhook
//! - Always answers Travis with 200 OK

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use travis_webhook::{router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so DEBUG can pick the default log level
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_log_level()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");
    info!(
        port = config.port,
        webhook_host = config.webhook_url.host_str().unwrap_or_default(),
        travis_config_url = %config.travis_config_url,
        request_timeout_ms = config.request_timeout_ms,
        debug = config.debug,
        "config_loaded"
    );

    let port = config.port;
    let state = AppState::new(config).context("Failed to build HTTP client")?;
    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl_c_handler_failed");
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
                tracing::error!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
