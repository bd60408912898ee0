//! Callback Service - object freshness tracking
//!
//! Accepts batches of object ids, asks a status oracle which objects are
//! online, and keeps a self-expiring freshness record for each of them.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use callback_service::{
    api::{create_router, serve_until, Drain},
    AppState, Config,
};

/// Main entry point for the callback service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the oracle client, record store and resolver
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM, bounded by
///    `SHUTDOWN_TIMEOUT_SECS`
#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "callback_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        error!("shutting down: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    info!("Starting Callback Service");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        oracle_url = %config.oracle_url,
        oracle_timeout_secs = config.oracle_timeout,
        record_ttl_secs = config.record_ttl,
        max_in_flight = config.max_in_flight,
        port = config.server_port,
        "Configuration loaded"
    );

    let state = AppState::from_config(&config).context("building application state")?;
    info!("Resolver initialized");

    let app = create_router(state.clone());

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    let grace = config.shutdown_grace();
    let drain = serve_until(listener, app, shutdown_signal(state), grace)
        .await
        .context("serving HTTP")?;

    match drain {
        Drain::Completed => info!("Server shutdown complete"),
        Drain::DeadlineExceeded => warn!(
            grace_secs = grace.as_secs(),
            "Graceful shutdown did not complete in time, abandoning open requests"
        ),
    }
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, closes the resolver so late batches are refused.
/// Armed expiration timers are dropped with the runtime.
async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    state.resolver.close();
    warn!(
        pending_timers = state.resolver.repository().scheduler().pending(),
        "Resolver closed, pending expiration timers will be dropped"
    );
}
