//! Verify Cache - email verification code service
//!
//! Serves the send-code / verify-code flow from a per-process TTL store kept
//! in step with other workers through the cache relay.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use verify_cache::api::{create_router, AppState};
use verify_cache::cache::TtlStore;
use verify_cache::delivery::LogMailer;
use verify_cache::relay::{self, CacheRelay};
use verify_cache::{spawn_cleanup_task, spawn_relay_sync_task, Config, VerificationService};

/// Main entry point for the verification cache service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Create the local store and connect the relay
/// 4. Subscribe the store to the relay, start the optional sweep
/// 5. Build the verification service and router
/// 6. Serve HTTP until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verify_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting verification cache service");

    let config = Config::from_env().context("invalid configuration")?;
    info!(
        "Configuration loaded: environment={}, port={}, relay={:?}, code_length={}, expire={}ms, send_interval={}ms, max_tries={}",
        config.environment,
        config.server_port,
        config.relay.mode,
        config.verify_code.length,
        config.verify_code.expire_time_ms,
        config.verify_code.send_interval_ms,
        config.verify_code.max_tries
    );

    let store = TtlStore::shared();
    let relay = relay::from_config(&config.relay)
        .await
        .context("failed to start cache relay")?;

    // Subscribe before anything can publish
    let sync_handle = spawn_relay_sync_task(store.clone(), relay.subscribe(), relay.origin());
    info!(relay = relay.name(), origin = relay.origin(), "Relay sync task started");

    let cleanup_handle = if config.cleanup_interval > 0 {
        Some(spawn_cleanup_task(store.clone(), config.cleanup_interval))
    } else {
        info!("Background TTL sweep disabled, expiry is checked on read only");
        None
    };

    let service = VerificationService::new(
        store,
        relay,
        config.verify_code.clone(),
        config.environment,
    );
    let state = AppState::new(service, Arc::new(LogMailer::new()));
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    stop_task(sync_handle, "Relay sync");
    if let Some(handle) = cleanup_handle {
        stop_task(handle, "Cleanup");
    }

    info!("Server shutdown complete");
    Ok(())
}

fn stop_task(handle: JoinHandle<()>, name: &str) {
    handle.abort();
    warn!("{} task aborted", name);
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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
}
