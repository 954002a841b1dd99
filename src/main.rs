//! Mini Gateway - A resilient request-serving tier
//!
//! Multi-level caching, health-aware load balancing, priority background
//! jobs, and admission control behind a single HTTP surface.

mod admission;
mod api;
mod cache;
mod config;
mod error;
mod models;
mod pipeline;
mod queue;
mod router;
mod tasks;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{create_router, AppState};
use config::Config;
use queue::{spawn_workers, SimulatedHandler};
use router::spawn_health_check_task;
use tasks::{spawn_reaper_task, spawn_sweep_task};

/// Main entry point for the Mini Gateway tier.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Build the component graph (cache, router, limiter, breaker, queue)
/// 4. Start background tasks: expiry sweep, health checks, job reaper
/// 5. Start the worker pool
/// 6. Create Axum router with all endpoints
/// 7. Start HTTP server on configured port
/// 8. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mini Gateway");

    // Load configuration from environment variables
    let config = Config::from_env();
    if let Err(err) = config.validate() {
        error!("Invalid configuration: {}", err);
        std::process::exit(1);
    }
    info!(
        "Configuration loaded: port={}, backends={}, workers={}, rate_limit={}/{}s",
        config.server_port,
        config.backends.len(),
        config.worker_count,
        config.rate_limit,
        config.rate_window
    );

    // Build the component graph
    let state = AppState::from_config(&config);
    info!("Component graph initialized");

    // Start background tasks
    let mut handles: Vec<JoinHandle<()>> = vec![
        spawn_sweep_task(
            state.cache.clone(),
            state.limiter.clone(),
            config.sweep_interval,
        ),
        spawn_health_check_task(
            state.router.clone(),
            state.http.clone(),
            config.health_check_interval,
            config.health_check_timeout_ms,
        ),
        spawn_reaper_task(
            state.queue.clone(),
            config.sweep_interval,
            config.job_retention,
        ),
    ];
    handles.extend(spawn_workers(
        state.queue.clone(),
        Arc::new(SimulatedHandler),
        config.worker_count,
    ));
    info!("Background tasks and worker pool started");

    // Create router with all endpoints
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(handles))
        .await
        .unwrap();

    info!("Server shutdown complete");
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the background tasks and workers and allows
/// graceful shutdown.
async fn shutdown_signal(handles: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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

    // Abort background tasks and workers
    for handle in handles {
        handle.abort();
    }
    warn!("Background tasks aborted");
}
