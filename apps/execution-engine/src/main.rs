//! Execution Engine Binary
//!
//! Starts the DEX execution engine.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin dex-execution-engine -- config.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `ENGINE_CONFIG`: Config file path (default: config.yaml; first CLI
//!   argument wins)
//! - `RUST_LOG`: Log filter (overrides `observability.logging.level`)
//! - Any `${VAR}` referenced from the config file, e.g. `SIGNER_TOKEN`

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dex_execution_engine::config::{Config, load_config, validate_startup_environment};
use dex_execution_engine::infrastructure::config::EngineContainer;
use dex_execution_engine::infrastructure::http::{AppState, create_router};
use dex_execution_engine::observability::{init_metrics, init_tracing};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ENGINE_CONFIG").ok());
    let config = load_or_default(config_path.as_deref())?;

    init_tracing(&config.observability.logging.to_tracing_config())
        .context("failed to initialize logging")?;
    if let Some(metrics) = config.observability.metrics.to_exporter_config()? {
        init_metrics(&metrics).context("failed to start metrics exporter")?;
    }

    tracing::info!(
        mode = config.environment.mode.as_str(),
        version = env!("CARGO_PKG_VERSION"),
        "Starting DEX Execution Engine"
    );

    let validation = validate_startup_environment(&config)?;
    for warning in &validation.warnings {
        tracing::warn!(%warning, "Startup configuration warning");
    }

    let container = EngineContainer::from_config(&config)?;
    let engine = Arc::clone(&container.engine);

    let shutdown = CancellationToken::new();
    let tracker = TaskTracker::new();
    engine.start(&tracker, &shutdown);

    let app = create_router(AppState {
        engine,
        version: env!("CARGO_PKG_VERSION").to_string(),
    });
    let addr = config.server.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "HTTP server starting");
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health");
    tracing::info!("  POST   /api/v1/orders");
    tracing::info!("  GET    /api/v1/orders/{{id}}");
    tracing::info!("  DELETE /api/v1/orders/{{id}}");
    tracing::info!("  GET    /api/v1/positions/{{id}}");
    tracing::info!("  GET    /api/v1/providers/health");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            server_shutdown.cancel();
        })
        .await
        .context("HTTP server error")?;

    // Background loops observe the token; the monitor finishes its current pass
    // and orders already claimed run to completion.
    shutdown.cancel();
    tracker.close();
    let stopped = async {
        container.engine.drain_orders().await;
        tracker.wait().await;
    };
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, stopped)
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Background tasks did not stop in time"
        );
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Load the config file, or defaults when no file exists at the default path.
fn load_or_default(path: Option<&str>) -> anyhow::Result<Config> {
    match path {
        Some(path) => load_config(Some(path)).with_context(|| format!("loading {path}")),
        None if std::path::Path::new("config.yaml").exists() => {
            load_config(None).context("loading config.yaml")
        }
        None => Ok(Config::default()),
    }
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed; a process that cannot
/// observe termination signals should not start.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
