//! # Uptime Validator
//!
//! Entry point for a validator node.
//!
//! ## Startup Sequence
//!
//! 1. Install logging (`RUST_LOG`, default `info`) and the panic hook
//! 2. Build configuration from `UV_*` environment variables
//! 3. Unlock the wallet, connect to the hub and register
//! 4. Answer validation requests until SIGINT/SIGTERM or until the hub
//!    stays unreachable past `maxReconnectAttempts`
//! 5. Stop: close the socket, lock the signer, exit

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use node_runtime::{EnvPasswordProvider, HttpMonitoringExecutor, RuntimeConfig};
use uv_02_signer::build_signer;
use uv_04_validator::Validator;

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))
}

/// A panic anywhere is fatal: log it and exit instead of limping on with a
/// dead task.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        error!(%panic, "[runtime] Panic, terminating");
        default_hook(panic);
        std::process::exit(101);
    }));
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "[runtime] Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "[runtime] SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("[runtime] Received Ctrl+C"),
        _ = terminate => info!("[runtime] Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    install_panic_hook();

    let runtime = RuntimeConfig::from_env().context("Invalid environment configuration")?;
    let config = runtime.validator;

    info!("===========================================");
    info!("  Uptime Validator v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    info!(hub = %config.hub.url, wallet = %runtime.wallet, "[runtime] Configuration loaded");
    info!(
        keystore_dir = %config.security.keystore_dir.display(),
        paranoid = config.security.paranoid_mode,
        "[runtime] Security settings"
    );

    let passwords = Arc::new(EnvPasswordProvider::default());
    let password = passwords
        .current()
        .with_context(|| format!("{} is not set", passwords.var()))?;

    let signer = build_signer(config.signer(), passwords);
    let executor = Arc::new(
        HttpMonitoringExecutor::new(config.probe_timeout()).context("Failed to build HTTP client")?,
    );
    let validator = Validator::new(config, signer, executor);

    validator
        .start(&runtime.wallet, &password)
        .await
        .context("Validator failed to start")?;
    drop(password);
    info!("[runtime] Validator is running. Press Ctrl+C to stop.");

    tokio::select! {
        () = shutdown_signal() => validator.stop().await,
        () = validator.wait_stopped() => warn!("[runtime] Validator stopped on its own"),
    }
    validator.wait_stopped().await;

    let stats = validator.stats();
    info!(
        state = %validator.state(),
        validations = stats.validations_completed,
        undelivered = stats.undelivered_results,
        "[runtime] Shutdown complete"
    );
    Ok(())
}
