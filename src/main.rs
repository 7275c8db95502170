use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use fieldsync::config::Config;
use fieldsync::connectivity::ConnectivityMonitor;
use fieldsync::remote::RemoteClient;
use fieldsync::sync::{self, TracingNotifier};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Load config
    let config = Config::from_env().expect("Failed to load configuration");

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.log_level)
        }))
        .init();

    tracing::info!("Starting fieldsync");

    // Open the on-device store (runs migrations)
    let pool = fieldsync::db::connect(&config.database_url)
        .await
        .expect("Failed to open action store");

    let remote = Arc::new(RemoteClient::new(
        &config.api_url,
        &config.api_key,
        config.request_timeout,
    )?);

    let state = fieldsync::build_state(pool, &config, remote.clone(), Arc::new(TracingNotifier));

    state.queue.recover_interrupted().await?;

    let summary = state.queue.summary().await?;
    tracing::info!(
        "Queue loaded: {} pending, {} failed",
        summary.pending,
        summary.failed
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let monitor = ConnectivityMonitor::new(remote, config.probe_interval, config.probe_max_interval);
    let (online, monitor_handle) = monitor.spawn(shutdown_rx.clone());

    let trigger_handle = tokio::spawn(sync::run_trigger(state.clone(), online, shutdown_rx));

    shutdown_signal().await;
    let _ = shutdown_tx.send(true);

    let _ = trigger_handle.await;
    let _ = monitor_handle.await;

    state.queue.pool().close().await;

    tracing::info!("Stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping sync");
}
