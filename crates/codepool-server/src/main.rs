#![doc = include_str!("../README.md")]

mod server;

use clap::Parser;
use codepool::{Coordinator, QueueStore};
use server::config::{CliArgs, ServerConfig};
use server::loader::load_codes;
use server::service::dispenser::{Dispenser, Store};
use server::service::handler::router;
use server::telemetry::init_telemetry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

// mimalloc; the musl system allocator stalls under contention.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    let queue = QueueStore::new(Store::new(), config.pool_key.clone());
    match &config.codes_file {
        Some(path) => {
            load_codes(&queue, path).await?;
        }
        None => tracing::warn!(
            key = queue.key(),
            "No codes file given, every pop will report no codes left"
        ),
    }

    let coordinator = Arc::new(Coordinator::new(queue, config.retry));
    let dispenser = Dispenser::new(coordinator, &config);

    let listener = TcpListener::bind(&config.server_addr).await?;
    log_startup_info(&config);

    axum::serve(listener, router(dispenser.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    dispenser.shutdown().await;
    tracing::info!("Service shut down successfully");

    providers.shutdown();
    Ok(())
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting code service on {} with full config: {:#?}",
            config.server_addr,
            config
        );
    } else {
        tracing::info!(
            "Starting code service on {} with {:?} strategy",
            config.server_addr,
            config.strategy
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Shutdown signal received, draining in-flight requests...");
}
