// src/main.rs
use anyhow::Result;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use netwatch::{
    config::{self, Config},
    health::LogNotifier,
    metrics::{serve_metrics, MetricsRegistry},
    probe::build_probes,
    scheduler::Supervisor,
};

const DEFAULT_CONFIG_PATH: &str = "netwatch.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("netwatch=info".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    let config = load(std::env::args().nth(1)).await?;
    let probes = build_probes(&config.probes)?;

    let metrics_registry = Arc::new(MetricsRegistry::new()?);
    let supervisor = Arc::new(
        Supervisor::new(probes, Arc::new(LogNotifier), config.jitter_max())
            .with_metrics(metrics_registry.collector()),
    );

    let metrics_server = if config.metrics.enabled {
        let metrics_addr: SocketAddr = ([0, 0, 0, 0], config.metrics.port).into();
        Some(serve_metrics(
            metrics_addr,
            metrics_registry.clone(),
            config.metrics.path.clone(),
            supervisor.subscribe(),
        )?)
    } else {
        None
    };

    let running = tokio::spawn(supervisor.clone().run());

    shutdown_signal().await;
    supervisor.shutdown();

    match running.await {
        Ok(states) => {
            for (name, state) in states {
                info!("Probe {} exited in state {}", name, state.health());
            }
        }
        Err(e) => error!("Supervisor task failed: {}", e),
    }

    if let Some(server) = metrics_server {
        if let Err(e) = server.await {
            error!("Metrics server task failed: {}", e);
        }
    }

    Ok(())
}

/// An explicit path must load; without one, fall back to the built-in probes
/// when `netwatch.yaml` is absent.
async fn load(path: Option<String>) -> Result<Config> {
    match path {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            config::load_config(&path).await
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            info!("Loading configuration from: {}", DEFAULT_CONFIG_PATH);
            config::load_config(DEFAULT_CONFIG_PATH).await
        }
        None => {
            info!("No configuration file found, using built-in probes");
            Ok(Config::default())
        }
    }
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
