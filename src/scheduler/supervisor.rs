// src/scheduler/supervisor.rs
use super::{Jitter, ProbeRunner};
use crate::health::{HealthState, Notifier};
use crate::metrics::MetricsCollector;
use crate::probe::Probe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

/// Spawns one independent task per probe and owns the shutdown signal.
pub struct Supervisor {
    probes: Vec<Arc<dyn Probe>>,
    notifier: Arc<dyn Notifier>,
    metrics: Option<Arc<MetricsCollector>>,
    jitter_max: Duration,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Supervisor {
    pub fn new(
        probes: Vec<Arc<dyn Probe>>,
        notifier: Arc<dyn Notifier>,
        jitter_max: Duration,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            probes,
            notifier,
            metrics: None,
            jitter_max,
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Receiver that flips to `true` once [`Supervisor::shutdown`] is called.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Run every probe until shutdown. Returns the final state of each task
    /// that exited normally, in probe order.
    pub async fn run(self: Arc<Self>) -> Vec<(String, HealthState)> {
        info!(
            "Supervising {} probes (notifier: {})",
            self.probes.len(),
            self.notifier.name()
        );

        let mut tasks = Vec::with_capacity(self.probes.len());
        for probe in &self.probes {
            let mut runner = ProbeRunner::new(
                probe.clone(),
                self.notifier.clone(),
                Jitter::new(self.jitter_max),
            );
            if let Some(metrics) = &self.metrics {
                runner = runner.with_metrics(metrics.clone());
            }

            let name = runner.name().to_string();
            let shutdown = self.subscribe();
            tasks.push((name, tokio::spawn(runner.run(shutdown))));
        }

        let (names, handles): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();
        let results = futures::future::join_all(handles).await;

        let mut finished = Vec::with_capacity(results.len());
        for (name, result) in names.into_iter().zip(results) {
            match result {
                Ok(state) => finished.push((name, state)),
                Err(e) => error!("Probe task {} ended abnormally: {}", name, e),
            }
        }

        info!("All probe tasks stopped");
        finished
    }
}
