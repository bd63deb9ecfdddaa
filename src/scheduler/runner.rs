// src/scheduler/runner.rs
use super::Jitter;
use crate::health::{HealthState, Notifier, Transition};
use crate::metrics::MetricsCollector;
use crate::probe::Probe;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Drives one probe: wait for the tick, sleep the jitter, run, fold the
/// outcome into the probe's private [`HealthState`].
pub struct ProbeRunner {
    name: String,
    probe: Arc<dyn Probe>,
    notifier: Arc<dyn Notifier>,
    metrics: Option<Arc<MetricsCollector>>,
    jitter: Jitter,
    state: HealthState,
}

impl ProbeRunner {
    pub fn new(probe: Arc<dyn Probe>, notifier: Arc<dyn Notifier>, jitter: Jitter) -> Self {
        Self {
            name: probe.name(),
            probe,
            notifier,
            metrics: None,
            jitter,
            state: HealthState::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        metrics.update_health(&self.name, self.state.health());
        self.metrics = Some(metrics);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &HealthState {
        &self.state
    }

    /// One run of the probe plus the resulting state update and notification.
    pub async fn tick(&mut self) -> Transition {
        debug!(
            "Probe: {} (last observed state: {})",
            self.name,
            self.state.health()
        );

        let start = std::time::Instant::now();
        let outcome = self.probe.run().await;
        if let Some(metrics) = &self.metrics {
            metrics.record_run(&self.name, outcome.is_ok(), start.elapsed());
        }

        let transition = self.state.observe(outcome);

        if let Transition::StillFailing { error } = &transition {
            warn!(
                probe = %self.name,
                notify = false,
                "Probe {} still failing: {} (no additional notification)",
                self.name,
                error
            );
        }

        if transition.is_notifying() {
            self.notifier.notify(&self.name, &transition).await;
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_transition(&self.name, &transition, self.state.health());
        }

        transition
    }

    /// Loop until `shutdown` turns true. A run that has started is allowed
    /// to finish; the flag is checked while waiting for the tick and jitter.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> HealthState {
        let period = self.probe.interval();
        if period.is_zero() {
            error!("Probe {} has a zero interval, not scheduling it", self.name);
            return self.state;
        }

        info!("Starting probe: {} with interval {:?}", self.name, period);

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_requested(&mut shutdown) => break,
            }

            let delay = self.jitter.next_delay();
            tokio::select! {
                _ = sleep(delay) => {}
                _ = shutdown_requested(&mut shutdown) => break,
            }

            self.tick().await;
        }

        info!(
            "Probe {} stopped (last observed state: {})",
            self.name,
            self.state.health()
        );
        self.state
    }
}

/// Resolves once the flag reads true. A dropped sender means nobody can
/// ask for shutdown any more, so this never resolves in that case.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
