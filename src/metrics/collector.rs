// src/metrics/collector.rs
use crate::health::{Health, Transition};
use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!("Failed to encode metrics: {}", e);
        }
        buffer
    }
}

pub struct MetricsCollector {
    pub probe_runs_total: IntCounterVec,
    pub probe_run_duration_seconds: HistogramVec,
    pub probe_health_status: IntGaugeVec,
    pub probe_transitions_total: IntCounterVec,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let probe_runs_total = IntCounterVec::new(
            Opts::new("netwatch_probe_runs_total", "Total number of probe runs"),
            &["probe", "outcome"],
        )?;
        registry.register(Box::new(probe_runs_total.clone()))?;

        let probe_run_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "netwatch_probe_run_duration_seconds",
                "Probe run duration in seconds",
            ),
            &["probe"],
        )?;
        registry.register(Box::new(probe_run_duration_seconds.clone()))?;

        let probe_health_status = IntGaugeVec::new(
            Opts::new(
                "netwatch_probe_health_status",
                "Probe health status (1=good, 0=bad)",
            ),
            &["probe"],
        )?;
        registry.register(Box::new(probe_health_status.clone()))?;

        let probe_transitions_total = IntCounterVec::new(
            Opts::new(
                "netwatch_probe_transitions_total",
                "Health transitions by kind",
            ),
            &["probe", "transition"],
        )?;
        registry.register(Box::new(probe_transitions_total.clone()))?;

        Ok(Self {
            probe_runs_total,
            probe_run_duration_seconds,
            probe_health_status,
            probe_transitions_total,
        })
    }

    pub fn record_run(&self, probe: &str, success: bool, duration: Duration) {
        let outcome = if success { "success" } else { "failure" };
        self.probe_runs_total
            .with_label_values(&[probe, outcome])
            .inc();

        self.probe_run_duration_seconds
            .with_label_values(&[probe])
            .observe(duration.as_secs_f64());
    }

    pub fn record_transition(&self, probe: &str, transition: &Transition, health: Health) {
        if !matches!(transition, Transition::Steady) {
            self.probe_transitions_total
                .with_label_values(&[probe, transition.label()])
                .inc();
        }
        self.update_health(probe, health);
    }

    pub fn update_health(&self, probe: &str, health: Health) {
        let value = match health {
            Health::Good => 1,
            Health::Bad => 0,
        };
        self.probe_health_status
            .with_label_values(&[probe])
            .set(value);
    }
}
