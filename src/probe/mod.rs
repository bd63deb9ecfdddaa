// src/probe/mod.rs
mod dns;
mod error;
mod http;
mod tls;

pub use dns::{require_addresses, DnsProbe, DNS_PORT, RESOLVER_TIMEOUT};
pub use error::{BoxError, ProbeError};
pub use http::{HttpProbe, HttpSearchProbe};
pub use tls::TlsProbe;

use crate::config::{ProbeConfig, ProbeTarget};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A single network check that can be fired repeatedly on a fixed cadence.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Run one attempt. Ordinary network trouble comes back as `Err`.
    async fn run(&self) -> Result<(), ProbeError>;

    /// Time between runs; constant for the lifetime of the probe.
    fn interval(&self) -> Duration;

    fn name(&self) -> String;
}

pub fn build_probe(config: &ProbeConfig) -> Result<Arc<dyn Probe>> {
    let interval = config.interval();
    let timeout = config.timeout();

    let probe: Arc<dyn Probe> = match &config.target {
        ProbeTarget::Tls { host, port } => {
            let probe = TlsProbe::new(host.clone(), *port, interval);
            match timeout {
                Some(t) => Arc::new(probe.with_timeout(t)),
                None => Arc::new(probe),
            }
        }
        ProbeTarget::Dns { host, resolver } => match resolver {
            Some(ip) => Arc::new(DnsProbe::with_resolver(host.clone(), *ip, interval)),
            None => Arc::new(DnsProbe::new(host.clone(), interval)),
        },
        ProbeTarget::Http { url } => Arc::new(
            HttpProbe::new(url.clone(), interval, timeout)
                .with_context(|| format!("Failed to create HTTP client for {}", url))?,
        ),
        ProbeTarget::HttpSearch { url, search } => Arc::new(
            HttpSearchProbe::new(url.clone(), search.clone(), interval, timeout)
                .with_context(|| format!("Failed to create HTTP client for {}", url))?,
        ),
    };

    Ok(probe)
}

pub fn build_probes(configs: &[ProbeConfig]) -> Result<Vec<Arc<dyn Probe>>> {
    configs.iter().map(build_probe).collect()
}
