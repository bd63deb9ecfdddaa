// src/config/models.rs
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upper bound (exclusive) of the random delay added before each run.
    #[serde(default = "default_jitter_max_ms")]
    pub jitter_max_ms: u64,

    #[serde(default)]
    pub metrics: MetricsConfig,

    pub probes: Vec<ProbeConfig>,
}

impl Config {
    pub fn jitter_max(&self) -> Duration {
        Duration::from_millis(self.jitter_max_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.probes.is_empty() {
            bail!("At least one probe must be configured");
        }

        for (index, probe) in self.probes.iter().enumerate() {
            if let Err(e) = probe.validate() {
                bail!("Invalid probe #{}: {}", index + 1, e);
            }
        }

        if self.metrics.enabled && !self.metrics.path.starts_with('/') {
            bail!("Metrics path must start with '/': {}", self.metrics.path);
        }

        Ok(())
    }
}

impl Default for Config {
    /// Two public resolvers checked over TLS.
    fn default() -> Self {
        Self {
            jitter_max_ms: default_jitter_max_ms(),
            metrics: MetricsConfig::default(),
            probes: vec![
                ProbeConfig {
                    target: ProbeTarget::Tls {
                        host: "1.1.1.1".to_string(),
                        port: 443,
                    },
                    interval_secs: 20,
                    timeout_ms: None,
                },
                ProbeConfig {
                    target: ProbeTarget::Tls {
                        host: "9.9.9.9".to_string(),
                        port: 443,
                    },
                    interval_secs: 40,
                    timeout_ms: None,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(flatten)]
    pub target: ProbeTarget,

    pub interval_secs: u64,

    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl ProbeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            bail!("interval_secs must be greater than 0");
        }
        if self.timeout_ms == Some(0) {
            bail!("timeout_ms must be greater than 0 when set");
        }

        match &self.target {
            ProbeTarget::Tls { host, port } => {
                if host.trim().is_empty() {
                    bail!("tls probe requires a host");
                }
                if *port == 0 {
                    bail!("tls probe port must be non-zero");
                }
            }
            ProbeTarget::Dns { host, .. } => {
                if host.trim().is_empty() {
                    bail!("dns probe requires a host");
                }
                if self.timeout_ms.is_some() {
                    bail!("dns probes do not take timeout_ms");
                }
            }
            ProbeTarget::Http { url } => validate_url(url)?,
            ProbeTarget::HttpSearch { url, search } => {
                validate_url(url)?;
                if search.is_empty() {
                    bail!("http_search probe requires a non-empty search term");
                }
            }
        }

        Ok(())
    }
}

fn validate_url(url: &Url) -> Result<()> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => bail!("unsupported URL scheme '{}' in {}", other, url),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProbeTarget {
    Tls {
        host: String,
        port: u16,
    },
    Dns {
        host: String,
        #[serde(default)]
        resolver: Option<IpAddr>,
    },
    Http {
        url: Url,
    },
    HttpSearch {
        url: Url,
        search: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
            path: default_metrics_path(),
        }
    }
}

fn default_jitter_max_ms() -> u64 {
    500
}

fn default_metrics_port() -> u16 {
    9100
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}
