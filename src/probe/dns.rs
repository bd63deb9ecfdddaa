// src/probe/dns.rs
use super::{Probe, ProbeError};
use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfig, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::TokioResolver;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::info;

pub const DNS_PORT: u16 = 53;
pub const RESOLVER_TIMEOUT: Duration = Duration::from_millis(3000);

/// Where a [`DnsProbe`] sends its queries. A custom resolver belongs to the
/// probe that configured it and never leaks into other lookups.
enum Lookup {
    System,
    Custom {
        addr: SocketAddr,
        resolver: TokioResolver,
    },
}

pub struct DnsProbe {
    host: String,
    lookup: Lookup,
    interval: Duration,
}

impl DnsProbe {
    /// Resolve through the operating system's configured resolver.
    pub fn new(host: impl Into<String>, interval: Duration) -> Self {
        Self {
            host: host.into(),
            lookup: Lookup::System,
            interval,
        }
    }

    /// Resolve through `resolver` on the standard DNS port.
    pub fn with_resolver(host: impl Into<String>, resolver: IpAddr, interval: Duration) -> Self {
        Self::with_resolver_addr(host, SocketAddr::new(resolver, DNS_PORT), interval)
    }

    pub fn with_resolver_addr(
        host: impl Into<String>,
        addr: SocketAddr,
        interval: Duration,
    ) -> Self {
        let mut config = ResolverConfig::new();
        config.add_name_server(NameServerConfig::new(addr, Protocol::Udp));

        // every run must reach the resolver; a cached answer would mask an outage
        let mut opts = ResolverOpts::default();
        opts.timeout = RESOLVER_TIMEOUT;
        opts.cache_size = 0;

        let resolver = TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
            .with_options(opts)
            .build();

        Self {
            host: host.into(),
            lookup: Lookup::Custom { addr, resolver },
            interval,
        }
    }

    pub fn resolver_addr(&self) -> Option<SocketAddr> {
        match &self.lookup {
            Lookup::System => None,
            Lookup::Custom { addr, .. } => Some(*addr),
        }
    }

    async fn resolve(&self) -> Result<Vec<IpAddr>, ProbeError> {
        match &self.lookup {
            Lookup::System => {
                let addrs = tokio::net::lookup_host((self.host.as_str(), 0))
                    .await
                    .map_err(|e| ProbeError::Resolve {
                        host: self.host.clone(),
                        source: Box::new(e),
                    })?;
                Ok(addrs.map(|a| a.ip()).collect())
            }
            Lookup::Custom { resolver, .. } => {
                let lookup = resolver
                    .lookup_ip(self.host.as_str())
                    .await
                    .map_err(|e| ProbeError::Resolve {
                        host: self.host.clone(),
                        source: Box::new(e),
                    })?;
                Ok(lookup.iter().collect())
            }
        }
    }
}

/// An empty answer counts as a failed lookup.
pub fn require_addresses(host: &str, addrs: Vec<IpAddr>) -> Result<Vec<IpAddr>, ProbeError> {
    if addrs.is_empty() {
        return Err(ProbeError::NoAddresses {
            host: host.to_string(),
        });
    }
    Ok(addrs)
}

#[async_trait]
impl Probe for DnsProbe {
    async fn run(&self) -> Result<(), ProbeError> {
        let addrs = require_addresses(&self.host, self.resolve().await?)?;
        info!("DNS lookup successful for {}: {:?}", self.host, addrs);
        Ok(())
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn name(&self) -> String {
        match &self.lookup {
            Lookup::System => format!("DNS {}", self.host),
            Lookup::Custom { addr, .. } => format!("DNS {} via {}", self.host, addr.ip()),
        }
    }
}
