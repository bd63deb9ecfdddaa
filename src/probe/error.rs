// src/probe/error.rs
use reqwest::StatusCode;
use std::time::Duration;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a single probe run. Every variant names the target it was
/// aimed at so the message can be logged without further context.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("connection to {target} failed: {source}")]
    Connect {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS handshake failed for {target}: {source}")]
    Tls {
        target: String,
        #[source]
        source: native_tls::Error,
    },

    #[error("{target} timed out after {after:?}")]
    Timeout { target: String, after: Duration },

    #[error("DNS lookup failed for {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: BoxError,
    },

    #[error("no IP addresses found for {host}")]
    NoAddresses { host: String },

    #[error("HTTP request failed for {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP request to {url} returned status code {status}")]
    Status { url: String, status: StatusCode },

    #[error("failed to read response body for {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("search term '{search}' not found in response body for {url}")]
    SearchTermMissing { url: String, search: String },
}

impl ProbeError {
    /// Short label used for metrics and structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Connect { .. } => "connect",
            ProbeError::Tls { .. } => "tls",
            ProbeError::Timeout { .. } => "timeout",
            ProbeError::Resolve { .. } => "resolve",
            ProbeError::NoAddresses { .. } => "no_addresses",
            ProbeError::Request { .. } => "request",
            ProbeError::Status { .. } => "status",
            ProbeError::Body { .. } => "body",
            ProbeError::SearchTermMissing { .. } => "search_term_missing",
        }
    }
}
