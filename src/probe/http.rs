// src/probe/http.rs
use super::{Probe, ProbeError};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::info;
use url::Url;

fn build_client(timeout: Option<Duration>) -> reqwest::Result<Client> {
    let mut builder = Client::builder().pool_max_idle_per_host(0);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// GET the URL and insist on `200 OK`. Shared by both HTTP probes.
async fn get_ok(client: &Client, url: &Url) -> Result<Response, ProbeError> {
    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|source| ProbeError::Request {
            url: url.to_string(),
            source,
        })?;

    if response.status() != StatusCode::OK {
        return Err(ProbeError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    Ok(response)
}

/// Exact byte containment on the raw body, before any charset decoding.
fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}

pub struct HttpProbe {
    url: Url,
    interval: Duration,
    client: Client,
}

impl HttpProbe {
    pub fn new(url: Url, interval: Duration, timeout: Option<Duration>) -> reqwest::Result<Self> {
        Ok(Self {
            url,
            interval,
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn run(&self) -> Result<(), ProbeError> {
        // response (and its connection) is released when it goes out of scope
        let _response = get_ok(&self.client, &self.url).await?;
        info!("HTTP request successful for {}", self.url);
        Ok(())
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn name(&self) -> String {
        format!("HTTP {}", self.url)
    }
}

/// Like [`HttpProbe`], and the body must also contain `search` (case-sensitive).
pub struct HttpSearchProbe {
    url: Url,
    search: String,
    interval: Duration,
    client: Client,
}

impl HttpSearchProbe {
    pub fn new(
        url: Url,
        search: impl Into<String>,
        interval: Duration,
        timeout: Option<Duration>,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            url,
            search: search.into(),
            interval,
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl Probe for HttpSearchProbe {
    async fn run(&self) -> Result<(), ProbeError> {
        let response = get_ok(&self.client, &self.url).await?;

        let body = response.bytes().await.map_err(|source| ProbeError::Body {
            url: self.url.to_string(),
            source,
        })?;

        if !contains_bytes(&body, self.search.as_bytes()) {
            return Err(ProbeError::SearchTermMissing {
                url: self.url.to_string(),
                search: self.search.clone(),
            });
        }

        info!(
            "HTTP request successful for {} with search term '{}' found",
            self.url, self.search
        );
        Ok(())
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn name(&self) -> String {
        format!("HTTP {} + Search for '{}'", self.url, self.search)
    }
}
