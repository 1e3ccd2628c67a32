// # HTTP IP Source
//
// This crate provides the IP source for the DDNS reconciler: a single GET
// against an IP-echo service that answers with the caller's public IPv4
// address as plain text (e.g. `https://ysap.sh/ip`).
//
// The body is trimmed and must parse as an IPv4 address. Anything else,
// including a non-2xx status, is a network error.

use ddns_core::config::DdnsConfig;
use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Default HTTP timeout for the IP lookup
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch the IP from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: IP-echo endpoint (e.g., "https://ysap.sh/ip")
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create from the run configuration
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        Self::new(config.ip_source_url.clone())
    }

    /// The endpoint this source queries
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Parse an IP-echo response body
fn parse_ipv4(body: &str) -> Result<Ipv4Addr> {
    let text = body.trim();

    match text.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => Ok(ip),
        Ok(IpAddr::V6(ip)) => Err(Error::network(format!("Expected IPv4, got: {}", ip))),
        Err(_) => Err(Error::network(format!("Invalid IP address: {:?}", text))),
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        tracing::debug!("Fetching current IP from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "IP service {} returned HTTP {}",
                self.url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response: {}", e)))?;

        parse_ipv4(&body)
    }

    fn source_name(&self) -> &str {
        "http"
    }
}
