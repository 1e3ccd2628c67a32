// # Cloudflare DNS Provider
//
// This crate implements `DnsProvider` against the Cloudflare API v4.
//
// - One HTTP request per trait call; no retries, no caching
// - Responses are read as the API envelope (`success`, `errors`, `result`)
//   whatever the HTTP status; the status only decides the error when the
//   body is not an envelope
// - HTTP timeout of 30 seconds
// - Dry-run mode: reads are performed, the PATCH is only logged
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Provider fails at construction if the token is empty
//
// ## API Reference
//
// - Verify token: GET `/user/tokens/verify`
// - List zones: GET `/zones?name=...`
// - List DNS records: GET `/zones/:zone_id/dns_records?type=A&name=...`
// - Patch DNS record: PATCH `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::config::{DEFAULT_API_BASE, DdnsConfig};
use ddns_core::traits::{DnsProvider, DnsRecord, Zone};
use ddns_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// TTL written on every update
pub const RECORD_TTL: u32 = 3600;

/// Comment written on every update
pub const UPDATE_COMMENT: &str = "Maintained automatically by ddns";

const PROVIDER: &str = "cloudflare";

/// Cloudflare API v4 response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    success: bool,

    #[serde(default)]
    errors: Vec<ApiMessage>,

    result: Option<T>,
}

/// Entry of the envelope's `errors` array
#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,

    #[serde(default)]
    message: String,

    #[serde(default)]
    error_chain: Vec<ApiMessage>,
}

impl ApiMessage {
    fn collect_into(&self, out: &mut Vec<String>) {
        out.push(format!("[{}] {}", self.code, self.message));
        for inner in &self.error_chain {
            inner.collect_into(out);
        }
    }
}

/// Render envelope errors as `[code] message; [code] message`
fn describe_errors(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "no error details returned".to_string();
    }

    let mut parts = Vec::new();
    for error in errors {
        error.collect_into(&mut parts);
    }
    parts.join("; ")
}

/// PATCH body for a record update
#[derive(Debug, Serialize)]
struct RecordUpdate<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: String,
    ttl: u32,
    proxied: bool,
    comment: &'a str,
}

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (verify, zone lookup, record lookup)
/// - Log the intended PATCH payload
/// - **NOT** actually modify DNS records
pub struct CloudflareProvider {
    /// Account email sent as `X-Auth-Email`
    email: String,

    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PATCH updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("email", &self.email)
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `email`: Account email
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `dry_run`: If true, perform GET requests but skip PATCH updates
    pub fn new(
        email: impl Into<String>,
        api_token: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            email: email.into(),
            api_token,
            api_base: DEFAULT_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Point the provider at a different API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Create a provider from the run configuration
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        if config.dry_run {
            tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self::new(config.email.clone(), config.api_key.clone(), config.dry_run)?
            .with_api_base(config.api_base.clone()))
    }

    /// Whether updates are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Start a request with the authentication headers every call carries
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_base, path))
            .header("X-Auth-Email", &self.email)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
    }

    /// Send a request and read the response envelope
    ///
    /// `action` names the call in error messages.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<ApiResponse<T>> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::network(format!("{}: HTTP request failed: {}", action, e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::network(format!("{}: failed to read response: {}", action, e)))?;

        match serde_json::from_slice::<ApiResponse<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => {
                let error_text = String::from_utf8_lossy(&body);
                Err(status_error(status, &error_text, action))
            }
            Err(e) => Err(Error::provider(
                PROVIDER,
                format!("{}: failed to parse response: {}", action, e),
            )),
        }
    }
}

/// Map an HTTP status to an error when the body carried no envelope
fn status_error(status: reqwest::StatusCode, error_text: &str, action: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{}: invalid API token or insufficient permissions. Status: {}",
            action, status
        )),
        404 => Error::not_found(format!("{}: endpoint returned {}", action, status)),
        429 => Error::provider(
            PROVIDER,
            format!("{}: rate limit exceeded. Status: {}", action, status),
        ),
        500..=599 => Error::provider(
            PROVIDER,
            format!("{}: Cloudflare server error: {} - {}", action, status, error_text),
        ),
        _ => Error::provider(
            PROVIDER,
            format!("{}: {} - {}", action, status, error_text),
        ),
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// ```http
    /// GET /user/tokens/verify
    /// ```
    async fn verify_credentials(&self) -> Result<()> {
        let request = self.request(reqwest::Method::GET, "/user/tokens/verify");
        let envelope: ApiResponse<serde_json::Value> =
            self.send(request, "Token verification").await?;

        if !envelope.success {
            return Err(Error::auth(describe_errors(&envelope.errors)));
        }

        tracing::debug!("Cloudflare token verified");
        Ok(())
    }

    /// ```http
    /// GET /zones?name=example.com
    /// ```
    async fn find_zone(&self, domain: &str) -> Result<Zone> {
        tracing::debug!("Looking up zone ID for domain: {}", domain);

        let request = self
            .request(reqwest::Method::GET, "/zones")
            .query(&[("name", domain)]);
        let envelope: ApiResponse<Vec<Zone>> = self.send(request, "Zone lookup").await?;

        if !envelope.success {
            return Err(Error::not_found(format!(
                "Error getting zone ID for {}: {}",
                domain,
                describe_errors(&envelope.errors)
            )));
        }

        let zone = envelope
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", domain)))?;

        tracing::debug!("Found zone ID: {}", zone.id);
        Ok(zone)
    }

    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&name=example.com
    /// ```
    async fn list_a_records(&self, zone: &Zone, name: &str) -> Result<Vec<DnsRecord>> {
        tracing::debug!("Looking up A records for {} in zone {}", name, zone.id);

        let request = self
            .request(
                reqwest::Method::GET,
                &format!("/zones/{}/dns_records", zone.id),
            )
            .query(&[("type", "A"), ("name", name)]);
        let envelope: ApiResponse<Vec<DnsRecord>> = self.send(request, "Record lookup").await?;

        if !envelope.success {
            return Err(Error::provider(
                PROVIDER,
                format!(
                    "Error getting DNS records for {}: {}",
                    name,
                    describe_errors(&envelope.errors)
                ),
            ));
        }

        let mut records = envelope.result.unwrap_or_default();
        if records.is_empty() {
            return Err(Error::not_found(format!(
                "No A records matching {} in zone {}",
                name, zone.id
            )));
        }

        for record in &mut records {
            if record.zone_id.is_empty() {
                record.zone_id = zone.id.clone();
            }
        }

        tracing::debug!("Found {} A record(s)", records.len());
        Ok(records)
    }

    /// ```http
    /// PATCH /zones/:zone_id/dns_records/:record_id
    /// {
    ///   "type": "A",
    ///   "name": "sub.example.com",
    ///   "content": "203.0.113.7",
    ///   "ttl": 3600,
    ///   "proxied": false,
    ///   "comment": "Maintained automatically by ddns"
    /// }
    /// ```
    async fn update_record(&self, record: &DnsRecord, new_ip: Ipv4Addr) -> Result<()> {
        if record.zone_id.is_empty() {
            return Err(Error::provider(
                PROVIDER,
                format!("Record {} has no zone ID", record.name),
            ));
        }

        let path = format!("/zones/{}/dns_records/{}", record.zone_id, record.id);
        let payload = RecordUpdate {
            record_type: &record.record_type,
            name: &record.name,
            content: new_ip.to_string(),
            ttl: RECORD_TTL,
            proxied: false,
            comment: UPDATE_COMMENT,
        };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PATCH request to {} with payload: {}",
                path,
                serde_json::to_string(&payload)?
            );
            return Ok(());
        }

        let request = self.request(reqwest::Method::PATCH, &path).json(&payload);
        let envelope: ApiResponse<serde_json::Value> = self.send(request, "Record update").await?;

        if !envelope.success {
            return Err(Error::provider(
                PROVIDER,
                format!(
                    "Error updating DNS record {}: {}",
                    record.name,
                    describe_errors(&envelope.errors)
                ),
            ));
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
