// # DNS Provider Trait
//
// Defines the interface the reconciler uses to talk to a DNS provider's
// management API.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     provider.verify_credentials().await?;
//     let zone = provider.find_zone("example.com").await?;
//     for record in provider.list_a_records(&zone, "example.com").await? {
//         provider.update_record(&record, "203.0.113.7".parse()?).await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// A provider-side zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Provider zone identifier
    pub id: String,

    /// Zone name (e.g. "example.com")
    #[serde(default)]
    pub name: String,
}

/// A DNS record as stored at the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider record identifier
    pub id: String,

    /// Fully qualified record name
    pub name: String,

    /// Record type ("A")
    #[serde(rename = "type")]
    pub record_type: String,

    /// Stored content (the IPv4 address as text)
    pub content: String,

    /// Owning zone identifier
    #[serde(default)]
    pub zone_id: String,
}

impl DnsRecord {
    /// Whether the stored content already equals `ip`.
    ///
    /// Exact string comparison against the dotted-quad rendering; no
    /// normalization of the stored value.
    pub fn points_to(&self, ip: Ipv4Addr) -> bool {
        self.content == ip.to_string()
    }
}

/// Trait for DNS provider implementations
///
/// Each method is a single-shot API call. Providers never retry, never
/// cache across calls, and never decide whether an update is needed; the
/// reconciler owns all of that.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Check the configured credentials against the provider
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Credentials accepted
    /// - `Err(Error::Authentication)`: Credentials rejected, carrying the
    ///   provider's error messages
    async fn verify_credentials(&self) -> Result<(), crate::Error>;

    /// Resolve the zone for a domain name
    ///
    /// Returns the first zone the provider lists for `domain`.
    ///
    /// # Returns
    ///
    /// - `Ok(Zone)`: The first matching zone
    /// - `Err(Error::NotFound)`: No zone matches or the lookup failed
    async fn find_zone(&self, domain: &str) -> Result<Zone, crate::Error>;

    /// List the A records in `zone` matching the `name` filter
    ///
    /// Records are returned in provider order, each with its `zone_id`
    /// populated.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<DnsRecord>)`: Matching records (at least one)
    /// - `Err(Error::NotFound)`: No record matches
    /// - `Err(Error::Provider)`: The provider reported a failure
    async fn list_a_records(&self, zone: &Zone, name: &str)
    -> Result<Vec<DnsRecord>, crate::Error>;

    /// Point `record` at `new_ip`
    ///
    /// Type and name are preserved.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Provider accepted the update
    /// - `Err(Error::Provider)`: Provider reported failure
    async fn update_record(&self, record: &DnsRecord, new_ip: Ipv4Addr)
    -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
