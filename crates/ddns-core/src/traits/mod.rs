//! Core traits for the DDNS reconciler
//!
//! The two remote collaborators of a run sit behind these seams:
//!
//! - [`IpSource`]: Look up the caller's public IPv4 address
//! - [`DnsProvider`]: Verify credentials, resolve zone and records, update records

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, DnsRecord, Zone};
