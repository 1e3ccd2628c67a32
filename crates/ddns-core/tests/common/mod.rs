//! Test doubles and common utilities for reconciler contract tests
//!
//! The mock provider keeps its zones and records behind a shared handle, so
//! an update made during one run is visible to the next, the way the real
//! provider behaves.

#![allow(dead_code)]

use async_trait::async_trait;
use ddns_core::config::{DdnsConfig, Settings};
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, DnsRecord, IpSource, Zone};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An IpSource returning a fixed address, or failing when none is set
pub struct FixedIpSource {
    ip: Option<Ipv4Addr>,
    call_count: Arc<AtomicUsize>,
}

impl FixedIpSource {
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip: Some(ip),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            ip: None,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IpSource for FixedIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.ip
            .ok_or_else(|| Error::network("Request failed: connection refused"))
    }

    fn source_name(&self) -> &str {
        "fixed"
    }
}

/// A provider API call observed by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Verify,
    FindZone(String),
    ListRecords { zone_id: String, name: String },
    Update { record_id: String, content: String },
}

#[derive(Default)]
struct ProviderState {
    zones: Vec<Zone>,
    records: Vec<DnsRecord>,
    reject_auth: bool,
    failing_records: Vec<String>,
    calls: Vec<Call>,
}

/// A mock DnsProvider backed by in-memory zones and records
#[derive(Clone, Default)]
pub struct MockDnsProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl MockDnsProvider {
    pub fn new(zones: Vec<Zone>, records: Vec<DnsRecord>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ProviderState {
                zones,
                records,
                ..ProviderState::default()
            })),
        }
    }

    /// Reject credentials on verify
    pub fn rejecting_auth(self) -> Self {
        self.state.lock().unwrap().reject_auth = true;
        self
    }

    /// Make updates of `record_id` fail
    pub fn failing_update(self, record_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_records
            .push(record_id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Record ids that received an update, in order
    pub fn updated_ids(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Update { record_id, .. } => Some(record_id),
                _ => None,
            })
            .collect()
    }

    /// Current stored content of a record
    pub fn content_of(&self, record_id: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|record| record.id == record_id)
            .map(|record| record.content.clone())
    }

    fn boxed(&self) -> Box<dyn DnsProvider> {
        Box::new(self.clone())
    }
}

#[async_trait]
impl DnsProvider for MockDnsProvider {
    async fn verify_credentials(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Verify);
        if state.reject_auth {
            return Err(Error::auth("[1000] Invalid API Token"));
        }
        Ok(())
    }

    async fn find_zone(&self, domain: &str) -> Result<Zone> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::FindZone(domain.to_string()));
        state
            .zones
            .first()
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", domain)))
    }

    async fn list_a_records(&self, zone: &Zone, name: &str) -> Result<Vec<DnsRecord>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListRecords {
            zone_id: zone.id.clone(),
            name: name.to_string(),
        });
        if state.records.is_empty() {
            return Err(Error::not_found(format!("No A records matching {}", name)));
        }
        Ok(state.records.clone())
    }

    async fn update_record(&self, record: &DnsRecord, new_ip: Ipv4Addr) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Update {
            record_id: record.id.clone(),
            content: new_ip.to_string(),
        });
        if state.failing_records.contains(&record.id) {
            return Err(Error::provider("mock", "[81058] A record with the same settings already exists."));
        }
        if let Some(stored) = state.records.iter_mut().find(|r| r.id == record.id) {
            stored.content = new_ip.to_string();
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

pub fn zone(id: &str, name: &str) -> Zone {
    Zone {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn a_record(id: &str, name: &str, content: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        name: name.to_string(),
        record_type: "A".to_string(),
        content: content.to_string(),
        zone_id: "Z1".to_string(),
    }
}

/// The two-record `example.com` zone used across scenarios
pub fn example_provider() -> MockDnsProvider {
    MockDnsProvider::new(
        vec![zone("Z1", "example.com")],
        vec![
            a_record("R1", "example.com", "1.2.3.4"),
            a_record("R2", "sub.example.com", "5.6.7.8"),
        ],
    )
}

/// Helper to create a config for `domain` with the given ignore_TLD text
pub fn config_with_ignore_tld(domain: &str, ignore_tld: &str) -> DdnsConfig {
    let mut settings = Settings::new();
    settings.set("email", "admin@example.com");
    settings.set("key", "test-token");
    settings.set("domains", domain);
    settings.set("ignore_TLD", ignore_tld);
    DdnsConfig::from_settings(&settings).expect("test config is valid")
}

pub fn minimal_config(domain: &str) -> DdnsConfig {
    config_with_ignore_tld(domain, "false")
}

pub fn reconciler(
    ip_source: FixedIpSource,
    provider: &MockDnsProvider,
    config: &DdnsConfig,
) -> ddns_core::Reconciler {
    ddns_core::Reconciler::new(Box::new(ip_source), provider.boxed(), config)
        .expect("reconciler construction succeeds")
}
