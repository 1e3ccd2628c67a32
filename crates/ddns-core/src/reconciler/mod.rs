//! One-shot DDNS reconciler
//!
//! The reconciler runs a five-stage pipeline once and returns:
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌───────────┐   ┌────────────┐
//! │ fetch IP │──▶│  verify  │──▶│   zone   │──▶│  records  │──▶│  update if │
//! │          │   │  creds   │   │  lookup  │   │  lookup   │   │  changed   │
//! └──────────┘   └──────────┘   └──────────┘   └───────────┘   └────────────┘
//! ```
//!
//! Every stage is a hard gate: the first error aborts the run and is
//! returned to the caller. There are no retries; the external scheduler
//! re-invokes the run on its next interval.
//!
//! A failed record update also aborts the run. Records updated before the
//! failure stay updated and the remaining records are not touched.

use crate::config::DdnsConfig;
use crate::error::Result;
use crate::traits::{DnsProvider, DnsRecord, IpSource, Zone};
use std::net::Ipv4Addr;
use tracing::{debug, info};

/// What to do with one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAction {
    /// First resolved record under `ignore_TLD`; left alone regardless of content
    SkipTld,
    /// Already points at the current IP
    Unchanged,
    /// Content differs and must be replaced
    Update,
}

/// Decide what to do with `record` given the current IP
///
/// `is_first` marks the record at position 0 of the provider's listing,
/// which `ignore_TLD` treats as the top-level domain record. At most one
/// record per run is skipped, even when several share the domain name.
pub fn plan_update(
    record: &DnsRecord,
    current_ip: Ipv4Addr,
    ignore_tld: bool,
    is_first: bool,
) -> RecordAction {
    if ignore_tld && is_first {
        RecordAction::SkipTld
    } else if record.points_to(current_ip) {
        RecordAction::Unchanged
    } else {
        RecordAction::Update
    }
}

/// Outcome for one record after a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Content replaced with the current IP
    Updated {
        /// Content before the update
        previous: String,
    },
    /// Already up to date
    Unchanged,
    /// Skipped by the ignore-TLD policy
    SkippedTld,
}

/// Per-record entry of a [`RunReport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReport {
    pub id: String,
    pub name: String,
    pub outcome: RecordOutcome,
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Public IP observed at the start of the run
    pub current_ip: Ipv4Addr,
    /// Zone the records were resolved under
    pub zone: Zone,
    /// One entry per resolved record, in provider order
    pub records: Vec<RecordReport>,
}

impl RunReport {
    /// Number of records whose content was replaced
    pub fn updated_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, RecordOutcome::Updated { .. }))
    }

    /// Number of records already pointing at the current IP
    pub fn unchanged_count(&self) -> usize {
        self.count(|outcome| *outcome == RecordOutcome::Unchanged)
    }

    /// Number of records skipped by the ignore-TLD policy
    pub fn skipped_count(&self) -> usize {
        self.count(|outcome| *outcome == RecordOutcome::SkippedTld)
    }

    fn count(&self, predicate: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.records
            .iter()
            .filter(|record| predicate(&record.outcome))
            .count()
    }
}

/// Core DDNS reconciler
///
/// Holds the two remote collaborators and the slice of configuration the
/// pipeline needs. Construct with [`Reconciler::new()`], then call
/// [`Reconciler::run()`] once per scheduler tick.
pub struct Reconciler {
    /// Public IP lookup
    ip_source: Box<dyn IpSource>,

    /// DNS provider API
    provider: Box<dyn DnsProvider>,

    /// Zone name and record name filter
    domain: String,

    /// Skip the first resolved record
    ignore_tld: bool,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `config`: Validated run configuration
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: &DdnsConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            ip_source,
            provider,
            domain: config.domain.clone(),
            ignore_tld: config.ignore_tld,
        })
    }

    /// Run the pipeline once
    ///
    /// # Returns
    ///
    /// - `Ok(RunReport)`: Every record was skipped, unchanged, or updated
    /// - `Err(Error)`: The first failing stage's error
    pub async fn run(&self) -> Result<RunReport> {
        let current_ip = self.ip_source.current().await?;
        debug!("Current IP: {} (via {})", current_ip, self.ip_source.source_name());

        self.provider.verify_credentials().await?;
        debug!("Authentication successful");

        let zone = self.provider.find_zone(&self.domain).await?;
        debug!("Zone ID: {}", zone.id);

        let records = self.provider.list_a_records(&zone, &self.domain).await?;
        for record in &records {
            debug!(
                "DNS record {}: id={} ip={}",
                record.name, record.id, record.content
            );
        }

        let mut reports = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let outcome = self.update_if_changed(record, current_ip, index == 0).await?;
            reports.push(RecordReport {
                id: record.id.clone(),
                name: record.name.clone(),
                outcome,
            });
        }

        let report = RunReport {
            current_ip,
            zone,
            records: reports,
        };

        info!(
            "Run complete: {} updated, {} unchanged, {} skipped",
            report.updated_count(),
            report.unchanged_count(),
            report.skipped_count()
        );

        Ok(report)
    }

    /// Apply the update policy to one record
    async fn update_if_changed(
        &self,
        record: &DnsRecord,
        current_ip: Ipv4Addr,
        is_first: bool,
    ) -> Result<RecordOutcome> {
        match plan_update(record, current_ip, self.ignore_tld, is_first) {
            RecordAction::SkipTld => {
                info!("Ignoring TLD {} due to ignore_TLD setting", record.name);
                Ok(RecordOutcome::SkippedTld)
            }
            RecordAction::Unchanged => {
                info!("DNS record {} already up to date", record.name);
                Ok(RecordOutcome::Unchanged)
            }
            RecordAction::Update => {
                info!(
                    "Updating {} with IP {}. Old IP was {}",
                    record.name, current_ip, record.content
                );
                self.provider.update_record(record, current_ip).await?;
                info!("DNS record {} updated successfully", record.name);

                Ok(RecordOutcome::Updated {
                    previous: record.content.clone(),
                })
            }
        }
    }
}
