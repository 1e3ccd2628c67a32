// # ddns-core
//
// Core library for the one-shot DDNS reconciler.
//
// ## Architecture Overview
//
// A run keeps a set of DNS "A" records pointed at the caller's current
// public IPv4 address:
// - **IpSource**: Trait for looking up the current public IP
// - **DnsProvider**: Trait for the provider API (verify, zone, records, update)
// - **Reconciler**: Runs the lookup → verify → resolve → update pipeline once
// - **DdnsConfig**: Validated, immutable per-run configuration
//
// ## Design Principles
//
// 1. **Explicit configuration**: Config is passed in, never read from globals
// 2. **Fail fast**: Each stage returns `Result`; the first error ends the run
// 3. **Stateless**: Nothing persists between runs; the provider is the state
// 4. **Library-First**: The binary is a thin wrapper over this crate

pub mod traits;
pub mod reconciler;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, DnsRecord, Zone};
pub use reconciler::{Reconciler, RunReport, RecordOutcome, RecordReport};
pub use config::{DdnsConfig, Settings};
pub use error::{Error, Result};
