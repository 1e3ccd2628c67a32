// # ddns - one-shot DDNS reconciler
//
// This binary is a THIN integration layer. All reconciliation logic lives
// in ddns-core; this file only:
// 1. Loads configuration (config file, then environment overrides)
// 2. Initializes tracing
// 3. Builds the IP source, the Cloudflare provider, and the reconciler
// 4. Runs once and maps the outcome to an exit code
//
// Scheduling is external: run it from cron or a systemd timer.
//
// ## Configuration
//
// The config file is the first CLI argument, else `$DDNS_CONFIG`, else
// `./DDNS.config` when present:
//
// ```ini
// [DEFAULT]
// email = admin@example.com
// key = your_cloudflare_token
// domains = example.com
// verbose = False
// ignore_TLD = False
// ```
//
// Environment variables override the file: `DDNS_EMAIL`, `DDNS_KEY`,
// `DDNS_DOMAINS`, `DDNS_VERBOSE`, `DDNS_IGNORE_TLD`, `DDNS_MODE`
// (`dry-run`), `DDNS_IP_SOURCE_URL`, `DDNS_API_BASE`, `DDNS_LOG_LEVEL`.
//
// ## Example
//
// ```bash
// */5 * * * * DDNS_MODE=live ddns /etc/ddns/DDNS.config
// ```

use anyhow::{Context, Result};
use ddns_core::config::{DEFAULT_CONFIG_FILE, DdnsConfig, Settings};
use ddns_core::{Reconciler, RunReport};
use ddns_ip_http::HttpIpSource;
use ddns_provider_cloudflare::CloudflareProvider;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Run finished (records updated, unchanged, or skipped)
/// - 1: Configuration error
/// - 2: Run aborted by a network, auth, lookup, or provider error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Run completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// A pipeline stage failed
    RunFailed = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Pick the config file: CLI argument, then `$DDNS_CONFIG`, then the
/// default file if it exists in the working directory
fn resolve_config_path(
    arg: Option<String>,
    env_path: Option<String>,
    default_dir: &Path,
) -> Option<PathBuf> {
    if let Some(path) = arg.or(env_path).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }

    let default = default_dir.join(DEFAULT_CONFIG_FILE);
    default.is_file().then_some(default)
}

/// Load settings from the file (if any) and apply environment overrides
fn load_config<I>(path: Option<&Path>, vars: I) -> Result<DdnsConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut settings = match path {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?,
        None => Settings::new(),
    };
    settings.merge_env(vars);

    Ok(DdnsConfig::from_settings(&settings)?)
}

fn parse_level(level: &str) -> Level {
    match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn main() -> ExitCode {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let path = resolve_config_path(env::args().nth(1), env::var("DDNS_CONFIG").ok(), &cwd);

    let config = match load_config(path.as_deref(), env::vars()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(config.effective_log_level()))
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    if let Some(path) = &path {
        info!("Using config file {}", path.display());
    }

    // Requests are strictly sequential, a single-threaded runtime is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RunFailed.into();
        }
    };

    let outcome = rt.block_on(run(&config));
    exit_code_for(&outcome).into()
}

/// Map a run outcome to the process exit code, logging the failure
fn exit_code_for(outcome: &ddns_core::Result<RunReport>) -> DdnsExitCode {
    match outcome {
        Ok(_) => DdnsExitCode::Success,
        Err(e) if e.is_config() => {
            error!("Configuration error: {}", e);
            DdnsExitCode::ConfigError
        }
        Err(e) => {
            error!("DDNS run failed: {}", e);
            DdnsExitCode::RunFailed
        }
    }
}

/// Build the collaborators and run the reconciler once
async fn run(config: &DdnsConfig) -> ddns_core::Result<RunReport> {
    info!(
        "Reconciling A records for {}{}",
        config.domain,
        if config.dry_run { " [DRY-RUN]" } else { "" }
    );

    let ip_source = HttpIpSource::from_config(config)?;
    let provider = CloudflareProvider::from_config(config)?;
    let reconciler = Reconciler::new(Box::new(ip_source), Box::new(provider), config)?;

    reconciler.run().await
}
