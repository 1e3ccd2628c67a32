//! Configuration for a reconciler run
//!
//! Settings come from an INI-style key/value file (`DDNS.config`) and are
//! then overridden by `DDNS_*` environment variables. The merged key/value
//! view ([`Settings`]) is turned into a validated, immutable [`DdnsConfig`]
//! that is passed explicitly into the reconciler.
//!
//! ## Recognized keys
//!
//! | File key     | Environment          | Meaning                               |
//! |--------------|----------------------|---------------------------------------|
//! | `email`      | `DDNS_EMAIL`         | Provider login identity               |
//! | `key`        | `DDNS_KEY`           | Bearer API credential                 |
//! | `domains`    | `DDNS_DOMAINS`       | Zone name and record name filter      |
//! | `verbose`    | `DDNS_VERBOSE`       | Debug-level logging                   |
//! | `ignore_TLD` | `DDNS_IGNORE_TLD`    | Leave the bare-domain record alone    |
//! | `dry_run`    | `DDNS_MODE=dry-run`  | Read everything, write nothing        |
//! | `ip_url`     | `DDNS_IP_SOURCE_URL` | IP-echo service                       |
//! | `api_base`   | `DDNS_API_BASE`      | Provider API base URL                 |
//! | `log_level`  | `DDNS_LOG_LEVEL`     | Explicit tracing level                |
//!
//! File keys are case-insensitive.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Default IP-echo service
pub const DEFAULT_IP_SOURCE_URL: &str = "https://ysap.sh/ip";

/// Cloudflare API base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "DDNS.config";

/// Environment variables and the file keys they override
const ENV_KEYS: &[(&str, &str)] = &[
    ("DDNS_EMAIL", "email"),
    ("DDNS_KEY", "key"),
    ("DDNS_DOMAINS", "domains"),
    ("DDNS_VERBOSE", "verbose"),
    ("DDNS_IGNORE_TLD", "ignore_tld"),
    ("DDNS_IP_SOURCE_URL", "ip_url"),
    ("DDNS_API_BASE", "api_base"),
    ("DDNS_LOG_LEVEL", "log_level"),
];

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Interpret a boolean-like setting.
///
/// `false`, `False`, `no` and `No` are false, as is an empty value. Any
/// other value is true.
pub fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty() || matches!(value, "false" | "False" | "no" | "No"))
}

/// Raw key/value settings before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Create an empty settings map
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse INI-style text.
    ///
    /// Keys under `[DEFAULT]` are accepted; other sections are ignored. A
    /// key before the first section header is an error. `=` and `:` both
    /// separate key from value. Lines starting with `#` or `;` are comments.
    pub fn parse(text: &str) -> Result<Self> {
        let mut settings = Self::new();
        // None until the first section header
        let mut in_default: Option<bool> = None;

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(section) = line.strip_prefix('[') {
                let name = section.strip_suffix(']').ok_or_else(|| {
                    Error::config(format!("Line {}: unterminated section header", index + 1))
                })?;
                in_default = Some(name.trim() == "DEFAULT");
                continue;
            }

            let Some((key, value)) = line.split_once(['=', ':']) else {
                return Err(Error::config(format!(
                    "Line {}: expected `key = value`, got '{}'",
                    index + 1,
                    line
                )));
            };

            match in_default {
                Some(true) => settings.set(key, value),
                Some(false) => {}
                None => {
                    return Err(Error::config(format!(
                        "Line {}: key '{}' appears before any section header; expected [DEFAULT]",
                        index + 1,
                        key.trim()
                    )));
                }
            }
        }

        Ok(settings)
    }

    /// Read and parse a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        tracing::debug!("Loaded config file {}", path.display());
        Self::parse(&text)
    }

    /// Set a value; the key is stored lowercased
    pub fn set(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
    }

    /// Look up a value by (case-insensitive) key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Override settings from `DDNS_*` variables.
    ///
    /// Takes the variables as an iterator so callers can pass
    /// `std::env::vars()` or a fixed list.
    pub fn merge_env<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in vars {
            let (name, value) = (name.as_ref(), value.as_ref());

            if name == "DDNS_MODE" {
                let dry_run = value.trim().eq_ignore_ascii_case("dry-run");
                self.set("dry_run", if dry_run { "true" } else { "false" });
                continue;
            }

            if let Some((_, key)) = ENV_KEYS.iter().find(|(env, _)| *env == name) {
                self.set(key, value);
            }
        }
    }
}

/// Validated configuration for one reconciler run
#[derive(Clone, PartialEq, Eq)]
pub struct DdnsConfig {
    /// Provider login identity (`X-Auth-Email`)
    pub email: String,

    /// Bearer API credential
    /// ⚠️ NEVER log this value
    pub api_key: String,

    /// Zone name and record name filter
    pub domain: String,

    /// Debug-level logging
    pub verbose: bool,

    /// Skip the bare-domain record
    pub ignore_tld: bool,

    /// Perform reads, log intended writes, send none
    pub dry_run: bool,

    /// IP-echo service URL
    pub ip_source_url: String,

    /// Provider API base URL
    pub api_base: String,

    /// Explicit log level, overriding `verbose`
    pub log_level: Option<String>,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("email", &self.email)
            .field("api_key", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("verbose", &self.verbose)
            .field("ignore_tld", &self.ignore_tld)
            .field("dry_run", &self.dry_run)
            .field("ip_source_url", &self.ip_source_url)
            .field("api_base", &self.api_base)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl DdnsConfig {
    /// Build and validate a configuration from raw settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            match settings.get(key) {
                Some(value) if !value.is_empty() => Ok(value.to_string()),
                _ => Err(Error::config(format!(
                    "'{}' is required. Set it in {} or via the environment",
                    key, DEFAULT_CONFIG_FILE
                ))),
            }
        };
        let flag = |key: &str| settings.get(key).is_some_and(parse_flag);
        let optional = |key: &str| {
            settings
                .get(key)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let config = Self {
            email: required("email")?,
            api_key: required("key")?,
            domain: required("domains")?,
            verbose: flag("verbose"),
            ignore_tld: flag("ignore_tld"),
            dry_run: flag("dry_run"),
            ip_source_url: optional("ip_url").unwrap_or_else(|| DEFAULT_IP_SOURCE_URL.to_string()),
            api_base: optional("api_base")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            log_level: optional("log_level").map(|level| level.to_ascii_lowercase()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.email.is_empty() {
            return Err(Error::config("email cannot be empty"));
        }
        if self.api_key.is_empty() {
            return Err(Error::config("API key cannot be empty"));
        }

        validate_domain_name(&self.domain)?;
        validate_url("ip_url", &self.ip_source_url)?;
        validate_url("api_base", &self.api_base)?;

        if let Some(level) = &self.log_level
            && !LOG_LEVELS.contains(&level.as_str())
        {
            return Err(Error::config(format!(
                "log_level '{}' is not valid. Valid levels: {}",
                level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    /// The tracing level this run should log at
    pub fn effective_log_level(&self) -> &str {
        match &self.log_level {
            Some(level) => level,
            None if self.verbose => "debug",
            None => "info",
        }
    }
}

fn validate_url(key: &str, url: &str) -> Result<()> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            key, url
        )))
    }
}

/// Basic RFC 1035 domain name check. A single trailing dot is allowed.
fn validate_domain_name(domain: &str) -> Result<()> {
    let name = domain.strip_suffix('.').unwrap_or(domain);

    if name.is_empty() {
        return Err(Error::invalid_input("Domain name cannot be empty"));
    }

    if name.len() > 253 {
        return Err(Error::invalid_input(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            name.len(),
            domain
        )));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(Error::invalid_input(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(Error::invalid_input(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::invalid_input(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::invalid_input(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}
