//! Relay configuration.

use std::str::FromStr;
use std::time::Duration;

use convrelay_common::{constants, looks_like_currency};
use convrelay_fx::{DEFAULT_BANK_ENDPOINT, DEFAULT_RATES_ENDPOINT};

use crate::error::{RelayError, RelayResult};

/// Exchange rate configuration.
#[derive(Debug, Clone)]
pub struct RatesConfig {
    /// Rate endpoint; the base code is appended as a path segment.
    pub endpoint: String,
    /// Pivot currency.
    pub pivot: String,
    /// How long a fetched table stays fresh.
    pub cache_ttl: Duration,
    /// Timeout for a single fetch.
    pub fetch_timeout: Duration,
    /// Retry with the source currency as base when the pivot table misses.
    pub alternate_base: bool,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_RATES_ENDPOINT.to_string(),
            pivot: constants::PIVOT_CURRENCY.to_string(),
            cache_ttl: constants::rate_cache_ttl(),
            fetch_timeout: constants::fetch_timeout(),
            alternate_base: false,
        }
    }
}

/// Bank quote overlay configuration.
#[derive(Debug, Clone)]
pub struct BankConfig {
    /// Consult bank quotes for pairs involving the domestic currency.
    pub enabled: bool,
    /// Bank quote endpoint.
    pub endpoint: String,
    /// How long a quote table is reused.
    pub quote_ttl: Duration,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: DEFAULT_BANK_ENDPOINT.to_string(),
            quote_ttl: constants::bank_quote_ttl(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable lines.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("Unknown log format: {}", other)),
        }
    }
}

/// Main relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Exchange rate configuration.
    pub rates: RatesConfig,
    /// Bank overlay configuration.
    pub bank: BankConfig,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            rates: RatesConfig::default(),
            bank: BankConfig::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key-value source.
    ///
    /// Unparsable values are ignored and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("CONVRELAY_RATES_URL") {
            config.rates.endpoint = url;
        }

        if let Some(pivot) = lookup("CONVRELAY_PIVOT") {
            config.rates.pivot = pivot.to_uppercase();
        }

        if let Some(ttl) = lookup("CONVRELAY_CACHE_TTL_SECS").and_then(|v| v.parse().ok()) {
            config.rates.cache_ttl = Duration::from_secs(ttl);
        }

        if let Some(timeout) = lookup("CONVRELAY_FETCH_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.rates.fetch_timeout = Duration::from_secs(timeout);
        }

        if let Some(enabled) = lookup("CONVRELAY_ALTERNATE_BASE").and_then(|v| parse_bool(&v)) {
            config.rates.alternate_base = enabled;
        }

        if let Some(enabled) = lookup("CONVRELAY_BANK_OVERLAY").and_then(|v| parse_bool(&v)) {
            config.bank.enabled = enabled;
        }

        if let Some(url) = lookup("CONVRELAY_BANK_URL") {
            config.bank.endpoint = url;
        }

        if let Some(ttl) = lookup("CONVRELAY_BANK_TTL_SECS").and_then(|v| v.parse().ok()) {
            config.bank.quote_ttl = Duration::from_secs(ttl);
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        if let Some(format) = lookup("LOG_FORMAT").and_then(|v| v.parse().ok()) {
            config.log_format = format;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.rates.endpoint.is_empty() {
            return Err("Rates URL cannot be empty".to_string());
        }

        if !looks_like_currency(&self.rates.pivot) {
            return Err(format!(
                "Pivot must be a three-letter currency code, got '{}'",
                self.rates.pivot
            ));
        }

        if self.rates.cache_ttl.is_zero() {
            return Err("Cache TTL cannot be 0".to_string());
        }

        if self.rates.fetch_timeout.is_zero() {
            return Err("Fetch timeout cannot be 0".to_string());
        }

        if self.bank.enabled {
            if self.bank.endpoint.is_empty() {
                return Err("Bank URL cannot be empty when the overlay is enabled".to_string());
            }
            if self.bank.quote_ttl.is_zero() {
                return Err("Bank quote TTL cannot be 0".to_string());
            }
        }

        Ok(())
    }
}

impl RelayConfig {
    /// Validate, reporting failures as [`RelayError::Config`].
    pub fn check(&self) -> RelayResult<()> {
        self.validate().map_err(RelayError::Config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
