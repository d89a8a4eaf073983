//! Application configuration loaded from `config.toml` and the environment.

/// Chain endpoint and contract addresses
pub mod chain;

/// Department catalog from `[[departments]]`
pub mod departments;

/// Write-path signer from the `PRIVATE_KEY` environment variable
pub mod signer;

use crate::errors::{Error, Result};
use chain::ChainSettings;
use departments::{DepartmentCatalog, DepartmentConfig, default_departments};
use serde::Deserialize;
use std::{path::Path, time::Duration};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Chain connection settings
    #[serde(default)]
    pub chain: ChainSettings,
    /// Display currency settings
    #[serde(default)]
    pub currency: CurrencySettings,
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Background refresh settings
    #[serde(default)]
    pub refresh: RefreshSettings,
    /// Department display names
    #[serde(default = "default_departments")]
    pub departments: Vec<DepartmentConfig>,
}

/// `[currency]` section: how native token amounts are shown to people.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CurrencySettings {
    /// Prefix for display amounts
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Display units per native token unit
    #[serde(default = "default_rate")]
    pub rate: f64,
}

fn default_symbol() -> String {
    "RM".to_string()
}

const fn default_rate() -> f64 {
    3.0
}

impl Default for CurrencySettings {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            rate: default_rate(),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerSettings {
    /// Socket address the HTTP API binds to
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:3001".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// `[refresh]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RefreshSettings {
    /// Seconds between background refreshes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

const fn default_interval_secs() -> u64 {
    30
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl RefreshSettings {
    /// Refresh interval as a [`Duration`].
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl AppConfig {
    /// Department catalog built from the configured entries.
    #[must_use]
    pub fn catalog(&self) -> DepartmentCatalog {
        DepartmentCatalog::new(self.departments.clone())
    }

    fn validate(self) -> Result<Self> {
        if !self.currency.rate.is_finite() || self.currency.rate <= 0.0 {
            return Err(Error::Config {
                message: format!(
                    "currency.rate must be a positive number, got {}",
                    self.currency.rate
                ),
            });
        }
        if self.refresh.interval_secs == 0 {
            return Err(Error::Config {
                message: "refresh.interval_secs must be at least 1".to_string(),
            });
        }
        self.chain.spending_address()?;
        self.chain.feedback_address()?;
        Ok(self)
    }
}

/// Parses configuration from a TOML string.
///
/// # Errors
/// Returns an error if the TOML syntax is invalid or a value fails validation
/// (non-positive currency rate, zero refresh interval, malformed contract address).
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value fails validation
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `SPENDWATCH_CONFIG`, or `./config.toml` when unset.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path =
        std::env::var("SPENDWATCH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&path)
        .inspect_err(|e| tracing::error!("Critical error loading configuration: {e}"))?;
    tracing::info!(
        "Loaded configuration from {path}: network '{}', {} departments",
        config.chain.network,
        config.departments.len()
    );
    Ok(config)
}
