//! Configuration management
//!
//! Defaults, overridden by a TOML file or by `DAPPCORD_<SECTION>_<KEY>`
//! environment variables. Every loader validates before returning.

use crate::core_registry::Address;
use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

mod error;

pub use error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub deployment: DeploymentConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// Parameters used when a registry is first deployed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Display name of the credential collection
    pub name: String,

    /// Display symbol of the credential collection
    pub symbol: String,

    /// Initial owner; required at deploy time if not given on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the registry and ledger snapshots
    pub data_dir: PathBuf,

    /// File name of the registry snapshot inside `data_dir`
    pub registry_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub json_format: bool,
    pub with_timestamp: bool,
    pub with_target: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Register metric descriptions at startup
    pub enabled: bool,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            name: "Dappcord".to_string(),
            symbol: "DC".to_string(),
            owner: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            registry_file: "registry.snapshot".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn parse_env<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key,
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables over the defaults
    ///
    /// Example: `DAPPCORD_STORE_DATA_DIR=/var/lib/dappcord`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::FileReadError)?;
        let mut config: Self = toml::from_str(&contents)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(name) = parse_env::<String>("DAPPCORD_DEPLOYMENT_NAME")? {
            self.deployment.name = name;
        }
        if let Some(symbol) = parse_env::<String>("DAPPCORD_DEPLOYMENT_SYMBOL")? {
            self.deployment.symbol = symbol;
        }
        if let Some(owner) = parse_env::<Address>("DAPPCORD_DEPLOYMENT_OWNER")? {
            self.deployment.owner = Some(owner);
        }

        if let Some(data_dir) = parse_env::<PathBuf>("DAPPCORD_STORE_DATA_DIR")? {
            self.store.data_dir = data_dir;
        }
        if let Some(file) = parse_env::<String>("DAPPCORD_STORE_REGISTRY_FILE")? {
            self.store.registry_file = file;
        }

        if let Some(level) = parse_env::<LogLevel>("DAPPCORD_LOGGING_LEVEL")? {
            self.logging.level = level;
        }
        if let Some(json) = parse_env::<bool>("DAPPCORD_LOGGING_JSON_FORMAT")? {
            self.logging.json_format = json;
        }

        if let Some(enabled) = parse_env::<bool>("DAPPCORD_METRICS_ENABLED")? {
            self.metrics.enabled = enabled;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deployment.name.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "deployment.name must not be empty".to_string(),
            ));
        }
        if self.deployment.symbol.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "deployment.symbol must not be empty".to_string(),
            ));
        }
        if self.deployment.owner.is_some_and(|owner| owner.is_zero()) {
            return Err(ConfigError::ValidationFailed(
                "deployment.owner must not be the zero address".to_string(),
            ));
        }

        let file = Path::new(&self.store.registry_file);
        if self.store.registry_file.is_empty() || file.components().count() != 1 {
            return Err(ConfigError::ValidationFailed(format!(
                "store.registry_file must be a plain file name, got {:?}",
                self.store.registry_file
            )));
        }
        if self.store.registry_file == crate::core_registry::store::LEDGER_FILE {
            return Err(ConfigError::ValidationFailed(
                "store.registry_file collides with the ledger file".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(ConfigError::FileWriteError)?;
        Ok(())
    }
}
