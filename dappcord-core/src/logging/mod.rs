//! Logging subsystem
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a plain
//! or JSON formatter. Records go to stderr so command output on stdout stays
//! machine-readable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod error;
mod level;

pub use error::LoggingError;
pub use level::LogLevel;

/// Environment variable that overrides the configured filter
pub const LOG_FILTER_ENV: &str = "DAPPCORD_LOG";

/// Configuration for the logging subsystem
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub with_timestamp: bool,
    pub with_target: bool,
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            with_timestamp: true,
            with_target: true,
            json_format: false,
        }
    }
}

impl LogConfig {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    pub fn with_timestamp(mut self, enabled: bool) -> Self {
        self.with_timestamp = enabled;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    pub fn json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }
}

impl From<&crate::config::LoggingConfig> for LogConfig {
    fn from(config: &crate::config::LoggingConfig) -> Self {
        LogConfig::new(config.level)
            .with_timestamp(config.with_timestamp)
            .with_target(config.with_target)
            .json_format(config.json_format)
    }
}

/// Initialize logging with the default configuration
pub fn init_logging() -> Result<(), LoggingError> {
    init_logging_with_config(LogConfig::default())
}

/// Initialize logging with a custom configuration
///
/// `DAPPCORD_LOG`, when set, takes precedence over `config.level`.
///
/// # Example
/// ```
/// use dappcord_core::logging::{init_logging_with_config, LogConfig, LogLevel};
///
/// let config = LogConfig::new(LogLevel::Debug).with_target(false);
/// init_logging_with_config(config).expect("Failed to initialize logging");
/// ```
pub fn init_logging_with_config(config: LogConfig) -> Result<(), LoggingError> {
    let env_filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));
    let registry = tracing_subscriber::registry().with(env_filter);
    let target = config.with_target;

    let result = match (config.json_format, config.with_timestamp) {
        (true, true) => registry
            .with(fmt::layer().json().with_target(target).with_writer(std::io::stderr))
            .try_init(),
        (true, false) => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(target)
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        (false, true) => registry
            .with(fmt::layer().with_target(target).with_writer(std::io::stderr))
            .try_init(),
        (false, false) => registry
            .with(
                fmt::layer()
                    .with_target(target)
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    result.map_err(|e| LoggingError::InitializationFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert!(config.with_timestamp);
        assert!(config.with_target);
        assert!(!config.json_format);
    }

    #[test]
    fn test_log_config_builder() {
        let config = LogConfig::new(LogLevel::Debug)
            .with_timestamp(false)
            .with_target(false)
            .json_format(true);

        assert_eq!(config.level, LogLevel::Debug);
        assert!(!config.with_timestamp);
        assert!(!config.with_target);
        assert!(config.json_format);
    }

    #[test]
    fn test_log_config_from_settings() {
        let mut settings = crate::config::LoggingConfig::default();
        settings.level = LogLevel::Warn;
        settings.json_format = true;

        let config = LogConfig::from(&settings);
        assert_eq!(config.level, LogLevel::Warn);
        assert!(config.json_format);
    }

    #[test]
    fn test_second_init_fails() {
        // Whichever test installs first wins; the other call must error, not panic
        let first = init_logging_with_config(LogConfig::new(LogLevel::Error).with_timestamp(false));
        let second = init_logging();
        assert!(first.is_err() || second.is_err());
    }
}
