//! Error types for the logging subsystem

use thiserror::Error;

/// Errors that can occur while installing the subscriber
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoggingError {
    /// A global subscriber is already installed, or the install failed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// Unknown level name
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),
}
