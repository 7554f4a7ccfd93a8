//! Error types for the monitor engine
//!
//! These cover the process-level failure paths only (config loading, metric
//! registration, subscriber setup). A failing health check is never an
//! error: probes report it through [`crate::outcome::CheckOutcome`].

use thiserror::Error;

/// Result type for monitor engine operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors that can occur while setting up the monitor engine
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Metrics registry errors
    #[error("Metrics error: {message}")]
    Metrics { message: String },

    /// Tracing subscriber errors
    #[error("Tracing error: {message}")]
    Tracing { message: String },

    /// I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Serialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<std::io::Error> for MonitorError {
    fn from(error: std::io::Error) -> Self {
        MonitorError::Io {
            message: error.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for MonitorError {
    fn from(error: serde_yaml::Error) -> Self {
        MonitorError::Config {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(error: serde_json::Error) -> Self {
        MonitorError::Serialization {
            message: error.to_string(),
        }
    }
}

impl From<prometheus::Error> for MonitorError {
    fn from(error: prometheus::Error) -> Self {
        MonitorError::Metrics {
            message: error.to_string(),
        }
    }
}
