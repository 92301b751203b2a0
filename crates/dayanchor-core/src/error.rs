//! Core error types for dayanchor-core.
//!
//! The engine is a pure function with defensive defaults, so the taxonomy is
//! narrow: caller contract violations surface as [`ValidationError`], broken
//! configuration as [`ConfigError`]. Everything else is absorbed by the
//! fallback paths of the pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for dayanchor-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors raised at the call boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Invalid time range
    #[error("Invalid time range: end ({end}) must be greater than start ({start})")]
    InvalidTimeRange { start: i64, end: i64 },

    /// Out of bounds
    #[error("Value {value} out of bounds for {field} (allowed {min}..={max})")]
    OutOfBounds {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Task duration outside (0, 1440]
    #[error("Invalid duration for task '{task_id}': {minutes} minutes")]
    InvalidDuration { task_id: String, minutes: i64 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        CoreError::Config(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_wraps_into_core_error() {
        let err: CoreError = ValidationError::InvalidDuration {
            task_id: "t1".into(),
            minutes: -5,
        }
        .into();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(err.to_string().contains("t1"));
        assert!(err.to_string().contains("-5"));
    }

    #[test]
    fn toml_error_becomes_parse_failed() {
        let parsed: std::result::Result<toml::Value, _> = toml::from_str("= nope");
        let err: ConfigError = parsed.unwrap_err().into();
        assert!(matches!(err, ConfigError::ParseFailed(_)));
    }
}
