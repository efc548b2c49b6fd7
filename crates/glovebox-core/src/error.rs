//! Core error types for the Glovebox worker.
//!
//! This module defines the central error type used across all subsystems.
//! Each subsystem error is represented as a variant for clear error propagation.

use thiserror::Error;

/// Central error type for all Glovebox operations.
///
/// Each variant represents an error from a specific subsystem, allowing
/// for clear error propagation and handling across crate boundaries.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Message channel errors (missing parent link, delivery failure)
    #[error("channel error: {0}")]
    Channel(String),

    /// Browser session errors (launch, navigation, evaluation)
    #[error("browser error: {0}")]
    Browser(String),

    /// Sandbox errors (script evaluation, capability violations)
    #[error("sandbox error: {0}")]
    Sandbox(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `WorkerError`.
pub type Result<T> = std::result::Result<T, WorkerError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
