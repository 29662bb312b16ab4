//! Error types for flightabove.
//!
//! The crate-level [`Error`] covers setup and persistence failures: loading
//! configuration, building the HTTP client, reading and writing the settings
//! file. Failures of remote services during a poll are not `Error`s; they are
//! absorbed where they happen (see [`crate::location::LocationError`] and
//! [`crate::provider::ProviderError`]).

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for flightabove operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Settings Errors ===
    /// Reading or writing persisted settings failed.
    #[error("settings store error at {path}: {message}")]
    SettingsStore {
        /// Path of the settings file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    /// A settings value given on the command line was rejected.
    #[error("invalid setting '{key}': {message}")]
    InvalidSetting {
        /// Name of the setting.
        key: String,
        /// Why the value was rejected.
        message: String,
    },

    // === HTTP Errors ===
    /// Failed to build the HTTP client.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for flightabove operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create a settings store error.
    #[must_use]
    pub fn settings_store(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SettingsStore {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid setting error.
    #[must_use]
    pub fn invalid_setting(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Check if this error came from configuration loading or validation.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad(_) | Self::ConfigValidation { .. })
    }
}
