//! Result and error types for probar-mobile.

use thiserror::Error;

/// Result type for audit operations
pub type AuditResult<T> = Result<T, AuditError>;

/// Errors that can occur while auditing a page
#[derive(Debug, Error)]
pub enum AuditError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Script evaluation in the page failed or returned an unusable value
    #[error("Page evaluation failed: {message}")]
    EvaluationError {
        /// Error message
        message: String,
    },

    /// Device emulation could not be applied
    #[error("Emulation of {device} failed: {message}")]
    EmulationError {
        /// Device being emulated
        device: String,
        /// Error message
        message: String,
    },

    /// Device name not present in the catalog
    #[error("Unknown device: {name}")]
    UnknownDevice {
        /// Requested device name
        name: String,
    },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// Page result did not match the expected shape
    #[error("Could not decode {what}: {source}")]
    Decode {
        /// What was being decoded
        what: &'static str,
        /// Underlying error
        source: serde_json::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl AuditError {
    /// Create an evaluation error
    #[must_use]
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::EvaluationError {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error is contained to a single device/check pair
    #[must_use]
    pub const fn is_page_local(&self) -> bool {
        matches!(
            self,
            Self::EvaluationError { .. } | Self::EmulationError { .. } | Self::Decode { .. }
        )
    }
}
