//! Error types for the Gatekeeper service.
//!
//! A denied request is not an error; see [`crate::ratelimit::Verdict`].

use thiserror::Error;

/// Main error type for Gatekeeper operations.
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Configuration-related errors. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Server(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<::config::ConfigError> for GatekeeperError {
    fn from(err: ::config::ConfigError) -> Self {
        GatekeeperError::Config(err.to_string())
    }
}

/// Result type alias for Gatekeeper operations.
pub type Result<T> = std::result::Result<T, GatekeeperError>;
