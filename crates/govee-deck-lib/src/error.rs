//! Unified error type for the govee-deck-lib crate.
//!
//! [`GoveeDeckError`] wraps module-specific errors (`ConfigError`, `ApiError`)
//! and the host protocol / I/O failures. `From` impls allow `?` to propagate
//! across module boundaries.

use std::fmt;

use crate::client::ApiError;
use crate::settings::ConfigError;

/// Unified error type for govee-deck-lib operations.
#[derive(Debug)]
pub enum GoveeDeckError {
    /// Missing or placeholder credential / device identifier.
    Config(ConfigError),
    /// Govee API call failed (transport, HTTP status, body, or API code).
    Api(ApiError),
    /// Standard I/O error (config file read/write).
    Io(std::io::Error),
    /// A host message could not be decoded.
    Protocol(String),
}

impl fmt::Display for GoveeDeckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoveeDeckError::Config(e) => write!(f, "{e}"),
            GoveeDeckError::Api(e) => write!(f, "{e}"),
            GoveeDeckError::Io(e) => write!(f, "I/O error: {e}"),
            GoveeDeckError::Protocol(e) => write!(f, "Protocol error: {e}"),
        }
    }
}

impl std::error::Error for GoveeDeckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GoveeDeckError::Config(e) => Some(e),
            GoveeDeckError::Api(e) => Some(e),
            GoveeDeckError::Io(e) => Some(e),
            GoveeDeckError::Protocol(_) => None,
        }
    }
}

impl From<ConfigError> for GoveeDeckError {
    fn from(e: ConfigError) -> Self {
        GoveeDeckError::Config(e)
    }
}

impl From<ApiError> for GoveeDeckError {
    fn from(e: ApiError) -> Self {
        GoveeDeckError::Api(e)
    }
}

impl From<std::io::Error> for GoveeDeckError {
    fn from(e: std::io::Error) -> Self {
        GoveeDeckError::Io(e)
    }
}

impl From<serde_json::Error> for GoveeDeckError {
    fn from(e: serde_json::Error) -> Self {
        GoveeDeckError::Protocol(e.to_string())
    }
}

/// Crate-level Result alias using [`GoveeDeckError`].
pub type Result<T> = std::result::Result<T, GoveeDeckError>;
