//! Error types for DocChat
//!
//! This module defines the application error type, using `thiserror` for
//! ergonomic error handling. Failures of the remote backend are not part of
//! this enum: they are returned as data by the transport layer (see
//! [`crate::transport::TransportFailure`]) and end up as chat messages.

use thiserror::Error;

/// Main error type for DocChat operations
///
/// Covers everything that can go wrong outside the session core:
/// configuration loading, reading local files, terminal I/O and client
/// construction.
#[derive(Error, Debug)]
pub enum DocChatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A local file could not be turned into an upload
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    /// Interactive prompt errors
    #[error("Readline error: {0}")]
    Readline(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<rustyline::error::ReadlineError> for DocChatError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        Self::Readline(err.to_string())
    }
}

/// Result type alias for DocChat operations
///
/// Uses `anyhow::Error` as the error type so callers can attach context
/// while propagating.
pub type Result<T> = anyhow::Result<T>;
