//! Configuration management for DocChat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! Precedence, lowest to highest: built-in defaults, YAML file,
//! environment, command line.

use crate::error::{DocChatError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for DocChat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,
    /// Session behavior
    #[serde(default)]
    pub session: SessionConfig,
    /// Interactive chat settings
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the document Q&A service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for a single request (seconds)
    ///
    /// Ingesting a large document can take a while on the server side.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Session behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Drop responses that arrive after their session was replaced or
    /// removed, instead of applying them to the current session
    #[serde(default = "default_discard_stale")]
    pub discard_stale_responses: bool,
}

fn default_discard_stale() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            discard_stale_responses: default_discard_stale(),
        }
    }
}

/// Interactive chat configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Print the time next to each message
    #[serde(default)]
    pub show_timestamps: bool,

    /// Where to keep readline history; defaults to the platform data dir
    #[serde(default)]
    pub history_file: Option<PathBuf>,
}

/// Longest accepted request timeout (seconds)
const MAX_TIMEOUT_SECONDS: u64 = 3600;

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DocChatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| DocChatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("DOCCHAT_API_URL") {
            tracing::debug!(base_url = %base_url, "Env override: DOCCHAT_API_URL");
            self.backend.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("DOCCHAT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.backend.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid DOCCHAT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(discard) = std::env::var("DOCCHAT_DISCARD_STALE") {
            match discard.parse::<bool>() {
                Ok(v) => {
                    self.session.discard_stale_responses = v;
                    tracing::debug!(discard = v, "Env override: DOCCHAT_DISCARD_STALE");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for DOCCHAT_DISCARD_STALE: {}", discard);
                }
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(api_url) = &cli.api_url {
            self.backend.base_url = api_url.clone();
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if the backend URL is not an absolute http(s) URL or
    /// the timeout is out of range
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(DocChatError::Config("backend.base_url cannot be empty".to_string()).into());
        }

        let url = url::Url::parse(&self.backend.base_url).map_err(|e| {
            DocChatError::Config(format!(
                "Invalid backend.base_url '{}': {}",
                self.backend.base_url, e
            ))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(DocChatError::Config(format!(
                "backend.base_url must use http or https, got '{}'",
                url.scheme()
            ))
            .into());
        }

        if self.backend.timeout_seconds == 0 {
            return Err(DocChatError::Config(
                "backend.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.backend.timeout_seconds > MAX_TIMEOUT_SECONDS {
            return Err(DocChatError::Config(format!(
                "backend.timeout_seconds must be less than or equal to {}",
                MAX_TIMEOUT_SECONDS
            ))
            .into());
        }

        Ok(())
    }
}
