//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STUDYHALL_API_BASE_URL` - Absolute http(s) URL of the Studyhall API
//!
//! ## Optional
//! - `STUDYHALL_API_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
//! - `STUDYHALL_STATE_FILE` - Path of the durable session state file
//!   (default: `.studyhall/state.json`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: &str = "30";
const DEFAULT_STATE_FILE: &str = ".studyhall/state.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client application configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Studyhall API (no trailing slash is assumed).
    pub api_base_url: Url,
    /// Timeout applied to every outbound request.
    pub timeout: Duration,
    /// Path of the durable session state file.
    pub state_file: PathBuf,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(
            "STUDYHALL_API_BASE_URL",
            &get_required_env("STUDYHALL_API_BASE_URL")?,
        )?;
        let timeout_secs = get_env_or_default("STUDYHALL_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STUDYHALL_API_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
        let state_file =
            PathBuf::from(get_env_or_default("STUDYHALL_STATE_FILE", DEFAULT_STATE_FILE));

        Ok(Self {
            api_base_url,
            timeout: Duration::from_secs(timeout_secs),
            state_file,
        })
    }

    /// Build a configuration directly, for embedding and tests.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_base_url` is not an absolute http(s) URL.
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url("api_base_url", api_base_url)?,
            timeout: Duration::from_secs(30),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
        })
    }
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse and validate the API base URL.
fn parse_base_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidEnvVar(
            name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url)
}
