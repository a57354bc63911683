//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPAHOLIC_API_URL` - Base URL of the backend API (e.g. `http://localhost:3000/api`)
//!
//! ## Optional
//! - `SHOPAHOLIC_STORAGE_DIR` - Directory for persisted client state (default: `.shopaholic`)
//! - `SHOPAHOLIC_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime in seconds (default: 300)
//! - `SHOPAHOLIC_REQUEST_TIMEOUT_SECS` - HTTP request timeout in seconds (default: 10)
//! - `SHOPAHOLIC_SYNC_CAPACITY` - Storage event buffer per session (default: 64)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend API configuration
    pub api: ApiConfig,
    /// Directory of the file-backed key/value store
    pub storage_dir: PathBuf,
    /// Buffered storage events per session before older ones are dropped
    pub sync_capacity: usize,
}

/// Backend API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL; endpoint paths are appended to it
    pub base_url: Url,
    /// How long catalog responses stay cached
    pub catalog_cache_ttl: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl ApiConfig {
    /// Configuration with default cache and timeout settings.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            catalog_cache_ttl: Duration::from_secs(300),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl StorefrontConfig {
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

        let base_url = Url::parse(&get_required_env("SHOPAHOLIC_API_URL")?).map_err(|e| {
            ConfigError::InvalidEnvVar("SHOPAHOLIC_API_URL".to_string(), e.to_string())
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPAHOLIC_API_URL".to_string(),
                "must be an absolute http(s) URL".to_string(),
            ));
        }

        let api = ApiConfig {
            base_url,
            catalog_cache_ttl: Duration::from_secs(parse_env_or(
                "SHOPAHOLIC_CATALOG_CACHE_TTL_SECS",
                300,
            )?),
            request_timeout: Duration::from_secs(parse_env_or(
                "SHOPAHOLIC_REQUEST_TIMEOUT_SECS",
                10,
            )?),
        };

        Ok(Self {
            api,
            storage_dir: PathBuf::from(get_env_or_default("SHOPAHOLIC_STORAGE_DIR", ".shopaholic")),
            sync_capacity: parse_env_or("SHOPAHOLIC_SYNC_CAPACITY", 64)?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional environment variable, falling back to `default`.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key).map_or(Ok(default), |raw| parse_value(key, &raw))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
