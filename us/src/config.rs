//! Unscatter configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::domain::ImageRules;
use crate::limiter::LimiterConfig;
use crate::sanitize::DEFAULT_MAX_TEXT_LENGTH;

/// Environment variable that overrides `api.base-url`
pub const API_URL_ENV: &str = "UNSCATTER_API_URL";

/// Main Unscatter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Analysis proxy connection
    pub api: ApiConfig,

    /// Client-side request limit
    #[serde(rename = "rate-limit")]
    pub rate_limit: LimiterConfig,

    /// Result cache
    pub cache: CacheConfig,

    /// Text input limits
    pub input: InputConfig,

    /// Image upload limits
    pub images: ImageRules,

    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// A zero request limit or window would leave the limiter refusing every
    /// request with a zero wait, so both are rejected here.
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit.max_requests == 0 {
            return Err(eyre::eyre!("rate-limit.max-requests must be at least 1"));
        }
        if self.rate_limit.window_ms == 0 {
            return Err(eyre::eyre!("rate-limit.window-ms must be at least 1"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    ///
    /// Explicit path, then `./.unscatter.yml`, then
    /// `~/.config/unscatter/unscatter.yml`, then defaults. The
    /// `UNSCATTER_API_URL` environment variable is applied last.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let config = Self::load_file_chain(config_path)?.with_api_url_override(std::env::var(API_URL_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    fn load_file_chain(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".unscatter.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("unscatter").join("unscatter.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Read just the log level, ignoring any errors
    ///
    /// Used before logging is initialised, so failures stay silent.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let paths = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::default_paths(),
        };

        paths
            .iter()
            .find(|p| p.exists())
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    /// Replace the base URL when an override is present and non-empty
    pub fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            tracing::debug!(%url, "Config::with_api_url_override: applying override");
            self.api.base_url = url;
        }
        self
    }
}

/// Analysis proxy connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Proxy base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Text input limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Maximum characters sent after sanitization
    #[serde(rename = "max-text-length")]
    pub max_text_length: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }
}
