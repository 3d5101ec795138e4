//! Configuration management.

use crate::{CoreError, CoreResult, Paths};
use query_cache::{CacheConfig, RetryPolicy, DEFAULT_GC_TIME};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default portal API base URL (can be overridden at compile time via PORTAL_API_URL env var).
pub const DEFAULT_API_BASE_URL: &str = match option_env!("PORTAL_API_URL") {
    Some(url) => url,
    None => "http://localhost:8080/api",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVEL_ENV: &str = "PORTAL_LOG_LEVEL";
const API_URL_ENV: &str = "PORTAL_API_URL";

/// Portal sync configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Portal API base URL.
    pub api_base_url: String,
    /// HTTP request timeout.
    pub request_timeout_secs: u64,
    /// Age after which cached results are refetched. Zero: always revalidate.
    pub stale_time_ms: u64,
    /// How long unobserved cache entries are kept.
    pub gc_time_ms: u64,
    /// Automatic retry of failed fetches.
    pub retry: RetryConfig,
}

/// Fetch retry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt. Zero disables retry.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 30,
            stale_time_ms: 0,
            gc_time_ms: DEFAULT_GC_TIME.as_millis() as u64,
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file if present, then apply
    /// environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_env(|name| std::env::var(name).ok());
    }

    /// Applies `PORTAL_LOG_LEVEL` and `PORTAL_API_URL` as read through `lookup`.
    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(log_level) = lookup(LOG_LEVEL_ENV).and_then(non_empty) {
            self.log_level = log_level;
        }
        if let Some(url) = lookup(API_URL_ENV).and_then(non_empty) {
            self.api_base_url = url;
        }
    }

    /// Get the API base URL as a parsed URL.
    pub fn api_base_url(&self) -> CoreResult<Url> {
        let url = Url::parse(&self.api_base_url)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(CoreError::Config(format!(
                "api_base_url must be http or https, got {other}"
            ))),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Cache settings derived from this configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            stale_time: Duration::from_millis(self.stale_time_ms),
            gc_time: Duration::from_millis(self.gc_time_ms),
            retry: RetryPolicy::exponential(
                self.retry.max_retries,
                Duration::from_millis(self.retry.base_delay_ms),
                Duration::from_millis(self.retry.max_delay_ms),
            ),
        }
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
