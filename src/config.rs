use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, SailthruError};
use crate::pagination::{DEFAULT_PAGE_SIZE_DAYS, DEFAULT_RESULT_LIMIT};
use crate::transport::DEFAULT_BASE_URL;

pub const API_KEY_ENV: &str = "SAILTHRU_API_KEY";
pub const API_SECRET_ENV: &str = "SAILTHRU_API_SECRET";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub jobs: JobConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            secret: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_page_size_days")]
    pub page_size_days: u32,
    #[serde(default = "default_result_limit")]
    pub result_limit: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size_days: default_page_size_days(),
            result_limit: default_result_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_page_size_days() -> u32 {
    DEFAULT_PAGE_SIZE_DAYS
}

fn default_result_limit() -> u64 {
    DEFAULT_RESULT_LIMIT
}

fn default_max_attempts() -> u32 {
    3
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_max_wait_secs() -> u64 {
    6 * 60 * 60
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        // If file doesn't exist, fall back to defaults (credentials may still come from env)
        let mut config = if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Self::default()
        } else {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| SailthruError::Config(format!("Failed to read config file: {}", e)))?;

            let config: Self = toml::from_str(&content)
                .map_err(|e| SailthruError::Config(format!("Failed to parse config file: {}", e)))?;

            tracing::info!("Loaded configuration from {:?}", path);
            config
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Credentials from the environment win over the config file
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                self.api.key = key;
            }
        }
        if let Ok(secret) = std::env::var(API_SECRET_ENV) {
            if !secret.is_empty() {
                self.api.secret = secret;
            }
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    SailthruError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| SailthruError::Config(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| SailthruError::Config(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            return Err(SailthruError::Config("api.base_url cannot be empty".to_string()));
        }
        if self.api.timeout_secs == 0 {
            return Err(SailthruError::Config(
                "api.timeout_secs must be greater than 0".to_string(),
            ));
        }

        // The API truncates large listings, so keep windows to at most a year
        if self.fetch.page_size_days == 0 {
            return Err(SailthruError::Config(
                "fetch.page_size_days must be at least 1".to_string(),
            ));
        }
        if self.fetch.page_size_days > 365 {
            return Err(SailthruError::Config(
                "fetch.page_size_days cannot exceed 365".to_string(),
            ));
        }
        if self.fetch.result_limit == 0 {
            return Err(SailthruError::Config(
                "fetch.result_limit must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(SailthruError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.jobs.poll_interval_secs == 0 {
            return Err(SailthruError::Config(
                "jobs.poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.jobs.max_wait_secs == 0 {
            return Err(SailthruError::Config(
                "jobs.max_wait_secs must be greater than 0".to_string(),
            ));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Both halves of the API credentials are present
    pub fn require_credentials(&self) -> Result<()> {
        if self.api.key.is_empty() || self.api.secret.is_empty() {
            return Err(SailthruError::Config(format!(
                "API credentials missing: set api.key and api.secret or {} and {}",
                API_KEY_ENV, API_SECRET_ENV
            )));
        }
        Ok(())
    }

    /// Create an example configuration file
    pub async fn create_example(path: &Path) -> Result<()> {
        let config = Self::default();
        config.save(path).await
    }
}
