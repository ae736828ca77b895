//! Configuration management for aircheck

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::{DEFAULT_CAPACITY, DEFAULT_TTL};
use crate::client::geocoding::{DEFAULT_REQUESTS_PER_SECOND, default_user_agent};
use crate::client::models::DEFAULT_COUNTRY;
use crate::client::{DEFAULT_AIR_QUALITY_URL, DEFAULT_GEOCODING_URL};
use crate::error::{ConfigError, Result};
use crate::pipeline::RetryPolicy;
use crate::pipeline::retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub geocoding: GeocodingSettings,

    #[serde(default)]
    pub air_quality: AirQualitySettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub cache: CacheSettings,

    /// Overall limit on the network part of one lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Country assumed when the user leaves it blank
    #[serde(default = "default_country")]
    pub default_country: String,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

/// Geocoding service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingSettings {
    #[serde(default = "default_geocoding_url")]
    pub base_url: String,

    /// Overrides the built-in `aircheck/<version>` User-Agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Client-side request rate; 0 disables throttling
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
}

fn default_geocoding_url() -> String {
    DEFAULT_GEOCODING_URL.to_string()
}

fn default_requests_per_second() -> f64 {
    DEFAULT_REQUESTS_PER_SECOND
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_url(),
            user_agent: None,
            requests_per_second: default_requests_per_second(),
        }
    }
}

impl GeocodingSettings {
    pub fn user_agent(&self) -> String {
        self.user_agent.clone().unwrap_or_else(default_user_agent)
    }
}

/// Air quality service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualitySettings {
    #[serde(default = "default_air_quality_url")]
    pub base_url: String,
}

fn default_air_quality_url() -> String {
    DEFAULT_AIR_QUALITY_URL.to_string()
}

impl Default for AirQualitySettings {
    fn default() -> Self {
        Self {
            base_url: default_air_quality_url(),
        }
    }
}

/// Retry settings, applied to each network step separately
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY.as_millis() as u64
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

/// Result cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Keep results between runs in the SQLite cache
    #[serde(default = "default_true")]
    pub persistent: bool,

    /// Background expiry sweep; off when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweep_interval_secs: Option<u64>,
}

fn default_true() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL.as_secs()
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_ttl_secs(),
            capacity: default_capacity(),
            persistent: true,
            sweep_interval_secs: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geocoding: GeocodingSettings::default(),
            air_quality: AirQualitySettings::default(),
            retry: RetrySettings::default(),
            cache: CacheSettings::default(),
            request_timeout_secs: None,
            default_country: default_country(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".aircheck").join("config.yaml"))
    }

    /// Resolve `--config` (or the default path) to a concrete path
    pub fn resolve_path(config_path: Option<&str>) -> Result<PathBuf> {
        match config_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Self::default_path(),
        }
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_at(config_path: Option<&str>) -> Result<Self> {
        let path = Self::resolve_path(config_path)?;
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(path, contents)?;

        // Set file permissions to 600 on Unix systems
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Reject settings no lookup could work with
    pub fn validate(&self) -> Result<()> {
        if self.geocoding.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("geocoding.base_url is empty".to_string()).into());
        }
        if self.air_quality.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("air_quality.base_url is empty".to_string()).into());
        }
        if !self.geocoding.requests_per_second.is_finite()
            || self.geocoding.requests_per_second < 0.0
        {
            return Err(ConfigError::Invalid(
                "geocoding.requests_per_second must be 0 or more".to_string(),
            )
            .into());
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be at least 1".to_string()).into());
        }
        if self.cache.capacity == 0 {
            return Err(ConfigError::Invalid("cache.capacity must be at least 1".to_string()).into());
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.base_delay_ms),
        )
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        self.cache
            .sweep_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
