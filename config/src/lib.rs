//! # Configuration Management for CacheHaus
//!
//! This crate provides centralized configuration structures for all CacheHaus components:
//! the Redis connection used by the cache and the default cache policy.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::{CacheConfig, RedisConfig};
//!
//! let redis_config = RedisConfig::new("localhost".to_string(), 6379, 0, 5000);
//! let cache_config = CacheConfig::new(1000, 86400, true);
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [redis]
//! host = "localhost"
//! port = 6379
//! db = 0
//! connection_timeout_ms = 5000
//!
//! [cache]
//! limit = 1000
//! default_ttl = 86400
//! hashkeys = false
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from cachehaus.toml
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::{env, path::Path, time::Duration};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./cachehaus.toml";
const CONFIG_PATH_ENV: &str = "CACHEHAUS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Redis connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub connection_timeout_ms: u64,
}

/// Default policy for caches opened from this configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of resident keys per namespace
    pub limit: usize,
    /// Default entry TTL in seconds
    pub default_ttl: u64,
    /// Hash memoization keys to a fixed length
    pub hashkeys: bool,
}

impl AppConfig {
    /// Load configuration from TOML file specified in .env or defaults
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                return Err(err.into());
            }
        }

        let config = if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            Self::from_file(&config_path)
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            Err(ConfigError::Invalid(format!(
                "Config path must be specified in .env file as {} or in {} file",
                CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH
            )))
        }?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Redis validations
        if self.redis.host.is_empty() {
            return Err(ConfigError::Invalid("Redis host cannot be empty".to_string()));
        }
        if self.redis.port == 0 {
            return Err(ConfigError::Invalid("Redis port cannot be zero".to_string()));
        }
        if self.redis.db < 0 {
            return Err(ConfigError::Invalid(
                "Redis db index cannot be negative".to_string(),
            ));
        }
        if self.redis.connection_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "Redis connection_timeout_ms must be greater than 0".to_string(),
            ));
        }

        // Cache validations
        if self.cache.limit == 0 {
            return Err(ConfigError::Invalid(
                "Cache limit must be greater than 0".to_string(),
            ));
        }
        if self.cache.default_ttl == 0 {
            return Err(ConfigError::Invalid(
                "Cache default_ttl must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl RedisConfig {
    /// Create a new Redis configuration
    pub fn new(host: String, port: u16, db: i64, connection_timeout_ms: u64) -> Self {
        Self {
            host,
            port,
            db,
            connection_timeout_ms,
        }
    }

    /// Build connection string
    pub fn connection_url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            connection_timeout_ms: 5000,
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration
    pub fn new(limit: usize, default_ttl: u64, hashkeys: bool) -> Self {
        Self {
            limit,
            default_ttl,
            hashkeys,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            limit: 1000,
            default_ttl: 60 * 60 * 24,
            hashkeys: false,
        }
    }
}
