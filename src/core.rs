//! Core CacheHaus functionality
//!
//! This module contains the main CacheHaus struct and its implementation,
//! providing centralized coordination of configuration, Redis connectivity
//! and the named caches of an application.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use cache_system::{BoundedCache, CacheParams, Namespace, RedisConnect};
use config::AppConfig;

use crate::errors::CacheHausError;

/// Main CacheHaus coordinator that owns configuration and registered caches
#[derive(Debug)]
pub struct CacheHaus {
    config: AppConfig,
    caches: HashMap<String, Arc<BoundedCache>>,
}

impl CacheHaus {
    /// Create new CacheHaus from an already validated configuration
    pub fn new(config: AppConfig) -> Result<Self, CacheHausError> {
        config.validate()?;
        Ok(Self {
            config,
            caches: HashMap::new(),
        })
    }

    /// Create new CacheHaus from `.env` / `cachehaus.toml`
    pub fn load() -> Result<Self, CacheHausError> {
        Self::new(AppConfig::load()?)
    }

    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self, CacheHausError> {
        Self::new(AppConfig::from_file(path)?)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Cache parameters for `namespace` using the configured defaults
    pub fn params(&self, namespace: impl Into<Namespace>) -> CacheParams {
        CacheParams::from_config(namespace, &self.config.cache)
    }

    /// Open a cache with the configured defaults.
    ///
    /// Never fails: if Redis is unreachable the cache runs in degraded mode.
    pub async fn open_cache(&self, namespace: impl Into<Namespace>) -> Arc<BoundedCache> {
        let params = self.params(namespace);
        crate::debug_log!("Opening cache namespace {}", params.namespace);
        Arc::new(BoundedCache::connect(params, &self.config.redis).await)
    }

    /// Register a cache under a given name
    pub fn register_cache(
        &mut self,
        name: String,
        cache: Arc<BoundedCache>,
    ) -> Result<(), CacheHausError> {
        if self.caches.contains_key(&name) {
            return Err(CacheHausError::CacheAlreadyRegistered(name));
        }

        self.caches.insert(name, cache);
        Ok(())
    }

    /// Get a registered cache by name
    pub fn get_cache(&self, name: &str) -> Result<Arc<BoundedCache>, CacheHausError> {
        self.caches
            .get(name)
            .cloned()
            .ok_or_else(|| CacheHausError::CacheNotFound(name.to_string()))
    }

    /// List all registered cache names
    pub fn list_caches(&self) -> Vec<&String> {
        self.caches.keys().collect()
    }

    /// Remove a cache by name
    pub fn unregister_cache(&mut self, name: &str) -> Result<Arc<BoundedCache>, CacheHausError> {
        self.caches
            .remove(name)
            .ok_or_else(|| CacheHausError::CacheNotFound(name.to_string()))
    }

    /// Check Redis connectivity with the configured settings
    pub async fn health_check(&self) -> Result<(), CacheHausError> {
        RedisConnect::new(&self.config.redis).connect().await?;
        crate::trace_log!("Redis health check passed");
        Ok(())
    }
}
