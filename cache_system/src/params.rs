//! Cache parameter configuration
//!
//! This module defines the CacheParams struct
//! for configuring cache capacity, TTL and key handling per namespace.

use crate::namespace::Namespace;
use config::CacheConfig;

pub const DEFAULT_LIMIT: usize = 1000;
pub const DEFAULT_EXPIRE: u64 = 60 * 60 * 24;

/// Policy of one bounded cache, fixed at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheParams {
    /// Namespace every key of this cache lives under
    pub namespace: Namespace,
    /// Maximum number of resident keys
    pub limit: usize,
    /// Default TTL in seconds
    pub expire: u64,
    /// Hash memoization keys to a fixed length
    pub hashkeys: bool,
}

impl CacheParams {
    pub fn new(namespace: impl Into<Namespace>) -> Self {
        Self {
            namespace: namespace.into(),
            limit: DEFAULT_LIMIT,
            expire: DEFAULT_EXPIRE,
            hashkeys: false,
        }
    }

    /// Take limit, TTL and key hashing from the application configuration
    pub fn from_config(namespace: impl Into<Namespace>, config: &CacheConfig) -> Self {
        Self {
            namespace: namespace.into(),
            limit: config.limit,
            expire: config.default_ttl,
            hashkeys: config.hashkeys,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_expire(mut self, expire: u64) -> Self {
        self.expire = expire;
        self
    }

    pub fn with_hashkeys(mut self, hashkeys: bool) -> Self {
        self.hashkeys = hashkeys;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = CacheParams::new("reports");
        assert_eq!(params.namespace, Namespace::from("reports"));
        assert_eq!(params.limit, 1000);
        assert_eq!(params.expire, 86400);
        assert!(!params.hashkeys);
    }

    #[test]
    fn test_from_config() {
        let config = CacheConfig::new(10, 30, true);
        let params = CacheParams::from_config(7i64, &config).with_limit(20);
        assert_eq!(params.namespace, Namespace::Id(7));
        assert_eq!(params.limit, 20);
        assert_eq!(params.expire, 30);
        assert!(params.hashkeys);
    }
}
