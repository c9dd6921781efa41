//! Memoization of async functions
//!
//! [`cache_it`] and [`cache_it_json`] wrap a function taking one serializable
//! argument tuple. Each call derives `"<function name>:<key>"` from the
//! arguments, answers from the cache when it can, and otherwise computes the
//! result and stores it. Cache trouble never reaches the caller: an
//! unreachable store bypasses caching and unexpected store errors are logged
//! and treated as misses.
//!
//! ```rust,no_run
//! use cache_system::memoize::{cache_it, MemoizeOptions};
//!
//! # async fn demo() {
//! let area = cache_it(
//!     "area",
//!     |(w, h): (u32, u32)| async move { w * h },
//!     MemoizeOptions::default().with_namespace("geometry"),
//! );
//! assert_eq!(area.call((3, 4)).await, 12);
//! # }
//! ```

use crate::bounded::BoundedCache;
use crate::codec::{BinaryCodec, Codec, JsonCodec, hash_key};
use crate::errors::CacheError;
use crate::namespace::Namespace;
use crate::params::{CacheParams, DEFAULT_EXPIRE, DEFAULT_LIMIT};
use config::RedisConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Settings for a memoized function
#[derive(Debug, Clone)]
pub struct MemoizeOptions {
    /// Capacity of a lazily built cache
    pub limit: usize,
    /// TTL of a lazily built cache, in seconds
    pub expire: u64,
    /// Cache to share with other memoized functions
    pub cache: Option<Arc<BoundedCache>>,
    /// Namespace of a lazily built cache; defaults to the function name
    pub namespace: Option<Namespace>,
    /// Redis settings of a lazily built cache
    pub redis: RedisConfig,
}

impl Default for MemoizeOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            expire: DEFAULT_EXPIRE,
            cache: None,
            namespace: None,
            redis: RedisConfig::default(),
        }
    }
}

impl MemoizeOptions {
    /// Use an existing cache instead of building one
    pub fn shared(cache: Arc<BoundedCache>) -> Self {
        Self {
            cache: Some(cache),
            ..Self::default()
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

    pub fn with_namespace(mut self, namespace: impl Into<Namespace>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_redis(mut self, redis: RedisConfig) -> Self {
        self.redis = redis;
        self
    }
}

/// How a memoized call consults the cache before computing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Read the entry straight away
    Direct,
    /// Check Key Set membership first and read only listed keys
    MembershipFirst,
}

enum CacheSource {
    Shared(Arc<BoundedCache>),
    Lazy {
        params: CacheParams,
        redis: RedisConfig,
        cell: OnceCell<Arc<BoundedCache>>,
    },
}

/// A function bound to the cache that memoizes it
pub struct Memoized<F, C> {
    name: String,
    function: F,
    source: CacheSource,
    lookup: Lookup,
    _codec: PhantomData<fn() -> C>,
}

/// Memoize `function` with the binary encoding for both keys and results
pub fn cache_it<F>(
    name: impl Into<String>,
    function: F,
    options: MemoizeOptions,
) -> Memoized<F, BinaryCodec> {
    Memoized::new(name.into(), function, options, Lookup::Direct)
}

/// Memoize `function` with JSON for both keys and results.
///
/// Calls check Key Set membership before reading the entry. The extra round
/// trip is kept for parity with existing deployments of this variant.
pub fn cache_it_json<F>(
    name: impl Into<String>,
    function: F,
    options: MemoizeOptions,
) -> Memoized<F, JsonCodec> {
    Memoized::new(name.into(), function, options, Lookup::MembershipFirst)
}

impl<F, C: Codec> Memoized<F, C> {
    fn new(name: String, function: F, options: MemoizeOptions, lookup: Lookup) -> Self {
        let source = match options.cache {
            Some(cache) => CacheSource::Shared(cache),
            None => {
                let namespace = options
                    .namespace
                    .unwrap_or_else(|| Namespace::from(name.as_str()));
                CacheSource::Lazy {
                    params: CacheParams::new(namespace)
                        .with_limit(options.limit)
                        .with_expire(options.expire)
                        .with_hashkeys(true),
                    redis: options.redis,
                    cell: OnceCell::new(),
                }
            }
        };

        Self {
            name,
            function,
            source,
            lookup,
            _codec: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lookup(&self) -> Lookup {
        self.lookup
    }

    /// The backing cache, if it has been built yet
    pub fn cache(&self) -> Option<&Arc<BoundedCache>> {
        match &self.source {
            CacheSource::Shared(cache) => Some(cache),
            CacheSource::Lazy { cell, .. } => cell.get(),
        }
    }

    async fn resolve_cache(&self) -> &Arc<BoundedCache> {
        match &self.source {
            CacheSource::Shared(cache) => cache,
            CacheSource::Lazy {
                params,
                redis,
                cell,
            } => {
                cell.get_or_init(|| async {
                    Arc::new(BoundedCache::connect(params.clone(), redis).await)
                })
                .await
            }
        }
    }

    /// Cache key for an argument tuple
    pub fn cache_key<A: Serialize + ?Sized>(
        &self,
        args: &A,
        hashkeys: bool,
    ) -> Result<String, CacheError> {
        let encoded = C::encode(args)?;
        let key = if hashkeys { hash_key(&encoded) } else { encoded };
        Ok(format!("{}:{}", self.name, key))
    }

    async fn lookup_cached<R: DeserializeOwned>(
        &self,
        cache: &BoundedCache,
        key: &str,
    ) -> Option<R> {
        if self.lookup == Lookup::MembershipFirst {
            match cache.contains(key).await {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => {
                    self.log_unexpected(key, &e);
                    return None;
                }
            }
        }

        match cache.get_with::<C, R>(key).await {
            Ok(value) => Some(value),
            Err(e) if e.is_recoverable() => None,
            Err(e) => {
                self.log_unexpected(key, &e);
                None
            }
        }
    }

    fn log_unexpected(&self, key: &str, error: &CacheError) {
        tracing::error!(
            function = %self.name,
            key,
            error = %error,
            "Unexpected cache error, computing result directly"
        );
    }

    /// Call the wrapped function, answering from the cache when possible
    pub async fn call<A, Fut, R>(&self, args: A) -> R
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = R>,
        A: Serialize,
        R: Serialize + DeserializeOwned,
    {
        let cache = self.resolve_cache().await;
        if !cache.is_connected() {
            return (self.function)(args).await;
        }

        let key = match self.cache_key(&args, cache.hashkeys()) {
            Ok(key) => key,
            Err(e) => {
                tracing::error!(
                    function = %self.name,
                    error = %e,
                    "Arguments cannot be encoded, skipping cache"
                );
                return (self.function)(args).await;
            }
        };

        if let Some(cached) = self.lookup_cached::<R>(cache, &key).await {
            return cached;
        }

        let result = (self.function)(args).await;
        if let Err(e) = cache.store_with::<C, R>(&key, &result).await {
            tracing::warn!(
                function = %self.name,
                key = %key,
                error = %e,
                "Failed to cache computed result"
            );
        }
        result
    }
}

impl<F, C> std::fmt::Debug for Memoized<F, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoized")
            .field("name", &self.name)
            .field("lookup", &self.lookup)
            .field(
                "cache",
                &match &self.source {
                    CacheSource::Shared(cache) => Some(cache),
                    CacheSource::Lazy { cell, .. } => cell.get(),
                },
            )
            .finish()
    }
}
