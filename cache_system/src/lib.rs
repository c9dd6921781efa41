//! Cache system for bounded, namespaced Redis caching
//!
//! This crate provides [`BoundedCache`], a fixed-capacity TTL cache that
//! tracks its keys in a per-namespace set, and the [`memoize`] wrappers that
//! cache async function results by their arguments.

/// Debug logging that compiles away unless `debug-logging` is enabled
#[cfg(feature = "debug-logging")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

pub(crate) use debug_log;

pub mod bounded;
pub mod codec;
pub mod errors;
pub mod memoize;
pub mod namespace;
pub mod params;
pub mod prelude;
pub mod store;

// Re-export centralized config
pub use config::{CacheConfig, RedisConfig};

pub use bounded::{BoundedCache, ExpireSummary};
pub use codec::{BinaryCodec, Codec, JsonCodec};
pub use errors::CacheError;
pub use memoize::{Memoized, MemoizeOptions, cache_it, cache_it_json};
pub use namespace::Namespace;
pub use params::CacheParams;
pub use store::{KeyValueStore, MemoryStore, RedisConnect, RedisStore, StoreCommand, Ttl};
