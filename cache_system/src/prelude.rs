//! Convenience re-exports for common cache-system usage

// Core cache system components
pub use crate::bounded::{BoundedCache, ExpireSummary};
pub use crate::codec::{BinaryCodec, Codec, JsonCodec};
pub use crate::errors::CacheError;
pub use crate::memoize::{Lookup, Memoized, MemoizeOptions, cache_it, cache_it_json};
pub use crate::namespace::Namespace;
pub use crate::params::CacheParams;
pub use crate::store::{KeyValueStore, MemoryStore, RedisConnect, RedisStore, StoreCommand, Ttl};

// Re-export centralized config
pub use config::{CacheConfig, RedisConfig};

// Common external dependencies
pub use async_trait::async_trait;
pub use redis;
pub use serde::{Deserialize, Serialize};
pub use serde_json;
pub use tokio;
