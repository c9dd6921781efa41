//! Key-value store abstraction
//!
//! [`KeyValueStore`] is the full set of primitives a bounded cache needs from
//! its backend. Redis provides them natively; [`MemoryStore`] mirrors the same
//! semantics in-process.

use crate::errors::CacheError;
use async_trait::async_trait;
use std::time::Duration;

pub mod memory;
pub mod redis_store;

pub use self::memory::MemoryStore;
pub use self::redis_store::{RedisConnect, RedisStore};

/// Remaining lifetime of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Key does not exist
    Missing,
    /// Key exists without an expiry
    Persistent,
    Remaining(Duration),
}

impl Ttl {
    /// Decode a Redis `PTTL` reply
    pub fn from_pttl(reply: i64) -> Self {
        match reply {
            -2 => Ttl::Missing,
            ms if ms < 0 => Ttl::Persistent,
            ms => Ttl::Remaining(Duration::from_millis(ms as u64)),
        }
    }
}

/// One command inside a pipelined batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCommand {
    SetEx {
        key: String,
        value: String,
        ttl_secs: u64,
    },
    SAdd {
        set: String,
        member: String,
    },
    SRem {
        set: String,
        member: String,
    },
    Del {
        key: String,
    },
}

/// Backend primitives used by [`crate::BoundedCache`]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError>;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Returns whether the key existed
    async fn del(&self, key: &str) -> Result<bool, CacheError>;

    async fn pttl(&self, key: &str) -> Result<Ttl, CacheError>;

    /// Set a key's TTL; zero removes it immediately. Returns whether the key existed.
    async fn expire(&self, key: &str, ttl_secs: i64) -> Result<bool, CacheError>;

    /// Returns whether the member was newly added
    async fn sadd(&self, set: &str, member: &str) -> Result<bool, CacheError>;

    /// Returns whether the member was present
    async fn srem(&self, set: &str, member: &str) -> Result<bool, CacheError>;

    async fn scard(&self, set: &str) -> Result<usize, CacheError>;

    async fn sismember(&self, set: &str, member: &str) -> Result<bool, CacheError>;

    async fn smembers(&self, set: &str) -> Result<Vec<String>, CacheError>;

    /// Remove and return an arbitrary member
    async fn spop(&self, set: &str) -> Result<Option<String>, CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;

    /// Dispatch all commands as one batch
    async fn pipeline(&self, commands: Vec<StoreCommand>) -> Result<(), CacheError>;
}
