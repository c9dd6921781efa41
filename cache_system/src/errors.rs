//! Error types for cache operations
//!
//! This module defines all error types that can occur
//! during cache operations and Redis interactions.

use thiserror::Error;

/// Cache system errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key was never stored, or has been forgotten including its Key Set entry
    #[error("Cache miss: {0}")]
    CacheMiss(String),

    /// Key is still listed in the Key Set but its entry has lapsed
    #[error("Expired key: {0}")]
    ExpiredKey(String),

    /// Read against a cache constructed without a reachable store
    #[error("Cache is unavailable")]
    Unavailable,

    #[error("Failed to create connection to redis at {host}:{port}: {reason}")]
    NoConnection {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Redis connection error: {0}")]
    ConnectionError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Binary encode error: {0}")]
    EncodeError(#[from] rmp_serde::encode::Error),

    #[error("Binary decode error: {0}")]
    DecodeError(#[from] rmp_serde::decode::Error),

    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("Invalid TTL value: {0}")]
    InvalidTtl(u64),

    /// A cache that may hold no keys cannot accept writes
    #[error("Invalid cache limit: {0}")]
    InvalidLimit(usize),

    #[error("General cache error: {0}")]
    General(String),
}

impl CacheError {
    /// Whether the caller should simply recompute the value.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CacheError::CacheMiss(_) | CacheError::ExpiredKey(_) | CacheError::Unavailable
        )
    }
}
