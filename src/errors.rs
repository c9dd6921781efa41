//! Error types for the CacheHaus crate
//!
//! This module contains all error types that can be returned by CacheHaus operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheHausError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] cache_system::CacheError),

    #[error("Cache not found: {0}")]
    CacheNotFound(String),

    #[error("Cache already registered: {0}")]
    CacheAlreadyRegistered(String),
}
