//! # CacheHaus
//!
//! Bounded, namespaced caching of serializable values on top of Redis, plus
//! memoization of async functions keyed by their arguments.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cachehaus::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let haus = CacheHaus::new(AppConfig::default())?;
//!
//!     // Falls back to degraded mode when Redis is down
//!     let cache = haus.open_cache("reports").await;
//!     cache.store_json("daily", &vec![1, 2, 3]).await?;
//!     let daily: Vec<u32> = cache.get_json("daily").await?;
//!     println!("daily = {:?}", daily);
//!
//!     let slow_sum = cache_it(
//!         "slow_sum",
//!         |(a, b): (u64, u64)| async move { a + b },
//!         MemoizeOptions::shared(cache.clone()),
//!     );
//!     assert_eq!(slow_sum.call((40, 2)).await, 42);
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use crate::core::CacheHaus;
pub use crate::errors::CacheHausError;

// Re-export centralized config
pub use config::{AppConfig, CacheConfig, RedisConfig};

// Re-export internal crates used by the public API
pub use cache_system;
pub use config;

// Re-export external dependencies used in public API
pub use async_trait;
