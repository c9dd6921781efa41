//! Redis-backed store
//!
//! [`RedisConnect`] turns host/port/db settings into a live [`RedisStore`],
//! refusing to hand out a handle that cannot answer `PING`.

use crate::errors::CacheError;
use crate::store::{KeyValueStore, StoreCommand, Ttl};
use async_trait::async_trait;
use config::RedisConfig;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use std::fmt::Debug;

/// Connection settings for one Redis database
#[derive(Debug, Clone, Default)]
pub struct RedisConnect {
    config: RedisConfig,
}

impl RedisConnect {
    pub fn new(config: &RedisConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    fn no_connection(&self, reason: impl ToString) -> CacheError {
        CacheError::NoConnection {
            host: self.config.host.clone(),
            port: self.config.port,
            reason: reason.to_string(),
        }
    }

    /// Open a connection and verify it with `PING`.
    ///
    /// Any failure, including the connection timeout elapsing, is reported as
    /// [`CacheError::NoConnection`].
    pub async fn connect(&self) -> Result<RedisStore, CacheError> {
        let client =
            Client::open(self.config.connection_url()).map_err(|e| self.no_connection(e))?;

        let attempt = async {
            let store = RedisStore::from_connection(
                client.get_multiplexed_async_connection().await?,
            );
            store.ping().await?;
            Ok::<_, CacheError>(store)
        };

        let timeout = self.config.connection_timeout();
        match tokio::time::timeout(timeout, attempt).await {
            Ok(Ok(store)) => Ok(store),
            Ok(Err(e)) => Err(self.no_connection(e)),
            Err(_) => Err(self.no_connection(format!(
                "timed out after {}ms",
                timeout.as_millis()
            ))),
        }
    }
}

/// [`KeyValueStore`] over a multiplexed Redis connection
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    pub fn from_connection(connection: MultiplexedConnection) -> Self {
        Self { connection }
    }

    // Multiplexed connections are cheap handles onto one socket
    fn conn(&self) -> MultiplexedConnection {
        self.connection.clone()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        let _: () = self.conn().set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.conn().get(key).await?)
    }

    async fn del(&self, key: &str) -> Result<bool, CacheError> {
        let deleted: i64 = self.conn().del(key).await?;
        Ok(deleted > 0)
    }

    async fn pttl(&self, key: &str) -> Result<Ttl, CacheError> {
        let reply: i64 = self.conn().pttl(key).await?;
        Ok(Ttl::from_pttl(reply))
    }

    async fn expire(&self, key: &str, ttl_secs: i64) -> Result<bool, CacheError> {
        Ok(self.conn().expire(key, ttl_secs).await?)
    }

    async fn sadd(&self, set: &str, member: &str) -> Result<bool, CacheError> {
        let added: i64 = self.conn().sadd(set, member).await?;
        Ok(added > 0)
    }

    async fn srem(&self, set: &str, member: &str) -> Result<bool, CacheError> {
        let removed: i64 = self.conn().srem(set, member).await?;
        Ok(removed > 0)
    }

    async fn scard(&self, set: &str) -> Result<usize, CacheError> {
        Ok(self.conn().scard(set).await?)
    }

    async fn sismember(&self, set: &str, member: &str) -> Result<bool, CacheError> {
        Ok(self.conn().sismember(set, member).await?)
    }

    async fn smembers(&self, set: &str) -> Result<Vec<String>, CacheError> {
        Ok(self.conn().smembers(set).await?)
    }

    async fn spop(&self, set: &str) -> Result<Option<String>, CacheError> {
        Ok(self.conn().spop(set).await?)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn();
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn pipeline(&self, commands: Vec<StoreCommand>) -> Result<(), CacheError> {
        if commands.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in &commands {
            match command {
                StoreCommand::SetEx {
                    key,
                    value,
                    ttl_secs,
                } => pipe.set_ex(key, value, *ttl_secs).ignore(),
                StoreCommand::SAdd { set, member } => pipe.sadd(set, member).ignore(),
                StoreCommand::SRem { set, member } => pipe.srem(set, member).ignore(),
                StoreCommand::Del { key } => pipe.del(key).ignore(),
            };
        }

        let mut conn = self.conn();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }
}
