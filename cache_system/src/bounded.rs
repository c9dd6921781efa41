//! Bounded namespaced cache
//!
//! [`BoundedCache`] keeps a per-namespace Key Set next to its entries. The set
//! bounds the number of resident keys (random eviction through `SPOP`) and
//! lets `get` tell a key that was never cached from one whose entry lapsed.

use crate::codec::{BinaryCodec, Codec, JsonCodec};
use crate::errors::CacheError;
use crate::namespace::Namespace;
use crate::params::CacheParams;
use crate::store::{KeyValueStore, RedisConnect, StoreCommand, Ttl};
use config::RedisConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;

/// Result of [`BoundedCache::expire_all_in_set`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpireSummary {
    /// Keys listed in the Key Set when the sweep started
    pub observed: usize,
    /// Keys whose entry was still present and got expired
    pub expired: usize,
}

/// Fixed-capacity, TTL-based cache over a [`KeyValueStore`]
///
/// A cache built while the store is unreachable stays in degraded mode for its
/// whole lifetime: reads report [`CacheError::Unavailable`], writes are
/// dropped and listings are empty. Build a new cache to reconnect.
#[derive(Clone)]
pub struct BoundedCache {
    store: Option<Arc<dyn KeyValueStore>>,
    params: Arc<CacheParams>,
}

impl Debug for BoundedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let connection_status = if self.store.is_some() {
            "connected"
        } else {
            "no_connection"
        };

        f.debug_struct("BoundedCache")
            .field("params", &self.params)
            .field("connected", &connection_status)
            .finish()
    }
}

impl BoundedCache {
    /// Connect to Redis, falling back to degraded mode if it cannot be reached
    pub async fn connect(params: CacheParams, redis: &RedisConfig) -> Self {
        match RedisConnect::new(redis).connect().await {
            Ok(store) => Self::with_store(params, Arc::new(store)),
            Err(e) => {
                tracing::warn!(
                    namespace = %params.namespace,
                    error = %e,
                    "Redis unreachable, cache running in degraded mode"
                );
                Self::disconnected(params)
            }
        }
    }

    pub fn with_store(params: CacheParams, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store: Some(store),
            params: Arc::new(params),
        }
    }

    /// Cache with no backing store
    pub fn disconnected(params: CacheParams) -> Self {
        Self {
            store: None,
            params: Arc::new(params),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.store.is_some()
    }

    pub fn params(&self) -> &CacheParams {
        &self.params
    }

    pub fn namespace(&self) -> &Namespace {
        &self.params.namespace
    }

    pub fn limit(&self) -> usize {
        self.params.limit
    }

    pub fn expire(&self) -> u64 {
        self.params.expire
    }

    pub fn hashkeys(&self) -> bool {
        self.params.hashkeys
    }

    /// Namespaced storage key for `key`
    pub fn make_key(&self, key: &str) -> String {
        self.params.namespace.entry_key(key)
    }

    /// Storage key of this cache's Key Set
    pub fn set_name(&self) -> String {
        self.params.namespace.set_name()
    }

    /// Store `value` with the default TTL
    pub async fn store(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.store_with_ttl(key, value, self.params.expire).await
    }

    /// Store `value`, evicting random members first while the cache is full
    pub async fn store_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<(), CacheError> {
        if ttl_secs == 0 {
            return Err(CacheError::InvalidTtl(ttl_secs));
        }
        if self.params.limit == 0 {
            return Err(CacheError::InvalidLimit(self.params.limit));
        }
        let Some(store) = &self.store else {
            crate::debug_log!("Degraded cache {}, dropping store of {}", self.namespace(), key);
            return Ok(());
        };
        let set_name = self.set_name();

        // Best effort: concurrent writers may evict more than strictly needed
        while store.scard(&set_name).await? >= self.params.limit {
            let Some(victim) = store.spop(&set_name).await? else {
                break;
            };
            store.del(&self.make_key(&victim)).await?;
            crate::debug_log!("Evicted {} from {}", victim, self.namespace());
        }

        store
            .pipeline(vec![
                StoreCommand::SetEx {
                    key: self.make_key(key),
                    value: value.to_string(),
                    ttl_secs,
                },
                StoreCommand::SAdd {
                    set: set_name,
                    member: key.to_string(),
                },
            ])
            .await
    }

    /// Fetch the raw stored text.
    ///
    /// Fails with [`CacheError::CacheMiss`] for keys that were never stored and
    /// with [`CacheError::ExpiredKey`] for listed keys whose entry is gone; the
    /// latter also drops the key from the Key Set.
    ///
    /// [`CacheError::Unavailable`] only means the cache was built without a
    /// store. A connection lost after construction surfaces as
    /// [`CacheError::ConnectionError`] instead.
    pub async fn get(&self, key: &str) -> Result<String, CacheError> {
        let Some(store) = &self.store else {
            return Err(CacheError::Unavailable);
        };

        if let Some(value) = store.get(&self.make_key(key)).await? {
            return Ok(value);
        }

        let set_name = self.set_name();
        if !store.sismember(&set_name, key).await? {
            return Err(CacheError::CacheMiss(key.to_string()));
        }

        store.srem(&set_name, key).await?;
        Err(CacheError::ExpiredKey(key.to_string()))
    }

    /// Encode `value` with codec `C` and store it
    pub async fn store_with<C, T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        C: Codec,
        T: Serialize + ?Sized,
    {
        let encoded = C::encode(value)?;
        self.store(key, &encoded).await
    }

    /// Fetch and decode a value stored with codec `C`
    pub async fn get_with<C, T>(&self, key: &str) -> Result<T, CacheError>
    where
        C: Codec,
        T: DeserializeOwned,
    {
        let text = self.get(key).await?;
        C::decode(&text)
    }

    pub async fn store_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        self.store_with::<JsonCodec, T>(key, value).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<T, CacheError> {
        self.get_with::<JsonCodec, T>(key).await
    }

    /// Store any serializable value in the binary encoding
    pub async fn store_encoded<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        self.store_with::<BinaryCodec, T>(key, value).await
    }

    pub async fn get_encoded<T: DeserializeOwned>(&self, key: &str) -> Result<T, CacheError> {
        self.get_with::<BinaryCodec, T>(key).await
    }

    /// Membership in the Key Set.
    ///
    /// A listed key may already have lost its entry; only `get` proves the
    /// value is retrievable.
    pub async fn contains(&self, key: &str) -> Result<bool, CacheError> {
        match &self.store {
            Some(store) => store.sismember(&self.set_name(), key).await,
            None => Ok(false),
        }
    }

    /// Raw members of the Key Set, in no particular order
    pub async fn keys(&self) -> Result<Vec<String>, CacheError> {
        match &self.store {
            Some(store) => store.smembers(&self.set_name()).await,
            None => Ok(Vec::new()),
        }
    }

    /// Namespaced keys from a fresh Key Set snapshot
    pub async fn namespaced_keys(&self) -> Result<std::vec::IntoIter<String>, CacheError> {
        let keys: Vec<String> = self
            .keys()
            .await?
            .iter()
            .map(|key| self.make_key(key))
            .collect();
        Ok(keys.into_iter())
    }

    /// Namespaced key at `index` of a fresh snapshot. Positions are not stable
    /// between calls.
    pub async fn key_at(&self, index: usize) -> Result<Option<String>, CacheError> {
        let keys = self.keys().await?;
        Ok(keys.get(index).map(|key| self.make_key(key)))
    }

    /// Number of keys in the Key Set
    pub async fn len(&self) -> Result<usize, CacheError> {
        match &self.store {
            Some(store) => store.scard(&self.set_name()).await,
            None => Ok(0),
        }
    }

    pub async fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len().await? == 0)
    }

    /// Remaining lifetime of the entry for `key`
    pub async fn ttl(&self, key: &str) -> Result<Ttl, CacheError> {
        match &self.store {
            Some(store) => store.pttl(&self.make_key(key)).await,
            None => Ok(Ttl::Missing),
        }
    }

    /// Expire every entry listed in the Key Set.
    ///
    /// Keys stay listed, so subsequent reads report [`CacheError::ExpiredKey`].
    /// Not atomic across keys.
    pub async fn expire_all_in_set(&self) -> Result<ExpireSummary, CacheError> {
        let Some(store) = &self.store else {
            return Ok(ExpireSummary::default());
        };

        let members = store.smembers(&self.set_name()).await?;
        let mut summary = ExpireSummary {
            observed: members.len(),
            expired: 0,
        };
        for member in &members {
            if store.expire(&self.make_key(member), 0).await? {
                summary.expired += 1;
            }
        }

        tracing::debug!(
            namespace = %self.namespace(),
            observed = summary.observed,
            expired = summary.expired,
            "Expired cache namespace"
        );
        Ok(summary)
    }

    /// Delete every entry and the Key Set in one batch
    pub async fn flush(&self) -> Result<(), CacheError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let set_name = self.set_name();

        let mut commands: Vec<StoreCommand> = store
            .smembers(&set_name)
            .await?
            .iter()
            .map(|member| StoreCommand::Del {
                key: self.make_key(member),
            })
            .collect();
        commands.push(StoreCommand::Del { key: set_name });

        store.pipeline(commands).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde::Deserialize;
    use std::collections::HashSet;

    fn cache_on(store: &Arc<MemoryStore>, params: CacheParams) -> BoundedCache {
        BoundedCache::with_store(params, store.clone())
    }

    fn cache(namespace: &str) -> BoundedCache {
        cache_on(&Arc::new(MemoryStore::new()), CacheParams::new(namespace))
    }

    #[tokio::test]
    async fn test_store_then_get() {
        let cache = cache("t");
        cache.store("greeting", "hello").await.unwrap();

        assert_eq!(cache.get("greeting").await.unwrap(), "hello");
        assert!(cache.contains("greeting").await.unwrap());
        assert_eq!(cache.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_restore_overwrites_without_growing() {
        let cache = cache("t");
        cache.store("k", "1").await.unwrap();
        cache.store("k", "2").await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), "2");
        assert_eq!(cache.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_never_stored_is_miss() {
        let cache = cache("t");
        let err = cache.get("nope").await.unwrap_err();
        assert!(matches!(err, CacheError::CacheMiss(ref k) if k == "nope"));
    }

    #[tokio::test]
    async fn test_expired_entry_is_reported_and_unlisted() {
        let cache = cache("t");
        cache.store("k", "v").await.unwrap();

        let summary = cache.expire_all_in_set().await.unwrap();
        assert_eq!(
            summary,
            ExpireSummary {
                observed: 1,
                expired: 1
            }
        );
        // still listed until observed
        assert!(cache.contains("k").await.unwrap());

        let err = cache.get("k").await.unwrap_err();
        assert!(matches!(err, CacheError::ExpiredKey(ref k) if k == "k"));
        assert!(!cache.contains("k").await.unwrap());

        let err = cache.get("k").await.unwrap_err();
        assert!(matches!(err, CacheError::CacheMiss(_)));
    }

    #[tokio::test]
    async fn test_zero_ttl_is_rejected() {
        let cache = cache("t");
        let err = cache.store_with_ttl("k", "v", 0).await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidTtl(0)));
        assert!(!cache.contains("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected() {
        let cache = BoundedCache::with_store(
            CacheParams::new("z").with_limit(0),
            Arc::new(MemoryStore::new()),
        );
        let err = cache.store("a", "v").await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidLimit(0)));
        assert_eq!(cache.len().await.unwrap(), 0);
        assert!(matches!(cache.get("a").await, Err(CacheError::CacheMiss(_))));
    }

    #[tokio::test]
    async fn test_out_of_range_ttl_leaves_no_listing() {
        let cache = cache("t");
        assert!(cache.store_with_ttl("k", "v", u64::MAX).await.is_err());
        assert!(!cache.contains("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_custom_ttl() {
        let cache = cache("t");
        cache.store_with_ttl("short", "v", 5).await.unwrap();
        cache.store("long", "v").await.unwrap();

        match cache.ttl("short").await.unwrap() {
            Ttl::Remaining(left) => assert!(left.as_secs() <= 5),
            other => panic!("unexpected ttl {:?}", other),
        }
        match cache.ttl("long").await.unwrap() {
            Ttl::Remaining(left) => assert!(left.as_secs() > 5),
            other => panic!("unexpected ttl {:?}", other),
        }
        assert_eq!(cache.ttl("absent").await.unwrap(), Ttl::Missing);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let store = Arc::new(MemoryStore::new());
        let left = cache_on(&store, CacheParams::new("left"));
        let right = cache_on(&store, CacheParams::new(2i64));

        left.store("shared", "from-left").await.unwrap();

        assert!(matches!(
            right.get("shared").await,
            Err(CacheError::CacheMiss(_))
        ));
        assert!(!right.contains("shared").await.unwrap());
        assert_eq!(right.len().await.unwrap(), 0);

        right.store("shared", "from-right").await.unwrap();
        right.flush().await.unwrap();
        assert_eq!(left.get("shared").await.unwrap(), "from-left");
    }

    #[tokio::test]
    async fn test_capacity_two_evicts_one_of_first_two() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache_on(&store, CacheParams::new("cap").with_limit(2));

        cache.store("a", "1").await.unwrap();
        cache.store("b", "2").await.unwrap();
        cache.store("c", "3").await.unwrap();

        assert_eq!(cache.len().await.unwrap(), 2);
        assert_eq!(cache.get("c").await.unwrap(), "3");

        let a = cache.get("a").await;
        let b = cache.get("b").await;
        let evicted = [&a, &b].iter().filter(|r| r.is_err()).count();
        assert_eq!(evicted, 1);
        for result in [a, b] {
            if let Err(e) = result {
                assert!(matches!(
                    e,
                    CacheError::CacheMiss(_) | CacheError::ExpiredKey(_)
                ));
            }
        }
    }

    #[tokio::test]
    async fn test_capacity_is_never_exceeded() {
        let cache = cache_on(
            &Arc::new(MemoryStore::new()),
            CacheParams::new("cap").with_limit(5),
        );

        for i in 0..50 {
            cache.store(&format!("k{}", i), "v").await.unwrap();
            assert!(cache.len().await.unwrap() <= 5);
        }
        assert_eq!(cache.len().await.unwrap(), 5);

        let mut retrievable = 0;
        for key in cache.keys().await.unwrap() {
            if cache.get(&key).await.is_ok() {
                retrievable += 1;
            }
        }
        assert_eq!(retrievable, 5);
    }

    #[tokio::test]
    async fn test_flush_empties_namespace() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache_on(&store, CacheParams::new("f"));
        for key in ["a", "b", "c"] {
            cache.store(key, key).await.unwrap();
        }

        cache.flush().await.unwrap();

        assert_eq!(cache.len().await.unwrap(), 0);
        assert!(cache.is_empty().await.unwrap());
        for key in ["a", "b", "c"] {
            assert!(matches!(cache.get(key).await, Err(CacheError::CacheMiss(_))));
            assert_eq!(store.get(&format!("f:{}", key)).await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn test_key_listing() {
        let cache = cache("list");
        cache.store("a", "1").await.unwrap();
        cache.store("b", "2").await.unwrap();

        let listed: HashSet<String> = cache.namespaced_keys().await.unwrap().collect();
        let expected: HashSet<String> = ["list:a", "list:b"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(listed, expected);

        // re-querying sees new members
        cache.store("c", "3").await.unwrap();
        assert_eq!(cache.namespaced_keys().await.unwrap().count(), 3);

        let first = cache.key_at(0).await.unwrap().unwrap();
        assert!(first.starts_with("list:"));
        assert_eq!(cache.key_at(3).await.unwrap(), None);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        id: u64,
        name: String,
        scores: Vec<i32>,
    }

    #[tokio::test]
    async fn test_json_and_binary_round_trips() {
        let cache = cache("codec");
        let profile = Profile {
            id: 7,
            name: "Ada".to_string(),
            scores: vec![3, -1, 12],
        };

        cache.store_json("json", &profile).await.unwrap();
        cache.store_encoded("bin", &profile).await.unwrap();

        assert_eq!(
            cache.get("json").await.unwrap(),
            r#"{"id":7,"name":"Ada","scores":[3,-1,12]}"#
        );
        assert_eq!(cache.get_json::<Profile>("json").await.unwrap(), profile);
        assert_eq!(cache.get_encoded::<Profile>("bin").await.unwrap(), profile);
    }

    #[tokio::test]
    async fn test_degraded_cache_is_inert() {
        let cache = BoundedCache::disconnected(CacheParams::new("down"));
        assert!(!cache.is_connected());

        cache.store("k", "v").await.unwrap();
        cache.store_json("j", &[1, 2]).await.unwrap();
        assert!(matches!(cache.get("k").await, Err(CacheError::Unavailable)));
        assert!(!cache.contains("k").await.unwrap());
        assert_eq!(cache.len().await.unwrap(), 0);
        assert_eq!(cache.namespaced_keys().await.unwrap().count(), 0);
        assert_eq!(cache.key_at(0).await.unwrap(), None);
        assert_eq!(
            cache.expire_all_in_set().await.unwrap(),
            ExpireSummary::default()
        );
        cache.flush().await.unwrap();
    }

    #[test]
    fn test_debug_shows_connection_status() {
        let cache = BoundedCache::disconnected(CacheParams::new("dbg"));
        let rendered = format!("{:?}", cache);
        assert!(rendered.contains("no_connection"));
    }
}
