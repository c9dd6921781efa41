//! In-process store
//!
//! Follows Redis semantics closely enough for a [`crate::BoundedCache`] to
//! behave identically on top of it: expiring strings, unordered sets, random
//! pop, and batches applied under a single lock.

use crate::errors::CacheError;
use crate::store::{KeyValueStore, StoreCommand, Ttl};
use async_trait::async_trait;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StringEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl StringEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Absolute expiry for a TTL, rejecting values the clock cannot represent
fn deadline(ttl_secs: u64, command: &str) -> Result<Instant, CacheError> {
    Instant::now()
        .checked_add(Duration::from_secs(ttl_secs))
        .ok_or_else(|| {
            CacheError::General(format!("invalid expire time in '{}' command", command))
        })
}

#[derive(Debug, Default)]
struct State {
    strings: HashMap<String, StringEntry>,
    sets: HashMap<String, HashSet<String>>,
}

impl State {
    /// Drop the string at `key` if it has lapsed, returning the live entry
    fn live_string(&mut self, key: &str) -> Option<&StringEntry> {
        let now = Instant::now();
        if self.strings.get(key).is_some_and(|e| e.is_expired(now)) {
            self.strings.remove(key);
        }
        self.strings.get(key)
    }

    fn set_ex(&mut self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        if ttl_secs == 0 {
            return Err(CacheError::General(
                "invalid expire time in 'setex' command".to_string(),
            ));
        }
        let expires_at = deadline(ttl_secs, "setex")?;
        self.sets.remove(key);
        self.strings.insert(
            key.to_string(),
            StringEntry {
                value: value.to_string(),
                expires_at: Some(expires_at),
            },
        );
        Ok(())
    }

    fn del(&mut self, key: &str) -> bool {
        let string = self.live_string(key).is_some();
        self.strings.remove(key);
        let set = self.sets.remove(key).is_some();
        string || set
    }

    fn sadd(&mut self, set: &str, member: &str) -> bool {
        self.strings.remove(set);
        self.sets
            .entry(set.to_string())
            .or_default()
            .insert(member.to_string())
    }

    fn srem(&mut self, set: &str, member: &str) -> bool {
        let Some(members) = self.sets.get_mut(set) else {
            return false;
        };
        let removed = members.remove(member);
        // Redis drops empty sets
        if members.is_empty() {
            self.sets.remove(set);
        }
        removed
    }

    fn apply(&mut self, command: &StoreCommand) -> Result<(), CacheError> {
        match command {
            StoreCommand::SetEx {
                key,
                value,
                ttl_secs,
            } => self.set_ex(key, value, *ttl_secs)?,
            StoreCommand::SAdd { set, member } => {
                self.sadd(set, member);
            }
            StoreCommand::SRem { set, member } => {
                self.srem(set, member);
            }
            StoreCommand::Del { key } => {
                self.del(key);
            }
        }
        Ok(())
    }
}

/// [`KeyValueStore`] kept entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        self.state.write().await.set_ex(key, value, ttl_secs)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut state = self.state.write().await;
        Ok(state.live_string(key).map(|e| e.value.clone()))
    }

    async fn del(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.state.write().await.del(key))
    }

    async fn pttl(&self, key: &str) -> Result<Ttl, CacheError> {
        let mut state = self.state.write().await;
        if state.sets.contains_key(key) {
            return Ok(Ttl::Persistent);
        }
        let ttl = match state.live_string(key) {
            None => Ttl::Missing,
            Some(StringEntry {
                expires_at: None, ..
            }) => Ttl::Persistent,
            Some(StringEntry {
                expires_at: Some(at),
                ..
            }) => Ttl::Remaining(at.saturating_duration_since(Instant::now())),
        };
        Ok(ttl)
    }

    async fn expire(&self, key: &str, ttl_secs: i64) -> Result<bool, CacheError> {
        let mut state = self.state.write().await;
        if ttl_secs <= 0 {
            return Ok(state.del(key));
        }
        let expires_at = deadline(ttl_secs as u64, "expire")?;
        if state.live_string(key).is_none() {
            return Ok(false);
        }
        if let Some(entry) = state.strings.get_mut(key) {
            entry.expires_at = Some(expires_at);
        }
        Ok(true)
    }

    async fn sadd(&self, set: &str, member: &str) -> Result<bool, CacheError> {
        Ok(self.state.write().await.sadd(set, member))
    }

    async fn srem(&self, set: &str, member: &str) -> Result<bool, CacheError> {
        Ok(self.state.write().await.srem(set, member))
    }

    async fn scard(&self, set: &str) -> Result<usize, CacheError> {
        let state = self.state.read().await;
        Ok(state.sets.get(set).map_or(0, HashSet::len))
    }

    async fn sismember(&self, set: &str, member: &str) -> Result<bool, CacheError> {
        let state = self.state.read().await;
        Ok(state.sets.get(set).is_some_and(|m| m.contains(member)))
    }

    async fn smembers(&self, set: &str) -> Result<Vec<String>, CacheError> {
        let state = self.state.read().await;
        Ok(state
            .sets
            .get(set)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn spop(&self, set: &str) -> Result<Option<String>, CacheError> {
        let mut state = self.state.write().await;
        let member = match state.sets.get(set) {
            Some(members) if !members.is_empty() => {
                let index = rand::rng().random_range(0..members.len());
                members.iter().nth(index).cloned()
            }
            _ => None,
        };
        if let Some(member) = &member {
            state.srem(set, member);
        }
        Ok(member)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    async fn pipeline(&self, commands: Vec<StoreCommand>) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        for command in &commands {
            state.apply(command)?;
        }
        Ok(())
    }
}
