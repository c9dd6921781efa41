//! Cache namespaces
//!
//! Every entry key and the Key Set of a cache live under one namespace, so
//! caches sharing a Redis database never see each other's data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Isolation scope of one cache instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Namespace {
    Name(String),
    Id(i64),
}

impl Namespace {
    /// Fresh namespace for callers that have no stable identity to offer.
    pub fn generate() -> Self {
        Namespace::Name(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Storage key of the entry for `key`
    pub fn entry_key(&self, key: &str) -> String {
        format!("{}:{}", self, key)
    }

    /// Storage key of the Key Set
    pub fn set_name(&self) -> String {
        format!("{}-keys", self)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Name(name) => f.write_str(name),
            Namespace::Id(id) => write!(f, "{}", id),
        }
    }
}

impl From<&str> for Namespace {
    fn from(name: &str) -> Self {
        Namespace::Name(name.to_string())
    }
}

impl From<String> for Namespace {
    fn from(name: String) -> Self {
        Namespace::Name(name)
    }
}

impl From<i64> for Namespace {
    fn from(id: i64) -> Self {
        Namespace::Id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let ns = Namespace::from("reports");
        assert_eq!(ns.entry_key("daily"), "reports:daily");
        assert_eq!(ns.set_name(), "reports-keys");

        let ns = Namespace::from(42i64);
        assert_eq!(ns.entry_key("daily"), "42:daily");
        assert_eq!(ns.set_name(), "42-keys");
    }

    #[test]
    fn test_generated_namespaces_differ() {
        assert_ne!(Namespace::generate(), Namespace::generate());
    }
}
