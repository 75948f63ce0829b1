//! Persistent store collaborator.
//!
//! The engine treats persistence as a generic asynchronous key-value store;
//! the real transport (extension storage, disk, ...) lives behind the
//! [`KeyValueStore`] trait and is injected where needed.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Logical keys the engine persists.
pub mod keys {
    /// List of imported sources
    pub const SOURCES: &str = "filter_sources";
    /// Merged block/exception policy
    pub const MERGED_POLICY: &str = "merged_policy";
    /// Active filter mode (disabled|whitelist|blacklist)
    pub const FILTER_MODE: &str = "filter_mode";
    /// Time-bounded policy snapshot for the fast read path
    pub const FILTER_CACHE: &str = "filter_cache";
    /// Whether the rule-based (uBlock) filter format is active
    pub const RULE_FORMAT: &str = "rule_format_enabled";
}

/// Asynchronous key-value store interface.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the requested keys. Missing keys are simply absent from the map.
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>>;

    /// Write all entries as one logical operation.
    async fn set(&self, entries: HashMap<String, Value>) -> Result<()>;
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents, for assertions in tests.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let entries = self.entries.lock();
        Ok(keys
            .iter()
            .filter_map(|key| entries.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, new_entries: HashMap<String, Value>) -> Result<()> {
        let mut entries = self.entries.lock();
        entries.extend(new_entries);
        Ok(())
    }
}

/// Decode one key from a store read. Missing keys and explicit nulls both
/// read as `None`.
pub fn decode<T: DeserializeOwned>(map: &HashMap<String, Value>, key: &str) -> Result<Option<T>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
    }
}

/// Encode a value for a store write.
pub fn encode<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FilterMode;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        let mut entries = HashMap::new();
        entries.insert(keys::FILTER_MODE.to_string(), encode(&FilterMode::Whitelist).unwrap());
        store.set(entries).await.unwrap();

        let read = store.get(&[keys::FILTER_MODE, keys::SOURCES]).await.unwrap();
        let mode: Option<FilterMode> = decode(&read, keys::FILTER_MODE).unwrap();
        assert_eq!(mode, Some(FilterMode::Whitelist));

        let sources: Option<Vec<crate::types::Source>> = decode(&read, keys::SOURCES).unwrap();
        assert!(sources.is_none());
    }

    #[tokio::test]
    async fn test_memory_store_set_overwrites_only_given_keys() {
        let store = MemoryStore::new();
        store
            .set(HashMap::from([
                ("a".to_string(), Value::from(1)),
                ("b".to_string(), Value::from(2)),
            ]))
            .await
            .unwrap();
        store
            .set(HashMap::from([("a".to_string(), Value::from(3))]))
            .await
            .unwrap();

        let read = store.get(&["a", "b"]).await.unwrap();
        assert_eq!(read.get("a"), Some(&Value::from(3)));
        assert_eq!(read.get("b"), Some(&Value::from(2)));
    }

    #[test]
    fn test_decode_null_reads_as_absent() {
        let map = HashMap::from([("k".to_string(), Value::Null)]);
        let out: Option<FilterMode> = decode(&map, "k").unwrap();
        assert!(out.is_none());
    }
}
