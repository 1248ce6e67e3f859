//! Durable key-value storage for agent state.
//!
//! The contract mirrors the browser-extension storage the ledger's clients
//! historically used: individual `set` calls are crash-consistent, but
//! nothing is transactional across keys. Higher layers are written to
//! tolerate that.

use std::future::Future;
use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::error::StoreError;

pub trait KeyValueStore {
    /// Reads one key, `None` when absent.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>, StoreError>>;

    /// Writes one key. A completed `set` survives process restart.
    fn set(&self, key: &str, value: Value) -> impl Future<Output = Result<(), StoreError>>;

    /// Removes one key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>>;
}

/// File-backed store holding all keys in a single JSON object.
///
/// Writes go through a temp file followed by a rename so a crash mid-write
/// leaves the previous state intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<Map<String, Value>, StoreError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn persist(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        let tmp_path = self.path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(map)?;
        std::fs::write(&tmp_path, contents)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>, StoreError>> {
        let result = self.load().map(|map| map.get(key).cloned());
        async move { result }
    }

    fn set(&self, key: &str, value: Value) -> impl Future<Output = Result<(), StoreError>> {
        let result = self.load().and_then(|mut map| {
            map.insert(key.to_string(), value);
            self.persist(&map)
        });
        async move { result }
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> {
        let result = self.load().and_then(|mut map| {
            if map.remove(key).is_some() {
                self.persist(&map)
            } else {
                Ok(())
            }
        });
        async move { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");

        let store = JsonFileStore::new(&path);
        store
            .set("employee", json!({"employee_code": "AIP001"}))
            .await
            .expect("set");
        drop(store);

        // A fresh handle sees the completed write.
        let reopened = JsonFileStore::new(&path);
        let value = reopened.get("employee").await.expect("get");
        assert_eq!(value, Some(json!({"employee_code": "AIP001"})));
    }

    #[tokio::test]
    async fn test_remove_and_missing_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("state.json"));

        assert_eq!(store.get("absent").await.expect("get"), None);
        store.remove("absent").await.expect("removing absent key is fine");

        store.set("k", json!(1)).await.expect("set");
        store.remove("k").await.expect("remove");
        assert_eq!(store.get("k").await.expect("get"), None);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("state.json"));

        store.set("a", json!("one")).await.expect("set a");
        store.set("b", json!("two")).await.expect("set b");
        store.remove("a").await.expect("remove a");

        assert_eq!(store.get("a").await.expect("get"), None);
        assert_eq!(store.get("b").await.expect("get"), Some(json!("two")));
    }
}
