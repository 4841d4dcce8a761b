//! Key-value substrate contract.
//!
//! Both the entity store and the session service persist through a
//! [`KeyValueStore`]: a string-keyed, string-valued map with whole-value
//! reads and writes. There is no partial update at this level; callers read
//! a value, change it in memory and write it back.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::StoreResult;

/// Persistent string-keyed store shared by every component.
///
/// Implementations must make each individual `set_item` atomic: a concurrent
/// reader sees either the old or the new value, never a mix.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value under `key`. `Ok(None)` if the key is absent.
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removes `key`. Removing an absent key succeeds.
    fn remove_item(&self, key: &str) -> StoreResult<()>;

    /// Removes every key.
    fn clear(&self) -> StoreResult<()>;

    /// Forces pending writes to durable storage.
    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }

    fn contains_key(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get_item(key)?.is_some())
    }
}

/// In-memory substrate for tests and embedding. Nothing survives a drop.
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.items.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        self.items.write().clear();
        Ok(())
    }
}
