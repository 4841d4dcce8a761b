//! Shared handle over the substrate.
//!
//! [`DataStore`] bundles the substrate, the configuration and a registry of
//! per-key write locks. It is cheap to clone; every clone talks to the same
//! substrate and the same locks, so two collections opened for the same
//! entity type serialize their writes against each other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::collection::EntityCollection;
use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::substrate::KeyValueStore;

#[derive(Default)]
struct LockRegistry {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(key.to_string()).or_default())
    }
}

#[derive(Clone)]
pub struct DataStore {
    substrate: Arc<dyn KeyValueStore>,
    config: Arc<StoreConfig>,
    locks: Arc<LockRegistry>,
}

impl DataStore {
    pub fn new(substrate: Arc<dyn KeyValueStore>, config: StoreConfig) -> Self {
        Self {
            substrate,
            config: Arc::new(config),
            locks: Arc::new(LockRegistry::default()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn substrate(&self) -> &dyn KeyValueStore {
        self.substrate.as_ref()
    }

    /// Collection handle for `entity`, e.g. `Course` or `Submission`.
    pub fn entity(&self, entity: &str) -> EntityCollection {
        EntityCollection::new(self.clone(), entity)
    }

    /// Waits out the configured artificial latency.
    pub fn simulate_latency(&self) {
        if self.config.simulated_latency_ms > 0 {
            std::thread::sleep(Duration::from_millis(self.config.simulated_latency_ms));
        }
    }

    /// Write lock for `key`. Hold it across the whole read-modify-write.
    pub fn write_lock(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks.lock_for(key)
    }

    /// Reads and deserializes the JSON value under `key`.
    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.substrate.get_item(key)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Serializes `value` and writes it under `key`.
    pub fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let text = serde_json::to_string(value)?;
        self.substrate.set_item(key, &text)
    }

    pub fn remove(&self, key: &str) -> StoreResult<()> {
        self.substrate.remove_item(key)
    }

    pub fn contains(&self, key: &str) -> StoreResult<bool> {
        self.substrate.contains_key(key)
    }

    pub fn flush(&self) -> StoreResult<()> {
        self.substrate.flush()
    }
}
