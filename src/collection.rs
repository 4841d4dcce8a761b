//! Per-entity-type CRUD and query engine.
//!
//! A collection is one JSON array stored under `key_prefix + entity`. Every
//! operation reads the whole array; writes mutate it in memory and persist
//! it back while holding the collection's write lock. An absent key is an
//! empty collection.
//!
//! The store enforces no referential integrity. Denormalized copies (such as
//! a `course_title` on a submission) are the caller's to keep in sync.

use log::debug;

use crate::error::{StoreError, StoreResult};
use crate::query::{matches, sort_and_limit};
use crate::record::{merge_patch, record_id, stamp_new, Record};
use crate::store::DataStore;

#[derive(Clone)]
pub struct EntityCollection {
    store: DataStore,
    entity: String,
    key: String,
}

impl EntityCollection {
    pub fn new(store: DataStore, entity: &str) -> Self {
        let key = store.config().collection_key(entity);
        Self {
            store,
            entity: entity.to_string(),
            key,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Substrate key this collection is persisted under.
    pub fn key(&self) -> &str {
        &self.key
    }

    fn load(&self) -> StoreResult<Vec<Record>> {
        Ok(self.store.read_json(&self.key)?.unwrap_or_default())
    }

    fn save(&self, records: &[Record]) -> StoreResult<()> {
        self.store.write_json(&self.key, records)
    }

    /// Every record, sorted by `sort` (`field` or `-field`) and truncated to `limit`.
    pub fn list(&self, sort: Option<&str>, limit: Option<usize>) -> StoreResult<Vec<Record>> {
        self.store.simulate_latency();
        let mut records = self.load()?;
        sort_and_limit(&mut records, sort, limit);
        Ok(records)
    }

    /// Records whose fields equal every entry of `predicate`.
    pub fn filter(
        &self,
        predicate: &Record,
        sort: Option<&str>,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Record>> {
        self.store.simulate_latency();
        let mut records = self.load()?;
        records.retain(|record| matches(record, predicate));
        sort_and_limit(&mut records, sort, limit);
        Ok(records)
    }

    pub fn get(&self, id: &str) -> StoreResult<Option<Record>> {
        self.store.simulate_latency();
        Ok(self
            .load()?
            .into_iter()
            .find(|record| record_id(record) == Some(id)))
    }

    pub fn count(&self) -> StoreResult<usize> {
        self.store.simulate_latency();
        Ok(self.load()?.len())
    }

    /// Appends `fields` with a fresh `id` and `created_date`.
    pub fn create(&self, fields: Record) -> StoreResult<Record> {
        self.store.simulate_latency();
        let lock = self.store.write_lock(&self.key);
        let _guard = lock.lock();

        let mut records = self.load()?;
        let record = stamp_new(fields);
        records.push(record.clone());
        self.save(&records)?;
        debug!("Created {} record {:?}", self.entity, record_id(&record));
        Ok(record)
    }

    /// Creates every item in one write, preserving order.
    pub fn bulk_create(&self, items: Vec<Record>) -> StoreResult<Vec<Record>> {
        self.store.simulate_latency();
        let lock = self.store.write_lock(&self.key);
        let _guard = lock.lock();

        let mut records = self.load()?;
        let created: Vec<Record> = items.into_iter().map(stamp_new).collect();
        records.extend(created.iter().cloned());
        self.save(&records)?;
        debug!("Created {} {} records", created.len(), self.entity);
        Ok(created)
    }

    /// Shallow-merges `patch` into the record with `id` and returns the result.
    pub fn update(&self, id: &str, patch: &Record) -> StoreResult<Record> {
        self.store.simulate_latency();
        let lock = self.store.write_lock(&self.key);
        let _guard = lock.lock();

        let mut records = self.load()?;
        let record = records
            .iter_mut()
            .find(|record| record_id(record) == Some(id))
            .ok_or_else(|| StoreError::NotFound {
                entity: self.entity.clone(),
                id: id.to_string(),
            })?;
        merge_patch(record, patch);
        let updated = record.clone();
        self.save(&records)?;
        Ok(updated)
    }

    /// Removes the record with `id`. Returns whether one was removed; an
    /// absent id is not an error.
    pub fn delete(&self, id: &str) -> StoreResult<bool> {
        self.store.simulate_latency();
        let lock = self.store.write_lock(&self.key);
        let _guard = lock.lock();

        let mut records = self.load()?;
        let before = records.len();
        records.retain(|record| record_id(record) != Some(id));
        let removed = records.len() != before;
        if removed {
            self.save(&records)?;
        }
        Ok(removed)
    }
}
