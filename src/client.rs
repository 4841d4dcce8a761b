//! The client object the UI holds.

use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::auth::AuthService;
use crate::collection::EntityCollection;
use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::lmdb_store::LmdbStore;
use crate::seed::seed_if_empty;
use crate::store::DataStore;
use crate::substrate::{KeyValueStore, MemoryStore};

/// Entry point: `client.entities("Course")` for domain data, `client.auth()`
/// for identity.
#[derive(Clone)]
pub struct VignanClient {
    store: DataStore,
    auth: AuthService,
}

impl VignanClient {
    /// Builds a client over any substrate and seeds it if configured to.
    pub fn with_substrate(substrate: Arc<dyn KeyValueStore>, config: StoreConfig) -> StoreResult<Self> {
        let seed = config.seed_demo_data;
        let store = DataStore::new(substrate, config);
        if seed && seed_if_empty(&store)? {
            store.flush()?;
        }
        Ok(Self {
            auth: AuthService::new(store.clone()),
            store,
        })
    }

    /// Opens the persistent LMDB substrate at `{name}.lmdb`.
    pub fn open(name: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        let substrate = LmdbStore::init_with_map_size(name, config.map_size)?;
        info!("Client opened over {}", substrate.path().display());
        Self::with_substrate(Arc::new(substrate), config)
    }

    /// Client over a fresh in-memory substrate.
    pub fn in_memory(config: StoreConfig) -> StoreResult<Self> {
        Self::with_substrate(Arc::new(MemoryStore::new()), config)
    }

    pub fn entities(&self, entity: &str) -> EntityCollection {
        self.store.entity(entity)
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    /// Flushes pending writes to durable storage.
    pub fn flush(&self) -> StoreResult<()> {
        self.store.flush()
    }
}
