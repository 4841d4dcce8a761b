//! LMDB-backed substrate.
//!
//! The environment lives in a `{name}.lmdb` directory and holds a single
//! named database. Each `set_item`/`remove_item` runs in its own write
//! transaction, so every individual write is atomic and durable once the
//! call returns.

use std::path::{Path, PathBuf};

use lmdb::{Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{debug, info, warn};

use crate::config::DEFAULT_MAP_SIZE;
use crate::error::{StoreError, StoreResult};
use crate::substrate::KeyValueStore;

const DB_NAME: &str = "vignan_kv";

pub struct LmdbStore {
    env: Environment,
    db: Database,
    path: PathBuf,
}

impl LmdbStore {
    /// Opens (or creates) the environment at `{name}.lmdb` with the default map size.
    pub fn init(name: impl AsRef<Path>) -> StoreResult<Self> {
        Self::init_with_map_size(name, DEFAULT_MAP_SIZE)
    }

    pub fn init_with_map_size(name: impl AsRef<Path>, map_size: usize) -> StoreResult<Self> {
        let mut dir = name.as_ref().as_os_str().to_owned();
        dir.push(".lmdb");
        let path = PathBuf::from(dir);

        if path.exists() {
            info!("Opening existing substrate at {}", path.display());
        } else {
            info!("Creating new substrate at {}", path.display());
            std::fs::create_dir_all(&path)?;
        }

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(map_size)
            .open(&path)
            .map_err(|e| {
                warn!("Failed to open LMDB environment at {}: {e}", path.display());
                StoreError::from(e)
            })?;
        let db = env.create_db(Some(DB_NAME), DatabaseFlags::empty())?;

        Ok(Self { env, db, path })
    }

    /// Directory holding the LMDB files.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes to disk and releases the environment.
    pub fn close_database(self) -> StoreResult<()> {
        self.env.sync(true)?;
        info!("Substrate at {} closed", self.path.display());
        Ok(())
    }
}

impl KeyValueStore for LmdbStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let txn = self.env.begin_ro_txn()?;
        let value = match txn.get(self.db, &key) {
            Ok(bytes) => {
                let text = std::str::from_utf8(bytes).map_err(|e| {
                    StoreError::Substrate(format!("value under {key} is not UTF-8: {e}"))
                })?;
                Some(text.to_string())
            }
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        txn.abort();
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.put(self.db, &key, &value, WriteFlags::empty())?;
        txn.commit()?;
        debug!("Wrote {} bytes under {key}", value.len());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        let mut txn = self.env.begin_rw_txn()?;
        match txn.del(self.db, &key, None) {
            Ok(()) | Err(lmdb::Error::NotFound) => {}
            Err(e) => return Err(e.into()),
        }
        txn.commit()?;
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.clear_db(self.db)?;
        txn.commit()?;
        info!("Substrate at {} cleared", self.path.display());
        Ok(())
    }

    fn flush(&self) -> StoreResult<()> {
        self.env.sync(true)?;
        Ok(())
    }
}
