//! Store configuration.
//!
//! Every field has a default, so a partial JSON document (or none at all)
//! is enough to build a [`StoreConfig`]. The key names must stay stable
//! across releases because they address data already on disk.

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// Prefix prepended to an entity-type name to form its collection key.
pub const DEFAULT_KEY_PREFIX: &str = "vignan_mock_";
/// Key holding the signed-in user.
pub const DEFAULT_SESSION_KEY: &str = "vignan_current_user";
/// Key holding every signed-up user.
pub const DEFAULT_REGISTERED_USERS_KEY: &str = "vignan_registered_users";
/// 64 MiB is plenty for a single learner's local data.
pub const DEFAULT_MAP_SIZE: usize = 64 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub key_prefix: String,
    pub session_key: String,
    pub registered_users_key: String,
    /// Populate demo courses and circulars on first run.
    pub seed_demo_data: bool,
    /// Artificial delay applied before every operation, in milliseconds.
    pub simulated_latency_ms: u64,
    /// LMDB memory map size in bytes.
    pub map_size: usize,
    /// Route returned by `redirect_to_login`.
    pub login_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
            registered_users_key: DEFAULT_REGISTERED_USERS_KEY.to_string(),
            seed_demo_data: true,
            simulated_latency_ms: 0,
            map_size: DEFAULT_MAP_SIZE,
            login_path: "/login".to_string(),
        }
    }
}

impl StoreConfig {
    /// Parses a JSON configuration document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Substrate key of the collection for `entity`.
    pub fn collection_key(&self, entity: &str) -> String {
        format!("{}{}", self.key_prefix, entity)
    }
}
