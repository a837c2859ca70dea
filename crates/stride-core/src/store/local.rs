//! Durable on-device cache: one JSON file per `(kind, user)` key.
//!
//! The local store is a materialized view of the remote store. It never
//! fails a read: missing or malformed content is logged and treated as an
//! empty collection, so a corrupted cache file degrades to "no local data"
//! instead of wedging the sync path.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{EntityKind, EntityRecord};

pub struct LocalStore {
    data_dir: PathBuf,
}

impl LocalStore {
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
        Ok(Self { data_dir })
    }

    /// Persisted key convention: `"{kind}_data_{user_id}"`.
    pub fn data_key(kind: EntityKind, user_id: &str) -> String {
        format!("{}_data_{}", kind.as_str(), user_id)
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }

    /// Load the materialized collection for one `(user, kind)` key.
    /// Missing or malformed content is an empty collection, never an error.
    pub fn get(&self, user_id: &str, kind: EntityKind) -> Vec<EntityRecord> {
        self.load_lenient(&Self::data_key(kind, user_id))
    }

    /// Overwrite the materialized collection for one `(user, kind)` key.
    /// Writes to different keys are independent; there is no cross-key
    /// atomicity.
    pub fn set(&self, user_id: &str, kind: EntityKind, records: &[EntityRecord]) -> Result<()> {
        self.save(&Self::data_key(kind, user_id), &records)
    }

    // ===== Derived state =====

    pub fn load_achievements(&self, user_id: &str) -> Vec<String> {
        self.load_lenient(&format!("user_achievements_{}", user_id))
    }

    pub fn save_achievements(&self, user_id: &str, achievements: &[String]) -> Result<()> {
        self.save(&format!("user_achievements_{}", user_id), &achievements)
    }

    pub fn load_points(&self, user_id: &str) -> i64 {
        self.load_lenient(&format!("user_points_{}", user_id))
    }

    pub fn save_points(&self, user_id: &str, points: i64) -> Result<()> {
        self.save(&format!("user_points_{}", user_id), &points)
    }

    // ===== Internals =====

    fn load_lenient<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let path = self.key_path(key);
        if !path.exists() {
            return T::default();
        }

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to read cache file, treating as empty");
                return T::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = key, error = %e, "Malformed cache file, treating as empty");
                T::default()
            }
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.key_path(key);
        let contents = serde_json::to_string_pretty(value)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write cache file: {}", key))?;
        debug!(key = key, "Cache file written");
        Ok(())
    }
}
