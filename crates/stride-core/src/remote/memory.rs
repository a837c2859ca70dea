//! In-memory `RemoteStore` backend.
//!
//! Serves two purposes: the offline demo backend, and the crate's test
//! double. The `offline` toggle makes every call fail with
//! `RemoteError::Unavailable`, simulating a connectivity outage;
//! `deny_reads` simulates the authorization failure the read contract maps
//! to an empty collection.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::warn;

use crate::clock::Clock;
use crate::models::{generate_entity_id, EntityKind, EntityPatch, EntityRecord};

use super::client::{EntityDraft, RemoteStore};
use super::RemoteError;

type DocKey = (String, EntityKind, String);

pub struct MemoryRemoteStore {
    clock: Arc<dyn Clock>,
    offline: AtomicBool,
    deny_reads: AtomicBool,
    docs: Mutex<BTreeMap<DocKey, EntityRecord>>,
}

impl MemoryRemoteStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            offline: AtomicBool::new(false),
            deny_reads: AtomicBool::new(false),
            docs: Mutex::new(BTreeMap::new()),
        }
    }

    /// Toggle simulated connectivity loss.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Toggle simulated authorization failure on reads.
    pub fn set_deny_reads(&self, deny: bool) {
        self.deny_reads.store(deny, Ordering::SeqCst);
    }

    /// Number of documents stored for one `(user, kind)`.
    pub fn len(&self, user_id: &str, kind: EntityKind) -> usize {
        self.collection(user_id, kind).len()
    }

    pub fn is_empty(&self, user_id: &str, kind: EntityKind) -> bool {
        self.len(user_id, kind) == 0
    }

    fn guard(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RemoteError::Unavailable("remote store offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn collection(&self, user_id: &str, kind: EntityKind) -> Vec<EntityRecord> {
        let docs = self.docs.lock();
        docs.range(
            (user_id.to_string(), kind, String::new())
                ..=(user_id.to_string(), kind, "\u{10FFFF}".to_string()),
        )
            .map(|(_, record)| record.clone())
            .collect()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn create(
        &self,
        user_id: &str,
        draft: EntityDraft,
    ) -> Result<EntityRecord, RemoteError> {
        self.guard()?;

        let now = self.clock.now();
        let id = draft.id.unwrap_or_else(|| generate_entity_id(now));
        let kind = draft.payload.kind();
        let key = (user_id.to_string(), kind, id.clone());

        let mut docs = self.docs.lock();
        // Upsert: an existing document keeps its created_at.
        let created_at = docs.get(&key).map(|r| r.created_at).unwrap_or(now);
        let record = EntityRecord {
            id,
            user_id: user_id.to_string(),
            created_at,
            updated_at: now,
            payload: draft.payload,
        };
        docs.insert(key, record.clone());
        Ok(record)
    }

    async fn read(
        &self,
        user_id: &str,
        kind: EntityKind,
    ) -> Result<Vec<EntityRecord>, RemoteError> {
        self.guard()?;

        if self.deny_reads.load(Ordering::SeqCst) {
            warn!(user = user_id, kind = %kind, "Remote read denied, returning empty collection");
            return Ok(Vec::new());
        }

        Ok(self.collection(user_id, kind))
    }

    async fn update(
        &self,
        user_id: &str,
        kind: EntityKind,
        id: &str,
        patch: &EntityPatch,
    ) -> Result<EntityRecord, RemoteError> {
        self.guard()?;

        let key = (user_id.to_string(), kind, id.to_string());
        let mut docs = self.docs.lock();
        let record = docs
            .get_mut(&key)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;

        if !record.payload.apply(patch) {
            return Err(RemoteError::InvalidResponse(format!(
                "patch kind {} does not match entity kind {}",
                patch.kind(),
                kind
            )));
        }
        record.updated_at = self.clock.now();
        Ok(record.clone())
    }

    async fn delete(&self, user_id: &str, kind: EntityKind, id: &str) -> Result<(), RemoteError> {
        self.guard()?;

        let key = (user_id.to_string(), kind, id.to_string());
        self.docs.lock().remove(&key);
        Ok(())
    }
}
