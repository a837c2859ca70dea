//! SyncService: remote-first orchestration over both stores.
//!
//! Every write attempts the remote store, then mirrors the result into the
//! local cache. When the remote store is unreachable the write degrades to
//! local-only persistence plus a queued retry; reads degrade to the stale
//! local copy. Failures never escape: callers learn what happened from the
//! typed outcome, not from an error.
//!
//! Mutations for one `(user, kind)` are serialized through a per-key async
//! lock and flow through a by-id map, so overlapping callers cannot
//! interleave a lost update on the cached collection.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Mutex as TokioMutex;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::models::{generate_entity_id, EntityKind, EntityPatch, EntityPayload, EntityRecord};
use crate::remote::{EntityDraft, RemoteStore};
use crate::store::LocalStore;

use super::retry::{RetryOp, RetryScheduler};
use super::types::{DeleteOutcome, ReadOutcome, ReadSource, SyncStatus, WriteOutcome};

pub struct SyncService {
    remote: Arc<dyn RemoteStore>,
    local: Arc<LocalStore>,
    retry: Arc<RetryScheduler>,
    clock: Arc<dyn Clock>,
    /// Per-`(user, kind)` single-writer locks for local-cache mutation.
    locks: Mutex<HashMap<String, Arc<TokioMutex<()>>>>,
}

impl SyncService {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        local: Arc<LocalStore>,
        retry: Arc<RetryScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            remote,
            local,
            retry,
            clock,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create an entity. Remote-assigned id and timestamps when the remote
    /// write succeeds; a client-synthesized record plus a queued idempotent
    /// upsert when it does not.
    pub async fn create_entity(&self, user_id: &str, payload: EntityPayload) -> WriteOutcome {
        let kind = payload.kind();
        let lock = self.key_lock(user_id, kind);
        let _guard = lock.lock().await;

        match self
            .remote
            .create(user_id, EntityDraft::new(payload.clone()))
            .await
        {
            Ok(record) => {
                self.insert_local(user_id, kind, record.clone());
                WriteOutcome {
                    record,
                    status: SyncStatus::Synced,
                }
            }
            Err(e) => {
                warn!(user = user_id, kind = %kind, error = %e, "Remote create failed, persisting locally");
                let now = self.clock.now();
                let record = EntityRecord {
                    id: generate_entity_id(now),
                    user_id: user_id.to_string(),
                    created_at: now,
                    updated_at: now,
                    payload,
                };
                self.insert_local(user_id, kind, record.clone());
                self.retry.enqueue(RetryOp::Upsert {
                    user_id: user_id.to_string(),
                    record: record.clone(),
                });
                WriteOutcome {
                    record,
                    status: SyncStatus::LocalOnly,
                }
            }
        }
    }

    /// Read the full collection. A successful remote read overwrites the
    /// whole local collection (remote wins unconditionally); a failed one
    /// returns the local copy unmodified, tagged as a fallback.
    pub async fn get_entities(&self, user_id: &str, kind: EntityKind) -> ReadOutcome {
        let lock = self.key_lock(user_id, kind);
        let _guard = lock.lock().await;

        match self.remote.read(user_id, kind).await {
            Ok(records) => {
                if let Err(e) = self.local.set(user_id, kind, &records) {
                    warn!(user = user_id, kind = %kind, error = %e, "Failed to mirror remote read into local cache");
                }
                ReadOutcome {
                    records,
                    source: ReadSource::Remote,
                }
            }
            Err(e) => {
                warn!(user = user_id, kind = %kind, error = %e, "Remote read failed, serving local cache");
                ReadOutcome {
                    records: self.local.get(user_id, kind),
                    source: ReadSource::LocalFallback,
                }
            }
        }
    }

    /// Field-level merge into an existing entity. `None` when the id is
    /// unknown locally (no-op). On remote failure the merge is applied to
    /// the local copy and the update is queued for retry.
    pub async fn update_entity(
        &self,
        user_id: &str,
        id: &str,
        patch: EntityPatch,
    ) -> Option<WriteOutcome> {
        let kind = patch.kind();
        let lock = self.key_lock(user_id, kind);
        let _guard = lock.lock().await;

        let mut by_id = self.load_map(user_id, kind);
        if !by_id.contains_key(id) {
            debug!(user = user_id, kind = %kind, id = id, "Update target not found locally, no-op");
            return None;
        }

        match self.remote.update(user_id, kind, id, &patch).await {
            Ok(merged) => {
                by_id.insert(id.to_string(), merged.clone());
                self.store_map(user_id, kind, by_id);
                Some(WriteOutcome {
                    record: merged,
                    status: SyncStatus::Synced,
                })
            }
            Err(e) => {
                warn!(user = user_id, kind = %kind, id = id, error = %e, "Remote update failed, merging locally");
                let record = by_id.get_mut(id)?;
                if !record.payload.apply(&patch) {
                    // Kind mismatch cannot survive the boundary: the patch's
                    // kind chose this collection.
                    debug!(user = user_id, id = id, "Patch kind mismatch, no-op");
                    return None;
                }
                record.updated_at = self.clock.now();
                let record = record.clone();
                self.store_map(user_id, kind, by_id);
                self.retry.enqueue(RetryOp::Update {
                    user_id: user_id.to_string(),
                    kind,
                    id: id.to_string(),
                    patch,
                });
                Some(WriteOutcome {
                    record,
                    status: SyncStatus::LocalOnly,
                })
            }
        }
    }

    /// Optimistic delete: the local record is removed no matter what the
    /// remote store says. A failed remote delete is queued for retry; until
    /// that retry lands, a successful remote read can resurrect the record
    /// locally (documented inconsistency window).
    pub async fn delete_entity(&self, user_id: &str, kind: EntityKind, id: &str) -> DeleteOutcome {
        let lock = self.key_lock(user_id, kind);
        let _guard = lock.lock().await;

        let remote_result = self.remote.delete(user_id, kind, id).await;

        let mut by_id = self.load_map(user_id, kind);
        let removed_locally = by_id.remove(id).is_some();
        self.store_map(user_id, kind, by_id);

        match remote_result {
            Ok(()) => DeleteOutcome {
                removed_locally,
                status: SyncStatus::Synced,
            },
            Err(e) => {
                warn!(user = user_id, kind = %kind, id = id, error = %e, "Remote delete failed, queued for retry");
                self.retry.enqueue(RetryOp::Delete {
                    user_id: user_id.to_string(),
                    kind,
                    id: id.to_string(),
                });
                DeleteOutcome {
                    removed_locally,
                    status: SyncStatus::LocalOnly,
                }
            }
        }
    }

    // ===== Internals =====

    fn key_lock(&self, user_id: &str, kind: EntityKind) -> Arc<TokioMutex<()>> {
        let key = format!("{}:{}", user_id, kind.as_str());
        let mut locks = self.locks.lock();
        locks
            .entry(key)
            .or_insert_with(|| Arc::new(TokioMutex::new(())))
            .clone()
    }

    fn load_map(&self, user_id: &str, kind: EntityKind) -> BTreeMap<String, EntityRecord> {
        self.local
            .get(user_id, kind)
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect()
    }

    fn store_map(&self, user_id: &str, kind: EntityKind, by_id: BTreeMap<String, EntityRecord>) {
        let records: Vec<EntityRecord> = by_id.into_values().collect();
        if let Err(e) = self.local.set(user_id, kind, &records) {
            warn!(user = user_id, kind = %kind, error = %e, "Failed to persist local collection");
        }
    }

    fn insert_local(&self, user_id: &str, kind: EntityKind, record: EntityRecord) {
        let mut by_id = self.load_map(user_id, kind);
        by_id.insert(record.id.clone(), record);
        self.store_map(user_id, kind, by_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::models::{Goal, GoalPatch};
    use crate::remote::MemoryRemoteStore;
    use std::time::Duration;

    struct Fixture {
        remote: Arc<MemoryRemoteStore>,
        service: SyncService,
        retry: Arc<RetryScheduler>,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let remote = Arc::new(MemoryRemoteStore::new(clock.clone()));
        let dir = tempfile::tempdir().expect("tempdir");
        let local = Arc::new(LocalStore::new(dir.path().to_path_buf()).expect("local store"));
        let retry = Arc::new(RetryScheduler::new(
            remote.clone(),
            local.clone(),
            Duration::from_secs(10),
        ));
        let service = SyncService::new(remote.clone(), local, retry.clone(), clock);
        Fixture {
            remote,
            service,
            retry,
            _dir: dir,
        }
    }

    fn goal(title: &str) -> EntityPayload {
        EntityPayload::Goal(Goal {
            title: title.to_string(),
            description: None,
            target_date: None,
            completed: false,
        })
    }

    fn titles(records: &[EntityRecord]) -> Vec<String> {
        records
            .iter()
            .map(|r| match &r.payload {
                EntityPayload::Goal(g) => g.title.clone(),
                _ => panic!("expected goals"),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let fx = fixture();

        for title in ["Run 5k", "Read 12 books", "Sleep by 11"] {
            let outcome = fx.service.create_entity("u1", goal(title)).await;
            assert_eq!(outcome.status, SyncStatus::Synced);
        }

        let read = fx.service.get_entities("u1", EntityKind::Goal).await;
        assert_eq!(read.source, ReadSource::Remote);
        let mut got = titles(&read.records);
        got.sort();
        assert_eq!(got, vec!["Read 12 books", "Run 5k", "Sleep by 11"]);
    }

    #[tokio::test]
    async fn test_read_idempotence() {
        let fx = fixture();
        fx.service.create_entity("u1", goal("Run 5k")).await;

        let first = fx.service.get_entities("u1", EntityKind::Goal).await;
        let second = fx.service.get_entities("u1", EntityKind::Goal).await;
        assert_eq!(first.records, second.records);
        assert_eq!(second.source, ReadSource::Remote);
    }

    #[tokio::test]
    async fn test_offline_create_degrades_and_converges() {
        let fx = fixture();
        fx.remote.set_offline(true);

        // "Run 5k" while remote is down: client-synthesized id, local copy,
        // queued retry.
        let outcome = fx.service.create_entity("u1", goal("Run 5k")).await;
        assert_eq!(outcome.status, SyncStatus::LocalOnly);
        let client_id = outcome.record.id.clone();
        assert!(!client_id.is_empty());
        assert_eq!(fx.retry.pending(), 1);

        let read = fx.service.get_entities("u1", EntityKind::Goal).await;
        assert_eq!(read.source, ReadSource::LocalFallback);
        assert_eq!(read.records.len(), 1);
        assert_eq!(read.records[0].id, client_id);

        // A failing tick leaves the op queued.
        fx.retry.run_pending().await;
        assert_eq!(fx.retry.pending(), 1);

        // Connectivity restored: the retry converges remote on the client id.
        fx.remote.set_offline(false);
        fx.retry.run_pending().await;
        assert_eq!(fx.retry.pending(), 0);

        let read = fx.service.get_entities("u1", EntityKind::Goal).await;
        assert_eq!(read.source, ReadSource::Remote);
        assert_eq!(titles(&read.records), vec!["Run 5k"]);
        assert_eq!(read.records[0].id, client_id);
    }

    #[tokio::test]
    async fn test_update_synced_path_replaces_local() {
        let fx = fixture();
        let created = fx.service.create_entity("u1", goal("Run 5k")).await;

        let outcome = fx
            .service
            .update_entity(
                "u1",
                &created.record.id,
                EntityPatch::Goal(GoalPatch {
                    completed: Some(true),
                    ..Default::default()
                }),
            )
            .await
            .expect("known id");
        assert_eq!(outcome.status, SyncStatus::Synced);

        let read = fx.service.get_entities("u1", EntityKind::Goal).await;
        match &read.records[0].payload {
            EntityPayload::Goal(g) => {
                assert_eq!(g.title, "Run 5k");
                assert!(g.completed);
            }
            _ => panic!("wrong kind"),
        }
    }

    #[tokio::test]
    async fn test_update_offline_merges_locally_and_queues() {
        let fx = fixture();
        let created = fx.service.create_entity("u1", goal("Run 5k")).await;
        fx.remote.set_offline(true);

        let outcome = fx
            .service
            .update_entity(
                "u1",
                &created.record.id,
                EntityPatch::Goal(GoalPatch {
                    description: Some("couch to 5k".to_string()),
                    ..Default::default()
                }),
            )
            .await
            .expect("known id");
        assert_eq!(outcome.status, SyncStatus::LocalOnly);
        assert_eq!(fx.retry.pending(), 1);

        let read = fx.service.get_entities("u1", EntityKind::Goal).await;
        assert_eq!(read.source, ReadSource::LocalFallback);
        match &read.records[0].payload {
            EntityPayload::Goal(g) => {
                assert_eq!(g.description.as_deref(), Some("couch to 5k"))
            }
            _ => panic!("wrong kind"),
        }
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_noop() {
        let fx = fixture();
        fx.service.create_entity("u1", goal("Run 5k")).await;

        let outcome = fx
            .service
            .update_entity(
                "u1",
                "does-not-exist",
                EntityPatch::Goal(GoalPatch {
                    completed: Some(true),
                    ..Default::default()
                }),
            )
            .await;
        assert!(outcome.is_none());
        assert_eq!(fx.retry.pending(), 0);
    }

    #[tokio::test]
    async fn test_optimistic_delete_hides_record_even_when_remote_fails() {
        let fx = fixture();
        let created = fx.service.create_entity("u1", goal("Run 5k")).await;
        fx.remote.set_offline(true);

        let outcome = fx
            .service
            .delete_entity("u1", EntityKind::Goal, &created.record.id)
            .await;
        assert!(outcome.removed_locally);
        assert_eq!(outcome.status, SyncStatus::LocalOnly);
        assert_eq!(fx.retry.pending(), 1);

        // Immediately-following local fallback read no longer shows it.
        let read = fx.service.get_entities("u1", EntityKind::Goal).await;
        assert_eq!(read.source, ReadSource::LocalFallback);
        assert!(read.records.is_empty());

        // But remote still holds it until the delete retry lands: a remote
        // read resurrects the record locally (documented window).
        fx.remote.set_offline(false);
        let read = fx.service.get_entities("u1", EntityKind::Goal).await;
        assert_eq!(read.records.len(), 1);

        fx.retry.run_pending().await;
        let read = fx.service.get_entities("u1", EntityKind::Goal).await;
        assert!(read.records.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_disjoint_updates_both_survive() {
        let fx = fixture();
        let created = fx.service.create_entity("u1", goal("Run 5k")).await;
        let id = created.record.id.clone();

        // Mutations for one (user, kind) are serialized, so two overlapping
        // disjoint-field updates both land.
        let title_patch = EntityPatch::Goal(GoalPatch {
            title: Some("Run 10k".to_string()),
            ..Default::default()
        });
        let completed_patch = EntityPatch::Goal(GoalPatch {
            completed: Some(true),
            ..Default::default()
        });
        let (a, b) = tokio::join!(
            fx.service.update_entity("u1", &id, title_patch),
            fx.service.update_entity("u1", &id, completed_patch),
        );
        assert!(a.is_some() && b.is_some());

        let read = fx.service.get_entities("u1", EntityKind::Goal).await;
        match &read.records[0].payload {
            EntityPayload::Goal(g) => {
                assert_eq!(g.title, "Run 10k");
                assert!(g.completed);
            }
            _ => panic!("wrong kind"),
        }
    }

    #[tokio::test]
    async fn test_denied_read_looks_like_no_data() {
        let fx = fixture();
        fx.service.create_entity("u1", goal("Run 5k")).await;
        fx.remote.set_deny_reads(true);

        // The permission failure is absorbed by the remote client: the
        // façade sees a successful empty read and mirrors it locally.
        let read = fx.service.get_entities("u1", EntityKind::Goal).await;
        assert_eq!(read.source, ReadSource::Remote);
        assert!(read.records.is_empty());
    }
}
