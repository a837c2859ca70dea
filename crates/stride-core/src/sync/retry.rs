//! RetryScheduler: deferred remote writes, drained on a fixed interval.
//!
//! Owns its queue and its clock instead of hiding behind a process-wide
//! global, so the composition root constructs one, shares it with the
//! façade, and decides when (or whether) the background loop runs. Tests
//! drive `run_pending` directly.
//!
//! Deliberately simple, matching the product's needs: no backoff, no
//! deduplication, no ordering across kinds, and no persistence; pending
//! work is lost when the process ends.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::models::{EntityKind, EntityPatch, EntityRecord};
use crate::remote::{EntityDraft, RemoteError, RemoteStore};
use crate::store::LocalStore;

/// Fixed drain interval.
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 10;

/// A deferred remote write. `Upsert` carries the full locally-synthesized
/// record so the retry is idempotent: the remote store honors the
/// client-chosen id and a late success converges on the id the local cache
/// already shows.
#[derive(Debug, Clone)]
pub enum RetryOp {
    Upsert {
        user_id: String,
        record: EntityRecord,
    },
    Update {
        user_id: String,
        kind: EntityKind,
        id: String,
        patch: EntityPatch,
    },
    Delete {
        user_id: String,
        kind: EntityKind,
        id: String,
    },
}

#[derive(Debug, Clone)]
struct PendingOp {
    op: RetryOp,
    attempts: u32,
}

pub struct RetryScheduler {
    remote: Arc<dyn RemoteStore>,
    local: Arc<LocalStore>,
    interval: Duration,
    queue: Mutex<Vec<PendingOp>>,
    loop_started: AtomicBool,
}

impl RetryScheduler {
    pub fn new(remote: Arc<dyn RemoteStore>, local: Arc<LocalStore>, interval: Duration) -> Self {
        Self {
            remote,
            local,
            interval,
            queue: Mutex::new(Vec::new()),
            loop_started: AtomicBool::new(false),
        }
    }

    pub fn with_default_interval(remote: Arc<dyn RemoteStore>, local: Arc<LocalStore>) -> Self {
        Self::new(remote, local, Duration::from_secs(DEFAULT_RETRY_INTERVAL_SECS))
    }

    pub fn enqueue(&self, op: RetryOp) {
        let mut queue = self.queue.lock();
        queue.push(PendingOp { op, attempts: 0 });
        debug!(pending = queue.len(), "Retry enqueued");
    }

    /// Number of operations still awaiting a successful retry.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Drain one tick: invoke every queued operation once. Successes are
    /// removed; failures stay, with `attempts` bumped, for the next tick.
    /// Returns how many operations succeeded.
    pub async fn run_pending(&self) -> usize {
        let batch: Vec<PendingOp> = self.queue.lock().drain(..).collect();
        if batch.is_empty() {
            return 0;
        }

        let mut succeeded = 0;
        let mut remaining = Vec::new();

        for mut pending in batch {
            pending.attempts += 1;
            match self.attempt(&pending.op).await {
                Ok(()) => {
                    succeeded += 1;
                }
                Err(e) => {
                    debug!(attempts = pending.attempts, error = %e, "Retry failed, keeping in queue");
                    remaining.push(pending);
                }
            }
        }

        // New enqueues during the drain land after the survivors; order
        // within the queue carries no guarantee anyway.
        let mut queue = self.queue.lock();
        let newly_enqueued: Vec<PendingOp> = queue.drain(..).collect();
        queue.extend(remaining);
        queue.extend(newly_enqueued);

        succeeded
    }

    /// Start the background drain loop on the current tokio runtime.
    /// Only the first call spawns; later calls return `None`. The caller
    /// owns the handle and may abort it to stop retrying.
    pub fn spawn(self: &Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        if self.loop_started.swap(true, Ordering::SeqCst) {
            return None;
        }
        let scheduler = Arc::clone(self);
        Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(scheduler.interval).await;
                let succeeded = scheduler.run_pending().await;
                if succeeded > 0 {
                    debug!(succeeded, pending = scheduler.pending(), "Retry tick drained");
                }
            }
        }))
    }

    async fn attempt(&self, op: &RetryOp) -> Result<(), RemoteError> {
        match op {
            RetryOp::Upsert { user_id, record } => {
                let draft = EntityDraft::with_id(record.id.clone(), record.payload.clone());
                let stored = self.remote.create(user_id, draft).await?;
                // Converge the local copy on the server-stamped record.
                self.write_back(user_id, stored);
                Ok(())
            }
            RetryOp::Update {
                user_id,
                kind,
                id,
                patch,
            } => {
                let merged = self.remote.update(user_id, *kind, id, patch).await?;
                self.write_back(user_id, merged);
                Ok(())
            }
            RetryOp::Delete { user_id, kind, id } => self.remote.delete(user_id, *kind, id).await,
        }
    }

    fn write_back(&self, user_id: &str, record: EntityRecord) {
        let kind = record.kind();
        let mut by_id: BTreeMap<String, EntityRecord> = self
            .local
            .get(user_id, kind)
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();
        by_id.insert(record.id.clone(), record);
        let records: Vec<EntityRecord> = by_id.into_values().collect();
        if let Err(e) = self.local.set(user_id, kind, &records) {
            warn!(user = user_id, kind = %kind, error = %e, "Failed to write retried record back to local cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::models::{EntityPayload, Goal, GoalPatch};
    use crate::remote::MemoryRemoteStore;
    use chrono::Utc;

    fn goal_record(id: &str, user: &str, title: &str) -> EntityRecord {
        EntityRecord {
            id: id.to_string(),
            user_id: user.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            payload: EntityPayload::Goal(Goal {
                title: title.to_string(),
                description: None,
                target_date: None,
                completed: false,
            }),
        }
    }

    fn fixture() -> (
        Arc<MemoryRemoteStore>,
        Arc<LocalStore>,
        RetryScheduler,
        tempfile::TempDir,
    ) {
        let remote = Arc::new(MemoryRemoteStore::new(Arc::new(SystemClock)));
        let dir = tempfile::tempdir().expect("tempdir");
        let local = Arc::new(LocalStore::new(dir.path().to_path_buf()).expect("local store"));
        let scheduler = RetryScheduler::new(
            remote.clone(),
            local.clone(),
            Duration::from_secs(DEFAULT_RETRY_INTERVAL_SECS),
        );
        (remote, local, scheduler, dir)
    }

    #[tokio::test]
    async fn test_failed_op_stays_queued() {
        let (remote, _local, scheduler, _dir) = fixture();
        remote.set_offline(true);

        scheduler.enqueue(RetryOp::Upsert {
            user_id: "u1".to_string(),
            record: goal_record("g1", "u1", "Run 5k"),
        });

        assert_eq!(scheduler.run_pending().await, 0);
        assert_eq!(scheduler.pending(), 1);
        // Still there after another failing tick; no cap.
        assert_eq!(scheduler.run_pending().await, 0);
        assert_eq!(scheduler.pending(), 1);
    }

    #[tokio::test]
    async fn test_upsert_retry_preserves_client_id() {
        let (remote, _local, scheduler, _dir) = fixture();
        remote.set_offline(true);

        scheduler.enqueue(RetryOp::Upsert {
            user_id: "u1".to_string(),
            record: goal_record("1700000000000-abc123", "u1", "Run 5k"),
        });
        scheduler.run_pending().await;

        remote.set_offline(false);
        assert_eq!(scheduler.run_pending().await, 1);
        assert_eq!(scheduler.pending(), 0);

        let records = remote.read("u1", EntityKind::Goal).await.expect("read");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "1700000000000-abc123");
    }

    #[tokio::test]
    async fn test_update_retry_writes_back_locally() {
        let (remote, local, scheduler, _dir) = fixture();

        let stored = remote
            .create(
                "u1",
                EntityDraft::with_id("g1", goal_record("g1", "u1", "Run 5k").payload),
            )
            .await
            .expect("seed remote");
        local.set("u1", EntityKind::Goal, &[stored]).expect("seed local");

        scheduler.enqueue(RetryOp::Update {
            user_id: "u1".to_string(),
            kind: EntityKind::Goal,
            id: "g1".to_string(),
            patch: EntityPatch::Goal(GoalPatch {
                completed: Some(true),
                ..Default::default()
            }),
        });
        assert_eq!(scheduler.run_pending().await, 1);

        let cached = local.get("u1", EntityKind::Goal);
        match &cached[0].payload {
            EntityPayload::Goal(g) => assert!(g.completed),
            _ => panic!("wrong kind"),
        }
    }

    #[tokio::test]
    async fn test_multiple_ops_for_same_entity_are_kept() {
        let (remote, _local, scheduler, _dir) = fixture();
        remote.set_offline(true);

        // No deduplication: two failed writes for one entity stay as two ops.
        scheduler.enqueue(RetryOp::Delete {
            user_id: "u1".to_string(),
            kind: EntityKind::Goal,
            id: "g1".to_string(),
        });
        scheduler.enqueue(RetryOp::Delete {
            user_id: "u1".to_string(),
            kind: EntityKind::Goal,
            id: "g1".to_string(),
        });
        scheduler.run_pending().await;
        assert_eq!(scheduler.pending(), 2);
    }

    #[tokio::test]
    async fn test_spawn_only_starts_one_loop() {
        let (_remote, _local, scheduler, _dir) = fixture();
        let scheduler = Arc::new(scheduler);

        let handle = scheduler.spawn().expect("first spawn");
        assert!(scheduler.spawn().is_none());
        handle.abort();
    }
}
