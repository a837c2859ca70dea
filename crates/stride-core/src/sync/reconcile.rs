//! Reconciler: on-demand merge pass between the two stores.
//!
//! Invoked per user (typically at session start). Collections are resolved
//! by element count (ties favor remote); singleton documents by newer
//! `updated_at` (a side with no document always loses). The winner is
//! written back to the local store only. When the *local* side wins, the
//! records the remote store is missing are enqueued as upsert retries, so
//! the remote copy is repaired through the ordinary retry path rather than
//! left permanently behind.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::{EntityKind, EntityRecord};
use crate::remote::RemoteStore;
use crate::store::LocalStore;

use super::retry::{RetryOp, RetryScheduler};

/// Which side a reconciliation pass kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Remote,
    Local,
}

/// Per-kind reconciliation outcome.
#[derive(Debug, Clone)]
pub struct KindOutcome {
    pub kind: EntityKind,
    pub winner: Winner,
    pub remote_len: usize,
    pub local_len: usize,
    /// Upsert retries enqueued to repair the remote store (local wins only).
    pub repairs_enqueued: usize,
}

/// What `reconcile_user_data` did, kind by kind. Consumers should surface
/// local wins as pending-sync state rather than treating the pass as a
/// full two-way sync.
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub outcomes: Vec<KindOutcome>,
}

impl ReconcileReport {
    /// Kinds where the local side won and the remote store needs repair.
    pub fn local_wins(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.winner == Winner::Local)
            .count()
    }
}

pub struct Reconciler {
    remote: Arc<dyn RemoteStore>,
    local: Arc<LocalStore>,
    retry: Arc<RetryScheduler>,
}

impl Reconciler {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        local: Arc<LocalStore>,
        retry: Arc<RetryScheduler>,
    ) -> Self {
        Self {
            remote,
            local,
            retry,
        }
    }

    /// One-shot merge pass across every entity kind for one user.
    pub async fn reconcile_user_data(&self, user_id: &str) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for kind in EntityKind::COLLECTIONS {
            report.outcomes.push(self.reconcile_collection(user_id, kind).await);
        }
        for kind in EntityKind::SINGLETONS {
            report.outcomes.push(self.reconcile_singleton(user_id, kind).await);
        }

        if report.local_wins() > 0 {
            debug!(
                user = user_id,
                local_wins = report.local_wins(),
                "Reconciliation kept local data for some kinds; remote repairs enqueued"
            );
        }
        report
    }

    async fn reconcile_collection(&self, user_id: &str, kind: EntityKind) -> KindOutcome {
        let local = self.local.get(user_id, kind);

        let remote = match self.remote.read(user_id, kind).await {
            Ok(records) => records,
            Err(e) => {
                // Remote unreachable: leave the local copy untouched.
                warn!(user = user_id, kind = %kind, error = %e, "Reconcile read failed, keeping local collection");
                return KindOutcome {
                    kind,
                    winner: Winner::Local,
                    remote_len: 0,
                    local_len: local.len(),
                    repairs_enqueued: 0,
                };
            }
        };

        let (remote_len, local_len) = (remote.len(), local.len());

        if remote_len >= local_len {
            // Ties favor remote.
            self.write_local(user_id, kind, &remote);
            KindOutcome {
                kind,
                winner: Winner::Remote,
                remote_len,
                local_len,
                repairs_enqueued: 0,
            }
        } else {
            let repairs = self.enqueue_repairs(user_id, &remote, &local);
            KindOutcome {
                kind,
                winner: Winner::Local,
                remote_len,
                local_len,
                repairs_enqueued: repairs,
            }
        }
    }

    async fn reconcile_singleton(&self, user_id: &str, kind: EntityKind) -> KindOutcome {
        let local = self.local.get(user_id, kind);

        let remote = match self.remote.read(user_id, kind).await {
            Ok(records) => records,
            Err(e) => {
                warn!(user = user_id, kind = %kind, error = %e, "Reconcile read failed, keeping local document");
                return KindOutcome {
                    kind,
                    winner: Winner::Local,
                    remote_len: 0,
                    local_len: local.len(),
                    repairs_enqueued: 0,
                };
            }
        };

        let (remote_len, local_len) = (remote.len(), local.len());
        let remote_doc = remote.into_iter().next();

        // A missing document is a missing timestamp: it always loses.
        if let Some(local_doc) = local.into_iter().next() {
            let local_newer = remote_doc
                .as_ref()
                .map_or(true, |r| local_doc.updated_at > r.updated_at);
            if local_newer {
                self.retry.enqueue(RetryOp::Upsert {
                    user_id: user_id.to_string(),
                    record: local_doc,
                });
                return KindOutcome {
                    kind,
                    winner: Winner::Local,
                    remote_len,
                    local_len,
                    repairs_enqueued: 1,
                };
            }
        }

        let winner: Vec<EntityRecord> = remote_doc.into_iter().collect();
        self.write_local(user_id, kind, &winner);
        KindOutcome {
            kind,
            winner: Winner::Remote,
            remote_len,
            local_len,
            repairs_enqueued: 0,
        }
    }

    fn enqueue_repairs(
        &self,
        user_id: &str,
        remote: &[EntityRecord],
        local: &[EntityRecord],
    ) -> usize {
        let remote_ids: BTreeSet<&str> = remote.iter().map(|r| r.id.as_str()).collect();
        let mut repairs = 0;
        for record in local {
            if !remote_ids.contains(record.id.as_str()) {
                self.retry.enqueue(RetryOp::Upsert {
                    user_id: user_id.to_string(),
                    record: record.clone(),
                });
                repairs += 1;
            }
        }
        repairs
    }

    fn write_local(&self, user_id: &str, kind: EntityKind, records: &[EntityRecord]) {
        if let Err(e) = self.local.set(user_id, kind, records) {
            warn!(user = user_id, kind = %kind, error = %e, "Failed to write reconciled collection");
        }
    }
}
