//! Dual-store synchronization.
//!
//! `SyncService` is the single entry point for entity reads and writes:
//! remote-first with a local mirror, degrading to local-only when the
//! remote store is unreachable. `RetryScheduler` drains deferred remote
//! writes; `Reconciler` runs the on-demand merge pass between the stores.

pub mod facade;
pub mod reconcile;
pub mod retry;
pub mod types;

pub use facade::SyncService;
pub use reconcile::{KindOutcome, ReconcileReport, Reconciler, Winner};
pub use retry::{RetryOp, RetryScheduler, DEFAULT_RETRY_INTERVAL_SECS};
pub use types::{DeleteOutcome, ReadOutcome, ReadSource, SyncStatus, WriteOutcome};
