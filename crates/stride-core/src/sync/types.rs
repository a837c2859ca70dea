//! Typed operation outcomes for the synchronization façade.
//!
//! The façade never lets a store failure escape; instead every operation
//! reports whether it reached the remote store or degraded to the local
//! cache, so consumers can render a pending-sync indicator instead of
//! unconditionally trusting the data.

use crate::models::EntityRecord;

/// Where a write landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Remote accepted the write; the local cache mirrors it.
    Synced,
    /// Remote was unreachable; the write lives only in the local cache
    /// with a retry pending.
    LocalOnly,
}

/// Result of a create or update.
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    pub record: EntityRecord,
    pub status: SyncStatus,
}

/// Which store served a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    /// Fresh from the remote store; the local cache was overwritten.
    Remote,
    /// The remote read failed; this is the possibly-stale local copy.
    LocalFallback,
}

/// Result of a collection read.
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    pub records: Vec<EntityRecord>,
    pub source: ReadSource,
}

/// Result of a delete. The local removal is optimistic: `status` reports
/// whether the remote delete also went through.
#[derive(Debug, Clone, Copy)]
pub struct DeleteOutcome {
    pub removed_locally: bool,
    pub status: SyncStatus,
}
