//! stride-core: dual-store synchronization for personal productivity data.
//!
//! Keeps a user's goals, milestones, journal entries, session history,
//! statistics, and settings consistent between a durable local JSON cache
//! and an authoritative remote document store, under unreliable
//! connectivity. The remote store is the source of truth; the local cache
//! keeps the app usable offline, with deferred writes retried in the
//! background and an on-demand reconciliation pass to merge the stores.
//!
//! Entry points:
//! - [`sync::SyncService`]: remote-first entity reads and writes
//! - [`sync::RetryScheduler`]: deferred-write queue and drain loop
//! - [`sync::Reconciler`]: per-user merge pass between the stores
//! - [`cache::TtlCache`]: memoizer for derived data

pub mod cache;
pub mod clock;
pub mod collab;
pub mod config;
pub mod models;
pub mod remote;
pub mod store;
pub mod sync;

pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use models::{EntityKind, EntityPatch, EntityPayload, EntityRecord};
pub use remote::{HttpRemoteStore, MemoryRemoteStore, RemoteError, RemoteStore};
pub use store::LocalStore;
pub use sync::{ReconcileReport, Reconciler, RetryScheduler, SyncService};
