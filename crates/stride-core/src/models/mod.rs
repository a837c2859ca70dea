//! Data models for stride entities.
//!
//! This module contains the data structures the sync engine persists:
//!
//! - `Goal`, `Milestone`: goal tracking
//! - `JournalEntry`: free-form journaling
//! - `Session`, `Statistics`: focus-session history and aggregates
//! - `Settings`: per-user application settings
//! - `EntityRecord`, `EntityPayload`, `EntityPatch`: the kind-tagged
//!   persistence envelope shared by both stores

pub mod goal;
pub mod journal;
pub mod payload;
pub mod record;
pub mod session;
pub mod settings;

pub use goal::{Goal, GoalPatch, Milestone, MilestonePatch};
pub use journal::{JournalEntry, JournalEntryPatch};
pub use payload::{EntityPatch, EntityPayload};
pub use record::{generate_entity_id, EntityKind, EntityRecord};
pub use session::{Session, SessionPatch, Statistics, StatisticsPatch};
pub use settings::{Settings, SettingsPatch};
