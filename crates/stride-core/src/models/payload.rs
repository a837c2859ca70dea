//! Tagged entity payloads and partial updates.
//!
//! Every persisted document carries a `kind` discriminator, so both stores
//! and the wire format stay self-describing. Patches mirror the payload
//! variants with all-`Option` fields; applying a patch merges only the
//! fields that are present (field-level merge, never replace).

use serde::{Deserialize, Serialize};

use super::goal::{Goal, GoalPatch, Milestone, MilestonePatch};
use super::journal::{JournalEntry, JournalEntryPatch};
use super::record::EntityKind;
use super::session::{Session, SessionPatch, Statistics, StatisticsPatch};
use super::settings::{Settings, SettingsPatch};

/// The kind-tagged payload of an [`super::EntityRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityPayload {
    Goal(Goal),
    Milestone(Milestone),
    JournalEntry(JournalEntry),
    Session(Session),
    Statistics(Statistics),
    Settings(Settings),
}

impl EntityPayload {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityPayload::Goal(_) => EntityKind::Goal,
            EntityPayload::Milestone(_) => EntityKind::Milestone,
            EntityPayload::JournalEntry(_) => EntityKind::JournalEntry,
            EntityPayload::Session(_) => EntityKind::Session,
            EntityPayload::Statistics(_) => EntityKind::Statistics,
            EntityPayload::Settings(_) => EntityKind::Settings,
        }
    }

    /// Merge a patch into this payload. Returns `false` without modifying
    /// anything if the patch targets a different kind.
    pub fn apply(&mut self, patch: &EntityPatch) -> bool {
        match (self, patch) {
            (EntityPayload::Goal(g), EntityPatch::Goal(p)) => g.apply(p),
            (EntityPayload::Milestone(m), EntityPatch::Milestone(p)) => m.apply(p),
            (EntityPayload::JournalEntry(j), EntityPatch::JournalEntry(p)) => j.apply(p),
            (EntityPayload::Session(s), EntityPatch::Session(p)) => s.apply(p),
            (EntityPayload::Statistics(s), EntityPatch::Statistics(p)) => s.apply(p),
            (EntityPayload::Settings(s), EntityPatch::Settings(p)) => s.apply(p),
            _ => return false,
        }
        true
    }
}

/// A kind-tagged field-level partial update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityPatch {
    Goal(GoalPatch),
    Milestone(MilestonePatch),
    JournalEntry(JournalEntryPatch),
    Session(SessionPatch),
    Statistics(StatisticsPatch),
    Settings(SettingsPatch),
}

impl EntityPatch {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityPatch::Goal(_) => EntityKind::Goal,
            EntityPatch::Milestone(_) => EntityKind::Milestone,
            EntityPatch::JournalEntry(_) => EntityKind::JournalEntry,
            EntityPatch::Session(_) => EntityKind::Session,
            EntityPatch::Statistics(_) => EntityKind::Statistics,
            EntityPatch::Settings(_) => EntityKind::Settings,
        }
    }
}
