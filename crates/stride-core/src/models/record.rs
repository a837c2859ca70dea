use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

use super::payload::EntityPayload;

/// Length of the random suffix appended to synthesized entity ids.
const ID_SUFFIX_LEN: usize = 6;

/// The six kinds of user entities the sync engine manages.
///
/// `Statistics` and `Settings` are singleton documents (at most one record
/// per user); the rest are collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Goal,
    Milestone,
    JournalEntry,
    Session,
    Statistics,
    Settings,
}

impl EntityKind {
    /// Collection-typed kinds, in reconciliation order.
    pub const COLLECTIONS: [EntityKind; 4] = [
        EntityKind::Goal,
        EntityKind::Milestone,
        EntityKind::JournalEntry,
        EntityKind::Session,
    ];

    /// Singleton-document kinds.
    pub const SINGLETONS: [EntityKind; 2] = [EntityKind::Statistics, EntityKind::Settings];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Goal => "goal",
            EntityKind::Milestone => "milestone",
            EntityKind::JournalEntry => "journal_entry",
            EntityKind::Session => "session",
            EntityKind::Statistics => "statistics",
            EntityKind::Settings => "settings",
        }
    }

    pub fn is_singleton(&self) -> bool {
        matches!(self, EntityKind::Statistics | EntityKind::Settings)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted entity: identity, ownership, timestamps, and a typed payload.
///
/// `created_at`/`updated_at` are server-resolved on the remote path. Records
/// synthesized during an offline fallback carry client-clock timestamps,
/// which are not comparable across devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: EntityPayload,
}

impl EntityRecord {
    pub fn kind(&self) -> EntityKind {
        self.payload.kind()
    }
}

/// Synthesize an entity id: unix millis plus a short random suffix.
/// Unique enough within one `(user, kind)` collection; collisions across
/// devices are resolved by the remote store's upsert semantics.
pub fn generate_entity_id(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{}-{}", now.timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_str_round_trip() {
        for kind in EntityKind::COLLECTIONS.iter().chain(EntityKind::SINGLETONS.iter()) {
            let json = serde_json::to_string(kind).expect("serialize kind");
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_singleton_classification() {
        assert!(EntityKind::Statistics.is_singleton());
        assert!(EntityKind::Settings.is_singleton());
        assert!(!EntityKind::Goal.is_singleton());
        assert!(!EntityKind::Session.is_singleton());
    }

    #[test]
    fn test_generate_entity_id_shape() {
        let now = Utc::now();
        let id = generate_entity_id(now);
        let (millis, suffix) = id.split_once('-').expect("id has a dash");
        assert_eq!(millis, now.timestamp_millis().to_string());
        assert_eq!(suffix.len(), ID_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
