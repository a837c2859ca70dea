use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed focus session (collection kind: session history).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Session {
    pub fn apply(&mut self, patch: &SessionPatch) {
        if let Some(ref goal_id) = patch.goal_id {
            self.goal_id = Some(goal_id.clone());
        }
        if let Some(started_at) = patch.started_at {
            self.started_at = started_at;
        }
        if let Some(duration_minutes) = patch.duration_minutes {
            self.duration_minutes = duration_minutes;
        }
        if let Some(ref notes) = patch.notes {
            self.notes = Some(notes.clone());
        }
    }
}

/// Aggregated session statistics (singleton document per user).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub total_sessions: u32,
    #[serde(default)]
    pub total_minutes: u64,
    #[serde(default)]
    pub current_streak_days: u32,
    #[serde(default)]
    pub longest_streak_days: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_sessions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_minutes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_streak_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longest_streak_days: Option<u32>,
}

impl Statistics {
    pub fn apply(&mut self, patch: &StatisticsPatch) {
        if let Some(total_sessions) = patch.total_sessions {
            self.total_sessions = total_sessions;
        }
        if let Some(total_minutes) = patch.total_minutes {
            self.total_minutes = total_minutes;
        }
        if let Some(current_streak_days) = patch.current_streak_days {
            self.current_streak_days = current_streak_days;
        }
        if let Some(longest_streak_days) = patch.longest_streak_days {
            self.longest_streak_days = longest_streak_days;
        }
    }
}
