use serde::{Deserialize, Serialize};

/// Default daily focus target in minutes.
const DEFAULT_DAILY_GOAL_MINUTES: u32 = 60;

/// Per-user application settings (singleton document).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub theme: String,
    pub daily_goal_minutes: u32,
    pub reminders_enabled: bool,
    /// "HH:MM" local time; `None` disables the daily reminder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: "system".to_string(),
            daily_goal_minutes: DEFAULT_DAILY_GOAL_MINUTES,
            reminders_enabled: false,
            reminder_time: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_goal_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
}

impl Settings {
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(ref theme) = patch.theme {
            self.theme = theme.clone();
        }
        if let Some(daily_goal_minutes) = patch.daily_goal_minutes {
            self.daily_goal_minutes = daily_goal_minutes;
        }
        if let Some(reminders_enabled) = patch.reminders_enabled {
            self.reminders_enabled = reminders_enabled;
        }
        if let Some(ref reminder_time) = patch.reminder_time {
            self.reminder_time = Some(reminder_time.clone());
        }
    }
}
