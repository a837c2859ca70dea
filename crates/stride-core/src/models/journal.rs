use serde::{Deserialize, Serialize};

/// A free-form journal entry, optionally tagged with a mood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalEntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl JournalEntry {
    pub fn apply(&mut self, patch: &JournalEntryPatch) {
        if let Some(ref title) = patch.title {
            self.title = Some(title.clone());
        }
        if let Some(ref body) = patch.body {
            self.body = body.clone();
        }
        if let Some(ref mood) = patch.mood {
            self.mood = Some(mood.clone());
        }
        if let Some(ref tags) = patch.tags {
            self.tags = tags.clone();
        }
    }
}
