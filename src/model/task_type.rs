use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Color shown for task types that are missing from the store
pub const FALLBACK_TYPE_COLOR: &str = "#9CA3AF";

/// Predefined types, seeded on first load: (name, color)
pub const DEFAULT_TASK_TYPES: &[(&str, &str)] = &[
    ("work", "#3B82F6"),
    ("yt", "#EF4444"),
    ("learn", "#10B981"),
    ("code", "#8B5CF6"),
];

/// A named, colored category for tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskType {
    pub id: String,
    pub name: String,
    /// Hex color code, e.g. `#FF5733`
    pub color: String,
    /// Predefined types cannot be edited or deleted
    #[serde(default)]
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskType {
    /// Case-insensitive name comparison
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}
