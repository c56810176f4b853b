use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title given to stored tasks that lost theirs
pub const UNTITLED_TASK: &str = "Untitled Task";

/// Estimate used when a task has none (or a non-positive one)
pub const DEFAULT_ESTIMATE_MINUTES: u32 = 30;

/// Task type name used when none is given
pub const DEFAULT_TASK_TYPE: &str = "work";

/// A task in the list, optionally placed on the day planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    /// Title text (trimmed, never empty once loaded)
    #[serde(default = "untitled")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Name of the TaskType this task belongs to
    #[serde(default = "default_task_type")]
    pub task_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default = "default_estimate")]
    pub estimate_minutes: u32,
    /// Wall-clock start on the planner; `None` keeps the task in the backlog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_start: Option<NaiveDateTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Whether the task occupies a slot on the timeline
    pub fn is_scheduled(&self) -> bool {
        self.scheduled_start.is_some()
    }

    /// End of the scheduled interval (exclusive)
    pub fn scheduled_end(&self) -> Option<NaiveDateTime> {
        self.scheduled_start
            .map(|start| start + chrono::Duration::minutes(i64::from(self.estimate_minutes)))
    }

    /// Repair fields that older records may carry in a degraded form.
    /// Returns true if anything changed.
    pub fn normalize_legacy(&mut self) -> bool {
        let mut changed = false;
        if self.title.trim().is_empty() || self.title == "undefined" {
            self.title = UNTITLED_TASK.to_string();
            changed = true;
        }
        if self.estimate_minutes == 0 {
            self.estimate_minutes = DEFAULT_ESTIMATE_MINUTES;
            changed = true;
        }
        if self.task_type.trim().is_empty() {
            self.task_type = DEFAULT_TASK_TYPE.to_string();
            changed = true;
        }
        changed
    }
}

/// Fields accepted when creating a task
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub task_type: Option<String>,
    pub tags: Vec<String>,
    pub estimate_minutes: Option<i64>,
    pub scheduled_start: Option<NaiveDateTime>,
}

/// Partial update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<NaiveDate>,
    pub task_type: Option<String>,
    pub tags: Option<Vec<String>>,
    pub estimate_minutes: Option<i64>,
}

fn untitled() -> String {
    UNTITLED_TASK.to_string()
}

fn default_task_type() -> String {
    DEFAULT_TASK_TYPE.to_string()
}

fn default_estimate() -> u32 {
    DEFAULT_ESTIMATE_MINUTES
}
