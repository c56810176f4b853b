use chrono::{DateTime, NaiveDateTime, Utc};

use crate::model::config::TaskDefaults;
use crate::model::task::{Task, TaskDraft, TaskUpdate};
use crate::ops::timeline::snap_to_quarter_hour;

/// Longest accepted title, in characters
pub const MAX_TITLE_LEN: usize = 200;

/// Longest accepted description, in characters
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Error type for task operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("task title is required")]
    TitleRequired,
    #[error("task title must be 200 characters or less (got {0})")]
    TitleTooLong(usize),
    #[error("task description must be 1000 characters or less (got {0})")]
    DescriptionTooLong(usize),
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_title(title: &str) -> Result<String, TaskError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskError::TitleRequired);
    }
    let len = trimmed.chars().count();
    if len > MAX_TITLE_LEN {
        return Err(TaskError::TitleTooLong(len));
    }
    Ok(trimmed.to_string())
}

fn validate_description(description: &str) -> Result<Option<String>, TaskError> {
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LEN {
        return Err(TaskError::DescriptionTooLong(len));
    }
    let trimmed = description.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// Validate and append a new task. Returns a copy of the stored task.
pub fn create_task(
    tasks: &mut Vec<Task>,
    draft: TaskDraft,
    defaults: &TaskDefaults,
    now: DateTime<Utc>,
) -> Result<Task, TaskError> {
    let title = validate_title(&draft.title)?;
    let description = match draft.description.as_deref() {
        Some(d) => validate_description(d)?,
        None => None,
    };

    let estimate_minutes = match draft.estimate_minutes {
        Some(m) if m > 0 => u32::try_from(m).unwrap_or(u32::MAX),
        _ => defaults.default_estimate,
    };

    let task_type = draft
        .task_type
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| defaults.default_type.clone());

    let task = Task {
        id: crate::ops::new_id(),
        title,
        description,
        completed: false,
        due_date: draft.due_date,
        task_type,
        tags: normalize_tags(draft.tags),
        estimate_minutes,
        scheduled_start: draft.scheduled_start.map(snap_to_quarter_hour),
        created_at: now,
        updated_at: now,
    };
    tracing::debug!(id = %task.id, "created task");
    tasks.push(task.clone());
    Ok(task)
}

/// Apply a partial update. A non-positive estimate keeps the previous one.
pub fn update_task(
    tasks: &mut [Task],
    task_id: &str,
    update: TaskUpdate,
    now: DateTime<Utc>,
) -> Result<Task, TaskError> {
    // Validate before touching the stored task
    let title = update.title.as_deref().map(validate_title).transpose()?;
    let description = update
        .description
        .as_deref()
        .map(validate_description)
        .transpose()?;

    let task = find_task_mut(tasks, task_id)?;
    if let Some(title) = title {
        task.title = title;
    }
    if let Some(description) = description {
        task.description = description;
    }
    if let Some(completed) = update.completed {
        task.completed = completed;
    }
    if let Some(due) = update.due_date {
        task.due_date = Some(due);
    }
    if let Some(task_type) = update.task_type {
        let trimmed = task_type.trim();
        if !trimmed.is_empty() {
            task.task_type = trimmed.to_string();
        }
    }
    if let Some(tags) = update.tags {
        task.tags = normalize_tags(tags);
    }
    if let Some(m) = update.estimate_minutes
        && m > 0
    {
        task.estimate_minutes = u32::try_from(m).unwrap_or(u32::MAX);
    }
    task.updated_at = now;
    Ok(task.clone())
}

/// Flip the completion flag. Returns the new state.
pub fn toggle_completion(tasks: &mut [Task], task_id: &str, now: DateTime<Utc>) -> Result<bool, TaskError> {
    let task = find_task_mut(tasks, task_id)?;
    task.completed = !task.completed;
    task.updated_at = now;
    Ok(task.completed)
}

/// Remove a task permanently, returning it
pub fn delete_task(tasks: &mut Vec<Task>, task_id: &str) -> Result<Task, TaskError> {
    let index = tasks
        .iter()
        .position(|t| t.id == task_id)
        .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
    Ok(tasks.remove(index))
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// Place a task on the planner. The start is snapped to the quarter-hour grid
/// and the snapped value is returned.
pub fn schedule_task(
    tasks: &mut [Task],
    task_id: &str,
    start: NaiveDateTime,
    now: DateTime<Utc>,
) -> Result<NaiveDateTime, TaskError> {
    let task = find_task_mut(tasks, task_id)?;
    let snapped = snap_to_quarter_hour(start);
    task.scheduled_start = Some(snapped);
    task.updated_at = now;
    Ok(snapped)
}

/// Move a task back to the backlog
pub fn unschedule_task(tasks: &mut [Task], task_id: &str, now: DateTime<Utc>) -> Result<(), TaskError> {
    let task = find_task_mut(tasks, task_id)?;
    task.scheduled_start = None;
    task.updated_at = now;
    Ok(())
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

pub fn find_task<'a>(tasks: &'a [Task], task_id: &str) -> Option<&'a Task> {
    tasks.iter().find(|t| t.id == task_id)
}

fn find_task_mut<'a>(tasks: &'a mut [Task], task_id: &str) -> Result<&'a mut Task, TaskError> {
    tasks
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or_else(|| TaskError::NotFound(task_id.to_string()))
}

pub fn filter_by_completion(tasks: &[Task], completed: bool) -> Vec<&Task> {
    tasks.iter().filter(|t| t.completed == completed).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn sample() -> Vec<Task> {
        let mut tasks = Vec::new();
        create_task(&mut tasks, draft("Write report"), &TaskDefaults::default(), now()).unwrap();
        tasks
    }

    #[test]
    fn create_trims_and_defaults() {
        let mut tasks = Vec::new();
        let d = TaskDraft {
            title: "  Plan sprint  ".into(),
            description: Some("   ".into()),
            tags: vec![" a ".into(), "".into(), "b".into()],
            estimate_minutes: Some(-5),
            ..Default::default()
        };
        let task = create_task(&mut tasks, d, &TaskDefaults::default(), now()).unwrap();
        assert_eq!(task.title, "Plan sprint");
        assert_eq!(task.description, None);
        assert_eq!(task.tags, vec!["a", "b"]);
        assert_eq!(task.estimate_minutes, 30);
        assert_eq!(task.task_type, "work");
        assert!(!task.completed);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0], task);
    }

    #[test]
    fn create_rejects_bad_titles() {
        let mut tasks = Vec::new();
        let defaults = TaskDefaults::default();
        assert_eq!(
            create_task(&mut tasks, draft("   "), &defaults, now()),
            Err(TaskError::TitleRequired)
        );
        let long = "x".repeat(201);
        assert_eq!(
            create_task(&mut tasks, draft(&long), &defaults, now()),
            Err(TaskError::TitleTooLong(201))
        );
        let exact = "é".repeat(200);
        assert!(create_task(&mut tasks, draft(&exact), &defaults, now()).is_ok());
    }

    #[test]
    fn create_rejects_long_description() {
        let mut tasks = Vec::new();
        let d = TaskDraft {
            title: "ok".into(),
            description: Some("d".repeat(1001)),
            ..Default::default()
        };
        assert_eq!(
            create_task(&mut tasks, d, &TaskDefaults::default(), now()),
            Err(TaskError::DescriptionTooLong(1001))
        );
        assert!(tasks.is_empty());
    }

    #[test]
    fn update_keeps_estimate_on_non_positive() {
        let mut tasks = sample();
        let id = tasks[0].id.clone();
        let update = TaskUpdate {
            estimate_minutes: Some(0),
            title: Some(" Renamed ".into()),
            ..Default::default()
        };
        let task = update_task(&mut tasks, &id, update, now()).unwrap();
        assert_eq!(task.estimate_minutes, 30);
        assert_eq!(task.title, "Renamed");

        let update = TaskUpdate {
            estimate_minutes: Some(90),
            ..Default::default()
        };
        assert_eq!(update_task(&mut tasks, &id, update, now()).unwrap().estimate_minutes, 90);
    }

    #[test]
    fn update_invalid_title_leaves_task_alone() {
        let mut tasks = sample();
        let id = tasks[0].id.clone();
        let update = TaskUpdate {
            title: Some("".into()),
            completed: Some(true),
            ..Default::default()
        };
        assert!(update_task(&mut tasks, &id, update, now()).is_err());
        assert_eq!(tasks[0].title, "Write report");
        assert!(!tasks[0].completed);
    }

    #[test]
    fn toggle_and_filter() {
        let mut tasks = sample();
        let id = tasks[0].id.clone();
        assert!(toggle_completion(&mut tasks, &id, now()).unwrap());
        assert_eq!(filter_by_completion(&tasks, true).len(), 1);
        assert!(!toggle_completion(&mut tasks, &id, now()).unwrap());
        assert_eq!(filter_by_completion(&tasks, false).len(), 1);
    }

    #[test]
    fn delete_missing_is_error() {
        let mut tasks = sample();
        assert_eq!(
            delete_task(&mut tasks, "nope"),
            Err(TaskError::NotFound("nope".into()))
        );
        let id = tasks[0].id.clone();
        assert_eq!(delete_task(&mut tasks, &id).unwrap().id, id);
        assert!(tasks.is_empty());
    }

    #[test]
    fn schedule_snaps_and_unschedule_clears() {
        let mut tasks = sample();
        let id = tasks[0].id.clone();
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let start = day.and_hms_opt(9, 8, 42).unwrap();
        let snapped = schedule_task(&mut tasks, &id, start, now()).unwrap();
        assert_eq!(snapped, day.and_hms_opt(9, 15, 0).unwrap());
        assert!(tasks[0].is_scheduled());
        unschedule_task(&mut tasks, &id, now()).unwrap();
        assert!(!tasks[0].is_scheduled());
    }
}
