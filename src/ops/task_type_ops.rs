use chrono::{DateTime, Utc};

use crate::model::task_type::{DEFAULT_TASK_TYPES, TaskType};

/// Error type for task type operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskTypeError {
    #[error("task type not found: {0}")]
    NotFound(String),
    #[error("task type with name \"{0}\" already exists")]
    DuplicateName(String),
    #[error("task type name is required")]
    NameRequired,
    #[error("invalid color {0:?}: expected #RRGGBB")]
    InvalidColor(String),
    #[error("cannot modify default task type {0}")]
    DefaultProtected(String),
}

/// The predefined types, with stable `default-<name>` ids
pub fn seed_defaults(now: DateTime<Utc>) -> Vec<TaskType> {
    DEFAULT_TASK_TYPES
        .iter()
        .map(|&(name, color)| TaskType {
            id: format!("default-{}", name),
            name: name.to_string(),
            color: color.to_string(),
            is_default: true,
            created_at: now,
            updated_at: now,
        })
        .collect()
}

/// Case-insensitive lookup by name
pub fn find_by_name<'a>(types: &'a [TaskType], name: &str) -> Option<&'a TaskType> {
    types.iter().find(|t| t.matches_name(name))
}

pub fn find_by_id<'a>(types: &'a [TaskType], id: &str) -> Option<&'a TaskType> {
    types.iter().find(|t| t.id == id)
}

/// Accepts `#RRGGBB` (either case); returns it upper-cased
fn validate_color(color: &str) -> Result<String, TaskTypeError> {
    let c = color.trim();
    let valid = c.len() == 7
        && c.starts_with('#')
        && c[1..].chars().all(|ch| ch.is_ascii_hexdigit());
    if !valid {
        return Err(TaskTypeError::InvalidColor(color.to_string()));
    }
    Ok(c.to_uppercase())
}

fn validate_name(name: &str) -> Result<String, TaskTypeError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TaskTypeError::NameRequired);
    }
    Ok(trimmed.to_string())
}

pub fn create_task_type(
    types: &mut Vec<TaskType>,
    name: &str,
    color: &str,
    now: DateTime<Utc>,
) -> Result<TaskType, TaskTypeError> {
    let name = validate_name(name)?;
    if find_by_name(types, &name).is_some() {
        return Err(TaskTypeError::DuplicateName(name));
    }
    let color = validate_color(color)?;
    let task_type = TaskType {
        id: crate::ops::new_id(),
        name,
        color,
        is_default: false,
        created_at: now,
        updated_at: now,
    };
    types.push(task_type.clone());
    Ok(task_type)
}

/// Rename and/or recolor a user-defined type
pub fn update_task_type(
    types: &mut [TaskType],
    id: &str,
    name: Option<&str>,
    color: Option<&str>,
    now: DateTime<Utc>,
) -> Result<TaskType, TaskTypeError> {
    let index = types
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| TaskTypeError::NotFound(id.to_string()))?;
    if types[index].is_default {
        return Err(TaskTypeError::DefaultProtected(types[index].name.clone()));
    }

    let name = name.map(validate_name).transpose()?;
    if let Some(name) = &name
        && types
            .iter()
            .enumerate()
            .any(|(i, t)| i != index && t.matches_name(name))
    {
        return Err(TaskTypeError::DuplicateName(name.clone()));
    }
    let color = color.map(validate_color).transpose()?;

    let task_type = &mut types[index];
    if let Some(name) = name {
        task_type.name = name;
    }
    if let Some(color) = color {
        task_type.color = color;
    }
    task_type.updated_at = now;
    Ok(task_type.clone())
}

pub fn delete_task_type(types: &mut Vec<TaskType>, id: &str) -> Result<TaskType, TaskTypeError> {
    let index = types
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| TaskTypeError::NotFound(id.to_string()))?;
    if types[index].is_default {
        return Err(TaskTypeError::DefaultProtected(types[index].name.clone()));
    }
    Ok(types.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn defaults_are_seeded_with_stable_ids() {
        let types = seed_defaults(now());
        let ids: Vec<&str> = types.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["default-work", "default-yt", "default-learn", "default-code"]);
        assert!(types.iter().all(|t| t.is_default));
    }

    #[test]
    fn names_are_unique_case_insensitively() {
        let mut types = seed_defaults(now());
        assert_eq!(
            create_task_type(&mut types, "WORK", "#000000", now()),
            Err(TaskTypeError::DuplicateName("WORK".into()))
        );
        let created = create_task_type(&mut types, " Errands ", "#a1b2c3", now()).unwrap();
        assert_eq!(created.name, "Errands");
        assert_eq!(created.color, "#A1B2C3");
        assert!(find_by_name(&types, "errands").is_some());
    }

    #[test]
    fn rejects_bad_color() {
        let mut types = Vec::new();
        assert!(matches!(
            create_task_type(&mut types, "x", "blue", now()),
            Err(TaskTypeError::InvalidColor(_))
        ));
        assert!(matches!(
            create_task_type(&mut types, "x", "#12345G", now()),
            Err(TaskTypeError::InvalidColor(_))
        ));
    }

    #[test]
    fn defaults_cannot_be_edited_or_deleted() {
        let mut types = seed_defaults(now());
        assert_eq!(
            update_task_type(&mut types, "default-yt", Some("video"), None, now()),
            Err(TaskTypeError::DefaultProtected("yt".into()))
        );
        assert_eq!(
            delete_task_type(&mut types, "default-code"),
            Err(TaskTypeError::DefaultProtected("code".into()))
        );
        assert_eq!(types.len(), 4);
    }

    #[test]
    fn update_checks_other_names_only() {
        let mut types = seed_defaults(now());
        let custom = create_task_type(&mut types, "Gym", "#111111", now()).unwrap();
        // Same name, different case: allowed (it is itself)
        let renamed = update_task_type(&mut types, &custom.id, Some("gym"), None, now()).unwrap();
        assert_eq!(renamed.name, "gym");
        assert_eq!(
            update_task_type(&mut types, &custom.id, Some("Learn"), None, now()),
            Err(TaskTypeError::DuplicateName("Learn".into()))
        );
        let recolored = update_task_type(&mut types, &custom.id, None, Some("#ffffff"), now()).unwrap();
        assert_eq!(recolored.color, "#FFFFFF");
    }

    #[test]
    fn delete_custom_type() {
        let mut types = seed_defaults(now());
        let custom = create_task_type(&mut types, "Gym", "#111111", now()).unwrap();
        assert_eq!(delete_task_type(&mut types, &custom.id).unwrap().name, "Gym");
        assert_eq!(
            delete_task_type(&mut types, &custom.id),
            Err(TaskTypeError::NotFound(custom.id.clone()))
        );
    }
}
