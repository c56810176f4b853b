use chrono::{DateTime, Utc};

use crate::model::idea::{Idea, IdeaDraft, IdeaUpdate, Placement};
use crate::ops::hierarchy;

/// Error type for idea operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdeaError {
    #[error("idea not found: {0}")]
    NotFound(String),
    #[error("idea name is required")]
    NameRequired,
    #[error("parent idea not found: {0}")]
    ParentNotFound(String),
    #[error("cannot move {idea} under {parent}: it would become its own ancestor")]
    CircularReference { idea: String, parent: String },
}

fn trimmed_opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validate and append a new idea. Returns a copy of the stored idea.
pub fn create_idea(ideas: &mut Vec<Idea>, draft: IdeaDraft, now: DateTime<Utc>) -> Result<Idea, IdeaError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(IdeaError::NameRequired);
    }
    if let Some(parent) = &draft.parent_id
        && !ideas.iter().any(|i| &i.id == parent)
    {
        return Err(IdeaError::ParentNotFound(parent.clone()));
    }

    let idea = Idea {
        id: crate::ops::new_id(),
        name: name.to_string(),
        description: trimmed_opt(draft.description),
        topic: trimmed_opt(draft.topic),
        parent_id: draft.parent_id,
        placement: draft.placement,
        created_at: now,
        updated_at: now,
    };
    ideas.push(idea.clone());
    Ok(idea)
}

/// Update name, description and/or topic
pub fn update_idea(
    ideas: &mut [Idea],
    idea_id: &str,
    update: IdeaUpdate,
    now: DateTime<Utc>,
) -> Result<Idea, IdeaError> {
    let name = match update.name.as_deref().map(str::trim) {
        Some("") => return Err(IdeaError::NameRequired),
        other => other.map(str::to_string),
    };
    let idea = find_idea_mut(ideas, idea_id)?;
    if let Some(name) = name {
        idea.name = name;
    }
    if update.description.is_some() {
        idea.description = trimmed_opt(update.description);
    }
    if update.topic.is_some() {
        idea.topic = trimmed_opt(update.topic);
    }
    idea.updated_at = now;
    Ok(idea.clone())
}

/// Reparent an idea (or move it to the root with `None`).
///
/// The cycle check runs over the whole `ideas` slice, which must be the
/// complete collection.
pub fn move_idea(
    ideas: &mut [Idea],
    idea_id: &str,
    new_parent_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Idea, IdeaError> {
    if !ideas.iter().any(|i| i.id == idea_id) {
        return Err(IdeaError::NotFound(idea_id.to_string()));
    }
    if let Some(parent) = new_parent_id {
        if hierarchy::would_create_circular_reference(idea_id, Some(parent), ideas) {
            return Err(IdeaError::CircularReference {
                idea: idea_id.to_string(),
                parent: parent.to_string(),
            });
        }
        if !ideas.iter().any(|i| i.id == parent) {
            return Err(IdeaError::ParentNotFound(parent.to_string()));
        }
    }

    let idea = find_idea_mut(ideas, idea_id)?;
    idea.parent_id = new_parent_id.map(str::to_string);
    idea.updated_at = now;
    Ok(idea.clone())
}

/// Record an explicit position (the end of a drag)
pub fn pin_idea(ideas: &mut [Idea], idea_id: &str, x: f64, y: f64, now: DateTime<Utc>) -> Result<Idea, IdeaError> {
    let idea = find_idea_mut(ideas, idea_id)?;
    idea.placement = Placement::Pinned { x, y };
    idea.updated_at = now;
    Ok(idea.clone())
}

/// Hand an idea back to automatic layout
pub fn unpin_idea(ideas: &mut [Idea], idea_id: &str, now: DateTime<Utc>) -> Result<Idea, IdeaError> {
    let idea = find_idea_mut(ideas, idea_id)?;
    idea.placement = Placement::Auto;
    idea.updated_at = now;
    Ok(idea.clone())
}

/// Delete an idea and its whole subtree. Returns the removed ids,
/// descendants first.
pub fn delete_idea(ideas: &mut Vec<Idea>, idea_id: &str) -> Result<Vec<String>, IdeaError> {
    if !ideas.iter().any(|i| i.id == idea_id) {
        return Err(IdeaError::NotFound(idea_id.to_string()));
    }
    let doomed = hierarchy::cascade_ids(idea_id, ideas);
    ideas.retain(|i| !doomed.contains(&i.id));
    tracing::debug!(id = idea_id, removed = doomed.len(), "deleted idea subtree");
    Ok(doomed)
}

pub fn find_idea<'a>(ideas: &'a [Idea], idea_id: &str) -> Option<&'a Idea> {
    ideas.iter().find(|i| i.id == idea_id)
}

fn find_idea_mut<'a>(ideas: &'a mut [Idea], idea_id: &str) -> Result<&'a mut Idea, IdeaError> {
    ideas
        .iter_mut()
        .find(|i| i.id == idea_id)
        .ok_or_else(|| IdeaError::NotFound(idea_id.to_string()))
}

/// Ideas carrying `topic` (case-insensitive)
pub fn filter_by_topic<'a>(ideas: &'a [Idea], topic: &str) -> Vec<&'a Idea> {
    let wanted = topic.trim().to_lowercase();
    ideas
        .iter()
        .filter(|i| i.topic.as_deref().is_some_and(|t| t.to_lowercase() == wanted))
        .collect()
}
