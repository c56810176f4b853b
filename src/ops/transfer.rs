//! Idea export/import in the portable name-based format.
//!
//! Exported records refer to their parent by name, not id, so a file can be
//! imported into another workspace.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::config::LayoutConfig;
use crate::model::idea::{Idea, Placement};
use crate::ops::layout::next_free_position;

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid import file: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("idea at position {0} has an empty name")]
    EmptyName(usize),
    #[error("could not import {0} ideas: invalid parent references")]
    UnresolvedParents(usize),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IdeaExport {
    pub ideas: Vec<ExportedIdea>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedIdea {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
}

pub fn export_ideas(ideas: &[Idea]) -> IdeaExport {
    let names: HashMap<&str, &str> = ideas.iter().map(|i| (i.id.as_str(), i.name.as_str())).collect();
    IdeaExport {
        ideas: ideas
            .iter()
            .map(|idea| ExportedIdea {
                name: idea.name.clone(),
                description: idea.description.clone(),
                topic: idea.topic.clone(),
                parent_name: idea
                    .parent_id
                    .as_deref()
                    .and_then(|p| names.get(p))
                    .map(|n| n.to_string()),
            })
            .collect(),
    }
}

/// Parse an export file and append its ideas to `existing`.
///
/// Roots are created first, each pinned one slot to the right of everything
/// placed so far. Nested records are then resolved in passes until a pass
/// makes no progress; they are left to automatic layout. Parent names refer
/// to records of the same file. Nothing is appended when any record cannot
/// be resolved. Returns the number of ideas imported.
pub fn import_ideas(
    json: &str,
    existing: &mut Vec<Idea>,
    settings: &LayoutConfig,
    now: DateTime<Utc>,
) -> Result<usize, TransferError> {
    let export: IdeaExport = serde_json::from_str(json)?;
    if let Some(pos) = export.ideas.iter().position(|r| r.name.trim().is_empty()) {
        return Err(TransferError::EmptyName(pos));
    }

    let mut merged = existing.clone();
    let mut name_to_id: HashMap<String, String> = HashMap::new();

    let (roots, mut pending): (Vec<&ExportedIdea>, Vec<&ExportedIdea>) =
        export.ideas.iter().partition(|r| r.parent_name.is_none());

    for record in roots {
        let (x, y) = next_free_position(&merged, settings);
        let idea = materialize(record, None, Placement::Pinned { x, y }, now);
        name_to_id.insert(record.name.clone(), idea.id.clone());
        merged.push(idea);
    }

    while !pending.is_empty() {
        let before = pending.len();
        let mut still_pending = Vec::new();
        for record in pending {
            let parent_id = record
                .parent_name
                .as_deref()
                .and_then(|name| name_to_id.get(name))
                .cloned();
            match parent_id {
                Some(parent_id) => {
                    let idea = materialize(record, Some(parent_id), Placement::Auto, now);
                    name_to_id.insert(record.name.clone(), idea.id.clone());
                    merged.push(idea);
                }
                None => still_pending.push(record),
            }
        }
        pending = still_pending;
        if pending.len() == before {
            tracing::warn!(count = pending.len(), "ideas with unresolvable parent names");
            return Err(TransferError::UnresolvedParents(pending.len()));
        }
    }

    let imported = merged.len() - existing.len();
    *existing = merged;
    tracing::debug!(imported, "imported ideas");
    Ok(imported)
}

fn materialize(record: &ExportedIdea, parent_id: Option<String>, placement: Placement, now: DateTime<Utc>) -> Idea {
    let clean = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Idea {
        id: crate::ops::new_id(),
        name: record.name.trim().to_string(),
        description: clean(&record.description),
        topic: clean(&record.topic),
        parent_id,
        placement,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn by_name<'a>(ideas: &'a [Idea], name: &str) -> &'a Idea {
        ideas.iter().find(|i| i.name == name).unwrap()
    }

    #[test]
    fn export_uses_parent_names() {
        let ideas = vec![
            Idea::new("1", "Music", now()),
            Idea::new("2", "Guitar", now()).with_parent("1"),
            Idea::new("3", "Lost", now()).with_parent("gone"),
        ];
        let json = serde_json::to_string(&export_ideas(&ideas)).unwrap();
        assert_eq!(
            json,
            r#"{"ideas":[{"name":"Music"},{"name":"Guitar","parentName":"Music"},{"name":"Lost"}]}"#
        );
    }

    #[test]
    fn import_places_roots_and_nests_children() {
        let json = r#"{"ideas":[
            {"name":"Grandchild","parentName":"Child"},
            {"name":"Child","parentName":"Root"},
            {"name":"Root","topic":"music"},
            {"name":"Other"}
        ]}"#;
        let mut ideas = Vec::new();
        let count = import_ideas(json, &mut ideas, &LayoutConfig::default(), now()).unwrap();
        assert_eq!(count, 4);

        let root = by_name(&ideas, "Root");
        assert_eq!(root.placement, Placement::Pinned { x: 50.0, y: 50.0 });
        assert_eq!(root.topic.as_deref(), Some("music"));
        // Second root lands one slot to the right of the first
        assert_eq!(by_name(&ideas, "Other").placement, Placement::Pinned { x: 600.0, y: 50.0 });

        let child = by_name(&ideas, "Child");
        assert_eq!(child.parent_id.as_deref(), Some(root.id.as_str()));
        assert_eq!(child.placement, Placement::Auto);
        assert_eq!(
            by_name(&ideas, "Grandchild").parent_id.as_deref(),
            Some(child.id.as_str())
        );
    }

    #[test]
    fn import_appends_after_existing_pins() {
        let mut ideas = vec![Idea::new("e", "Existing", now()).pinned_at(400.0, 80.0)];
        import_ideas(r#"{"ideas":[{"name":"New"}]}"#, &mut ideas, &LayoutConfig::default(), now()).unwrap();
        assert_eq!(
            by_name(&ideas, "New").placement,
            Placement::Pinned { x: 950.0, y: 50.0 }
        );
    }

    #[test]
    fn import_into_non_empty_map_keeps_assigned_spot() {
        let mut ideas = vec![Idea::new("e", "Existing", now())];
        import_ideas(r#"{"ideas":[{"name":"Imp"}]}"#, &mut ideas, &LayoutConfig::default(), now()).unwrap();
        let imported = by_name(&ideas, "Imp");
        assert_eq!(imported.placement, Placement::Pinned { x: 350.0, y: 50.0 });

        let layout = crate::ops::layout::calculate_layout(&ideas, &LayoutConfig::default());
        assert_eq!((layout[&imported.id].x, layout[&imported.id].y), (350.0, 50.0));
        assert_eq!(layout["e"].x, 50.0);
    }

    #[test]
    fn unresolved_parent_imports_nothing() {
        let json = r#"{"ideas":[{"name":"A"},{"name":"B","parentName":"Nope"},{"name":"C","parentName":"B"}]}"#;
        let mut ideas = Vec::new();
        let err = import_ideas(json, &mut ideas, &LayoutConfig::default(), now()).unwrap_err();
        assert!(matches!(err, TransferError::UnresolvedParents(2)));
        assert!(ideas.is_empty());
    }

    #[test]
    fn malformed_files_rejected() {
        let mut ideas = Vec::new();
        let settings = LayoutConfig::default();
        assert!(matches!(
            import_ideas("{}", &mut ideas, &settings, now()),
            Err(TransferError::InvalidJson(_))
        ));
        assert!(matches!(
            import_ideas(r#"{"ideas":[{"name":" "}]}"#, &mut ideas, &settings, now()),
            Err(TransferError::EmptyName(0))
        ));
    }
}
