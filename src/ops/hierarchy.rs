//! Parent/child traversal over ideas: descendant sets, the reparent guard,
//! and the id list for cascading deletes.
//!
//! Every walk carries a visited set, so stored data that already contains a
//! parent cycle still terminates.

use std::collections::{HashMap, HashSet};

use crate::model::idea::Idea;

/// Map from parent id to the ids of its direct children, in input order
fn children_index(ideas: &[Idea]) -> HashMap<&str, Vec<&str>> {
    let mut index: HashMap<&str, Vec<&str>> = HashMap::new();
    for idea in ideas {
        if let Some(parent) = idea.parent_id.as_deref() {
            index.entry(parent).or_default().push(idea.id.as_str());
        }
    }
    index
}

/// All transitive descendants of `id`, depth-first (children before their
/// own descendants, siblings in input order). `id` itself is never included.
pub fn descendants(id: &str, ideas: &[Idea]) -> Vec<String> {
    let index = children_index(ideas);
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(id);
    let mut out = Vec::new();
    collect(id, &index, &mut visited, &mut out);
    out
}

fn collect<'a>(
    id: &str,
    index: &HashMap<&str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    out: &mut Vec<String>,
) {
    let Some(children) = index.get(id) else {
        return;
    };
    for &child in children {
        if !visited.insert(child) {
            continue;
        }
        out.push(child.to_string());
        collect(child, index, visited, out);
    }
}

/// Whether making `new_parent_id` the parent of `idea_id` would create a cycle.
///
/// Moving to the root (`None`) is always allowed. Pass the complete idea
/// collection: a filtered view can hide the descendant that closes the loop.
pub fn would_create_circular_reference(
    idea_id: &str,
    new_parent_id: Option<&str>,
    ideas: &[Idea],
) -> bool {
    let Some(new_parent_id) = new_parent_id else {
        return false;
    };
    if idea_id == new_parent_id {
        return true;
    }
    descendants(idea_id, ideas)
        .iter()
        .any(|d| d == new_parent_id)
}

/// Ids removed when deleting `id`: every descendant, then `id` itself
pub fn cascade_ids(id: &str, ideas: &[Idea]) -> Vec<String> {
    let mut ids = descendants(id, ideas);
    ids.push(id.to_string());
    ids
}

/// Ancestor chain of `id`, nearest first. Stops at a root, at a dangling
/// parent reference, or when a cycle is detected.
pub fn ancestors(id: &str, ideas: &[Idea]) -> Vec<String> {
    let by_id: HashMap<&str, &Idea> = ideas.iter().map(|i| (i.id.as_str(), i)).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(id);
    let mut out = Vec::new();
    let mut current = by_id.get(id).and_then(|i| i.parent_id.as_deref());
    while let Some(parent) = current {
        let Some(idea) = by_id.get(parent) else {
            break;
        };
        if !seen.insert(idea.id.as_str()) {
            tracing::warn!(id, "parent cycle detected while walking ancestors");
            break;
        }
        out.push(idea.id.clone());
        current = idea.parent_id.as_deref();
    }
    out
}
