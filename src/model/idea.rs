use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an idea sits on the mind map.
///
/// `Auto` lets the layout engine place the node; `Pinned` is an explicit
/// position left behind by a user drag.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    #[default]
    Auto,
    Pinned { x: f64, y: f64 },
}

impl Placement {
    pub fn pinned(self) -> Option<(f64, f64)> {
        match self {
            Placement::Auto => None,
            Placement::Pinned { x, y } => Some((x, y)),
        }
    }

    pub fn is_pinned(self) -> bool {
        matches!(self, Placement::Pinned { .. })
    }
}

/// A node of the mind map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-text grouping label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub placement: Placement,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Idea {
    /// Build an unparented, auto-placed idea. Mostly useful for tests and import.
    pub fn new(id: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Idea {
            id: id.into(),
            name: name.into(),
            description: None,
            topic: None,
            parent_id: None,
            placement: Placement::Auto,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn pinned_at(mut self, x: f64, y: f64) -> Self {
        self.placement = Placement::Pinned { x, y };
        self
    }
}

/// Fields accepted when creating an idea
#[derive(Debug, Clone, Default)]
pub struct IdeaDraft {
    pub name: String,
    pub description: Option<String>,
    pub topic: Option<String>,
    pub parent_id: Option<String>,
    pub placement: Placement,
}

/// Partial text update; `None` leaves a field untouched, `Some("")` clears it
#[derive(Debug, Clone, Default)]
pub struct IdeaUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub topic: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_serde_shape() {
        let auto = serde_json::to_string(&Placement::Auto).unwrap();
        assert_eq!(auto, r#""auto""#);
        let pinned = serde_json::to_string(&Placement::Pinned { x: 10.0, y: 20.5 }).unwrap();
        assert_eq!(pinned, r#"{"pinned":{"x":10.0,"y":20.5}}"#);
    }

    #[test]
    fn missing_placement_is_auto() {
        let json = r#"{"id":"a","name":"X","createdAt":"2025-01-01T00:00:00Z","updatedAt":"2025-01-01T00:00:00Z"}"#;
        let idea: Idea = serde_json::from_str(json).unwrap();
        assert_eq!(idea.placement, Placement::Auto);
        assert!(idea.parent_id.is_none());
    }
}
