//! Domain entities (characters, locations) as seen by the graph editor.
//!
//! The editor never owns entities. It reads them from an [`EntitySource`]
//! and mirrors their display fields onto entity-backed nodes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityItemKind {
    Folder,
    Item,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub color_token: Option<String>,
    pub kind: EntityItemKind,
}

impl Entity {
    pub fn item(id: impl Into<String>, name: impl Into<String>) -> Self {
        Entity {
            id: id.into(),
            name: name.into(),
            image: None,
            color_token: None,
            kind: EntityItemKind::Item,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntityItemKind::Folder
    }
}

/// Describes which entity domain an editor instance serves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityKind {
    /// Routed with detail-modal requests (`"character"`, `"location"`).
    pub tag: String,
    /// Node id prefix for entity-backed nodes (`"char"`, `"loc"`).
    pub id_prefix: String,
    #[serde(default)]
    pub color_map: HashMap<String, String>,
    pub default_color: String,
}

impl EntityKind {
    pub fn characters() -> Self {
        EntityKind {
            tag: "character".to_string(),
            id_prefix: "char".to_string(),
            color_map: default_palette(),
            default_color: "#64748b".to_string(),
        }
    }

    pub fn locations() -> Self {
        EntityKind {
            tag: "location".to_string(),
            id_prefix: "loc".to_string(),
            color_map: default_palette(),
            default_color: "#0f766e".to_string(),
        }
    }

    pub fn node_id(&self, entity_id: &str) -> String {
        format!("{}-{}", self.id_prefix, entity_id)
    }

    /// Inverse of [`EntityKind::node_id`].
    pub fn entity_id_of<'a>(&self, node_id: &'a str) -> Option<&'a str> {
        node_id.strip_prefix(self.id_prefix.as_str())?.strip_prefix('-')
    }

    pub fn border_color(&self, entity: &Entity) -> String {
        entity
            .color_token
            .as_ref()
            .and_then(|t| self.color_map.get(t))
            .cloned()
            .unwrap_or_else(|| self.default_color.clone())
    }
}

fn default_palette() -> HashMap<String, String> {
    [
        ("red", "#ef4444"),
        ("orange", "#f97316"),
        ("amber", "#f59e0b"),
        ("green", "#22c55e"),
        ("teal", "#14b8a6"),
        ("blue", "#3b82f6"),
        ("indigo", "#6366f1"),
        ("purple", "#a855f7"),
        ("pink", "#ec4899"),
        ("gray", "#6b7280"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Read side of a character/location store.
pub trait EntitySource {
    fn list(&self, project_id: &str) -> Vec<Entity>;
}

impl EntitySource for Vec<Entity> {
    fn list(&self, _project_id: &str) -> Vec<Entity> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_round_trip() {
        let k = EntityKind::locations();
        let id = k.node_id("42");
        assert_eq!(id, "loc-42");
        assert_eq!(k.entity_id_of(&id), Some("42"));
        assert_eq!(k.entity_id_of("char-42"), None);
        assert_eq!(k.entity_id_of("locx-42"), None);
    }

    #[test]
    fn border_color_falls_back_to_default() {
        let k = EntityKind::characters();
        let mut e = Entity::item("1", "Ada");
        assert_eq!(k.border_color(&e), "#64748b");
        e.color_token = Some("blue".to_string());
        assert_eq!(k.border_color(&e), "#3b82f6");
        e.color_token = Some("no-such-token".to_string());
        assert_eq!(k.border_color(&e), "#64748b");
    }
}
