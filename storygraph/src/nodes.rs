//! Display-time projections of the document.
//!
//! Views are rebuilt from the store on every render and hold no state of
//! their own. Node components report back through store operations keyed by
//! node id; they never mutate the document directly.

use crate::document::Document;
use crate::entity::EntityKind;
use crate::geometry::math::{Point, Size};
use crate::model::{EdgeId, GraphNode, NodeId, NodeKind, NodePatch, NodeStyle};
use crate::routing;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Point,
    pub size: Size,
    pub z_index: i32,
    pub selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub style: NodeStyle,
    /// Only rect nodes grow resize handles, and only while selected.
    pub resizable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityCard>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeView {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    /// SVG path data.
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub label_position: Point,
    pub color: String,
    pub stroke_width: f64,
    pub arrow: bool,
    pub selected: bool,
}

/// Fixed-size card for an entity-backed node. The same card serves every
/// entity kind; `kind_tag` says which detail view a click should open.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCard {
    pub entity_id: String,
    pub kind_tag: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub border_color: String,
}

/// Emitted by a primary click on an entity card. The click must not reach
/// the pane underneath.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySelect {
    pub entity_id: String,
    pub kind_tag: String,
    pub stop_propagation: bool,
}

impl EntityCard {
    pub fn from_node(node: &GraphNode, kind: &EntityKind) -> Option<EntityCard> {
        if !node.is_entity() {
            return None;
        }
        let entity_id = node
            .entity_ref
            .clone()
            .or_else(|| kind.entity_id_of(&node.id).map(str::to_string))?;
        Some(EntityCard {
            entity_id,
            kind_tag: kind.tag.clone(),
            label: node.label.clone().unwrap_or_default(),
            image: node.image.clone(),
            border_color: node.style.border_color.clone().unwrap_or_else(|| kind.default_color.clone()),
        })
    }

    pub fn on_primary_click(&self) -> EntitySelect {
        EntitySelect { entity_id: self.entity_id.clone(), kind_tag: self.kind_tag.clone(), stop_propagation: true }
    }
}

pub fn node_view(node: &GraphNode, kind: &EntityKind) -> NodeView {
    NodeView {
        id: node.id.clone(),
        kind: node.kind,
        position: node.position,
        size: node.effective_size(),
        z_index: node.z_index,
        selected: node.selected,
        label: node.label.clone(),
        image: node.image.clone(),
        style: node.style.clone(),
        resizable: node.kind == NodeKind::Rect && node.selected,
        entity: EntityCard::from_node(node, kind),
    }
}

/// Nodes in paint order (z-index, then insertion order).
pub fn node_views(doc: &Document, kind: &EntityKind) -> Vec<NodeView> {
    let mut out: Vec<NodeView> = doc.nodes.iter().map(|n| node_view(n, kind)).collect();
    out.sort_by_key(|v| v.z_index);
    out
}

pub fn edge_views(doc: &Document) -> Vec<EdgeView> {
    doc.edges
        .iter()
        .filter_map(|e| {
            let (path, label_position) = routing::resolve_edge(doc, e)?;
            Some(EdgeView {
                id: e.id.clone(),
                source: e.source.clone(),
                target: e.target.clone(),
                path: path.to_svg(),
                label: e.label.clone(),
                label_position,
                color: e.color.clone(),
                stroke_width: e.stroke_width,
                arrow: e.arrow,
                selected: e.selected,
            })
        })
        .collect()
}

/// Inline label editor opened by double-clicking a rect or text node.
#[derive(Clone, Debug, PartialEq)]
pub struct InlineEdit {
    node_id: NodeId,
    kind: NodeKind,
    original: String,
    draft: String,
}

impl InlineEdit {
    pub fn begin(node: &GraphNode) -> Option<InlineEdit> {
        if !matches!(node.kind, NodeKind::Rect | NodeKind::Text) {
            return None;
        }
        let text = node.label.clone().unwrap_or_default();
        Some(InlineEdit { node_id: node.id.clone(), kind: node.kind, original: text.clone(), draft: text })
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Rect labels are single-line, so Enter always commits. Text nodes are
    /// multi-line: Shift+Enter inserts a newline instead.
    pub fn enter_commits(&self, shift: bool) -> bool {
        match self.kind {
            NodeKind::Text => !shift,
            _ => true,
        }
    }

    /// The patch to apply, or `None` when the label did not change.
    pub fn commit(self) -> Option<(NodeId, NodePatch)> {
        if self.draft == self.original {
            return None;
        }
        Some((self.node_id, NodePatch::label(self.draft)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_click_stops_propagation() {
        let kind = EntityKind::characters();
        let mut n = GraphNode::new("char-42", NodeKind::Entity, Point::new(0.0, 0.0));
        n.label = Some("Mara".into());
        let card = EntityCard::from_node(&n, &kind).unwrap();
        assert_eq!(card.entity_id, "42");
        let ev = card.on_primary_click();
        assert!(ev.stop_propagation);
        assert_eq!(ev.kind_tag, "character");
    }

    #[test]
    fn freeform_nodes_have_no_card() {
        let kind = EntityKind::locations();
        let n = GraphNode::new("rect-1", NodeKind::Rect, Point::new(0.0, 0.0));
        assert!(EntityCard::from_node(&n, &kind).is_none());
        assert!(!node_view(&n, &kind).resizable);
    }

    #[test]
    fn unchanged_edit_commits_nothing() {
        let mut n = GraphNode::new("rect-1", NodeKind::Rect, Point::new(0.0, 0.0));
        n.label = Some("Gate".into());
        let mut edit = InlineEdit::begin(&n).unwrap();
        edit.set_draft("Gate");
        assert_eq!(edit.commit(), None);

        let mut edit = InlineEdit::begin(&n).unwrap();
        edit.set_draft("North gate");
        let (id, patch) = edit.commit().unwrap();
        assert_eq!(id, "rect-1");
        assert_eq!(patch.label.as_deref(), Some("North gate"));
    }

    #[test]
    fn anchors_are_not_editable() {
        let n = GraphNode::new("anchor-1", NodeKind::Anchor, Point::new(0.0, 0.0));
        assert!(InlineEdit::begin(&n).is_none());
    }

    #[test]
    fn multiline_text_keeps_shift_enter() {
        let n = GraphNode::new("text-1", NodeKind::Text, Point::new(0.0, 0.0));
        let edit = InlineEdit::begin(&n).unwrap();
        assert!(!edit.enter_commits(true));
        assert!(edit.enter_commits(false));
    }
}
