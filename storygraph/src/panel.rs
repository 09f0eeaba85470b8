//! Properties panel: read the single selected element, dispatch edits.

use crate::clock::Clock;
use crate::document::Document;
use crate::model::{EdgeEnd, EdgeId, EdgePatch, NodeId, NodeKind, NodePatch};
use crate::repository::PatternRepository;
use crate::store::GraphStore;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PanelView {
    #[serde(rename_all = "camelCase")]
    Rect {
        id: NodeId,
        label: String,
        border_color: Option<String>,
        background: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        id: NodeId,
        label: String,
        color: Option<String>,
        font_size: Option<f64>,
        font_weight: Option<u16>,
    },
    #[serde(rename_all = "camelCase")]
    Edge {
        id: EdgeId,
        label: String,
        arrow: bool,
        color: String,
        stroke_width: f64,
        /// Present only when that endpoint is an entity node.
        can_disconnect_source: bool,
        can_disconnect_target: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "camelCase")]
pub enum PanelAction {
    Label(String),
    BorderColor(String),
    Background(String),
    Color(String),
    FontSize(f64),
    FontWeight(u16),
    Arrow(bool),
    StrokeWidth(f64),
    Reverse,
    Disconnect(EdgeEnd),
}

/// What the panel shows for the current selection. Nothing unless exactly
/// one element is selected, and entity nodes (edited in their own detail
/// view) and anchors have no fields.
pub fn view(doc: &Document) -> Option<PanelView> {
    let nodes: Vec<_> = doc.nodes.iter().filter(|n| n.selected).collect();
    let edges: Vec<_> = doc.edges.iter().filter(|e| e.selected).collect();
    if nodes.len() + edges.len() != 1 {
        return None;
    }
    if let Some(n) = nodes.first() {
        let label = n.label.clone().unwrap_or_default();
        return match n.kind {
            NodeKind::Rect => Some(PanelView::Rect {
                id: n.id.clone(),
                label,
                border_color: n.style.border_color.clone(),
                background: n.style.background.clone(),
            }),
            NodeKind::Text => Some(PanelView::Text {
                id: n.id.clone(),
                label,
                color: n.style.color.clone(),
                font_size: n.style.font_size,
                font_weight: n.style.font_weight,
            }),
            NodeKind::Entity | NodeKind::Anchor => None,
        };
    }
    let e = edges.first()?;
    let is_entity = |id: &str| doc.node_kind(id) == Some(NodeKind::Entity);
    Some(PanelView::Edge {
        id: e.id.clone(),
        label: e.label.clone().unwrap_or_default(),
        arrow: e.arrow,
        color: e.color.clone(),
        stroke_width: e.stroke_width,
        can_disconnect_source: is_entity(&e.source),
        can_disconnect_target: is_entity(&e.target),
    })
}

/// Applies `action` to the selected element right away. Actions that do
/// not fit the current view are ignored.
pub fn dispatch<R: PatternRepository, C: Clock>(store: &mut GraphStore<R, C>, action: PanelAction) -> bool {
    let Some(current) = view(store.doc()) else { return false };
    match (current, action) {
        (PanelView::Rect { id, .. } | PanelView::Text { id, .. }, action) => {
            let patch = match action {
                PanelAction::Label(v) => NodePatch { label: Some(v), ..Default::default() },
                PanelAction::BorderColor(v) => NodePatch { border_color: Some(v), ..Default::default() },
                PanelAction::Background(v) => NodePatch { background: Some(v), ..Default::default() },
                PanelAction::Color(v) => NodePatch { color: Some(v), ..Default::default() },
                PanelAction::FontSize(v) if v.is_finite() && v > 0.0 => {
                    NodePatch { font_size: Some(v), ..Default::default() }
                }
                PanelAction::FontWeight(v) => NodePatch { font_weight: Some(v), ..Default::default() },
                _ => return false,
            };
            store.update_node(&id, &patch)
        }
        (PanelView::Edge { id, can_disconnect_source, can_disconnect_target, .. }, action) => match action {
            PanelAction::Label(v) => store.update_edge(&id, &EdgePatch { label: Some(v), ..Default::default() }),
            PanelAction::Color(v) => store.update_edge(&id, &EdgePatch { color: Some(v), ..Default::default() }),
            PanelAction::Arrow(v) => store.update_edge(&id, &EdgePatch { arrow: Some(v), ..Default::default() }),
            PanelAction::StrokeWidth(v) => {
                store.update_edge(&id, &EdgePatch { stroke_width: Some(v), ..Default::default() })
            }
            PanelAction::Reverse => store.reverse_edge(&id),
            PanelAction::Disconnect(EdgeEnd::Source) if can_disconnect_source => {
                store.disconnect_endpoint(&id, EdgeEnd::Source).is_some()
            }
            PanelAction::Disconnect(EdgeEnd::Target) if can_disconnect_target => {
                store.disconnect_endpoint(&id, EdgeEnd::Target).is_some()
            }
            _ => false,
        },
    }
}
