use crate::geometry::math::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

pub type NodeId = String;
pub type EdgeId = String;
pub type PatternId = String;

pub const ENTITY_CARD_SIZE: Size = Size::new(160.0, 64.0);
pub const DEFAULT_RECT_SIZE: Size = Size::new(160.0, 100.0);
pub const DEFAULT_TEXT_SIZE: Size = Size::new(120.0, 32.0);
pub const ANCHOR_SIZE: Size = Size::new(12.0, 12.0);

pub const DEFAULT_EDGE_COLOR: &str = "#94a3b8";
pub const DEFAULT_EDGE_WIDTH: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Entity,
    Rect,
    Text,
    Anchor,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Entity => "entity",
            NodeKind::Rect => "rect",
            NodeKind::Text => "text",
            NodeKind::Anchor => "anchor",
        }
    }

    /// Current and legacy type strings found in persisted documents.
    pub fn parse(s: &str) -> Option<NodeKind> {
        match s {
            "entity" | "character" | "characterNode" | "location" | "locationNode" => {
                Some(NodeKind::Entity)
            }
            "rect" | "rectNode" | "shape" | "rectangle" => Some(NodeKind::Rect),
            "text" | "textNode" => Some(NodeKind::Text),
            "anchor" | "anchorNode" | "point" => Some(NodeKind::Anchor),
            _ => None,
        }
    }

    /// Freeform shapes sit behind entity cards so entities stay clickable.
    pub fn default_z(self) -> i32 {
        match self {
            NodeKind::Rect | NodeKind::Text => -1,
            NodeKind::Entity => 0,
            NodeKind::Anchor => 1,
        }
    }

    pub fn default_size(self) -> Size {
        match self {
            NodeKind::Entity => ENTITY_CARD_SIZE,
            NodeKind::Rect => DEFAULT_RECT_SIZE,
            NodeKind::Text => DEFAULT_TEXT_SIZE,
            NodeKind::Anchor => ANCHOR_SIZE,
        }
    }
}

/// Connection side of a node. Anchors have none.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    /// Accepts the plain side name and qualified variants like `"right-source"`.
    pub fn parse(s: &str) -> Option<Side> {
        let base = s.split('-').next().unwrap_or(s);
        match base {
            "top" => Some(Side::Top),
            "bottom" => Some(Side::Bottom),
            "left" => Some(Side::Left),
            "right" => Some(Side::Right),
            _ => None,
        }
    }

    /// Side facing a vector `(dx, dy)`; ties go horizontal.
    pub fn facing(dx: f64, dy: f64) -> Side {
        if dx.abs() >= dy.abs() {
            if dx >= 0.0 { Side::Right } else { Side::Left }
        } else if dy >= 0.0 {
            Side::Bottom
        } else {
            Side::Top
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeEnd {
    Source,
    Target,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
}

/// Canonical node held by the document store.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Point,
    pub size: Option<Size>,
    pub style: NodeStyle,
    pub entity_ref: Option<String>,
    pub label: Option<String>,
    pub image: Option<String>,
    pub z_index: i32,
    // display-only, never persisted
    pub selected: bool,
    pub dragging: bool,
    pub measured: Option<Size>,
}

impl GraphNode {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, position: Point) -> Self {
        GraphNode {
            id: id.into(),
            kind,
            position,
            size: None,
            style: NodeStyle::default(),
            entity_ref: None,
            label: None,
            image: None,
            z_index: kind.default_z(),
            selected: false,
            dragging: false,
            measured: None,
        }
    }

    pub fn is_entity(&self) -> bool {
        self.kind == NodeKind::Entity
    }

    pub fn is_anchor(&self) -> bool {
        self.kind == NodeKind::Anchor
    }

    /// Authoritative size, then measured size, then the per-kind default.
    pub fn effective_size(&self) -> Size {
        match self.kind {
            NodeKind::Entity => ENTITY_CARD_SIZE,
            NodeKind::Anchor => ANCHOR_SIZE,
            _ => self.size.or(self.measured).unwrap_or_else(|| self.kind.default_size()),
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.effective_size())
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }
}

/// Canonical edge held by the document store.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub source_handle: Option<Side>,
    pub target_handle: Option<Side>,
    pub label: Option<String>,
    pub color: String,
    pub stroke_width: f64,
    /// Signed offset in the canonical frame of the node pair.
    pub curvature: f64,
    pub arrow: bool,
    pub selected: bool,
}

impl GraphEdge {
    pub fn new(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        GraphEdge {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
            label: None,
            color: DEFAULT_EDGE_COLOR.to_string(),
            stroke_width: DEFAULT_EDGE_WIDTH,
            curvature: 0.0,
            arrow: false,
            selected: false,
        }
    }

    pub fn endpoint(&self, end: EdgeEnd) -> &str {
        match end {
            EdgeEnd::Source => &self.source,
            EdgeEnd::Target => &self.target,
        }
    }

    pub fn handle(&self, end: EdgeEnd) -> Option<Side> {
        match end {
            EdgeEnd::Source => self.source_handle,
            EdgeEnd::Target => self.target_handle,
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// True when this edge joins the unordered pair {a, b}.
    pub fn joins(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

/// Partial node update from inline edits and the properties panel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePatch {
    pub label: Option<String>,
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub border_color: Option<String>,
    pub background: Option<String>,
    pub color: Option<String>,
    pub font_size: Option<f64>,
    pub font_weight: Option<u16>,
    pub border_radius: Option<f64>,
    pub border_width: Option<f64>,
}

impl NodePatch {
    pub fn label(label: impl Into<String>) -> Self {
        NodePatch { label: Some(label.into()), ..Default::default() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EdgePatch {
    pub label: Option<String>,
    pub color: Option<String>,
    pub stroke_width: Option<f64>,
    pub arrow: Option<bool>,
}

/// A named, independently persisted graph snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub id: PatternId,
    pub project_id: String,
    pub name: String,
    pub nodes_data: String,
    pub edges_data: String,
    pub created_at: f64,
}

/// The serialized payload of one pattern.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternData {
    pub nodes_data: String,
    pub edges_data: String,
}

impl PatternData {
    pub fn empty() -> Self {
        PatternData { nodes_data: "[]".to_string(), edges_data: "[]".to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_kind_names_map_to_current() {
        assert_eq!(NodeKind::parse("characterNode"), Some(NodeKind::Entity));
        assert_eq!(NodeKind::parse("locationNode"), Some(NodeKind::Entity));
        assert_eq!(NodeKind::parse("shape"), Some(NodeKind::Rect));
        assert_eq!(NodeKind::parse("textNode"), Some(NodeKind::Text));
        assert_eq!(NodeKind::parse("anchorNode"), Some(NodeKind::Anchor));
        assert_eq!(NodeKind::parse("blob"), None);
    }

    #[test]
    fn side_parse_strips_qualifier() {
        assert_eq!(Side::parse("right-source"), Some(Side::Right));
        assert_eq!(Side::parse("left-target"), Some(Side::Left));
        assert_eq!(Side::parse("top"), Some(Side::Top));
        assert_eq!(Side::parse("middle"), None);
    }

    #[test]
    fn side_facing_prefers_dominant_axis() {
        assert_eq!(Side::facing(200.0, 0.0), Side::Right);
        assert_eq!(Side::facing(-200.0, 10.0), Side::Left);
        assert_eq!(Side::facing(5.0, 80.0), Side::Bottom);
        assert_eq!(Side::facing(5.0, -80.0), Side::Top);
    }

    #[test]
    fn shapes_default_behind_entities() {
        let r = GraphNode::new("rect-1", NodeKind::Rect, Point::new(0.0, 0.0));
        let e = GraphNode::new("char-1", NodeKind::Entity, Point::new(0.0, 0.0));
        assert!(r.z_index < e.z_index);
    }

    #[test]
    fn rect_size_is_authoritative() {
        let mut r = GraphNode::new("rect-1", NodeKind::Rect, Point::new(10.0, 10.0));
        r.measured = Some(Size::new(1.0, 1.0));
        r.size = Some(Size::new(40.0, 20.0));
        assert_eq!(r.center(), Point::new(30.0, 20.0));
    }
}
