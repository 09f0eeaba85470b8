//! Persisted projection of the document and its wire format.
//!
//! `NodeRecord`/`EdgeRecord` are the callback-free, display-state-free
//! shapes written to the persistence collaborator, used for history
//! snapshots, and consumed by the export renderer. Loading is lenient:
//! legacy type names and relocated fields are migrated, malformed entries
//! are skipped, and unparseable payloads load as empty lists.

use crate::document::Document;
use crate::geometry::limits;
use crate::geometry::math::{Point, Size};
use crate::model::{
    GraphEdge, GraphNode, NodeKind, NodeStyle, PatternData, Side, DEFAULT_EDGE_COLOR, DEFAULT_EDGE_WIDTH,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: String,
    pub kind: NodeKind,
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default, skip_serializing_if = "is_default_style")]
    pub style: NodeStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub z_index: i32,
}

fn is_default_style(s: &NodeStyle) -> bool {
    *s == NodeStyle::default()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub color: String,
    pub stroke_width: f64,
    pub curvature: f64,
    pub arrow: bool,
}

impl From<&GraphNode> for NodeRecord {
    fn from(n: &GraphNode) -> Self {
        NodeRecord {
            id: n.id.clone(),
            kind: n.kind,
            position: n.position,
            size: n.size,
            style: n.style.clone(),
            entity_ref: n.entity_ref.clone(),
            label: n.label.clone(),
            image: n.image.clone(),
            z_index: n.z_index,
        }
    }
}

impl From<&NodeRecord> for GraphNode {
    fn from(r: &NodeRecord) -> Self {
        let mut n = GraphNode::new(r.id.clone(), r.kind, r.position);
        n.size = r.size;
        n.style = r.style.clone();
        n.entity_ref = r.entity_ref.clone();
        n.label = r.label.clone();
        n.image = r.image.clone();
        n.z_index = r.z_index;
        n
    }
}

impl From<&GraphEdge> for EdgeRecord {
    fn from(e: &GraphEdge) -> Self {
        EdgeRecord {
            id: e.id.clone(),
            source: e.source.clone(),
            target: e.target.clone(),
            source_handle: e.source_handle,
            target_handle: e.target_handle,
            label: e.label.clone(),
            color: e.color.clone(),
            stroke_width: e.stroke_width,
            curvature: e.curvature,
            arrow: e.arrow,
        }
    }
}

impl From<&EdgeRecord> for GraphEdge {
    fn from(r: &EdgeRecord) -> Self {
        let mut e = GraphEdge::new(r.id.clone(), r.source.clone(), r.target.clone());
        e.source_handle = r.source_handle;
        e.target_handle = r.target_handle;
        e.label = r.label.clone();
        e.color = r.color.clone();
        e.stroke_width = r.stroke_width;
        e.curvature = r.curvature;
        e.arrow = r.arrow;
        e
    }
}

/// Immutable `{nodes, edges}` pair in persisted form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl Snapshot {
    pub fn of(doc: &Document) -> Self {
        Snapshot {
            nodes: doc.nodes.iter().map(NodeRecord::from).collect(),
            edges: doc.edges.iter().map(EdgeRecord::from).collect(),
        }
    }

    /// A fresh, independent document built from this snapshot. Handles on
    /// anchor endpoints are dropped.
    pub fn restore(&self) -> Document {
        let mut doc = Document {
            nodes: self.nodes.iter().map(GraphNode::from).collect(),
            edges: self.edges.iter().map(GraphEdge::from).collect(),
        };
        let cleared = doc.clear_anchor_handles();
        if cleared > 0 {
            log::debug!("cleared {} handle(s) on anchor endpoints", cleared);
        }
        doc
    }

    pub fn encode(&self) -> Result<PatternData, serde_json::Error> {
        Ok(PatternData {
            nodes_data: serde_json::to_string(&self.nodes)?,
            edges_data: serde_json::to_string(&self.edges)?,
        })
    }
}

pub fn encode_document(doc: &Document) -> Result<PatternData, serde_json::Error> {
    Snapshot::of(doc).encode()
}

/// Parses a persisted pattern. Never fails: bad payloads load as empty.
pub fn decode_pattern(data: &PatternData) -> Snapshot {
    Snapshot {
        nodes: decode_nodes(&data.nodes_data),
        edges: decode_edges(&data.edges_data),
    }
}

fn parse_array(raw: &str, what: &str, cap: usize) -> Vec<Value> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) if items.len() <= cap => items,
        Ok(Value::Array(items)) => {
            log::warn!("{} list has {} entries, over the cap of {}; loading empty", what, items.len(), cap);
            Vec::new()
        }
        Ok(Value::Null) => Vec::new(),
        Ok(_) => {
            log::warn!("{} data is not an array; loading empty", what);
            Vec::new()
        }
        Err(e) => {
            log::warn!("unparseable {} data ({}); loading empty", what, e);
            Vec::new()
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct NodeDataDe {
    label: Option<String>,
    image: Option<String>,
    entity_id: Option<Value>,
    character_id: Option<Value>,
    location_id: Option<Value>,
    border_color: Option<String>,
    background_color: Option<String>,
    color: Option<String>,
    font_size: Option<f64>,
    font_weight: Option<Value>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct NodeDe {
    id: Option<String>,
    kind: Option<String>,
    #[serde(rename = "type")]
    legacy_type: Option<String>,
    position: Option<Point>,
    size: Option<Size>,
    width: Option<f64>,
    height: Option<f64>,
    style: Option<Value>,
    entity_ref: Option<Value>,
    label: Option<String>,
    image: Option<String>,
    z_index: Option<i32>,
    data: Option<NodeDataDe>,
}

/// Ids may have been written as numbers by older builds.
fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn weight_of(v: &Value) -> Option<u16> {
    match v {
        Value::Number(n) => n.as_u64().and_then(|w| u16::try_from(w).ok()),
        Value::String(s) if s == "bold" => Some(700),
        Value::String(s) if s == "normal" => Some(400),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn migrate_node(v: Value) -> Option<NodeRecord> {
    let de: NodeDe = match serde_json::from_value(v) {
        Ok(de) => de,
        Err(e) => {
            log::warn!("skipping malformed node: {}", e);
            return None;
        }
    };
    let id = de.id.filter(|s| !s.is_empty())?;
    let kind_str = de.kind.or(de.legacy_type)?;
    let Some(kind) = NodeKind::parse(&kind_str) else {
        log::warn!("skipping node {} with unknown type {:?}", id, kind_str);
        return None;
    };
    let position = de.position.unwrap_or_default();
    if !limits::in_coord_bounds(position.x) || !limits::in_coord_bounds(position.y) {
        log::warn!("skipping node {} with out-of-range position", id);
        return None;
    }
    let data = de.data.unwrap_or_default();
    let mut style: NodeStyle = de
        .style
        .and_then(|s| serde_json::from_value(s).ok())
        .unwrap_or_default();
    if style.border_color.is_none() {
        style.border_color = data.border_color;
    }
    if style.background.is_none() {
        style.background = data.background_color;
    }
    if style.color.is_none() {
        style.color = data.color;
    }
    if style.font_size.is_none() {
        style.font_size = data.font_size;
    }
    if style.font_weight.is_none() {
        style.font_weight = data.font_weight.as_ref().and_then(weight_of);
    }
    let size = de.size.or(match (de.width, de.height) {
        (Some(width), Some(height)) => Some(Size { width, height }),
        _ => None,
    });
    let size = size.filter(|s| s.width.is_finite() && s.height.is_finite() && s.width > 0.0 && s.height > 0.0);
    let entity_ref = if kind == NodeKind::Entity {
        de.entity_ref
            .as_ref()
            .or(data.entity_id.as_ref())
            .or(data.character_id.as_ref())
            .or(data.location_id.as_ref())
            .and_then(id_string)
    } else {
        None
    };
    let label = de.label.or(data.label).map(|l| truncate(l, limits::MAX_LABEL_LEN));
    Some(NodeRecord {
        id,
        kind,
        position,
        size,
        style,
        entity_ref,
        label,
        image: de.image.or(data.image),
        z_index: de.z_index.unwrap_or_else(|| kind.default_z()),
    })
}

fn truncate(mut s: String, max: usize) -> String {
    if s.len() > max {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
    }
    s
}

pub fn decode_nodes(raw: &str) -> Vec<NodeRecord> {
    let mut out: Vec<NodeRecord> = Vec::new();
    for v in parse_array(raw, "node", limits::MAX_NODES) {
        if let Some(n) = migrate_node(v) {
            if out.iter().any(|o| o.id == n.id) {
                log::warn!("dropping duplicate node id {}", n.id);
                continue;
            }
            out.push(n);
        }
    }
    out
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct EdgeDataDe {
    label: Option<String>,
    curvature: Option<f64>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct EdgeStyleDe {
    stroke: Option<String>,
    stroke_width: Option<f64>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct EdgeDe {
    id: Option<String>,
    source: Option<String>,
    target: Option<String>,
    source_handle: Option<String>,
    target_handle: Option<String>,
    label: Option<String>,
    color: Option<String>,
    stroke_width: Option<f64>,
    curvature: Option<f64>,
    arrow: Option<bool>,
    marker_end: Option<Value>,
    style: Option<EdgeStyleDe>,
    data: Option<EdgeDataDe>,
}

fn migrate_edge(v: Value) -> Option<EdgeRecord> {
    let de: EdgeDe = match serde_json::from_value(v) {
        Ok(de) => de,
        Err(e) => {
            log::warn!("skipping malformed edge: {}", e);
            return None;
        }
    };
    let id = de.id.filter(|s| !s.is_empty())?;
    let source = de.source.filter(|s| !s.is_empty())?;
    let target = de.target.filter(|s| !s.is_empty())?;
    if source == target {
        log::warn!("skipping self-loop edge {}", id);
        return None;
    }
    let data = de.data.unwrap_or_default();
    let style = de.style.unwrap_or_default();
    let stroke_width = de
        .stroke_width
        .or(style.stroke_width)
        .filter(|w| limits::in_width_bounds(*w))
        .unwrap_or(DEFAULT_EDGE_WIDTH);
    let curvature = de.curvature.or(data.curvature).filter(|c| c.is_finite()).unwrap_or(0.0);
    let arrow = de.arrow.unwrap_or_else(|| de.marker_end.as_ref().is_some_and(|m| !m.is_null()));
    Some(EdgeRecord {
        id,
        source,
        target,
        source_handle: de.source_handle.as_deref().and_then(Side::parse),
        target_handle: de.target_handle.as_deref().and_then(Side::parse),
        label: de.label.or(data.label).filter(|l| !l.is_empty()).map(|l| truncate(l, limits::MAX_LABEL_LEN)),
        color: de.color.or(style.stroke).unwrap_or_else(|| DEFAULT_EDGE_COLOR.to_string()),
        stroke_width,
        curvature,
        arrow,
    })
}

pub fn decode_edges(raw: &str) -> Vec<EdgeRecord> {
    let mut out: Vec<EdgeRecord> = Vec::new();
    for v in parse_array(raw, "edge", limits::MAX_EDGES) {
        if let Some(e) = migrate_edge(v) {
            if out.iter().any(|o| o.id == e.id) {
                log::warn!("dropping duplicate edge id {}", e.id);
                continue;
            }
            out.push(e);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn garbage_loads_as_empty() {
        assert!(decode_nodes("{not json").is_empty());
        assert!(decode_nodes("{\"a\":1}").is_empty());
        assert!(decode_edges("").is_empty());
        assert!(decode_edges("null").is_empty());
    }

    #[test]
    fn legacy_node_shape_is_migrated() {
        let raw = json!([
            { "id": "char-7", "type": "characterNode", "position": { "x": 10, "y": 20 },
              "data": { "label": "Ada", "characterId": 7, "borderColor": "#f00" } },
            { "id": "rect-1", "type": "shape", "position": { "x": 0, "y": 0 }, "width": 50, "height": 30,
              "data": { "label": "Act I", "backgroundColor": "#eee" } },
            { "id": "text-1", "type": "textNode", "position": { "x": 0, "y": 0 },
              "data": { "label": "note", "fontWeight": "bold" } },
            { "id": "bad", "type": "mystery", "position": { "x": 0, "y": 0 } }
        ])
        .to_string();
        let nodes = decode_nodes(&raw);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].kind, NodeKind::Entity);
        assert_eq!(nodes[0].entity_ref.as_deref(), Some("7"));
        assert_eq!(nodes[0].label.as_deref(), Some("Ada"));
        assert_eq!(nodes[0].style.border_color.as_deref(), Some("#f00"));
        assert_eq!(nodes[1].kind, NodeKind::Rect);
        assert_eq!(nodes[1].size, Some(Size { width: 50.0, height: 30.0 }));
        assert_eq!(nodes[1].style.background.as_deref(), Some("#eee"));
        assert_eq!(nodes[1].z_index, -1);
        assert_eq!(nodes[2].style.font_weight, Some(700));
    }

    #[test]
    fn legacy_edge_shape_is_migrated() {
        let raw = json!([
            { "id": "e1", "source": "a", "target": "b", "sourceHandle": "right-source",
              "targetHandle": "left-target", "markerEnd": { "type": "arrowclosed" },
              "style": { "stroke": "#123456", "strokeWidth": 3 }, "data": { "curvature": 25, "label": "rivals" } },
            { "id": "e2", "source": "a", "target": "a" },
            { "id": "e3", "source": "a" }
        ])
        .to_string();
        let edges = decode_edges(&raw);
        assert_eq!(edges.len(), 1);
        let e = &edges[0];
        assert_eq!(e.source_handle, Some(Side::Right));
        assert_eq!(e.target_handle, Some(Side::Left));
        assert!(e.arrow);
        assert_eq!(e.color, "#123456");
        assert_eq!(e.stroke_width, 3.0);
        assert_eq!(e.curvature, 25.0);
        assert_eq!(e.label.as_deref(), Some("rivals"));
    }

    #[test]
    fn persisted_projection_has_no_display_state() {
        let mut doc = Document::new();
        let mut n = GraphNode::new("rect-1", NodeKind::Rect, Point::new(1.0, 2.0));
        n.selected = true;
        n.dragging = true;
        n.measured = Some(Size::new(3.0, 4.0));
        doc.nodes.push(n);
        let data = encode_document(&doc).unwrap();
        assert!(!data.nodes_data.contains("selected"));
        assert!(!data.nodes_data.contains("measured"));
        let back = decode_pattern(&data).restore();
        assert_eq!(back.nodes[0].position, Point::new(1.0, 2.0));
        assert!(!back.nodes[0].selected);
    }

    #[test]
    fn anchor_endpoints_lose_their_handles() {
        let nodes = json!([
            { "id": "char-1", "type": "characterNode", "position": { "x": 0, "y": 0 }, "data": { "characterId": 1 } },
            { "id": "anchor-5", "type": "anchorNode", "position": { "x": 300, "y": 0 } }
        ])
        .to_string();
        let edges = json!([
            { "id": "e1", "source": "char-1", "target": "anchor-5",
              "sourceHandle": "right-source", "targetHandle": "left-target" }
        ])
        .to_string();
        let doc = decode_pattern(&PatternData { nodes_data: nodes, edges_data: edges }).restore();
        let e = doc.edge("e1").unwrap();
        assert_eq!(e.source_handle, Some(Side::Right));
        assert_eq!(e.target_handle, None);
    }

    #[test]
    fn current_format_is_stable() {
        let mut doc = Document::new();
        let mut n = GraphNode::new("loc-1", NodeKind::Entity, Point::new(100.0, 100.0));
        n.entity_ref = Some("1".into());
        n.label = Some("Harbor".into());
        doc.nodes.push(n);
        doc.nodes.push(GraphNode::new("anchor-5", NodeKind::Anchor, Point::new(0.0, 0.0)));
        let mut e = GraphEdge::new("e-1", "loc-1", "anchor-5");
        e.source_handle = Some(Side::Left);
        e.curvature = -25.0;
        doc.edges.push(e);
        let first = encode_document(&doc).unwrap();
        let second = decode_pattern(&first).encode().unwrap();
        assert_eq!(first, second);
    }
}
