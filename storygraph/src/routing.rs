//! Edge model and router.
//!
//! Parallel edges between one unordered node pair share a canonical frame:
//! the endpoint with the smaller id (plain `str` ordering) is "first".
//! Stored curvature is an offset in that frame, so sibling offsets are
//! always `{-(n-1)/2, .., (n-1)/2} * spacing` no matter which way each edge
//! points. [`render_curvature`] converts back to the edge's own direction.

use crate::document::Document;
use crate::geometry::curve::{curve_label_anchor, edge_path, EdgePath};
use crate::geometry::math::Point;
use crate::model::{EdgeEnd, EdgeId, GraphEdge, GraphNode, NodeId, NodeKind, Side};
use std::collections::HashSet;

/// Visual attributes of a new connection.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeStyle {
    pub color: String,
    pub stroke_width: f64,
    pub arrow: bool,
    pub label: Option<String>,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        EdgeStyle {
            color: crate::model::DEFAULT_EDGE_COLOR.to_string(),
            stroke_width: crate::model::DEFAULT_EDGE_WIDTH,
            arrow: false,
            label: None,
        }
    }
}

/// True when the edge runs from the canonical first endpoint.
#[inline]
pub fn is_canonical(edge: &GraphEdge) -> bool {
    edge.source <= edge.target
}

/// Curvature in the edge's own source→target frame.
#[inline]
pub fn render_curvature(edge: &GraphEdge) -> f64 {
    if is_canonical(edge) { edge.curvature } else { -edge.curvature }
}

/// Evenly spaced, zero-centred offsets for `n` siblings.
pub fn sibling_offsets(n: usize, spacing: f64) -> Vec<f64> {
    let mid = (n as f64 - 1.0) * 0.5;
    (0..n).map(|i| (i as f64 - mid) * spacing).collect()
}

/// Re-spreads every edge joining {a, b}, in array order.
pub fn recompute_pair(doc: &mut Document, a: &str, b: &str, spacing: f64) {
    let idx: Vec<usize> = doc
        .edges
        .iter()
        .enumerate()
        .filter(|(_, e)| e.joins(a, b))
        .map(|(i, _)| i)
        .collect();
    for (i, off) in idx.iter().zip(sibling_offsets(idx.len(), spacing)) {
        doc.edges[*i].curvature = off;
    }
}

/// Re-spreads every pair present in the document.
pub fn recompute_all(doc: &mut Document, spacing: f64) {
    let mut pairs: Vec<(NodeId, NodeId)> = Vec::new();
    for e in &doc.edges {
        let key = if is_canonical(e) {
            (e.source.clone(), e.target.clone())
        } else {
            (e.target.clone(), e.source.clone())
        };
        if !pairs.contains(&key) {
            pairs.push(key);
        }
    }
    for (a, b) in pairs {
        recompute_pair(doc, &a, &b, spacing);
    }
}

/// Nearest facing sides from the centre-to-centre vector; anchors get none.
pub fn infer_handles(source: &GraphNode, target: &GraphNode) -> (Option<Side>, Option<Side>) {
    let sc = source.center();
    let tc = target.center();
    let side = Side::facing(tc.x - sc.x, tc.y - sc.y);
    let sh = if source.is_anchor() { None } else { Some(side) };
    let th = if target.is_anchor() { None } else { Some(side.opposite()) };
    (sh, th)
}

/// Adds an edge and re-spreads its siblings. Returns `None` when an endpoint
/// is missing or an identical connection already exists.
pub fn connect(
    doc: &mut Document,
    source: &str,
    target: &str,
    handles: Option<(Option<Side>, Option<Side>)>,
    style: EdgeStyle,
    spacing: f64,
    now_ms: f64,
) -> Option<EdgeId> {
    let s = doc.node(source)?;
    let t = doc.node(target)?;
    let (mut sh, mut th) = match handles {
        Some(h) => h,
        None => infer_handles(s, t),
    };
    if s.is_anchor() {
        sh = None;
    }
    if t.is_anchor() {
        th = None;
    }
    let duplicate = doc.edges.iter().any(|e| {
        e.source == source && e.target == target && e.source_handle == sh && e.target_handle == th
    });
    if duplicate {
        return None;
    }
    let id = doc.fresh_edge_id(source, target, now_ms);
    let mut edge = GraphEdge::new(id.clone(), source, target);
    edge.source_handle = sh;
    edge.target_handle = th;
    edge.color = style.color;
    edge.stroke_width = style.stroke_width;
    edge.arrow = style.arrow;
    edge.label = style.label.filter(|l| !l.is_empty());
    doc.edges.push(edge);
    recompute_pair(doc, source, target, spacing);
    log::debug!("connected {} -> {} as {}", source, target, id);
    Some(id)
}

pub fn delete_edge(doc: &mut Document, id: &str, spacing: f64) -> bool {
    let Some(pos) = doc.edges.iter().position(|e| e.id == id) else { return false };
    let removed = doc.edges.remove(pos);
    recompute_pair(doc, &removed.source, &removed.target, spacing);
    true
}

/// Swaps endpoints and handles. Stored curvature is pair-relative, so the
/// drawn curve stays where it was.
pub fn reverse_edge(doc: &mut Document, id: &str) -> bool {
    let Some(e) = doc.edge_mut(id) else { return false };
    std::mem::swap(&mut e.source, &mut e.target);
    let sh = e.source_handle;
    e.source_handle = e.target_handle;
    e.target_handle = sh;
    true
}

/// Moves one endpoint of an entity-bound edge onto a fresh anchor placed
/// `offset` units beyond the entity's left (source) or right (target) side.
/// Returns the anchor id.
pub fn disconnect_endpoint(
    doc: &mut Document,
    edge_id: &str,
    end: EdgeEnd,
    offset: f64,
    spacing: f64,
    now_ms: f64,
) -> Option<NodeId> {
    let edge = doc.edge(edge_id)?;
    let node = doc.node(edge.endpoint(end))?;
    if !node.is_entity() {
        return None;
    }
    let bounds = node.bounds();
    let half = crate::model::ANCHOR_SIZE.width * 0.5;
    let cx = match end {
        EdgeEnd::Source => bounds.x - offset,
        EdgeEnd::Target => bounds.x + bounds.width + offset,
    };
    let position = Point::new(cx - half, bounds.center().y - half);
    let color = edge.color.clone();
    let (old_source, old_target) = (edge.source.clone(), edge.target.clone());

    let anchor_id = doc.fresh_node_id("anchor", now_ms);
    let mut anchor = GraphNode::new(anchor_id.clone(), NodeKind::Anchor, position);
    anchor.style.color = Some(color);
    doc.insert_node(anchor);

    let e = doc.edge_mut(edge_id)?;
    match end {
        EdgeEnd::Source => {
            e.source = anchor_id.clone();
            e.source_handle = None;
        }
        EdgeEnd::Target => {
            e.target = anchor_id.clone();
            e.target_handle = None;
        }
    }
    let (new_source, new_target) = (e.source.clone(), e.target.clone());
    recompute_pair(doc, &old_source, &old_target, spacing);
    recompute_pair(doc, &new_source, &new_target, spacing);
    Some(anchor_id)
}

type ConnectionKey = (NodeId, NodeId, Option<Side>, Option<Side>);

fn connection_key(e: &GraphEdge) -> ConnectionKey {
    (e.source.clone(), e.target.clone(), e.source_handle, e.target_handle)
}

/// Topmost entity containing the anchor's centre.
pub fn find_drop_target(doc: &Document, anchor_id: &str) -> Option<NodeId> {
    let anchor = doc.node(anchor_id)?;
    if !anchor.is_anchor() {
        return None;
    }
    doc.entity_at(anchor.center(), 0.0, None).map(|n| n.id.clone())
}

/// Rebinds every edge ending at `anchor_id` to `entity_id` and deletes the
/// anchor. The handle faces the quadrant the anchor was dropped in. Edges
/// that would loop back onto the entity are removed.
pub fn reconnect_anchor_on_drop(doc: &mut Document, anchor_id: &str, entity_id: &str, spacing: f64) -> bool {
    let (Some(anchor), Some(entity)) = (doc.node(anchor_id), doc.node(entity_id)) else {
        return false;
    };
    if !anchor.is_anchor() || !entity.is_entity() {
        return false;
    }
    let ac = anchor.center();
    let ec = entity.center();
    let side = Side::facing(ac.x - ec.x, ac.y - ec.y);

    let mut touched: Vec<(NodeId, NodeId)> = Vec::new();
    let mut rebound: HashSet<EdgeId> = HashSet::new();
    for e in doc.edges.iter_mut() {
        if e.source == anchor_id {
            touched.push((e.source.clone(), e.target.clone()));
            e.source = entity_id.to_string();
            e.source_handle = Some(side);
            rebound.insert(e.id.clone());
        }
        if e.target == anchor_id {
            touched.push((e.source.clone(), e.target.clone()));
            e.target = entity_id.to_string();
            e.target_handle = Some(side);
            rebound.insert(e.id.clone());
        }
    }
    doc.edges.retain(|e| e.source != e.target);
    // A rebound edge that now matches an existing connection is dropped.
    let mut seen: HashSet<ConnectionKey> =
        doc.edges.iter().filter(|e| !rebound.contains(&e.id)).map(connection_key).collect();
    doc.edges.retain(|e| !rebound.contains(&e.id) || seen.insert(connection_key(e)));
    doc.remove_node(anchor_id);
    for (a, b) in touched {
        let a = if a == anchor_id { entity_id.to_string() } else { a };
        let b = if b == anchor_id { entity_id.to_string() } else { b };
        recompute_pair(doc, &a, &b, spacing);
    }
    log::debug!("anchor {} merged into {}", anchor_id, entity_id);
    true
}

/// Endpoint coordinates of an edge: the handle's side midpoint, or the
/// node centre when no handle is set.
pub fn endpoint_position(node: &GraphNode, handle: Option<Side>) -> Point {
    let b = node.bounds();
    let c = b.center();
    match handle {
        None => c,
        Some(Side::Top) => Point::new(c.x, b.y),
        Some(Side::Bottom) => Point::new(c.x, b.y + b.height),
        Some(Side::Left) => Point::new(b.x, c.y),
        Some(Side::Right) => Point::new(b.x + b.width, c.y),
    }
}

/// Drawn path and label anchor of an edge.
pub fn resolve_edge(doc: &Document, edge: &GraphEdge) -> Option<(EdgePath, Point)> {
    let s = endpoint_position(doc.node(&edge.source)?, edge.source_handle);
    let t = endpoint_position(doc.node(&edge.target)?, edge.target_handle);
    let c = render_curvature(edge);
    Some((edge_path(s.x, s.y, t.x, t.y, c), curve_label_anchor(s.x, s.y, t.x, t.y, c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(doc: &mut Document, id: &str, x: f64, y: f64) {
        doc.insert_node(GraphNode::new(id, NodeKind::Entity, Point::new(x, y)));
    }

    #[test]
    fn offsets_are_centred() {
        assert_eq!(sibling_offsets(1, 50.0), vec![0.0]);
        assert_eq!(sibling_offsets(2, 50.0), vec![-25.0, 25.0]);
        assert_eq!(sibling_offsets(3, 50.0), vec![-50.0, 0.0, 50.0]);
    }

    #[test]
    fn handles_inferred_from_relative_position() {
        let mut doc = Document::new();
        entity(&mut doc, "loc-1", 100.0, 100.0);
        entity(&mut doc, "loc-2", 300.0, 100.0);
        entity(&mut doc, "loc-3", 100.0, 400.0);
        let e = connect(&mut doc, "loc-1", "loc-2", None, EdgeStyle::default(), 50.0, 1.0).unwrap();
        let e = doc.edge(&e).unwrap();
        assert_eq!((e.source_handle, e.target_handle), (Some(Side::Right), Some(Side::Left)));
        let e = connect(&mut doc, "loc-3", "loc-1", None, EdgeStyle::default(), 50.0, 2.0).unwrap();
        let e = doc.edge(&e).unwrap();
        assert_eq!((e.source_handle, e.target_handle), (Some(Side::Top), Some(Side::Bottom)));
    }

    #[test]
    fn anchors_never_get_handles() {
        let mut doc = Document::new();
        entity(&mut doc, "char-1", 0.0, 0.0);
        doc.insert_node(GraphNode::new("anchor-1", NodeKind::Anchor, Point::new(300.0, 0.0)));
        let id = connect(
            &mut doc,
            "char-1",
            "anchor-1",
            Some((Some(Side::Right), Some(Side::Left))),
            EdgeStyle::default(),
            50.0,
            1.0,
        )
        .unwrap();
        let e = doc.edge(&id).unwrap();
        assert_eq!(e.source_handle, Some(Side::Right));
        assert_eq!(e.target_handle, None);
    }

    #[test]
    fn duplicate_connection_is_ignored() {
        let mut doc = Document::new();
        entity(&mut doc, "a", 0.0, 0.0);
        entity(&mut doc, "b", 300.0, 0.0);
        assert!(connect(&mut doc, "a", "b", None, EdgeStyle::default(), 50.0, 1.0).is_some());
        assert!(connect(&mut doc, "a", "b", None, EdgeStyle::default(), 50.0, 2.0).is_none());
        assert_eq!(doc.edges.len(), 1);
        // different handles make a distinct connection
        let h = Some((Some(Side::Bottom), Some(Side::Bottom)));
        assert!(connect(&mut doc, "a", "b", h, EdgeStyle::default(), 50.0, 3.0).is_some());
        assert_eq!(doc.edges.len(), 2);
    }

    #[test]
    fn opposite_edges_fan_out_and_collapse_back() {
        let mut doc = Document::new();
        entity(&mut doc, "loc-1", 100.0, 100.0);
        entity(&mut doc, "loc-2", 300.0, 100.0);
        let e1 = connect(&mut doc, "loc-1", "loc-2", None, EdgeStyle::default(), 50.0, 1.0).unwrap();
        assert_eq!(doc.edge(&e1).unwrap().curvature, 0.0);
        let e2 = connect(&mut doc, "loc-2", "loc-1", None, EdgeStyle::default(), 50.0, 2.0).unwrap();
        let c1 = doc.edge(&e1).unwrap().curvature;
        let c2 = doc.edge(&e2).unwrap().curvature;
        assert_eq!(c1, -25.0);
        assert_eq!(c2, 25.0);
        // both drawn on different sides of the axis
        let (_, l1) = resolve_edge(&doc, doc.edge(&e1).unwrap()).unwrap();
        let (_, l2) = resolve_edge(&doc, doc.edge(&e2).unwrap()).unwrap();
        assert!((l1.y - 132.0).abs() > 1.0 && (l2.y - 132.0).abs() > 1.0);
        assert!((l1.y - 132.0).signum() != (l2.y - 132.0).signum());

        assert!(delete_edge(&mut doc, &e1, 50.0));
        assert_eq!(doc.edge(&e2).unwrap().curvature, 0.0);
    }

    #[test]
    fn reverse_keeps_drawn_curve() {
        let mut doc = Document::new();
        entity(&mut doc, "a", 0.0, 0.0);
        entity(&mut doc, "b", 400.0, 0.0);
        let e1 = connect(&mut doc, "a", "b", None, EdgeStyle::default(), 50.0, 1.0).unwrap();
        connect(&mut doc, "a", "b", Some((Some(Side::Top), Some(Side::Top))), EdgeStyle::default(), 50.0, 2.0).unwrap();
        let before = resolve_edge(&doc, doc.edge(&e1).unwrap()).unwrap().1;
        assert!(reverse_edge(&mut doc, &e1));
        let e = doc.edge(&e1).unwrap();
        assert_eq!(e.source, "b");
        assert_eq!((e.source_handle, e.target_handle), (Some(Side::Left), Some(Side::Right)));
        let after = resolve_edge(&doc, e).unwrap().1;
        assert!((before.x - after.x).abs() < 1e-9 && (before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn disconnect_spawns_anchor_beside_entity() {
        let mut doc = Document::new();
        entity(&mut doc, "char-1", 0.0, 0.0);
        entity(&mut doc, "char-2", 400.0, 0.0);
        let e = connect(&mut doc, "char-1", "char-2", None, EdgeStyle::default(), 50.0, 1.0).unwrap();
        doc.edge_mut(&e).unwrap().color = "#ff0000".into();
        let anchor = disconnect_endpoint(&mut doc, &e, EdgeEnd::Target, 30.0, 50.0, 5.0).unwrap();
        let a = doc.node(&anchor).unwrap();
        assert!(a.is_anchor());
        assert_eq!(a.style.color.as_deref(), Some("#ff0000"));
        let c = a.center();
        assert!((c.x - (400.0 + 160.0 + 30.0)).abs() < 1e-9);
        assert!((c.y - 32.0).abs() < 1e-9);
        let edge = doc.edge(&e).unwrap();
        assert_eq!(edge.target, anchor);
        assert_eq!(edge.target_handle, None);
        // anchor endpoints cannot be detached again
        assert!(disconnect_endpoint(&mut doc, &e, EdgeEnd::Target, 30.0, 50.0, 6.0).is_none());
    }

    #[test]
    fn drop_onto_entity_rebinds_and_removes_anchor() {
        let mut doc = Document::new();
        entity(&mut doc, "char-1", 0.0, 0.0);
        entity(&mut doc, "char-2", 400.0, 0.0);
        doc.insert_node(GraphNode::new("anchor-9", NodeKind::Anchor, Point::new(200.0, 300.0)));
        connect(&mut doc, "char-1", "anchor-9", None, EdgeStyle::default(), 50.0, 1.0).unwrap();
        // drag the anchor onto the right half of char-2
        doc.node_mut("anchor-9").unwrap().position = Point::new(530.0, 26.0);
        assert_eq!(find_drop_target(&doc, "anchor-9").as_deref(), Some("char-2"));
        assert!(reconnect_anchor_on_drop(&mut doc, "anchor-9", "char-2", 50.0));
        assert!(doc.node("anchor-9").is_none());
        let e = &doc.edges[0];
        assert_eq!(e.target, "char-2");
        assert_eq!(e.target_handle, Some(Side::Right));
    }

    #[test]
    fn drop_that_recreates_an_existing_edge_keeps_one() {
        let mut doc = Document::new();
        entity(&mut doc, "char-1", 0.0, 0.0);
        entity(&mut doc, "char-2", 400.0, 0.0);
        doc.insert_node(GraphNode::new("anchor-9", NodeKind::Anchor, Point::new(200.0, 300.0)));
        let kept = connect(&mut doc, "char-1", "char-2", None, EdgeStyle::default(), 50.0, 1.0).unwrap();
        let handles = Some((Some(Side::Right), None));
        connect(&mut doc, "char-1", "anchor-9", handles, EdgeStyle::default(), 50.0, 2.0).unwrap();
        // left half of char-2
        doc.node_mut("anchor-9").unwrap().position = Point::new(410.0, 26.0);
        assert!(reconnect_anchor_on_drop(&mut doc, "anchor-9", "char-2", 50.0));
        assert_eq!(doc.edges.len(), 1);
        let e = &doc.edges[0];
        assert_eq!(e.id, kept);
        assert_eq!((e.source_handle, e.target_handle), (Some(Side::Right), Some(Side::Left)));
        assert_eq!(e.curvature, 0.0);
    }

    #[test]
    fn drop_on_empty_space_has_no_target() {
        let mut doc = Document::new();
        entity(&mut doc, "char-1", 0.0, 0.0);
        doc.insert_node(GraphNode::new("anchor-1", NodeKind::Anchor, Point::new(900.0, 900.0)));
        assert_eq!(find_drop_target(&doc, "anchor-1"), None);
    }
}
