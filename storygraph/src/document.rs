use crate::geometry::math::{Point, Size};
use crate::model::{EdgeId, GraphEdge, GraphNode, NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Live node/edge arrays of the active pattern.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Direct-manipulation update for a node, batched by the canvas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeChange {
    Position {
        id: NodeId,
        #[serde(default)]
        position: Option<Point>,
        #[serde(default)]
        dragging: bool,
    },
    Select { id: NodeId, selected: bool },
    Dimensions {
        id: NodeId,
        size: Size,
        #[serde(default)]
        resizing: bool,
    },
    Remove { id: NodeId },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EdgeChange {
    Select { id: EdgeId, selected: bool },
    Remove { id: EdgeId },
}

/// What a batch of node changes did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeSummary {
    /// Something that ends up in the persisted projection changed.
    pub persisted: bool,
    /// Nodes whose drag ended in this batch.
    pub drag_stopped: Vec<NodeId>,
}

impl Document {
    pub fn new() -> Self {
        Document::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn edge_mut(&mut self, id: &str) -> Option<&mut GraphEdge> {
        self.edges.iter_mut().find(|e| e.id == id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn node_kind(&self, id: &str) -> Option<NodeKind> {
        self.node(id).map(|n| n.kind)
    }

    /// `"{prefix}-{timestamp}"`, suffixed when that id is already taken.
    pub fn fresh_node_id(&self, prefix: &str, now_ms: f64) -> NodeId {
        let base = format!("{}-{}", prefix, now_ms.max(0.0) as u64);
        unique(base, |id| self.has_node(id))
    }

    pub fn fresh_edge_id(&self, source: &str, target: &str, now_ms: f64) -> EdgeId {
        let base = format!("e-{}-{}-{}", source, target, now_ms.max(0.0) as u64);
        unique(base, |id| self.edge(id).is_some())
    }

    /// Inserts a node unless its id is already present.
    pub fn insert_node(&mut self, node: GraphNode) -> bool {
        if self.has_node(&node.id) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    /// Removes a node and every edge incident to it.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        if self.nodes.len() == before {
            return false;
        }
        self.edges.retain(|e| !e.touches(id));
        true
    }

    /// Drops edges whose endpoints are not both present. Returns how many went.
    pub fn drop_dangling_edges(&mut self) -> usize {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let before = self.edges.len();
        let kept: Vec<GraphEdge> = self
            .edges
            .drain(..)
            .filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
            .collect();
        self.edges = kept;
        before - self.edges.len()
    }

    /// Anchors never carry a handle; clears any that older data attached.
    /// Returns how many handles were dropped.
    pub fn clear_anchor_handles(&mut self) -> usize {
        let anchors: HashSet<&str> = self.nodes.iter().filter(|n| n.is_anchor()).map(|n| n.id.as_str()).collect();
        let mut cleared = 0;
        for e in self.edges.iter_mut() {
            if anchors.contains(e.source.as_str()) && e.source_handle.take().is_some() {
                cleared += 1;
            }
            if anchors.contains(e.target.as_str()) && e.target_handle.take().is_some() {
                cleared += 1;
            }
        }
        cleared
    }

    pub fn selected_node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().filter(|n| n.selected).map(|n| n.id.clone()).collect()
    }

    pub fn selected_edge_ids(&self) -> Vec<EdgeId> {
        self.edges.iter().filter(|e| e.selected).map(|e| e.id.clone()).collect()
    }

    pub fn clear_selection(&mut self) {
        for n in self.nodes.iter_mut() {
            n.selected = false;
        }
        for e in self.edges.iter_mut() {
            e.selected = false;
        }
    }

    /// Topmost entity node whose box, grown by `pad`, contains `p`.
    pub fn entity_at(&self, p: Point, pad: f64, exclude: Option<&str>) -> Option<&GraphNode> {
        self.nodes
            .iter()
            .filter(|n| n.is_entity() && Some(n.id.as_str()) != exclude)
            .filter(|n| n.bounds().inflate(pad).contains(p))
            .max_by_key(|n| n.z_index)
    }

    /// Applies position/selection/dimension changes. Removals are handled by
    /// the store, which also has to re-route sibling edges.
    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) -> ChangeSummary {
        let mut summary = ChangeSummary::default();
        for change in changes {
            match change {
                NodeChange::Position { id, position, dragging } => {
                    let Some(n) = self.node_mut(id) else { continue };
                    if let Some(p) = position {
                        if n.position != *p {
                            n.position = *p;
                            summary.persisted = true;
                        }
                    }
                    if n.dragging && !*dragging {
                        summary.drag_stopped.push(id.clone());
                    }
                    n.dragging = *dragging;
                }
                NodeChange::Select { id, selected } => {
                    if let Some(n) = self.node_mut(id) {
                        n.selected = *selected;
                    }
                }
                NodeChange::Dimensions { id, size, resizing } => {
                    let Some(n) = self.node_mut(id) else { continue };
                    let authoritative = matches!(n.kind, NodeKind::Rect | NodeKind::Text)
                        && (*resizing || n.kind == NodeKind::Rect && n.size.is_none());
                    if authoritative {
                        if n.size != Some(*size) {
                            n.size = Some(*size);
                            summary.persisted = true;
                        }
                    } else {
                        n.measured = Some(*size);
                    }
                }
                NodeChange::Remove { .. } => {}
            }
        }
        summary
    }

    pub fn apply_edge_selection(&mut self, id: &str, selected: bool) {
        if let Some(e) = self.edge_mut(id) {
            e.selected = selected;
        }
    }
}

fn unique(base: String, taken: impl Fn(&str) -> bool) -> String {
    if !taken(&base) {
        return base;
    }
    let mut n = 1u32;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
