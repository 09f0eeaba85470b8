//! Graph document store: the live node/edge arrays of the active pattern.
//!
//! Every mutation goes through here. Mutations schedule two independent
//! debounced effects: an autosave of the active pattern and a history
//! capture. Both carry the store's [`Generation`]; switching patterns or
//! tearing down bumps it, so nothing scheduled for the outgoing pattern can
//! fire against the incoming one.

use crate::clock::Clock;
use crate::config::EditorConfig;
use crate::debounce::{Debouncer, Generation};
use crate::document::{Document, EdgeChange, NodeChange};
use crate::entity::{Entity, EntityKind};
use crate::error::StoreError;
use crate::geometry::math::{Point, Size};
use crate::history::History;
use crate::json::{decode_pattern, encode_document, Snapshot};
use crate::model::{
    EdgeEnd, EdgeId, EdgePatch, GraphNode, NodeId, NodeKind, NodePatch, PatternData, PatternId, Side,
    ANCHOR_SIZE,
};
use crate::repository::PatternRepository;
use crate::routing::{self, EdgeStyle};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Uninitialized,
    Loading,
    Ready,
}

/// What a call to [`GraphStore::poll`] fired.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PollOutcome {
    pub saved: bool,
    pub captured: bool,
}

pub struct GraphStore<R, C> {
    kind: EntityKind,
    config: EditorConfig,
    repo: R,
    clock: C,
    state: LoadState,
    active: Option<PatternId>,
    doc: Document,
    history: History,
    autosave: Debouncer,
    capture: Debouncer,
    generation: Generation,
    entities: Vec<Entity>,
    autosave_enabled: bool,
    /// The last write of the active pattern failed; the next flush retries it.
    unsaved: bool,
}

impl<R: PatternRepository, C: Clock> GraphStore<R, C> {
    pub fn new(kind: EntityKind, config: EditorConfig, repo: R, clock: C) -> Self {
        GraphStore {
            history: History::new(config.history_limit),
            autosave: Debouncer::new(config.autosave_delay_ms),
            capture: Debouncer::new(config.history_delay_ms),
            kind,
            config,
            repo,
            clock,
            state: LoadState::Uninitialized,
            active: None,
            doc: Document::new(),
            generation: Generation::default(),
            entities: Vec::new(),
            autosave_enabled: true,
            unsaved: false,
        }
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == LoadState::Ready
    }

    pub fn active_pattern(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn repo_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn can_undo(&self) -> bool {
        self.is_ready() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.is_ready() && self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn has_pending_save(&self) -> bool {
        self.autosave.is_pending()
    }

    /// The last write of the active pattern failed and has not been redone.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Earliest deadline among pending debounced effects.
    pub fn next_deadline(&self) -> Option<f64> {
        match (self.autosave.due_at(), self.capture.due_at()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// While disabled, changes are not scheduled for writing and switching
    /// away does not flush.
    pub fn set_autosave_enabled(&mut self, enabled: bool) {
        self.autosave_enabled = enabled;
        if !enabled {
            self.autosave.cancel();
        }
    }

    /// Persisted form of the live document.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::of(&self.doc)
    }

    pub fn encode(&self) -> Result<PatternData, StoreError> {
        Ok(encode_document(&self.doc)?)
    }

    // ---- lifecycle ----

    /// Flushes the outgoing pattern, then loads `id`, reconciles entity
    /// nodes and resets history to the loaded state. A failed flush aborts
    /// the switch and leaves the current pattern in place.
    pub fn load_pattern(&mut self, id: &str) -> Result<(), StoreError> {
        if self.is_ready() {
            self.flush()?;
        }
        log::debug!("loading pattern {} (was {:?})", id, self.active);
        self.state = LoadState::Loading;
        self.cancel_pending();

        let data = match self.repo.load_pattern(id) {
            Ok(Some(d)) => d,
            Ok(None) => {
                log::warn!("pattern {} has no stored data; starting empty", id);
                PatternData::empty()
            }
            Err(e) => {
                log::error!("loading pattern {} failed: {}", id, e);
                self.doc = Document::new();
                self.history = History::new(self.config.history_limit);
                self.active = None;
                self.state = LoadState::Uninitialized;
                return Err(e);
            }
        };
        let mut doc = decode_pattern(&data).restore();
        reconcile_entities(&mut doc, &self.kind, &self.entities);
        let dropped = doc.drop_dangling_edges();
        if dropped > 0 {
            log::debug!("dropped {} dangling edge(s) from pattern {}", dropped, id);
        }
        self.doc = doc;
        self.history = History::new(self.config.history_limit);
        self.history.reset(Snapshot::of(&self.doc));
        self.active = Some(id.to_string());
        self.state = LoadState::Ready;
        Ok(())
    }

    /// Forgets the active pattern without writing it (it was deleted).
    pub fn unload(&mut self) {
        self.cancel_pending();
        self.doc = Document::new();
        self.history = History::new(self.config.history_limit);
        self.active = None;
        self.state = LoadState::Uninitialized;
    }

    /// Cancels pending work for this instance. Anything polled afterwards
    /// with an older generation is ignored.
    pub fn teardown(&mut self) {
        log::debug!("store teardown at generation {}", self.generation.value());
        self.unload();
    }

    fn cancel_pending(&mut self) {
        self.unsaved = false;
        self.autosave.cancel();
        self.capture.cancel();
        self.generation = self.generation.next();
    }

    /// Writes the active pattern now if an autosave is pending.
    /// A write that failed earlier counts as pending.
    pub fn flush(&mut self) -> Result<bool, StoreError> {
        if !self.autosave_enabled {
            return Ok(false);
        }
        let pending = self.autosave.take_now(self.generation);
        if !pending && !self.unsaved {
            return Ok(false);
        }
        self.write_active()?;
        Ok(true)
    }

    /// Writes the live graph of the active pattern unconditionally.
    pub fn save_now(&mut self) -> Result<(), StoreError> {
        self.autosave.cancel();
        self.write_active()
    }

    fn write_active(&mut self) -> Result<(), StoreError> {
        let Some(id) = self.active.clone() else {
            return Err(StoreError::NotLoaded);
        };
        let data = encode_document(&self.doc)?;
        match self.repo.save_pattern(&id, &data) {
            Ok(()) => {
                self.unsaved = false;
                Ok(())
            }
            Err(e) => {
                log::error!("saving pattern {} failed: {}", id, e);
                self.unsaved = true;
                Err(e)
            }
        }
    }

    /// Fires whatever debounced work is due. A save error is returned after
    /// the history capture has been handled; it is not retried.
    pub fn poll(&mut self) -> Result<PollOutcome, StoreError> {
        let mut out = PollOutcome::default();
        if !self.is_ready() {
            return Ok(out);
        }
        let now = self.clock.now_ms();
        if self.capture.take_due(now, self.generation) {
            out.captured = self.history.push(Snapshot::of(&self.doc));
        }
        if self.autosave.take_due(now, self.generation) && self.autosave_enabled {
            self.write_active()?;
            out.saved = true;
        }
        Ok(out)
    }

    /// Poll on behalf of a timer armed under `generation`; stale timers are
    /// no-ops.
    pub fn poll_generation(&mut self, generation: Generation) -> Result<PollOutcome, StoreError> {
        if generation != self.generation {
            return Ok(PollOutcome::default());
        }
        self.poll()
    }

    fn changed(&mut self) {
        if !self.is_ready() {
            return;
        }
        let now = self.clock.now_ms();
        if self.autosave_enabled {
            self.autosave.schedule(now, self.generation);
        }
        self.capture.schedule(now, self.generation);
    }

    /// Undo/redo replays are saved but never recorded as new history.
    fn replayed(&mut self) {
        let now = self.clock.now_ms();
        if self.autosave_enabled {
            self.autosave.schedule(now, self.generation);
        }
    }

    // ---- history ----

    pub fn undo(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.settle_capture();
        match self.history.undo() {
            Some(snap) => self.replay(&snap),
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.settle_capture();
        match self.history.redo() {
            Some(snap) => self.replay(&snap),
            None => false,
        }
    }

    /// Entities deleted since the snapshot was taken stay deleted.
    fn replay(&mut self, snap: &Snapshot) -> bool {
        let mut doc = snap.restore();
        reconcile_entities(&mut doc, &self.kind, &self.entities);
        self.doc = doc;
        self.replayed();
        true
    }

    /// Records an edit whose capture is still waiting out the debounce, so
    /// undo steps back from it instead of discarding it.
    fn settle_capture(&mut self) {
        if self.capture.take_now(self.generation) {
            self.history.push(Snapshot::of(&self.doc));
        }
    }

    /// Empties the document and restarts history from the empty state.
    pub fn clear_all(&mut self) {
        if !self.is_ready() {
            return;
        }
        self.doc = Document::new();
        self.capture.cancel();
        self.history.reset(Snapshot::default());
        self.replayed();
    }

    // ---- entities ----

    /// One-way reconciliation with the entity store. Returns whether the
    /// document changed; calling it again with the same list is a no-op.
    pub fn sync_entities(&mut self, entities: Vec<Entity>) -> bool {
        self.entities = entities;
        if !self.is_ready() {
            return false;
        }
        let changed = reconcile_entities(&mut self.doc, &self.kind, &self.entities);
        if changed {
            self.changed();
        }
        changed
    }

    pub fn entity(&self, entity_id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == entity_id)
    }

    /// Adds the node for a known entity at `position`, or moves it there if
    /// it is already on the canvas. Folders are never placed.
    pub fn add_entity_node(&mut self, entity_id: &str, position: Point) -> Option<NodeId> {
        if !self.is_ready() {
            return None;
        }
        let entity = self.entity(entity_id)?.clone();
        if entity.is_folder() {
            return None;
        }
        let id = self.kind.node_id(&entity.id);
        if let Some(n) = self.doc.node_mut(&id) {
            if n.position != position {
                n.position = position;
                self.changed();
            }
            return Some(id);
        }
        let mut node = GraphNode::new(id.clone(), NodeKind::Entity, position);
        node.entity_ref = Some(entity.id.clone());
        apply_entity_fields(&mut node, &self.kind, &entity);
        self.doc.insert_node(node);
        self.changed();
        Some(id)
    }

    // ---- freeform nodes ----

    fn add_freeform(&mut self, mut node: GraphNode) -> Option<NodeId> {
        if !self.is_ready() {
            return None;
        }
        node.id = self.doc.fresh_node_id(node.kind.as_str(), self.clock.now_ms());
        let id = node.id.clone();
        self.doc.insert_node(node);
        self.changed();
        Some(id)
    }

    pub fn add_rect(&mut self, position: Point, size: Size) -> Option<NodeId> {
        let mut node = GraphNode::new(String::new(), NodeKind::Rect, position);
        node.size = Some(size);
        self.add_freeform(node)
    }

    pub fn add_text(&mut self, position: Point, text: &str) -> Option<NodeId> {
        let mut node = GraphNode::new(String::new(), NodeKind::Text, position);
        node.label = Some(text.to_string());
        self.add_freeform(node)
    }

    /// Map symbols are text nodes holding a single large glyph.
    pub fn add_symbol(&mut self, position: Point, glyph: &str) -> Option<NodeId> {
        let mut node = GraphNode::new(String::new(), NodeKind::Text, position);
        node.label = Some(glyph.to_string());
        node.style.font_size = Some(28.0);
        self.add_freeform(node)
    }

    /// Anchor centred on `center`.
    pub fn add_anchor(&mut self, center: Point, color: Option<String>) -> Option<NodeId> {
        let pos = Point::new(center.x - ANCHOR_SIZE.width * 0.5, center.y - ANCHOR_SIZE.height * 0.5);
        let mut node = GraphNode::new(String::new(), NodeKind::Anchor, pos);
        node.style.color = color;
        self.add_freeform(node)
    }

    /// Applies an inline edit or panel change. Derived fields of entity
    /// nodes (label, colors) are not editable here.
    pub fn update_node(&mut self, id: &str, patch: &NodePatch) -> bool {
        if !self.is_ready() {
            return false;
        }
        let Some(n) = self.doc.node_mut(id) else { return false };
        let changed = apply_node_patch(n, patch);
        if changed {
            self.changed();
        }
        changed
    }

    pub fn update_edge(&mut self, id: &str, patch: &EdgePatch) -> bool {
        if !self.is_ready() {
            return false;
        }
        let Some(e) = self.doc.edge_mut(id) else { return false };
        let mut changed = false;
        if let Some(label) = &patch.label {
            let label = if label.is_empty() { None } else { Some(label.clone()) };
            if e.label != label {
                e.label = label;
                changed = true;
            }
        }
        if let Some(color) = &patch.color {
            if e.color != *color {
                e.color = color.clone();
                changed = true;
            }
        }
        if let Some(w) = patch.stroke_width {
            if crate::geometry::limits::in_width_bounds(w) && e.stroke_width != w {
                e.stroke_width = w;
                changed = true;
            }
        }
        if let Some(arrow) = patch.arrow {
            if e.arrow != arrow {
                e.arrow = arrow;
                changed = true;
            }
        }
        if changed {
            self.changed();
        }
        changed
    }

    pub fn delete_node(&mut self, id: &str) -> bool {
        if !self.is_ready() || !self.doc.remove_node(id) {
            return false;
        }
        self.changed();
        true
    }

    // ---- edges ----

    /// Connects two distinct nodes. Self-connections and exact duplicates
    /// are ignored.
    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
        handles: Option<(Option<Side>, Option<Side>)>,
        style: EdgeStyle,
    ) -> Option<EdgeId> {
        if !self.is_ready() || source == target {
            return None;
        }
        let now = self.clock.now_ms();
        let id = routing::connect(&mut self.doc, source, target, handles, style, self.config.curvature_spacing, now)?;
        self.changed();
        Some(id)
    }

    pub fn delete_edge(&mut self, id: &str) -> bool {
        if !self.is_ready() || !routing::delete_edge(&mut self.doc, id, self.config.curvature_spacing) {
            return false;
        }
        self.changed();
        true
    }

    pub fn reverse_edge(&mut self, id: &str) -> bool {
        if !self.is_ready() || !routing::reverse_edge(&mut self.doc, id) {
            return false;
        }
        self.changed();
        true
    }

    pub fn disconnect_endpoint(&mut self, edge_id: &str, end: EdgeEnd) -> Option<NodeId> {
        if !self.is_ready() {
            return None;
        }
        let now = self.clock.now_ms();
        let anchor = routing::disconnect_endpoint(
            &mut self.doc,
            edge_id,
            end,
            self.config.detach_offset,
            self.config.curvature_spacing,
            now,
        )?;
        self.changed();
        Some(anchor)
    }

    /// Merges a dropped anchor into the entity under it, if any.
    pub fn drop_anchor(&mut self, anchor_id: &str) -> bool {
        if !self.is_ready() {
            return false;
        }
        let Some(target) = routing::find_drop_target(&self.doc, anchor_id) else { return false };
        if routing::reconnect_anchor_on_drop(&mut self.doc, anchor_id, &target, self.config.curvature_spacing) {
            self.changed();
            return true;
        }
        false
    }

    // ---- direct manipulation ----

    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) {
        if !self.is_ready() {
            return;
        }
        let mut structural = false;
        for c in changes {
            if let NodeChange::Remove { id } = c {
                structural |= self.doc.remove_node(id);
            }
        }
        let summary = self.doc.apply_node_changes(changes);
        if structural || summary.persisted {
            self.changed();
        }
        for id in summary.drag_stopped {
            if self.doc.node_kind(&id) == Some(NodeKind::Anchor) {
                self.drop_anchor(&id);
            }
        }
    }

    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) {
        if !self.is_ready() {
            return;
        }
        for c in changes {
            match c {
                EdgeChange::Select { id, selected } => self.doc.apply_edge_selection(id, *selected),
                EdgeChange::Remove { id } => {
                    self.delete_edge(id);
                }
            }
        }
    }

    /// Selection-only update; never scheduled for saving or history.
    pub fn select_only(&mut self, node: Option<&str>, edge: Option<&str>) {
        self.doc.clear_selection();
        if let Some(id) = node {
            if let Some(n) = self.doc.node_mut(id) {
                n.selected = true;
            }
        }
        if let Some(id) = edge {
            self.doc.apply_edge_selection(id, true);
        }
    }

    /// Removes every selected node and edge (with cascades).
    pub fn delete_selected(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        let edges = self.doc.selected_edge_ids();
        let nodes = self.doc.selected_node_ids();
        let mut changed = false;
        for id in &edges {
            changed |= routing::delete_edge(&mut self.doc, id, self.config.curvature_spacing);
        }
        for id in &nodes {
            changed |= self.doc.remove_node(id);
        }
        if changed {
            self.changed();
        }
        changed
    }
}

fn apply_entity_fields(node: &mut GraphNode, kind: &EntityKind, entity: &Entity) -> bool {
    let label = Some(entity.name.clone());
    let border = Some(kind.border_color(entity));
    let changed = node.label != label || node.image != entity.image || node.style.border_color != border;
    node.label = label;
    node.image = entity.image.clone();
    node.style.border_color = border;
    changed
}

fn apply_node_patch(n: &mut GraphNode, patch: &NodePatch) -> bool {
    let mut changed = false;
    macro_rules! set {
        ($field:expr, $value:expr) => {
            if let Some(v) = $value {
                if $field.as_ref() != Some(v) {
                    $field = Some(v.clone());
                    changed = true;
                }
            }
        };
    }
    if let Some(p) = patch.position {
        if n.position != p {
            n.position = p;
            changed = true;
        }
    }
    if n.is_entity() || n.is_anchor() {
        if n.is_anchor() {
            set!(n.style.color, patch.color.as_ref());
        }
        return changed;
    }
    if let Some(s) = patch.size {
        if s.width > 0.0 && s.height > 0.0 && n.size != Some(s) {
            n.size = Some(s);
            changed = true;
        }
    }
    set!(n.label, patch.label.as_ref());
    set!(n.style.border_color, patch.border_color.as_ref());
    set!(n.style.background, patch.background.as_ref());
    set!(n.style.color, patch.color.as_ref());
    set!(n.style.font_size, patch.font_size.as_ref());
    set!(n.style.font_weight, patch.font_weight.as_ref());
    set!(n.style.border_radius, patch.border_radius.as_ref());
    set!(n.style.border_width, patch.border_width.as_ref());
    changed
}

/// Refreshes derived fields of entity nodes and removes nodes whose entity
/// is gone or has become a folder, together with their edges. Entity nodes
/// written before `entityRef` existed get it back from their id.
pub fn reconcile_entities(doc: &mut crate::document::Document, kind: &EntityKind, entities: &[Entity]) -> bool {
    let by_id: HashMap<&str, &Entity> = entities.iter().map(|e| (e.id.as_str(), e)).collect();
    let mut changed = false;
    let mut removed: HashSet<NodeId> = HashSet::new();
    for n in doc.nodes.iter_mut().filter(|n| n.is_entity()) {
        if n.entity_ref.is_none() {
            if let Some(eid) = kind.entity_id_of(&n.id) {
                n.entity_ref = Some(eid.to_string());
                changed = true;
            }
        }
        let live = n.entity_ref.as_deref().and_then(|eid| by_id.get(eid)).filter(|e| !e.is_folder());
        match live {
            Some(e) => changed |= apply_entity_fields(n, kind, e),
            None => {
                removed.insert(n.id.clone());
            }
        }
    }
    if !removed.is_empty() {
        log::debug!("removing {} node(s) without a backing entity", removed.len());
        doc.nodes.retain(|n| !removed.contains(&n.id));
        doc.edges.retain(|e| !removed.contains(&e.source) && !removed.contains(&e.target));
        changed = true;
    }
    changed
}
