//! Composition root: one relationship-graph editor for one entity kind.
//!
//! Ties the store, the pattern list, the drawing overlay and inline editing
//! together, and turns their results into [`EditorEvent`]s for the host.

use crate::clock::Clock;
use crate::config::EditorConfig;
use crate::entity::{EntityKind, EntitySource};
use crate::error::StoreError;
use crate::geometry::math::Point;
use crate::model::{NodeId, PatternId};
use crate::nodes::{EntityCard, EntitySelect, InlineEdit};
use crate::overlay::{Commit, LineEnd, Overlay, Tool, Viewport};
use crate::patterns::PatternManager;
use crate::repository::PatternRepository;
use crate::routing::EdgeStyle;
use crate::store::{GraphStore, PollOutcome};
use crate::svg;
use serde::Serialize;

const DEFAULT_TEXT: &str = "Text";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorEvent {
    /// An entity card was clicked; the host opens its detail view.
    #[serde(rename_all = "camelCase")]
    OpenDetail { entity_id: String, kind_tag: String },
    /// The add-entity tool was used; the host creates the entity and then
    /// calls `drop_entity` with the new id.
    AddEntityRequested { position: Point },
    #[serde(rename_all = "camelCase")]
    Saved { pattern_id: PatternId },
    SaveFailed { code: String, message: String },
    #[serde(rename_all = "camelCase")]
    HistoryChanged { can_undo: bool, can_redo: bool },
}

pub struct Editor<R, C, E> {
    store: GraphStore<R, C>,
    patterns: PatternManager,
    overlay: Overlay,
    entities: E,
    editing: Option<InlineEdit>,
    events: Vec<EditorEvent>,
    history_flags: (bool, bool),
}

impl<R: PatternRepository, C: Clock, E: EntitySource> Editor<R, C, E> {
    pub fn new(kind: EntityKind, config: EditorConfig, repo: R, clock: C, entities: E) -> Self {
        Editor {
            store: GraphStore::new(kind, config, repo, clock),
            patterns: PatternManager::new(),
            overlay: Overlay::new(),
            entities,
            editing: None,
            events: Vec::new(),
            history_flags: (false, false),
        }
    }

    pub fn store(&self) -> &GraphStore<R, C> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut GraphStore<R, C> {
        &mut self.store
    }

    pub fn patterns(&self) -> &PatternManager {
        &self.patterns
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn entities_mut(&mut self) -> &mut E {
        &mut self.entities
    }

    /// Events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    fn note_history(&mut self) {
        let flags = (self.store.can_undo(), self.store.can_redo());
        if flags != self.history_flags {
            self.history_flags = flags;
            self.events.push(EditorEvent::HistoryChanged { can_undo: flags.0, can_redo: flags.1 });
        }
    }

    fn after_switch(&mut self) {
        self.editing = None;
        self.overlay.cancel();
        self.note_history();
    }

    // ---- patterns ----

    /// Reads the entity list, then opens the project's first pattern.
    pub fn open_project(&mut self, project_id: &str) -> Result<Option<PatternId>, StoreError> {
        let list = self.entities.list(project_id);
        self.store.sync_entities(list);
        let r = self.patterns.open_project(&mut self.store, project_id);
        self.after_switch();
        r
    }

    /// Re-reads entities after the entity store changed elsewhere.
    pub fn refresh_entities(&mut self) -> bool {
        let Some(project) = self.patterns.project_id().map(str::to_string) else { return false };
        let list = self.entities.list(&project);
        self.store.sync_entities(list)
    }

    pub fn select_pattern(&mut self, id: &str) -> Result<bool, StoreError> {
        let r = self.patterns.select(&mut self.store, id);
        self.after_switch();
        r
    }

    pub fn create_pattern(&mut self, name: &str) -> Result<PatternId, StoreError> {
        let r = self.patterns.create(&mut self.store, name);
        self.after_switch();
        r
    }

    pub fn duplicate_pattern(&mut self, source: &str, name: &str) -> Result<Option<PatternId>, StoreError> {
        let r = self.patterns.duplicate(&mut self.store, source, name);
        self.after_switch();
        r
    }

    pub fn rename_pattern(&mut self, id: &str, name: &str) -> Result<bool, StoreError> {
        self.patterns.rename(&mut self.store, id, name)
    }

    pub fn delete_pattern(&mut self, id: &str) -> Result<bool, StoreError> {
        let r = self.patterns.delete(&mut self.store, id);
        self.after_switch();
        r
    }

    // ---- timers ----

    /// Fires due debounced work and reports it as events. Write failures
    /// become `SaveFailed` and are also returned.
    pub fn poll(&mut self) -> Result<PollOutcome, StoreError> {
        let active = self.store.active_pattern().map(str::to_string);
        let r = self.store.poll();
        match &r {
            Ok(out) if out.saved => {
                if let Some(pattern_id) = active {
                    self.events.push(EditorEvent::Saved { pattern_id });
                }
            }
            Err(e) => self.events.push(EditorEvent::SaveFailed { code: e.code().to_string(), message: e.to_string() }),
            _ => {}
        }
        self.note_history();
        r
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.store.next_deadline()
    }

    /// Flushes pending edits and tears the instance down.
    pub fn close(&mut self) -> Result<(), StoreError> {
        let r = self.store.flush().map(|_| ());
        if let Err(e) = &r {
            log::error!("final flush failed: {}", e);
        }
        self.store.teardown();
        self.editing = None;
        self.overlay.cancel();
        r
    }

    // ---- history ----

    pub fn undo(&mut self) -> bool {
        self.editing = None;
        let r = self.store.undo();
        self.note_history();
        r
    }

    pub fn redo(&mut self) -> bool {
        self.editing = None;
        let r = self.store.redo();
        self.note_history();
        r
    }

    pub fn clear_all(&mut self) {
        self.editing = None;
        self.store.clear_all();
        self.note_history();
    }

    pub fn delete_selected(&mut self) -> bool {
        self.store.delete_selected()
    }

    // ---- overlay ----

    pub fn set_tool(&mut self, name: &str) -> bool {
        match Tool::parse(name) {
            Some(tool) => {
                self.overlay.set_tool(tool);
                true
            }
            None => false,
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.overlay.set_viewport(viewport);
    }

    pub fn pointer_down(&mut self, screen: Point) -> bool {
        self.store.is_ready() && self.overlay.pointer_down(screen)
    }

    pub fn pointer_move(&mut self, screen: Point) {
        self.overlay.pointer_move(screen);
    }

    pub fn pointer_up(&mut self, screen: Point) -> bool {
        let commit = self.overlay.pointer_up(screen, self.store.doc(), self.store.config());
        match commit {
            Some(c) => self.apply_commit(c),
            None => false,
        }
    }

    pub fn cancel_gesture(&mut self) {
        self.overlay.cancel();
    }

    /// Click on empty canvas: places with a click tool, otherwise clears
    /// the selection.
    pub fn pane_click(&mut self, screen: Point) -> bool {
        if !self.store.is_ready() {
            return false;
        }
        match self.overlay.click(screen) {
            Some(c) => self.apply_commit(c),
            None => {
                self.store.select_only(None, None);
                false
            }
        }
    }

    fn apply_commit(&mut self, commit: Commit) -> bool {
        match commit {
            Commit::Rect { origin, size } => self.store.add_rect(origin, size).is_some(),
            Commit::Text { position } => match self.store.add_text(position, DEFAULT_TEXT) {
                Some(id) => {
                    self.begin_edit(&id);
                    true
                }
                None => false,
            },
            Commit::Symbol { position, glyph } => self.store.add_symbol(position, &glyph).is_some(),
            Commit::AddEntity { position } => {
                self.events.push(EditorEvent::AddEntityRequested { position });
                true
            }
            Commit::Connection { from, to, arrow } => {
                let color = EdgeStyle::default().color;
                let Some(source) = self.resolve_end(from, &color) else { return false };
                let Some(target) = self.resolve_end(to, &color) else { return false };
                let style = EdgeStyle { arrow, ..EdgeStyle::default() };
                self.store.connect(&source, &target, None, style).is_some()
            }
        }
    }

    fn resolve_end(&mut self, end: LineEnd, color: &str) -> Option<NodeId> {
        match end {
            LineEnd::Entity(id) => Some(id),
            LineEnd::Free(p) => self.store.add_anchor(p, Some(color.to_string())),
        }
    }

    /// An entity dragged in from the side list. Adds its node, or moves the
    /// existing one.
    pub fn drop_entity(&mut self, entity_id: &str, screen: Point) -> Option<NodeId> {
        let at = self.overlay.viewport().screen_to_doc(screen);
        self.store.add_entity_node(entity_id, at)
    }

    /// Primary click on an entity card.
    pub fn entity_clicked(&mut self, node_id: &str) -> Option<EntitySelect> {
        let node = self.store.doc().node(node_id)?;
        let select = EntityCard::from_node(node, self.store.kind())?.on_primary_click();
        self.store.select_only(Some(node_id), None);
        self.events.push(EditorEvent::OpenDetail {
            entity_id: select.entity_id.clone(),
            kind_tag: select.kind_tag.clone(),
        });
        Some(select)
    }

    // ---- inline editing ----

    pub fn begin_edit(&mut self, node_id: &str) -> bool {
        self.editing = self.store.doc().node(node_id).and_then(InlineEdit::begin);
        self.editing.is_some()
    }

    pub fn editing(&self) -> Option<&InlineEdit> {
        self.editing.as_ref()
    }

    pub fn edit_input(&mut self, text: &str) {
        if let Some(e) = self.editing.as_mut() {
            e.set_draft(text);
        }
    }

    /// Enter pressed in the editor. Returns whether the edit ended.
    pub fn edit_enter(&mut self, shift: bool) -> bool {
        match &self.editing {
            Some(e) if e.enter_commits(shift) => {
                self.edit_commit();
                true
            }
            _ => false,
        }
    }

    /// Blur (or Enter) commits; only a changed label reaches the store.
    pub fn edit_commit(&mut self) -> bool {
        let Some((id, patch)) = self.editing.take().and_then(InlineEdit::commit) else { return false };
        self.store.update_node(&id, &patch)
    }

    pub fn edit_cancel(&mut self) {
        self.editing = None;
    }

    // ---- export ----

    pub fn export_svg(&self) -> String {
        svg::render_document(self.store.doc())
    }
}
