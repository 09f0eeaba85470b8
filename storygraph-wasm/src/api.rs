use crate::error;
use crate::interop::{opt_str, to_js};
use crate::GraphEditor;
use storygraph::geometry::limits;
use storygraph::nodes::{edge_views, node_views};
use storygraph::panel::{self, PanelAction};
use storygraph::{
    EdgeChange, EdgeEnd, EdgePatch, EditorConfig, Entity, EntityKind, LoadState, NodeChange, NodePatch, Point, Size,
    Viewport,
};
use wasm_bindgen::prelude::*;
type JsValue = wasm_bindgen::JsValue;

/// Installs the console logger (`level`: error, warn, info, debug, trace;
/// default info) and, when built with it, the panic hook.
#[wasm_bindgen]
pub fn init_logging(level: Option<String>) {
    let level = level
        .as_deref()
        .and_then(|l| l.parse::<log::Level>().ok())
        .unwrap_or(log::Level::Info);
    let _ = console_log::init_with_level(level);
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Renders serialized pattern data to SVG for image export.
#[wasm_bindgen]
pub fn render_pattern_svg(nodes_data: &str, edges_data: &str) -> String {
    storygraph::svg::render_pattern(nodes_data, edges_data)
}

fn parse_kind(v: &JsValue) -> Result<EntityKind, JsValue> {
    if let Some(s) = v.as_string() {
        return match s.as_str() {
            "character" | "characters" => Ok(EntityKind::characters()),
            "location" | "locations" => Ok(EntityKind::locations()),
            _ => Err(error::invalid_json("kind", format!("unknown entity kind '{}'", s))),
        };
    }
    serde_wasm_bindgen::from_value(v.clone()).map_err(|e| error::invalid_json("kind", e))
}

fn parse_config(v: JsValue) -> Result<EditorConfig, JsValue> {
    if v.is_null() || v.is_undefined() {
        return Ok(EditorConfig::default());
    }
    let raw: serde_json::Value = serde_wasm_bindgen::from_value(v).map_err(|e| error::invalid_json("config", e))?;
    Ok(EditorConfig::from_json_value(raw))
}

fn check_point(x: f64, y: f64) -> Option<JsValue> {
    for (name, v) in [("x", x), ("y", y)] {
        if !v.is_finite() {
            return Some(error::non_finite(name));
        }
        if !limits::in_coord_bounds(v) {
            return Some(error::out_of_range(name, limits::COORD_MIN, limits::COORD_MAX, v));
        }
    }
    None
}

fn valid_extent(v: f64) -> bool {
    v.is_finite() && v > 0.0 && v <= limits::COORD_MAX
}

fn parse_end(end: &str) -> Option<EdgeEnd> {
    match end {
        "source" => Some(EdgeEnd::Source),
        "target" => Some(EdgeEnd::Target),
        _ => None,
    }
}

#[wasm_bindgen]
impl GraphEditor {
    /// `kind`: `"character"`, `"location"` or a full kind descriptor.
    /// `repo`: object with `listPatterns`, `createPattern`, `loadPattern`,
    /// `savePattern`, `renamePattern`, `deletePattern`. `entities`: object
    /// with `list(projectId)`, or null to push lists via `set_entities`.
    #[wasm_bindgen(constructor)]
    pub fn new(kind: JsValue, repo: JsValue, entities: JsValue, config: JsValue) -> Result<GraphEditor, JsValue> {
        let kind = parse_kind(&kind)?;
        let config = parse_config(config)?;
        Ok(GraphEditor::rs_new(kind, config, repo, entities))
    }

    // Lifecycle
    pub fn state(&self) -> String {
        match self.inner.store().state() {
            LoadState::Uninitialized => "uninitialized",
            LoadState::Loading => "loading",
            LoadState::Ready => "ready",
        }
        .to_string()
    }
    pub fn open_project(&mut self, project_id: &str) -> Option<String> {
        self.inner.open_project(project_id).unwrap_or_else(|e| {
            log::error!("open_project failed: {}", e);
            None
        })
    }
    pub fn open_project_res(&mut self, project_id: &str) -> JsValue {
        error::result(self.inner.open_project(project_id), opt_str)
    }
    pub fn close(&mut self) -> bool {
        self.inner.close().is_ok()
    }
    pub fn close_res(&mut self) -> JsValue {
        error::result(self.inner.close(), |_| JsValue::TRUE)
    }
    pub fn generation(&self) -> f64 {
        self.inner.store().generation().value() as f64
    }

    // Timers
    /// Earliest pending deadline (ms since epoch); the host arms one timer
    /// for it and calls `poll` when it fires.
    pub fn next_deadline(&self) -> Option<f64> {
        self.inner.next_deadline()
    }
    pub fn poll(&mut self) -> bool {
        match self.inner.poll() {
            Ok(o) => o.saved || o.captured,
            Err(_) => false,
        }
    }
    pub fn poll_res(&mut self) -> JsValue {
        error::result(self.inner.poll(), |o| {
            let obj = crate::interop::new_obj();
            crate::interop::set_kv(&obj, "saved", &JsValue::from_bool(o.saved));
            crate::interop::set_kv(&obj, "captured", &JsValue::from_bool(o.captured));
            obj.into()
        })
    }
    pub fn save_now_res(&mut self) -> JsValue {
        error::result(self.inner.store_mut().save_now(), |_| JsValue::TRUE)
    }
    pub fn drain_events(&mut self) -> JsValue {
        to_js(&self.inner.drain_events())
    }

    // Patterns
    pub fn patterns(&self) -> JsValue {
        to_js(self.inner.patterns().patterns())
    }
    pub fn active_pattern(&self) -> Option<String> {
        self.inner.store().active_pattern().map(str::to_string)
    }
    pub fn select_pattern(&mut self, id: &str) -> bool {
        self.inner.select_pattern(id).unwrap_or(false)
    }
    pub fn select_pattern_res(&mut self, id: &str) -> JsValue {
        match self.inner.select_pattern(id) {
            Ok(false) => error::invalid_id("pattern", id),
            r => error::result(r, JsValue::from_bool),
        }
    }
    pub fn create_pattern(&mut self, name: &str) -> Option<String> {
        self.inner.create_pattern(name).ok()
    }
    pub fn create_pattern_res(&mut self, name: &str) -> JsValue {
        error::result(self.inner.create_pattern(name), |id| JsValue::from_str(&id))
    }
    pub fn duplicate_pattern(&mut self, source: &str, name: &str) -> Option<String> {
        self.inner.duplicate_pattern(source, name).ok().flatten()
    }
    pub fn duplicate_pattern_res(&mut self, source: &str, name: &str) -> JsValue {
        match self.inner.duplicate_pattern(source, name) {
            Ok(None) => error::invalid_id("pattern", source),
            r => error::result(r, opt_str),
        }
    }
    pub fn rename_pattern(&mut self, id: &str, name: &str) -> bool {
        self.inner.rename_pattern(id, name).unwrap_or(false)
    }
    pub fn rename_pattern_res(&mut self, id: &str, name: &str) -> JsValue {
        if self.inner.patterns().get(id).is_none() {
            return error::invalid_id("pattern", id);
        }
        error::result(self.inner.rename_pattern(id, name), JsValue::from_bool)
    }
    pub fn delete_pattern(&mut self, id: &str) -> bool {
        self.inner.delete_pattern(id).unwrap_or(false)
    }
    pub fn delete_pattern_res(&mut self, id: &str) -> JsValue {
        match self.inner.delete_pattern(id) {
            Ok(false) => error::invalid_id("pattern", id),
            r => error::result(r, JsValue::from_bool),
        }
    }

    // Entities
    pub fn set_entities(&mut self, list: JsValue) -> bool {
        match serde_wasm_bindgen::from_value::<Vec<Entity>>(list) {
            Ok(list) => {
                self.inner.entities_mut().set(list.clone());
                self.inner.store_mut().sync_entities(list)
            }
            Err(e) => {
                log::warn!("ignoring malformed entity list: {}", e);
                false
            }
        }
    }
    pub fn set_entities_res(&mut self, list: JsValue) -> JsValue {
        match serde_wasm_bindgen::from_value::<Vec<Entity>>(list) {
            Ok(list) => {
                self.inner.entities_mut().set(list.clone());
                error::ok(JsValue::from_bool(self.inner.store_mut().sync_entities(list)))
            }
            Err(e) => error::invalid_json("list", e),
        }
    }
    pub fn refresh_entities(&mut self) -> bool {
        self.inner.refresh_entities()
    }

    // Views
    pub fn nodes(&self) -> JsValue {
        to_js(&node_views(self.inner.store().doc(), self.inner.store().kind()))
    }
    pub fn edges(&self) -> JsValue {
        to_js(&edge_views(self.inner.store().doc()))
    }
    pub fn panel(&self) -> JsValue {
        to_js(&panel::view(self.inner.store().doc()))
    }
    pub fn can_undo(&self) -> bool {
        self.inner.store().can_undo()
    }
    pub fn can_redo(&self) -> bool {
        self.inner.store().can_redo()
    }
    pub fn export_svg(&self) -> String {
        self.inner.export_svg()
    }
    /// Persisted form of the live graph: `{ nodesData, edgesData }`.
    pub fn serialize_res(&self) -> JsValue {
        error::result(self.inner.store().encode(), |d| to_js(&d))
    }

    // Direct manipulation
    pub fn apply_node_changes(&mut self, changes: JsValue) -> bool {
        match serde_wasm_bindgen::from_value::<Vec<NodeChange>>(changes) {
            Ok(c) => {
                self.inner.store_mut().apply_node_changes(&c);
                true
            }
            Err(_) => false,
        }
    }
    pub fn apply_node_changes_res(&mut self, changes: JsValue) -> JsValue {
        match serde_wasm_bindgen::from_value::<Vec<NodeChange>>(changes) {
            Ok(c) => {
                self.inner.store_mut().apply_node_changes(&c);
                error::ok(JsValue::TRUE)
            }
            Err(e) => error::invalid_json("changes", e),
        }
    }
    pub fn apply_edge_changes(&mut self, changes: JsValue) -> bool {
        match serde_wasm_bindgen::from_value::<Vec<EdgeChange>>(changes) {
            Ok(c) => {
                self.inner.store_mut().apply_edge_changes(&c);
                true
            }
            Err(_) => false,
        }
    }
    pub fn apply_edge_changes_res(&mut self, changes: JsValue) -> JsValue {
        match serde_wasm_bindgen::from_value::<Vec<EdgeChange>>(changes) {
            Ok(c) => {
                self.inner.store_mut().apply_edge_changes(&c);
                error::ok(JsValue::TRUE)
            }
            Err(e) => error::invalid_json("changes", e),
        }
    }

    // Nodes
    pub fn add_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Option<String> {
        if check_point(x, y).is_some() || !valid_extent(w) || !valid_extent(h) {
            return None;
        }
        self.inner.store_mut().add_rect(Point::new(x, y), Size::new(w, h))
    }
    pub fn add_rect_res(&mut self, x: f64, y: f64, w: f64, h: f64) -> JsValue {
        if let Some(e) = check_point(x, y) {
            return e;
        }
        for (name, v) in [("w", w), ("h", h)] {
            if !v.is_finite() {
                return error::non_finite(name);
            }
            if !valid_extent(v) {
                return error::out_of_range(name, 0.0, limits::COORD_MAX, v);
            }
        }
        match self.inner.store_mut().add_rect(Point::new(x, y), Size::new(w, h)) {
            Some(id) => error::ok(JsValue::from_str(&id)),
            None => error::not_loaded(),
        }
    }
    pub fn add_text(&mut self, x: f64, y: f64, text: &str) -> Option<String> {
        if check_point(x, y).is_some() || text.len() > limits::MAX_LABEL_LEN {
            return None;
        }
        self.inner.store_mut().add_text(Point::new(x, y), text)
    }
    pub fn add_text_res(&mut self, x: f64, y: f64, text: &str) -> JsValue {
        if let Some(e) = check_point(x, y) {
            return e;
        }
        if text.len() > limits::MAX_LABEL_LEN {
            return error::out_of_range("text", 0.0, limits::MAX_LABEL_LEN as f64, text.len() as f64);
        }
        match self.inner.store_mut().add_text(Point::new(x, y), text) {
            Some(id) => error::ok(JsValue::from_str(&id)),
            None => error::not_loaded(),
        }
    }
    pub fn add_anchor(&mut self, x: f64, y: f64) -> Option<String> {
        if check_point(x, y).is_some() {
            return None;
        }
        self.inner.store_mut().add_anchor(Point::new(x, y), None)
    }
    pub fn add_anchor_res(&mut self, x: f64, y: f64) -> JsValue {
        if let Some(e) = check_point(x, y) {
            return e;
        }
        match self.inner.store_mut().add_anchor(Point::new(x, y), None) {
            Some(id) => error::ok(JsValue::from_str(&id)),
            None => error::not_loaded(),
        }
    }
    pub fn update_node(&mut self, id: &str, patch: JsValue) -> bool {
        match serde_wasm_bindgen::from_value::<NodePatch>(patch) {
            Ok(p) => self.inner.store_mut().update_node(id, &p),
            Err(_) => false,
        }
    }
    pub fn update_node_res(&mut self, id: &str, patch: JsValue) -> JsValue {
        if !self.inner.store().doc().has_node(id) {
            return error::invalid_id("node", id);
        }
        match serde_wasm_bindgen::from_value::<NodePatch>(patch) {
            Ok(p) => error::ok(JsValue::from_bool(self.inner.store_mut().update_node(id, &p))),
            Err(e) => error::invalid_json("patch", e),
        }
    }
    pub fn delete_node(&mut self, id: &str) -> bool {
        self.inner.store_mut().delete_node(id)
    }
    pub fn delete_node_res(&mut self, id: &str) -> JsValue {
        if !self.inner.store().doc().has_node(id) {
            return error::invalid_id("node", id);
        }
        error::ok(JsValue::from_bool(self.inner.store_mut().delete_node(id)))
    }
    pub fn drop_entity(&mut self, entity_id: &str, screen_x: f64, screen_y: f64) -> Option<String> {
        self.inner.drop_entity(entity_id, Point::new(screen_x, screen_y))
    }
    pub fn drop_entity_res(&mut self, entity_id: &str, screen_x: f64, screen_y: f64) -> JsValue {
        if let Some(e) = check_point(screen_x, screen_y) {
            return e;
        }
        if self.inner.store().entity(entity_id).is_none() {
            return error::invalid_id("entity", entity_id);
        }
        match self.inner.drop_entity(entity_id, Point::new(screen_x, screen_y)) {
            Some(id) => error::ok(JsValue::from_str(&id)),
            None => error::ok(JsValue::NULL),
        }
    }
    /// Primary click on an entity card: `{ entityId, kindTag, stopPropagation }`.
    pub fn entity_clicked(&mut self, node_id: &str) -> JsValue {
        to_js(&self.inner.entity_clicked(node_id))
    }

    // Edges
    pub fn connect(&mut self, source: &str, target: &str) -> Option<String> {
        self.inner.store_mut().connect(source, target, None, Default::default())
    }
    pub fn connect_res(&mut self, source: &str, target: &str) -> JsValue {
        for id in [source, target] {
            if !self.inner.store().doc().has_node(id) {
                return error::invalid_id("node", id);
            }
        }
        if source == target {
            return error::err("invalid_edge", "edge endpoints cannot be the same node", None);
        }
        error::ok(opt_str(self.inner.store_mut().connect(source, target, None, Default::default())))
    }
    pub fn update_edge(&mut self, id: &str, patch: JsValue) -> bool {
        match serde_wasm_bindgen::from_value::<EdgePatch>(patch) {
            Ok(p) => self.inner.store_mut().update_edge(id, &p),
            Err(_) => false,
        }
    }
    pub fn update_edge_res(&mut self, id: &str, patch: JsValue) -> JsValue {
        if self.inner.store().doc().edge(id).is_none() {
            return error::invalid_id("edge", id);
        }
        let p = match serde_wasm_bindgen::from_value::<EdgePatch>(patch) {
            Ok(p) => p,
            Err(e) => return error::invalid_json("patch", e),
        };
        if let Some(w) = p.stroke_width {
            if !w.is_finite() {
                return error::non_finite("strokeWidth");
            }
            if !limits::in_width_bounds(w) {
                return error::out_of_range("strokeWidth", 0.0, limits::WIDTH_MAX, w);
            }
        }
        error::ok(JsValue::from_bool(self.inner.store_mut().update_edge(id, &p)))
    }
    pub fn delete_edge(&mut self, id: &str) -> bool {
        self.inner.store_mut().delete_edge(id)
    }
    pub fn delete_edge_res(&mut self, id: &str) -> JsValue {
        if self.inner.store().doc().edge(id).is_none() {
            return error::invalid_id("edge", id);
        }
        error::ok(JsValue::from_bool(self.inner.store_mut().delete_edge(id)))
    }
    pub fn reverse_edge(&mut self, id: &str) -> bool {
        self.inner.store_mut().reverse_edge(id)
    }
    pub fn reverse_edge_res(&mut self, id: &str) -> JsValue {
        if self.inner.store().doc().edge(id).is_none() {
            return error::invalid_id("edge", id);
        }
        error::ok(JsValue::from_bool(self.inner.store_mut().reverse_edge(id)))
    }
    /// `end`: `"source"` or `"target"`. Returns the new anchor id.
    pub fn disconnect_endpoint(&mut self, id: &str, end: &str) -> Option<String> {
        let end = parse_end(end)?;
        self.inner.store_mut().disconnect_endpoint(id, end)
    }
    pub fn disconnect_endpoint_res(&mut self, id: &str, end: &str) -> JsValue {
        let Some(which) = parse_end(end) else { return error::invalid_end(end) };
        if self.inner.store().doc().edge(id).is_none() {
            return error::invalid_id("edge", id);
        }
        error::ok(opt_str(self.inner.store_mut().disconnect_endpoint(id, which)))
    }
    pub fn delete_selected(&mut self) -> bool {
        self.inner.delete_selected()
    }

    // History
    pub fn undo(&mut self) -> bool {
        self.inner.undo()
    }
    pub fn redo(&mut self) -> bool {
        self.inner.redo()
    }
    pub fn clear_all(&mut self) {
        self.inner.clear_all()
    }

    // Properties panel
    pub fn panel_dispatch(&mut self, action: JsValue) -> bool {
        match serde_wasm_bindgen::from_value::<PanelAction>(action) {
            Ok(a) => panel::dispatch(self.inner.store_mut(), a),
            Err(_) => false,
        }
    }
    pub fn panel_dispatch_res(&mut self, action: JsValue) -> JsValue {
        match serde_wasm_bindgen::from_value::<PanelAction>(action) {
            Ok(a) => error::ok(JsValue::from_bool(panel::dispatch(self.inner.store_mut(), a))),
            Err(e) => error::invalid_json("action", e),
        }
    }

    // Overlay
    pub fn tool(&self) -> String {
        self.inner.overlay().tool().name()
    }
    pub fn set_tool(&mut self, name: &str) -> bool {
        self.inner.set_tool(name)
    }
    pub fn set_tool_res(&mut self, name: &str) -> JsValue {
        if self.inner.set_tool(name) { error::ok(JsValue::TRUE) } else { error::invalid_mode(name) }
    }
    pub fn set_viewport(&mut self, x: f64, y: f64, zoom: f64) -> bool {
        if !(x.is_finite() && y.is_finite() && zoom.is_finite() && zoom > 0.0) {
            return false;
        }
        self.inner.set_viewport(Viewport { x, y, zoom });
        true
    }
    pub fn set_viewport_res(&mut self, x: f64, y: f64, zoom: f64) -> JsValue {
        for (name, v) in [("x", x), ("y", y), ("zoom", zoom)] {
            if !v.is_finite() {
                return error::non_finite(name);
            }
        }
        if zoom <= 0.0 {
            return error::out_of_range("zoom", 0.0, f64::MAX, zoom);
        }
        self.inner.set_viewport(Viewport { x, y, zoom });
        error::ok(JsValue::TRUE)
    }
    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        self.inner.pointer_down(Point::new(x, y))
    }
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.inner.pointer_move(Point::new(x, y))
    }
    pub fn pointer_up(&mut self, x: f64, y: f64) -> bool {
        self.inner.pointer_up(Point::new(x, y))
    }
    pub fn pane_click(&mut self, x: f64, y: f64) -> bool {
        self.inner.pane_click(Point::new(x, y))
    }
    pub fn cancel_gesture(&mut self) {
        self.inner.cancel_gesture()
    }
    /// Rubber band of the drag in progress: `[x0, y0, x1, y1]` or null.
    pub fn drag_preview(&self) -> JsValue {
        match self.inner.overlay().preview() {
            Some((a, b)) => to_js(&[a.x, a.y, b.x, b.y]),
            None => JsValue::NULL,
        }
    }

    // Inline editing
    pub fn begin_edit(&mut self, node_id: &str) -> bool {
        self.inner.begin_edit(node_id)
    }
    pub fn edit_input(&mut self, text: &str) {
        self.inner.edit_input(text)
    }
    pub fn edit_enter(&mut self, shift: bool) -> bool {
        self.inner.edit_enter(shift)
    }
    pub fn edit_commit(&mut self) -> bool {
        self.inner.edit_commit()
    }
    pub fn edit_cancel(&mut self) {
        self.inner.edit_cancel()
    }
    pub fn editing_node(&self) -> Option<String> {
        self.inner.editing().map(|e| e.node_id().to_string())
    }
}
