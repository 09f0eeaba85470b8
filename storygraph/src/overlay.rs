//! Drawing overlay: the canvas tool mode machine.
//!
//! Pointer input arrives in screen coordinates. Drag thresholds are checked
//! in screen pixels so they feel the same at every zoom level; committed
//! geometry is converted to document coordinates through the [`Viewport`].
//! Every commit is single-shot and returns the tool to `Select`.

use crate::config::EditorConfig;
use crate::document::Document;
use crate::geometry::math::{Point, Rect, Size};
use crate::model::NodeId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tool {
    Select,
    AddEntity,
    Rect,
    Text,
    Arrow,
    Line,
    /// Places a single glyph (map symbols).
    Symbol(String),
}

impl Tool {
    /// `select`, `add-entity`, `rect`, `text`, `arrow`, `line`, `symbol-<glyph>`.
    pub fn parse(s: &str) -> Option<Tool> {
        Some(match s {
            "select" => Tool::Select,
            "add-entity" => Tool::AddEntity,
            "rect" => Tool::Rect,
            "text" => Tool::Text,
            "arrow" => Tool::Arrow,
            "line" => Tool::Line,
            _ => {
                let glyph = s.strip_prefix("symbol-")?;
                if glyph.is_empty() {
                    return None;
                }
                Tool::Symbol(glyph.to_string())
            }
        })
    }

    pub fn name(&self) -> String {
        match self {
            Tool::Select => "select".into(),
            Tool::AddEntity => "add-entity".into(),
            Tool::Rect => "rect".into(),
            Tool::Text => "text".into(),
            Tool::Arrow => "arrow".into(),
            Tool::Line => "line".into(),
            Tool::Symbol(g) => format!("symbol-{}", g),
        }
    }

    pub fn captures_drag(&self) -> bool {
        matches!(self, Tool::Rect | Tool::Arrow | Tool::Line)
    }
}

/// Canvas pan/zoom. `doc = (screen - pan) / zoom`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport { x: 0.0, y: 0.0, zoom: 1.0 }
    }
}

impl Viewport {
    pub fn screen_to_doc(&self, p: Point) -> Point {
        let z = if self.zoom > 0.0 && self.zoom.is_finite() { self.zoom } else { 1.0 };
        Point::new((p.x - self.x) / z, (p.y - self.y) / z)
    }

    pub fn doc_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.x, p.y * self.zoom + self.y)
    }
}

/// One end of a drawn line: bound to an entity or free at a document point.
#[derive(Clone, Debug, PartialEq)]
pub enum LineEnd {
    Entity(NodeId),
    Free(Point),
}

/// Result of a completed overlay gesture, applied by the caller.
#[derive(Clone, Debug, PartialEq)]
pub enum Commit {
    Rect { origin: Point, size: Size },
    Text { position: Point },
    Symbol { position: Point, glyph: String },
    AddEntity { position: Point },
    Connection { from: LineEnd, to: LineEnd, arrow: bool },
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Drag {
    start: Point,
    current: Point,
}

#[derive(Clone, Debug)]
pub struct Overlay {
    tool: Tool,
    viewport: Viewport,
    drag: Option<Drag>,
}

impl Default for Overlay {
    fn default() -> Self {
        Overlay::new()
    }
}

impl Overlay {
    pub fn new() -> Self {
        Overlay { tool: Tool::Select, viewport: Viewport::default(), drag: None }
    }

    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    /// Switching tools drops any drag in progress.
    pub fn set_tool(&mut self, tool: Tool) {
        self.drag = None;
        self.tool = tool;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Starts capture when the tool draws by dragging. Returns whether the
    /// overlay took the pointer.
    pub fn pointer_down(&mut self, screen: Point) -> bool {
        if !self.tool.captures_drag() {
            return false;
        }
        self.drag = Some(Drag { start: screen, current: screen });
        true
    }

    pub fn pointer_move(&mut self, screen: Point) {
        if let Some(d) = self.drag.as_mut() {
            d.current = screen;
        }
    }

    /// Ends a drag. Too-small drags are discarded and leave the tool armed.
    pub fn pointer_up(&mut self, screen: Point, doc: &Document, config: &EditorConfig) -> Option<Commit> {
        let mut drag = self.drag.take()?;
        drag.current = screen;
        let dx = (drag.current.x - drag.start.x).abs();
        let dy = (drag.current.y - drag.start.y).abs();
        let a = self.viewport.screen_to_doc(drag.start);
        let b = self.viewport.screen_to_doc(drag.current);
        let commit = match self.tool {
            Tool::Rect => {
                if dx <= config.min_drag_px || dy <= config.min_drag_px {
                    return None;
                }
                let r = Rect::from_corners(a, b);
                Commit::Rect { origin: Point::new(r.x, r.y), size: Size::new(r.width, r.height) }
            }
            Tool::Arrow | Tool::Line => {
                if drag.start.distance(drag.current) <= config.min_drag_px {
                    return None;
                }
                let from = bind_end(doc, a, config.hit_padding);
                let to = bind_end(doc, b, config.hit_padding);
                if let (LineEnd::Entity(x), LineEnd::Entity(y)) = (&from, &to) {
                    if x == y {
                        return None;
                    }
                }
                Commit::Connection { from, to, arrow: self.tool == Tool::Arrow }
            }
            _ => return None,
        };
        self.tool = Tool::Select;
        Some(commit)
    }

    /// Single-click placement for `Text`, `AddEntity` and `Symbol`.
    pub fn click(&mut self, screen: Point) -> Option<Commit> {
        let position = self.viewport.screen_to_doc(screen);
        let commit = match &self.tool {
            Tool::Text => Commit::Text { position },
            Tool::AddEntity => Commit::AddEntity { position },
            Tool::Symbol(glyph) => Commit::Symbol { position, glyph: glyph.clone() },
            _ => return None,
        };
        self.tool = Tool::Select;
        Some(commit)
    }

    pub fn cancel(&mut self) {
        self.drag = None;
    }

    /// Rubber band of the current drag in document coordinates.
    pub fn preview(&self) -> Option<(Point, Point)> {
        let d = self.drag?;
        Some((self.viewport.screen_to_doc(d.start), self.viewport.screen_to_doc(d.current)))
    }
}

fn bind_end(doc: &Document, p: Point, pad: f64) -> LineEnd {
    match doc.entity_at(p, pad, None) {
        Some(n) => LineEnd::Entity(n.id.clone()),
        None => LineEnd::Free(p),
    }
}
