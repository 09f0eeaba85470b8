pub mod model;
pub mod geometry {
    pub mod curve;
    pub mod limits;
    pub mod math;
    pub mod tolerance;
}
pub mod clock;
pub mod config;
pub mod debounce;
pub mod document;
pub mod editor;
pub mod entity;
pub mod error;
pub mod history;
pub mod json;
pub mod nodes;
pub mod overlay;
pub mod panel;
pub mod patterns;
pub mod repository;
pub mod routing;
pub mod store;
pub mod svg;

pub use clock::{Clock, ManualClock};
pub use config::EditorConfig;
pub use debounce::Generation;
pub use document::{Document, EdgeChange, NodeChange};
pub use editor::{Editor, EditorEvent};
pub use entity::{Entity, EntityItemKind, EntityKind, EntitySource};
pub use error::StoreError;
pub use geometry::math::{Point, Rect, Size};
pub use model::{
    EdgeEnd, EdgePatch, GraphEdge, GraphNode, NodeKind, NodePatch, NodeStyle, Pattern, PatternData, Side,
};
pub use overlay::{Tool, Viewport};
pub use repository::{InMemoryRepository, PatternRepository};
pub use store::{GraphStore, LoadState, PollOutcome};
