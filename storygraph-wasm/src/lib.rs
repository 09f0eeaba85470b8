use wasm_bindgen::prelude::*;
mod api;
pub mod error;
mod host;
mod interop;

pub use api::{init_logging, render_pattern_svg};
pub use host::{JsClock, JsEntitySource, JsRepository};

type Inner = storygraph::Editor<JsRepository, JsClock, JsEntitySource>;

#[wasm_bindgen]
pub struct GraphEditor { pub(crate) inner: Inner }

impl GraphEditor {
    pub fn rs_new(kind: storygraph::EntityKind, config: storygraph::EditorConfig, repo: JsValue, entities: JsValue) -> GraphEditor {
        GraphEditor { inner: storygraph::Editor::new(kind, config, JsRepository::new(repo), JsClock, JsEntitySource::new(entities)) }
    }
}
