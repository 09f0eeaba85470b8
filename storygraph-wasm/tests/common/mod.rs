#![allow(dead_code)]

use js_sys::{Function, Reflect, JSON};
use storygraph_wasm::GraphEditor;
use wasm_bindgen::JsValue;

/// Synchronous Map-backed repository, shaped like the host's cache layer.
pub fn memory_repo() -> JsValue {
    let make = Function::new_no_args(
        r#"
        const rows = new Map();
        let next = 0;
        return {
            saves: 0,
            failSaves: false,
            listPatterns(projectId) {
                return [...rows.values()].filter(p => p.projectId === projectId).map(p => ({ ...p }));
            },
            createPattern(projectId, name, data, createdAt) {
                const p = { id: `pattern-${++next}`, projectId, name,
                            nodesData: data.nodesData, edgesData: data.edgesData, createdAt };
                rows.set(p.id, p);
                return { ...p };
            },
            loadPattern(id) {
                const p = rows.get(id);
                return p ? { nodesData: p.nodesData, edgesData: p.edgesData } : null;
            },
            savePattern(id, data) {
                if (this.failSaves) throw new Error('disk full');
                const p = rows.get(id);
                if (!p) throw new Error('missing ' + id);
                p.nodesData = data.nodesData;
                p.edgesData = data.edgesData;
                this.saves += 1;
            },
            renamePattern(id, name) {
                const p = rows.get(id);
                if (!p) return false;
                p.name = name;
                return true;
            },
            deletePattern(id) { return rows.delete(id); },
        };
        "#,
    );
    make.call0(&JsValue::NULL).unwrap()
}

pub fn entities() -> JsValue {
    JSON::parse(
        r#"[
            {"id":"1","name":"Harbor","kind":"item","colorToken":"blue"},
            {"id":"2","name":"Lighthouse","kind":"item"},
            {"id":"9","name":"Coast","kind":"folder"}
        ]"#,
    )
    .unwrap()
}

/// Debounces disabled, so a single `poll` fires everything.
pub fn instant_config() -> JsValue {
    JSON::parse(r#"{"autosaveDelayMs":0,"historyDelayMs":0}"#).unwrap()
}

pub fn open_editor(repo: &JsValue) -> GraphEditor {
    let mut ed = GraphEditor::new(JsValue::from_str("location"), repo.clone(), JsValue::NULL, instant_config()).unwrap();
    ed.set_entities(entities());
    ed.open_project("novel").unwrap();
    ed
}

pub fn get(v: &JsValue, key: &str) -> JsValue {
    Reflect::get(v, &JsValue::from_str(key)).unwrap()
}

pub fn is_ok(v: &JsValue) -> bool {
    get(v, "ok").as_bool().unwrap_or(false)
}

pub fn is_err_code(v: &JsValue, code: &str) -> bool {
    if is_ok(v) {
        return false;
    }
    get(&get(v, "error"), "code").as_string().map_or(false, |s| s == code)
}

pub fn len(v: &JsValue) -> u32 {
    js_sys::Array::from(v).length()
}
