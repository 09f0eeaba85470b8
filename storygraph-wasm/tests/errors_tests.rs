mod common;

use common::*;
use js_sys::{Reflect, JSON};
use storygraph_wasm::GraphEditor;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn code(v: &JsValue) -> String {
    get(&get(v, "error"), "code").as_string().unwrap_or_default()
}

#[wasm_bindgen_test]
fn unknown_ids_are_rejected() {
    let repo = memory_repo();
    let mut ed = open_editor(&repo);
    assert!(is_err_code(&ed.delete_node_res("nope"), "invalid_id"));
    assert!(is_err_code(&ed.update_node_res("nope", JSON::parse("{}").unwrap()), "invalid_id"));
    assert!(is_err_code(&ed.delete_edge_res("nope"), "invalid_id"));
    assert!(is_err_code(&ed.reverse_edge_res("nope"), "invalid_id"));
    assert!(is_err_code(&ed.select_pattern_res("nope"), "invalid_id"));
    assert!(is_err_code(&ed.rename_pattern_res("nope", "x"), "invalid_id"));
    assert!(is_err_code(&ed.drop_entity_res("404", 0.0, 0.0), "invalid_id"));
    let err = ed.delete_edge_res("e-missing");
    let data = get(&get(&err, "error"), "data");
    assert_eq!(get(&data, "kind").as_string().as_deref(), Some("edge"));
    assert_eq!(get(&data, "id").as_string().as_deref(), Some("e-missing"));
}

#[wasm_bindgen_test]
fn unknown_tool_is_invalid_mode() {
    let repo = memory_repo();
    let mut ed = open_editor(&repo);
    let r = ed.set_tool_res("lasso");
    assert_eq!(code(&r), "invalid_mode");
    assert_eq!(ed.tool(), "select");
    assert!(is_ok(&ed.set_tool_res("symbol-★")));
}

#[wasm_bindgen_test]
fn disconnect_needs_a_named_end() {
    let repo = memory_repo();
    let mut ed = open_editor(&repo);
    let a = ed.drop_entity("1", 0.0, 0.0).unwrap();
    let b = ed.drop_entity("2", 400.0, 0.0).unwrap();
    let e = ed.connect(&a, &b).unwrap();
    assert!(is_err_code(&ed.disconnect_endpoint_res(&e, "middle"), "invalid_end"));
    assert_eq!(len(&ed.nodes()), 2);
    let r = ed.disconnect_endpoint_res(&e, "target");
    assert!(is_ok(&r));
    assert_eq!(len(&ed.nodes()), 3);
}

#[wasm_bindgen_test]
fn numeric_arguments_are_validated() {
    let repo = memory_repo();
    let mut ed = open_editor(&repo);
    let r = ed.add_rect_res(f64::NAN, 0.0, 10.0, 10.0);
    assert_eq!(code(&r), "non_finite");
    assert_eq!(get(&get(&get(&r, "error"), "data"), "param").as_string().as_deref(), Some("x"));
    assert_eq!(code(&ed.add_rect_res(0.0, 0.0, 0.0, 10.0)), "out_of_range");
    assert_eq!(code(&ed.add_rect_res(0.0, 0.0, 10.0, -5.0)), "out_of_range");
    assert_eq!(code(&ed.add_anchor_res(f64::INFINITY, 0.0)), "non_finite");
    assert_eq!(code(&ed.set_viewport_res(0.0, 0.0, 0.0)), "out_of_range");
    assert_eq!(len(&ed.nodes()), 0);
}

#[wasm_bindgen_test]
fn plain_adds_refuse_non_finite_input() {
    let repo = memory_repo();
    let mut ed = open_editor(&repo);
    assert!(ed.add_rect(f64::NAN, 0.0, 10.0, 10.0).is_none());
    assert!(ed.add_rect(0.0, 0.0, f64::INFINITY, 10.0).is_none());
    assert!(ed.add_text(0.0, f64::NAN, "x").is_none());
    assert!(ed.add_anchor(f64::NEG_INFINITY, 0.0).is_none());
    assert_eq!(len(&ed.nodes()), 0);
    assert!(ed.add_anchor(5.0, 5.0).is_some());
}

#[wasm_bindgen_test]
fn self_connection_is_invalid_edge() {
    let repo = memory_repo();
    let mut ed = open_editor(&repo);
    let a = ed.drop_entity("1", 0.0, 0.0).unwrap();
    assert!(is_err_code(&ed.connect_res(&a, &a), "invalid_edge"));
    assert_eq!(len(&ed.edges()), 0);
}

#[wasm_bindgen_test]
fn malformed_payloads_are_invalid_json() {
    let repo = memory_repo();
    let mut ed = open_editor(&repo);
    let garbage = JSON::parse(r#"{"not":"a list"}"#).unwrap();
    assert!(is_err_code(&ed.apply_node_changes_res(garbage.clone()), "invalid_json"));
    assert!(is_err_code(&ed.apply_edge_changes_res(garbage.clone()), "invalid_json"));
    assert!(is_err_code(&ed.set_entities_res(garbage), "invalid_json"));
    let action = JSON::parse(r#"{"action":"teleport","value":1}"#).unwrap();
    assert!(is_err_code(&ed.panel_dispatch_res(action), "invalid_json"));
}

#[wasm_bindgen_test]
fn mutations_before_open_are_not_loaded() {
    let repo = memory_repo();
    let mut ed = GraphEditor::new(JsValue::from_str("character"), repo, JsValue::NULL, instant_config()).unwrap();
    assert_eq!(ed.state(), "uninitialized");
    assert!(is_err_code(&ed.add_rect_res(0.0, 0.0, 10.0, 10.0), "not_loaded"));
    assert!(is_err_code(&ed.add_text_res(0.0, 0.0, "x"), "not_loaded"));
    assert_eq!(len(&ed.nodes()), 0);
}

#[wasm_bindgen_test]
fn failed_write_is_persistence() {
    let repo = memory_repo();
    let mut ed = open_editor(&repo);
    ed.add_rect(0.0, 0.0, 50.0, 50.0).unwrap();
    Reflect::set(&repo, &JsValue::from_str("failSaves"), &JsValue::TRUE).unwrap();
    let r = ed.poll_res();
    assert_eq!(code(&r), "persistence");
    assert!(get(&get(&r, "error"), "message").as_string().unwrap().contains("disk full"));
    let events = JSON::stringify(&ed.drain_events()).unwrap().as_string().unwrap();
    assert!(events.contains("saveFailed"));
    // The edit itself survives in memory.
    assert_eq!(len(&ed.nodes()), 1);
}

#[wasm_bindgen_test]
fn unknown_kind_fails_construction() {
    let r = GraphEditor::new(JsValue::from_str("spaceship"), memory_repo(), JsValue::NULL, JsValue::NULL);
    assert!(r.is_err());
}
