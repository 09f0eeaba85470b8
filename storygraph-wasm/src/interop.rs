use js_sys::{Function, Object, Reflect};
use serde::Serialize;
use wasm_bindgen::JsValue;

pub fn new_obj() -> Object { Object::new() }
pub fn set_kv(obj: &Object, k: &str, v: &JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(k), v);
}

/// Plain JS objects (not `Map`s) for everything handed to the host.
pub fn to_js<T: Serialize + ?Sized>(v: &T) -> JsValue {
    let ser = serde_wasm_bindgen::Serializer::json_compatible();
    match v.serialize(&ser) {
        Ok(js) => js,
        Err(e) => {
            log::error!("failed to convert value for JS: {}", e);
            JsValue::NULL
        }
    }
}

pub fn opt_str(v: Option<String>) -> JsValue {
    v.map_or(JsValue::NULL, |s| JsValue::from_str(&s))
}

/// Method `name` of a host object, if it is callable.
pub fn method(obj: &JsValue, name: &str) -> Option<Function> {
    let f = Reflect::get(obj, &JsValue::from_str(name)).ok()?;
    if f.is_function() { Some(f.into()) } else { None }
}

/// Best-effort message of a thrown JS value.
pub fn js_error_message(e: &JsValue) -> String {
    if let Some(s) = e.as_string() {
        return s;
    }
    Reflect::get(e, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{:?}", e))
}
