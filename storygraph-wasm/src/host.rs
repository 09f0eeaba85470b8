//! Collaborators backed by host JS objects.
//!
//! Repository methods must answer synchronously (typically from a cache the
//! host keeps in front of IndexedDB). A thrown exception becomes a
//! persistence error.

use crate::interop::{js_error_message, method};
use js_sys::Array;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use storygraph::{Clock, Entity, EntitySource, Pattern, PatternData, PatternRepository, StoreError};
use wasm_bindgen::JsValue;

pub struct JsRepository {
    obj: JsValue,
}

impl JsRepository {
    pub fn new(obj: JsValue) -> Self {
        JsRepository { obj }
    }

    fn call(&self, name: &str, args: &[JsValue]) -> Result<JsValue, StoreError> {
        let f = method(&self.obj, name)
            .ok_or_else(|| StoreError::Persistence(format!("repository has no '{}' method", name)))?;
        let argv: Array = args.iter().collect();
        f.apply(&self.obj, &argv)
            .map_err(|e| StoreError::Persistence(format!("{}: {}", name, js_error_message(&e))))
    }

    fn parse<T: DeserializeOwned>(name: &str, v: JsValue) -> Result<T, StoreError> {
        serde_wasm_bindgen::from_value(v)
            .map_err(|e| StoreError::Persistence(format!("{} returned an unexpected value: {}", name, e)))
    }
}

fn data_to_js(data: &PatternData) -> JsValue {
    crate::interop::to_js(data)
}

impl PatternRepository for JsRepository {
    fn list_patterns(&self, project_id: &str) -> Result<Vec<Pattern>, StoreError> {
        let v = self.call("listPatterns", &[JsValue::from_str(project_id)])?;
        let mut list: Vec<Pattern> = Self::parse("listPatterns", v)?;
        list.sort_by(|a, b| a.created_at.total_cmp(&b.created_at));
        Ok(list)
    }

    fn create_pattern(
        &mut self,
        project_id: &str,
        name: &str,
        data: PatternData,
        created_at: f64,
    ) -> Result<Pattern, StoreError> {
        let v = self.call(
            "createPattern",
            &[JsValue::from_str(project_id), JsValue::from_str(name), data_to_js(&data), JsValue::from_f64(created_at)],
        )?;
        Self::parse("createPattern", v)
    }

    fn load_pattern(&self, id: &str) -> Result<Option<PatternData>, StoreError> {
        let v = self.call("loadPattern", &[JsValue::from_str(id)])?;
        if v.is_null() || v.is_undefined() {
            return Ok(None);
        }
        Self::parse("loadPattern", v).map(Some)
    }

    fn save_pattern(&mut self, id: &str, data: &PatternData) -> Result<(), StoreError> {
        self.call("savePattern", &[JsValue::from_str(id), data_to_js(data)])?;
        Ok(())
    }

    fn rename_pattern(&mut self, id: &str, name: &str) -> Result<bool, StoreError> {
        let v = self.call("renamePattern", &[JsValue::from_str(id), JsValue::from_str(name)])?;
        Ok(v.as_bool().unwrap_or(true))
    }

    fn delete_pattern(&mut self, id: &str) -> Result<bool, StoreError> {
        let v = self.call("deletePattern", &[JsValue::from_str(id)])?;
        Ok(v.as_bool().unwrap_or(true))
    }
}

/// Entity list either pulled from a host object with `list(projectId)` or
/// pushed through `set`. The last good list is kept, so a failing host call
/// never empties the canvas.
pub struct JsEntitySource {
    source: Option<JsValue>,
    cache: RefCell<Vec<Entity>>,
}

impl JsEntitySource {
    pub fn new(source: JsValue) -> Self {
        let source = if source.is_null() || source.is_undefined() { None } else { Some(source) };
        JsEntitySource { source, cache: RefCell::new(Vec::new()) }
    }

    pub fn set(&mut self, list: Vec<Entity>) {
        *self.cache.borrow_mut() = list;
    }
}

impl EntitySource for JsEntitySource {
    fn list(&self, project_id: &str) -> Vec<Entity> {
        let Some(src) = self.source.as_ref() else { return self.cache.borrow().clone() };
        if let Some(f) = method(src, "list") {
            let fetched = f
                .call1(src, &JsValue::from_str(project_id))
                .map_err(|e| js_error_message(&e))
                .and_then(|v| serde_wasm_bindgen::from_value::<Vec<Entity>>(v).map_err(|e| e.to_string()));
            match fetched {
                Ok(list) => *self.cache.borrow_mut() = list,
                Err(e) => log::warn!("entity source failed, keeping last list: {}", e),
            }
        }
        self.cache.borrow().clone()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct JsClock;

impl Clock for JsClock {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}
