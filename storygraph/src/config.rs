use serde::{Deserialize, Serialize};

#[cfg(not(feature = "long-history"))]
pub const DEFAULT_HISTORY_LIMIT: usize = 20;
#[cfg(feature = "long-history")]
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

/// Tunables for one editor instance. Every field has a default, so a host
/// can pass a partial JSON object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Quiet period before the active pattern is written back.
    pub autosave_delay_ms: f64,
    /// Quiet period before a history snapshot is taken.
    pub history_delay_ms: f64,
    pub history_limit: usize,
    /// Distance between parallel edges of one node pair.
    pub curvature_spacing: f64,
    /// Smallest drag (screen px) that commits a rect, line or arrow.
    pub min_drag_px: f64,
    /// Slack around entity boxes when binding line endpoints.
    pub hit_padding: f64,
    /// How far beyond an entity a detached endpoint's anchor is placed.
    pub detach_offset: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            autosave_delay_ms: 600.0,
            history_delay_ms: 300.0,
            history_limit: DEFAULT_HISTORY_LIMIT,
            curvature_spacing: 50.0,
            min_drag_px: 10.0,
            hit_padding: 8.0,
            detach_offset: 30.0,
        }
    }
}

impl EditorConfig {
    /// Parse a partial config, keeping defaults for anything missing or invalid.
    pub fn from_json_value(v: serde_json::Value) -> Self {
        match serde_json::from_value::<EditorConfig>(v) {
            Ok(cfg) => cfg.sanitized(),
            Err(e) => {
                log::warn!("ignoring invalid editor config: {}", e);
                EditorConfig::default()
            }
        }
    }

    fn sanitized(mut self) -> Self {
        let d = EditorConfig::default();
        let fix = |v: f64, fallback: f64| if v.is_finite() && v >= 0.0 { v } else { fallback };
        self.autosave_delay_ms = fix(self.autosave_delay_ms, d.autosave_delay_ms);
        self.history_delay_ms = fix(self.history_delay_ms, d.history_delay_ms);
        self.curvature_spacing = fix(self.curvature_spacing, d.curvature_spacing);
        self.min_drag_px = fix(self.min_drag_px, d.min_drag_px);
        self.hit_padding = fix(self.hit_padding, d.hit_padding);
        self.detach_offset = fix(self.detach_offset, d.detach_offset);
        if self.history_limit == 0 {
            self.history_limit = 1;
        }
        self
    }
}
