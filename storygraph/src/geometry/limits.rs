// Caps applied when loading persisted patterns and validating host input

// Document size caps
pub const MAX_NODES: usize = 20_000;
pub const MAX_EDGES: usize = 50_000;

// Text caps
pub const MAX_LABEL_LEN: usize = 16 * 1024;

// Numeric bounds
pub const COORD_MIN: f64 = -10_000_000.0;
pub const COORD_MAX: f64 =  10_000_000.0;
pub const WIDTH_MAX: f64 = 1_000.0;

#[inline]
pub fn in_coord_bounds(x: f64) -> bool { x.is_finite() && x >= COORD_MIN && x <= COORD_MAX }

#[inline]
pub fn in_width_bounds(w: f64) -> bool { w.is_finite() && w > 0.0 && w <= WIDTH_MAX }
