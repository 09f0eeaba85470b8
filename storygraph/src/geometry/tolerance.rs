// Numeric slack shared by the curve and routing code

pub const EPS_LEN: f64 = 1e-9;            // endpoints closer than this are one point
pub const EPS_CURVATURE: f64 = 1e-9;      // offsets below this draw as a straight segment

#[inline] pub fn near_zero(x: f64, eps: f64) -> bool { x.abs() <= eps }

/// Unit vector and length; a degenerate input yields `((0, 0), 0)`.
#[inline]
pub fn norm2(x: f64, y: f64) -> ((f64, f64), f64) {
    let len = (x * x + y * y).sqrt();
    if len > EPS_LEN { ((x / len, y / len), len) } else { ((0.0, 0.0), 0.0) }
}
