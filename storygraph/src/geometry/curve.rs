//! Edge path geometry for straight and curved connections.
//!
//! A curved edge is a single quadratic Bézier whose control point is the
//! segment midpoint pushed along the unit perpendicular by `curvature`
//! document units. Parallel edges between the same pair of nodes receive
//! different curvatures so they fan out instead of overlapping.

use super::math::{quad_point, Point};
use super::tolerance::{near_zero, norm2, EPS_CURVATURE};

/// Resolved geometry of one edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EdgePath {
    Line { from: Point, to: Point },
    Quad { from: Point, ctrl: Point, to: Point },
}

impl EdgePath {
    /// SVG path data (`d` attribute).
    pub fn to_svg(&self) -> String {
        match self {
            EdgePath::Line { from, to } => format!("M {} {} L {} {}", from.x, from.y, to.x, to.y),
            EdgePath::Quad { from, ctrl, to } => format!(
                "M {} {} Q {} {}, {} {}",
                from.x, from.y, ctrl.x, ctrl.y, to.x, to.y
            ),
        }
    }

    /// Evaluate the path at parameter t ∈ [0, 1].
    pub fn eval(&self, t: f64) -> Point {
        match *self {
            EdgePath::Line { from, to } => super::math::lerp(from, to, t),
            EdgePath::Quad { from, ctrl, to } => quad_point(t, from, ctrl, to),
        }
    }
}

/// Unit perpendicular of the segment, `(0, 0)` for a zero-length segment.
fn perpendicular(sx: f64, sy: f64, tx: f64, ty: f64) -> (f64, f64) {
    let ((ux, uy), _) = norm2(tx - sx, ty - sy);
    (-uy, ux)
}

fn control_point(sx: f64, sy: f64, tx: f64, ty: f64, curvature: f64) -> Point {
    let (px, py) = perpendicular(sx, sy, tx, ty);
    Point {
        x: (sx + tx) * 0.5 + px * curvature,
        y: (sy + ty) * 0.5 + py * curvature,
    }
}

pub fn edge_path(sx: f64, sy: f64, tx: f64, ty: f64, curvature: f64) -> EdgePath {
    let from = Point::new(sx, sy);
    let to = Point::new(tx, ty);
    if near_zero(curvature, EPS_CURVATURE) {
        return EdgePath::Line { from, to };
    }
    EdgePath::Quad { from, ctrl: control_point(sx, sy, tx, ty, curvature), to }
}

/// Label position: the curve at t = 0.5, not the chord midpoint.
pub fn curve_label_anchor(sx: f64, sy: f64, tx: f64, ty: f64, curvature: f64) -> Point {
    edge_path(sx, sy, tx, ty, curvature).eval(0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_curvature_is_a_line() {
        let p = edge_path(0.0, 0.0, 100.0, 0.0, 0.0);
        assert_eq!(p, EdgePath::Line { from: Point::new(0.0, 0.0), to: Point::new(100.0, 0.0) });
        assert_eq!(p.to_svg(), "M 0 0 L 100 0");
    }

    #[test]
    fn control_point_is_displaced_along_perpendicular() {
        match edge_path(0.0, 0.0, 100.0, 0.0, 25.0) {
            EdgePath::Quad { ctrl, .. } => {
                assert!((ctrl.x - 50.0).abs() < 1e-9);
                assert!((ctrl.y - 25.0).abs() < 1e-9);
            }
            other => panic!("expected quad, got {:?}", other),
        }
    }

    #[test]
    fn reversed_direction_flips_the_bulge() {
        let a = curve_label_anchor(0.0, 0.0, 100.0, 0.0, 20.0);
        let b = curve_label_anchor(100.0, 0.0, 0.0, 0.0, 20.0);
        assert!((a.y + b.y).abs() < 1e-9);
        assert!(a.y > 0.0);
    }

    #[test]
    fn label_anchor_tracks_curve_not_chord() {
        let straight = curve_label_anchor(0.0, 0.0, 0.0, 80.0, 0.0);
        assert_eq!(straight, Point::new(0.0, 40.0));
        let curved = curve_label_anchor(0.0, 0.0, 0.0, 80.0, 30.0);
        // perpendicular of +y is -x; quadratic midpoint sits halfway to the control point
        assert!((curved.x + 15.0).abs() < 1e-9);
        assert!((curved.y - 40.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_segment_does_not_produce_nan() {
        let p = edge_path(10.0, 10.0, 10.0, 10.0, 50.0);
        let mid = p.eval(0.5);
        assert!(mid.x.is_finite() && mid.y.is_finite());
        assert_eq!(mid, Point::new(10.0, 10.0));
    }
}
