use serde::{Deserialize, Serialize};

/// A point (or vector) in document coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = other.x - self.x; let dy = other.y - self.y;
        (dx*dx + dy*dy).sqrt()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned box used for node hit testing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Rect { x: origin.x, y: origin.y, width: size.width, height: size.height }
    }

    /// Box spanned by two arbitrary corners (drag start/end in any direction).
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x); let y = a.y.min(b.y);
        Rect { x, y, width: (a.x - b.x).abs(), height: (a.y - b.y).abs() }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn inflate(&self, pad: f64) -> Rect {
        Rect { x: self.x - pad, y: self.y - pad, width: self.width + 2.0 * pad, height: self.height + 2.0 * pad }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

#[inline]
pub fn lerp(a: Point, b: Point, t: f64) -> Point {
    Point { x: a.x + (b.x - a.x) * t, y: a.y + (b.y - a.y) * t }
}

pub fn quad_point(t: f64, p0: Point, c: Point, p1: Point) -> Point {
    let u = 1.0 - t;
    let x = u*u*p0.x + 2.0*u*t*c.x + t*t*p1.x;
    let y = u*u*p0.y + 2.0*u*t*c.y + t*t*p1.y;
    Point { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_from_corners_normalizes_direction() {
        let r = Rect::from_corners(Point::new(50.0, 40.0), Point::new(10.0, 0.0));
        assert_eq!(r, Rect { x: 10.0, y: 0.0, width: 40.0, height: 40.0 });
        assert_eq!(r.center(), Point::new(30.0, 20.0));
    }

    #[test]
    fn inflate_grows_hit_area() {
        let r = Rect::from_origin_size(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        assert!(!r.contains(Point::new(-3.0, 5.0)));
        assert!(r.inflate(4.0).contains(Point::new(-3.0, 5.0)));
    }

    #[test]
    fn quad_point_endpoints() {
        let p0 = Point::new(0.0, 0.0);
        let c = Point::new(5.0, 10.0);
        let p1 = Point::new(10.0, 0.0);
        assert_eq!(quad_point(0.0, p0, c, p1), p0);
        assert_eq!(quad_point(1.0, p0, c, p1), p1);
        assert!((quad_point(0.5, p0, c, p1).y - 5.0).abs() < 1e-12);
    }
}
