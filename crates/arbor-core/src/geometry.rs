#![forbid(unsafe_code)]

//! Canvas geometry in floating-point coordinates.
//!
//! Node positions are the top-left corner of the node's box, matching what
//! a canvas renderer reports. Sizes are whatever the renderer measured; the
//! layout engine substitutes a fallback when none is known.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A point on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation towards `target`; `t = 0` yields `self`, `t = 1`
    /// yields `target`.
    #[must_use]
    pub fn lerp(self, target: Point, t: f64) -> Point {
        Point {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
        }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Width and height of a node box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either dimension is not a positive finite number.
    ///
    /// Renderers report zero sizes for nodes that are mounted but not yet
    /// laid out; those are treated as unmeasured.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

/// An axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub origin: Point,
    pub size: Size,
}

impl Bounds {
    #[must_use]
    pub const fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    #[inline]
    #[must_use]
    pub fn left(&self) -> f64 {
        self.origin.x
    }

    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.origin.x + self.size.width
    }

    #[inline]
    #[must_use]
    pub fn top(&self) -> f64 {
        self.origin.y
    }

    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.origin.y + self.size.height
    }

    /// Centre of the box.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    /// Whether the two boxes share interior area. Touching edges do not count.
    #[must_use]
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints() {
        let a = Point::new(10.0, -4.0);
        let b = Point::new(30.0, 16.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Point::new(20.0, 6.0));
    }

    #[test]
    fn degenerate_sizes() {
        assert!(Size::new(0.0, 10.0).is_degenerate());
        assert!(Size::new(f64::NAN, 10.0).is_degenerate());
        assert!(!Size::new(180.0, 50.0).is_degenerate());
    }

    #[test]
    fn touching_boxes_do_not_overlap() {
        let a = Bounds::new(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        let b = Bounds::new(Point::new(0.0, 10.0), Size::new(10.0, 10.0));
        let c = Bounds::new(Point::new(5.0, 5.0), Size::new(10.0, 10.0));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert_eq!(a.center(), Point::new(5.0, 5.0));
    }
}
