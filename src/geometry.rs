// Copyright The Tessera Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Geometry primitives shared by the layout model and the solver.
//!
//! Panel and edge coordinates inside the model are normalized fractions in
//! `[0, 1]`; the solver scales them by the container size. All comparisons go
//! through [`approx_eq`] so accumulated floating point noise never flips a
//! tiling decision.

use serde::{Deserialize, Serialize};

/// Tolerance for comparing normalized positions and solved coordinates.
pub const EPSILON: f64 = 1e-6;

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// The corner opposite the origin.
    pub fn max(&self) -> Point {
        Point::new(self.origin.x + self.size.width, self.origin.y + self.size.height)
    }

    pub fn area(&self) -> f64 {
        self.size.area()
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.origin.x - EPSILON
            && p.x <= self.max().x + EPSILON
            && p.y >= self.origin.y - EPSILON
            && p.y <= self.max().y + EPSILON
    }

    pub fn approx_eq(&self, other: &Rect) -> bool {
        approx_eq(self.origin.x, other.origin.x)
            && approx_eq(self.origin.y, other.origin.y)
            && approx_eq(self.size.width, other.size.width)
            && approx_eq(self.size.height, other.size.height)
    }

    /// Which quadrant of the rectangle the point falls in. Points outside the
    /// rectangle are classified by the nearest quadrant.
    pub fn corner_of(&self, p: Point) -> Corner {
        let right = p.x >= self.origin.x + self.size.width / 2.0;
        let bottom = p.y >= self.origin.y + self.size.height / 2.0;
        match (right, bottom) {
            (false, false) => Corner::TopLeft,
            (true, false) => Corner::TopRight,
            (false, true) => Corner::BottomLeft,
            (true, true) => Corner::BottomRight,
        }
    }
}

/// A closed 1-D interval.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub lo: f64,
    pub hi: f64,
}

impl Span {
    pub fn new(lo: f64, hi: f64) -> Self {
        Span { lo, hi }
    }

    pub fn len(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= EPSILON
    }

    /// Whether `other` lies within this span, up to tolerance.
    pub fn contains(&self, other: Span) -> bool {
        other.lo >= self.lo - EPSILON && other.hi <= self.hi + EPSILON
    }

    pub fn overlaps(&self, other: Span) -> bool {
        self.lo < other.hi - EPSILON && other.lo < self.hi - EPSILON
    }

    pub fn approx_eq(&self, other: Span) -> bool {
        approx_eq(self.lo, other.lo) && approx_eq(self.hi, other.hi)
    }

    pub fn scaled(self, factor: f64) -> Span {
        Span::new(self.lo * factor, self.hi * factor)
    }
}

/// The orientation of a splitter line: a vertical edge divides left/right
/// regions, a horizontal edge divides top/bottom regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn perpendicular(self) -> Orientation {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// The orientation of the edge a panel crosses when moving this way.
    pub fn edge_orientation(self) -> Orientation {
        use Direction::*;
        match self {
            Left | Right => Orientation::Vertical,
            Up | Down => Orientation::Horizontal,
        }
    }

    pub fn opposite(self) -> Direction {
        use Direction::*;
        match self {
            Left => Right,
            Right => Left,
            Up => Down,
            Down => Up,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_classification() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(rect.corner_of(Point::new(10.0, 10.0)), Corner::TopLeft);
        assert_eq!(rect.corner_of(Point::new(90.0, 10.0)), Corner::TopRight);
        assert_eq!(rect.corner_of(Point::new(10.0, 90.0)), Corner::BottomLeft);
        assert_eq!(rect.corner_of(Point::new(90.0, 90.0)), Corner::BottomRight);
    }

    #[test]
    fn span_containment_is_tolerant() {
        let outer = Span::new(0.25, 0.75);
        assert!(outer.contains(Span::new(0.25 + 1e-9, 0.75)));
        assert!(outer.contains(Span::new(0.3, 0.5)));
        assert!(!outer.contains(Span::new(0.2, 0.5)));
    }

    #[test]
    fn spans_touching_at_endpoints_do_not_overlap() {
        assert!(!Span::new(0.0, 0.5).overlaps(Span::new(0.5, 1.0)));
        assert!(Span::new(0.0, 0.6).overlaps(Span::new(0.5, 1.0)));
    }
}
