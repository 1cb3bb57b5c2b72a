#![forbid(unsafe_code)]

//! Geometric primitives.

/// A position in surface-local coordinates.
///
/// Touch coordinates are reported by the host platform in logical points
/// (not device pixels); the origin and axis orientation are whatever the
/// host uses. Routing never interprets coordinates beyond handing them to
/// the element's hit-test.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Offset from another point, as `(dx, dy)`.
    #[inline]
    #[must_use]
    pub fn delta_from(self, other: Self) -> (f64, f64) {
        (self.x - other.x, self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}
