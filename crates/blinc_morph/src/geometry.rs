//! Core geometry types for path editing
//!
//! Double precision throughout: every split must be undoable back to the
//! exact original coordinates, so nothing here rounds.

use std::fmt;

/// Tolerance used when comparing coordinates for coincidence.
pub const EPSILON: f64 = 1e-9;

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation that returns `self` exactly at `t == 0` and
    /// `other` exactly at `t == 1`.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x * (1.0 - t) + other.x * t,
            self.y * (1.0 - t) + other.y * t,
        )
    }

    pub fn distance(self, other: Point) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn distance_squared(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Whether two points coincide within [`EPSILON`].
    pub fn approx_eq(self, other: Point) -> bool {
        (self.x - other.x).abs() <= EPSILON && (self.y - other.y).abs() <= EPSILON
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub const fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Degenerate box containing a single point
    pub fn from_point(point: Point) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Smallest box containing every point, or `None` when empty
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Rect::from_point(first), |rect, p| rect.include(p)))
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Grow the box so it contains `point`
    pub fn include(self, point: Point) -> Self {
        Self {
            min: Point::new(self.min.x.min(point.x), self.min.y.min(point.y)),
            max: Point::new(self.max.x.max(point.x), self.max.y.max(point.y)),
        }
    }

    pub fn union(self, other: Rect) -> Self {
        self.include(other.min).include(other.max)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

/// A line segment between two points
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub from: Point,
    pub to: Point,
}

impl Line {
    pub const fn new(from: Point, to: Point) -> Self {
        Self { from, to }
    }

    pub fn length(&self) -> f64 {
        self.from.distance(self.to)
    }
}

/// 2D affine transformation
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix {
    /// Matrix elements [a, b, c, d, e, f]
    /// | a  c  e |
    /// | b  d  f |
    /// | 0  0  1 |
    pub elements: [f64; 6],
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        elements: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self {
            elements: [a, b, c, d, e, f],
        }
    }

    pub fn translation(x: f64, y: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `angle` radians around the origin
    pub fn rotation(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn transform_point(&self, point: Point) -> Point {
        let [a, b, c, d, e, f] = self.elements;
        Point::new(a * point.x + c * point.y + e, b * point.x + d * point.y + f)
    }

    /// Concatenate this transform with another (self * other).
    /// The resulting transform first applies `other`, then `self`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        let [a1, b1, c1, d1, e1, f1] = self.elements;
        let [a2, b2, c2, d2, e2, f2] = other.elements;
        Matrix::new(
            a1 * a2 + c1 * b2,
            b1 * a2 + d1 * b2,
            a1 * c2 + c1 * d2,
            b1 * c2 + d1 * d2,
            a1 * e2 + c1 * f2 + e1,
            b1 * e2 + d1 * f2 + f1,
        )
    }

    /// Compose a stack of transforms, applied first to last.
    pub fn flatten(transforms: &[Matrix]) -> Matrix {
        transforms
            .iter()
            .fold(Matrix::IDENTITY, |acc, m| m.then(&acc))
    }

    /// Inverse transform, or `None` when the matrix is singular
    pub fn invert(&self) -> Option<Matrix> {
        let [a, b, c, d, e, f] = self.elements;
        let det = a * d - b * c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        Some(Matrix::new(
            d * inv,
            -b * inv,
            -c * inv,
            a * inv,
            (c * f - d * e) * inv,
            (b * e - a * f) * inv,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_is_exact_at_endpoints() {
        let a = Point::new(0.1, 0.7);
        let b = Point::new(0.7, 0.1);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(
            Point::new(10.0, 10.0).lerp(Point::new(20.0, 20.0), 0.5),
            Point::new(15.0, 15.0)
        );
    }

    #[test]
    fn test_rect_from_points() {
        let rect = Rect::from_points([
            Point::new(1.0, 5.0),
            Point::new(-2.0, 3.0),
            Point::new(4.0, -1.0),
        ])
        .unwrap();
        assert_eq!(rect.min, Point::new(-2.0, -1.0));
        assert_eq!(rect.max, Point::new(4.0, 5.0));
        assert!(rect.contains(Point::new(0.0, 0.0)));
        assert!(!rect.contains(Point::new(5.0, 0.0)));
        assert!(Rect::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_matrix_composition_order() {
        let translate = Matrix::translation(10.0, 0.0);
        let scale = Matrix::scale(2.0, 2.0);
        // Scale first, then translate.
        let combined = translate.then(&scale);
        assert_eq!(
            combined.transform_point(Point::new(1.0, 1.0)),
            Point::new(12.0, 2.0)
        );
        let flattened = Matrix::flatten(&[scale, translate]);
        assert_eq!(flattened, combined);
    }

    #[test]
    fn test_matrix_invert() {
        let m = Matrix::translation(3.0, -4.0).then(&Matrix::scale(2.0, 0.5));
        let inv = m.invert().unwrap();
        let p = Point::new(7.0, 9.0);
        let round_trip = inv.transform_point(m.transform_point(p));
        assert!(round_trip.approx_eq(p));
        assert!(Matrix::scale(0.0, 1.0).invert().is_none());
    }
}
