//! Geometry of a single command
//!
//! A [`Calculator`] evaluates one command as a Bézier curve of degree 1-3 and
//! answers the geometric questions the editing layer asks: where is the point
//! at `t`, what is the piece between `t0` and `t1`, how long is it, what is
//! the closest point to a query, where does it cross a line.
//!
//! Every operation is a de Casteljau evaluation over the control polygon, so
//! the same code path serves lines, quadratics and cubics.

use smallvec::SmallVec;

use crate::command::{Command, CommandId, CommandPoints, SvgChar};
use crate::geometry::{Line, Point, Rect, EPSILON};
use crate::polynomial::{solve_cubic, solve_linear, solve_quadratic, unit_interval_roots};

/// Absolute tolerance for adaptive arc length.
const LENGTH_TOLERANCE: f64 = 1e-9;
/// Recursion limit for adaptive arc length.
const MAX_LENGTH_DEPTH: u32 = 20;
/// Samples taken before refining a curve projection.
const PROJECTION_SAMPLES: usize = 64;
/// Refinement steps for curve projection and distance search.
const REFINE_ITERATIONS: usize = 60;

/// Closest point on a command to a query point
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProjectionResult {
    pub x: f64,
    pub y: f64,
    /// Parameter of the projected point on the command
    pub t: f64,
    /// Distance from the query point
    pub d: f64,
}

impl ProjectionResult {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Geometric view of one command
#[derive(Clone, Debug, PartialEq)]
pub struct Calculator {
    svg_char: SvgChar,
    points: CommandPoints,
}

impl Calculator {
    pub fn new(command: &Command) -> Self {
        Self::from_parts(command.svg_char(), command.points())
    }

    pub fn from_parts(svg_char: SvgChar, points: &[Point]) -> Self {
        debug_assert_eq!(points.len(), svg_char.num_points());
        Self {
            svg_char,
            points: points.iter().copied().collect(),
        }
    }

    pub fn svg_char(&self) -> SvgChar {
        self.svg_char
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn start(&self) -> Point {
        self.points[0]
    }

    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Point at parameter `t`; exact at `0` and `1`.
    pub fn point_at(&self, t: f64) -> Point {
        if self.svg_char == SvgChar::MoveTo {
            return self.end();
        }
        if t <= 0.0 {
            return self.start();
        }
        if t >= 1.0 {
            return self.end();
        }
        evaluate(&self.points, t)
    }

    /// The piece of this command between `t0` and `t1`.
    ///
    /// Endpoints are pinned to `point_at(t0)` and `point_at(t1)` so that
    /// adjacent pieces cut from the same command meet exactly.
    pub fn split(&self, t0: f64, t1: f64) -> Calculator {
        if self.svg_char == SvgChar::MoveTo || (t0 <= 0.0 && t1 >= 1.0) {
            return self.clone();
        }
        let start = self.point_at(t0);
        let end = self.point_at(t1);
        if t1 - t0 <= 0.0 {
            return Calculator {
                svg_char: self.svg_char,
                points: self.points.iter().map(|_| start).collect(),
            };
        }

        let mut points = self.points.clone();
        if t1 < 1.0 {
            points = subdivide(&points, t1).0;
        }
        if t0 > 0.0 {
            points = subdivide(&points, t0 / t1).1;
        }
        let last = points.len() - 1;
        points[0] = start;
        points[last] = end;
        Calculator {
            svg_char: self.svg_char,
            points,
        }
    }

    /// Whether converting to `target` keeps the geometry exact.
    pub fn can_convert_to(&self, target: SvgChar) -> bool {
        match (self.svg_char, target) {
            (a, b) if a == b => true,
            (SvgChar::MoveTo, _) | (_, SvgChar::MoveTo) => false,
            (a, b) => b.degree() >= a.degree(),
        }
    }

    /// The same geometry expressed as another command kind.
    ///
    /// Raising the degree is exact. Lowering keeps the endpoints and
    /// approximates the interior; callers check [`Self::can_convert_to`].
    pub fn convert(&self, target: SvgChar) -> Calculator {
        if target == self.svg_char || self.svg_char == SvgChar::MoveTo || target == SvgChar::MoveTo
        {
            return Calculator {
                svg_char: if self.svg_char == SvgChar::MoveTo {
                    SvgChar::MoveTo
                } else {
                    target
                },
                points: self.points.clone(),
            };
        }

        let start = self.start();
        let end = self.end();
        let points: CommandPoints = match (self.svg_char.degree(), target.degree()) {
            (1, 1) => self.points.clone(),
            (1, 2) => [start, start.lerp(end, 0.5), end].into_iter().collect(),
            (1, 3) => [start, start.lerp(end, 1.0 / 3.0), start.lerp(end, 2.0 / 3.0), end]
                .into_iter()
                .collect(),
            (2, 3) => {
                let control = self.points[1];
                [
                    start,
                    start.lerp(control, 2.0 / 3.0),
                    end.lerp(control, 2.0 / 3.0),
                    end,
                ]
                .into_iter()
                .collect()
            }
            (2, 1) | (3, 1) => [start, end].into_iter().collect(),
            (3, 2) => {
                let (c1, c2) = (self.points[1], self.points[2]);
                let control = Point::new(
                    (3.0 * (c1.x + c2.x) - start.x - end.x) / 4.0,
                    (3.0 * (c1.y + c2.y) - start.y - end.y) / 4.0,
                );
                [start, control, end].into_iter().collect()
            }
            _ => self.points.clone(),
        };
        Calculator {
            svg_char: target,
            points,
        }
    }

    /// Arc length of the command
    pub fn path_length(&self) -> f64 {
        match self.svg_char {
            SvgChar::MoveTo => 0.0,
            SvgChar::LineTo | SvgChar::ClosePath => self.start().distance(self.end()),
            SvgChar::QuadraticCurve | SvgChar::CubicCurve => adaptive_length(&self.points, 0),
        }
    }

    /// Parameter at which the arc length from the start reaches `distance`.
    pub fn find_time_by_distance(&self, distance: f64) -> f64 {
        if self.svg_char == SvgChar::MoveTo || distance <= 0.0 {
            return 0.0;
        }
        let total = self.path_length();
        if total <= 0.0 {
            return 0.0;
        }
        if distance >= total {
            return 1.0;
        }
        if matches!(self.svg_char, SvgChar::LineTo | SvgChar::ClosePath) {
            return distance / total;
        }

        let (mut lo, mut hi) = (0.0, 1.0);
        for _ in 0..REFINE_ITERATIONS {
            let mid = (lo + hi) / 2.0;
            let length = self.split(0.0, mid).path_length();
            if (length - distance).abs() <= LENGTH_TOLERANCE {
                return mid;
            }
            if length < distance {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        (lo + hi) / 2.0
    }

    /// Closest point on the command to `point`; `None` for moves.
    pub fn project(&self, point: Point) -> Option<ProjectionResult> {
        let t = match self.svg_char {
            SvgChar::MoveTo => return None,
            SvgChar::LineTo | SvgChar::ClosePath => {
                let (a, b) = (self.start(), self.end());
                let (dx, dy) = (b.x - a.x, b.y - a.y);
                let length_squared = dx * dx + dy * dy;
                if length_squared == 0.0 {
                    0.0
                } else {
                    (((point.x - a.x) * dx + (point.y - a.y) * dy) / length_squared)
                        .clamp(0.0, 1.0)
                }
            }
            SvgChar::QuadraticCurve | SvgChar::CubicCurve => self.project_curve(point),
        };
        let projected = self.point_at(t);
        Some(ProjectionResult {
            x: projected.x,
            y: projected.y,
            t,
            d: projected.distance(point),
        })
    }

    fn project_curve(&self, point: Point) -> f64 {
        let distance_at = |t: f64| self.point_at(t).distance_squared(point);

        let step = 1.0 / PROJECTION_SAMPLES as f64;
        let mut best_t = 0.0;
        let mut best_d = distance_at(0.0);
        for i in 1..=PROJECTION_SAMPLES {
            let t = i as f64 * step;
            let d = distance_at(t);
            if d < best_d {
                best_t = t;
                best_d = d;
            }
        }

        // Golden-section search around the best sample.
        let ratio = (5f64.sqrt() - 1.0) / 2.0;
        let mut lo = (best_t - step).max(0.0);
        let mut hi = (best_t + step).min(1.0);
        for _ in 0..REFINE_ITERATIONS {
            let a = hi - ratio * (hi - lo);
            let b = lo + ratio * (hi - lo);
            if distance_at(a) < distance_at(b) {
                hi = b;
            } else {
                lo = a;
            }
        }
        let refined = (lo + hi) / 2.0;
        if distance_at(refined) <= best_d {
            refined
        } else {
            best_t
        }
    }

    /// Tight axis-aligned bounds of the command
    pub fn bounding_box(&self) -> Rect {
        let mut rect = Rect::from_point(self.start()).include(self.end());
        if self.svg_char == SvgChar::MoveTo {
            return Rect::from_point(self.end());
        }
        for t in self.extrema() {
            rect = rect.include(self.point_at(t));
        }
        rect
    }

    /// Parameters where the derivative vanishes along either axis
    fn extrema(&self) -> SmallVec<[f64; 4]> {
        let mut ts = SmallVec::new();
        let axis = |f: fn(&Point) -> f64| -> SmallVec<[f64; 4]> {
            let v: SmallVec<[f64; 4]> = self.points.iter().map(f).collect();
            let roots = match self.svg_char {
                SvgChar::QuadraticCurve => solve_linear(v[1] - v[0], v[0] - 2.0 * v[1] + v[2]),
                SvgChar::CubicCurve => solve_quadratic(
                    v[1] - v[0],
                    2.0 * (v[0] - 2.0 * v[1] + v[2]),
                    -v[0] + 3.0 * v[1] - 3.0 * v[2] + v[3],
                ),
                _ => Default::default(),
            };
            unit_interval_roots(roots).into_iter().collect()
        };
        ts.extend(axis(|p| p.x));
        ts.extend(axis(|p| p.y));
        ts
    }

    /// Parameters at which the command crosses `line`, in increasing order.
    pub fn intersects(&self, line: &Line) -> Vec<f64> {
        if self.svg_char == SvgChar::MoveTo {
            return Vec::new();
        }
        let length = line.length();
        if length < EPSILON {
            return Vec::new();
        }
        // Rotate so the line lies on the positive x axis.
        let cos = (line.to.x - line.from.x) / length;
        let sin = (line.to.y - line.from.y) / length;
        let align = |p: Point| {
            let (x, y) = (p.x - line.from.x, p.y - line.from.y);
            Point::new(x * cos + y * sin, -x * sin + y * cos)
        };
        let aligned: CommandPoints = self.points.iter().map(|p| align(*p)).collect();
        let y: SmallVec<[f64; 4]> = aligned.iter().map(|p| p.y).collect();

        let roots = match self.svg_char.degree() {
            1 => solve_linear(y[0], y[1] - y[0]),
            2 => solve_quadratic(y[0], 2.0 * (y[1] - y[0]), y[0] - 2.0 * y[1] + y[2]),
            _ => solve_cubic(
                y[0],
                3.0 * (y[1] - y[0]),
                3.0 * (y[0] - 2.0 * y[1] + y[2]),
                -y[0] + 3.0 * y[1] - 3.0 * y[2] + y[3],
            ),
        };

        let mut ts: Vec<f64> = unit_interval_roots(roots)
            .into_iter()
            .filter(|&t| {
                let x = evaluate(&aligned, t).x;
                x >= -EPSILON && x <= length + EPSILON
            })
            .collect();
        ts.sort_by(|a, b| a.total_cmp(b));
        ts.dedup_by(|a, b| (*a - *b).abs() <= EPSILON);
        ts
    }

    /// Materialize the calculator as a command
    pub fn to_command(&self, id: CommandId, is_split_point: bool) -> Command {
        Command::new(self.svg_char, self.points.clone())
            .with_id(id)
            .with_split_point(is_split_point)
    }
}

/// De Casteljau evaluation of a control polygon
fn evaluate(points: &[Point], t: f64) -> Point {
    let mut work: CommandPoints = points.iter().copied().collect();
    for level in 1..work.len() {
        for i in 0..work.len() - level {
            work[i] = work[i].lerp(work[i + 1], t);
        }
    }
    work[0]
}

/// Split a control polygon at `t` into its left and right halves
fn subdivide(points: &[Point], t: f64) -> (CommandPoints, CommandPoints) {
    let n = points.len();
    let mut work: CommandPoints = points.iter().copied().collect();
    let mut left = CommandPoints::new();
    let mut right = CommandPoints::new();
    left.push(work[0]);
    right.push(work[n - 1]);
    for level in 1..n {
        for i in 0..n - level {
            work[i] = work[i].lerp(work[i + 1], t);
        }
        left.push(work[0]);
        right.push(work[n - 1 - level]);
    }
    right.reverse();
    (left, right)
}

fn adaptive_length(points: &[Point], depth: u32) -> f64 {
    let chord = points[0].distance(points[points.len() - 1]);
    let polygon: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    if polygon - chord <= LENGTH_TOLERANCE || depth >= MAX_LENGTH_DEPTH {
        // Gravesen's estimate for a control polygon of degree n.
        let n = (points.len() - 1) as f64;
        return (2.0 * chord + (n - 1.0) * polygon) / (n + 1.0);
    }
    let (left, right) = subdivide(points, 0.5);
    adaptive_length(&left, depth + 1) + adaptive_length(&right, depth + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() <= tolerance
    }

    fn line(a: Point, b: Point) -> Calculator {
        Calculator::new(&Command::line_to(a, b))
    }

    fn cubic() -> Calculator {
        Calculator::new(&Command::cubic_to(
            p(0.0, 0.0),
            p(0.0, 10.0),
            p(10.0, 10.0),
            p(10.0, 0.0),
        ))
    }

    #[test]
    fn test_split_line_exact() {
        let calc = line(p(0.0, 10.0), p(10.0, 10.0));
        let piece = calc.split(0.25, 0.5);
        assert_eq!(piece.points(), &[p(2.5, 10.0), p(5.0, 10.0)]);
        assert_eq!(calc.split(0.0, 1.0), calc);
    }

    #[test]
    fn test_split_curve_pieces_meet() {
        let calc = cubic();
        let a = calc.split(0.0, 0.3);
        let b = calc.split(0.3, 0.7);
        let c = calc.split(0.7, 1.0);
        assert_eq!(a.end(), b.start());
        assert_eq!(b.end(), c.start());
        assert_eq!(a.start(), p(0.0, 0.0));
        assert_eq!(c.end(), p(10.0, 0.0));
        assert!(b.point_at(0.5).distance(calc.point_at(0.5)) < 1e-9);
    }

    #[test]
    fn test_convert_elevation_is_exact() {
        let calc = line(p(0.0, 0.0), p(3.0, 3.0));
        let cubic = calc.convert(SvgChar::CubicCurve);
        assert_eq!(cubic.svg_char(), SvgChar::CubicCurve);
        assert_eq!(cubic.points().len(), 4);
        assert!(cubic.point_at(0.5).approx_eq(p(1.5, 1.5)));

        let quad = Calculator::new(&Command::quad_to(p(0.0, 0.0), p(5.0, 10.0), p(10.0, 0.0)));
        let elevated = quad.convert(SvgChar::CubicCurve);
        for t in [0.1, 0.5, 0.8] {
            assert!(elevated.point_at(t).distance(quad.point_at(t)) < 1e-9);
        }
        assert!(quad.can_convert_to(SvgChar::CubicCurve));
        assert!(!quad.can_convert_to(SvgChar::LineTo));
    }

    #[test]
    fn test_path_length() {
        assert_eq!(line(p(0.0, 0.0), p(3.0, 4.0)).path_length(), 5.0);
        // A straight cubic has the length of its chord.
        let straight = Calculator::new(&Command::cubic_to(
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(2.0, 0.0),
            p(3.0, 0.0),
        ));
        assert!(approx_eq(straight.path_length(), 3.0, 1e-6));
        // Quarter circle approximation, radius 10.
        let k = 0.552_284_749_8 * 10.0;
        let arc = Calculator::new(&Command::cubic_to(
            p(10.0, 0.0),
            p(10.0, k),
            p(k, 10.0),
            p(0.0, 10.0),
        ));
        assert!(approx_eq(arc.path_length(), std::f64::consts::PI * 5.0, 0.01));
    }

    #[test]
    fn test_find_time_by_distance() {
        let calc = line(p(0.0, 0.0), p(10.0, 0.0));
        assert_eq!(calc.find_time_by_distance(2.5), 0.25);
        assert_eq!(calc.find_time_by_distance(-1.0), 0.0);
        assert_eq!(calc.find_time_by_distance(100.0), 1.0);

        let curve = cubic();
        let half = curve.path_length() / 2.0;
        let t = curve.find_time_by_distance(half);
        // Symmetric curve: the arc-length midpoint is at t = 0.5.
        assert!(approx_eq(t, 0.5, 1e-6));
    }

    #[test]
    fn test_project() {
        let calc = line(p(0.0, 0.0), p(10.0, 0.0));
        let result = calc.project(p(4.0, 3.0)).unwrap();
        assert_eq!(result.t, 0.4);
        assert_eq!(result.d, 3.0);
        assert_eq!(result.point(), p(4.0, 0.0));

        let curve = cubic();
        let top = curve.project(p(5.0, 20.0)).unwrap();
        assert!(approx_eq(top.t, 0.5, 1e-6));
        assert!(approx_eq(top.y, 7.5, 1e-6));

        let mv = Calculator::new(&Command::move_to(None, p(1.0, 1.0)));
        assert!(mv.project(p(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_bounding_box_includes_extrema() {
        let rect = cubic().bounding_box();
        assert_eq!(rect.min, p(0.0, 0.0));
        assert!(approx_eq(rect.max.y, 7.5, 1e-9));
        assert_eq!(rect.max.x, 10.0);

        let quad = Calculator::new(&Command::quad_to(p(0.0, 0.0), p(5.0, 10.0), p(10.0, 0.0)));
        assert_eq!(quad.bounding_box().max, p(10.0, 5.0));
    }

    #[test]
    fn test_intersects() {
        let calc = line(p(0.0, 0.0), p(10.0, 10.0));
        let ts = calc.intersects(&Line::new(p(0.0, 10.0), p(10.0, 0.0)));
        assert_eq!(ts.len(), 1);
        assert!(approx_eq(ts[0], 0.5, 1e-12));

        // Segment that stops short of the line does not count.
        let short = calc.intersects(&Line::new(p(0.0, 10.0), p(2.0, 8.0)));
        assert!(short.is_empty());

        let crossings = cubic().intersects(&Line::new(p(-5.0, 5.0), p(15.0, 5.0)));
        assert_eq!(crossings.len(), 2);
        for t in crossings {
            assert!(approx_eq(cubic().point_at(t).y, 5.0, 1e-9));
        }
    }

    #[test]
    fn test_to_command_keeps_id() {
        let id = CommandId::next();
        let command = line(p(0.0, 0.0), p(1.0, 1.0)).to_command(id, true);
        assert_eq!(command.id(), id);
        assert!(command.is_split_point());
        assert_eq!(command.to_string(), "L 1 1");
    }
}
