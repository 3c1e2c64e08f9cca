//! Atomic drawing commands
//!
//! A [`Command`] is one SVG drawing instruction with its complete list of
//! control points, *including* the start point it inherits from the previous
//! command. Commands are immutable: edits produce new commands, and the
//! [`CommandId`] ties the pieces of an edited command back to their origin.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::{smallvec, SmallVec};

use crate::error::{PathError, Result};
use crate::geometry::{Matrix, Point};

/// Control points of one command (at most four for a cubic).
pub type CommandPoints = SmallVec<[Point; 4]>;

/// The kind of an SVG path command
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SvgChar {
    MoveTo,
    LineTo,
    QuadraticCurve,
    CubicCurve,
    ClosePath,
}

impl SvgChar {
    /// Upper-case path data letter
    pub fn letter(self) -> char {
        match self {
            SvgChar::MoveTo => 'M',
            SvgChar::LineTo => 'L',
            SvgChar::QuadraticCurve => 'Q',
            SvgChar::CubicCurve => 'C',
            SvgChar::ClosePath => 'Z',
        }
    }

    /// Parse an absolute path data letter
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'M' => Some(SvgChar::MoveTo),
            'L' => Some(SvgChar::LineTo),
            'Q' => Some(SvgChar::QuadraticCurve),
            'C' => Some(SvgChar::CubicCurve),
            'Z' => Some(SvgChar::ClosePath),
            _ => None,
        }
    }

    /// Number of points a command of this kind carries, start included
    pub fn num_points(self) -> usize {
        match self {
            SvgChar::MoveTo | SvgChar::LineTo | SvgChar::ClosePath => 2,
            SvgChar::QuadraticCurve => 3,
            SvgChar::CubicCurve => 4,
        }
    }

    /// Polynomial degree of the segment (moves count as degree 1)
    pub fn degree(self) -> usize {
        self.num_points() - 1
    }
}

impl fmt::Display for SvgChar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

static NEXT_COMMAND_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a command across rebuilds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommandId(u64);

impl CommandId {
    /// Allocate a fresh, process-unique id
    pub fn next() -> Self {
        CommandId(NEXT_COMMAND_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd-{}", self.0)
    }
}

/// One immutable SVG drawing instruction
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    svg_char: SvgChar,
    points: CommandPoints,
    /// `false` only for a move whose start is unknown (the first move of a path)
    has_start: bool,
    id: CommandId,
    is_split_point: bool,
    is_sub_path_split_segment: bool,
}

impl Command {
    /// Build a command from its full point list, checking the point count
    /// against `svg_char.num_points()`.
    pub fn try_new(svg_char: SvgChar, points: impl Into<CommandPoints>) -> Result<Self> {
        let points = points.into();
        let expected = svg_char.num_points();
        if points.len() != expected {
            return Err(PathError::PointCount {
                svg_char,
                expected,
                found: points.len(),
            });
        }
        Ok(Self::new(svg_char, points))
    }

    /// `points` must hold exactly `svg_char.num_points()` entries.
    pub(crate) fn new(svg_char: SvgChar, points: impl Into<CommandPoints>) -> Self {
        let points = points.into();
        debug_assert_eq!(points.len(), svg_char.num_points());
        Self {
            svg_char,
            points,
            has_start: true,
            id: CommandId::next(),
            is_split_point: false,
            is_sub_path_split_segment: false,
        }
    }

    /// A move to `end`. A `None` start marks the first move of a path.
    pub fn move_to(start: Option<Point>, end: Point) -> Self {
        Self::new(SvgChar::MoveTo, smallvec![start.unwrap_or(end), end]).with_start(start)
    }

    pub fn line_to(start: Point, end: Point) -> Self {
        Self::new(SvgChar::LineTo, smallvec![start, end])
    }

    pub fn quad_to(start: Point, control: Point, end: Point) -> Self {
        Self::new(SvgChar::QuadraticCurve, smallvec![start, control, end])
    }

    pub fn cubic_to(start: Point, control1: Point, control2: Point, end: Point) -> Self {
        Self::new(SvgChar::CubicCurve, smallvec![start, control1, control2, end])
    }

    pub fn close_path(start: Point, end: Point) -> Self {
        Self::new(SvgChar::ClosePath, smallvec![start, end])
    }

    pub fn with_id(mut self, id: CommandId) -> Self {
        self.id = id;
        self
    }

    pub fn with_split_point(mut self, is_split_point: bool) -> Self {
        self.is_split_point = is_split_point;
        self
    }

    pub fn with_sub_path_split_segment(mut self, is_sub_path_split_segment: bool) -> Self {
        self.is_sub_path_split_segment = is_sub_path_split_segment;
        self
    }

    /// Replace the start point. Only moves accept `None`.
    pub fn with_start(mut self, start: Option<Point>) -> Self {
        match start {
            Some(point) => {
                self.points[0] = point;
                self.has_start = true;
            }
            None => {
                debug_assert_eq!(self.svg_char, SvgChar::MoveTo);
                self.points[0] = self.end();
                self.has_start = false;
            }
        }
        self
    }

    pub fn svg_char(&self) -> SvgChar {
        self.svg_char
    }

    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn is_split_point(&self) -> bool {
        self.is_split_point
    }

    pub fn is_sub_path_split_segment(&self) -> bool {
        self.is_sub_path_split_segment
    }

    /// Start point, `None` for the first move of a path
    pub fn start(&self) -> Option<Point> {
        self.has_start.then(|| self.points[0])
    }

    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// All points, start included. The start slot of a move without a known
    /// start mirrors its end.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Apply an affine transform to every point, keeping identity and flags
    pub fn transform(&self, matrix: &Matrix) -> Command {
        if matrix.is_identity() {
            return self.clone();
        }
        let mut command = self.clone();
        for point in command.points.iter_mut() {
            *point = matrix.transform_point(*point);
        }
        command
    }

    /// The same segment traversed backwards. A close path becomes a line,
    /// since after reversal it no longer ends its subpath.
    pub fn reversed(&self) -> Command {
        let mut command = self.clone();
        if command.svg_char == SvgChar::MoveTo {
            return command;
        }
        command.points.reverse();
        if command.svg_char == SvgChar::ClosePath {
            command.svg_char = SvgChar::LineTo;
        }
        command
    }

    /// Whether two commands can be interpolated point for point
    pub fn is_morphable_with(&self, other: &Command) -> bool {
        self.svg_char == other.svg_char
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.svg_char.letter())?;
        if self.svg_char == SvgChar::ClosePath {
            return Ok(());
        }
        for point in &self.points[1..] {
            write!(f, " {}", point)?;
        }
        Ok(())
    }
}
