//! Read-only path facade
//!
//! [`Path`] is a cheap handle over an immutable [`PathState`]. Every edit goes
//! through [`Path::mutate`] and yields a new path, so older paths stay valid
//! and can be kept around (for undo, or as morph keyframes).
//!
//! ```ignore
//! use blinc_morph::Path;
//!
//! let path: Path = "M 0 0 L 10 10 L 20 20".parse()?;
//! let split = path.mutate().split_command(0, 2, &[0.5])?.build();
//! assert_eq!(split.path_string(), "M 0 0 L 10 10 L 15 15 L 20 20");
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::calculator::{Calculator, ProjectionResult};
use crate::command::Command;
use crate::error::{PathError, Result};
use crate::geometry::{Point, Rect};
use crate::mutator::PathMutator;
use crate::parser;
use crate::path_state::{signed_area, PathState};

/// One rendered subpath
#[derive(Clone, Debug)]
pub struct SubPath {
    commands: Vec<Command>,
    is_closed: bool,
    is_reversed: bool,
    shift_offset: usize,
    is_split: bool,
    is_collapsing: bool,
}

impl SubPath {
    pub(crate) fn new(
        commands: Vec<Command>,
        is_reversed: bool,
        shift_offset: usize,
        is_split: bool,
        is_collapsing: bool,
    ) -> Self {
        let is_closed = match (commands.first(), commands.last()) {
            (Some(first), Some(last)) if commands.len() > 1 => first.end().approx_eq(last.end()),
            _ => false,
        };
        Self {
            commands,
            is_closed,
            is_reversed,
            shift_offset,
            is_split,
            is_collapsing,
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    pub fn is_reversed(&self) -> bool {
        self.is_reversed
    }

    pub fn shift_offset(&self) -> usize {
        self.shift_offset
    }

    /// Whether this subpath is one piece of a split subpath
    pub fn is_split(&self) -> bool {
        self.is_split
    }

    pub fn is_collapsing(&self) -> bool {
        self.is_collapsing
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        self.commands
            .iter()
            .map(|command| Calculator::new(command).bounding_box())
            .reduce(Rect::union)
    }
}

/// Closest point on a path, located by visible indices
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub sub_idx: usize,
    pub cmd_idx: usize,
    pub result: ProjectionResult,
}

/// An immutable SVG path
#[derive(Clone, Debug)]
pub struct Path {
    state: Arc<PathState>,
}

impl Path {
    /// Parse SVG path data
    pub fn parse(data: &str) -> Result<Path> {
        Ok(Path::from_commands(parser::parse_path(data)?))
    }

    /// Build a path from a flat command list; every move starts a subpath
    pub fn from_commands(commands: Vec<Command>) -> Path {
        Path::from_state(PathState::from_commands(commands))
    }

    pub(crate) fn from_state(state: PathState) -> Path {
        Path {
            state: Arc::new(state),
        }
    }

    pub(crate) fn state(&self) -> &PathState {
        &self.state
    }

    /// Start a chain of edits
    pub fn mutate(&self) -> PathMutator {
        PathMutator::new(&self.state)
    }

    pub fn commands(&self) -> &[Command] {
        self.state.commands()
    }

    pub fn sub_paths(&self) -> &[SubPath] {
        self.state.sub_paths()
    }

    pub fn sub_path(&self, sub_idx: usize) -> Option<&SubPath> {
        self.sub_paths().get(sub_idx)
    }

    pub fn command(&self, sub_idx: usize, cmd_idx: usize) -> Option<&Command> {
        self.sub_path(sub_idx)?.commands().get(cmd_idx)
    }

    pub fn num_collapsing_sub_paths(&self) -> usize {
        self.state.num_collapsing_sub_paths()
    }

    /// Total arc length of every command
    pub fn path_length(&self) -> f64 {
        self.commands()
            .iter()
            .map(|command| Calculator::new(command).path_length())
            .sum()
    }

    /// Canonical path data
    pub fn path_string(&self) -> String {
        parser::format_commands(self.commands(), None)
    }

    /// Path data with coordinates rounded to `precision` decimals
    pub fn path_string_with_precision(&self, precision: usize) -> String {
        parser::format_commands(self.commands(), Some(precision))
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        self.sub_paths()
            .iter()
            .filter_map(SubPath::bounding_box)
            .reduce(Rect::union)
    }

    /// Same command count and the same kind at every index
    pub fn is_morphable_with(&self, other: &Path) -> bool {
        let (a, b) = (self.commands(), other.commands());
        a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.is_morphable_with(b))
    }

    /// Closest point on the path, optionally restricted to one subpath.
    ///
    /// Collapsing subpaths are never reported. On equal distance the
    /// later-drawn subpath wins.
    pub fn project(&self, point: Point, restrict_to_sub_idx: Option<usize>) -> Option<Projection> {
        let candidates = 0..self.state.num_visible_sub_paths();
        let mut best: Option<Projection> = None;
        for sub_idx in candidates.filter(|i| restrict_to_sub_idx.map_or(true, |r| r == *i)) {
            let Some(projection) = self.state.project_sub_path(sub_idx, point) else {
                continue;
            };
            if best.map_or(true, |b| projection.result.d <= b.result.d) {
                best = Some(projection);
            }
        }
        best
    }

    /// Whether a closed subpath winds clockwise on a y-down canvas
    pub fn is_clockwise(&self, sub_idx: usize) -> Result<bool> {
        let sub_path = self.sub_path(sub_idx).ok_or(PathError::SubPathIndex {
            index: sub_idx,
            len: self.sub_paths().len(),
        })?;
        Ok(signed_area(sub_path.commands()) >= 0.0)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path_string())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self> {
        Path::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let data = "M 0 0 L 10 10 Q 15 0 20 10 C 25 20 30 0 35 10 Z M 50 50 L 60 60";
        let path = Path::parse(data).unwrap();
        assert_eq!(path.path_string(), data);
        assert_eq!(path.to_string(), data);
        assert_eq!(path.sub_paths().len(), 2);
        assert!(path.sub_path(0).unwrap().is_closed());
        assert!(!path.sub_path(1).unwrap().is_closed());
    }

    #[test]
    fn test_path_length() {
        let path: Path = "M 0 0 L 3 4 L 3 10 M 100 100 L 100 101".parse().unwrap();
        assert_eq!(path.path_length(), 12.0);
    }

    #[test]
    fn test_command_lookup() {
        let path = Path::parse("M 0 0 L 10 10 L 20 20").unwrap();
        assert_eq!(path.command(0, 2).unwrap().to_string(), "L 20 20");
        assert!(path.command(0, 3).is_none());
        assert!(path.command(1, 0).is_none());
    }

    #[test]
    fn test_project_endpoint() {
        let path = Path::parse("M 0 0 L 10 0 L 10 10").unwrap();
        let projection = path.project(Point::new(10.0, 0.0), None).unwrap();
        assert_eq!(projection.sub_idx, 0);
        assert_eq!(projection.cmd_idx, 1);
        assert_eq!(projection.result.d, 0.0);
    }

    #[test]
    fn test_project_prefers_later_sub_path_on_ties() {
        let path = Path::parse("M 0 0 L 10 0 M 0 0 L 10 0").unwrap();
        let projection = path.project(Point::new(5.0, 5.0), None).unwrap();
        assert_eq!(projection.sub_idx, 1);
        let restricted = path.project(Point::new(5.0, 5.0), Some(0)).unwrap();
        assert_eq!(restricted.sub_idx, 0);
        assert!(Path::parse("").unwrap().project(Point::ZERO, None).is_none());
    }

    #[test]
    fn test_morphability_is_symmetric() {
        let a = Path::parse("M 0 0 L 10 10 Z").unwrap();
        let b = Path::parse("M 5 5 L 0 0 Z").unwrap();
        let c = Path::parse("M 5 5 Q 0 0 1 1 Z").unwrap();
        let d = Path::parse("M 5 5 L 0 0").unwrap();
        assert!(a.is_morphable_with(&b) && b.is_morphable_with(&a));
        assert!(!a.is_morphable_with(&c) && !c.is_morphable_with(&a));
        assert!(!a.is_morphable_with(&d) && !d.is_morphable_with(&a));
    }

    #[test]
    fn test_is_clockwise() {
        let path = Path::parse("M 0 0 L 10 0 L 10 10 L 0 10 Z").unwrap();
        assert!(path.is_clockwise(0).unwrap());
        let reversed = path.mutate().reverse_sub_path(0).unwrap().build();
        assert!(!reversed.is_clockwise(0).unwrap());
        assert!(path.is_clockwise(3).is_err());
    }

    #[test]
    fn test_bounding_box() {
        let path = Path::parse("M 0 0 C 0 10 10 10 10 0").unwrap();
        let rect = path.bounding_box().unwrap();
        assert_eq!(rect.min, Point::new(0.0, 0.0));
        assert_eq!(rect.max, Point::new(10.0, 7.5));
    }
}
