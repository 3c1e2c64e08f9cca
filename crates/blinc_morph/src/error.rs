//! Path engine error types

use thiserror::Error;

use crate::command::SvgChar;

/// Errors raised by parsing and by contract violations in path edits.
///
/// Degenerate edits (splitting a move, shifting an open subpath, ...) are not
/// errors: they are logged and leave the path untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    /// Path data could not be parsed
    #[error("invalid path data at offset {offset}: {message}")]
    Parse { offset: usize, message: String },

    /// Subpath index does not exist
    #[error("subpath index {index} out of range (path has {len} subpaths)")]
    SubPathIndex { index: usize, len: usize },

    /// Command index does not exist in the subpath
    #[error("command index {index} out of range for subpath {sub_idx} ({len} commands)")]
    CommandIndex {
        sub_idx: usize,
        index: usize,
        len: usize,
    },

    /// Split parameter outside `[0, 1]` or not a number
    #[error("split parameter {0} is outside [0, 1]")]
    InvalidParameter(f64),

    /// Structural edit attempted on a collapsing (padding) subpath
    #[error("subpath {0} is a collapsing subpath and cannot be edited")]
    CollapsingSubPath(usize),

    /// A command built with the wrong number of points
    #[error("{svg_char} command needs {expected} points, found {found}")]
    PointCount {
        svg_char: SvgChar,
        expected: usize,
        found: usize,
    },

    /// Two paths that do not share a command structure
    #[error("paths are not morphable ({start} commands vs {end} commands)")]
    NotMorphable { start: usize, end: usize },
}

/// Result type for path operations
pub type Result<T> = std::result::Result<T, PathError>;
