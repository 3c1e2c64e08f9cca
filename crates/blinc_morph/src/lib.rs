//! Blinc Morph
//!
//! Non-destructive editing of SVG paths for vector editors and morph
//! animations.
//!
//! # Features
//!
//! - Split and unsplit commands, convert between lines and curves
//! - Reverse subpaths and shift their start point
//! - Split subpaths (stroked or filled) and merge them back
//! - Collapsing subpaths to pad paths for morphing
//! - Projection, hit testing, interpolation
//!
//! Every edit is recorded as data on top of the parsed commands, so any chain
//! of edits can be undone back to the exact original geometry.
//!
//! # Example
//!
//! ```ignore
//! use blinc_morph::Path;
//!
//! let path = Path::parse("M 19 11 L 5 11 L 5 13 L 19 13 Z")?;
//! let reversed = path.mutate().reverse_sub_path(0)?.build();
//! assert_eq!(reversed.path_string(), "M 19 11 L 19 13 L 5 13 L 5 11 L 19 11");
//! ```

pub mod calculator;
pub mod command;
pub mod command_state;
pub mod error;
pub mod geometry;
pub mod interpolate;
pub mod mutator;
pub mod parser;
pub mod path;
pub mod path_state;
pub mod polynomial;
pub mod sub_path_state;

pub use calculator::{Calculator, ProjectionResult};
pub use command::{Command, CommandId, SvgChar};
pub use command_state::{CommandState, Mutation};
pub use error::{PathError, Result};
pub use geometry::{Line, Matrix, Point, Rect};
pub use hit_test::{CommandHit, HitOptions, HitResult};
pub use interpolate::interpolate;
pub use mutator::PathMutator;
pub use parser::{format_commands, parse_path};
pub use path::{Path, Projection, SubPath};
pub use path_state::PathState;
pub use sub_path_state::{SubPathForest, SubPathKey, SubPathState};
