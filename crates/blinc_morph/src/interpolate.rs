//! Point-wise interpolation between morphable paths

use crate::command::{Command, CommandPoints};
use crate::error::{PathError, Result};
use crate::path::Path;

/// Blend two morphable paths, `fraction` 0 giving `start` and 1 giving `end`.
///
/// The result keeps the command ids and flags of `start`.
pub fn interpolate(start: &Path, end: &Path, fraction: f64) -> Result<Path> {
    if !start.is_morphable_with(end) {
        return Err(PathError::NotMorphable {
            start: start.commands().len(),
            end: end.commands().len(),
        });
    }

    let commands = start
        .commands()
        .iter()
        .zip(end.commands())
        .map(|(a, b)| {
            let points: CommandPoints = a
                .points()
                .iter()
                .zip(b.points())
                .map(|(p, q)| p.lerp(*q, fraction))
                .collect();
            // The first move of a path has no start to blend.
            let start = a.start().map(|_| points[0]);
            Command::new(a.svg_char(), points)
                .with_id(a.id())
                .with_split_point(a.is_split_point())
                .with_sub_path_split_segment(a.is_sub_path_split_segment())
                .with_start(start)
        })
        .collect();
    Ok(Path::from_commands(commands))
}
