//! Immutable path snapshots

use tracing::{error, trace};

use crate::calculator::Calculator;
use crate::command::{Command, SvgChar};
use crate::command_state::CommandState;
use crate::geometry::Point;
use crate::path::{Projection, SubPath};
use crate::sub_path_state::{command_states_from, first_command_index, SubPathForest, SubPathState};

/// One built path: the subpath forest plus cached visible commands.
///
/// Never mutated after construction; edits go through
/// [`PathMutator`](crate::PathMutator) and produce a new snapshot.
#[derive(Clone, Debug)]
pub struct PathState {
    pub(crate) forest: SubPathForest,
    /// Visible `sub_idx` to depth-first leaf index
    pub(crate) sub_path_ordering: Vec<usize>,
    pub(crate) num_collapsing_sub_paths: usize,
    /// Baked command states of each visible subpath
    baked: Vec<Vec<CommandState>>,
    commands: Vec<Command>,
    sub_paths: Vec<SubPath>,
}

impl PathState {
    /// Group a flat command list into one subpath per move
    pub fn from_commands(commands: Vec<Command>) -> Self {
        let mut forest = SubPathForest::new();
        for group in group_sub_paths(commands) {
            forest.push_root(SubPathState::new(command_states_from(group)));
        }
        let ordering = (0..forest.roots().len()).collect();
        Self::new(forest, ordering, 0)
    }

    pub(crate) fn new(
        forest: SubPathForest,
        sub_path_ordering: Vec<usize>,
        num_collapsing_sub_paths: usize,
    ) -> Self {
        let leaves = forest.leaves();
        debug_assert_eq!(leaves.len(), sub_path_ordering.len());

        let mut baked = Vec::with_capacity(sub_path_ordering.len());
        let mut commands = Vec::new();
        let mut sub_paths = Vec::with_capacity(sub_path_ordering.len());
        let mut previous_end: Option<Point> = None;

        for &sps_idx in &sub_path_ordering {
            let Some(sps) = leaves.get(sps_idx).and_then(|&key| forest.get(key)) else {
                error!(
                    sps_idx,
                    leaves = leaves.len(),
                    "subpath ordering does not match the forest"
                );
                continue;
            };
            let css = sps.bake();
            let mut sub_commands: Vec<Command> = css.iter().flat_map(|cs| cs.build()).collect();
            // Each move starts where the previous subpath ended.
            if let Some(first) = sub_commands.first_mut() {
                *first = first.clone().with_start(previous_end);
            }
            previous_end = sub_commands.last().map(Command::end).or(previous_end);

            commands.extend(sub_commands.iter().cloned());
            sub_paths.push(SubPath::new(
                sub_commands,
                sps.is_reversed(),
                sps.shift_offset(),
                sps.parent().is_some(),
                sps.is_collapsing(),
            ));
            baked.push(css);
        }
        trace!(
            sub_paths = sub_paths.len(),
            commands = commands.len(),
            "built path state"
        );

        Self {
            forest,
            sub_path_ordering,
            num_collapsing_sub_paths,
            baked,
            commands,
            sub_paths,
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn sub_paths(&self) -> &[SubPath] {
        &self.sub_paths
    }

    pub fn sub_path_ordering(&self) -> &[usize] {
        &self.sub_path_ordering
    }

    pub fn num_collapsing_sub_paths(&self) -> usize {
        self.num_collapsing_sub_paths
    }

    /// Subpaths that positional queries may report
    pub fn num_visible_sub_paths(&self) -> usize {
        self.sub_paths.len() - self.num_collapsing_sub_paths
    }

    /// Closest point on one subpath. Earlier commands win ties.
    pub(crate) fn project_sub_path(&self, sub_idx: usize, point: Point) -> Option<Projection> {
        let css = self.baked.get(sub_idx)?;
        let mut best: Option<Projection> = None;
        for (cs_idx, cs) in css.iter().enumerate() {
            let Some((result, split_idx)) = cs.project(point) else {
                continue;
            };
            if best.map_or(true, |b| result.d < b.result.d) {
                best = Some(Projection {
                    sub_idx,
                    cmd_idx: first_command_index(css, cs_idx) + split_idx,
                    result,
                });
            }
        }
        best
    }
}

/// Split a flat command list into subpaths, each led by a move
pub(crate) fn group_sub_paths(commands: Vec<Command>) -> Vec<Vec<Command>> {
    let mut groups: Vec<Vec<Command>> = Vec::new();
    for command in commands {
        let starts_group = match groups.last().and_then(|g| g.last()) {
            None => true,
            Some(last) => {
                command.svg_char() == SvgChar::MoveTo || last.svg_char() == SvgChar::ClosePath
            }
        };
        if starts_group {
            let mut group = Vec::new();
            if command.svg_char() != SvgChar::MoveTo {
                let origin = command.start().unwrap_or_else(|| command.end());
                group.push(Command::move_to(Some(origin), origin));
            }
            groups.push(group);
        }
        if let Some(group) = groups.last_mut() {
            group.push(command);
        }
    }
    groups
}

/// Shoelace sum over a subpath flattened into short chords
pub(crate) fn signed_area(commands: &[Command]) -> f64 {
    const STEPS: usize = 16;
    let mut points = Vec::new();
    for command in commands {
        match command.svg_char() {
            SvgChar::MoveTo | SvgChar::LineTo | SvgChar::ClosePath => points.push(command.end()),
            SvgChar::QuadraticCurve | SvgChar::CubicCurve => {
                let calculator = Calculator::new(command);
                points.extend((1..=STEPS).map(|i| calculator.point_at(i as f64 / STEPS as f64)));
            }
        }
    }
    let n = points.len();
    (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        / 2.0
}
