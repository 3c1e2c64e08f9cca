//! Edit history of a single command
//!
//! A [`CommandState`] never touches its backing command. Splits, conversions
//! and reversals are recorded as [`Mutation`]s, and the visible commands are
//! recomputed from the backing geometry every time they are built. Reverting
//! is therefore exact: drop the records, keep the backing command.

use tracing::{trace, warn};

use crate::calculator::{Calculator, ProjectionResult};
use crate::command::{Command, CommandId, SvgChar};
use crate::geometry::{Matrix, Point};

/// One visible sub-segment of a [`CommandState`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mutation {
    /// Identity of the sub-segment
    pub id: CommandId,
    /// Upper parameter bound of the sub-segment on the backing command
    pub t: f64,
    /// Kind the sub-segment is rendered as
    pub svg_char: SvgChar,
}

/// A backing command plus the edits applied to it
#[derive(Clone, Debug)]
pub struct CommandState {
    backing_command: Command,
    /// Sorted by `t`; the last record always ends at `max_t`
    mutations: Vec<Mutation>,
    transforms: Vec<Matrix>,
    min_t: f64,
    max_t: f64,
    calculator: Calculator,
}

impl CommandState {
    pub fn new(command: Command) -> Self {
        Self::with_transforms(command, Vec::new())
    }

    /// A fresh state whose backing command is drawn through `transforms`
    pub fn with_transforms(command: Command, transforms: Vec<Matrix>) -> Self {
        let calculator = make_calculator(&command, &transforms);
        Self {
            mutations: vec![Mutation {
                id: command.id(),
                t: 1.0,
                svg_char: command.svg_char(),
            }],
            backing_command: command,
            transforms,
            min_t: 0.0,
            max_t: 1.0,
            calculator,
        }
    }

    pub fn backing_command(&self) -> &Command {
        &self.backing_command
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn transforms(&self) -> &[Matrix] {
        &self.transforms
    }

    pub fn min_t(&self) -> f64 {
        self.min_t
    }

    pub fn max_t(&self) -> f64 {
        self.max_t
    }

    /// Calculator over the transformed backing command
    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }

    /// Number of commands [`Self::build`] yields
    pub fn num_segments(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_move(&self) -> bool {
        self.backing_command.svg_char() == SvgChar::MoveTo
    }

    /// Whether any record renders as a close path
    pub fn is_close_path(&self) -> bool {
        self.mutations
            .iter()
            .any(|m| m.svg_char == SvgChar::ClosePath)
    }

    pub fn start_point(&self) -> Point {
        self.calculator.point_at(self.min_t)
    }

    pub fn end_point(&self) -> Point {
        self.calculator.point_at(self.max_t)
    }

    /// Lower parameter bound of record `split_idx`
    fn segment_start(&self, split_idx: usize) -> f64 {
        if split_idx == 0 {
            self.min_t
        } else {
            self.mutations[split_idx - 1].t
        }
    }

    /// Insert boundaries at window-relative parameters.
    ///
    /// Each new record gets a fresh id and inherits the kind of the record it
    /// falls inside. Returns the number of boundaries inserted.
    pub fn split(&mut self, ts: &[f64]) -> usize {
        let absolute: Vec<f64> = ts
            .iter()
            .map(|&t| lerp(self.min_t, self.max_t, t))
            .collect();
        self.split_absolute(&absolute)
    }

    /// Insert boundaries inside record `split_idx`, with `ts` relative to it
    pub fn split_at_index(&mut self, split_idx: usize, ts: &[f64]) -> usize {
        let (lo, hi) = (self.segment_start(split_idx), self.mutations[split_idx].t);
        let absolute: Vec<f64> = ts.iter().map(|&t| lerp(lo, hi, t)).collect();
        self.split_absolute(&absolute)
    }

    /// Split record `split_idx` at its arc-length midpoint
    pub fn split_in_half(&mut self, split_idx: usize) -> usize {
        let (lo, hi) = (self.segment_start(split_idx), self.mutations[split_idx].t);
        let segment = self.calculator.split(lo, hi);
        let t = segment.find_time_by_distance(segment.path_length() / 2.0);
        self.split_at_index(split_idx, &[t])
    }

    fn split_absolute(&mut self, ts: &[f64]) -> usize {
        if self.is_move() || ts.is_empty() {
            return 0;
        }
        let mut inserted = 0;
        for &t in ts {
            if t <= self.min_t || t >= self.max_t {
                warn!(t, "split parameter lies on a command boundary, skipping");
                continue;
            }
            let idx = self.mutations.partition_point(|m| m.t < t);
            if self.mutations[idx].t == t {
                warn!(t, "duplicate split parameter, skipping");
                continue;
            }
            let svg_char = self.mutations[idx].svg_char;
            self.mutations.insert(
                idx,
                Mutation {
                    id: CommandId::next(),
                    t,
                    svg_char,
                },
            );
            inserted += 1;
        }
        self.demote_inner_close_paths();
        inserted
    }

    /// Only the last record may render as a close path.
    fn demote_inner_close_paths(&mut self) {
        let last = self.mutations.len() - 1;
        for mutation in &mut self.mutations[..last] {
            if mutation.svg_char == SvgChar::ClosePath {
                mutation.svg_char = SvgChar::LineTo;
            }
        }
    }

    /// Merge record `i` into the record that follows it.
    ///
    /// Returns `false` (and leaves the state untouched) when `i` is the last
    /// record, which has no split point to remove.
    pub fn unsplit_at_index(&mut self, i: usize) -> bool {
        if i + 1 >= self.mutations.len() {
            warn!(index = i, "command is not split, nothing to merge");
            return false;
        }
        self.mutations.remove(i);
        true
    }

    /// Traverse the command backwards. Records keep their ids; boundaries
    /// map to `1 - t`.
    pub fn reverse(&mut self) {
        self.backing_command = self.backing_command.reversed();
        self.calculator = make_calculator(&self.backing_command, &self.transforms);
        let (min_t, max_t) = (1.0 - self.max_t, 1.0 - self.min_t);
        let n = self.mutations.len();
        let reversed: Vec<Mutation> = (0..n)
            .map(|k| {
                let source = self.mutations[n - 1 - k];
                let t = if k + 1 == n {
                    max_t
                } else {
                    1.0 - self.mutations[n - 2 - k].t
                };
                Mutation {
                    id: source.id,
                    t,
                    svg_char: match source.svg_char {
                        SvgChar::ClosePath => SvgChar::LineTo,
                        other => other,
                    },
                }
            })
            .collect();
        self.mutations = reversed;
        self.min_t = min_t;
        self.max_t = max_t;
    }

    /// Render record `i` as `svg_char`. Returns `false` if the conversion
    /// would not preserve the geometry.
    pub fn convert_at_index(&mut self, i: usize, svg_char: SvgChar) -> bool {
        let backing = self.backing_command.svg_char();
        let allowed = match svg_char {
            SvgChar::ClosePath => backing == SvgChar::ClosePath && i + 1 == self.mutations.len(),
            _ => self.calculator.can_convert_to(svg_char),
        };
        if !allowed {
            warn!(from = %backing, to = %svg_char, "unsupported command conversion");
            return false;
        }
        self.mutations[i].svg_char = svg_char;
        true
    }

    /// Render every record as the backing kind again
    pub fn unconvert(&mut self) {
        let backing = self.backing_command.svg_char();
        for mutation in &mut self.mutations {
            mutation.svg_char = backing;
        }
        if backing == SvgChar::ClosePath {
            self.demote_inner_close_paths();
        }
    }

    /// Rewrite a close path as a line, backing command included.
    ///
    /// Used when the command no longer ends the subpath it closes.
    pub fn demote_close_path(&mut self) {
        if self.backing_command.svg_char() != SvgChar::ClosePath {
            return;
        }
        let line = Command::new(SvgChar::LineTo, self.backing_command.points().to_vec())
            .with_id(self.backing_command.id())
            .with_sub_path_split_segment(self.backing_command.is_sub_path_split_segment());
        self.backing_command = line;
        self.calculator = make_calculator(&self.backing_command, &self.transforms);
        for mutation in &mut self.mutations {
            if mutation.svg_char == SvgChar::ClosePath {
                mutation.svg_char = SvgChar::LineTo;
            }
        }
    }

    /// Split into records `[0, i]` and `(i, end]`; the right side is `None`
    /// when `i` is the last record.
    pub fn slice(&self, i: usize) -> (CommandState, Option<CommandState>) {
        let split_t = self.mutations[i].t;
        let left = CommandState {
            mutations: self.mutations[..=i].to_vec(),
            max_t: split_t,
            ..self.clone()
        };
        let right = (i + 1 < self.mutations.len()).then(|| CommandState {
            mutations: self.mutations[i + 1..].to_vec(),
            min_t: split_t,
            ..self.clone()
        });
        (left, right)
    }

    /// The records `i..=j` as a state of their own
    pub fn slice_range(&self, i: usize, j: usize) -> CommandState {
        CommandState {
            mutations: self.mutations[i..=j].to_vec(),
            min_t: self.segment_start(i),
            max_t: self.mutations[j].t,
            ..self.clone()
        }
    }

    /// Closest point within this state's window, with `t` relative to the
    /// matched record, and that record's index.
    pub fn project(&self, point: Point) -> Option<(ProjectionResult, usize)> {
        if self.is_move() {
            return None;
        }
        let window = self.calculator.split(self.min_t, self.max_t);
        let result = window.project(point)?;
        let t = lerp(self.min_t, self.max_t, result.t);
        let split_idx = self
            .mutations
            .partition_point(|m| m.t < t)
            .min(self.mutations.len() - 1);
        let (lo, hi) = (self.segment_start(split_idx), self.mutations[split_idx].t);
        let local_t = if hi > lo {
            ((t - lo) / (hi - lo)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Some((ProjectionResult { t: local_t, ..result }, split_idx))
    }

    /// Compose more transforms on top of the existing stack
    pub fn add_transforms(&mut self, transforms: &[Matrix]) {
        self.transforms.extend_from_slice(transforms);
        self.calculator = make_calculator(&self.backing_command, &self.transforms);
    }

    pub fn set_transforms(&mut self, transforms: &[Matrix]) {
        self.transforms = transforms.to_vec();
        self.calculator = make_calculator(&self.backing_command, &self.transforms);
    }

    /// Drop every recorded edit. Transforms are kept.
    pub fn revert(&mut self) {
        self.mutations = vec![Mutation {
            id: self.backing_command.id(),
            t: 1.0,
            svg_char: self.backing_command.svg_char(),
        }];
        self.min_t = 0.0;
        self.max_t = 1.0;
    }

    /// A move to this state's end point, drawn through the same transforms
    pub fn anchored_move(&self, id: CommandId) -> CommandState {
        let raw = Calculator::new(&self.backing_command).point_at(self.max_t);
        CommandState::with_transforms(Command::move_to(None, raw).with_id(id), self.transforms.clone())
    }

    /// A line from this state's end to `other`'s end, drawn through this
    /// state's transforms
    pub fn connector_to(&self, other: &CommandState, id: CommandId) -> CommandState {
        let from = Calculator::new(&self.backing_command).point_at(self.max_t);
        let to = Calculator::new(&other.backing_command).point_at(other.max_t);
        let line = Command::line_to(from, to)
            .with_id(id)
            .with_sub_path_split_segment(true);
        CommandState::with_transforms(line, self.transforms.clone())
    }

    /// The visible commands, one per record
    pub fn build(&self) -> Vec<Command> {
        let is_segment = self.backing_command.is_sub_path_split_segment();
        let mut prev_t = self.min_t;
        let commands = self
            .mutations
            .iter()
            .map(|mutation| {
                // Any boundary inside the backing command is a split point,
                // even when a slice or a reversal made it the last record.
                let command = self
                    .calculator
                    .split(prev_t, mutation.t)
                    .convert(mutation.svg_char)
                    .to_command(mutation.id, mutation.t < 1.0)
                    .with_sub_path_split_segment(is_segment);
                prev_t = mutation.t;
                command
            })
            .collect();
        trace!(id = %self.backing_command.id(), segments = self.mutations.len(), "built command state");
        commands
    }
}

fn make_calculator(command: &Command, transforms: &[Matrix]) -> Calculator {
    if transforms.is_empty() {
        Calculator::new(command)
    } else {
        Calculator::new(&command.transform(&Matrix::flatten(transforms)))
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn path_string(commands: &[Command]) -> String {
        commands
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn line_state() -> CommandState {
        CommandState::new(Command::line_to(p(0.0, 10.0), p(10.0, 10.0)))
    }

    #[test]
    fn test_split_inserts_in_order() {
        let mut state = line_state();
        assert_eq!(state.split(&[0.5, 0.25]), 2);
        assert_eq!(path_string(&state.build()), "L 2.5 10 L 5 10 L 10 10");

        let built = state.build();
        assert!(built[0].is_split_point());
        assert!(built[1].is_split_point());
        assert!(!built[2].is_split_point());
        // The tail keeps the original id.
        assert_eq!(built[2].id(), state.backing_command().id());
    }

    #[test]
    fn test_split_skips_boundaries_and_moves() {
        let mut state = line_state();
        assert_eq!(state.split(&[0.0, 1.0]), 0);
        assert_eq!(state.split(&[]), 0);
        state.split(&[0.5]);
        assert_eq!(state.split(&[0.5]), 0);
        assert_eq!(state.num_segments(), 2);

        let mut mv = CommandState::new(Command::move_to(None, p(1.0, 1.0)));
        assert_eq!(mv.split(&[0.5]), 0);
        assert_eq!(mv.num_segments(), 1);
    }

    #[test]
    fn test_split_close_path_keeps_only_last_close() {
        let mut state = CommandState::new(Command::close_path(p(10.0, 0.0), p(0.0, 0.0)));
        state.split(&[0.5]);
        assert_eq!(path_string(&state.build()), "L 5 0 Z");
    }

    #[test]
    fn test_unsplit_restores_original() {
        let mut state = line_state();
        let original = state.build();
        state.split(&[0.5]);
        assert!(state.unsplit_at_index(0));
        assert_eq!(state.build(), original);
        assert!(!state.unsplit_at_index(0));
    }

    #[test]
    fn test_split_at_index_is_relative_to_segment() {
        let mut state = line_state();
        state.split(&[0.5]);
        state.split_at_index(1, &[0.5]);
        assert_eq!(path_string(&state.build()), "L 5 10 L 7.5 10 L 10 10");
        state.split_in_half(0);
        assert_eq!(
            path_string(&state.build()),
            "L 2.5 10 L 5 10 L 7.5 10 L 10 10"
        );
    }

    #[test]
    fn test_reverse_keeps_split_ids() {
        let mut state = line_state();
        state.split(&[0.25]);
        let ids: Vec<_> = state.mutations().iter().map(|m| m.id).collect();
        state.reverse();
        assert_eq!(path_string(&state.build()), "L 2.5 10 L 0 10");
        let built = state.build();
        assert_eq!(built[0].id(), ids[1]);
        assert_eq!(built[1].id(), ids[0]);
        assert!(built[0].is_split_point());
        state.reverse();
        assert_eq!(path_string(&state.build()), "L 2.5 10 L 10 10");
    }

    #[test]
    fn test_slice() {
        let mut state = line_state();
        state.split(&[0.25, 0.5]);
        let (left, right) = state.slice(0);
        assert_eq!(path_string(&left.build()), "L 2.5 10");
        let right = right.unwrap();
        assert_eq!(path_string(&right.build()), "L 5 10 L 10 10");
        assert_eq!(right.start_point(), p(2.5, 10.0));
        assert!(state.slice(2).1.is_none());

        let middle = state.slice_range(1, 1);
        assert_eq!(middle.start_point(), p(2.5, 10.0));
        assert_eq!(path_string(&middle.build()), "L 5 10");
    }

    #[test]
    fn test_split_window_is_relative() {
        let mut state = line_state();
        state.split(&[0.5]);
        let (_, right) = state.slice(0);
        let mut right = right.unwrap();
        right.split(&[0.5]);
        assert_eq!(path_string(&right.build()), "L 7.5 10 L 10 10");
    }

    #[test]
    fn test_convert_and_unconvert() {
        let mut state = line_state();
        state.split(&[0.5]);
        assert!(state.convert_at_index(1, SvgChar::CubicCurve));
        assert_eq!(state.build()[1].svg_char(), SvgChar::CubicCurve);
        assert!(!state.convert_at_index(0, SvgChar::MoveTo));
        state.unconvert();
        assert_eq!(path_string(&state.build()), "L 5 10 L 10 10");
    }

    #[test]
    fn test_project_reports_segment() {
        let mut state = line_state();
        state.split(&[0.5]);
        let (result, split_idx) = state.project(p(7.5, 12.0)).unwrap();
        assert_eq!(split_idx, 1);
        assert!((result.t - 0.5).abs() < 1e-12);
        assert!((result.d - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_revert_keeps_transforms() {
        let mut state = line_state();
        state.add_transforms(&[Matrix::translation(1.0, 0.0)]);
        state.split(&[0.5]);
        state.revert();
        assert_eq!(path_string(&state.build()), "L 11 10");
        state.set_transforms(&[]);
        assert_eq!(path_string(&state.build()), "L 10 10");
    }
}
