//! Structural path edits
//!
//! A [`PathMutator`] is a short-lived staging copy of a path's subpath forest.
//! Edits address commands by their *visible* indices: `(sub_idx, cmd_idx)` as
//! they appear in the built path. Before touching a command state, the
//! mutator undoes the subpath's shift and reversal to find the underlying
//! command, and afterwards keeps the shift pivot anchored to the same point.
//!
//! Contract violations (unknown indices, split parameters outside `[0, 1]`,
//! edits on collapsing subpaths) are errors. Degenerate edits are logged with
//! `warn!` and leave the mutator untouched, so chains stay safe.

use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::command::{Command, CommandId, SvgChar};
use crate::command_state::CommandState;
use crate::error::{PathError, Result};
use crate::geometry::{Matrix, Point};
use crate::path::Path;
use crate::path_state::PathState;
use crate::sub_path_state::{
    bake_command_states, command_states_from, locate, SubPathForest, SubPathKey, SubPathState,
};

/// An underlying command addressed through a visible index
#[derive(Clone, Copy, Debug)]
struct Target {
    key: SubPathKey,
    cs_idx: usize,
    split_idx: usize,
    /// 1-based index among the unreversed, unshifted drawing commands
    underlying: usize,
    is_reversed: bool,
}

/// Staging area for a chain of path edits
#[derive(Clone, Debug)]
pub struct PathMutator {
    forest: SubPathForest,
    sub_path_ordering: Vec<usize>,
    num_collapsing_sub_paths: usize,
}

impl PathMutator {
    pub(crate) fn new(state: &PathState) -> Self {
        Self {
            forest: state.forest.clone(),
            sub_path_ordering: state.sub_path_ordering.clone(),
            num_collapsing_sub_paths: state.num_collapsing_sub_paths,
        }
    }

    fn num_sub_paths(&self) -> usize {
        self.sub_path_ordering.len()
    }

    fn num_editable_sub_paths(&self) -> usize {
        self.num_sub_paths() - self.num_collapsing_sub_paths
    }

    fn leaf_key(&self, sub_idx: usize) -> Result<SubPathKey> {
        let out_of_range = PathError::SubPathIndex {
            index: sub_idx,
            len: self.num_sub_paths(),
        };
        let sps_idx = *self.sub_path_ordering.get(sub_idx).ok_or(out_of_range.clone())?;
        self.forest.leaves().get(sps_idx).copied().ok_or(out_of_range)
    }

    fn editable_leaf_key(&self, sub_idx: usize) -> Result<SubPathKey> {
        let key = self.leaf_key(sub_idx)?;
        if self.forest[key].is_collapsing() {
            return Err(PathError::CollapsingSubPath(sub_idx));
        }
        Ok(key)
    }

    fn check_command_index(&self, sub_idx: usize, key: SubPathKey, cmd_idx: usize) -> Result<()> {
        let len = self.forest[key].num_commands();
        if cmd_idx >= len {
            return Err(PathError::CommandIndex {
                sub_idx,
                index: cmd_idx,
                len,
            });
        }
        Ok(())
    }

    /// Resolve a visible command to its command state. `None` for the move.
    fn target(&self, sub_idx: usize, cmd_idx: usize) -> Result<Option<Target>> {
        let key = self.editable_leaf_key(sub_idx)?;
        self.check_command_index(sub_idx, key, cmd_idx)?;
        if cmd_idx == 0 {
            return Ok(None);
        }
        let sps = &self.forest[key];
        let m = sps.num_drawing_commands();
        let s = sps.shift_offset() % m;
        let underlying = if sps.is_reversed() {
            (m - cmd_idx + s) % m + 1
        } else {
            (cmd_idx - 1 + s) % m + 1
        };
        let location = locate(sps.command_states(), underlying).ok_or(PathError::CommandIndex {
            sub_idx,
            index: cmd_idx,
            len: m + 1,
        })?;
        Ok(Some(Target {
            key,
            cs_idx: location.cs_idx,
            split_idx: location.split_idx,
            underlying,
            is_reversed: sps.is_reversed(),
        }))
    }

    /// Keep the shift pivot on the same point after `inserted` new commands
    /// appeared at underlying index `underlying`.
    fn adjust_shift_for_split(&mut self, key: SubPathKey, underlying: usize, inserted: usize) {
        let sps = &mut self.forest[key];
        if inserted > 0 && underlying <= sps.shift_offset {
            sps.shift_offset += inserted;
        }
    }

    /// Split a command at one or more parameters.
    ///
    /// `ts` are relative to the command as it is currently drawn. Parameters
    /// of exactly `0` or `1`, and duplicates, are skipped.
    pub fn split_command(&mut self, sub_idx: usize, cmd_idx: usize, ts: &[f64]) -> Result<&mut Self> {
        if let Some(&t) = ts.iter().find(|t| !(0.0..=1.0).contains(*t)) {
            return Err(PathError::InvalidParameter(t));
        }
        let Some(target) = self.target(sub_idx, cmd_idx)? else {
            warn!(sub_idx, "cannot split a move command");
            return Ok(self);
        };
        let ts: Vec<f64> = ts
            .iter()
            .map(|&t| if target.is_reversed { 1.0 - t } else { t })
            .collect();
        let inserted = self.forest[target.key].command_states[target.cs_idx]
            .split_at_index(target.split_idx, &ts);
        self.adjust_shift_for_split(target.key, target.underlying, inserted);
        debug!(sub_idx, cmd_idx, inserted, "split command");
        Ok(self)
    }

    /// Split a command at its arc-length midpoint
    pub fn split_command_in_half(&mut self, sub_idx: usize, cmd_idx: usize) -> Result<&mut Self> {
        let Some(target) = self.target(sub_idx, cmd_idx)? else {
            warn!(sub_idx, "cannot split a move command");
            return Ok(self);
        };
        let inserted =
            self.forest[target.key].command_states[target.cs_idx].split_in_half(target.split_idx);
        self.adjust_shift_for_split(target.key, target.underlying, inserted);
        Ok(self)
    }

    /// Remove the split point at the end of command `cmd_idx`, merging it
    /// with the command that follows.
    pub fn unsplit_command(&mut self, sub_idx: usize, cmd_idx: usize) -> Result<&mut Self> {
        let Some(target) = self.target(sub_idx, cmd_idx)? else {
            warn!(sub_idx, "a move command has no split point");
            return Ok(self);
        };
        // Reversed, the visible end is the underlying start.
        let (record, removed) = if target.is_reversed {
            if target.split_idx == 0 {
                warn!(sub_idx, cmd_idx, "command does not end at a split point");
                return Ok(self);
            }
            (target.split_idx - 1, target.underlying - 1)
        } else {
            (target.split_idx, target.underlying)
        };
        let sps = &mut self.forest[target.key];
        if sps.command_states[target.cs_idx].unsplit_at_index(record) && removed <= sps.shift_offset
        {
            sps.shift_offset -= 1;
        }
        debug!(sub_idx, cmd_idx, "unsplit command");
        Ok(self)
    }

    /// Render one command as another kind without changing its geometry
    pub fn convert_command(
        &mut self,
        sub_idx: usize,
        cmd_idx: usize,
        svg_char: SvgChar,
    ) -> Result<&mut Self> {
        let Some(target) = self.target(sub_idx, cmd_idx)? else {
            warn!(sub_idx, "cannot convert a move command");
            return Ok(self);
        };
        self.forest[target.key].command_states[target.cs_idx]
            .convert_at_index(target.split_idx, svg_char);
        Ok(self)
    }

    /// Undo every conversion in a subpath
    pub fn unconvert_sub_path(&mut self, sub_idx: usize) -> Result<&mut Self> {
        let key = self.editable_leaf_key(sub_idx)?;
        for cs in &mut self.forest[key].command_states {
            cs.unconvert();
        }
        Ok(self)
    }

    /// Key of a closed subpath that can be reversed or shifted
    fn closed_leaf_key(&self, sub_idx: usize, action: &str) -> Result<Option<SubPathKey>> {
        let key = self.editable_leaf_key(sub_idx)?;
        let sps = &self.forest[key];
        if !sps.is_closed() || sps.num_drawing_commands() < 2 {
            warn!(sub_idx, action, "only closed subpaths can be reversed or shifted");
            return Ok(None);
        }
        Ok(Some(key))
    }

    pub fn reverse_sub_path(&mut self, sub_idx: usize) -> Result<&mut Self> {
        if let Some(key) = self.closed_leaf_key(sub_idx, "reverse")? {
            let sps = &mut self.forest[key];
            sps.is_reversed = !sps.is_reversed;
        }
        Ok(self)
    }

    /// Move the start point to the end of the first drawn command
    pub fn shift_sub_path_forward(&mut self, sub_idx: usize) -> Result<&mut Self> {
        self.shift_sub_path(sub_idx, true)
    }

    /// Move the start point to the start of the last drawn command
    pub fn shift_sub_path_back(&mut self, sub_idx: usize) -> Result<&mut Self> {
        self.shift_sub_path(sub_idx, false)
    }

    fn shift_sub_path(&mut self, sub_idx: usize, forward: bool) -> Result<&mut Self> {
        let action = if forward { "shift forward" } else { "shift back" };
        if let Some(key) = self.closed_leaf_key(sub_idx, action)? {
            let sps = &mut self.forest[key];
            let m = sps.num_drawing_commands();
            // Forward on a reversed subpath is backward on the underlying data.
            sps.shift_offset = if forward != sps.is_reversed {
                (sps.shift_offset + 1) % m
            } else {
                (sps.shift_offset + m - 1) % m
            };
        }
        Ok(self)
    }

    /// Reorder subpaths; the tree is left untouched
    pub fn move_sub_path(&mut self, from_sub_idx: usize, to_sub_idx: usize) -> Result<&mut Self> {
        let len = self.num_editable_sub_paths();
        for index in [from_sub_idx, to_sub_idx] {
            if index >= len {
                return Err(PathError::SubPathIndex { index, len });
            }
        }
        let sps_idx = self.sub_path_ordering.remove(from_sub_idx);
        self.sub_path_ordering.insert(to_sub_idx, sps_idx);
        Ok(self)
    }

    /// Install two new leaves under `key`, right after `sub_idx`
    fn install_split(
        &mut self,
        sub_idx: usize,
        key: SubPathKey,
        first: SubPathState,
        second: SubPathState,
        split_segments: Option<(CommandId, CommandId)>,
    ) {
        let sps_idx = self.sub_path_ordering[sub_idx];
        self.forest.split(key, first, second);
        self.forest[key].split_segments = split_segments;
        for entry in self.sub_path_ordering.iter_mut() {
            if *entry > sps_idx {
                *entry += 1;
            }
        }
        self.sub_path_ordering.insert(sub_idx + 1, sps_idx + 1);
        debug!(sub_idx, sps_idx, ordering = ?self.sub_path_ordering, "split subpath");
    }

    /// Cut a stroked subpath in two at the end of command `cmd_idx`
    pub fn split_stroked_sub_path(&mut self, sub_idx: usize, cmd_idx: usize) -> Result<&mut Self> {
        let key = self.editable_leaf_key(sub_idx)?;
        self.check_command_index(sub_idx, key, cmd_idx)?;
        let sps = &self.forest[key];
        if cmd_idx == 0 || cmd_idx + 1 >= sps.num_commands() {
            warn!(sub_idx, cmd_idx, "cannot split a subpath at its start or end");
            return Ok(self);
        }

        let baked = sps.bake();
        let Some(cut) = locate(&baked, cmd_idx) else {
            return Ok(self);
        };
        let (left, right) = baked[cut.cs_idx].slice(cut.split_idx);

        let mut second = vec![left.anchored_move(CommandId::next())];
        second.extend(right);
        second.extend(baked[cut.cs_idx + 1..].iter().cloned());
        // The second piece no longer ends where it starts.
        if let Some(last) = second.last_mut() {
            last.demote_close_path();
        }

        let mut first = baked[..cut.cs_idx].to_vec();
        first.push(left);

        self.install_split(
            sub_idx,
            key,
            SubPathState::new(first),
            SubPathState::new(second),
            None,
        );
        Ok(self)
    }

    /// Cut a closed, filled subpath along a line between the ends of two
    /// commands. The pieces are closed by a pair of connector lines.
    pub fn split_filled_sub_path(
        &mut self,
        sub_idx: usize,
        start_cmd_idx: usize,
        end_cmd_idx: usize,
    ) -> Result<&mut Self> {
        let key = self.editable_leaf_key(sub_idx)?;
        self.check_command_index(sub_idx, key, start_cmd_idx)?;
        self.check_command_index(sub_idx, key, end_cmd_idx)?;
        let (a, b) = if start_cmd_idx <= end_cmd_idx {
            (start_cmd_idx, end_cmd_idx)
        } else {
            (end_cmd_idx, start_cmd_idx)
        };
        let sps = &self.forest[key];
        if !sps.is_closed() {
            warn!(sub_idx, "only closed subpaths can be split as a filled shape");
            return Ok(self);
        }
        if a == 0 || a == b {
            warn!(sub_idx, a, b, "filled split needs two distinct drawn commands");
            return Ok(self);
        }

        let baked = sps.bake();
        let (Some(at_a), Some(at_b)) = (locate(&baked, a), locate(&baked, b)) else {
            return Ok(self);
        };
        let (a_left, a_right) = baked[at_a.cs_idx].slice(at_a.split_idx);
        let (b_left, b_right) = baked[at_b.cs_idx].slice(at_b.split_idx);
        let start_line = a_left.connector_to(&b_left, CommandId::next());
        let end_line = b_left.connector_to(&a_left, CommandId::next());
        let split_segments = (
            start_line.backing_command().id(),
            end_line.backing_command().id(),
        );

        // d1..da, start line, d(b+1)..dm
        let mut first = baked[..at_a.cs_idx].to_vec();
        first.push(a_left.clone());
        first.push(start_line);
        first.extend(b_right);
        first.extend(baked[at_b.cs_idx + 1..].iter().cloned());
        demote_inner_close_paths(&mut first);

        // d(a+1)..db, end line
        let mut second = vec![a_left.anchored_move(CommandId::next())];
        if at_a.cs_idx == at_b.cs_idx {
            second.push(baked[at_a.cs_idx].slice_range(at_a.split_idx + 1, at_b.split_idx));
        } else {
            second.extend(a_right);
            second.extend(baked[at_a.cs_idx + 1..at_b.cs_idx].iter().cloned());
            second.push(b_left);
        }
        second.push(end_line);
        for cs in &mut second {
            cs.demote_close_path();
        }

        self.install_split(
            sub_idx,
            key,
            SubPathState::new(first),
            SubPathState::new(second),
            Some(split_segments),
        );
        Ok(self)
    }

    /// Collapse the subtree under `key` back into a single leaf
    fn collapse(&mut self, key: SubPathKey) {
        let leaves = self.forest.leaves();
        let mut removed = Vec::new();
        self.forest.collect_leaves(key, &mut removed);
        let Some(lo) = removed
            .first()
            .and_then(|first| leaves.iter().position(|k| k == first))
        else {
            return;
        };
        let count = removed.len();

        self.forest.remove_descendants(key);
        self.forest[key].split_segments = None;

        // The first leaf's entry now stands for the collapsed subpath.
        self.sub_path_ordering
            .retain(|&entry| entry <= lo || entry >= lo + count);
        for entry in self.sub_path_ordering.iter_mut() {
            if *entry >= lo + count {
                *entry -= count - 1;
            }
        }
        debug!(sps_idx = lo, count, ordering = ?self.sub_path_ordering, "collapsed subpath");
    }

    /// Parent of a split leaf, if it was split the way `filled` says
    fn split_parent(&self, sub_idx: usize, filled: bool) -> Result<Option<SubPathKey>> {
        let key = self.editable_leaf_key(sub_idx)?;
        let Some(parent) = self.forest[key].parent() else {
            warn!(sub_idx, "subpath is not split");
            return Ok(None);
        };
        if self.forest[parent].split_segments.is_some() != filled {
            warn!(sub_idx, filled, "subpath was split the other way");
            return Ok(None);
        }
        Ok(Some(parent))
    }

    /// Merge a stroked split back into the original subpath
    pub fn unsplit_stroked_sub_path(&mut self, sub_idx: usize) -> Result<&mut Self> {
        if let Some(parent) = self.split_parent(sub_idx, false)? {
            self.collapse(parent);
        }
        Ok(self)
    }

    /// Merge a filled split back into the original subpath
    pub fn unsplit_filled_sub_path(&mut self, sub_idx: usize) -> Result<&mut Self> {
        if let Some(parent) = self.split_parent(sub_idx, true)? {
            self.collapse(parent);
        }
        Ok(self)
    }

    /// Remove the connector shared by two subpaths produced by filled splits.
    ///
    /// Siblings collapse into their parent. Pieces from different branches
    /// that share a connector pair are stitched into one subpath.
    pub fn delete_sub_path_split_segment(
        &mut self,
        first_sub_idx: usize,
        second_sub_idx: usize,
    ) -> Result<&mut Self> {
        let x = self.editable_leaf_key(first_sub_idx)?;
        let y = self.editable_leaf_key(second_sub_idx)?;
        if x == y {
            warn!(first_sub_idx, "a subpath shares no connector with itself");
            return Ok(self);
        }
        let parent = self.forest[x].parent();
        if parent.is_some() && parent == self.forest[y].parent() {
            if let Some(parent) = parent.filter(|&p| self.forest[p].split_segments.is_some()) {
                self.collapse(parent);
                return Ok(self);
            }
        }
        self.stitch(x, y);
        Ok(self)
    }

    /// Merge two leaves across a shared connector pair.
    ///
    /// The leaf hanging from the deeper split is folded into the other one,
    /// and its sibling takes its parent's place. The ancestor owning the
    /// connector pair always survives, so it can still be collapsed.
    fn stitch(&mut self, x: SubPathKey, y: SubPathKey) {
        let (x, y) = match self.forest[y].parent() {
            Some(y_parent) if self.forest.ancestors(x).contains(&y_parent) => (y, x),
            _ => (x, y),
        };
        let pairs: SmallVec<[(CommandId, CommandId); 4]> = self
            .forest
            .ancestors(x)
            .into_iter()
            .chain(self.forest.ancestors(y))
            .filter_map(|key| self.forest[key].split_segments)
            .collect();
        let shares_pair = |a: CommandId, b: CommandId| {
            pairs.iter().any(|&(s, e)| (s, e) == (a, b) || (s, e) == (b, a))
        };

        // Shift does not change a closed outline, only where it starts.
        let xs = bake_command_states(
            self.forest[x].command_states(),
            self.forest[x].is_reversed(),
            0,
        );
        let ys = bake_command_states(
            self.forest[y].command_states(),
            self.forest[y].is_reversed(),
            0,
        );
        let connectors = |css: &[CommandState]| -> Vec<(usize, CommandId)> {
            css.iter()
                .enumerate()
                .filter(|(_, cs)| cs.backing_command().is_sub_path_split_segment())
                .map(|(i, cs)| (i, cs.backing_command().id()))
                .collect()
        };
        let found = connectors(&xs).into_iter().find_map(|(ix, cx)| {
            connectors(&ys)
                .into_iter()
                .find(|&(_, cy)| shares_pair(cx, cy))
                .map(|(iy, _)| (ix, iy))
        });
        let Some((ix, iy)) = found else {
            warn!("subpaths share no split segment");
            return;
        };
        let Some(y_parent) = self.forest[y].parent() else {
            return;
        };
        let Some(&sibling) = self.forest[y_parent]
            .split_sub_paths
            .iter()
            .find(|&&k| k != y)
        else {
            return;
        };

        // x up to its connector, around y starting after its connector,
        // then the rest of x.
        let mut merged = xs[..ix].to_vec();
        merged.extend(ys[iy + 1..].iter().cloned());
        merged.extend(ys[1..iy].iter().cloned());
        merged.extend(xs[ix + 1..].iter().cloned());
        demote_inner_close_paths(&mut merged);

        let leaves = self.forest.leaves();
        let Some(y_sps_idx) = leaves.iter().position(|&k| k == y) else {
            return;
        };
        {
            let node = &mut self.forest[x];
            node.command_states = merged;
            node.is_reversed = false;
            node.shift_offset = 0;
        }
        self.forest.remove_subtree(y);
        self.forest.replace_node(y_parent, sibling);

        self.sub_path_ordering.retain(|&entry| entry != y_sps_idx);
        for entry in self.sub_path_ordering.iter_mut() {
            if *entry > y_sps_idx {
                *entry -= 1;
            }
        }
        debug!(y_sps_idx, ordering = ?self.sub_path_ordering, "stitched subpaths");
    }

    /// Compose transforms onto every command state
    pub fn add_transforms(&mut self, transforms: &[Matrix]) -> &mut Self {
        for node in self.forest.iter_mut() {
            for cs in &mut node.command_states {
                cs.add_transforms(transforms);
            }
        }
        self
    }

    /// Replace the transforms of every command state
    pub fn set_transforms(&mut self, transforms: &[Matrix]) -> &mut Self {
        for node in self.forest.iter_mut() {
            for cs in &mut node.command_states {
                cs.set_transforms(transforms);
            }
        }
        self
    }

    /// Append a subpath of `num_commands` commands collapsed onto `point`
    pub fn add_collapsing_sub_path(&mut self, point: Point, num_commands: usize) -> &mut Self {
        if num_commands == 0 {
            warn!("a collapsing subpath needs at least one command");
            return self;
        }
        let mut commands = vec![Command::move_to(None, point)];
        commands.extend((1..num_commands).map(|_| Command::line_to(point, point)));
        let mut sps = SubPathState::new(command_states_from(commands));
        sps.is_collapsing = true;

        let sps_idx = self.forest.leaves().len();
        self.forest.push_root(sps);
        self.sub_path_ordering.push(sps_idx);
        self.num_collapsing_sub_paths += 1;
        self
    }

    pub fn delete_collapsing_sub_paths(&mut self) -> &mut Self {
        if self.num_collapsing_sub_paths == 0 {
            return self;
        }
        let collapsing: Vec<SubPathKey> = self
            .forest
            .roots()
            .iter()
            .copied()
            .filter(|&key| self.forest[key].is_collapsing())
            .collect();
        let first = self.forest.leaves().len() - collapsing.len();
        for key in collapsing {
            self.forest.remove_subtree(key);
        }
        self.sub_path_ordering.retain(|&entry| entry < first);
        self.num_collapsing_sub_paths = 0;
        self
    }

    /// Discard every edit, keeping transforms
    pub fn revert(&mut self) -> &mut Self {
        self.delete_collapsing_sub_paths();
        let roots = self.forest.roots().to_vec();
        for &key in &roots {
            self.forest.remove_descendants(key);
            self.forest[key].revert();
        }
        self.sub_path_ordering = (0..roots.len()).collect();
        self
    }

    pub fn build(&self) -> Path {
        Path::from_state(PathState::new(
            self.forest.clone(),
            self.sub_path_ordering.clone(),
            self.num_collapsing_sub_paths,
        ))
    }
}

/// A close path may only end a subpath
fn demote_inner_close_paths(css: &mut [CommandState]) {
    if let Some((_, inner)) = css.split_last_mut() {
        for cs in inner {
            cs.demote_close_path();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(data: &str) -> Path {
        Path::parse(data).unwrap()
    }

    #[test]
    fn test_split_and_unsplit_command() {
        let original = path("M 0 0 L 10 10 L 20 20");
        let split = original.mutate().split_command(0, 2, &[0.5]).unwrap().build();
        assert_eq!(split.path_string(), "M 0 0 L 10 10 L 15 15 L 20 20");
        assert!(split.command(0, 2).unwrap().is_split_point());

        let unsplit = split.mutate().unsplit_command(0, 2).unwrap().build();
        assert_eq!(unsplit.path_string(), original.path_string());
    }

    #[test]
    fn test_split_rejects_out_of_range_parameters() {
        let original = path("M 0 0 L 10 10");
        let mut mutator = original.mutate();
        assert_eq!(
            mutator.split_command(0, 1, &[1.5]).unwrap_err(),
            PathError::InvalidParameter(1.5)
        );
        assert!(mutator.split_command(0, 1, &[f64::NAN]).is_err());
        assert!(matches!(
            mutator.split_command(0, 2, &[0.5]),
            Err(PathError::CommandIndex { .. })
        ));
        assert!(matches!(
            mutator.split_command(1, 1, &[0.5]),
            Err(PathError::SubPathIndex { .. })
        ));
    }

    #[test]
    fn test_stale_ordering_is_an_error() {
        let mut mutator = path("M 0 0 L 10 0").mutate();
        mutator.sub_path_ordering = vec![3];
        assert_eq!(
            mutator.reverse_sub_path(0).unwrap_err(),
            PathError::SubPathIndex { index: 0, len: 1 }
        );
    }

    #[test]
    fn test_degenerate_edits_are_no_ops() {
        let original = path("M 0 0 L 10 0 L 10 10");
        let edited = original
            .mutate()
            .split_command(0, 0, &[0.5])
            .unwrap()
            .split_command(0, 1, &[0.0, 1.0])
            .unwrap()
            .unsplit_command(0, 1)
            .unwrap()
            .reverse_sub_path(0)
            .unwrap()
            .shift_sub_path_forward(0)
            .unwrap()
            .build();
        assert_eq!(edited.path_string(), original.path_string());
    }

    #[test]
    fn test_split_reversed_sub_path() {
        let original = path("M 0 0 L 10 0 L 10 10 L 0 10 Z");
        let reversed = original.mutate().reverse_sub_path(0).unwrap().build();
        assert_eq!(reversed.path_string(), "M 0 0 L 0 10 L 10 10 L 10 0 L 0 0");

        let split = reversed.mutate().split_command(0, 2, &[0.25]).unwrap().build();
        assert_eq!(
            split.path_string(),
            "M 0 0 L 0 10 L 2.5 10 L 10 10 L 10 0 L 0 0"
        );
        assert!(split.command(0, 2).unwrap().is_split_point());

        let unsplit = split.mutate().unsplit_command(0, 2).unwrap().build();
        assert_eq!(unsplit.path_string(), reversed.path_string());

        let restored = split
            .mutate()
            .reverse_sub_path(0)
            .unwrap()
            .unsplit_command(0, 3)
            .unwrap()
            .build();
        assert_eq!(restored.path_string(), original.path_string());
    }

    #[test]
    fn test_split_before_shift_pivot_keeps_start() {
        let original = path("M 0 0 L 10 0 L 10 10 L 0 10 Z");
        let shifted = original.mutate().shift_sub_path_forward(0).unwrap().build();
        assert_eq!(shifted.path_string(), "M 10 0 L 10 10 L 0 10 L 0 0 L 10 0");

        // The last visible command is the first underlying one.
        let split = shifted.mutate().split_command(0, 4, &[0.5]).unwrap().build();
        assert_eq!(
            split.path_string(),
            "M 10 0 L 10 10 L 0 10 L 0 0 L 5 0 L 10 0"
        );
        let unsplit = split.mutate().unsplit_command(0, 4).unwrap().build();
        assert_eq!(unsplit.path_string(), shifted.path_string());
    }

    #[test]
    fn test_shift_on_reversed_sub_path() {
        let original = path("M 0 0 L 10 0 L 10 10 L 0 10 Z");
        let reversed = original.mutate().reverse_sub_path(0).unwrap().build();
        let shifted = reversed.mutate().shift_sub_path_forward(0).unwrap().build();
        assert_eq!(shifted.path_string(), "M 0 10 L 10 10 L 10 0 L 0 0 L 0 10");
        let back = shifted.mutate().shift_sub_path_back(0).unwrap().build();
        assert_eq!(back.path_string(), reversed.path_string());
    }

    #[test]
    fn test_convert_and_unconvert() {
        let original = path("M 0 0 L 10 0 L 10 10");
        let converted = original
            .mutate()
            .convert_command(0, 1, SvgChar::CubicCurve)
            .unwrap()
            .build();
        assert_eq!(converted.command(0, 1).unwrap().svg_char(), SvgChar::CubicCurve);
        assert_eq!(converted.command(0, 1).unwrap().end(), Point::new(10.0, 0.0));

        let restored = converted.mutate().unconvert_sub_path(0).unwrap().build();
        assert_eq!(restored.path_string(), original.path_string());
    }

    #[test]
    fn test_move_sub_path() {
        let original = path("M 0 0 L 1 1 M 5 5 L 6 6 M 9 9 L 8 8");
        let moved = original.mutate().move_sub_path(0, 2).unwrap().build();
        assert_eq!(
            moved.path_string(),
            "M 5 5 L 6 6 M 9 9 L 8 8 M 0 0 L 1 1"
        );
        assert_eq!(moved.commands()[2].start(), Some(Point::new(6.0, 6.0)));
        assert!(original.mutate().move_sub_path(0, 3).is_err());
    }

    #[test]
    fn test_split_stroked_sub_path() {
        let original = path("M 0 0 L 10 0 L 20 0 L 30 0");
        let split = original.mutate().split_stroked_sub_path(0, 2).unwrap().build();
        assert_eq!(split.sub_paths().len(), 2);
        assert_eq!(split.path_string(), "M 0 0 L 10 0 L 20 0 M 20 0 L 30 0");
        assert!(split.sub_path(0).unwrap().is_split());

        let unsplit = split.mutate().unsplit_stroked_sub_path(1).unwrap().build();
        assert_eq!(unsplit.path_string(), original.path_string());
        assert_eq!(unsplit.sub_paths().len(), 1);
    }

    #[test]
    fn test_split_stroked_closed_sub_path_drops_close() {
        let original = path("M 0 0 L 10 0 L 10 10 Z");
        let split = original.mutate().split_stroked_sub_path(0, 1).unwrap().build();
        assert_eq!(split.path_string(), "M 0 0 L 10 0 M 10 0 L 10 10 L 0 0");
    }

    #[test]
    fn test_split_filled_sub_path() {
        let original = path("M 0 0 L 10 0 L 10 10 L 0 10 Z");
        let split = original.mutate().split_filled_sub_path(0, 3, 1).unwrap().build();
        assert_eq!(
            split.path_string(),
            "M 0 0 L 10 0 L 0 10 Z M 10 0 L 10 10 L 0 10 L 10 0"
        );
        let connector = split.command(0, 2).unwrap();
        assert!(connector.is_sub_path_split_segment());
        assert!(split.command(1, 3).unwrap().is_sub_path_split_segment());

        let merged = split.mutate().delete_sub_path_split_segment(0, 1).unwrap().build();
        assert_eq!(merged.path_string(), original.path_string());

        let unsplit = split.mutate().unsplit_filled_sub_path(1).unwrap().build();
        assert_eq!(unsplit.path_string(), original.path_string());
        // A filled split is not undone by the stroked inverse.
        let untouched = split.mutate().unsplit_stroked_sub_path(1).unwrap().build();
        assert_eq!(untouched.path_string(), split.path_string());
    }

    #[test]
    fn test_split_filled_requires_closed_sub_path() {
        let original = path("M 0 0 L 10 0 L 10 10 L 0 10");
        let split = original.mutate().split_filled_sub_path(0, 1, 3).unwrap().build();
        assert_eq!(split.path_string(), original.path_string());
    }

    #[test]
    fn test_ordering_after_split() {
        let original = path("M 0 0 L 10 0 L 20 0 M 50 50 L 60 60");
        let split = original
            .mutate()
            .move_sub_path(1, 0)
            .unwrap()
            .split_stroked_sub_path(1, 1)
            .unwrap()
            .build();
        assert_eq!(
            split.path_string(),
            "M 50 50 L 60 60 M 0 0 L 10 0 M 10 0 L 20 0"
        );
        let unsplit = split.mutate().unsplit_stroked_sub_path(2).unwrap().build();
        assert_eq!(unsplit.path_string(), "M 50 50 L 60 60 M 0 0 L 10 0 L 20 0");
    }

    #[test]
    fn test_collapsing_sub_paths() {
        let original = path("M 0 0 L 10 0");
        let padded = original
            .mutate()
            .add_collapsing_sub_path(Point::new(3.0, 3.0), 3)
            .build();
        assert_eq!(padded.path_string(), "M 0 0 L 10 0 M 3 3 L 3 3 L 3 3");
        assert_eq!(padded.num_collapsing_sub_paths(), 1);
        assert!(padded.sub_path(1).unwrap().is_collapsing());
        assert_eq!(
            padded.mutate().reverse_sub_path(1).unwrap_err(),
            PathError::CollapsingSubPath(1)
        );

        let removed = padded.mutate().delete_collapsing_sub_paths().build();
        assert_eq!(removed.path_string(), original.path_string());
        assert_eq!(removed.num_collapsing_sub_paths(), 0);
    }

    #[test]
    fn test_transforms() {
        let original = path("M 0 0 L 10 0");
        let moved = original
            .mutate()
            .add_transforms(&[Matrix::translation(5.0, 5.0)])
            .build();
        assert_eq!(moved.path_string(), "M 5 5 L 15 5");
        let scaled = moved
            .mutate()
            .set_transforms(&[Matrix::scale(2.0, 2.0)])
            .build();
        assert_eq!(scaled.path_string(), "M 0 0 L 20 0");
    }

    #[test]
    fn test_revert() {
        let original = path("M 0 0 L 10 0 L 10 10 L 0 10 Z M 20 20 L 30 30");
        let edited = original
            .mutate()
            .split_command(0, 1, &[0.5])
            .unwrap()
            .reverse_sub_path(0)
            .unwrap()
            .shift_sub_path_forward(0)
            .unwrap()
            .split_stroked_sub_path(1, 1)
            .unwrap()
            .move_sub_path(0, 1)
            .unwrap()
            .add_collapsing_sub_path(Point::ZERO, 2)
            .build();
        assert_ne!(edited.path_string(), original.path_string());
        let reverted = edited.mutate().revert().build();
        assert_eq!(reverted.path_string(), original.path_string());
    }
}
