//! Subpath states and the forest they live in
//!
//! Each subpath keeps the command states it was built from plus two
//! presentation transforms, reversal and shift, which are only materialized
//! ("baked") when the visible commands are needed. Splitting a subpath turns
//! its node into an internal node of a binary tree whose leaves are the
//! rendered subpaths.

use std::ops::{Index, IndexMut};

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use tracing::trace;

use crate::command::{Command, CommandId};
use crate::command_state::CommandState;

new_key_type! {
    /// Handle to a subpath node in a [`SubPathForest`]
    pub struct SubPathKey;
}

/// One node of the subpath forest
#[derive(Clone, Debug)]
pub struct SubPathState {
    pub(crate) command_states: Vec<CommandState>,
    pub(crate) is_reversed: bool,
    /// Rotation of the start point, in the unreversed frame
    pub(crate) shift_offset: usize,
    pub(crate) parent: Option<SubPathKey>,
    /// Empty for leaves, otherwise exactly two children
    pub(crate) split_sub_paths: SmallVec<[SubPathKey; 2]>,
    /// Ids of the connector lines created by a filled split of this node
    pub(crate) split_segments: Option<(CommandId, CommandId)>,
    pub(crate) is_collapsing: bool,
}

impl SubPathState {
    pub fn new(command_states: Vec<CommandState>) -> Self {
        Self {
            command_states,
            is_reversed: false,
            shift_offset: 0,
            parent: None,
            split_sub_paths: SmallVec::new(),
            split_segments: None,
            is_collapsing: false,
        }
    }

    pub fn command_states(&self) -> &[CommandState] {
        &self.command_states
    }

    pub fn is_reversed(&self) -> bool {
        self.is_reversed
    }

    pub fn shift_offset(&self) -> usize {
        self.shift_offset
    }

    pub fn is_leaf(&self) -> bool {
        self.split_sub_paths.is_empty()
    }

    pub fn is_collapsing(&self) -> bool {
        self.is_collapsing
    }

    pub fn parent(&self) -> Option<SubPathKey> {
        self.parent
    }

    /// Visible commands, the leading move included
    pub fn num_commands(&self) -> usize {
        self.command_states.iter().map(|cs| cs.num_segments()).sum()
    }

    /// Visible commands after the leading move
    pub fn num_drawing_commands(&self) -> usize {
        self.num_commands().saturating_sub(1)
    }

    /// Whether the last command ends where the leading move does
    pub fn is_closed(&self) -> bool {
        match (self.command_states.first(), self.command_states.last()) {
            (Some(first), Some(last)) if self.command_states.len() > 1 => {
                first.end_point().approx_eq(last.end_point())
            }
            _ => false,
        }
    }

    /// Command states with reversal and shift applied
    pub fn bake(&self) -> Vec<CommandState> {
        bake_command_states(&self.command_states, self.is_reversed, self.shift_offset)
    }

    /// The visible commands. Move starts are left for the path to thread.
    pub fn build(&self) -> Vec<Command> {
        self.bake().iter().flat_map(|cs| cs.build()).collect()
    }

    /// Restore the unedited command states and clear presentation state
    pub(crate) fn revert(&mut self) {
        self.is_reversed = false;
        self.shift_offset = 0;
        self.split_sub_paths.clear();
        self.split_segments = None;
        for cs in &mut self.command_states {
            cs.revert();
        }
    }
}

/// Where a visible command lives inside a list of command states
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandLocation {
    pub cs_idx: usize,
    pub split_idx: usize,
}

/// Locate the `cmd_idx`-th visible command of `command_states`
pub fn locate(command_states: &[CommandState], cmd_idx: usize) -> Option<CommandLocation> {
    let mut remaining = cmd_idx;
    for (cs_idx, cs) in command_states.iter().enumerate() {
        if remaining < cs.num_segments() {
            return Some(CommandLocation {
                cs_idx,
                split_idx: remaining,
            });
        }
        remaining -= cs.num_segments();
    }
    None
}

/// Index of the first visible command of `command_states[cs_idx]`
pub fn first_command_index(command_states: &[CommandState], cs_idx: usize) -> usize {
    command_states[..cs_idx]
        .iter()
        .map(|cs| cs.num_segments())
        .sum()
}

/// Materialize reversal and shift into a fresh list of command states.
///
/// `shift_offset` is expressed in the unreversed frame. The result starts
/// with a move; a close path survives only as the final command.
pub fn bake_command_states(
    command_states: &[CommandState],
    is_reversed: bool,
    shift_offset: usize,
) -> Vec<CommandState> {
    let mut css = command_states.to_vec();
    let num_drawing: usize = css.iter().skip(1).map(|cs| cs.num_segments()).sum();
    if num_drawing == 0 {
        return css;
    }
    if is_reversed {
        css = reverse_command_states(&css);
    }
    let offset = if is_reversed {
        (num_drawing - shift_offset % num_drawing) % num_drawing
    } else {
        shift_offset % num_drawing
    };
    if offset != 0 {
        css = shift_command_states(&css, offset);
    }
    trace!(is_reversed, shift_offset, "baked subpath");
    css
}

/// `[move, d1, .., dm]` becomes `[move', rev(dm), .., rev(d1)]`
fn reverse_command_states(css: &[CommandState]) -> Vec<CommandState> {
    let move_id = css[0].backing_command().id();
    let mut reversed = Vec::with_capacity(css.len());
    // The last drawing command ends where the reversed subpath starts.
    if let Some(last) = css.last() {
        reversed.push(last.anchored_move(move_id));
    }
    reversed.extend(css[1..].iter().rev().map(|cs| {
        let mut cs = cs.clone();
        cs.reverse();
        cs
    }));
    reversed
}

/// Rotate the drawing commands so the subpath starts at the end of the
/// `offset`-th one: `[move', tail.., head.., left]`
fn shift_command_states(css: &[CommandState], offset: usize) -> Vec<CommandState> {
    let move_id = css[0].backing_command().id();
    let Some(pivot) = locate(css, offset) else {
        return css.to_vec();
    };
    let (left, right) = css[pivot.cs_idx].slice(pivot.split_idx);

    let mut shifted = Vec::with_capacity(css.len() + 1);
    shifted.push(left.anchored_move(move_id));
    shifted.extend(right);
    shifted.extend(css[pivot.cs_idx + 1..].iter().cloned());
    shifted.extend(css[1..pivot.cs_idx].iter().cloned());
    shifted.push(left);

    let last = shifted.len() - 1;
    for cs in &mut shifted[..last] {
        if cs.is_close_path() {
            cs.demote_close_path();
        }
    }
    shifted
}

/// Arena of subpath nodes plus the ordered roots
#[derive(Clone, Debug, Default)]
pub struct SubPathForest {
    nodes: SlotMap<SubPathKey, SubPathState>,
    roots: Vec<SubPathKey>,
}

impl SubPathForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: SubPathKey) -> Option<&SubPathState> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: SubPathKey) -> Option<&mut SubPathState> {
        self.nodes.get_mut(key)
    }

    pub fn roots(&self) -> &[SubPathKey] {
        &self.roots
    }

    pub fn push_root(&mut self, state: SubPathState) -> SubPathKey {
        let key = self.nodes.insert(state);
        self.roots.push(key);
        key
    }

    /// Leaves in depth-first order; positions are the `sps_idx` space
    pub fn leaves(&self) -> Vec<SubPathKey> {
        let mut leaves = Vec::new();
        for &root in &self.roots {
            self.collect_leaves(root, &mut leaves);
        }
        leaves
    }

    pub fn collect_leaves(&self, key: SubPathKey, out: &mut Vec<SubPathKey>) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        if node.is_leaf() {
            out.push(key);
        } else {
            for &child in &node.split_sub_paths {
                self.collect_leaves(child, out);
            }
        }
    }

    /// Attach two new children to `parent`
    pub(crate) fn split(
        &mut self,
        parent: SubPathKey,
        mut first: SubPathState,
        mut second: SubPathState,
    ) -> (SubPathKey, SubPathKey) {
        first.parent = Some(parent);
        second.parent = Some(parent);
        let a = self.nodes.insert(first);
        let b = self.nodes.insert(second);
        if let Some(node) = self.nodes.get_mut(parent) {
            node.split_sub_paths = SmallVec::from_buf([a, b]);
        }
        (a, b)
    }

    /// Remove every descendant of `key`, turning it back into a leaf
    pub(crate) fn remove_descendants(&mut self, key: SubPathKey) {
        let children = match self.nodes.get_mut(key) {
            Some(node) => std::mem::take(&mut node.split_sub_paths),
            None => return,
        };
        for child in children {
            self.remove_subtree(child);
        }
    }

    /// Remove `key` and all of its descendants
    pub(crate) fn remove_subtree(&mut self, key: SubPathKey) {
        self.remove_descendants(key);
        self.nodes.remove(key);
        self.roots.retain(|&root| root != key);
    }

    /// Put `replacement` where `old` sits in the tree, then drop `old` alone
    pub(crate) fn replace_node(&mut self, old: SubPathKey, replacement: SubPathKey) {
        let parent = self.nodes.get(old).and_then(|node| node.parent);
        match parent {
            Some(parent) => {
                if let Some(node) = self.nodes.get_mut(parent) {
                    for child in node.split_sub_paths.iter_mut() {
                        if *child == old {
                            *child = replacement;
                        }
                    }
                }
            }
            None => {
                for root in self.roots.iter_mut() {
                    if *root == old {
                        *root = replacement;
                    }
                }
            }
        }
        if let Some(node) = self.nodes.get_mut(replacement) {
            node.parent = parent;
        }
        self.nodes.remove(old);
    }

    /// Every node, internal ones included
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SubPathState> {
        self.nodes.values_mut()
    }

    /// Ancestors of `key`, closest first
    pub fn ancestors(&self, key: SubPathKey) -> Vec<SubPathKey> {
        let mut out = Vec::new();
        let mut current = self.nodes.get(key).and_then(|node| node.parent);
        while let Some(k) = current {
            out.push(k);
            current = self.nodes.get(k).and_then(|node| node.parent);
        }
        out
    }
}

impl Index<SubPathKey> for SubPathForest {
    type Output = SubPathState;

    fn index(&self, key: SubPathKey) -> &SubPathState {
        &self.nodes[key]
    }
}

impl IndexMut<SubPathKey> for SubPathForest {
    fn index_mut(&mut self, key: SubPathKey) -> &mut SubPathState {
        &mut self.nodes[key]
    }
}

/// Build command states for one parsed subpath
pub(crate) fn command_states_from(commands: Vec<Command>) -> Vec<CommandState> {
    commands.into_iter().map(CommandState::new).collect()
}
