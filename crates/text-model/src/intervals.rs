//! Interval storage for tracked decorations.
//!
//! Keeps decoration intervals sorted by start offset with a prefix maximum
//! of interval ends, giving O(log n + k) overlap queries without degrading
//! to a full scan when intervals are plentiful and disjoint. Intervals are
//! stored as absolute UTF-16 offsets and rewritten in place on every edit
//! by [`IntervalTree::accept_replace`], which applies the owning
//! decoration's stickiness policy.

use crate::decorations::ModelDecorationOptions;
use crate::position::Range;
use std::sync::Arc;

/// Policy governing how a decoration's endpoints move when text is typed
/// exactly at its edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackedRangeStickiness {
    /// Insertions at either edge are absorbed into the decoration.
    #[default]
    AlwaysGrowsWhenTypingAtEdges,
    /// Insertions at either edge stay outside the decoration.
    NeverGrowsWhenTypingAtEdges,
    /// Only an insertion exactly at the start is absorbed.
    GrowsOnlyWhenTypingBefore,
    /// Only an insertion exactly at the end is absorbed.
    GrowsOnlyWhenTypingAfter,
}

/// One tracked decoration: an interval plus its immutable options.
#[derive(Debug, Clone)]
pub(crate) struct IntervalNode {
    pub(crate) id: String,
    pub(crate) owner_id: usize,
    /// Interval start, absolute UTF-16 offset.
    pub(crate) start: usize,
    /// Interval end (exclusive), absolute UTF-16 offset.
    pub(crate) end: usize,
    pub(crate) options: Arc<ModelDecorationOptions>,
    /// Version the cached range was computed against.
    pub(crate) cached_version_id: u64,
    /// Lazily rehydrated line/column range; dropped on every edit.
    pub(crate) cached_range: Option<Range>,
}

impl IntervalNode {
    pub(crate) fn new(
        id: String,
        owner_id: usize,
        start: usize,
        end: usize,
        options: Arc<ModelDecorationOptions>,
    ) -> Self {
        Self {
            id,
            owner_id,
            start,
            end,
            options,
            cached_version_id: 0,
            cached_range: None,
        }
    }

    fn matches(&self, filter_owner_id: usize, filter_out_validation: bool) -> bool {
        (filter_owner_id == 0 || self.owner_id == filter_owner_id)
            && !(filter_out_validation && self.options.is_for_validation())
    }
}

/// Where a marker lands after `[start, end)` is replaced by `ins_len` units.
///
/// `stick_to_previous` glues the marker to the character before it, so a
/// pure insertion at the marker's offset leaves it in place (the decoration
/// absorbs the inserted text on that side).
fn adjust_marker(
    marker: usize,
    stick_to_previous: bool,
    start: usize,
    end: usize,
    ins_len: usize,
    force_move: bool,
) -> usize {
    let delta = ins_len as isize - (end - start) as isize;
    if marker < start {
        marker
    } else if marker > end {
        (marker as isize + delta) as usize
    } else if marker == start && end == start {
        // Pure insertion exactly at the marker.
        if force_move || !stick_to_previous {
            marker + ins_len
        } else {
            marker
        }
    } else if marker == start {
        // Deletion starts here; the boundary holds.
        marker
    } else if marker == end {
        (marker as isize + delta) as usize
    } else {
        // Strictly inside the deleted region.
        start
    }
}

/// Apply one replace delta to a node's interval per its stickiness.
pub(crate) fn node_accept_edit(
    node: &mut IntervalNode,
    start: usize,
    end: usize,
    ins_len: usize,
    force_move: bool,
) {
    let stickiness = node.options.stickiness;
    let start_sticks = matches!(
        stickiness,
        TrackedRangeStickiness::AlwaysGrowsWhenTypingAtEdges
            | TrackedRangeStickiness::GrowsOnlyWhenTypingBefore
    );
    let end_sticks = matches!(
        stickiness,
        TrackedRangeStickiness::NeverGrowsWhenTypingAtEdges
            | TrackedRangeStickiness::GrowsOnlyWhenTypingBefore
    );

    if end > start && start <= node.start && node.end <= end {
        // The replacement covers the decoration: collapse at its start.
        node.start = start;
        node.end = start;
    } else {
        node.start = adjust_marker(node.start, start_sticks, start, end, ins_len, force_move);
        node.end = adjust_marker(node.end, end_sticks, start, end, ins_len, force_move);
        if node.start > node.end {
            node.end = node.start;
        }
    }
    node.cached_range = None;
    node.cached_version_id = 0;
}

/// Start-sorted interval list with prefix-maximum-end pruning.
pub(crate) struct IntervalTree {
    nodes: Vec<IntervalNode>,
    /// `prefix_max_end[i] = max(nodes[0..=i].end)`; used to stop backward
    /// scans early in overlap queries.
    prefix_max_end: Vec<usize>,
}

impl IntervalTree {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            prefix_max_end: Vec::new(),
        }
    }

    fn rebuild_prefix_max_end_from(&mut self, start_idx: usize) {
        if self.nodes.is_empty() {
            self.prefix_max_end.clear();
            return;
        }
        if self.prefix_max_end.len() != self.nodes.len() {
            self.prefix_max_end.resize(self.nodes.len(), 0);
        }
        let mut max_end = if start_idx == 0 {
            0
        } else {
            self.prefix_max_end[start_idx - 1]
        };
        for (idx, node) in self.nodes.iter().enumerate().skip(start_idx) {
            max_end = max_end.max(node.end);
            self.prefix_max_end[idx] = max_end;
        }
    }

    pub(crate) fn insert(&mut self, node: IntervalNode) {
        let pos = self
            .nodes
            .binary_search_by_key(&node.start, |n| n.start)
            .unwrap_or_else(|pos| pos);
        self.nodes.insert(pos, node);
        self.prefix_max_end.insert(pos, 0);
        self.rebuild_prefix_max_end_from(pos);
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<IntervalNode> {
        let pos = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(pos);
        self.prefix_max_end.remove(pos);
        if pos < self.nodes.len() {
            self.rebuild_prefix_max_end_from(pos);
        }
        Some(node)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut IntervalNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.prefix_max_end.clear();
    }

    /// Every node whose interval overlaps `[start, end]` (closed on both
    /// sides, so empty decorations sitting on a boundary are included).
    pub(crate) fn interval_search(
        &mut self,
        start: usize,
        end: usize,
        filter_owner_id: usize,
        filter_out_validation: bool,
    ) -> Vec<&mut IntervalNode> {
        if self.nodes.is_empty() {
            return Vec::new();
        }

        // Nodes starting past `end` cannot overlap.
        let search_end = self.nodes.partition_point(|n| n.start <= end);
        if search_end == 0 {
            return Vec::new();
        }

        // Walk left from the first node starting at/after `start` while the
        // prefix maximum says an earlier interval may still reach `start`.
        let mut scan_start = self
            .nodes
            .partition_point(|n| n.start < start)
            .min(search_end);
        while scan_start > 0 && self.prefix_max_end[scan_start - 1] >= start {
            scan_start -= 1;
        }

        self.nodes[scan_start..search_end]
            .iter_mut()
            .filter(|n| n.start <= end && n.end >= start)
            .filter(|n| n.matches(filter_owner_id, filter_out_validation))
            .collect()
    }

    /// Every node, optionally filtered by owner and validation flag.
    pub(crate) fn search(
        &mut self,
        filter_owner_id: usize,
        filter_out_validation: bool,
    ) -> Vec<&mut IntervalNode> {
        self.nodes
            .iter_mut()
            .filter(|n| n.matches(filter_owner_id, filter_out_validation))
            .collect()
    }

    /// All nodes belonging to `owner_id`.
    pub(crate) fn collect_nodes_from_owner(&self, owner_id: usize) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.owner_id == owner_id)
            .map(|n| n.id.clone())
            .collect()
    }

    /// Shift every interval for a replace of `length` units at `offset` by
    /// text of `text_length` units, honoring stickiness, then restore the
    /// sort order and prefix maxima.
    pub(crate) fn accept_replace(
        &mut self,
        offset: usize,
        length: usize,
        text_length: usize,
        force_move_markers: bool,
    ) {
        for node in self.nodes.iter_mut() {
            node_accept_edit(node, offset, offset + length, text_length, force_move_markers);
        }
        // Stickiness can reorder nodes that met at the edit boundary.
        self.nodes.sort_by_key(|n| (n.start, n.end));
        self.rebuild_prefix_max_end_from(0);
    }
}
