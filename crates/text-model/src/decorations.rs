//! Decoration options and the two-tree decoration tracker.
//!
//! Every decoration lives in exactly one of two interval trees: one for
//! decorations that project a mark onto the overview ruler, one for the
//! rest. Queries that only feed the ruler skip the larger plain tree
//! entirely. Option bundles are immutable and carry an interned static id,
//! so sharing a handle across thousands of decorations sanitizes class
//! names once.

use crate::buffer::TextBuffer;
use crate::intervals::{IntervalNode, IntervalTree, TrackedRangeStickiness};
use crate::position::Range;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static LAST_STATIC_ID: AtomicU64 = AtomicU64::new(0);

/// Class names that mark validation squiggles; these can be filtered out of
/// queries via the `filter_out_validation` flag.
const VALIDATION_CLASS_NAMES: [&str; 4] = [
    "squiggly-error",
    "squiggly-warning",
    "squiggly-info",
    "squiggly-hint",
];

/// Replace every character outside `[A-Za-z0-9-]` with a space.
fn sanitize_class_name(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { ' ' })
        .collect()
}

/// The overview ruler lane a decoration projects into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverviewRulerLane {
    /// Left third of the ruler.
    Left,
    /// Center third.
    Center,
    /// Right third.
    Right,
    /// The full width.
    Full,
}

/// Overview ruler projection of a decoration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewRulerOptions {
    /// Mark color (light themes).
    pub color: String,
    /// Mark color for dark themes, when different.
    pub dark_color: Option<String>,
    /// The lane to render into.
    pub position: OverviewRulerLane,
}

/// Immutable, interned decoration options.
///
/// Build through [`ModelDecorationOptions::builder`]; construction
/// sanitizes all class names and assigns a process-unique static id. Share
/// the resulting handle (`Arc`) to skip re-sanitization.
#[derive(Debug)]
pub struct ModelDecorationOptions {
    static_id: u64,
    /// How the decoration's edges react to insertions at them.
    pub stickiness: TrackedRangeStickiness,
    /// CSS class applied to the decorated text, sanitized.
    pub class_name: Option<String>,
    /// CSS class applied inline within the text, sanitized.
    pub inline_class_name: Option<String>,
    /// CSS class applied to the glyph margin, sanitized.
    pub glyph_margin_class_name: Option<String>,
    /// Markdown shown on hover.
    pub hover_message: Option<String>,
    /// Style the whole line rather than the exact range.
    pub is_whole_line: bool,
    /// Keep rendering the decoration when its range collapses.
    pub show_if_collapsed: bool,
    /// Overview ruler projection; its presence decides which tree holds the
    /// decoration.
    pub overview_ruler: Option<OverviewRulerOptions>,
    is_for_validation: bool,
}

impl ModelDecorationOptions {
    /// Start building an options bundle.
    pub fn builder() -> ModelDecorationOptionsBuilder {
        ModelDecorationOptionsBuilder::default()
    }

    /// The interned id assigned at construction.
    pub fn static_id(&self) -> u64 {
        self.static_id
    }

    /// Whether this bundle marks a validation squiggle.
    pub fn is_for_validation(&self) -> bool {
        self.is_for_validation
    }

    /// Whether decorations with these options live in the ruler tree.
    pub fn is_in_overview_ruler(&self) -> bool {
        self.overview_ruler.is_some()
    }
}

/// Builder for [`ModelDecorationOptions`].
#[derive(Debug, Default)]
pub struct ModelDecorationOptionsBuilder {
    stickiness: TrackedRangeStickiness,
    class_name: Option<String>,
    inline_class_name: Option<String>,
    glyph_margin_class_name: Option<String>,
    hover_message: Option<String>,
    is_whole_line: bool,
    show_if_collapsed: bool,
    overview_ruler: Option<OverviewRulerOptions>,
}

impl ModelDecorationOptionsBuilder {
    /// Set the stickiness policy.
    pub fn stickiness(mut self, stickiness: TrackedRangeStickiness) -> Self {
        self.stickiness = stickiness;
        self
    }

    /// Set the main class name (sanitized at build).
    pub fn class_name(mut self, value: impl Into<String>) -> Self {
        self.class_name = Some(value.into());
        self
    }

    /// Set the inline class name (sanitized at build).
    pub fn inline_class_name(mut self, value: impl Into<String>) -> Self {
        self.inline_class_name = Some(value.into());
        self
    }

    /// Set the glyph margin class name (sanitized at build).
    pub fn glyph_margin_class_name(mut self, value: impl Into<String>) -> Self {
        self.glyph_margin_class_name = Some(value.into());
        self
    }

    /// Set the hover markdown.
    pub fn hover_message(mut self, value: impl Into<String>) -> Self {
        self.hover_message = Some(value.into());
        self
    }

    /// Style the whole line.
    pub fn whole_line(mut self, value: bool) -> Self {
        self.is_whole_line = value;
        self
    }

    /// Keep rendering when collapsed.
    pub fn show_if_collapsed(mut self, value: bool) -> Self {
        self.show_if_collapsed = value;
        self
    }

    /// Project onto the overview ruler.
    pub fn overview_ruler(mut self, value: OverviewRulerOptions) -> Self {
        self.overview_ruler = Some(value);
        self
    }

    /// Sanitize and intern the bundle.
    pub fn build(self) -> ModelDecorationOptions {
        let class_name = self.class_name.map(|s| sanitize_class_name(&s));
        let is_for_validation = class_name
            .as_deref()
            .is_some_and(|c| VALIDATION_CLASS_NAMES.contains(&c));
        ModelDecorationOptions {
            static_id: LAST_STATIC_ID.fetch_add(1, Ordering::Relaxed) + 1,
            stickiness: self.stickiness,
            class_name,
            inline_class_name: self.inline_class_name.map(|s| sanitize_class_name(&s)),
            glyph_margin_class_name: self
                .glyph_margin_class_name
                .map(|s| sanitize_class_name(&s)),
            hover_message: self.hover_message,
            is_whole_line: self.is_whole_line,
            show_if_collapsed: self.show_if_collapsed,
            overview_ruler: self.overview_ruler,
            is_for_validation,
        }
    }

    /// Sanitize, intern and wrap in a shared handle.
    pub fn build_arc(self) -> Arc<ModelDecorationOptions> {
        Arc::new(self.build())
    }
}

/// A decoration as returned from queries: id, owner, resolved range and the
/// shared options handle.
#[derive(Debug, Clone)]
pub struct ModelDecoration {
    /// The decoration's id (`"{instance_letter};{counter}"`).
    pub id: String,
    /// Owner id; 0 means unowned.
    pub owner_id: usize,
    /// The decoration's current range.
    pub range: Range,
    /// The options handle.
    pub options: Arc<ModelDecorationOptions>,
}

/// Input to `delta_decorations`: the desired range and options.
#[derive(Debug, Clone)]
pub struct ModelDeltaDecoration {
    /// Desired range (validated relaxed: it may anchor inside a surrogate
    /// pair).
    pub range: Range,
    /// Options handle.
    pub options: Arc<ModelDecorationOptions>,
}

impl ModelDeltaDecoration {
    /// Convenience constructor.
    pub fn new(range: Range, options: Arc<ModelDecorationOptions>) -> Self {
        Self { range, options }
    }
}

/// Rehydrate a node's cached line/column range against `version_id`.
pub(crate) fn resolve_node_range(
    node: &mut IntervalNode,
    buffer: &TextBuffer,
    version_id: u64,
) -> Range {
    if node.cached_version_id == version_id {
        if let Some(range) = node.cached_range {
            return range;
        }
    }
    let range = buffer.range_at(node.start, node.end - node.start);
    node.cached_range = Some(range);
    node.cached_version_id = version_id;
    range
}

/// The tracker: id allocation plus the two interval trees.
pub(crate) struct DecorationsTracker {
    instance_letter: char,
    last_decoration_id: u64,
    /// id → node lives in the ruler tree.
    index: HashMap<String, bool>,
    plain: IntervalTree,
    ruler: IntervalTree,
}

pub(crate) struct DecorationOffsets {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) options: Arc<ModelDecorationOptions>,
}

impl DecorationsTracker {
    pub(crate) fn new(instance_letter: char) -> Self {
        Self {
            instance_letter,
            last_decoration_id: 0,
            index: HashMap::new(),
            plain: IntervalTree::new(),
            ruler: IntervalTree::new(),
        }
    }

    fn next_id(&mut self) -> String {
        self.last_decoration_id += 1;
        format!("{};{}", self.instance_letter, self.last_decoration_id)
    }

    fn insert_node(&mut self, node: IntervalNode) {
        let in_ruler = node.options.is_in_overview_ruler();
        self.index.insert(node.id.clone(), in_ruler);
        if in_ruler {
            self.ruler.insert(node);
        } else {
            self.plain.insert(node);
        }
    }

    fn take_node(&mut self, id: &str) -> Option<IntervalNode> {
        let in_ruler = self.index.remove(id)?;
        let tree = if in_ruler { &mut self.ruler } else { &mut self.plain };
        let node = tree.remove(id);
        debug_assert!(node.is_some(), "index and trees out of sync");
        node
    }

    pub(crate) fn get_node_mut(&mut self, id: &str) -> Option<&mut IntervalNode> {
        let in_ruler = *self.index.get(id)?;
        let tree = if in_ruler { &mut self.ruler } else { &mut self.plain };
        tree.get_mut(id)
    }

    /// Insert a fresh decoration, returning its id.
    pub(crate) fn insert(&mut self, owner_id: usize, decoration: DecorationOffsets) -> String {
        let id = self.next_id();
        self.insert_node(IntervalNode::new(
            id.clone(),
            owner_id,
            decoration.start,
            decoration.end,
            decoration.options,
        ));
        id
    }

    /// Remove by id; unknown ids are ignored. Returns whether anything was
    /// removed.
    pub(crate) fn remove(&mut self, id: &str) -> bool {
        self.take_node(id).is_some()
    }

    /// Re-anchor an existing decoration; unknown ids are ignored.
    pub(crate) fn change_range(&mut self, id: &str, start: usize, end: usize) -> bool {
        match self.take_node(id) {
            Some(mut node) => {
                node.start = start;
                node.end = end;
                node.cached_range = None;
                node.cached_version_id = 0;
                self.insert_node(node);
                true
            }
            None => false,
        }
    }

    /// Swap an existing decoration's options, migrating between trees when
    /// the overview-ruler membership flips; unknown ids are ignored.
    pub(crate) fn change_options(
        &mut self,
        id: &str,
        options: Arc<ModelDecorationOptions>,
    ) -> bool {
        match self.take_node(id) {
            Some(mut node) => {
                node.options = options;
                self.insert_node(node);
                true
            }
            None => false,
        }
    }

    /// The batch primitive: pair `old_ids` and `new` by index, reusing ids
    /// where both sides are present; extras on either side become pure
    /// deletes or inserts. Returns the ids of the new decorations.
    pub(crate) fn delta(
        &mut self,
        owner_id: usize,
        old_ids: &[String],
        new: Vec<DecorationOffsets>,
    ) -> Vec<String> {
        let new_len = new.len();
        let mut result = Vec::with_capacity(new_len);
        let mut new_iter = new.into_iter();

        let count = old_ids.len().max(new_len);
        for i in 0..count {
            let old_id = old_ids.get(i);
            let decoration = new_iter.next();
            match (old_id, decoration) {
                (Some(old_id), Some(decoration)) => {
                    // Reuse the node identity (and id) when the old id is
                    // alive; otherwise this degenerates to an insert.
                    if let Some(mut node) = self.take_node(old_id) {
                        node.owner_id = owner_id;
                        node.start = decoration.start;
                        node.end = decoration.end;
                        node.options = decoration.options;
                        node.cached_range = None;
                        node.cached_version_id = 0;
                        result.push(node.id.clone());
                        self.insert_node(node);
                    } else {
                        result.push(self.insert(owner_id, decoration));
                    }
                }
                (Some(old_id), None) => {
                    self.remove(old_id);
                }
                (None, Some(decoration)) => {
                    result.push(self.insert(owner_id, decoration));
                }
                (None, None) => unreachable!(),
            }
        }
        result
    }

    /// Delete every decoration owned by `owner_id`.
    pub(crate) fn remove_all_with_owner(&mut self, owner_id: usize) {
        for id in self.plain.collect_nodes_from_owner(owner_id) {
            self.remove(&id);
        }
        for id in self.ruler.collect_nodes_from_owner(owner_id) {
            self.remove(&id);
        }
    }

    /// Overlap query. `overview_ruler_only` restricts to the ruler tree.
    pub(crate) fn search_interval(
        &mut self,
        start: usize,
        end: usize,
        filter_owner_id: usize,
        filter_out_validation: bool,
        overview_ruler_only: bool,
    ) -> Vec<&mut IntervalNode> {
        let mut result = if overview_ruler_only {
            Vec::new()
        } else {
            self.plain
                .interval_search(start, end, filter_owner_id, filter_out_validation)
        };
        result.extend(
            self.ruler
                .interval_search(start, end, filter_owner_id, filter_out_validation),
        );
        result
    }

    /// Full scan of both trees.
    pub(crate) fn search_all(
        &mut self,
        filter_owner_id: usize,
        filter_out_validation: bool,
    ) -> Vec<&mut IntervalNode> {
        let mut result = self.plain.search(filter_owner_id, filter_out_validation);
        result.extend(self.ruler.search(filter_owner_id, filter_out_validation));
        result
    }

    /// Full scan of the ruler tree only.
    pub(crate) fn search_overview_ruler(
        &mut self,
        filter_owner_id: usize,
    ) -> Vec<&mut IntervalNode> {
        self.ruler.search(filter_owner_id, false)
    }

    /// Feed one content delta to both trees.
    pub(crate) fn accept_replace(
        &mut self,
        offset: usize,
        length: usize,
        text_length: usize,
        force_move_markers: bool,
    ) {
        self.plain
            .accept_replace(offset, length, text_length, force_move_markers);
        self.ruler
            .accept_replace(offset, length, text_length, force_move_markers);
    }

    /// Drop every decoration (used by whole-buffer replacement).
    pub(crate) fn clear(&mut self) {
        self.index.clear();
        self.plain.clear();
        self.ruler.clear();
    }

    /// Iterate all nodes mutably (EOL re-anchoring).
    pub(crate) fn all_nodes_mut(&mut self) -> Vec<&mut IntervalNode> {
        let mut result = self.plain.search(0, false);
        result.extend(self.ruler.search(0, false));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_options() -> Arc<ModelDecorationOptions> {
        ModelDecorationOptions::builder().build_arc()
    }

    fn ruler_options() -> Arc<ModelDecorationOptions> {
        ModelDecorationOptions::builder()
            .overview_ruler(OverviewRulerOptions {
                color: "rgba(255,0,0,0.5)".to_string(),
                dark_color: None,
                position: OverviewRulerLane::Right,
            })
            .build_arc()
    }

    fn offsets(start: usize, end: usize, options: Arc<ModelDecorationOptions>) -> DecorationOffsets {
        DecorationOffsets {
            start,
            end,
            options,
        }
    }

    #[test]
    fn test_class_name_sanitization() {
        let options = ModelDecorationOptions::builder()
            .class_name("my class!{weird}")
            .build();
        assert_eq!(options.class_name.as_deref(), Some("my class  weird "));
    }

    #[test]
    fn test_validation_flag_from_class_name() {
        let options = ModelDecorationOptions::builder()
            .class_name("squiggly-error")
            .build();
        assert!(options.is_for_validation());
        assert!(!ModelDecorationOptions::builder().build().is_for_validation());
    }

    #[test]
    fn test_static_ids_are_unique() {
        let a = ModelDecorationOptions::builder().build();
        let b = ModelDecorationOptions::builder().build();
        assert_ne!(a.static_id(), b.static_id());
    }

    #[test]
    fn test_insert_routes_by_ruler_membership() {
        let mut tracker = DecorationsTracker::new('a');
        let plain_id = tracker.insert(0, offsets(0, 5, plain_options()));
        let ruler_id = tracker.insert(0, offsets(2, 8, ruler_options()));

        assert_eq!(tracker.search_overview_ruler(0).len(), 1);
        assert_eq!(tracker.search_interval(0, 10, 0, false, false).len(), 2);
        assert!(plain_id.starts_with("a;"));
        assert_ne!(plain_id, ruler_id);
    }

    #[test]
    fn test_delta_reuses_ids_in_pairs() {
        let mut tracker = DecorationsTracker::new('a');
        let id1 = tracker.insert(0, offsets(0, 3, plain_options()));
        let id2 = tracker.insert(0, offsets(5, 9, plain_options()));

        let new_ids = tracker.delta(
            0,
            &[id1.clone(), id2.clone()],
            vec![offsets(1, 2, plain_options()), offsets(6, 7, plain_options())],
        );
        assert_eq!(new_ids, vec![id1, id2]);
        assert_eq!(tracker.search_all(0, false).len(), 2);
    }

    #[test]
    fn test_delta_handles_uneven_sides() {
        let mut tracker = DecorationsTracker::new('a');
        let id1 = tracker.insert(0, offsets(0, 3, plain_options()));

        // More new than old: one reuse, one insert.
        let ids = tracker.delta(
            0,
            &[id1.clone()],
            vec![offsets(1, 2, plain_options()), offsets(4, 6, plain_options())],
        );
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], id1);
        assert_eq!(tracker.search_all(0, false).len(), 2);

        // More old than new: both removed.
        let ids = tracker.delta(0, &ids, Vec::new());
        assert!(ids.is_empty());
        assert_eq!(tracker.search_all(0, false).len(), 0);
    }

    #[test]
    fn test_options_change_migrates_between_trees() {
        let mut tracker = DecorationsTracker::new('a');
        let id = tracker.insert(0, offsets(0, 4, plain_options()));
        assert!(tracker.search_overview_ruler(0).is_empty());

        assert!(tracker.change_options(&id, ruler_options()));
        assert_eq!(tracker.search_overview_ruler(0).len(), 1);
        assert!(tracker
            .search_interval(0, 10, 0, false, false)
            .iter()
            .any(|n| n.id == id));
    }

    #[test]
    fn test_remove_is_idempotent_for_unknown_ids() {
        let mut tracker = DecorationsTracker::new('a');
        assert!(!tracker.remove("a;999"));
        assert!(!tracker.change_range("a;999", 0, 1));
    }

    #[test]
    fn test_remove_all_with_owner() {
        let mut tracker = DecorationsTracker::new('a');
        tracker.insert(3, offsets(0, 1, plain_options()));
        tracker.insert(3, offsets(2, 3, ruler_options()));
        tracker.insert(4, offsets(4, 5, plain_options()));

        tracker.remove_all_with_owner(3);
        assert_eq!(tracker.search_all(0, false).len(), 1);
        assert_eq!(tracker.search_all(4, false).len(), 1);
    }
}
