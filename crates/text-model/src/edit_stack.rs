//! The undo/redo stack.
//!
//! Edits group into stack elements; an explicit
//! [`push_stack_element`](EditStack::push_stack_element) seals the open
//! group so the next edit starts a fresh one. Elements record the reverse
//! operation batches plus the cursor state before the group and the
//! alternative version ids on both sides, so undo/redo can report where the
//! cursor should go and which previously-seen version the buffer returned
//! to.
//!
//! The stack stores data only; the model applies the operations and swaps
//! each element's batches for their inverses as it moves elements between
//! the past and future sides.

use crate::buffer::ReverseEditOperation;
use crate::position::Selection;

/// One undo/redo group.
#[derive(Debug)]
pub(crate) struct StackElement {
    /// Alternative version id of the state this element leads back to.
    pub(crate) before_version_id: u64,
    /// Cursor state captured before the group's first edit.
    pub(crate) before_cursor_state: Option<Vec<Selection>>,
    /// Alternative version id of the state after the group.
    pub(crate) after_version_id: u64,
    /// Cursor state computed after the group's last edit.
    pub(crate) after_cursor_state: Option<Vec<Selection>>,
    /// One batch per recorded edit call. For a past element, applying the
    /// batches back-to-front restores the "before" state; for a future
    /// element, applying front-to-back replays the group.
    pub(crate) batches: Vec<Vec<ReverseEditOperation>>,
}

/// Past and future stacks plus the open-group marker.
pub(crate) struct EditStack {
    past: Vec<StackElement>,
    future: Vec<StackElement>,
    open: bool,
}

impl EditStack {
    pub(crate) fn new() -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            open: false,
        }
    }

    /// Seal the open group. Duplicate calls are ignored.
    pub(crate) fn push_stack_element(&mut self) {
        self.open = false;
    }

    /// Record one applied edit batch. Opens a new group when none is open,
    /// and always clears the redo side.
    pub(crate) fn push_edit_batch(
        &mut self,
        before_version_id: u64,
        before_cursor_state: Option<Vec<Selection>>,
        reverse_batch: Vec<ReverseEditOperation>,
        after_version_id: u64,
        after_cursor_state: Option<Vec<Selection>>,
    ) {
        self.future.clear();
        if !self.open {
            self.past.push(StackElement {
                before_version_id,
                before_cursor_state,
                after_version_id,
                after_cursor_state: None,
                batches: Vec::new(),
            });
            self.open = true;
        }
        if let Some(element) = self.past.last_mut() {
            element.batches.push(reverse_batch);
            element.after_version_id = after_version_id;
            element.after_cursor_state = after_cursor_state;
        }
    }

    /// Take the top past element for undoing; `None` on an empty stack.
    pub(crate) fn pop_for_undo(&mut self) -> Option<StackElement> {
        self.open = false;
        self.past.pop()
    }

    /// Park an undone element (batches replaced by their inverses) on the
    /// future side.
    pub(crate) fn push_to_future(&mut self, element: StackElement) {
        self.future.push(element);
    }

    /// Take the top future element for redoing; `None` when there is
    /// nothing to redo.
    pub(crate) fn pop_for_redo(&mut self) -> Option<StackElement> {
        self.open = false;
        self.future.pop()
    }

    /// Park a redone element (batches replaced by their inverses) back on
    /// the past side, sealed.
    pub(crate) fn push_to_past(&mut self, element: StackElement) {
        self.past.push(element);
        self.open = false;
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Drop everything (whole-buffer replacement).
    pub(crate) fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Range;

    fn batch(text: &str) -> Vec<ReverseEditOperation> {
        vec![ReverseEditOperation {
            range: Range::new(1, 1, 1, 1),
            text: text.to_string(),
        }]
    }

    #[test]
    fn test_groups_accumulate_until_sealed() {
        let mut stack = EditStack::new();
        stack.push_edit_batch(1, None, batch("a"), 2, None);
        stack.push_edit_batch(2, None, batch("b"), 3, None);
        stack.push_stack_element();
        stack.push_stack_element(); // duplicate seal is a no-op
        stack.push_edit_batch(3, None, batch("c"), 4, None);

        let top = stack.pop_for_undo().unwrap();
        assert_eq!(top.batches.len(), 1);
        assert_eq!(top.before_version_id, 3);
        assert_eq!(top.after_version_id, 4);

        let bottom = stack.pop_for_undo().unwrap();
        assert_eq!(bottom.batches.len(), 2);
        assert_eq!(bottom.before_version_id, 1);
        assert_eq!(bottom.after_version_id, 3);

        assert!(stack.pop_for_undo().is_none());
    }

    #[test]
    fn test_new_edit_clears_future() {
        let mut stack = EditStack::new();
        stack.push_edit_batch(1, None, batch("a"), 2, None);
        let element = stack.pop_for_undo().unwrap();
        stack.push_to_future(element);
        assert!(stack.can_redo());

        stack.push_edit_batch(1, None, batch("b"), 3, None);
        assert!(!stack.can_redo());
        assert!(stack.can_undo());
    }
}
