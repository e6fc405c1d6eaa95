//! Event payloads and deferred emission.
//!
//! Mutating operations can produce several events while a logical batch is
//! open. Observers must never see a half-applied batch, so the emitters here
//! support nested deferred scopes: content-change events queue up and flush
//! FIFO when the outermost scope closes, while decoration-change
//! notifications collapse to at most one event per scope.

use crate::line_ending::LineEnding;
use crate::position::Range;

/// A line-level change to the buffer, expressed against a client mirror that
/// applies the changes in the order received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawContentChange {
    /// The whole buffer was replaced; the mirror must re-read everything.
    Flush,
    /// One line's content changed.
    LineChanged {
        /// 1-based line number.
        line: usize,
        /// The line's new content.
        content: String,
    },
    /// A run of lines was deleted. Line numbers refer to the pre-change
    /// state of the mirror.
    LinesDeleted {
        /// First deleted line.
        from_line: usize,
        /// Last deleted line (inclusive).
        to_line: usize,
    },
    /// A run of lines was inserted. Line numbers refer to the post-change
    /// state of the mirror.
    LinesInserted {
        /// First inserted line.
        from_line: usize,
        /// Last inserted line (inclusive).
        to_line: usize,
        /// Contents of the inserted lines.
        lines: Vec<String>,
    },
    /// The buffer's line ending changed; positions are unaffected.
    EolChanged,
}

/// One atomic content delta: the replaced range and the replacement text.
///
/// These are the deltas fed to decoration and token bookkeeping, and the
/// payload of [`ContentChangedEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    /// The replaced range, valid in the pre-change document.
    pub range: Range,
    /// Offset of `range.start`, in UTF-16 code units.
    pub range_offset: usize,
    /// Length of the replaced range, in UTF-16 code units.
    pub range_length: usize,
    /// The inserted text (empty for pure deletions).
    pub text: String,
    /// Whether decorations touching the edit edges are pushed outward.
    pub force_move_markers: bool,
}

impl ContentChange {
    /// Length of the inserted text in UTF-16 code units.
    pub fn text_length(&self) -> usize {
        self.text.encode_utf16().count()
    }

    /// The inserted text split into lines (any newline convention).
    pub fn inserted_lines(&self) -> Vec<String> {
        crate::buffer::split_text_into_lines(&self.text)
    }
}

/// Event payload carrying the line-level changes of one batch.
#[derive(Debug, Clone)]
pub struct RawContentChangedEvent {
    /// The changes, in mirror-replay order.
    pub changes: Vec<RawContentChange>,
    /// The model version after the batch.
    pub version_id: u64,
    /// Set while an undo is being applied.
    pub is_undoing: bool,
    /// Set while a redo is being applied.
    pub is_redoing: bool,
}

impl RawContentChangedEvent {
    /// Returns `true` if this batch replaced the whole buffer.
    pub fn is_flush(&self) -> bool {
        self.changes
            .iter()
            .any(|c| matches!(c, RawContentChange::Flush))
    }
}

/// Event payload carrying the atomic changes of one batch.
#[derive(Debug, Clone)]
pub struct ContentChangedEvent {
    /// Atomic deltas, in the order the caller supplied the edits.
    pub changes: Vec<ContentChange>,
    /// Set when this batch changed the buffer's line ending.
    pub eol: Option<LineEnding>,
    /// The model version after the batch.
    pub version_id: u64,
    /// Set while an undo is being applied.
    pub is_undoing: bool,
    /// Set while a redo is being applied.
    pub is_redoing: bool,
    /// Set when the whole buffer was replaced.
    pub is_flush: bool,
}

/// The single event a content batch emits internally; public observers see
/// its two halves through separate subscriptions.
#[derive(Debug, Clone)]
pub(crate) struct InternalContentChangedEvent {
    pub(crate) raw: RawContentChangedEvent,
    pub(crate) content: ContentChangedEvent,
}

/// An inclusive range of lines whose tokens changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokensChangedRange {
    /// First affected line.
    pub from_line: usize,
    /// Last affected line (inclusive).
    pub to_line: usize,
}

/// Tokens-changed event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokensChangedEvent {
    /// The changed line ranges, ascending and non-overlapping.
    pub ranges: Vec<TokensChangedRange>,
}

/// Language-changed event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageChangedEvent {
    /// The previous language name.
    pub old_language: String,
    /// The new language name.
    pub new_language: String,
}

/// Options-changed event payload; flags name the options that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionsChangedEvent {
    /// `tab_size` changed.
    pub tab_size: bool,
    /// `insert_spaces` changed.
    pub insert_spaces: bool,
    /// `trim_auto_whitespace` changed.
    pub trim_auto_whitespace: bool,
}

/// Decorations-changed event payload. Intentionally empty: observers
/// re-query the decorations they care about.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecorationsChangedEvent;

pub(crate) type Listener<E> = Box<dyn FnMut(&E)>;

/// An emitter that queues events while a deferred scope is open and drains
/// them FIFO when the outermost scope closes.
pub(crate) struct DeferredEventEmitter<E> {
    listeners: Vec<Listener<E>>,
    deferred_count: usize,
    queue: Vec<E>,
}

impl<E> DeferredEventEmitter<E> {
    pub(crate) fn new() -> Self {
        Self {
            listeners: Vec::new(),
            deferred_count: 0,
            queue: Vec::new(),
        }
    }

    pub(crate) fn subscribe(&mut self, listener: Listener<E>) {
        self.listeners.push(listener);
    }

    pub(crate) fn begin_deferred_emit(&mut self) {
        self.deferred_count += 1;
    }

    pub(crate) fn end_deferred_emit(&mut self) {
        debug_assert!(self.deferred_count > 0);
        self.deferred_count -= 1;
        if self.deferred_count == 0 {
            for event in std::mem::take(&mut self.queue) {
                Self::deliver(&mut self.listeners, &event);
            }
        }
    }

    pub(crate) fn fire(&mut self, event: E) {
        if self.deferred_count > 0 {
            self.queue.push(event);
        } else {
            Self::deliver(&mut self.listeners, &event);
        }
    }

    fn deliver(listeners: &mut [Listener<E>], event: &E) {
        for listener in listeners.iter_mut() {
            listener(event);
        }
    }
}

/// An emitter that collapses any number of fires inside a deferred scope
/// into a single empty-payload event on scope exit.
pub(crate) struct CoalescingEventEmitter {
    listeners: Vec<Listener<DecorationsChangedEvent>>,
    deferred_count: usize,
    should_fire: bool,
}

impl CoalescingEventEmitter {
    pub(crate) fn new() -> Self {
        Self {
            listeners: Vec::new(),
            deferred_count: 0,
            should_fire: false,
        }
    }

    pub(crate) fn subscribe(&mut self, listener: Listener<DecorationsChangedEvent>) {
        self.listeners.push(listener);
    }

    pub(crate) fn begin_deferred_emit(&mut self) {
        self.deferred_count += 1;
    }

    pub(crate) fn end_deferred_emit(&mut self) {
        debug_assert!(self.deferred_count > 0);
        self.deferred_count -= 1;
        if self.deferred_count == 0 && self.should_fire {
            self.should_fire = false;
            let event = DecorationsChangedEvent;
            for listener in self.listeners.iter_mut() {
                listener(&event);
            }
        }
    }

    pub(crate) fn fire(&mut self) {
        if self.deferred_count > 0 {
            self.should_fire = true;
        } else {
            let event = DecorationsChangedEvent;
            for listener in self.listeners.iter_mut() {
                listener(&event);
            }
        }
    }
}

/// An emitter with no deferral: events deliver as they fire.
pub(crate) struct EventEmitter<E> {
    listeners: Vec<Listener<E>>,
}

impl<E> EventEmitter<E> {
    pub(crate) fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub(crate) fn subscribe(&mut self, listener: Listener<E>) {
        self.listeners.push(listener);
    }

    pub(crate) fn fire(&mut self, event: &E) {
        for listener in self.listeners.iter_mut() {
            listener(event);
        }
    }
}
