//! The text model facade.
//!
//! `TextModel` owns the buffer, the decoration trees, the token store and
//! the undo stack, and sequences every mutation the same way: validate
//! ranges, apply the buffer edit, patch the derived indexes per atomic
//! change, bump the version, and emit events through deferred scopes so
//! observers never see a half-applied batch.

use crate::brackets::{self, FoundBracket, RichBrackets};
use crate::buffer::{
    utf16_offset_splits_pair, utf16_offset_to_byte, EditOperation, ReverseEditOperation,
    TextBuffer,
};
use crate::decorations::{
    resolve_node_range, DecorationOffsets, DecorationsTracker, ModelDecoration,
    ModelDecorationOptions, ModelDeltaDecoration,
};
use crate::edit_stack::{EditStack, StackElement};
use crate::error::TextModelError;
use crate::events::{
    ContentChangedEvent, ContentChange, CoalescingEventEmitter, DecorationsChangedEvent,
    DeferredEventEmitter, EventEmitter, InternalContentChangedEvent, LanguageChangedEvent,
    OptionsChangedEvent, RawContentChange, RawContentChangedEvent, TokensChangedEvent,
    TokensChangedRange,
};
use crate::indent;
use crate::line_ending::{DefaultLineEnding, EndOfLinePreference, LineEnding};
use crate::position::{Position, Range, Selection};
use crate::search::{self, FindMatch, DEFAULT_MATCHES_LIMIT};
use crate::tokens::{
    LanguageId, LanguageIdentifier, LanguageRegistry, LineTokens, Tokenizer, TokensChangedEventBuilder,
    TokensStore, BACKGROUND_TOKENIZATION_BUDGET_MS, TOKENIZATION_WARM_UP_LINES,
};
use crate::words::{self, WordAtPosition};
use regex::Regex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

static NEXT_MODEL_ID: AtomicUsize = AtomicUsize::new(0);

/// Tokenization is permanently disabled above this many UTF-16 code units.
const TOKENIZATION_LENGTH_LIMIT: usize = 20 * 1024 * 1024;
/// Tokenization is permanently disabled above this many lines.
const TOKENIZATION_LINE_LIMIT: usize = 300_000;
/// Models above this many code units are not synced to workers.
const SYNC_LENGTH_LIMIT: usize = 50 * 1024 * 1024;
/// Lines at or above this length count as "long" for the dominance check.
const LONG_LINE_BOUNDARY: usize = 10_000;

fn instance_letter(instance: usize) -> char {
    let index = (instance % 52) as u8;
    if index < 26 {
        (b'a' + index) as char
    } else {
        (b'A' + index - 26) as char
    }
}

/// The user-visible model options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextModelOptions {
    /// Width of one tab stop in columns.
    pub tab_size: usize,
    /// Whether edits should prefer spaces over tabs (carried for hosts; the
    /// model itself never synthesizes indentation).
    pub insert_spaces: bool,
    /// Whether auto-inserted trailing whitespace is trimmed on the next
    /// unrelated edit.
    pub trim_auto_whitespace: bool,
}

impl Default for TextModelOptions {
    fn default() -> Self {
        Self {
            tab_size: 4,
            insert_spaces: true,
            trim_auto_whitespace: true,
        }
    }
}

/// A partial options update; `None` fields stay unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextModelOptionsUpdate {
    /// New tab size.
    pub tab_size: Option<usize>,
    /// New insert-spaces flag.
    pub insert_spaces: Option<bool>,
    /// New trim-auto-whitespace flag.
    pub trim_auto_whitespace: Option<bool>,
}

/// Options fixed at model construction.
#[derive(Debug, Clone)]
pub struct TextModelCreationOptions {
    /// Initial user options.
    pub options: TextModelOptions,
    /// Line ending adopted when the source text has none.
    pub default_line_ending: DefaultLineEnding,
    /// Model URI; defaults to `inmemory://model/{N}`.
    pub uri: Option<String>,
}

impl Default for TextModelCreationOptions {
    fn default() -> Self {
        Self {
            options: TextModelOptions::default(),
            default_line_ending: DefaultLineEnding::Lf,
            uri: None,
        }
    }
}

struct AppliedEdits {
    reverse_edits: Vec<ReverseEditOperation>,
    trim_lines: Vec<usize>,
}

/// An editable text buffer with tracked decorations, incremental
/// tokenization, search and undo/redo.
pub struct TextModel {
    id: String,
    uri: String,
    buffer: TextBuffer,
    options: TextModelOptions,
    default_line_ending: DefaultLineEnding,

    registry: Arc<LanguageRegistry>,
    language: LanguageIdentifier,
    tokenizer: Option<Arc<dyn Tokenizer>>,
    rich_brackets: Option<RichBrackets>,
    default_word_pattern: Regex,

    version_id: u64,
    alternative_version_id: u64,

    decorations: DecorationsTracker,
    tokens_store: TokensStore,
    edit_stack: EditStack,
    trim_auto_whitespace_lines: Option<Vec<usize>>,

    content_emitter: DeferredEventEmitter<InternalContentChangedEvent>,
    decorations_emitter: CoalescingEventEmitter,
    tokens_emitter: EventEmitter<TokensChangedEvent>,
    language_emitter: EventEmitter<LanguageChangedEvent>,
    language_configuration_emitter: EventEmitter<()>,
    options_emitter: EventEmitter<OptionsChangedEvent>,
    will_dispose_emitter: EventEmitter<()>,

    attached_editor_count: usize,
    background_tokenization_scheduled: bool,

    is_undoing: bool,
    is_redoing: bool,
    is_disposing: bool,
    disposed: bool,

    is_too_large_for_sync: bool,
    is_dominated_by_long_lines: bool,
}

impl TextModel {
    /// Create a model over `text` in the given language (`None` for plain
    /// text).
    pub fn new(
        text: &str,
        language: Option<LanguageIdentifier>,
        registry: Arc<LanguageRegistry>,
        creation: TextModelCreationOptions,
    ) -> Self {
        let instance = NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed);
        let model_number = instance + 1;

        let buffer = TextBuffer::from_string(text, creation.default_line_ending);
        let language = language.unwrap_or(LanguageIdentifier {
            name: "plaintext".to_string(),
            id: LanguageId::PLAIN_TEXT,
        });
        let tokenizer = registry.tokenizer(language.id);
        let rich_brackets = registry
            .configuration(language.id)
            .and_then(RichBrackets::from_configuration);

        let tokenization_enabled = buffer.length() <= TOKENIZATION_LENGTH_LIMIT
            && buffer.line_count() <= TOKENIZATION_LINE_LIMIT;
        let is_too_large_for_sync = buffer.length() > SYNC_LENGTH_LIMIT;
        let is_dominated_by_long_lines = compute_long_line_dominance(&buffer);

        let tokens_store = TokensStore::new(buffer.line_count(), tokenization_enabled);

        Self {
            id: format!("$model{model_number}"),
            uri: creation
                .uri
                .unwrap_or_else(|| format!("inmemory://model/{model_number}")),
            buffer,
            options: creation.options,
            default_line_ending: creation.default_line_ending,
            registry,
            language,
            tokenizer,
            rich_brackets,
            default_word_pattern: text_model_lang::default_word_pattern(),
            version_id: 1,
            alternative_version_id: 1,
            decorations: DecorationsTracker::new(instance_letter(instance)),
            tokens_store,
            edit_stack: EditStack::new(),
            trim_auto_whitespace_lines: None,
            content_emitter: DeferredEventEmitter::new(),
            decorations_emitter: CoalescingEventEmitter::new(),
            tokens_emitter: EventEmitter::new(),
            language_emitter: EventEmitter::new(),
            language_configuration_emitter: EventEmitter::new(),
            options_emitter: EventEmitter::new(),
            will_dispose_emitter: EventEmitter::new(),
            attached_editor_count: 0,
            background_tokenization_scheduled: false,
            is_undoing: false,
            is_redoing: false,
            is_disposing: false,
            disposed: false,
            is_too_large_for_sync,
            is_dominated_by_long_lines,
        }
    }

    // ----- identity & lifecycle -------------------------------------------

    /// The stable opaque model id (`"$model{N}"`).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The model's URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Monotone content version.
    pub fn version_id(&self) -> u64 {
        self.version_id
    }

    /// Version that tracks undo/redo-reachable states: equal to
    /// [`version_id`](Self::version_id) after a forward edit, and reset to
    /// the originally produced version when undo/redo returns to an earlier
    /// state.
    pub fn alternative_version_id(&self) -> u64 {
        self.alternative_version_id
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Models above the sync limit are not mirrored to worker hosts.
    pub fn is_too_large_for_sync(&self) -> bool {
        self.is_too_large_for_sync
    }

    /// Whether most content sits on very long lines (hosts degrade
    /// features).
    pub fn is_dominated_by_long_lines(&self) -> bool {
        self.is_dominated_by_long_lines
    }

    /// Called by a host right before wiring the model to an editor.
    pub fn on_before_attached(&mut self) {
        self.attached_editor_count += 1;
        if self.attached_editor_count == 1 {
            self.warm_up_tokens();
        }
    }

    /// Called by a host right after unwiring the model from an editor.
    pub fn on_before_detached(&mut self) {
        self.attached_editor_count = self.attached_editor_count.saturating_sub(1);
        if self.attached_editor_count == 0 {
            self.background_tokenization_scheduled = false;
        }
    }

    /// Whether at least one editor is attached.
    pub fn is_attached_to_editor(&self) -> bool {
        self.attached_editor_count > 0
    }

    /// Release the model: fires the will-dispose event, drops queued work
    /// and marks every further public call as an error.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.is_disposing = true;
        self.will_dispose_emitter.fire(&());
        self.background_tokenization_scheduled = false;
        self.edit_stack.clear();
        self.decorations.clear();
        self.trim_auto_whitespace_lines = None;
        self.is_disposing = false;
        self.disposed = true;
    }

    /// Content equality with another model (lines and line ending).
    pub fn equals(&self, other: &TextModel) -> bool {
        self.buffer.equals(&other.buffer)
    }

    fn check_alive(&self) -> Result<(), TextModelError> {
        if self.disposed {
            Err(TextModelError::Disposed)
        } else {
            Ok(())
        }
    }

    fn check_line(&self, line: usize) -> Result<(), TextModelError> {
        if line < 1 || line > self.buffer.line_count() {
            Err(TextModelError::InvalidLineNumber {
                line,
                line_count: self.buffer.line_count(),
            })
        } else {
            Ok(())
        }
    }

    // ----- events ---------------------------------------------------------

    /// Subscribe to atomic content changes.
    pub fn on_did_change_content(
        &mut self,
        mut listener: impl FnMut(&ContentChangedEvent) + 'static,
    ) {
        self.content_emitter
            .subscribe(Box::new(move |e: &InternalContentChangedEvent| {
                listener(&e.content)
            }));
    }

    /// Subscribe to line-level (mirror replay) content changes.
    pub fn on_did_change_raw_content(
        &mut self,
        mut listener: impl FnMut(&RawContentChangedEvent) + 'static,
    ) {
        self.content_emitter
            .subscribe(Box::new(move |e: &InternalContentChangedEvent| {
                listener(&e.raw)
            }));
    }

    /// Subscribe to the coalesced decorations-changed notification.
    pub fn on_did_change_decorations(
        &mut self,
        listener: impl FnMut(&DecorationsChangedEvent) + 'static,
    ) {
        self.decorations_emitter.subscribe(Box::new(listener));
    }

    /// Subscribe to tokens-changed events.
    pub fn on_did_change_tokens(&mut self, listener: impl FnMut(&TokensChangedEvent) + 'static) {
        self.tokens_emitter.subscribe(Box::new(listener));
    }

    /// Subscribe to language changes.
    pub fn on_did_change_language(
        &mut self,
        listener: impl FnMut(&LanguageChangedEvent) + 'static,
    ) {
        self.language_emitter.subscribe(Box::new(listener));
    }

    /// Subscribe to language-configuration change notifications.
    pub fn on_did_change_language_configuration(&mut self, listener: impl FnMut(&()) + 'static) {
        self.language_configuration_emitter
            .subscribe(Box::new(listener));
    }

    /// Subscribe to options changes.
    pub fn on_did_change_options(
        &mut self,
        listener: impl FnMut(&OptionsChangedEvent) + 'static,
    ) {
        self.options_emitter.subscribe(Box::new(listener));
    }

    /// Subscribe to the will-dispose notification.
    pub fn on_will_dispose(&mut self, listener: impl FnMut(&()) + 'static) {
        self.will_dispose_emitter.subscribe(Box::new(listener));
    }

    fn begin_deferred_emit(&mut self) {
        self.content_emitter.begin_deferred_emit();
        self.decorations_emitter.begin_deferred_emit();
    }

    fn end_deferred_emit(&mut self) {
        self.content_emitter.end_deferred_emit();
        self.decorations_emitter.end_deferred_emit();
    }

    fn emit_content_event(&mut self, event: InternalContentChangedEvent) {
        if self.is_disposing {
            return;
        }
        self.content_emitter.fire(event);
    }

    fn emit_tokens_event(&mut self, builder: TokensChangedEventBuilder) {
        if self.is_disposing {
            return;
        }
        if let Some(event) = builder.build() {
            self.tokens_emitter.fire(&event);
        }
    }

    /// Notify observers that the language's configuration object changed in
    /// the registry (brackets, word pattern, off-side flag).
    pub fn notify_language_configuration_changed(&mut self) {
        self.rich_brackets = self
            .registry
            .configuration(self.language.id)
            .and_then(RichBrackets::from_configuration);
        self.language_configuration_emitter.fire(&());
    }

    // ----- options --------------------------------------------------------

    /// The current options.
    pub fn options(&self) -> TextModelOptions {
        self.options
    }

    /// Update options; unchanged values emit nothing.
    pub fn update_options(&mut self, update: TextModelOptionsUpdate) {
        let tab_size = update.tab_size.unwrap_or(self.options.tab_size);
        let insert_spaces = update.insert_spaces.unwrap_or(self.options.insert_spaces);
        let trim_auto_whitespace = update
            .trim_auto_whitespace
            .unwrap_or(self.options.trim_auto_whitespace);

        let event = OptionsChangedEvent {
            tab_size: tab_size != self.options.tab_size,
            insert_spaces: insert_spaces != self.options.insert_spaces,
            trim_auto_whitespace: trim_auto_whitespace != self.options.trim_auto_whitespace,
        };
        if !event.tab_size && !event.insert_spaces && !event.trim_auto_whitespace {
            return;
        }
        self.options = TextModelOptions {
            tab_size,
            insert_spaces,
            trim_auto_whitespace,
        };
        self.options_emitter.fire(&event);
    }

    // ----- content reads --------------------------------------------------

    /// The whole text.
    pub fn get_value(&self, preference: EndOfLinePreference, preserve_bom: bool) -> String {
        self.buffer.value(preference, preserve_bom)
    }

    /// The text of a range (validated).
    pub fn get_value_in_range(&self, range: Range, preference: EndOfLinePreference) -> String {
        self.buffer
            .value_in_range(self.validate_range(range), preference)
    }

    /// Total length in UTF-16 code units, counting line endings.
    pub fn get_value_length(&self) -> usize {
        self.buffer.length()
    }

    /// Number of lines.
    pub fn get_line_count(&self) -> usize {
        self.buffer.line_count()
    }

    /// Content of line `n` (1-based, exact).
    pub fn get_line_content(&self, n: usize) -> Result<&str, TextModelError> {
        self.check_alive()?;
        self.check_line(n)?;
        Ok(self.buffer.line_content(n))
    }

    /// All line contents.
    pub fn get_lines_content(&self) -> Vec<String> {
        (1..=self.buffer.line_count())
            .map(|n| self.buffer.line_content(n).to_string())
            .collect()
    }

    /// Length of line `n` in UTF-16 code units, without its line ending.
    pub fn get_line_length(&self, n: usize) -> Result<usize, TextModelError> {
        self.check_alive()?;
        self.check_line(n)?;
        Ok(self.buffer.line_length(n))
    }

    /// Always 1.
    pub fn get_line_min_column(&self, _n: usize) -> usize {
        1
    }

    /// One past the last column of line `n`.
    pub fn get_line_max_column(&self, n: usize) -> Result<usize, TextModelError> {
        Ok(self.get_line_length(n)? + 1)
    }

    /// Column of the first non-whitespace character of line `n`, or 0.
    pub fn get_line_first_non_whitespace_column(&self, n: usize) -> Result<usize, TextModelError> {
        self.check_alive()?;
        self.check_line(n)?;
        Ok(self.buffer.line_first_non_whitespace_column(n))
    }

    /// Column past the last non-whitespace character of line `n`, or 0.
    pub fn get_line_last_non_whitespace_column(&self, n: usize) -> Result<usize, TextModelError> {
        self.check_alive()?;
        self.check_line(n)?;
        Ok(self.buffer.line_last_non_whitespace_column(n))
    }

    /// Indent level of line `n` with tabs expanded; `-1` for blank lines.
    pub fn get_line_indent_level(&self, n: usize) -> Result<isize, TextModelError> {
        self.check_alive()?;
        self.check_line(n)?;
        Ok(indent::compute_indent_level(
            self.buffer.line_content(n),
            self.options.tab_size,
        ))
    }

    /// The buffer's line ending.
    pub fn line_ending(&self) -> LineEnding {
        self.buffer.line_ending()
    }

    /// Offset of a position (validated first).
    pub fn get_offset_at(&self, position: Position) -> usize {
        self.buffer.offset_at(self.validate_position(position))
    }

    /// Position of an offset (clamped).
    pub fn get_position_at(&self, offset: usize) -> Position {
        self.buffer.position_at(offset)
    }

    /// The range covering the whole buffer.
    pub fn get_full_model_range(&self) -> Range {
        self.buffer.full_range()
    }

    /// Walk `delta` code units from `position` (validated, clamped).
    pub fn modify_position(&self, position: Position, delta: isize) -> Position {
        let offset = self.get_offset_at(position) as isize + delta;
        self.get_position_at(offset.max(0) as usize)
    }

    // ----- validation -----------------------------------------------------

    /// Clamp `position` to the buffer and keep it off surrogate-pair
    /// interiors (moving back one unit when needed). Never fails.
    pub fn validate_position(&self, position: Position) -> Position {
        let mut validated = self.validate_position_relaxed(position);
        if validated.column > 1 {
            let line = self.buffer.line_content(validated.line);
            if utf16_offset_splits_pair(line, validated.column - 1) {
                validated.column -= 1;
            }
        }
        validated
    }

    fn validate_position_relaxed(&self, position: Position) -> Position {
        let line = position.line.clamp(1, self.buffer.line_count());
        let column = position.column.clamp(1, self.buffer.line_length(line) + 1);
        Position::new(line, column)
    }

    /// Clamp a range without surrogate adjustment (decoration anchoring).
    fn validate_range_relaxed(&self, range: Range) -> Range {
        let start = self.validate_position_relaxed(range.start);
        let end = self.validate_position_relaxed(range.end);
        if start == range.start && end == range.end {
            return range;
        }
        Range::from_positions(start, end)
    }

    /// Clamp a range and resolve surrogate-pair interiors: a split start
    /// moves left, a split end moves right, a split empty range moves left
    /// rather than expanding.
    pub fn validate_range(&self, range: Range) -> Range {
        let relaxed = self.validate_range_relaxed(range);
        let start = relaxed.start;
        let end = relaxed.end;

        let start_inside = start.column > 1
            && utf16_offset_splits_pair(self.buffer.line_content(start.line), start.column - 1);
        let end_inside = end.column > 1
            && utf16_offset_splits_pair(self.buffer.line_content(end.line), end.column - 1);

        if !start_inside && !end_inside {
            return relaxed;
        }
        if start == end {
            // Empty range inside a pair: shift left rather than expand.
            return Range::new(start.line, start.column - 1, end.line, end.column - 1);
        }
        let new_start = if start_inside {
            start.column - 1
        } else {
            start.column
        };
        let new_end = if end_inside { end.column + 1 } else { end.column };
        Range::new(start.line, new_start, end.line, new_end)
    }

    // ----- edit pipeline --------------------------------------------------

    fn increase_version(&mut self) {
        self.version_id += 1;
        self.alternative_version_id = self.version_id;
    }

    fn should_schedule_background_tokenization(&self) -> bool {
        self.attached_editor_count > 0
            && self.tokenizer.is_some()
            && self
                .tokens_store
                .has_lines_to_tokenize(self.buffer.line_count())
    }

    fn apply_edits_inner(
        &mut self,
        operations: Vec<EditOperation>,
        record_trim: bool,
    ) -> Result<AppliedEdits, TextModelError> {
        let operations: Vec<EditOperation> = operations
            .into_iter()
            .map(|op| EditOperation {
                range: self.validate_range(op.range),
                text: op.text,
                force_move_markers: op.force_move_markers,
            })
            .collect();

        let record = record_trim && self.options.trim_auto_whitespace;
        let result = self.buffer.apply_edits(operations, record)?;
        if result.changes.is_empty() {
            return Ok(AppliedEdits {
                reverse_edits: result.reverse_edits,
                trim_lines: Vec::new(),
            });
        }

        // Patch derived indexes back-to-front: change offsets are pre-edit
        // coordinates, which stay valid only while later regions are
        // processed before earlier ones.
        let mut patch_order: Vec<usize> = (0..result.changes.len()).collect();
        patch_order.sort_by(|&a, &b| {
            result.changes[b]
                .range_offset
                .cmp(&result.changes[a].range_offset)
        });
        for index in patch_order {
            let change = &result.changes[index];
            let inserted_line_count = change.inserted_lines().len();
            self.tokens_store.apply_edit(
                change.range.start.line,
                change.range.end.line,
                inserted_line_count,
            );
            self.decorations_emitter.fire();
            self.decorations.accept_replace(
                change.range_offset,
                change.range_length,
                change.text_length(),
                change.force_move_markers,
            );
        }

        self.increase_version();
        let event = InternalContentChangedEvent {
            raw: RawContentChangedEvent {
                changes: result.raw_changes,
                version_id: self.version_id,
                is_undoing: self.is_undoing,
                is_redoing: self.is_redoing,
            },
            content: ContentChangedEvent {
                changes: result.changes,
                eol: None,
                version_id: self.version_id,
                is_undoing: self.is_undoing,
                is_redoing: self.is_redoing,
                is_flush: false,
            },
        };
        self.emit_content_event(event);

        if self.should_schedule_background_tokenization() {
            self.background_tokenization_scheduled = true;
        }

        Ok(AppliedEdits {
            reverse_edits: result.reverse_edits,
            trim_lines: result.trim_auto_whitespace_line_numbers,
        })
    }

    /// Apply a batch of edits without touching the undo stack. Returns the
    /// reverse operations.
    pub fn apply_edits(
        &mut self,
        operations: Vec<EditOperation>,
    ) -> Result<Vec<ReverseEditOperation>, TextModelError> {
        self.check_alive()?;
        self.begin_deferred_emit();
        let result = self.apply_edits_inner(operations, false);
        self.end_deferred_emit();
        result.map(|applied| applied.reverse_edits)
    }

    /// Seal the open undo group.
    pub fn push_stack_element(&mut self) {
        self.edit_stack.push_stack_element();
    }

    /// Apply edits and record them on the undo stack.
    ///
    /// When trim-auto-whitespace is on and the previous edit left
    /// auto-indented blank lines behind, a cleanup edit for each such line
    /// is prepended — unless an incoming edit touches the line, or the
    /// edits are not near the saved selections (line-wise).
    pub fn push_edit_operations(
        &mut self,
        before_cursor_state: Option<Vec<Selection>>,
        operations: Vec<EditOperation>,
        cursor_state_computer: Option<&dyn Fn(&[ReverseEditOperation]) -> Vec<Selection>>,
    ) -> Result<Option<Vec<Selection>>, TextModelError> {
        self.check_alive()?;
        self.begin_deferred_emit();
        let result =
            self.push_edit_operations_inner(before_cursor_state, operations, cursor_state_computer);
        self.end_deferred_emit();
        result
    }

    fn push_edit_operations_inner(
        &mut self,
        before_cursor_state: Option<Vec<Selection>>,
        mut operations: Vec<EditOperation>,
        cursor_state_computer: Option<&dyn Fn(&[ReverseEditOperation]) -> Vec<Selection>>,
    ) -> Result<Option<Vec<Selection>>, TextModelError> {
        if self.options.trim_auto_whitespace {
            if let Some(trim_lines) = self.trim_auto_whitespace_lines.take() {
                let edits_near_cursors = before_cursor_state
                    .as_ref()
                    .map(|selections| {
                        selections.iter().all(|selection| {
                            operations
                                .iter()
                                .any(|op| op.range.lines_intersect(selection.range))
                        })
                    })
                    .unwrap_or(true);

                if edits_near_cursors {
                    let mut trim_edits = Vec::new();
                    for trim_line in trim_lines {
                        if trim_line > self.buffer.line_count() {
                            continue;
                        }
                        let max_column = self.buffer.line_length(trim_line) + 1;
                        if self.buffer.line_first_non_whitespace_column(trim_line) != 0
                            || max_column == 1
                        {
                            // The line gained real content (or emptied out)
                            // since it was recorded.
                            continue;
                        }
                        let mut allowed = true;
                        for op in &operations {
                            if op.range.start.line <= trim_line && op.range.end.line >= trim_line {
                                // Appending a newline at the line's end keeps
                                // the trim; anything else cancels it.
                                let appends_newline = op.range.is_empty()
                                    && op.range.start.line == trim_line
                                    && op.range.start.column == max_column
                                    && op.text.starts_with('\n');
                                if !appends_newline {
                                    allowed = false;
                                    break;
                                }
                            }
                        }
                        if allowed {
                            trim_edits.push(EditOperation::delete(Range::new(
                                trim_line, 1, trim_line, max_column,
                            )));
                        }
                    }
                    operations.splice(0..0, trim_edits);
                }
            }
        }

        let before_version = self.alternative_version_id;
        let applied = self.apply_edits_inner(operations, true)?;
        self.trim_auto_whitespace_lines = if applied.trim_lines.is_empty() {
            None
        } else {
            Some(applied.trim_lines)
        };

        let after_cursor_state = cursor_state_computer.map(|f| f(&applied.reverse_edits));
        self.edit_stack.push_edit_batch(
            before_version,
            before_cursor_state,
            applied.reverse_edits,
            self.alternative_version_id,
            after_cursor_state.clone(),
        );
        Ok(after_cursor_state)
    }

    /// Whether an undo group is available.
    pub fn can_undo(&self) -> bool {
        self.edit_stack.can_undo()
    }

    /// Whether a redo group is available.
    pub fn can_redo(&self) -> bool {
        self.edit_stack.can_redo()
    }

    /// Undo the top group, returning the recorded pre-group selections;
    /// `None` on an empty stack.
    pub fn undo(&mut self) -> Result<Option<Vec<Selection>>, TextModelError> {
        self.check_alive()?;
        let Some(element) = self.edit_stack.pop_for_undo() else {
            return Ok(None);
        };

        self.begin_deferred_emit();
        self.is_undoing = true;
        let mut inverse_batches = Vec::with_capacity(element.batches.len());
        let mut failure = None;
        for batch in element.batches.iter().rev() {
            let operations = batch
                .iter()
                .map(|r| EditOperation::replace(r.range, r.text.clone()))
                .collect();
            match self.apply_edits_inner(operations, false) {
                Ok(applied) => inverse_batches.push(applied.reverse_edits),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        self.is_undoing = false;
        self.end_deferred_emit();
        if let Some(err) = failure {
            return Err(err);
        }

        inverse_batches.reverse();
        self.alternative_version_id = element.before_version_id;
        let selections = element.before_cursor_state.clone();
        self.edit_stack.push_to_future(StackElement {
            batches: inverse_batches,
            ..element
        });
        Ok(selections)
    }

    /// Redo the most recently undone group, returning its recorded
    /// post-group selections; `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Result<Option<Vec<Selection>>, TextModelError> {
        self.check_alive()?;
        let Some(element) = self.edit_stack.pop_for_redo() else {
            return Ok(None);
        };

        self.begin_deferred_emit();
        self.is_redoing = true;
        let mut inverse_batches = Vec::with_capacity(element.batches.len());
        let mut failure = None;
        for batch in element.batches.iter() {
            let operations = batch
                .iter()
                .map(|r| EditOperation::replace(r.range, r.text.clone()))
                .collect();
            match self.apply_edits_inner(operations, false) {
                Ok(applied) => inverse_batches.push(applied.reverse_edits),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        self.is_redoing = false;
        self.end_deferred_emit();
        if let Some(err) = failure {
            return Err(err);
        }

        self.alternative_version_id = element.after_version_id;
        let selections = element.after_cursor_state.clone();
        self.edit_stack.push_to_past(StackElement {
            batches: inverse_batches,
            ..element
        });
        Ok(selections)
    }

    /// Replace the whole content: decorations and undo history are dropped,
    /// tokenization restarts, a flush event is emitted.
    pub fn set_value(&mut self, text: &str) -> Result<(), TextModelError> {
        self.check_alive()?;
        self.begin_deferred_emit();

        let old_full_range = self.buffer.full_range();
        let old_length = self.buffer.length();

        self.buffer = TextBuffer::from_string(text, self.default_line_ending);
        let tokenization_enabled = self.buffer.length() <= TOKENIZATION_LENGTH_LIMIT
            && self.buffer.line_count() <= TOKENIZATION_LINE_LIMIT;
        self.is_too_large_for_sync = self.buffer.length() > SYNC_LENGTH_LIMIT;
        self.is_dominated_by_long_lines = compute_long_line_dominance(&self.buffer);
        self.tokens_store = TokensStore::new(self.buffer.line_count(), tokenization_enabled);
        self.decorations.clear();
        self.decorations_emitter.fire();
        self.edit_stack.clear();
        self.trim_auto_whitespace_lines = None;

        self.increase_version();
        let text_owned = text.to_string();
        let event = InternalContentChangedEvent {
            raw: RawContentChangedEvent {
                changes: vec![RawContentChange::Flush],
                version_id: self.version_id,
                is_undoing: false,
                is_redoing: false,
            },
            content: ContentChangedEvent {
                changes: vec![ContentChange {
                    range: old_full_range,
                    range_offset: 0,
                    range_length: old_length,
                    text: text_owned,
                    force_move_markers: false,
                }],
                eol: None,
                version_id: self.version_id,
                is_undoing: false,
                is_redoing: false,
                is_flush: true,
            },
        };
        self.emit_content_event(event);

        if self.should_schedule_background_tokenization() {
            self.background_tokenization_scheduled = true;
        }
        self.end_deferred_emit();
        Ok(())
    }

    /// Change the buffer's line ending. Positions are stable; offsets
    /// shift, so decorations are re-anchored through their cached ranges.
    pub fn set_line_ending(&mut self, line_ending: LineEnding) -> Result<(), TextModelError> {
        self.check_alive()?;
        if line_ending == self.buffer.line_ending() {
            return Ok(());
        }

        self.begin_deferred_emit();

        // Pin every decoration to line/column space across the offset shift.
        for node in self.decorations.all_nodes_mut() {
            node.cached_range = Some(self.buffer.range_at(node.start, node.end - node.start));
        }
        self.buffer.set_line_ending(line_ending);
        self.increase_version();
        let version_id = self.version_id;
        for node in self.decorations.all_nodes_mut() {
            if let Some(range) = node.cached_range {
                node.start = self.buffer.offset_at(range.start);
                node.end = self.buffer.offset_at(range.end);
                node.cached_version_id = version_id;
            }
        }

        let event = InternalContentChangedEvent {
            raw: RawContentChangedEvent {
                changes: vec![RawContentChange::EolChanged],
                version_id: self.version_id,
                is_undoing: false,
                is_redoing: false,
            },
            content: ContentChangedEvent {
                changes: Vec::new(),
                eol: Some(line_ending),
                version_id: self.version_id,
                is_undoing: false,
                is_redoing: false,
                is_flush: false,
            },
        };
        self.emit_content_event(event);
        self.end_deferred_emit();
        Ok(())
    }

    // ----- decorations ----------------------------------------------------

    fn decoration_offsets(&self, decoration: ModelDeltaDecoration) -> DecorationOffsets {
        let range = self.validate_range_relaxed(decoration.range);
        DecorationOffsets {
            start: self.buffer.offset_at(range.start),
            end: self.buffer.offset_at(range.end),
            options: decoration.options,
        }
    }

    /// Run `callback` with a change accessor; decoration events coalesce to
    /// at most one per call.
    pub fn change_decorations<R>(
        &mut self,
        owner_id: usize,
        callback: impl FnOnce(&mut DecorationsChangeAccessor<'_>) -> R,
    ) -> Result<R, TextModelError> {
        self.check_alive()?;
        self.begin_deferred_emit();
        let result = {
            let mut accessor = DecorationsChangeAccessor {
                model: self,
                owner_id,
            };
            callback(&mut accessor)
        };
        self.end_deferred_emit();
        Ok(result)
    }

    /// Atomically remove `old_ids` and add `new_decorations`, pairing by
    /// index so ids are reused where possible.
    pub fn delta_decorations(
        &mut self,
        owner_id: usize,
        old_ids: &[String],
        new_decorations: Vec<ModelDeltaDecoration>,
    ) -> Result<Vec<String>, TextModelError> {
        self.check_alive()?;
        if old_ids.is_empty() && new_decorations.is_empty() {
            return Ok(Vec::new());
        }
        self.begin_deferred_emit();
        self.decorations_emitter.fire();
        let offsets: Vec<DecorationOffsets> = new_decorations
            .into_iter()
            .map(|d| self.decoration_offsets(d))
            .collect();
        let ids = self.decorations.delta(owner_id, old_ids, offsets);
        self.end_deferred_emit();
        Ok(ids)
    }

    /// The options of a decoration, if it exists.
    pub fn get_decoration_options(&mut self, id: &str) -> Option<Arc<ModelDecorationOptions>> {
        self.decorations.get_node_mut(id).map(|n| Arc::clone(&n.options))
    }

    /// The current range of a decoration, if it exists.
    pub fn get_decoration_range(&mut self, id: &str) -> Option<Range> {
        let version_id = self.version_id;
        let buffer = &self.buffer;
        self.decorations
            .get_node_mut(id)
            .map(|node| resolve_node_range(node, buffer, version_id))
    }

    /// Decorations overlapping one line.
    pub fn get_line_decorations(
        &mut self,
        line: usize,
        owner_id: usize,
        filter_out_validation: bool,
    ) -> Result<Vec<ModelDecoration>, TextModelError> {
        self.get_lines_decorations(line, line, owner_id, filter_out_validation)
    }

    /// Decorations overlapping a run of lines.
    pub fn get_lines_decorations(
        &mut self,
        start_line: usize,
        end_line: usize,
        owner_id: usize,
        filter_out_validation: bool,
    ) -> Result<Vec<ModelDecoration>, TextModelError> {
        self.check_alive()?;
        self.check_line(start_line)?;
        let end_line = end_line.min(self.buffer.line_count());
        let range = Range::new(
            start_line,
            1,
            end_line,
            self.buffer.line_length(end_line) + 1,
        );
        Ok(self.decorations_in_validated_range(range, owner_id, filter_out_validation, false))
    }

    /// Decorations overlapping `range`.
    pub fn get_decorations_in_range(
        &mut self,
        range: Range,
        owner_id: usize,
        filter_out_validation: bool,
    ) -> Vec<ModelDecoration> {
        let range = self.validate_range_relaxed(range);
        self.decorations_in_validated_range(range, owner_id, filter_out_validation, false)
    }

    fn decorations_in_validated_range(
        &mut self,
        range: Range,
        owner_id: usize,
        filter_out_validation: bool,
        overview_ruler_only: bool,
    ) -> Vec<ModelDecoration> {
        let start = self.buffer.offset_at(range.start);
        let end = self.buffer.offset_at(range.end);
        let version_id = self.version_id;
        let buffer = &self.buffer;
        self.decorations
            .search_interval(start, end, owner_id, filter_out_validation, overview_ruler_only)
            .into_iter()
            .map(|node| ModelDecoration {
                id: node.id.clone(),
                owner_id: node.owner_id,
                range: resolve_node_range(node, buffer, version_id),
                options: Arc::clone(&node.options),
            })
            .collect()
    }

    /// Every decoration, optionally owner-scoped.
    pub fn get_all_decorations(
        &mut self,
        owner_id: usize,
        filter_out_validation: bool,
    ) -> Vec<ModelDecoration> {
        let version_id = self.version_id;
        let buffer = &self.buffer;
        self.decorations
            .search_all(owner_id, filter_out_validation)
            .into_iter()
            .map(|node| ModelDecoration {
                id: node.id.clone(),
                owner_id: node.owner_id,
                range: resolve_node_range(node, buffer, version_id),
                options: Arc::clone(&node.options),
            })
            .collect()
    }

    /// Decorations projected onto the overview ruler (ruler tree only),
    /// optionally owner-scoped.
    pub fn get_overview_ruler_decorations(&mut self, owner_id: usize) -> Vec<ModelDecoration> {
        let version_id = self.version_id;
        let buffer = &self.buffer;
        self.decorations
            .search_overview_ruler(owner_id)
            .into_iter()
            .map(|node| ModelDecoration {
                id: node.id.clone(),
                owner_id: node.owner_id,
                range: resolve_node_range(node, buffer, version_id),
                options: Arc::clone(&node.options),
            })
            .collect()
    }

    /// Remove every decoration owned by `owner_id`.
    pub fn remove_all_decorations_with_owner_id(&mut self, owner_id: usize) {
        if self.disposed {
            return;
        }
        self.begin_deferred_emit();
        self.decorations_emitter.fire();
        self.decorations.remove_all_with_owner(owner_id);
        self.end_deferred_emit();
    }

    // ----- tokens ---------------------------------------------------------

    /// The model's language.
    pub fn language_identifier(&self) -> &LanguageIdentifier {
        &self.language
    }

    /// Language of the token at `position` (the model language while the
    /// line is untokenized).
    pub fn get_language_id_at_position(&self, position: Position) -> LanguageId {
        let position = self.validate_position(position);
        let tokens = self.tokens_store.get_tokens(
            position.line,
            self.buffer.line_length(position.line),
            self.language.id,
        );
        let index = tokens.find_token_index_at_offset(position.column - 1);
        tokens.language_id(index)
    }

    /// Switch the model's language: the token cache is discarded and a
    /// whole-buffer tokens-changed event is emitted.
    pub fn set_language(&mut self, language: LanguageIdentifier) -> Result<(), TextModelError> {
        self.check_alive()?;
        if language.id == self.language.id {
            return Ok(());
        }
        let old_language = std::mem::replace(&mut self.language, language);
        self.tokenizer = self.registry.tokenizer(self.language.id);
        self.rich_brackets = self
            .registry
            .configuration(self.language.id)
            .and_then(RichBrackets::from_configuration);
        self.tokens_store.reset(self.buffer.line_count());

        let event = LanguageChangedEvent {
            old_language: old_language.name,
            new_language: self.language.name.clone(),
        };
        self.language_emitter.fire(&event);
        self.tokens_emitter.fire(&TokensChangedEvent {
            ranges: vec![TokensChangedRange {
                from_line: 1,
                to_line: self.buffer.line_count(),
            }],
        });
        if self.should_schedule_background_tokenization() {
            self.background_tokenization_scheduled = true;
        }
        Ok(())
    }

    /// Discard and rebuild the token cache (the tokenization registry
    /// signalled new support for the current language).
    pub fn reset_tokenization(&mut self) {
        if self.disposed {
            return;
        }
        self.tokenizer = self.registry.tokenizer(self.language.id);
        self.tokens_store.reset(self.buffer.line_count());
        self.tokens_emitter.fire(&TokensChangedEvent {
            ranges: vec![TokensChangedRange {
                from_line: 1,
                to_line: self.buffer.line_count(),
            }],
        });
        if self.should_schedule_background_tokenization() {
            self.background_tokenization_scheduled = true;
        }
    }

    /// Tokens of one line; a placeholder token when the line has not been
    /// tokenized yet.
    pub fn get_line_tokens(&self, line: usize) -> Result<LineTokens, TextModelError> {
        self.check_alive()?;
        self.check_line(line)?;
        Ok(self.tokens_store.get_tokens(
            line,
            self.buffer.line_length(line),
            self.language.id,
        ))
    }

    /// Whether tokenizing up to `line` is within the cheap window.
    pub fn is_cheap_to_tokenize(&self, line: usize) -> bool {
        self.tokenizer.is_none() || self.tokens_store.is_cheap_to_tokenize(line)
    }

    /// Tokenize synchronously up to `line` only when cheap.
    pub fn tokenize_if_cheap(&mut self, line: usize) -> Result<(), TextModelError> {
        if self.is_cheap_to_tokenize(line) {
            self.force_tokenization(line)?;
        }
        Ok(())
    }

    /// Synchronously tokenize every line up to and including `line`.
    pub fn force_tokenization(&mut self, line: usize) -> Result<(), TextModelError> {
        self.check_alive()?;
        self.check_line(line)?;
        let Some(tokenizer) = self.tokenizer.clone() else {
            return Ok(());
        };
        let mut builder = TokensChangedEventBuilder::new();
        {
            let buffer = &self.buffer;
            let line_contents = |n: usize| buffer.line_content(n).to_string();
            self.tokens_store.update_tokens_until_line(
                &line_contents,
                tokenizer.as_ref(),
                self.language.id,
                &mut builder,
                line,
            );
        }
        self.emit_tokens_event(builder);
        Ok(())
    }

    /// Whether a background tokenization step is pending.
    pub fn has_pending_background_tokenization(&self) -> bool {
        self.background_tokenization_scheduled
    }

    /// Run one background tokenization slice under the standard time
    /// budget. Returns `true` when another slice is needed (the model
    /// re-arms itself; the host provides the next tick).
    pub fn tokenize_background(&mut self) -> bool {
        if self.disposed || !self.background_tokenization_scheduled {
            return false;
        }
        self.background_tokenization_scheduled = false;
        let Some(tokenizer) = self.tokenizer.clone() else {
            return false;
        };

        let deadline = Instant::now() + Duration::from_millis(BACKGROUND_TOKENIZATION_BUDGET_MS);
        let mut builder = TokensChangedEventBuilder::new();
        {
            let buffer = &self.buffer;
            let line_count = buffer.line_count();
            let line_contents = |n: usize| buffer.line_content(n).to_string();
            while self.tokens_store.has_lines_to_tokenize(line_count) {
                if Instant::now() >= deadline {
                    break;
                }
                if !self.tokens_store.tokenize_one_line(
                    &line_contents,
                    tokenizer.as_ref(),
                    self.language.id,
                    &mut builder,
                ) {
                    break;
                }
            }
        }
        self.emit_tokens_event(builder);

        if self.should_schedule_background_tokenization() {
            self.background_tokenization_scheduled = true;
        }
        self.background_tokenization_scheduled
    }

    fn warm_up_tokens(&mut self) {
        let Some(tokenizer) = self.tokenizer.clone() else {
            return;
        };
        let target = TOKENIZATION_WARM_UP_LINES.min(self.buffer.line_count());
        let deadline = Instant::now() + Duration::from_millis(BACKGROUND_TOKENIZATION_BUDGET_MS);
        let mut builder = TokensChangedEventBuilder::new();
        {
            let buffer = &self.buffer;
            let line_contents = |n: usize| buffer.line_content(n).to_string();
            while self.tokens_store.first_invalid_line() <= target {
                if Instant::now() >= deadline {
                    break;
                }
                if !self.tokens_store.tokenize_one_line(
                    &line_contents,
                    tokenizer.as_ref(),
                    self.language.id,
                    &mut builder,
                ) {
                    break;
                }
            }
        }
        self.emit_tokens_event(builder);
        if self.should_schedule_background_tokenization() {
            self.background_tokenization_scheduled = true;
        }
    }

    // ----- queries --------------------------------------------------------

    /// All matches of `query` (literal or regex), capped at
    /// `limit_result_count` (default 999).
    #[allow(clippy::too_many_arguments)]
    pub fn find_matches(
        &self,
        query: &str,
        search_scope: Option<Range>,
        is_regex: bool,
        match_case: bool,
        whole_word: bool,
        capture_matches: bool,
        limit_result_count: Option<usize>,
    ) -> Result<Vec<FindMatch>, TextModelError> {
        self.check_alive()?;
        let scope = search_scope.map(|r| self.validate_range(r));
        search::find_matches(
            &self.buffer,
            query,
            scope,
            is_regex,
            match_case,
            whole_word,
            capture_matches,
            limit_result_count.unwrap_or(DEFAULT_MATCHES_LIMIT),
        )
    }

    /// The next match after `position`, wrapping around.
    #[allow(clippy::too_many_arguments)]
    pub fn find_next_match(
        &self,
        query: &str,
        position: Position,
        is_regex: bool,
        match_case: bool,
        whole_word: bool,
        capture_matches: bool,
    ) -> Result<Option<FindMatch>, TextModelError> {
        self.check_alive()?;
        search::find_next_match(
            &self.buffer,
            query,
            self.validate_position(position),
            is_regex,
            match_case,
            whole_word,
            capture_matches,
        )
    }

    /// The previous match before `position`, wrapping around.
    #[allow(clippy::too_many_arguments)]
    pub fn find_previous_match(
        &self,
        query: &str,
        position: Position,
        is_regex: bool,
        match_case: bool,
        whole_word: bool,
        capture_matches: bool,
    ) -> Result<Option<FindMatch>, TextModelError> {
        self.check_alive()?;
        search::find_previous_match(
            &self.buffer,
            query,
            self.validate_position(position),
            is_regex,
            match_case,
            whole_word,
            capture_matches,
        )
    }

    /// Match the bracket at `position` against its counterpart. Returns the
    /// pair `[bracket_under_cursor, matching_bracket]`.
    pub fn match_bracket(&self, position: Position) -> Result<Option<[Range; 2]>, TextModelError> {
        self.check_alive()?;
        let position = self.validate_position(position);
        let Some(rich_brackets) = &self.rich_brackets else {
            return Ok(None);
        };
        Ok(brackets::match_bracket(
            &self.buffer,
            &self.tokens_for_line_fn(),
            rich_brackets,
            position,
        ))
    }

    /// The closest bracket before `position`.
    pub fn find_prev_bracket(&self, position: Position) -> Option<FoundBracket> {
        if self.disposed {
            return None;
        }
        let position = self.validate_position(position);
        let rich_brackets = self.rich_brackets.as_ref()?;
        brackets::find_prev_bracket(
            &self.buffer,
            &self.tokens_for_line_fn(),
            rich_brackets,
            position,
        )
    }

    /// The closest bracket after `position`.
    pub fn find_next_bracket(&self, position: Position) -> Option<FoundBracket> {
        if self.disposed {
            return None;
        }
        let position = self.validate_position(position);
        let rich_brackets = self.rich_brackets.as_ref()?;
        brackets::find_next_bracket(
            &self.buffer,
            &self.tokens_for_line_fn(),
            rich_brackets,
            position,
        )
    }

    fn tokens_for_line_fn(&self) -> impl Fn(usize) -> LineTokens + '_ {
        move |line| {
            self.tokens_store
                .get_tokens(line, self.buffer.line_length(line), self.language.id)
        }
    }

    /// The word at `position` per the language's word pattern.
    pub fn get_word_at_position(&self, position: Position) -> Option<WordAtPosition> {
        if self.disposed {
            return None;
        }
        let position = self.validate_position(position);
        let (text, text_start_column, language_id) = self.same_language_span(position);
        let configuration = self.registry.configuration(language_id);
        let word_pattern = configuration
            .and_then(|c| c.word_pattern.as_ref())
            .unwrap_or(&self.default_word_pattern);
        words::get_word_at_text(position.column, word_pattern, &text, text_start_column)
    }

    /// The word at `position` truncated at the cursor; an empty anchored
    /// word when there is none.
    pub fn get_word_until_position(&self, position: Position) -> WordAtPosition {
        let position = self.validate_position(position);
        let (text, text_start_column, language_id) = self.same_language_span(position);
        let configuration = self.registry.configuration(language_id);
        let word_pattern = configuration
            .and_then(|c| c.word_pattern.as_ref())
            .unwrap_or(&self.default_word_pattern);
        words::get_word_until_column(position.column, word_pattern, &text, text_start_column)
    }

    /// The maximal same-language token span around `position`, as (text,
    /// 1-based start column, language id).
    fn same_language_span(&self, position: Position) -> (String, usize, LanguageId) {
        let line = self.buffer.line_content(position.line);
        let tokens = self.tokens_store.get_tokens(
            position.line,
            self.buffer.line_length(position.line),
            self.language.id,
        );
        let anchor = tokens.find_token_index_at_offset(position.column - 1);
        let language_id = tokens.language_id(anchor);

        let mut first = anchor;
        while first > 0 && tokens.language_id(first - 1) == language_id {
            first -= 1;
        }
        let mut last = anchor;
        while last + 1 < tokens.count() && tokens.language_id(last + 1) == language_id {
            last += 1;
        }

        let span_start = tokens.start_offset(first);
        let span_end = tokens.end_offset(last);
        let byte_start = utf16_offset_to_byte(line, span_start);
        let byte_end = utf16_offset_to_byte(line, span_end);
        (
            line[byte_start..byte_end].to_string(),
            span_start + 1,
            language_id,
        )
    }

    /// Indent guide depth for each line in `start_line..=end_line`.
    pub fn get_lines_indent_guides(
        &self,
        start_line: usize,
        end_line: usize,
    ) -> Result<Vec<usize>, TextModelError> {
        self.check_alive()?;
        self.check_line(start_line)?;
        self.check_line(end_line)?;
        let off_side = self
            .registry
            .configuration(self.language.id)
            .map(|c| c.off_side)
            .unwrap_or(false);
        Ok(indent::get_lines_indent_guides(
            &self.buffer,
            self.options.tab_size,
            off_side,
            start_line,
            end_line,
        ))
    }
}

fn compute_long_line_dominance(buffer: &TextBuffer) -> bool {
    let mut long_line_units = 0usize;
    let mut short_line_units = 0usize;
    for n in 1..=buffer.line_count() {
        let len = buffer.line_length(n);
        if len >= LONG_LINE_BOUNDARY {
            long_line_units += len;
        } else {
            short_line_units += len;
        }
    }
    long_line_units > short_line_units
}

/// Transient decoration mutator handed to
/// [`TextModel::change_decorations`]; the borrow ends with the callback, so
/// it cannot escape the batch.
pub struct DecorationsChangeAccessor<'a> {
    model: &'a mut TextModel,
    owner_id: usize,
}

impl DecorationsChangeAccessor<'_> {
    /// Add a decoration, returning its id.
    pub fn add_decoration(
        &mut self,
        range: Range,
        options: Arc<ModelDecorationOptions>,
    ) -> String {
        self.model.decorations_emitter.fire();
        let offsets = self
            .model
            .decoration_offsets(ModelDeltaDecoration::new(range, options));
        self.model.decorations.insert(self.owner_id, offsets)
    }

    /// Move a decoration; unknown ids are ignored.
    pub fn change_decoration(&mut self, id: &str, range: Range) {
        let range = self.model.validate_range_relaxed(range);
        let start = self.model.buffer.offset_at(range.start);
        let end = self.model.buffer.offset_at(range.end);
        if self.model.decorations.change_range(id, start, end) {
            self.model.decorations_emitter.fire();
        }
    }

    /// Swap a decoration's options; unknown ids are ignored.
    pub fn change_decoration_options(&mut self, id: &str, options: Arc<ModelDecorationOptions>) {
        if self.model.decorations.change_options(id, options) {
            self.model.decorations_emitter.fire();
        }
    }

    /// Remove a decoration; unknown ids are ignored.
    pub fn remove_decoration(&mut self, id: &str) {
        if self.model.decorations.remove(id) {
            self.model.decorations_emitter.fire();
        }
    }

    /// Batch pairing, as [`TextModel::delta_decorations`].
    pub fn delta_decorations(
        &mut self,
        old_ids: &[String],
        new_decorations: Vec<ModelDeltaDecoration>,
    ) -> Vec<String> {
        if old_ids.is_empty() && new_decorations.is_empty() {
            return Vec::new();
        }
        self.model.decorations_emitter.fire();
        let offsets: Vec<DecorationOffsets> = new_decorations
            .into_iter()
            .map(|d| self.model.decoration_offsets(d))
            .collect();
        self.model.decorations.delta(self.owner_id, old_ids, offsets)
    }
}
