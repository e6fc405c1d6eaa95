//! Line-based text storage and edit application.
//!
//! The buffer stores line contents without their terminating sequence plus a
//! single line ending for the whole document. All addressing is in UTF-16
//! code units: a line-start index maps offsets to positions in O(log n) and
//! back in O(1), counting the line ending as 1 or 2 units as configured.
//!
//! [`TextBuffer::apply_edits`] is the only mutation entry point for content.
//! It takes a batch of non-overlapping replace operations and returns the
//! line-level raw changes, the atomic deltas fed to derived indexes, the
//! reverse operations for the undo stack, and (optionally) the lines left
//! holding only whitespace.

use crate::error::TextModelError;
use crate::events::{ContentChange, RawContentChange};
use crate::line_ending::{DefaultLineEnding, EndOfLinePreference, LineEnding};
use crate::position::{Position, Range};

/// UTF-16 code unit length of a string.
pub(crate) fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Map a UTF-16 code-unit offset within `line` to a byte index.
///
/// Offsets past the end clamp to the line length. An offset landing between
/// the two halves of a surrogate pair maps to the start of that character
/// (byte indices cannot split a scalar value).
pub(crate) fn utf16_offset_to_byte(line: &str, offset: usize) -> usize {
    if offset == 0 {
        return 0;
    }
    let mut units = 0usize;
    for (byte_idx, ch) in line.char_indices() {
        if units >= offset {
            return byte_idx;
        }
        units += ch.len_utf16();
    }
    line.len()
}

/// Returns `true` if the UTF-16 offset falls between the high and low
/// halves of a surrogate pair in `line`.
pub(crate) fn utf16_offset_splits_pair(line: &str, offset: usize) -> bool {
    if offset == 0 {
        return false;
    }
    let mut units = 0usize;
    for ch in line.chars() {
        let len = ch.len_utf16();
        if offset < units + len {
            return offset > units;
        }
        units += len;
    }
    false
}

/// Split `text` into lines on `\r\n`, `\r` or `\n`; N newlines yield N+1
/// entries, so a trailing newline produces a trailing empty line.
pub(crate) fn split_text_into_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            '\n' => lines.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    lines.push(current);
    lines
}

fn is_whitespace_only(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| c == ' ' || c == '\t')
}

/// A single replace operation against the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOperation {
    /// The range to replace; must be validated against the current buffer.
    pub range: Range,
    /// The replacement text (empty deletes the range).
    pub text: String,
    /// Push decorations at the edit edges outward regardless of stickiness.
    pub force_move_markers: bool,
}

impl EditOperation {
    /// Replace `range` with `text`.
    pub fn replace(range: Range, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
            force_move_markers: false,
        }
    }

    /// Insert `text` at `position`.
    pub fn insert(position: Position, text: impl Into<String>) -> Self {
        Self::replace(Range::collapsed(position), text)
    }

    /// Delete `range`.
    pub fn delete(range: Range) -> Self {
        Self::replace(range, "")
    }

    /// Set the force-move-markers flag.
    pub fn with_force_move_markers(mut self, force: bool) -> Self {
        self.force_move_markers = force;
        self
    }
}

/// An operation that restores previously replaced text; ranges are valid in
/// the post-edit document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseEditOperation {
    /// Where the replacement landed in the post-edit document.
    pub range: Range,
    /// The text that was replaced.
    pub text: String,
}

/// Everything [`TextBuffer::apply_edits`] produces.
#[derive(Debug)]
pub struct BufferEditResult {
    /// Line-level changes, in client-mirror replay order.
    pub raw_changes: Vec<RawContentChange>,
    /// Atomic deltas, one per input operation, in the input order.
    pub changes: Vec<ContentChange>,
    /// Operations that restore the pre-edit text when applied in order.
    pub reverse_edits: Vec<ReverseEditOperation>,
    /// Lines (post-edit numbering) left containing only whitespace, when
    /// recording was requested; ascending, deduplicated.
    pub trim_auto_whitespace_line_numbers: Vec<usize>,
}

/// Line storage with UTF-16 offset addressing.
pub struct TextBuffer {
    lines: Vec<String>,
    line_ending: LineEnding,
    has_bom: bool,
    /// `line_starts[i]` is the offset of line `i` (0-based) in UTF-16 code
    /// units, counting line endings.
    line_starts: Vec<usize>,
    /// Total length in UTF-16 code units.
    total_length: usize,
}

impl TextBuffer {
    /// Build a buffer from raw text, stripping a UTF-8 BOM and detecting the
    /// line ending ([`LineEnding::detect_in_text`]); `default_line_ending`
    /// applies when the text has no line breaks at all.
    pub fn from_string(text: &str, default_line_ending: DefaultLineEnding) -> Self {
        let (text, has_bom) = match text.strip_prefix('\u{FEFF}') {
            Some(stripped) => (stripped, true),
            None => (text, false),
        };

        let line_ending = if text.contains('\n') || text.contains('\r') {
            LineEnding::detect_in_text(text)
        } else {
            default_line_ending.as_line_ending()
        };

        let mut buffer = Self {
            lines: split_text_into_lines(text),
            line_ending,
            has_bom,
            line_starts: Vec::new(),
            total_length: 0,
        };
        buffer.rebuild_line_starts();
        buffer
    }

    fn rebuild_line_starts(&mut self) {
        let eol_len = self.line_ending.len();
        self.line_starts.clear();
        self.line_starts.reserve(self.lines.len());
        let mut offset = 0usize;
        for line in &self.lines {
            self.line_starts.push(offset);
            offset += utf16_len(line) + eol_len;
        }
        // The last line carries no line ending.
        self.total_length = offset - eol_len;
    }

    /// Number of lines; at least 1.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Content of 1-based line `n`, without its line ending.
    pub fn line_content(&self, n: usize) -> &str {
        &self.lines[n - 1]
    }

    /// Length of 1-based line `n` in UTF-16 code units.
    pub fn line_length(&self, n: usize) -> usize {
        if n < self.lines.len() {
            self.line_starts[n] - self.line_starts[n - 1] - self.line_ending.len()
        } else {
            self.total_length - self.line_starts[n - 1]
        }
    }

    /// Total length in UTF-16 code units, counting line endings.
    pub fn length(&self) -> usize {
        self.total_length
    }

    /// The buffer's line ending.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Whether the source text carried a BOM.
    pub fn has_bom(&self) -> bool {
        self.has_bom
    }

    /// Change the line ending. Offsets shift; line contents and positions do
    /// not.
    pub fn set_line_ending(&mut self, line_ending: LineEnding) {
        self.line_ending = line_ending;
        self.rebuild_line_starts();
    }

    /// 1-based column of the first non-whitespace character of line `n`, or
    /// 0 when the line is empty or all whitespace.
    pub fn line_first_non_whitespace_column(&self, n: usize) -> usize {
        let line = self.line_content(n);
        let mut column = 1usize;
        for ch in line.chars() {
            if ch != ' ' && ch != '\t' {
                return column;
            }
            column += ch.len_utf16();
        }
        0
    }

    /// 1-based column just past the last non-whitespace character of line
    /// `n`, or 0 when the line is empty or all whitespace.
    pub fn line_last_non_whitespace_column(&self, n: usize) -> usize {
        let line = self.line_content(n);
        let mut column = 1usize;
        let mut result = 0usize;
        for ch in line.chars() {
            column += ch.len_utf16();
            if ch != ' ' && ch != '\t' {
                result = column;
            }
        }
        result
    }

    /// Offset of a valid position, in UTF-16 code units.
    pub fn offset_at(&self, position: Position) -> usize {
        debug_assert!(position.line >= 1 && position.line <= self.lines.len());
        self.line_starts[position.line - 1] + (position.column - 1)
    }

    /// Position of an offset. Out-of-range offsets clamp; offsets landing
    /// inside a line ending clamp to the end of the line.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.total_length);
        let line_idx = self.line_starts.partition_point(|&s| s <= offset) - 1;
        let column = (offset - self.line_starts[line_idx]).min(self.line_length(line_idx + 1));
        Position::new(line_idx + 1, column + 1)
    }

    /// The range starting at `offset` spanning `length` code units.
    pub fn range_at(&self, offset: usize, length: usize) -> Range {
        Range::from_positions(self.position_at(offset), self.position_at(offset + length))
    }

    /// Extract the text of a validated range.
    pub fn value_in_range(&self, range: Range, preference: EndOfLinePreference) -> String {
        if range.is_empty() {
            return String::new();
        }

        let eol = match preference {
            EndOfLinePreference::TextDefined => self.line_ending.as_str(),
            EndOfLinePreference::Lf => "\n",
            EndOfLinePreference::Crlf => "\r\n",
        };

        let start_line = &self.lines[range.start.line - 1];
        if range.start.line == range.end.line {
            let from = utf16_offset_to_byte(start_line, range.start.column - 1);
            let to = utf16_offset_to_byte(start_line, range.end.column - 1);
            return start_line[from..to].to_string();
        }

        let mut out = String::new();
        out.push_str(&start_line[utf16_offset_to_byte(start_line, range.start.column - 1)..]);
        for line in &self.lines[range.start.line..range.end.line - 1] {
            out.push_str(eol);
            out.push_str(line);
        }
        out.push_str(eol);
        let end_line = &self.lines[range.end.line - 1];
        out.push_str(&end_line[..utf16_offset_to_byte(end_line, range.end.column - 1)]);
        out
    }

    /// The whole buffer as one string.
    pub fn value(&self, preference: EndOfLinePreference, preserve_bom: bool) -> String {
        let eol = match preference {
            EndOfLinePreference::TextDefined => self.line_ending.as_str(),
            EndOfLinePreference::Lf => "\n",
            EndOfLinePreference::Crlf => "\r\n",
        };
        let mut out = String::new();
        if preserve_bom && self.has_bom {
            out.push('\u{FEFF}');
        }
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push_str(eol);
            }
            out.push_str(line);
        }
        out
    }

    /// The range covering the whole buffer.
    pub fn full_range(&self) -> Range {
        let last = self.lines.len();
        Range::new(1, 1, last, self.line_length(last) + 1)
    }

    /// Content equality: same lines and same line ending.
    pub fn equals(&self, other: &TextBuffer) -> bool {
        self.line_ending == other.line_ending && self.lines == other.lines
    }

    /// Apply a batch of non-overlapping operations.
    ///
    /// Operations are applied back-to-front so earlier ranges stay valid;
    /// the returned [`BufferEditResult::changes`] keep the caller's order.
    pub fn apply_edits(
        &mut self,
        operations: Vec<EditOperation>,
        record_trim_auto_whitespace: bool,
    ) -> Result<BufferEditResult, TextModelError> {
        if operations.is_empty() {
            return Ok(BufferEditResult {
                raw_changes: Vec::new(),
                changes: Vec::new(),
                reverse_edits: Vec::new(),
                trim_auto_whitespace_line_numbers: Vec::new(),
            });
        }

        let mut sorted: Vec<(usize, EditOperation)> = operations.into_iter().enumerate().collect();
        sorted.sort_by(|(_, a), (_, b)| {
            a.range
                .start
                .cmp(&b.range.start)
                .then_with(|| a.range.end.cmp(&b.range.end))
        });
        for pair in sorted.windows(2) {
            if pair[1].1.range.start < pair[0].1.range.end {
                return Err(TextModelError::OverlappingEdits);
            }
        }

        struct PreparedOp {
            original_index: usize,
            range: Range,
            range_offset: usize,
            range_length: usize,
            old_text: String,
            new_lines: Vec<String>,
            text_length: usize,
            text: String,
            force_move_markers: bool,
        }

        let prepared: Vec<PreparedOp> = sorted
            .into_iter()
            .map(|(original_index, op)| {
                let range_offset = self.offset_at(op.range.start);
                let range_length = self.offset_at(op.range.end) - range_offset;
                PreparedOp {
                    original_index,
                    range: op.range,
                    range_offset,
                    range_length,
                    old_text: self.value_in_range(op.range, EndOfLinePreference::TextDefined),
                    new_lines: split_text_into_lines(&op.text),
                    text_length: utf16_len(&op.text),
                    text: op.text,
                    force_move_markers: op.force_move_markers,
                }
            })
            .collect();

        // Atomic deltas in the caller's order, against the pre-edit buffer.
        let mut indexed_changes: Vec<(usize, ContentChange)> = prepared
            .iter()
            .map(|op| {
                (
                    op.original_index,
                    ContentChange {
                        range: op.range,
                        range_offset: op.range_offset,
                        range_length: op.range_length,
                        text: op.text.clone(),
                        force_move_markers: op.force_move_markers,
                    },
                )
            })
            .collect();
        indexed_changes.sort_by_key(|(i, _)| *i);
        let changes: Vec<ContentChange> = indexed_changes.into_iter().map(|(_, c)| c).collect();

        // Apply back-to-front, recording raw line events in replay order.
        let mut raw_changes = Vec::new();
        for op in prepared.iter().rev() {
            let start_line = op.range.start.line;
            let end_line = op.range.end.line;

            let prefix = {
                let line = &self.lines[start_line - 1];
                line[..utf16_offset_to_byte(line, op.range.start.column - 1)].to_string()
            };
            let suffix = {
                let line = &self.lines[end_line - 1];
                line[utf16_offset_to_byte(line, op.range.end.column - 1)..].to_string()
            };

            let mut segment = op.new_lines.clone();
            segment[0] = prefix + &segment[0];
            let last = segment.len() - 1;
            segment[last].push_str(&suffix);

            let old_count = end_line - start_line + 1;
            let new_count = segment.len();
            let editing = old_count.min(new_count);

            for (j, content) in segment.iter().take(editing).enumerate() {
                raw_changes.push(RawContentChange::LineChanged {
                    line: start_line + j,
                    content: content.clone(),
                });
            }
            if old_count > new_count {
                raw_changes.push(RawContentChange::LinesDeleted {
                    from_line: start_line + editing,
                    to_line: end_line,
                });
            } else if new_count > old_count {
                raw_changes.push(RawContentChange::LinesInserted {
                    from_line: start_line + editing,
                    to_line: start_line + new_count - 1,
                    lines: segment[editing..].to_vec(),
                });
            }

            self.lines.splice(start_line - 1..end_line, segment);
        }
        self.rebuild_line_starts();

        // Reverse operations, front-to-back with a running length delta so
        // their ranges land in the post-edit document.
        let mut reverse_edits = Vec::with_capacity(prepared.len());
        let mut delta = 0isize;
        for op in &prepared {
            let new_offset = (op.range_offset as isize + delta) as usize;
            reverse_edits.push(ReverseEditOperation {
                range: self.range_at(new_offset, op.text_length),
                text: op.old_text.clone(),
            });
            delta += op.text_length as isize - op.range_length as isize;
        }

        // Whitespace-only lines the edits left behind (post-edit numbering).
        let mut trim_lines = Vec::new();
        if record_trim_auto_whitespace {
            let mut line_delta = 0isize;
            for op in &prepared {
                let first = (op.range.start.line as isize + line_delta) as usize;
                for line in first..first + op.new_lines.len() {
                    if is_whitespace_only(self.line_content(line)) {
                        trim_lines.push(line);
                    }
                }
                line_delta +=
                    op.new_lines.len() as isize - 1 - (op.range.end.line - op.range.start.line) as isize;
            }
            trim_lines.sort_unstable();
            trim_lines.dedup();
        }

        Ok(BufferEditResult {
            raw_changes,
            changes,
            reverse_edits,
            trim_auto_whitespace_line_numbers: trim_lines,
        })
    }
}
