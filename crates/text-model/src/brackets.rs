//! Token-aware bracket matching.
//!
//! Brackets come from the language configuration. Matching walks line
//! tokens, skipping tokens classified as comments, strings or regexes, and
//! accumulates a signed nesting count for the pair under the cursor. The
//! bracket under the cursor itself is only looked for within
//! `max_bracket_length` code units around the cursor, bounded to its token.

use crate::buffer::{utf16_len, utf16_offset_to_byte, TextBuffer};
use crate::position::{Position, Range};
use crate::tokens::{LineTokens, TokenMetadata};
use regex::Regex;
use text_model_lang::{BracketPair, LanguageConfiguration};

/// A bracket found by the directional scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundBracket {
    /// Where the bracket text sits.
    pub range: Range,
    /// The pair's opening text.
    pub open: String,
    /// The pair's closing text.
    pub close: String,
    /// Whether the found text is the opening side.
    pub is_open: bool,
}

/// Compiled bracket data for one language.
pub(crate) struct RichBrackets {
    pairs: Vec<BracketPair>,
    regex: Regex,
    max_bracket_length: usize,
}

impl RichBrackets {
    /// Compile the configuration's brackets; `None` when it has none.
    pub(crate) fn from_configuration(config: &LanguageConfiguration) -> Option<Self> {
        if config.brackets.is_empty() {
            return None;
        }
        let mut texts: Vec<&str> = config
            .brackets
            .iter()
            .flat_map(|p| [p.open.as_str(), p.close.as_str()])
            .collect();
        // Longest first so multi-character brackets win over their prefixes.
        texts.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        texts.dedup();
        let pattern = texts
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let regex = Regex::new(&pattern).ok()?;
        Some(Self {
            pairs: config.brackets.clone(),
            regex,
            max_bracket_length: config.max_bracket_length(),
        })
    }

    fn classify(&self, text: &str) -> Option<(usize, bool)> {
        self.pairs.iter().enumerate().find_map(|(idx, pair)| {
            if pair.open == text {
                Some((idx, true))
            } else if pair.close == text {
                Some((idx, false))
            } else {
                None
            }
        })
    }
}

/// One bracket occurrence within a line, in 0-based UTF-16 units.
struct Occurrence {
    start: usize,
    end: usize,
    pair_index: usize,
    is_open: bool,
}

/// Bracket occurrences inside `[from, to)` of a line, honoring token type
/// exclusions.
fn occurrences_in_line(
    brackets: &RichBrackets,
    text: &str,
    tokens: &LineTokens,
    from: usize,
    to: usize,
) -> Vec<Occurrence> {
    let mut result = Vec::new();
    for idx in 0..tokens.count() {
        if TokenMetadata::ignore_brackets_in_token(tokens.metadata(idx)) {
            continue;
        }
        let window_start = tokens.start_offset(idx).max(from);
        let window_end = tokens.end_offset(idx).min(to);
        if window_start >= window_end {
            continue;
        }
        let byte_start = utf16_offset_to_byte(text, window_start);
        let byte_end = utf16_offset_to_byte(text, window_end);
        let slice = &text[byte_start..byte_end];
        let mut units_cursor = 0usize;
        let mut bytes_cursor = 0usize;
        for m in brackets.regex.find_iter(slice) {
            units_cursor += utf16_len(&slice[bytes_cursor..m.start()]);
            bytes_cursor = m.start();
            let start = window_start + units_cursor;
            let end = start + utf16_len(m.as_str());
            if let Some((pair_index, is_open)) = brackets.classify(m.as_str()) {
                result.push(Occurrence {
                    start,
                    end,
                    pair_index,
                    is_open,
                });
            }
            units_cursor += utf16_len(m.as_str());
            bytes_cursor = m.end();
        }
    }
    result.sort_by_key(|o| o.start);
    result
}

/// Match the bracket at `position`, returning the bracket's range and its
/// counterpart's range.
pub(crate) fn match_bracket(
    buffer: &TextBuffer,
    tokens_for_line: &dyn Fn(usize) -> LineTokens,
    brackets: &RichBrackets,
    position: Position,
) -> Option<[Range; 2]> {
    let line = position.line;
    let text = buffer.line_content(line);
    let tokens = tokens_for_line(line);
    let col0 = position.column - 1;

    let token_index = tokens.find_token_index_at_offset(col0);
    let mut candidates = vec![token_index];
    // A position on a token boundary also inspects the previous token.
    if token_index > 0 && tokens.start_offset(token_index) == col0 {
        candidates.push(token_index - 1);
    }

    for candidate in candidates {
        if TokenMetadata::ignore_brackets_in_token(tokens.metadata(candidate)) {
            continue;
        }
        let from = tokens
            .start_offset(candidate)
            .max(col0.saturating_sub(brackets.max_bracket_length));
        let to = tokens
            .end_offset(candidate)
            .min(col0 + brackets.max_bracket_length);
        let found = occurrences_in_line(brackets, text, &tokens, from, to)
            .into_iter()
            .find(|o| o.start <= col0 && col0 <= o.end);
        if let Some(occurrence) = found {
            let bracket_range = Range::new(line, occurrence.start + 1, line, occurrence.end + 1);
            let other = if occurrence.is_open {
                find_matching_bracket_down(
                    buffer,
                    tokens_for_line,
                    brackets,
                    occurrence.pair_index,
                    Position::new(line, occurrence.end + 1),
                )
            } else {
                find_matching_bracket_up(
                    buffer,
                    tokens_for_line,
                    brackets,
                    occurrence.pair_index,
                    Position::new(line, occurrence.start + 1),
                )
            };
            return other.map(|other_range| [bracket_range, other_range]);
        }
    }
    None
}

/// Scan forward for the closing bracket balancing one open bracket of
/// `pair_index`, starting at `from` (just past the open bracket).
pub(crate) fn find_matching_bracket_down(
    buffer: &TextBuffer,
    tokens_for_line: &dyn Fn(usize) -> LineTokens,
    brackets: &RichBrackets,
    pair_index: usize,
    from: Position,
) -> Option<Range> {
    let mut count = 1isize;
    for line in from.line..=buffer.line_count() {
        let text = buffer.line_content(line);
        let tokens = tokens_for_line(line);
        let start = if line == from.line { from.column - 1 } else { 0 };
        for occurrence in occurrences_in_line(brackets, text, &tokens, start, utf16_len(text)) {
            if occurrence.pair_index != pair_index {
                continue;
            }
            count += if occurrence.is_open { 1 } else { -1 };
            if count == 0 {
                return Some(Range::new(
                    line,
                    occurrence.start + 1,
                    line,
                    occurrence.end + 1,
                ));
            }
        }
    }
    None
}

/// Scan backward for the open bracket balancing one closing bracket of
/// `pair_index`, starting at `from` (the closing bracket's start).
pub(crate) fn find_matching_bracket_up(
    buffer: &TextBuffer,
    tokens_for_line: &dyn Fn(usize) -> LineTokens,
    brackets: &RichBrackets,
    pair_index: usize,
    from: Position,
) -> Option<Range> {
    let mut count = -1isize;
    for line in (1..=from.line).rev() {
        let text = buffer.line_content(line);
        let tokens = tokens_for_line(line);
        let end = if line == from.line {
            from.column - 1
        } else {
            utf16_len(text)
        };
        for occurrence in occurrences_in_line(brackets, text, &tokens, 0, end)
            .into_iter()
            .rev()
        {
            if occurrence.pair_index != pair_index {
                continue;
            }
            count += if occurrence.is_open { 1 } else { -1 };
            if count == 0 {
                return Some(Range::new(
                    line,
                    occurrence.start + 1,
                    line,
                    occurrence.end + 1,
                ));
            }
        }
    }
    None
}

/// The closest bracket of any pair at or before `position`.
pub(crate) fn find_prev_bracket(
    buffer: &TextBuffer,
    tokens_for_line: &dyn Fn(usize) -> LineTokens,
    brackets: &RichBrackets,
    position: Position,
) -> Option<FoundBracket> {
    for line in (1..=position.line).rev() {
        let text = buffer.line_content(line);
        let tokens = tokens_for_line(line);
        let end = if line == position.line {
            position.column - 1
        } else {
            utf16_len(text)
        };
        if let Some(occurrence) = occurrences_in_line(brackets, text, &tokens, 0, end).pop() {
            let pair = &brackets.pairs[occurrence.pair_index];
            return Some(FoundBracket {
                range: Range::new(line, occurrence.start + 1, line, occurrence.end + 1),
                open: pair.open.clone(),
                close: pair.close.clone(),
                is_open: occurrence.is_open,
            });
        }
    }
    None
}

/// The closest bracket of any pair at or after `position`.
pub(crate) fn find_next_bracket(
    buffer: &TextBuffer,
    tokens_for_line: &dyn Fn(usize) -> LineTokens,
    brackets: &RichBrackets,
    position: Position,
) -> Option<FoundBracket> {
    for line in position.line..=buffer.line_count() {
        let text = buffer.line_content(line);
        let tokens = tokens_for_line(line);
        let start = if line == position.line {
            position.column - 1
        } else {
            0
        };
        let mut occurrences =
            occurrences_in_line(brackets, text, &tokens, start, utf16_len(text));
        if !occurrences.is_empty() {
            let occurrence = occurrences.remove(0);
            let pair = &brackets.pairs[occurrence.pair_index];
            return Some(FoundBracket {
                range: Range::new(line, occurrence.start + 1, line, occurrence.end + 1),
                open: pair.open.clone(),
                close: pair.close.clone(),
                is_open: occurrence.is_open,
            });
        }
    }
    None
}
