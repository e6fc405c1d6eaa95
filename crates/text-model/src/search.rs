//! Search over the buffer.
//!
//! Queries are either literal (escaped) or regex, compiled through
//! [`regex::RegexBuilder`] with multi-line mode so `^`/`$` anchor per line.
//! All public offsets are UTF-16 positions; byte offsets from the regex
//! engine are translated with a forward-walking cursor so a full scan stays
//! linear.

use crate::buffer::TextBuffer;
use crate::error::TextModelError;
use crate::line_ending::EndOfLinePreference;
use crate::position::{Position, Range};
use regex::{Regex, RegexBuilder};

/// Default cap on the number of matches returned by a find-all.
pub(crate) const DEFAULT_MATCHES_LIMIT: usize = 999;

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindMatch {
    /// The matched range.
    pub range: Range,
    /// Capture groups (`[whole, group1, ...]`) when capture collection was
    /// requested; `None` otherwise.
    pub matches: Option<Vec<String>>,
}

fn compile_query(
    query: &str,
    is_regex: bool,
    match_case: bool,
) -> Result<Regex, TextModelError> {
    let pattern = if is_regex {
        query.to_string()
    } else {
        regex::escape(query)
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(!match_case)
        .multi_line(true)
        .build()
        .map_err(TextModelError::InvalidSearchPattern)
}

fn is_word_char(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

fn is_whole_word(text: &str, start_byte: usize, end_byte: usize) -> bool {
    let before = text[..start_byte].chars().next_back();
    let after = text[end_byte..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

/// Translates ascending byte offsets to UTF-16 offsets in one forward pass.
struct Utf16Walker<'a> {
    text: &'a str,
    byte: usize,
    units: usize,
}

impl<'a> Utf16Walker<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            units: 0,
        }
    }

    fn units_at(&mut self, byte: usize) -> usize {
        debug_assert!(byte >= self.byte, "walker only moves forward");
        self.units += self.text[self.byte..byte].encode_utf16().count();
        self.byte = byte;
        self.units
    }
}

/// Map a UTF-16 offset into `text` to a byte offset.
fn utf16_to_byte(text: &str, units: usize) -> usize {
    if units == 0 {
        return 0;
    }
    let mut seen = 0usize;
    for (byte_idx, ch) in text.char_indices() {
        if seen >= units {
            return byte_idx;
        }
        seen += ch.len_utf16();
    }
    text.len()
}

fn capture_strings(re: &Regex, text: &str, start_byte: usize) -> Option<Vec<String>> {
    re.captures_at(text, start_byte).map(|caps| {
        caps.iter()
            .map(|g| g.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect()
    })
}

/// All matches of `query`, optionally restricted to `scope`, capped at
/// `limit`.
pub(crate) fn find_matches(
    buffer: &TextBuffer,
    query: &str,
    scope: Option<Range>,
    is_regex: bool,
    match_case: bool,
    whole_word: bool,
    capture_matches: bool,
    limit: usize,
) -> Result<Vec<FindMatch>, TextModelError> {
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let re = compile_query(query, is_regex, match_case)?;

    let scope = scope.unwrap_or_else(|| buffer.full_range());
    let text = buffer.value_in_range(scope, EndOfLinePreference::TextDefined);
    let base_offset = buffer.offset_at(scope.start);

    let mut walker = Utf16Walker::new(&text);
    let mut result = Vec::new();
    for m in re.find_iter(&text) {
        if m.start() == m.end() {
            continue;
        }
        if whole_word && !is_whole_word(&text, m.start(), m.end()) {
            continue;
        }
        let start_units = walker.units_at(m.start());
        let end_units = start_units + text[m.start()..m.end()].encode_utf16().count();
        let matches = if capture_matches {
            capture_strings(&re, &text, m.start())
        } else {
            None
        };
        result.push(FindMatch {
            range: buffer.range_at(base_offset + start_units, end_units - start_units),
            matches,
        });
        if result.len() >= limit {
            break;
        }
    }
    Ok(result)
}

fn match_at_byte(
    buffer: &TextBuffer,
    re: &Regex,
    text: &str,
    whole_word: bool,
    capture_matches: bool,
    mut from_byte: usize,
) -> Option<FindMatch> {
    loop {
        let m = re.find_at(text, from_byte)?;
        if m.start() == m.end() {
            if m.end() >= text.len() {
                return None;
            }
            from_byte = match text[m.end()..].chars().next() {
                Some(ch) => m.end() + ch.len_utf8(),
                None => return None,
            };
            continue;
        }
        if whole_word && !is_whole_word(text, m.start(), m.end()) {
            from_byte = m.end();
            continue;
        }
        let start_units = text[..m.start()].encode_utf16().count();
        let len_units = text[m.start()..m.end()].encode_utf16().count();
        let matches = if capture_matches {
            capture_strings(re, text, m.start())
        } else {
            None
        };
        return Some(FindMatch {
            range: buffer.range_at(start_units, len_units),
            matches,
        });
    }
}

/// The next match at or after `position`, wrapping around to the start.
pub(crate) fn find_next_match(
    buffer: &TextBuffer,
    query: &str,
    position: Position,
    is_regex: bool,
    match_case: bool,
    whole_word: bool,
    capture_matches: bool,
) -> Result<Option<FindMatch>, TextModelError> {
    if query.is_empty() {
        return Ok(None);
    }
    let re = compile_query(query, is_regex, match_case)?;
    let text = buffer.value(EndOfLinePreference::TextDefined, false);
    let from_byte = utf16_to_byte(&text, buffer.offset_at(position));

    if let Some(found) = match_at_byte(buffer, &re, &text, whole_word, capture_matches, from_byte)
    {
        return Ok(Some(found));
    }
    // Wrap around.
    Ok(match_at_byte(buffer, &re, &text, whole_word, capture_matches, 0))
}

/// The last match strictly before `position`, wrapping around to the end.
pub(crate) fn find_previous_match(
    buffer: &TextBuffer,
    query: &str,
    position: Position,
    is_regex: bool,
    match_case: bool,
    whole_word: bool,
    capture_matches: bool,
) -> Result<Option<FindMatch>, TextModelError> {
    if query.is_empty() {
        return Ok(None);
    }
    let re = compile_query(query, is_regex, match_case)?;
    let text = buffer.value(EndOfLinePreference::TextDefined, false);
    let limit_byte = utf16_to_byte(&text, buffer.offset_at(position));

    let mut last_before: Option<(usize, usize)> = None;
    let mut last_overall: Option<(usize, usize)> = None;
    for m in re.find_iter(&text) {
        if m.start() == m.end() {
            continue;
        }
        if whole_word && !is_whole_word(&text, m.start(), m.end()) {
            continue;
        }
        if m.start() < limit_byte {
            last_before = Some((m.start(), m.end()));
        }
        last_overall = Some((m.start(), m.end()));
    }

    let hit = last_before.or(last_overall);
    Ok(hit.map(|(start, end)| {
        let start_units = text[..start].encode_utf16().count();
        let len_units = text[start..end].encode_utf16().count();
        let matches = if capture_matches {
            capture_strings(&re, &text, start)
        } else {
            None
        };
        FindMatch {
            range: buffer.range_at(start_units, len_units),
            matches,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_ending::DefaultLineEnding;

    fn buffer(text: &str) -> TextBuffer {
        TextBuffer::from_string(text, DefaultLineEnding::Lf)
    }

    #[test]
    fn test_literal_find_matches() {
        let b = buffer("abc abc\nabc");
        let hits = find_matches(&b, "abc", None, false, true, false, false, 999).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].range, Range::new(1, 1, 1, 4));
        assert_eq!(hits[2].range, Range::new(2, 1, 2, 4));
    }

    #[test]
    fn test_match_case_and_whole_word() {
        let b = buffer("Foo foo food");
        let sensitive = find_matches(&b, "foo", None, false, true, false, false, 999).unwrap();
        assert_eq!(sensitive.len(), 2);

        let insensitive = find_matches(&b, "foo", None, false, false, false, false, 999).unwrap();
        assert_eq!(insensitive.len(), 3);

        let whole = find_matches(&b, "foo", None, false, true, true, false, 999).unwrap();
        assert_eq!(whole.len(), 1);
        assert_eq!(whole[0].range, Range::new(1, 5, 1, 8));
    }

    #[test]
    fn test_regex_with_captures() {
        let b = buffer("let x = 10;\nlet y = 20;");
        let hits =
            find_matches(&b, r"let (\w+)", None, true, true, false, true, 999).unwrap();
        assert_eq!(hits.len(), 2);
        let caps = hits[1].matches.as_ref().unwrap();
        assert_eq!(caps[1], "y");
    }

    #[test]
    fn test_limit_caps_results() {
        let b = buffer(&"x ".repeat(50));
        let hits = find_matches(&b, "x", None, false, true, false, false, 10).unwrap();
        assert_eq!(hits.len(), 10);
    }

    #[test]
    fn test_scope_restricts_search() {
        let b = buffer("aa\naa\naa");
        let hits = find_matches(
            &b,
            "aa",
            Some(Range::new(2, 1, 3, 1)),
            false,
            true,
            false,
            false,
            999,
        )
        .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].range, Range::new(2, 1, 2, 3));
    }

    #[test]
    fn test_find_next_wraps_around() {
        let b = buffer("one two one");
        let hit = find_next_match(&b, "one", Position::new(1, 5), false, true, false, false)
            .unwrap()
            .unwrap();
        assert_eq!(hit.range, Range::new(1, 9, 1, 12));

        let wrapped = find_next_match(&b, "two", Position::new(1, 9), false, true, false, false)
            .unwrap()
            .unwrap();
        assert_eq!(wrapped.range, Range::new(1, 5, 1, 8));
    }

    #[test]
    fn test_find_previous_wraps_around() {
        let b = buffer("one two one");
        let hit =
            find_previous_match(&b, "one", Position::new(1, 9), false, true, false, false)
                .unwrap()
                .unwrap();
        assert_eq!(hit.range, Range::new(1, 1, 1, 4));

        let wrapped =
            find_previous_match(&b, "two", Position::new(1, 1), false, true, false, false)
                .unwrap()
                .unwrap();
        assert_eq!(wrapped.range, Range::new(1, 5, 1, 8));
    }

    #[test]
    fn test_invalid_regex_is_an_error() {
        let b = buffer("x");
        assert!(matches!(
            find_matches(&b, "([", None, true, true, false, false, 999),
            Err(TextModelError::InvalidSearchPattern(_))
        ));
    }

    #[test]
    fn test_offsets_are_utf16_aware() {
        let b = buffer("\u{1F600}abc");
        let hits = find_matches(&b, "abc", None, false, true, false, false, 999).unwrap();
        assert_eq!(hits[0].range, Range::new(1, 3, 1, 6));
    }
}
