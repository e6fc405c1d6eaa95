//! Word-at-position queries.
//!
//! The word pattern comes from the language configuration (or the default
//! pattern); it is matched against a substring of the line — the maximal
//! span of same-language tokens around the cursor — so embedded languages
//! resolve words with their own rules.

use crate::buffer::utf16_len;
use regex::Regex;

/// The word covering (or touching) a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordAtPosition {
    /// The word text.
    pub word: String,
    /// 1-based column of the word's first character.
    pub start_column: usize,
    /// 1-based column just past the word's last character.
    pub end_column: usize,
}

/// Find the word in `text` covering `column`.
///
/// `text` starts at 1-based column `text_start_column` of its line; the
/// match must satisfy `start_column <= column <= end_column`.
pub(crate) fn get_word_at_text(
    column: usize,
    word_pattern: &Regex,
    text: &str,
    text_start_column: usize,
) -> Option<WordAtPosition> {
    let mut units_before = 0usize;
    let mut cursor_byte = 0usize;
    for m in word_pattern.find_iter(text) {
        units_before += utf16_len(&text[cursor_byte..m.start()]);
        cursor_byte = m.start();
        let start_column = text_start_column + units_before;
        let end_column = start_column + utf16_len(m.as_str());
        if start_column <= column && column <= end_column {
            return Some(WordAtPosition {
                word: m.as_str().to_string(),
                start_column,
                end_column,
            });
        }
        if start_column > column {
            return None;
        }
        units_before += utf16_len(m.as_str());
        cursor_byte = m.end();
    }
    None
}

/// The prefix of the word at `column`, truncated at the cursor. Falls back
/// to an empty word anchored at the cursor when there is none.
pub(crate) fn get_word_until_column(
    column: usize,
    word_pattern: &Regex,
    text: &str,
    text_start_column: usize,
) -> WordAtPosition {
    match get_word_at_text(column, word_pattern, text, text_start_column) {
        Some(word) => {
            let keep_units = column - word.start_column;
            let mut truncated = String::new();
            let mut units = 0usize;
            for ch in word.word.chars() {
                if units >= keep_units {
                    break;
                }
                units += ch.len_utf16();
                truncated.push(ch);
            }
            WordAtPosition {
                word: truncated,
                start_column: word.start_column,
                end_column: column,
            }
        }
        None => WordAtPosition {
            word: String::new(),
            start_column: column,
            end_column: column,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use text_model_lang::default_word_pattern;

    #[test]
    fn test_word_at_cursor() {
        let re = default_word_pattern();
        let word = get_word_at_text(7, &re, "hello world", 1).unwrap();
        assert_eq!(word.word, "world");
        assert_eq!(word.start_column, 7);
        assert_eq!(word.end_column, 12);
    }

    #[test]
    fn test_word_boundaries_are_inclusive() {
        let re = default_word_pattern();
        // Column 6 touches the end of "hello".
        let word = get_word_at_text(6, &re, "hello world", 1).unwrap();
        assert_eq!(word.word, "hello");
        // Column 12 touches the end of "world".
        let word = get_word_at_text(12, &re, "hello world", 1).unwrap();
        assert_eq!(word.word, "world");
    }

    #[test]
    fn test_no_word_between_separators() {
        let re = default_word_pattern();
        assert!(get_word_at_text(4, &re, "a   b", 1).is_none());
    }

    #[test]
    fn test_offset_substring() {
        let re = default_word_pattern();
        // Text spans columns 5.. of its line.
        let word = get_word_at_text(7, &re, "abc def", 5).unwrap();
        assert_eq!(word.word, "abc");
        assert_eq!(word.start_column, 5);
        assert_eq!(word.end_column, 8);
    }

    #[test]
    fn test_word_until_column() {
        let re = default_word_pattern();
        let word = get_word_until_column(9, &re, "hello world", 1);
        assert_eq!(word.word, "wo");
        assert_eq!(word.start_column, 7);
        assert_eq!(word.end_column, 9);

        let empty = get_word_until_column(4, &re, "a   b", 1);
        assert_eq!(empty.word, "");
        assert_eq!(empty.start_column, 4);
    }
}
