#![warn(missing_docs)]
//! `text-model-simple-tokens` - simple (regex-rule) tokenizer for
//! `text-model`.
//!
//! This crate is intended for lightweight formats (JSON/INI/etc.) where a
//! full grammar engine is unnecessary. It implements the kernel's
//! [`Tokenizer`] interface with a list of per-line regex rules plus
//! optional block-comment delimiters, which give the tokenizer real
//! cross-line state.

use regex::Regex;
use text_model::{
    LanguageId, StandardTokenType, Token, TokenMetadata, TokenizedLine, Tokenizer, TokenizerState,
};

/// A single regex tokenization rule.
#[derive(Debug, Clone)]
pub struct TokenRule {
    regex: Regex,
    token_type: StandardTokenType,
    foreground: u16,
}

impl TokenRule {
    /// Create a rule classifying every match of `pattern`.
    pub fn new(
        pattern: &str,
        token_type: StandardTokenType,
        foreground: u16,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            token_type,
            foreground,
        })
    }

    /// The rule's token type.
    pub fn token_type(&self) -> StandardTokenType {
        self.token_type
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SimpleState {
    in_block_comment: bool,
}

impl TokenizerState for SimpleState {
    fn clone_state(&self) -> Box<dyn TokenizerState> {
        Box::new(self.clone())
    }

    fn equals(&self, other: &dyn TokenizerState) -> bool {
        other
            .as_any()
            .downcast_ref::<SimpleState>()
            .is_some_and(|o| o == self)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// A regex-rule tokenizer.
///
/// Rules run left-to-right per line; earlier matches win, ties go to the
/// earlier rule. Regions not claimed by any rule become default tokens.
/// When block-comment delimiters are configured, comment regions override
/// the rules and may span lines.
#[derive(Debug, Clone)]
pub struct SimpleTokenizer {
    language: LanguageId,
    rules: Vec<TokenRule>,
    block_comment: Option<(String, String)>,
    comment_foreground: u16,
}

impl SimpleTokenizer {
    /// Create a tokenizer emitting tokens tagged with `language`.
    pub fn new(language: LanguageId, rules: Vec<TokenRule>) -> Self {
        Self {
            language,
            rules,
            block_comment: None,
            comment_foreground: 0,
        }
    }

    /// Add block-comment delimiters (e.g. `/*` and `*/`).
    pub fn with_block_comment(
        mut self,
        start: impl Into<String>,
        end: impl Into<String>,
        foreground: u16,
    ) -> Self {
        self.block_comment = Some((start.into(), end.into()));
        self.comment_foreground = foreground;
        self
    }

    /// A small default JSON grammar (strings, numbers, keywords).
    pub fn json_default(language: LanguageId) -> Result<Self, regex::Error> {
        Ok(Self::new(
            language,
            vec![
                TokenRule::new(r#""(?:\\.|[^"\\])*""#, StandardTokenType::String, 1)?,
                TokenRule::new(
                    r"-?(?:0|[1-9]\d*)(?:\.\d+)?(?:[eE][+-]?\d+)?",
                    StandardTokenType::Other,
                    2,
                )?,
                TokenRule::new(r"\b(?:true|false|null)\b", StandardTokenType::Other, 3)?,
            ],
        ))
    }

    /// A small default INI grammar (sections, keys, comments).
    pub fn ini_default(language: LanguageId) -> Result<Self, regex::Error> {
        Ok(Self::new(
            language,
            vec![
                TokenRule::new(r"^\s*\[[^\]]+\]\s*$", StandardTokenType::Other, 1)?,
                TokenRule::new(r"^\s*[;#].*$", StandardTokenType::Comment, 2)?,
                TokenRule::new(r#""(?:\\.|[^"\\])*""#, StandardTokenType::String, 3)?,
            ],
        ))
    }

    /// Classified byte spans for one line, non-overlapping and ascending.
    fn classified_spans(&self, line: &str, from_byte: usize) -> Vec<(usize, usize, StandardTokenType, u16)> {
        let mut spans: Vec<(usize, usize, StandardTokenType, u16)> = Vec::new();
        for rule in &self.rules {
            for m in rule.regex.find_iter(&line[from_byte..]) {
                if m.start() == m.end() {
                    continue;
                }
                spans.push((
                    from_byte + m.start(),
                    from_byte + m.end(),
                    rule.token_type,
                    rule.foreground,
                ));
            }
        }
        spans.sort_by_key(|&(start, end, _, _)| (start, end));
        let mut result: Vec<(usize, usize, StandardTokenType, u16)> = Vec::new();
        for span in spans {
            if result.last().is_none_or(|last| last.1 <= span.0) {
                result.push(span);
            }
        }
        result
    }
}

impl Tokenizer for SimpleTokenizer {
    fn initial_state(&self) -> Box<dyn TokenizerState> {
        Box::new(SimpleState {
            in_block_comment: false,
        })
    }

    fn tokenize_line(&self, line: &str, state: &dyn TokenizerState) -> TokenizedLine {
        let mut in_comment = state
            .as_any()
            .downcast_ref::<SimpleState>()
            .map(|s| s.in_block_comment)
            .unwrap_or(false);

        // Byte spans first, converted to UTF-16 offsets at the end.
        let mut spans: Vec<(usize, StandardTokenType, u16)> = Vec::new();
        let mut cursor = 0usize;
        let push_default = |spans: &mut Vec<(usize, StandardTokenType, u16)>, at: usize| {
            if spans.last().map(|s| s.0) != Some(at) {
                spans.push((at, StandardTokenType::Other, 0));
            }
        };

        while cursor < line.len() {
            if in_comment {
                let end_token = self
                    .block_comment
                    .as_ref()
                    .map(|(_, end)| end.as_str())
                    .unwrap_or("");
                spans.push((cursor, StandardTokenType::Comment, self.comment_foreground));
                match line[cursor..].find(end_token).filter(|_| !end_token.is_empty()) {
                    Some(found) => {
                        cursor += found + end_token.len();
                        in_comment = false;
                    }
                    None => {
                        cursor = line.len();
                    }
                }
                continue;
            }

            let comment_start = self
                .block_comment
                .as_ref()
                .and_then(|(start, _)| line[cursor..].find(start.as_str()).map(|i| (cursor + i, start.len())));

            let segment_end = comment_start.map(|(at, _)| at).unwrap_or(line.len());
            // Rule-classified spans between here and the next comment.
            let mut last = cursor;
            for (start, end, token_type, foreground) in self.classified_spans(line, cursor) {
                if start >= segment_end {
                    break;
                }
                let end = end.min(segment_end);
                if start > last {
                    push_default(&mut spans, last);
                }
                spans.push((start, token_type, foreground));
                last = end;
            }
            if last < segment_end {
                push_default(&mut spans, last);
            }

            match comment_start {
                Some((at, start_len)) => {
                    cursor = at + start_len;
                    // The comment token itself begins at the delimiter.
                    spans.push((at, StandardTokenType::Comment, self.comment_foreground));
                    in_comment = true;
                    match self.block_comment.as_ref().and_then(|(_, end)| {
                        line[cursor..].find(end.as_str()).map(|i| cursor + i + end.len())
                    }) {
                        Some(after_end) => {
                            cursor = after_end;
                            in_comment = false;
                        }
                        None => {
                            cursor = line.len();
                        }
                    }
                }
                None => {
                    cursor = line.len();
                }
            }
        }

        // Byte → UTF-16 conversion, deduplicating empty leading spans.
        let mut tokens = Vec::with_capacity(spans.len().max(1));
        let mut walked_bytes = 0usize;
        let mut walked_units = 0usize;
        for (byte_start, token_type, foreground) in spans {
            walked_units += line[walked_bytes..byte_start].encode_utf16().count();
            walked_bytes = byte_start;
            let metadata =
                TokenMetadata::pack(self.language, token_type, 0, foreground, 0);
            if tokens
                .last()
                .map(|t: &Token| t.start_offset as usize == walked_units)
                .unwrap_or(false)
            {
                tokens.pop();
            }
            tokens.push(Token::new(walked_units as u32, metadata));
        }
        if tokens.is_empty() {
            tokens.push(Token::new(0, TokenMetadata::default_for(self.language)));
        }

        TokenizedLine {
            tokens,
            end_state: Box::new(SimpleState {
                in_block_comment: in_comment,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang() -> LanguageId {
        LanguageId(5)
    }

    fn types_of(line: &str, tokenizer: &SimpleTokenizer) -> Vec<(usize, StandardTokenType)> {
        let result = tokenizer.tokenize_line(line, tokenizer.initial_state().as_ref());
        result
            .tokens
            .iter()
            .map(|t| (t.start_offset as usize, TokenMetadata::token_type(t.metadata)))
            .collect()
    }

    #[test]
    fn test_json_strings_and_numbers() {
        let tokenizer = SimpleTokenizer::json_default(lang()).unwrap();
        let types = types_of(r#"{"a": 12}"#, &tokenizer);
        assert_eq!(
            types,
            vec![
                (0, StandardTokenType::Other),
                (1, StandardTokenType::String),
                (4, StandardTokenType::Other),
                (6, StandardTokenType::Other),
                (8, StandardTokenType::Other),
            ]
        );
    }

    #[test]
    fn test_tokens_carry_language_id() {
        let tokenizer = SimpleTokenizer::json_default(lang()).unwrap();
        let result = tokenizer.tokenize_line("1", tokenizer.initial_state().as_ref());
        assert_eq!(TokenMetadata::language_id(result.tokens[0].metadata), lang());
    }

    #[test]
    fn test_block_comment_state_spans_lines() {
        let tokenizer =
            SimpleTokenizer::new(lang(), Vec::new()).with_block_comment("/*", "*/", 4);

        let first = tokenizer.tokenize_line("a /* b", tokenizer.initial_state().as_ref());
        let mid = tokenizer.tokenize_line("still comment", first.end_state.as_ref());
        let last = tokenizer.tokenize_line("done */ code", mid.end_state.as_ref());
        let after = tokenizer.tokenize_line("plain", last.end_state.as_ref());

        assert_eq!(
            TokenMetadata::token_type(mid.tokens[0].metadata),
            StandardTokenType::Comment
        );
        assert_eq!(
            TokenMetadata::token_type(last.tokens[0].metadata),
            StandardTokenType::Comment
        );
        assert_eq!(
            TokenMetadata::token_type(after.tokens[0].metadata),
            StandardTokenType::Other
        );

        // States before and after the comment differ; equal states compare
        // equal (the store's convergence check relies on this).
        assert!(first.end_state.equals(mid.end_state.as_ref()));
        assert!(!mid.end_state.equals(last.end_state.as_ref()));
    }

    #[test]
    fn test_non_ascii_offsets_are_utf16() {
        let tokenizer = SimpleTokenizer::json_default(lang()).unwrap();
        // The emoji weighs 2 UTF-16 units, so the string starts at unit 3.
        let result = tokenizer.tokenize_line("\u{1F600} \"x\"", tokenizer.initial_state().as_ref());
        let string_token = result
            .tokens
            .iter()
            .find(|t| TokenMetadata::token_type(t.metadata) == StandardTokenType::String)
            .unwrap();
        assert_eq!(string_token.start_offset, 3);
    }
}
