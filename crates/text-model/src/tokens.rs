//! Line tokens, the tokenizer interface and the incremental token store.
//!
//! Tokenization is lazy and line-oriented. The store keeps, per line, the
//! packed token array and the tokenizer state *before* the line, plus a
//! monotone invalidation frontier: every line before the frontier has
//! trustworthy tokens, everything at or after it may be stale. Edits move
//! the frontier backwards; catch-up (forced or budgeted background work)
//! moves it forward one line at a time, stopping early when a recomputed
//! line state converges with what is already cached downstream.

use crate::events::{TokensChangedEvent, TokensChangedRange};
use std::collections::HashMap;
use std::sync::Arc;
use text_model_lang::LanguageConfiguration;

/// Lines of catch-up still considered "cheap" for synchronous tokenization.
pub(crate) const CHEAP_TOKENIZATION_WINDOW: usize = 4;

/// Wall-clock budget of one background tokenization run.
pub(crate) const BACKGROUND_TOKENIZATION_BUDGET_MS: u64 = 20;

/// Lines tokenized eagerly when a model is first attached to an editor.
pub(crate) const TOKENIZATION_WARM_UP_LINES: usize = 100;

/// Numeric language id as embedded in token metadata (8 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguageId(pub u8);

impl LanguageId {
    /// The null language.
    pub const NULL: LanguageId = LanguageId(0);
    /// Plain text, registered in every [`LanguageRegistry`].
    pub const PLAIN_TEXT: LanguageId = LanguageId(1);
}

/// A language: its registry name plus its numeric id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageIdentifier {
    /// Registry name, e.g. `"plaintext"`.
    pub name: String,
    /// Numeric id used in token metadata.
    pub id: LanguageId,
}

/// Coarse token classification carried in metadata bits 8–10.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardTokenType {
    /// Source code.
    Other = 0,
    /// A comment.
    Comment = 1,
    /// A string literal.
    String = 2,
    /// A regular expression literal.
    RegEx = 3,
}

impl StandardTokenType {
    fn from_bits(bits: u32) -> Self {
        match bits {
            1 => Self::Comment,
            2 => Self::String,
            3 => Self::RegEx,
            _ => Self::Other,
        }
    }
}

/// Bit layout of the 32-bit token metadata word.
///
/// | bits  | field            |
/// |-------|------------------|
/// | 0–7   | language id      |
/// | 8–10  | token type       |
/// | 11–13 | font style       |
/// | 14–22 | foreground color |
/// | 23–31 | background color |
pub struct TokenMetadata;

impl TokenMetadata {
    const LANGUAGE_ID_OFFSET: u32 = 0;
    const TOKEN_TYPE_OFFSET: u32 = 8;
    const FONT_STYLE_OFFSET: u32 = 11;
    const FOREGROUND_OFFSET: u32 = 14;
    const BACKGROUND_OFFSET: u32 = 23;

    /// Pack a metadata word.
    pub fn pack(
        language_id: LanguageId,
        token_type: StandardTokenType,
        font_style: u8,
        foreground: u16,
        background: u16,
    ) -> u32 {
        ((language_id.0 as u32) << Self::LANGUAGE_ID_OFFSET)
            | ((token_type as u32) << Self::TOKEN_TYPE_OFFSET)
            | (((font_style & 0b111) as u32) << Self::FONT_STYLE_OFFSET)
            | (((foreground & 0x1FF) as u32) << Self::FOREGROUND_OFFSET)
            | (((background & 0x1FF) as u32) << Self::BACKGROUND_OFFSET)
    }

    /// The metadata of a default-styled token in `language_id`.
    pub fn default_for(language_id: LanguageId) -> u32 {
        Self::pack(language_id, StandardTokenType::Other, 0, 0, 0)
    }

    /// Extract the language id.
    pub fn language_id(metadata: u32) -> LanguageId {
        LanguageId(((metadata >> Self::LANGUAGE_ID_OFFSET) & 0xFF) as u8)
    }

    /// Extract the token type.
    pub fn token_type(metadata: u32) -> StandardTokenType {
        StandardTokenType::from_bits((metadata >> Self::TOKEN_TYPE_OFFSET) & 0b111)
    }

    /// Brackets inside comments, strings and regexes do not participate in
    /// bracket matching.
    pub fn ignore_brackets_in_token(metadata: u32) -> bool {
        Self::token_type(metadata) != StandardTokenType::Other
    }
}

/// One token: its start offset within the line (UTF-16 units) plus packed
/// metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Start offset within the line.
    pub start_offset: u32,
    /// Packed metadata ([`TokenMetadata`]).
    pub metadata: u32,
}

impl Token {
    /// Convenience constructor.
    pub fn new(start_offset: u32, metadata: u32) -> Self {
        Self {
            start_offset,
            metadata,
        }
    }
}

/// Opaque, comparable tokenizer state at a line boundary.
pub trait TokenizerState: std::fmt::Debug {
    /// Clone into a new box.
    fn clone_state(&self) -> Box<dyn TokenizerState>;
    /// Structural equality against another state.
    fn equals(&self, other: &dyn TokenizerState) -> bool;
    /// Downcast support for [`equals`](Self::equals) implementations.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// The result of tokenizing one line.
pub struct TokenizedLine {
    /// Tokens in ascending start order; the store normalizes coverage so the
    /// first token starts at offset 0.
    pub tokens: Vec<Token>,
    /// The state after the line's trailing edge.
    pub end_state: Box<dyn TokenizerState>,
}

/// A grammar engine. The model never inspects states or token rules; it
/// only threads states from line to line.
pub trait Tokenizer {
    /// The state before the first line.
    fn initial_state(&self) -> Box<dyn TokenizerState>;
    /// Tokenize one line (no trailing newline) from `state`.
    fn tokenize_line(&self, line: &str, state: &dyn TokenizerState) -> TokenizedLine;
}

/// Registry of languages: configuration plus an optional tokenizer each.
///
/// Hosts populate the registry up front and hand it to models; ids are
/// assigned in registration order starting after
/// [`LanguageId::PLAIN_TEXT`].
pub struct LanguageRegistry {
    languages: Vec<(LanguageIdentifier, LanguageConfiguration)>,
    tokenizers: HashMap<u8, Arc<dyn Tokenizer>>,
}

impl LanguageRegistry {
    /// A registry holding only plain text.
    pub fn new() -> Self {
        Self {
            languages: vec![(
                LanguageIdentifier {
                    name: "plaintext".to_string(),
                    id: LanguageId::PLAIN_TEXT,
                },
                LanguageConfiguration::empty(),
            )],
            tokenizers: HashMap::new(),
        }
    }

    /// Register a language, returning its identifier.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        configuration: LanguageConfiguration,
    ) -> LanguageIdentifier {
        let identifier = LanguageIdentifier {
            name: name.into(),
            id: LanguageId(LanguageId::PLAIN_TEXT.0 + self.languages.len() as u8),
        };
        self.languages.push((identifier.clone(), configuration));
        identifier
    }

    /// Attach a tokenizer to a language.
    pub fn set_tokenizer(&mut self, language: LanguageId, tokenizer: Arc<dyn Tokenizer>) {
        self.tokenizers.insert(language.0, tokenizer);
    }

    /// Look up a language by name.
    pub fn by_name(&self, name: &str) -> Option<LanguageIdentifier> {
        self.languages
            .iter()
            .find(|(ident, _)| ident.name == name)
            .map(|(ident, _)| ident.clone())
    }

    /// The configuration for a language, if registered.
    pub fn configuration(&self, language: LanguageId) -> Option<&LanguageConfiguration> {
        self.languages
            .iter()
            .find(|(ident, _)| ident.id == language)
            .map(|(_, config)| config)
    }

    /// The tokenizer for a language, if any.
    pub fn tokenizer(&self, language: LanguageId) -> Option<Arc<dyn Tokenizer>> {
        self.tokenizers.get(&language.0).cloned()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Read view over one line's tokens.
#[derive(Debug, Clone)]
pub struct LineTokens {
    tokens: Vec<Token>,
    line_length: usize,
}

impl LineTokens {
    fn new(tokens: Vec<Token>, line_length: usize) -> Self {
        debug_assert!(!tokens.is_empty());
        Self {
            tokens,
            line_length,
        }
    }

    /// Build from explicit tokens (ascending start offsets, first at 0).
    /// An empty list becomes a single null-language token.
    pub fn from_tokens(tokens: Vec<Token>, line_length: usize) -> Self {
        if tokens.is_empty() {
            return Self::placeholder(line_length, LanguageId::NULL);
        }
        Self::new(tokens, line_length)
    }

    /// A single default token covering the whole line.
    pub fn placeholder(line_length: usize, language_id: LanguageId) -> Self {
        Self::new(
            vec![Token::new(0, TokenMetadata::default_for(language_id))],
            line_length,
        )
    }

    /// Number of tokens; at least 1.
    pub fn count(&self) -> usize {
        self.tokens.len()
    }

    /// Start offset of token `index`.
    pub fn start_offset(&self, index: usize) -> usize {
        self.tokens[index].start_offset as usize
    }

    /// End offset (exclusive) of token `index`.
    pub fn end_offset(&self, index: usize) -> usize {
        if index + 1 < self.tokens.len() {
            self.tokens[index + 1].start_offset as usize
        } else {
            self.line_length
        }
    }

    /// Packed metadata of token `index`.
    pub fn metadata(&self, index: usize) -> u32 {
        self.tokens[index].metadata
    }

    /// Language of token `index`.
    pub fn language_id(&self, index: usize) -> LanguageId {
        TokenMetadata::language_id(self.tokens[index].metadata)
    }

    /// Standard type of token `index`.
    pub fn standard_token_type(&self, index: usize) -> StandardTokenType {
        TokenMetadata::token_type(self.tokens[index].metadata)
    }

    /// The line length the tokens cover.
    pub fn line_length(&self) -> usize {
        self.line_length
    }

    /// Index of the token containing `offset` (0-based UTF-16 units); an
    /// offset at the line end resolves to the last token.
    pub fn find_token_index_at_offset(&self, offset: usize) -> usize {
        self.tokens
            .partition_point(|t| (t.start_offset as usize) <= offset)
            .saturating_sub(1)
    }
}

/// Accumulates changed-line ranges for one tokens-changed event, merging
/// adjacent lines.
pub(crate) struct TokensChangedEventBuilder {
    ranges: Vec<TokensChangedRange>,
}

impl TokensChangedEventBuilder {
    pub(crate) fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    pub(crate) fn register_changed_tokens(&mut self, line: usize) {
        match self.ranges.last_mut() {
            Some(last) if last.to_line + 1 >= line => {
                last.to_line = last.to_line.max(line);
            }
            _ => self.ranges.push(TokensChangedRange {
                from_line: line,
                to_line: line,
            }),
        }
    }

    pub(crate) fn build(self) -> Option<TokensChangedEvent> {
        if self.ranges.is_empty() {
            None
        } else {
            Some(TokensChangedEvent {
                ranges: self.ranges,
            })
        }
    }
}

struct StoredLine {
    /// Packed `(start, metadata)` pairs; `None` when never tokenized or
    /// explicitly invalidated.
    tokens: Option<Box<[u32]>>,
    /// Tokenizer state before this line.
    begin_state: Option<Box<dyn TokenizerState>>,
}

impl StoredLine {
    fn blank() -> Self {
        Self {
            tokens: None,
            begin_state: None,
        }
    }
}

/// The per-model token cache and invalidation frontier.
pub(crate) struct TokensStore {
    lines: Vec<StoredLine>,
    /// 0-based index of the first line whose cached tokens may be stale.
    invalid_line_start_index: usize,
    /// Cleared by the too-large guard: the store then only ever serves
    /// placeholders.
    enabled: bool,
}

impl TokensStore {
    pub(crate) fn new(line_count: usize, enabled: bool) -> Self {
        Self {
            lines: (0..line_count).map(|_| StoredLine::blank()).collect(),
            invalid_line_start_index: 0,
            enabled,
        }
    }

    /// Wipe everything (language switch, registry signal, set-value).
    pub(crate) fn reset(&mut self, line_count: usize) {
        self.lines = (0..line_count).map(|_| StoredLine::blank()).collect();
        self.invalid_line_start_index = 0;
    }

    /// 1-based first line whose tokens may be stale.
    pub(crate) fn first_invalid_line(&self) -> usize {
        self.invalid_line_start_index + 1
    }

    pub(crate) fn has_lines_to_tokenize(&self, line_count: usize) -> bool {
        self.enabled && self.invalid_line_start_index < line_count
    }

    pub(crate) fn is_cheap_to_tokenize(&self, line: usize) -> bool {
        if !self.enabled {
            return true;
        }
        line <= self.first_invalid_line() + CHEAP_TOKENIZATION_WINDOW
    }

    /// Patch the cache for one atomic content change: the changed range
    /// `start_line..=end_line` collapses onto its first line, which is
    /// invalidated, and `inserted_line_count - 1` blank lines follow it.
    pub(crate) fn apply_edit(
        &mut self,
        start_line: usize,
        end_line: usize,
        inserted_line_count: usize,
    ) {
        let start_idx = start_line - 1;
        self.lines[start_idx].tokens = None;
        self.lines.splice(
            start_idx + 1..end_line,
            (1..inserted_line_count).map(|_| StoredLine::blank()),
        );
        self.invalid_line_start_index = self.invalid_line_start_index.min(start_idx);
    }

    /// Whether `line` (1-based) currently has trustworthy tokens.
    fn is_line_valid(&self, line: usize) -> bool {
        let idx = line - 1;
        idx < self.invalid_line_start_index
            && self
                .lines
                .get(idx)
                .is_some_and(|l| l.tokens.is_some())
    }

    /// Tokens for `line`, falling back to a single placeholder token in
    /// `default_language` when the line has no trustworthy tokens yet.
    pub(crate) fn get_tokens(
        &self,
        line: usize,
        line_length: usize,
        default_language: LanguageId,
    ) -> LineTokens {
        if self.enabled && self.is_line_valid(line) {
            if let Some(packed) = &self.lines[line - 1].tokens {
                let tokens = packed
                    .chunks_exact(2)
                    .map(|pair| Token::new(pair[0], pair[1]))
                    .collect();
                return LineTokens::new(tokens, line_length);
            }
        }
        LineTokens::placeholder(line_length, default_language)
    }

    /// Tokenize the first invalid line. Returns `false` when nothing was
    /// pending.
    pub(crate) fn tokenize_one_line(
        &mut self,
        line_contents: &dyn Fn(usize) -> String,
        tokenizer: &dyn Tokenizer,
        default_language: LanguageId,
        event_builder: &mut TokensChangedEventBuilder,
    ) -> bool {
        if !self.has_lines_to_tokenize(self.lines.len()) {
            return false;
        }

        let idx = self.invalid_line_start_index;
        if self.lines[idx].begin_state.is_none() {
            debug_assert!(idx == 0, "interior line lost its begin state");
            self.lines[idx].begin_state = Some(tokenizer.initial_state());
        }

        let text = line_contents(idx + 1);
        let result = match self.lines[idx].begin_state.as_deref() {
            Some(state) => tokenizer.tokenize_line(&text, state),
            None => return false,
        };

        let mut tokens = result.tokens;
        if tokens.is_empty() || tokens[0].start_offset != 0 {
            // Guarantee full coverage from offset 0.
            tokens.insert(0, Token::new(0, TokenMetadata::default_for(default_language)));
        }
        let mut packed = Vec::with_capacity(tokens.len() * 2);
        for token in &tokens {
            packed.push(token.start_offset);
            packed.push(token.metadata);
        }
        self.lines[idx].tokens = Some(packed.into_boxed_slice());
        event_builder.register_changed_tokens(idx + 1);

        if idx + 1 < self.lines.len() {
            let converged = self.lines[idx + 1]
                .begin_state
                .as_deref()
                .is_some_and(|s| s.equals(&*result.end_state))
                && self.lines[idx + 1].tokens.is_some();
            if converged {
                // Downstream lines were tokenized from this very state over
                // unchanged text; skip ahead to the next hole.
                let mut next = idx + 1;
                while next < self.lines.len() && self.lines[next].tokens.is_some() {
                    next += 1;
                }
                self.invalid_line_start_index = next;
            } else {
                self.lines[idx + 1].begin_state = Some(result.end_state);
                self.invalid_line_start_index = idx + 1;
            }
        } else {
            self.invalid_line_start_index = idx + 1;
        }
        true
    }

    /// Synchronous catch-up through `line` (1-based, inclusive).
    pub(crate) fn update_tokens_until_line(
        &mut self,
        line_contents: &dyn Fn(usize) -> String,
        tokenizer: &dyn Tokenizer,
        default_language: LanguageId,
        event_builder: &mut TokensChangedEventBuilder,
        line: usize,
    ) {
        if !self.enabled {
            return;
        }
        while self.invalid_line_start_index < line {
            if !self.tokenize_one_line(line_contents, tokenizer, default_language, event_builder) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts how many `{` minus `}` were seen; enough state to observe
    /// convergence behavior.
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct DepthState(i32);

    impl TokenizerState for DepthState {
        fn clone_state(&self) -> Box<dyn TokenizerState> {
            Box::new(self.clone())
        }
        fn equals(&self, other: &dyn TokenizerState) -> bool {
            other
                .as_any()
                .downcast_ref::<DepthState>()
                .is_some_and(|o| o == self)
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    struct DepthTokenizer;

    impl Tokenizer for DepthTokenizer {
        fn initial_state(&self) -> Box<dyn TokenizerState> {
            Box::new(DepthState(0))
        }
        fn tokenize_line(&self, line: &str, state: &dyn TokenizerState) -> TokenizedLine {
            let mut depth = state
                .as_any()
                .downcast_ref::<DepthState>()
                .map(|s| s.0)
                .unwrap_or(0);
            for ch in line.chars() {
                match ch {
                    '{' => depth += 1,
                    '}' => depth -= 1,
                    _ => {}
                }
            }
            TokenizedLine {
                tokens: vec![Token::new(0, TokenMetadata::default_for(LanguageId(2)))],
                end_state: Box::new(DepthState(depth)),
            }
        }
    }

    fn lines_fn(lines: &'static [&'static str]) -> impl Fn(usize) -> String {
        move |n| lines[n - 1].to_string()
    }

    #[test]
    fn test_metadata_round_trip() {
        let meta = TokenMetadata::pack(LanguageId(7), StandardTokenType::String, 2, 33, 1);
        assert_eq!(TokenMetadata::language_id(meta), LanguageId(7));
        assert_eq!(TokenMetadata::token_type(meta), StandardTokenType::String);
        assert!(TokenMetadata::ignore_brackets_in_token(meta));

        let plain = TokenMetadata::default_for(LanguageId(3));
        assert!(!TokenMetadata::ignore_brackets_in_token(plain));
    }

    #[test]
    fn test_line_tokens_lookup() {
        let tokens = LineTokens::new(
            vec![
                Token::new(0, TokenMetadata::default_for(LanguageId(1))),
                Token::new(4, TokenMetadata::default_for(LanguageId(1))),
                Token::new(9, TokenMetadata::default_for(LanguageId(1))),
            ],
            12,
        );
        assert_eq!(tokens.find_token_index_at_offset(0), 0);
        assert_eq!(tokens.find_token_index_at_offset(3), 0);
        assert_eq!(tokens.find_token_index_at_offset(4), 1);
        assert_eq!(tokens.find_token_index_at_offset(12), 2);
        assert_eq!(tokens.end_offset(1), 9);
        assert_eq!(tokens.end_offset(2), 12);
    }

    #[test]
    fn test_store_tokenizes_in_order_and_serves_placeholders() {
        let contents = lines_fn(&["{", "x", "}"]);
        let mut store = TokensStore::new(3, true);
        let tokenizer = DepthTokenizer;

        assert_eq!(
            store.get_tokens(1, 1, LanguageId::PLAIN_TEXT).count(),
            1,
            "placeholder before tokenization"
        );
        assert_eq!(
            store
                .get_tokens(1, 1, LanguageId::PLAIN_TEXT)
                .language_id(0),
            LanguageId::PLAIN_TEXT
        );

        let mut builder = TokensChangedEventBuilder::new();
        store.update_tokens_until_line(&contents, &tokenizer, LanguageId(2), &mut builder, 3);
        assert!(!store.has_lines_to_tokenize(3));
        assert_eq!(store.get_tokens(2, 1, LanguageId::PLAIN_TEXT).language_id(0), LanguageId(2));

        let event = builder.build().unwrap();
        assert_eq!(
            event.ranges,
            vec![TokensChangedRange {
                from_line: 1,
                to_line: 3
            }]
        );
    }

    #[test]
    fn test_edit_invalidates_from_start_line() {
        let contents = lines_fn(&["{", "x", "}"]);
        let mut store = TokensStore::new(3, true);
        let tokenizer = DepthTokenizer;
        let mut builder = TokensChangedEventBuilder::new();
        store.update_tokens_until_line(&contents, &tokenizer, LanguageId(2), &mut builder, 3);

        // Single-line change on line 2.
        store.apply_edit(2, 2, 1);
        assert_eq!(store.first_invalid_line(), 2);
        assert!(store.has_lines_to_tokenize(3));
        // Line 1 stays valid, line 2 is a placeholder again.
        assert_eq!(store.get_tokens(1, 1, LanguageId::NULL).language_id(0), LanguageId(2));
        assert_eq!(
            store.get_tokens(2, 1, LanguageId::NULL).language_id(0),
            LanguageId::NULL
        );
    }

    #[test]
    fn test_convergence_fast_forwards_frontier() {
        let contents = lines_fn(&["a", "b", "c", "d"]);
        let mut store = TokensStore::new(4, true);
        let tokenizer = DepthTokenizer;
        let mut builder = TokensChangedEventBuilder::new();
        store.update_tokens_until_line(&contents, &tokenizer, LanguageId(2), &mut builder, 4);

        // Change line 1 without changing the depth state: retokenizing line
        // 1 converges with line 2's stored state and skips to the end.
        store.apply_edit(1, 1, 1);
        assert_eq!(store.first_invalid_line(), 1);
        let mut builder = TokensChangedEventBuilder::new();
        assert!(store.tokenize_one_line(&contents, &tokenizer, LanguageId(2), &mut builder));
        assert!(!store.has_lines_to_tokenize(4), "frontier fast-forwarded");
    }

    #[test]
    fn test_state_change_invalidates_downstream() {
        let contents = lines_fn(&["{", "b", "c"]);
        let mut store = TokensStore::new(3, true);
        let tokenizer = DepthTokenizer;
        let mut builder = TokensChangedEventBuilder::new();
        // Tokenize with different first line ("a": depth 0), then swap in
        // "{" and observe downstream invalidation.
        let initial = lines_fn(&["a", "b", "c"]);
        store.update_tokens_until_line(&initial, &tokenizer, LanguageId(2), &mut builder, 3);

        store.apply_edit(1, 1, 1);
        let mut builder = TokensChangedEventBuilder::new();
        assert!(store.tokenize_one_line(&contents, &tokenizer, LanguageId(2), &mut builder));
        // Depth after line 1 is now 1 != stored 0: the frontier advances one
        // line only.
        assert_eq!(store.first_invalid_line(), 2);
        assert!(store.has_lines_to_tokenize(3));
    }

    #[test]
    fn test_disabled_store_serves_placeholders_only() {
        let mut store = TokensStore::new(2, false);
        assert!(!store.has_lines_to_tokenize(2));
        assert!(store.is_cheap_to_tokenize(2));
        let mut builder = TokensChangedEventBuilder::new();
        store.update_tokens_until_line(
            &lines_fn(&["a", "b"]),
            &DepthTokenizer,
            LanguageId(2),
            &mut builder,
            2,
        );
        assert!(builder.build().is_none());
    }

    #[test]
    fn test_event_builder_merges_adjacent_lines() {
        let mut builder = TokensChangedEventBuilder::new();
        builder.register_changed_tokens(1);
        builder.register_changed_tokens(2);
        builder.register_changed_tokens(5);
        let event = builder.build().unwrap();
        assert_eq!(
            event.ranges,
            vec![
                TokensChangedRange {
                    from_line: 1,
                    to_line: 2
                },
                TokensChangedRange {
                    from_line: 5,
                    to_line: 5
                },
            ]
        );
    }
}
