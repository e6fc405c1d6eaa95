#![warn(missing_docs)]
//! `text-model-lang` - data-driven language configuration for `text-model`.
//!
//! This crate intentionally stays lightweight and does **not** depend on any
//! tokenizer or parsing system. It provides the small, declarative pieces the
//! text-model kernel needs to be language-aware:
//!
//! - bracket pairs (for bracket matching)
//! - a word pattern (for word-at-position queries)
//! - the off-side flag (for indent guides on blank lines)

use regex::Regex;

/// A matching open/close bracket pair, e.g. `(` / `)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketPair {
    /// The opening text of the pair.
    pub open: String,
    /// The closing text of the pair.
    pub close: String,
}

impl BracketPair {
    /// Create a bracket pair.
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

/// Declarative configuration for a single language.
///
/// Hosts register one of these per language; the kernel only reads it.
#[derive(Debug, Clone)]
pub struct LanguageConfiguration {
    /// Bracket pairs used by bracket matching. Order is irrelevant.
    pub brackets: Vec<BracketPair>,
    /// Word pattern used by word-at-position queries. `None` means the
    /// default word pattern.
    pub word_pattern: Option<Regex>,
    /// Whether the language follows the off-side rule (indentation defines
    /// blocks, e.g. Python). Affects indent guides on blank lines.
    pub off_side: bool,
}

impl LanguageConfiguration {
    /// A configuration with no brackets and the default word pattern.
    pub fn empty() -> Self {
        Self {
            brackets: Vec::new(),
            word_pattern: None,
            off_side: false,
        }
    }

    /// A configuration with the usual `()`, `[]`, `{}` pairs.
    pub fn with_default_brackets() -> Self {
        Self {
            brackets: vec![
                BracketPair::new("(", ")"),
                BracketPair::new("[", "]"),
                BracketPair::new("{", "}"),
            ],
            word_pattern: None,
            off_side: false,
        }
    }

    /// Set the word pattern.
    pub fn word_pattern(mut self, pattern: Regex) -> Self {
        self.word_pattern = Some(pattern);
        self
    }

    /// Mark the language as off-side.
    pub fn off_side(mut self, off_side: bool) -> Self {
        self.off_side = off_side;
        self
    }

    /// Length in UTF-16 code units of the longest bracket text.
    pub fn max_bracket_length(&self) -> usize {
        self.brackets
            .iter()
            .flat_map(|p| [&p.open, &p.close])
            .map(|s| s.encode_utf16().count())
            .max()
            .unwrap_or(0)
    }
}

impl Default for LanguageConfiguration {
    fn default() -> Self {
        Self::empty()
    }
}

/// Build the default word pattern.
///
/// Words are runs of characters that are neither whitespace nor common
/// punctuation/operator characters, with an extra alternative for decimal
/// literals so `1.5` reads as one word.
pub fn default_word_pattern() -> Regex {
    Regex::new(r##"(-?\d*\.\d\w*)|([^`~!@#$%^&*()\-=+\[{\]}\\|;:'",.<>/?\s]+)"##)
        .expect("default word pattern is valid")
}
