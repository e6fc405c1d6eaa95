#![warn(missing_docs)]
//! Text Model - Headless Editable Buffer Kernel
//!
//! # Overview
//!
//! `text-model` is the text model at the heart of a code editor: an
//! in-memory editable buffer with precise positional editing and undo/redo,
//! attached decorations whose ranges survive arbitrary edits, lazy
//! line-by-line tokenization with background catch-up, and the lookups an
//! editor host needs (search, bracket matching, word boundaries, indent
//! guides). It renders nothing and owns no I/O; the host drives it and
//! subscribes to its events.
//!
//! # Core Features
//!
//! - **Positional editing**: 1-based line/column addressing in UTF-16 code
//!   units, batched non-overlapping edits, reverse edits for undo
//! - **Tracked decorations**: interval storage with four stickiness
//!   policies, split into overview-ruler and plain trees
//! - **Incremental tokenization**: per-line token cache with an
//!   invalidation frontier and a 20 ms background budget
//! - **Consistent observation**: deferred event emission, so observers
//!   never see a half-applied batch
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  TextModel Facade (validation, versioning)  │  ← Public API
//! ├──────────────┬──────────────┬───────────────┤
//! │  Decorations │  Line Tokens │  Edit Stack   │  ← Derived indexes
//! ├──────────────┴──────────────┴───────────────┤
//! │  Event Coalescer (deferred emitters)        │  ← Observation
//! ├─────────────────────────────────────────────┤
//! │  Text Buffer (lines + offsets + edits)      │  ← Source of truth
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use text_model::{
//!     EditOperation, LanguageRegistry, Position, TextModel, TextModelCreationOptions,
//! };
//!
//! let registry = Arc::new(LanguageRegistry::new());
//! let mut model = TextModel::new(
//!     "abc\ndef",
//!     None,
//!     registry,
//!     TextModelCreationOptions::default(),
//! );
//!
//! model
//!     .push_edit_operations(
//!         None,
//!         vec![EditOperation::insert(Position::new(1, 2), "X")],
//!         None,
//!     )
//!     .unwrap();
//! assert_eq!(model.get_line_content(1).unwrap(), "aXbc");
//!
//! model.undo().unwrap();
//! assert_eq!(model.get_line_content(1).unwrap(), "abc");
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - line storage, offset mapping and edit application
//! - [`intervals`] - interval storage and stickiness for decorations
//! - [`decorations`] - decoration options and the two-tree tracker
//! - [`tokens`] - tokenizer interface and the incremental token store
//! - [`edit_stack`] - undo/redo groups
//! - [`events`] - event payloads and deferred emission
//! - [`model`] - the facade tying everything together
//!
//! # Unicode Support
//!
//! Columns and offsets count UTF-16 code units (the interop unit of editor
//! protocols). Validators keep positions off surrogate-pair interiors, with
//! a relaxed path reserved for decoration anchoring.

pub mod brackets;
pub mod buffer;
pub mod decorations;
pub mod edit_stack;
mod error;
pub mod events;
pub mod indent;
pub mod intervals;
pub mod line_ending;
pub mod model;
pub mod position;
pub mod search;
pub mod tokens;
pub mod words;

pub use brackets::FoundBracket;
pub use buffer::{EditOperation, ReverseEditOperation, TextBuffer};
pub use decorations::{
    ModelDecoration, ModelDecorationOptions, ModelDecorationOptionsBuilder, ModelDeltaDecoration,
    OverviewRulerLane, OverviewRulerOptions,
};
pub use error::TextModelError;
pub use events::{
    ContentChange, ContentChangedEvent, DecorationsChangedEvent, LanguageChangedEvent,
    OptionsChangedEvent, RawContentChange, RawContentChangedEvent, TokensChangedEvent,
    TokensChangedRange,
};
pub use intervals::TrackedRangeStickiness;
pub use line_ending::{DefaultLineEnding, EndOfLinePreference, LineEnding};
pub use model::{
    DecorationsChangeAccessor, TextModel, TextModelCreationOptions, TextModelOptions,
    TextModelOptionsUpdate,
};
pub use position::{Position, Range, Selection, SelectionDirection};
pub use search::FindMatch;
pub use tokens::{
    LanguageId, LanguageIdentifier, LanguageRegistry, LineTokens, StandardTokenType, Token,
    TokenMetadata, TokenizedLine, Tokenizer, TokenizerState,
};
pub use words::WordAtPosition;
