//! Error type for the text model's fallible entry points.
//!
//! Validators (`validate_position`, `validate_range`) never fail; they clamp.
//! Errors are reserved for operations that demand exact inputs and for use
//! after disposal.

use thiserror::Error;

/// Errors produced by the text model's public API.
#[derive(Debug, Error)]
pub enum TextModelError {
    #[error("model is disposed")]
    /// The model was used after [`dispose`](crate::TextModel::dispose).
    Disposed,

    #[error("invalid line number {line} (line count: {line_count})")]
    /// A line number outside `1..=line_count` was passed to an operation
    /// that demands exactness.
    InvalidLineNumber {
        /// The offending line number.
        line: usize,
        /// The line count at the time of the call.
        line_count: usize,
    },

    #[error("overlapping edit operations are not allowed")]
    /// Two edit operations in one batch overlap.
    OverlappingEdits,

    #[error("invalid search pattern: {0}")]
    /// The search query failed to compile as a regex.
    InvalidSearchPattern(#[from] regex::Error),
}
