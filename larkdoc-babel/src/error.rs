//! Error types for conversion operations
//!
//! Structural problems inside a document (dangling ids, inconsistent table
//! geometry, unknown kinds) are never errors; they degrade locally. What is
//! left here are failures of the collaborators around the converter.

use thiserror::Error;

/// Errors surfaced by the conversion entry points
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Markdown input was not valid UTF-8
    #[error("Parse error: input is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// Block forest JSON could not be read or written
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure reported by a [`crate::mentions::MentionResolver`].
///
/// Export never aborts on it; unresolved mentions fall back to placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Mention resolution failed: {0}")]
pub struct ResolveError(pub String);
