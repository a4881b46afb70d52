//! Error types for the document model
//!
//! Every variant here means the input markup is malformed. Parsing never
//! returns a partial tree alongside an error.

use std::fmt::Display;

/// Errors while turning markup text into a [`Document`](crate::Document)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Tokenizer or well-formedness error reported at a byte offset
    #[error("syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    /// Input contained no element at all
    #[error("document has no root element")]
    NoRootElement,

    /// A second top-level element was found
    #[error("second root element at byte {position}")]
    MultipleRoots { position: u64 },

    /// Input ended while an element was still open
    #[error("element <{0}> is never closed")]
    UnclosedElement(String),

    /// Non-whitespace text outside the root element
    #[error("text outside the root element at byte {position}")]
    TextOutsideRoot { position: u64 },
}

impl ParseError {
    /// Create syntax error at position
    pub fn syntax(position: u64, message: impl Display) -> Self {
        Self::Syntax {
            position,
            message: message.to_string(),
        }
    }
}

/// Result type alias for document parsing
pub type ParseResult<T> = Result<T, ParseError>;
