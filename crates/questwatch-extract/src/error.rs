//! Extraction error types.

use thiserror::Error;

/// Errors produced while decoding a loosely-formatted block.
///
/// Positions are byte offsets into the span handed to the parser, not into
/// the whole page.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Input ended inside a value (unbalanced brackets, truncated span)
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A character that fits no production at this point
    #[error("unexpected character '{found}' at byte {pos}")]
    UnexpectedChar {
        /// The offending character
        found: char,
        /// Byte offset of the character
        pos: usize,
    },

    /// A quoted string with no closing quote
    #[error("unterminated string starting at byte {pos}")]
    UnterminatedString {
        /// Byte offset of the opening quote
        pos: usize,
    },

    /// A `\uXXXX` escape that is not four hex digits or no valid scalar
    #[error("invalid escape sequence at byte {pos}")]
    InvalidEscape {
        /// Byte offset of the backslash
        pos: usize,
    },

    /// Numeric-looking token that parses as neither integer nor float
    #[error("invalid number at byte {pos}")]
    InvalidNumber {
        /// Byte offset of the first character of the token
        pos: usize,
    },

    /// Non-whitespace input left over after the decoded value
    #[error("trailing characters after value at byte {pos}")]
    TrailingInput {
        /// Byte offset of the first leftover character
        pos: usize,
    },
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ParseError>;
