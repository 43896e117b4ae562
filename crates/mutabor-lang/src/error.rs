//! Language error types.

use thiserror::Error;

/// A lexing or parsing failure, with a source position.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl ParseError {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Result type for lexing and parsing.
pub type Result<T> = std::result::Result<T, ParseError>;
