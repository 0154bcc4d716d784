//! Formula error types
//!
//! Spreadsheet errors (`#DIV/0!`, `#REF!`, ...) are ordinary values and never show up
//! here. [`FormulaError`] is reserved for malformed input text and for collaborators
//! that break their contract.

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Fatal formula errors
#[derive(Debug, Error)]
pub enum FormulaError {
    /// Formula text could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A cell data provider or resolver returned something it must never return
    #[error("Provider contract violation: {0}")]
    ProviderContract(String),

    /// A token sequence that no parse could have produced
    #[error("Malformed token sequence: {0}")]
    MalformedTokens(String),
}

/// A formula that failed to parse, with the byte offset of the offending input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {offset}")]
pub struct ParseError {
    pub offset: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(offset: usize, kind: ParseErrorKind) -> Self {
        Self { offset, kind }
    }
}

/// Why a formula failed to parse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("empty formula")]
    Empty,

    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("unexpected {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated quoted sheet name")]
    UnterminatedSheetName,

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("missing closing parenthesis")]
    MissingCloseParen,

    #[error("array literal rows differ in length")]
    RaggedArray,

    #[error("array literals may only hold constants")]
    InvalidArrayElement,
}
