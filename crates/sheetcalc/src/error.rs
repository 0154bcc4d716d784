//! Error type for the sheetcalc facade

use sheetcalc_formula::{FormulaError, ParseError};
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Anything that can go wrong while evaluating against a workbook
///
/// Spreadsheet errors such as `#REF!` are results, not failures; they come
/// back as [`FormulaValue::Error`](sheetcalc_formula::FormulaValue::Error).
#[derive(Debug, Error)]
pub enum Error {
    /// Bad address, sheet index or cell contents
    #[error(transparent)]
    Core(#[from] sheetcalc_core::Error),

    /// Unparseable formula or a broken provider
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// No workbook is linked under this name in the environment
    #[error("No workbook linked as '{0}'")]
    UnknownWorkbook(String),
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Formula(FormulaError::Parse(err))
    }
}
