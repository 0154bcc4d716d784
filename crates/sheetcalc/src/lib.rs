//! # sheetcalc
//!
//! An Excel-compatible formula engine.
//!
//! Sheetcalc parses formula text into tokens and evaluates them against any
//! source of cell data, with Excel's coercion and error semantics.
//!
//! ## Features
//!
//! - A1 and R1C1 references, including sheet ranges and `[Book]Sheet!` links
//! - Defined names, with circular definitions reported as `#REF!`
//! - `INDIRECT`, `OFFSET` and the other reference functions
//! - Cross-workbook references through a [`WorkbookEnvironment`]
//! - Math, logical, text, date, info and lookup functions
//!
//! ## Example
//!
//! ```rust
//! use sheetcalc::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("B2", 42.0).unwrap();
//! sheet.set_cell_value("A1", "B2").unwrap();
//!
//! let value = workbook.evaluate_formula(0, "C1", "=INDIRECT(A1)*2").unwrap();
//! assert_eq!(value, FormulaValue::Number(84.0));
//! ```

pub mod error;
pub mod evaluation;
pub mod prelude;

pub use error::{Error, Result};
pub use evaluation::{evaluate_formula_in, EnvironmentEvaluationExt, WorkbookEvaluationExt};

// Re-export core types
pub use sheetcalc_core::{
    format, parse_a1, parse_r1c1, quote_sheet_name, CellAddress, CellRange, CellType, CellValue,
    ErrorCode, NameScope, NamedRange, RefError, RefSpan, Reference, ReferenceStyle,
    SheetQualifier, Workbook, WorkbookSettings, Worksheet, MAX_COLS, MAX_ROWS,
};

// Re-export formula types
pub use sheetcalc_formula::{
    evaluate, parse, BookView, CellDataProvider, EvaluationContext, EvaluatorConfig,
    ExternalWorkbook, FormulaError, FormulaValue, FunctionRegistry, ParseError, ParsedFormula,
    Resolver, WorkbookEnvironment,
};
