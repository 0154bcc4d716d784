//! # sheetcalc-formula
//!
//! Formula parser and evaluator for sheetcalc.
//!
//! This crate provides:
//! - Formula parsing (text → post-order tokens)
//! - Formula evaluation against a [`CellDataProvider`] and a [`Resolver`]
//! - Built-in Excel functions, dispatched through a [`FunctionRegistry`]
//! - Cross-workbook references through a [`WorkbookEnvironment`]
//!
//! ## Example
//!
//! ```rust
//! use sheetcalc_core::Workbook;
//! use sheetcalc_formula::{evaluate, parse, EvaluationContext, EvaluatorConfig, FormulaValue};
//!
//! let mut wb = Workbook::new();
//! let ws = wb.worksheet_mut(0).unwrap();
//! ws.set_cell_value("A1", 1.0).unwrap();
//! ws.set_cell_value("A2", 2.0).unwrap();
//!
//! let formula = parse("=SUM(A1:A2)*10").unwrap();
//! let config = EvaluatorConfig::default();
//! let ctx = EvaluationContext::for_workbook(&config, &wb, 0, 4, 0);
//! assert_eq!(evaluate(&formula, &ctx).unwrap(), FormulaValue::Number(30.0));
//! ```

pub mod context;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod provider;
pub mod token;
pub mod value;

pub use context::{EvalKey, EvaluationContext, EvaluatorConfig, DEFAULT_MAX_DEPTH, MAX_DENSE_CELLS};
pub use environment::{BookView, WorkbookEnvironment};
pub use error::{FormulaError, FormulaResult, ParseError, ParseErrorKind};
pub use evaluator::{evaluate, evaluate_tokens};
pub use functions::{ArgKind, ErrorPolicy, FunctionDef, FunctionImpl, FunctionRegistry};
pub use parser::{parse, ParsedFormula};
pub use provider::{CellDataProvider, ExternalWorkbook, Resolver};
pub use token::{BinaryOperator, Token, UnaryOperator};
pub use value::{compare_values, format_number, FormulaValue, RefValue};
