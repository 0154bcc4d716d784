//! Prelude module - common imports for sheetcalc users
//!
//! ```rust
//! use sheetcalc::prelude::*;
//! ```

pub use crate::{
    // Cell and reference types
    CellAddress,
    CellRange,
    CellValue,
    ErrorCode,
    Reference,
    ReferenceStyle,
    // Error types
    Error,
    Result,
    // Evaluation
    EnvironmentEvaluationExt,
    EvaluatorConfig,
    FormulaValue,
    WorkbookEnvironment,
    WorkbookEvaluationExt,
    // Main types
    Workbook,
    Worksheet,
};
