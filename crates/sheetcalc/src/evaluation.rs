//! Workbook-level formula evaluation
//!
//! Evaluates formula text, or the formula stored in a cell, at a given cell of a
//! workbook. Nothing here schedules dependents: a formula cell read by another
//! formula always contributes its cached value, so cells must be calculated in
//! the order the caller needs.
//!
//! # Example
//!
//! ```rust
//! use sheetcalc::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", 10.0).unwrap();
//! sheet.set_cell_value("A2", 20.0).unwrap();
//! sheet.set_cell_formula("A3", "=A1+A2").unwrap();
//!
//! let value = workbook.calculate_cell(0, "A3").unwrap();
//! assert_eq!(value, FormulaValue::Number(30.0));
//! assert_eq!(
//!     workbook.worksheet(0).unwrap().get_value("A3").unwrap().effective_value(),
//!     &CellValue::Number(30.0)
//! );
//! ```

use log::debug;
use sheetcalc_core::{CellAddress, CellValue, Workbook};
use sheetcalc_formula::{
    evaluate, parse, CellDataProvider, EvaluationContext, EvaluatorConfig, FormulaValue,
    Resolver, WorkbookEnvironment,
};

use crate::{Error, Result};

/// Evaluate `formula` as if it were entered at `address` on sheet `sheet`
///
/// `source` is anything that can hand out cells and resolve names, such as a
/// [`Workbook`] or a [`BookView`](sheetcalc_formula::BookView) of a
/// [`WorkbookEnvironment`].
pub fn evaluate_formula_in<S>(
    source: &S,
    config: &EvaluatorConfig,
    sheet: usize,
    address: &str,
    formula: &str,
) -> Result<FormulaValue>
where
    S: CellDataProvider + Resolver,
{
    let cell = locate(source, sheet, address)?;
    let parsed = parse(formula)?;
    let ctx = EvaluationContext::new(config, source, source, sheet, cell.row, cell.col);
    Ok(evaluate(&parsed, &ctx)?)
}

/// Check the sheet index and parse the address of the evaluating cell
fn locate(source: &dyn CellDataProvider, sheet: usize, address: &str) -> Result<CellAddress> {
    let count = source.sheet_count();
    if sheet >= count {
        return Err(sheetcalc_core::Error::SheetOutOfBounds(sheet, count).into());
    }
    Ok(CellAddress::parse(address)?)
}

fn stored_formula(source: &dyn CellDataProvider, sheet: usize, address: &str) -> Result<String> {
    let cell = locate(source, sheet, address)?;
    source
        .formula_text(sheet, cell.row, cell.col)
        .ok_or_else(|| sheetcalc_core::Error::NotAFormula(cell.to_a1_string()).into())
}

/// Extension trait for Workbook to add evaluation methods
pub trait WorkbookEvaluationExt {
    /// Evaluate formula text at a cell with the default configuration
    fn evaluate_formula(&self, sheet: usize, address: &str, formula: &str) -> Result<FormulaValue>;

    /// Evaluate formula text at a cell with a custom configuration
    fn evaluate_formula_with(
        &self,
        config: &EvaluatorConfig,
        sheet: usize,
        address: &str,
        formula: &str,
    ) -> Result<FormulaValue>;

    /// Evaluate the formula stored at a cell without touching its cached value
    fn evaluate_cell(&self, sheet: usize, address: &str) -> Result<FormulaValue>;

    /// Evaluate the formula stored at a cell and cache the result in the cell
    fn calculate_cell(&mut self, sheet: usize, address: &str) -> Result<FormulaValue>;
}

impl WorkbookEvaluationExt for Workbook {
    fn evaluate_formula(&self, sheet: usize, address: &str, formula: &str) -> Result<FormulaValue> {
        self.evaluate_formula_with(&EvaluatorConfig::default(), sheet, address, formula)
    }

    fn evaluate_formula_with(
        &self,
        config: &EvaluatorConfig,
        sheet: usize,
        address: &str,
        formula: &str,
    ) -> Result<FormulaValue> {
        evaluate_formula_in(self, config, sheet, address, formula)
    }

    fn evaluate_cell(&self, sheet: usize, address: &str) -> Result<FormulaValue> {
        let formula = stored_formula(self, sheet, address)?;
        self.evaluate_formula(sheet, address, &formula)
    }

    fn calculate_cell(&mut self, sheet: usize, address: &str) -> Result<FormulaValue> {
        let value = self.evaluate_cell(sheet, address)?;
        store(self, sheet, address, &value)?;
        Ok(value)
    }
}

fn store(workbook: &mut Workbook, sheet: usize, address: &str, value: &FormulaValue) -> Result<()> {
    let count = workbook.sheet_count();
    let cell = CellAddress::parse(address)?;
    let ws = workbook
        .worksheet_mut(sheet)
        .ok_or(sheetcalc_core::Error::SheetOutOfBounds(sheet, count))?;
    debug!("{}!{} = {:?}", ws.name(), cell, value);
    ws.set_formula_result(cell.row, cell.col, CellValue::from(value.clone()))?;
    Ok(())
}

/// Evaluation methods for workbooks linked into an environment
pub trait EnvironmentEvaluationExt {
    /// Evaluate formula text at a cell of the workbook linked as `book`
    fn evaluate_formula(
        &self,
        book: &str,
        sheet: usize,
        address: &str,
        formula: &str,
    ) -> Result<FormulaValue>;

    /// Evaluate the formula stored at a cell of `book` and cache the result
    fn calculate_cell(&mut self, book: &str, sheet: usize, address: &str) -> Result<FormulaValue>;
}

impl EnvironmentEvaluationExt for WorkbookEnvironment {
    fn evaluate_formula(
        &self,
        book: &str,
        sheet: usize,
        address: &str,
        formula: &str,
    ) -> Result<FormulaValue> {
        let view = self
            .view(book)
            .ok_or_else(|| Error::UnknownWorkbook(book.to_string()))?;
        evaluate_formula_in(&view, &EvaluatorConfig::default(), sheet, address, formula)
    }

    fn calculate_cell(&mut self, book: &str, sheet: usize, address: &str) -> Result<FormulaValue> {
        let value = {
            let view = self
                .view(book)
                .ok_or_else(|| Error::UnknownWorkbook(book.to_string()))?;
            let formula = stored_formula(&view, sheet, address)?;
            evaluate_formula_in(&view, &EvaluatorConfig::default(), sheet, address, &formula)?
        };
        let workbook = self
            .get_mut(book)
            .ok_or_else(|| Error::UnknownWorkbook(book.to_string()))?;
        store(workbook, sheet, address, &value)?;
        Ok(value)
    }
}
