//! The two contracts the evaluator reads a document through
//!
//! [`CellDataProvider`] hands out cell contents by sheet index and position.
//! [`Resolver`] turns defined names into formula text and workbook names into
//! other workbooks. [`Workbook`] implements both.

use sheetcalc_core::{CellRange, CellType, Workbook};

use crate::value::FormulaValue;

/// Read access to cell data
///
/// Sheets, rows and columns are 0-based. Implementations must be cheap to query
/// and must never return [`FormulaValue::Reference`] or [`FormulaValue::Array`]
/// from [`cell_value`](CellDataProvider::cell_value); the evaluator treats that as
/// a fatal contract violation.
pub trait CellDataProvider {
    /// What kind of content the cell holds
    fn cell_type(&self, sheet: usize, row: u32, col: u16) -> CellType;

    /// Cell contents; for formula cells the result of their last calculation
    fn cell_value(&self, sheet: usize, row: u32, col: u16) -> FormulaValue;

    /// Formula text of a formula cell
    fn formula_text(&self, _sheet: usize, _row: u32, _col: u16) -> Option<String> {
        None
    }

    fn sheet_count(&self) -> usize;

    /// Index of a sheet by name (case-insensitive)
    fn sheet_index(&self, name: &str) -> Option<usize>;

    fn sheet_name(&self, index: usize) -> Option<String>;

    /// Bounds of the populated cells of a sheet
    ///
    /// Whole-row and whole-column references are clipped to it when read as
    /// arrays. `None` means no clipping.
    fn used_range(&self, _sheet: usize) -> Option<CellRange> {
        None
    }

    /// Whether serial dates count from 1904 instead of 1900
    fn date_1904(&self) -> bool {
        false
    }
}

/// Name and workbook lookup
pub trait Resolver {
    /// Formula text a defined name stands for, as seen from `scope_sheet`
    ///
    /// Sheet-scoped names shadow workbook-scoped ones.
    fn resolve_name(&self, name: &str, scope_sheet: usize) -> Option<String>;

    /// Another workbook, by the name used in `[Book]Sheet!A1`
    fn resolve_external_workbook(&self, name: &str) -> Option<Box<dyn ExternalWorkbook + '_>>;
}

/// A workbook reachable through [`Resolver::resolve_external_workbook`]
pub trait ExternalWorkbook: CellDataProvider + Resolver {
    fn as_provider(&self) -> &dyn CellDataProvider;

    fn as_resolver(&self) -> &dyn Resolver;
}

impl<T: CellDataProvider + Resolver> ExternalWorkbook for T {
    fn as_provider(&self) -> &dyn CellDataProvider {
        self
    }

    fn as_resolver(&self) -> &dyn Resolver {
        self
    }
}

impl CellDataProvider for Workbook {
    fn cell_type(&self, sheet: usize, row: u32, col: u16) -> CellType {
        self.worksheet(sheet)
            .and_then(|ws| ws.cell_at(row, col))
            .map_or(CellType::Empty, |v| v.cell_type())
    }

    fn cell_value(&self, sheet: usize, row: u32, col: u16) -> FormulaValue {
        self.worksheet(sheet)
            .and_then(|ws| ws.cell_at(row, col))
            .map_or(FormulaValue::Empty, FormulaValue::from)
    }

    fn formula_text(&self, sheet: usize, row: u32, col: u16) -> Option<String> {
        self.worksheet(sheet)?
            .get_formula_at(row, col)
            .map(str::to_string)
    }

    fn sheet_count(&self) -> usize {
        Workbook::sheet_count(self)
    }

    fn sheet_index(&self, name: &str) -> Option<usize> {
        Workbook::sheet_index(self, name)
    }

    fn sheet_name(&self, index: usize) -> Option<String> {
        self.worksheet(index).map(|ws| ws.name().to_string())
    }

    fn used_range(&self, sheet: usize) -> Option<CellRange> {
        self.worksheet(sheet)?.used_range()
    }

    fn date_1904(&self) -> bool {
        self.settings().date_1904
    }
}

impl Resolver for Workbook {
    fn resolve_name(&self, name: &str, scope_sheet: usize) -> Option<String> {
        self.get_named_range(name, scope_sheet)
            .map(|n| n.expression().to_string())
    }

    /// A lone workbook only knows itself
    fn resolve_external_workbook(&self, name: &str) -> Option<Box<dyn ExternalWorkbook + '_>> {
        if self.name().eq_ignore_ascii_case(name) {
            Some(Box::new(self))
        } else {
            None
        }
    }
}

impl<T: CellDataProvider + ?Sized> CellDataProvider for &T {
    fn cell_type(&self, sheet: usize, row: u32, col: u16) -> CellType {
        (**self).cell_type(sheet, row, col)
    }

    fn cell_value(&self, sheet: usize, row: u32, col: u16) -> FormulaValue {
        (**self).cell_value(sheet, row, col)
    }

    fn formula_text(&self, sheet: usize, row: u32, col: u16) -> Option<String> {
        (**self).formula_text(sheet, row, col)
    }

    fn sheet_count(&self) -> usize {
        (**self).sheet_count()
    }

    fn sheet_index(&self, name: &str) -> Option<usize> {
        (**self).sheet_index(name)
    }

    fn sheet_name(&self, index: usize) -> Option<String> {
        (**self).sheet_name(index)
    }

    fn used_range(&self, sheet: usize) -> Option<CellRange> {
        (**self).used_range(sheet)
    }

    fn date_1904(&self) -> bool {
        (**self).date_1904()
    }
}

impl<T: Resolver + ?Sized> Resolver for &T {
    fn resolve_name(&self, name: &str, scope_sheet: usize) -> Option<String> {
        (**self).resolve_name(name, scope_sheet)
    }

    fn resolve_external_workbook(&self, name: &str) -> Option<Box<dyn ExternalWorkbook + '_>> {
        (**self).resolve_external_workbook(name)
    }
}
