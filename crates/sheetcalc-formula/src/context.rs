//! Evaluation configuration and per-call context

use log::{debug, warn};
use once_cell::sync::Lazy;
use sheetcalc_core::{CellAddress, CellRange, CellType, ErrorCode, Reference, Workbook};
use std::sync::Arc;

use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use crate::provider::{CellDataProvider, ExternalWorkbook, Resolver};
use crate::value::{format_number, FormulaValue, RefValue};

/// Default bound on nested defined-name evaluation
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Areas of up to this many cells are read at full size; larger ones stop at
/// the last used row and column of each sheet
pub const MAX_DENSE_CELLS: u64 = 1 << 16;

static BUILTINS: Lazy<Arc<FunctionRegistry>> = Lazy::new(|| Arc::new(FunctionRegistry::new()));

/// Read-only settings shared by every evaluation that borrows them
///
/// # Example
/// ```rust
/// use sheetcalc_formula::{EvaluatorConfig, FunctionRegistry};
///
/// let config = EvaluatorConfig::new(FunctionRegistry::new())
///     .with_max_depth(16)
///     .with_decimal_separator(',');
/// assert_eq!(config.max_depth(), 16);
/// ```
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    functions: Arc<FunctionRegistry>,
    max_depth: usize,
    decimal_separator: char,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            functions: Arc::clone(&BUILTINS),
            max_depth: DEFAULT_MAX_DEPTH,
            decimal_separator: '.',
        }
    }
}

impl EvaluatorConfig {
    /// A configuration dispatching through `functions`
    pub fn new(functions: FunctionRegistry) -> Self {
        Self {
            functions: Arc::new(functions),
            ..Self::default()
        }
    }

    /// Share an existing registry between configurations
    pub fn with_functions(mut self, functions: Arc<FunctionRegistry>) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Decimal separator used when numbers are turned into text
    pub fn with_decimal_separator(mut self, separator: char) -> Self {
        self.decimal_separator = separator;
        self
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }
}

/// What an evaluation context is evaluating
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EvalKey {
    /// The formula of a cell
    Cell { sheet: usize, row: u32, col: u16 },
    /// A defined name, as seen from a sheet (lowercase)
    Name { sheet: usize, name: String },
}

/// Context for formula evaluation
///
/// A root context evaluates one formula at one cell. Evaluating a defined name
/// opens a child context through [`EvaluationContext::enter`]; the chain of
/// parents is the set of evaluations currently open, which is how cycles are
/// caught.
pub struct EvaluationContext<'a> {
    config: &'a EvaluatorConfig,
    provider: &'a dyn CellDataProvider,
    resolver: &'a dyn Resolver,
    /// Current worksheet index
    pub current_sheet: usize,
    /// Current cell row (for relative references)
    pub current_row: u32,
    /// Current cell column (for relative references)
    pub current_col: u16,
    key: EvalKey,
    parent: Option<&'a EvaluationContext<'a>>,
    depth: usize,
}

impl<'a> EvaluationContext<'a> {
    /// Create a root context evaluating at `sheet`/`row`/`col` (0-based)
    pub fn new(
        config: &'a EvaluatorConfig,
        provider: &'a dyn CellDataProvider,
        resolver: &'a dyn Resolver,
        sheet: usize,
        row: u32,
        col: u16,
    ) -> Self {
        Self {
            config,
            provider,
            resolver,
            current_sheet: sheet,
            current_row: row,
            current_col: col,
            key: EvalKey::Cell { sheet, row, col },
            parent: None,
            depth: 0,
        }
    }

    /// Root context over a single in-memory workbook
    pub fn for_workbook(
        config: &'a EvaluatorConfig,
        workbook: &'a Workbook,
        sheet: usize,
        row: u32,
        col: u16,
    ) -> Self {
        Self::new(config, workbook, workbook, sheet, row, col)
    }

    pub fn config(&self) -> &'a EvaluatorConfig {
        self.config
    }

    pub fn functions(&self) -> &'a FunctionRegistry {
        self.config.functions()
    }

    pub fn provider(&self) -> &'a dyn CellDataProvider {
        self.provider
    }

    pub fn resolver(&self) -> &'a dyn Resolver {
        self.resolver
    }

    pub fn key(&self) -> &EvalKey {
        &self.key
    }

    /// Number of evaluations open above this one
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The cell the formula is evaluated at
    pub fn current_cell(&self) -> CellAddress {
        CellAddress::new(self.current_row, self.current_col)
    }

    /// Open a nested evaluation of `key`
    ///
    /// Returns `None` if `key` is already open in this chain or the chain would
    /// grow past the configured depth.
    pub fn enter(&self, key: EvalKey) -> Option<EvaluationContext<'_>> {
        let mut open = Some(self);
        while let Some(ctx) = open {
            if ctx.key == key {
                warn!("circular evaluation of {:?}", key);
                return None;
            }
            open = ctx.parent;
        }

        if self.depth + 1 > self.config.max_depth {
            warn!(
                "evaluation depth {} exceeded while entering {:?}",
                self.config.max_depth, key
            );
            return None;
        }

        Some(EvaluationContext {
            config: self.config,
            provider: self.provider,
            resolver: self.resolver,
            current_sheet: self.current_sheet,
            current_row: self.current_row,
            current_col: self.current_col,
            key,
            parent: Some(self),
            depth: self.depth + 1,
        })
    }

    /// Whether `range` on `sheets` of the local workbook covers a cell whose
    /// formula is being evaluated in this chain
    fn covers_open_cell(&self, sheets: (usize, usize), range: &CellRange) -> bool {
        let mut open = Some(self);
        while let Some(ctx) = open {
            if let EvalKey::Cell { sheet, row, col } = ctx.key {
                if (sheets.0..=sheets.1).contains(&sheet)
                    && range.contains(&CellAddress::new(row, col))
                {
                    warn!(
                        "circular reference to {} on sheet {}",
                        CellAddress::new(row, col),
                        sheet
                    );
                    return true;
                }
            }
            open = ctx.parent;
        }
        false
    }

    // === Reference resolution ===

    /// Turn a parsed reference into a [`FormulaValue::Reference`]
    ///
    /// Sheet and workbook names are looked up now, so an unknown sheet or an
    /// unlinked workbook gives `#REF!` rather than a parse failure.
    pub fn resolve_reference(&self, reference: &Reference) -> FormulaResult<FormulaValue> {
        let Some(qualifier) = &reference.sheet else {
            return Ok(FormulaValue::Reference(RefValue::new(
                self.current_sheet,
                reference.range,
            )));
        };

        let source = match self.source(qualifier.workbook.as_deref()) {
            Some(source) => source,
            None => return Ok(FormulaValue::Error(ErrorCode::Ref)),
        };
        let provider = source.provider();

        let lookup = |name: &str| -> FormulaResult<Option<usize>> {
            match provider.sheet_index(name) {
                Some(index) if index >= provider.sheet_count() => {
                    Err(FormulaError::ProviderContract(format!(
                        "sheet_index('{}') returned {} but there are {} sheets",
                        name,
                        index,
                        provider.sheet_count()
                    )))
                }
                Some(index) => Ok(Some(index)),
                None => {
                    debug!("unknown sheet '{}'", name);
                    Ok(None)
                }
            }
        };

        let Some(first) = lookup(&qualifier.first)? else {
            return Ok(FormulaValue::Error(ErrorCode::Ref));
        };
        let last = match &qualifier.last {
            Some(name) => match lookup(name)? {
                Some(index) => index,
                None => return Ok(FormulaValue::Error(ErrorCode::Ref)),
            },
            None => first,
        };

        Ok(FormulaValue::Reference(RefValue {
            workbook: qualifier.workbook.clone(),
            first_sheet: first.min(last),
            last_sheet: first.max(last),
            range: reference.range,
        }))
    }

    /// The provider a reference into `workbook` reads from
    fn source(&self, workbook: Option<&str>) -> Option<Source<'a>> {
        match workbook {
            None => Some(Source::Local(self.provider)),
            Some(name) => match self.resolver.resolve_external_workbook(name) {
                Some(book) => Some(Source::External(book)),
                None => {
                    debug!("unknown external workbook '{}'", name);
                    None
                }
            },
        }
    }

    /// Read one cell of a resolved reference's workbook
    fn read_cell(
        provider: &dyn CellDataProvider,
        sheet: usize,
        row: u32,
        col: u16,
    ) -> FormulaResult<FormulaValue> {
        if provider.cell_type(sheet, row, col) == CellType::Empty {
            return Ok(FormulaValue::Empty);
        }
        match provider.cell_value(sheet, row, col) {
            FormulaValue::Reference(_) | FormulaValue::Array(_) => {
                Err(FormulaError::ProviderContract(format!(
                    "cell_value({}, {}) returned a reference or array",
                    sheet,
                    CellAddress::new(row, col)
                )))
            }
            value => Ok(value),
        }
    }

    /// Dereference a value for a scalar consumer
    ///
    /// A single cell reads the cell. An area applies implicit intersection: a
    /// one-column area picks the current row, a one-row area picks the current
    /// column. Anything else is `#VALUE!`. Non-reference values pass through.
    pub fn deref_scalar(&self, value: FormulaValue) -> FormulaResult<FormulaValue> {
        let FormulaValue::Reference(r) = value else {
            return Ok(value);
        };
        if r.is_3d() {
            return Ok(FormulaValue::Error(ErrorCode::Value));
        }
        let Some(source) = self.source(r.workbook.as_deref()) else {
            return Ok(FormulaValue::Error(ErrorCode::Ref));
        };

        let range = r.range;
        let cell = if range.is_single_cell() {
            Some((range.start.row, range.start.col))
        } else if range.col_count() == 1 && range.contains_row(self.current_row) {
            Some((self.current_row, range.start.col))
        } else if range.row_count() == 1 && range.contains_col(self.current_col) {
            Some((range.start.row, self.current_col))
        } else {
            None
        };

        let Some((row, col)) = cell else {
            return Ok(FormulaValue::Error(ErrorCode::Value));
        };
        let target = CellRange::single(CellAddress::new(row, col));
        if source.is_local() && self.covers_open_cell((r.first_sheet, r.first_sheet), &target) {
            return Ok(FormulaValue::Error(ErrorCode::Ref));
        }
        Self::read_cell(source.provider(), r.first_sheet, row, col)
    }

    /// Dereference a value for an array consumer
    ///
    /// References become [`FormulaValue::Array`]s (a single cell becomes 1x1).
    /// Large areas are cut off after the last used cell; the start is kept so
    /// positions within the array still match the reference. Sheets of a 3D
    /// reference are stacked top to bottom.
    pub fn deref_array(&self, value: FormulaValue) -> FormulaResult<FormulaValue> {
        match value {
            FormulaValue::Reference(r) => match self.read_area(&r)? {
                Some(rows) => Ok(FormulaValue::Array(rows)),
                None => Ok(FormulaValue::Error(ErrorCode::Ref)),
            },
            other => Ok(other),
        }
    }

    /// Values of every cell a reference covers
    ///
    /// `None` if its workbook is gone or the area covers a cell being
    /// evaluated. Areas larger than [`MAX_DENSE_CELLS`] are cut off after the
    /// last used cell of each sheet.
    pub fn read_area(&self, r: &RefValue) -> FormulaResult<Option<Vec<Vec<FormulaValue>>>> {
        let Some(source) = self.source(r.workbook.as_deref()) else {
            return Ok(None);
        };
        if source.is_local() && self.covers_open_cell((r.first_sheet, r.last_sheet), &r.range) {
            return Ok(None);
        }
        let provider = source.provider();

        let mut rows = Vec::new();
        for sheet in r.first_sheet..=r.last_sheet {
            let range = clip_to_used(r.range, provider.used_range(sheet));
            let Some(range) = range else {
                continue;
            };
            for row in range.start.row..=range.end.row {
                let mut values = Vec::with_capacity(range.col_count() as usize);
                for col in range.start.col..=range.end.col {
                    values.push(Self::read_cell(provider, sheet, row, col)?);
                }
                rows.push(values);
            }
        }
        Ok(Some(rows))
    }

    /// Formula text of the cell a reference starts at
    pub fn formula_text(&self, r: &RefValue) -> Option<String> {
        let source = self.source(r.workbook.as_deref())?;
        source
            .provider()
            .formula_text(r.first_sheet, r.range.start.row, r.range.start.col)
    }

    /// Sheet name of a resolved reference's first sheet
    pub fn sheet_name(&self, r: &RefValue) -> Option<String> {
        let source = self.source(r.workbook.as_deref())?;
        source.provider().sheet_name(r.first_sheet)
    }

    // === Text rendering ===

    /// Render a number as text with the configured decimal separator
    pub fn number_to_text(&self, n: f64) -> String {
        let text = format_number(n);
        match self.config.decimal_separator {
            '.' => text,
            sep => text.replace('.', &sep.to_string()),
        }
    }

    /// Text rendering of a scalar for concatenation and text functions
    pub fn to_text(&self, value: &FormulaValue) -> Result<String, ErrorCode> {
        match value {
            FormulaValue::Number(n) => Ok(self.number_to_text(*n)),
            other => other.to_text(),
        }
    }
}

/// Where a reference's cells live
enum Source<'a> {
    Local(&'a dyn CellDataProvider),
    External(Box<dyn ExternalWorkbook + 'a>),
}

impl Source<'_> {
    fn is_local(&self) -> bool {
        matches!(self, Source::Local(_))
    }

    fn provider(&self) -> &dyn CellDataProvider {
        match self {
            Source::Local(provider) => *provider,
            Source::External(book) => book.as_provider(),
        }
    }
}

/// Cut a large area down to the used part of a sheet
///
/// `None` when nothing of the area is in use.
fn clip_to_used(range: CellRange, used: Option<CellRange>) -> Option<CellRange> {
    if range.cell_count() <= MAX_DENSE_CELLS {
        return Some(range);
    }
    let used = used?;

    let end_row = range.end.row.min(used.end.row);
    let end_col = range.end.col.min(used.end.col);
    if end_row < range.start.row || end_col < range.start.col {
        return None;
    }
    let mut clipped = range;
    clipped.end.row = end_row;
    clipped.end.col = end_col;
    Some(clipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheetcalc_core::parse_a1;

    fn workbook() -> Workbook {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Other").unwrap();
        let ws = wb.worksheet_mut(0).unwrap();
        ws.set_cell_value("A1", 1.0).unwrap();
        ws.set_cell_value("A2", 2.0).unwrap();
        ws.set_cell_value("B1", "x").unwrap();
        wb.worksheet_mut(1)
            .unwrap()
            .set_cell_value("A1", 10.0)
            .unwrap();
        wb
    }

    fn resolve(ctx: &EvaluationContext, text: &str) -> FormulaValue {
        ctx.resolve_reference(&parse_a1(text).unwrap()).unwrap()
    }

    #[test]
    fn test_resolve_reference() {
        let config = EvaluatorConfig::default();
        let wb = workbook();
        let ctx = EvaluationContext::for_workbook(&config, &wb, 0, 4, 4);

        let FormulaValue::Reference(r) = resolve(&ctx, "other!A1") else {
            panic!("expected a reference");
        };
        assert_eq!(r.first_sheet, 1);
        assert_eq!(resolve(&ctx, "Missing!A1"), FormulaValue::Error(ErrorCode::Ref));
        assert_eq!(resolve(&ctx, "[Nope]Sheet1!A1"), FormulaValue::Error(ErrorCode::Ref));

        let FormulaValue::Reference(r) = resolve(&ctx, "Other:Sheet1!A1") else {
            panic!("expected a reference");
        };
        assert_eq!((r.first_sheet, r.last_sheet), (0, 1));
    }

    #[test]
    fn test_implicit_intersection() {
        let config = EvaluatorConfig::default();
        let wb = workbook();
        let at = |row, col| EvaluationContext::for_workbook(&config, &wb, 0, row, col);

        let ctx = at(1, 3);
        assert_eq!(
            ctx.deref_scalar(resolve(&ctx, "A1:A3")).unwrap(),
            FormulaValue::Number(2.0)
        );
        let ctx = at(5, 1);
        assert_eq!(
            ctx.deref_scalar(resolve(&ctx, "A1:C1")).unwrap(),
            FormulaValue::string("x")
        );
        let ctx = at(9, 9);
        assert_eq!(
            ctx.deref_scalar(resolve(&ctx, "A1:A3")).unwrap(),
            FormulaValue::Error(ErrorCode::Value)
        );
        assert_eq!(
            ctx.deref_scalar(resolve(&ctx, "A1:B2")).unwrap(),
            FormulaValue::Error(ErrorCode::Value)
        );
    }

    #[test]
    fn test_deref_array_clips_whole_columns() {
        let config = EvaluatorConfig::default();
        let wb = workbook();
        let ctx = EvaluationContext::for_workbook(&config, &wb, 0, 0, 0);

        assert_eq!(
            ctx.deref_array(resolve(&ctx, "A:A")).unwrap(),
            FormulaValue::Array(vec![
                vec![FormulaValue::Number(1.0)],
                vec![FormulaValue::Number(2.0)],
            ])
        );
        assert_eq!(
            ctx.deref_array(resolve(&ctx, "Sheet1:Other!A1")).unwrap(),
            FormulaValue::Array(vec![
                vec![FormulaValue::Number(1.0)],
                vec![FormulaValue::Number(10.0)],
            ])
        );
    }

    #[test]
    fn test_large_areas_stop_at_used_range() {
        let config = EvaluatorConfig::default();
        let wb = workbook();
        let ctx = EvaluationContext::for_workbook(&config, &wb, 0, 1_048_575, 16_383);

        assert_eq!(
            ctx.deref_array(resolve(&ctx, "B1:D400000")).unwrap(),
            FormulaValue::Array(vec![])
        );
        assert_eq!(
            ctx.deref_array(resolve(&ctx, "A1:XFC1048575")).unwrap(),
            FormulaValue::Array(vec![
                vec![FormulaValue::Number(1.0), FormulaValue::string("x")],
                vec![FormulaValue::Number(2.0), FormulaValue::Empty],
            ])
        );
        // Small areas keep their full shape
        assert_eq!(
            ctx.deref_array(resolve(&ctx, "C1:C2")).unwrap(),
            FormulaValue::Array(vec![vec![FormulaValue::Empty], vec![FormulaValue::Empty]])
        );
    }

    #[test]
    fn test_reading_the_evaluated_cell_is_circular() {
        let config = EvaluatorConfig::default();
        let wb = workbook();
        let ctx = EvaluationContext::for_workbook(&config, &wb, 0, 1, 0);

        assert_eq!(
            ctx.deref_scalar(resolve(&ctx, "A2")).unwrap(),
            FormulaValue::Error(ErrorCode::Ref)
        );
        assert_eq!(
            ctx.deref_array(resolve(&ctx, "A1:A3")).unwrap(),
            FormulaValue::Error(ErrorCode::Ref)
        );
        assert_eq!(
            ctx.deref_scalar(resolve(&ctx, "A1")).unwrap(),
            FormulaValue::Number(1.0)
        );
        // Same cell on another sheet
        assert_eq!(
            ctx.deref_scalar(resolve(&ctx, "Other!A2")).unwrap(),
            FormulaValue::Empty
        );

        // Names evaluated below the cell still see it as open
        let child = ctx
            .enter(EvalKey::Name {
                sheet: 0,
                name: "n".into(),
            })
            .unwrap();
        assert_eq!(
            child.deref_scalar(resolve(&child, "A2")).unwrap(),
            FormulaValue::Error(ErrorCode::Ref)
        );
    }

    #[test]
    fn test_enter_detects_cycles_and_depth() {
        let config = EvaluatorConfig::default().with_max_depth(2);
        let wb = workbook();
        let root = EvaluationContext::for_workbook(&config, &wb, 0, 0, 0);
        let name = |n: &str| EvalKey::Name {
            sheet: 0,
            name: n.into(),
        };

        let a = root.enter(name("a")).unwrap();
        assert!(a.enter(name("a")).is_none());
        let b = a.enter(name("b")).unwrap();
        assert_eq!(b.depth(), 2);
        assert!(b.enter(name("c")).is_none());
        assert!(root.enter(root.key().clone()).is_none());
    }

    #[test]
    fn test_number_to_text_uses_separator() {
        let config = EvaluatorConfig::default().with_decimal_separator(',');
        let wb = workbook();
        let ctx = EvaluationContext::for_workbook(&config, &wb, 0, 0, 0);
        assert_eq!(ctx.number_to_text(1.5), "1,5");
        assert_eq!(ctx.to_text(&FormulaValue::Boolean(true)), Ok("TRUE".to_string()));
    }
}
