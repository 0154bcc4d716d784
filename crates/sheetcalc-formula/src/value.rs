//! Values produced and consumed by formula evaluation

use lazy_regex::regex_is_match;
use sheetcalc_core::{CellRange, CellValue, ErrorCode};
use std::cmp::Ordering;

/// A reference whose sheet (and workbook) has been resolved
///
/// Only ever an intermediate: operators and most functions see the values it points
/// at, never the reference itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefValue {
    /// External workbook the reference points into; `None` for the evaluating workbook
    pub workbook: Option<String>,
    pub first_sheet: usize,
    pub last_sheet: usize,
    pub range: CellRange,
}

impl RefValue {
    pub fn new(sheet: usize, range: CellRange) -> Self {
        Self {
            workbook: None,
            first_sheet: sheet,
            last_sheet: sheet,
            range,
        }
    }

    pub fn is_single_cell(&self) -> bool {
        !self.is_3d() && self.range.is_single_cell()
    }

    /// Whether the reference spans more than one sheet
    pub fn is_3d(&self) -> bool {
        self.first_sheet != self.last_sheet
    }

    pub fn row_count(&self) -> u32 {
        self.range.row_count()
    }

    pub fn col_count(&self) -> u16 {
        self.range.col_count()
    }

    /// Whether both references point into the same workbook and sheets
    pub fn same_sheets(&self, other: &RefValue) -> bool {
        self.workbook == other.workbook
            && self.first_sheet == other.first_sheet
            && self.last_sheet == other.last_sheet
    }
}

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormulaValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Error(ErrorCode),
    /// An unresolved cell or area, dereferenced by whoever consumes it
    Reference(RefValue),
    Array(Vec<Vec<FormulaValue>>),
    /// A blank cell or an omitted argument
    #[default]
    Empty,
}

impl FormulaValue {
    pub fn string(s: impl Into<String>) -> Self {
        FormulaValue::String(s.into())
    }

    /// Convert to number, if possible
    ///
    /// Booleans count as 0/1, blanks as 0, and text only if it reads as a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            FormulaValue::String(s) => parse_number_text(s),
            FormulaValue::Empty => Some(0.0),
            FormulaValue::Array(rows) => rows.first()?.first()?.as_number(),
            FormulaValue::Error(_) | FormulaValue::Reference(_) => None,
        }
    }

    /// Convert to number for arithmetic; errors pass through, anything else is `#VALUE!`
    pub fn to_number(&self) -> Result<f64, ErrorCode> {
        match self {
            FormulaValue::Error(e) => Err(*e),
            FormulaValue::Array(rows) => match rows.first().and_then(|r| r.first()) {
                Some(first) => first.to_number(),
                None => Err(ErrorCode::Value),
            },
            v => v.as_number().ok_or(ErrorCode::Value),
        }
    }

    /// Convert to boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormulaValue::Boolean(b) => Some(*b),
            FormulaValue::Number(n) => Some(*n != 0.0),
            FormulaValue::String(s) => {
                if s.eq_ignore_ascii_case("TRUE") {
                    Some(true)
                } else if s.eq_ignore_ascii_case("FALSE") {
                    Some(false)
                } else {
                    None
                }
            }
            FormulaValue::Empty => Some(false),
            FormulaValue::Array(rows) => rows.first()?.first()?.as_bool(),
            FormulaValue::Error(_) | FormulaValue::Reference(_) => None,
        }
    }

    /// Convert to boolean; errors pass through, anything else is `#VALUE!`
    pub fn to_bool(&self) -> Result<bool, ErrorCode> {
        match self {
            FormulaValue::Error(e) => Err(*e),
            v => v.as_bool().ok_or(ErrorCode::Value),
        }
    }

    /// Text rendering used by concatenation and text functions
    pub fn as_string(&self) -> String {
        match self {
            FormulaValue::Number(n) => format_number(*n),
            FormulaValue::String(s) => s.clone(),
            FormulaValue::Boolean(true) => "TRUE".to_string(),
            FormulaValue::Boolean(false) => "FALSE".to_string(),
            FormulaValue::Error(e) => e.to_string(),
            FormulaValue::Empty => String::new(),
            FormulaValue::Array(rows) => rows
                .first()
                .and_then(|r| r.first())
                .map(FormulaValue::as_string)
                .unwrap_or_default(),
            FormulaValue::Reference(_) => ErrorCode::Value.to_string(),
        }
    }

    /// Text rendering; errors pass through
    pub fn to_text(&self) -> Result<String, ErrorCode> {
        match self {
            FormulaValue::Error(e) => Err(*e),
            FormulaValue::Reference(_) => Err(ErrorCode::Value),
            v => Ok(v.as_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error(_))
    }

    pub fn get_error(&self) -> Option<ErrorCode> {
        match self {
            FormulaValue::Error(e) => Some(*e),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FormulaValue::Empty)
    }
}

impl From<f64> for FormulaValue {
    fn from(n: f64) -> Self {
        FormulaValue::Number(n)
    }
}

impl From<bool> for FormulaValue {
    fn from(b: bool) -> Self {
        FormulaValue::Boolean(b)
    }
}

impl From<String> for FormulaValue {
    fn from(s: String) -> Self {
        FormulaValue::String(s)
    }
}

impl From<&str> for FormulaValue {
    fn from(s: &str) -> Self {
        FormulaValue::String(s.to_string())
    }
}

impl From<ErrorCode> for FormulaValue {
    fn from(e: ErrorCode) -> Self {
        FormulaValue::Error(e)
    }
}

impl From<&CellValue> for FormulaValue {
    fn from(value: &CellValue) -> Self {
        match value.effective_value() {
            CellValue::Empty | CellValue::Formula { .. } => FormulaValue::Empty,
            CellValue::Number(n) => FormulaValue::Number(*n),
            CellValue::String(s) => FormulaValue::String(s.clone()),
            CellValue::Boolean(b) => FormulaValue::Boolean(*b),
            CellValue::Error(e) => FormulaValue::Error(*e),
        }
    }
}

impl From<CellValue> for FormulaValue {
    fn from(value: CellValue) -> Self {
        FormulaValue::from(&value)
    }
}

impl From<FormulaValue> for CellValue {
    /// Store a result in a cell; arrays keep their top-left element
    fn from(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Empty => CellValue::Empty,
            FormulaValue::Number(n) => CellValue::Number(n),
            FormulaValue::String(s) => CellValue::String(s),
            FormulaValue::Boolean(b) => CellValue::Boolean(b),
            FormulaValue::Error(e) => CellValue::Error(e),
            FormulaValue::Reference(_) => CellValue::Error(ErrorCode::Value),
            FormulaValue::Array(rows) => rows
                .into_iter()
                .next()
                .and_then(|row| row.into_iter().next())
                .map(CellValue::from)
                .unwrap_or(CellValue::Empty),
        }
    }
}

/// Read text as a number the way value coercion does
///
/// Leading/trailing spaces are ignored and a trailing `%` divides by 100.
pub fn parse_number_text(text: &str) -> Option<f64> {
    let text = text.trim();
    let (digits, scale) = match text.strip_suffix('%') {
        Some(rest) => (rest.trim_end(), 0.01),
        None => (text, 1.0),
    };
    if !regex_is_match!(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?$", digits) {
        return None;
    }
    digits
        .parse::<f64>()
        .ok()
        .map(|n| n * scale)
        .filter(|n| n.is_finite())
}

/// Render a number the way a General-formatted cell shows it (15 significant digits)
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    let rounded: f64 = format!("{:.14e}", n).parse().unwrap_or(n);
    let abs = rounded.abs();
    if (1e-9..1e15).contains(&abs) {
        format!("{}", rounded)
    } else {
        let sci = format!("{:e}", rounded);
        match sci.split_once('e') {
            Some((mantissa, exp)) if exp.starts_with('-') => format!("{}E{}", mantissa, exp),
            Some((mantissa, exp)) => format!("{}E+{}", mantissa, exp),
            None => sci,
        }
    }
}

/// Rank of a value's type in comparisons: blank < number < text < boolean
fn type_rank(value: &FormulaValue) -> u8 {
    match value {
        FormulaValue::Empty => 0,
        FormulaValue::Number(_) => 1,
        FormulaValue::String(_) => 2,
        FormulaValue::Boolean(_) => 3,
        _ => 4,
    }
}

/// Compare two scalar values for the comparison operators
///
/// A blank operand takes the zero value of the other operand's type (0, "" or
/// FALSE). Otherwise values of different types order booleans above text above
/// numbers. Text compares case-insensitively. Errors must be handled by the caller.
pub fn compare_values(left: &FormulaValue, right: &FormulaValue) -> Ordering {
    let blank_as = |other: &FormulaValue| match other {
        FormulaValue::String(_) => FormulaValue::String(String::new()),
        FormulaValue::Boolean(_) => FormulaValue::Boolean(false),
        _ => FormulaValue::Number(0.0),
    };
    match (left, right) {
        (FormulaValue::Empty, FormulaValue::Empty) => Ordering::Equal,
        (FormulaValue::Empty, r) => compare_values(&blank_as(r), r),
        (l, FormulaValue::Empty) => compare_values(l, &blank_as(l)),
        (FormulaValue::Number(l), FormulaValue::Number(r)) => {
            l.partial_cmp(r).unwrap_or(Ordering::Equal)
        }
        (FormulaValue::String(l), FormulaValue::String(r)) => {
            l.to_lowercase().cmp(&r.to_lowercase())
        }
        (FormulaValue::Boolean(l), FormulaValue::Boolean(r)) => l.cmp(r),
        (l, r) => type_rank(l).cmp(&type_rank(r)),
    }
}
