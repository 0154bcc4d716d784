//! Cell, area and whole row/column references
//!
//! A [`Reference`] is what a formula token or an `INDIRECT` text names. It may carry a
//! [`SheetQualifier`] naming a sheet, a sheet range (`Sheet1:Sheet3!`) and an external
//! workbook (`[Book]Sheet1!`). Qualifiers keep the names as written: turning them into
//! sheet indices happens when a formula is evaluated, because the same parsed text can
//! be evaluated against different workbook states.
//!
//! Two textual styles are supported:
//! - A1: `$B$3`, `A1:C4`, `C:E`, `3:5`
//! - R1C1: `R3C2`, `R[-1]C[2]`, `RC`, bare `R3` / `C[1]` for whole rows/columns
//!
//! R1C1 offsets are resolved against an anchor cell while parsing, so a parsed
//! [`Reference`] always holds absolute grid positions.

use crate::cell::{CellAddress, CellRange};
use crate::{MAX_COLS, MAX_ROWS};
use lazy_regex::{regex_captures, regex_is_match};
use std::fmt;
use thiserror::Error;

/// A reference text that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid reference '{text}': {reason}")]
pub struct RefError {
    /// The offending text
    pub text: String,
    /// What was wrong with it
    pub reason: String,
}

impl RefError {
    fn new(text: &str, reason: impl Into<String>) -> Self {
        Self {
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

/// Sheet (and optionally workbook) qualification of a reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SheetQualifier {
    /// External workbook name, as written between `[` and `]`
    pub workbook: Option<String>,
    /// First (or only) sheet name
    pub first: String,
    /// Last sheet of a sheet range (`Sheet1:Sheet3!`)
    pub last: Option<String>,
}

impl SheetQualifier {
    /// Qualifier naming a single sheet of the current workbook
    pub fn sheet(name: impl Into<String>) -> Self {
        Self {
            workbook: None,
            first: name.into(),
            last: None,
        }
    }

    /// Qualifier naming a sheet of another workbook
    pub fn external(workbook: impl Into<String>, sheet: impl Into<String>) -> Self {
        Self {
            workbook: Some(workbook.into()),
            first: sheet.into(),
            last: None,
        }
    }

    /// Whether this names a range of sheets
    pub fn is_3d(&self) -> bool {
        self.last.is_some()
    }

    /// Parse the text in front of `!`, without the `!`
    ///
    /// `quoted` tells whether the text came from between single quotes (with `''`
    /// already unescaped). Unquoted names are limited to letters, digits, `_` and `.`.
    /// Names with leading or trailing whitespace are rejected either way.
    pub fn parse(body: &str, quoted: bool) -> Result<Self, RefError> {
        let (workbook, sheets) = match body.strip_prefix('[') {
            Some(rest) => {
                let (book, sheets) = rest
                    .split_once(']')
                    .ok_or_else(|| RefError::new(body, "unterminated workbook name"))?;
                if book.is_empty() || book.trim() != book {
                    return Err(RefError::new(body, "invalid workbook name"));
                }
                (Some(book.to_string()), sheets)
            }
            None => (None, body),
        };

        let (first, last) = match sheets.split_once(':') {
            Some((first, last)) => (first, Some(last)),
            None => (sheets, None),
        };

        let check = |name: &str| -> Result<String, RefError> {
            if name.is_empty() {
                return Err(RefError::new(body, "empty sheet name"));
            }
            if name.trim() != name {
                return Err(RefError::new(body, "sheet name has stray whitespace"));
            }
            if !quoted && !name.chars().all(is_unquoted_name_char) {
                return Err(RefError::new(body, "sheet name must be quoted"));
            }
            Ok(name.to_string())
        };

        Ok(Self {
            workbook,
            first: check(first)?,
            last: last.map(check).transpose()?,
        })
    }
}

impl fmt::Display for SheetQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sheets = self.first.clone();
        if let Some(last) = &self.last {
            sheets.push(':');
            sheets.push_str(last);
        }

        let needs_quotes = needs_quoting(&self.first)
            || self.last.as_deref().map_or(false, needs_quoting)
            || self
                .workbook
                .as_deref()
                .map_or(false, |book| !book.chars().all(is_unquoted_name_char));

        let body = match &self.workbook {
            Some(book) => format!("[{}]{}", book, sheets),
            None => sheets,
        };

        if needs_quotes {
            write!(f, "'{}'!", body.replace('\'', "''"))
        } else {
            write!(f, "{}!", body)
        }
    }
}

/// Syntactic shape of a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefSpan {
    /// A single cell (`B3`)
    Cell,
    /// A rectangular area (`A1:C4`)
    Area,
    /// Whole columns (`C:E`, R1C1 `C3`)
    Columns,
    /// Whole rows (`3:5`, R1C1 `R3`)
    Rows,
}

/// A reference to a cell, an area, or whole rows/columns
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reference {
    /// Optional sheet/workbook qualification
    pub sheet: Option<SheetQualifier>,
    /// Covered cells, normalized top-left to bottom-right
    pub range: CellRange,
    /// How the reference was written
    pub span: RefSpan,
}

impl Reference {
    /// Reference to a single cell
    pub fn cell(addr: CellAddress) -> Self {
        Self {
            sheet: None,
            range: CellRange::single(addr),
            span: RefSpan::Cell,
        }
    }

    /// Reference to the area spanned by two corners, in any order
    pub fn area(a: CellAddress, b: CellAddress) -> Self {
        Self {
            sheet: None,
            range: CellRange::new(a, b),
            span: RefSpan::Area,
        }
    }

    /// Whole columns `first..=last`
    pub fn columns(first: u16, last: u16, first_absolute: bool, last_absolute: bool) -> Self {
        Self {
            sheet: None,
            range: CellRange::new(
                CellAddress::with_absolute(0, first, true, first_absolute),
                CellAddress::with_absolute(MAX_ROWS - 1, last, true, last_absolute),
            ),
            span: RefSpan::Columns,
        }
    }

    /// Whole rows `first..=last`
    pub fn rows(first: u32, last: u32, first_absolute: bool, last_absolute: bool) -> Self {
        Self {
            sheet: None,
            range: CellRange::new(
                CellAddress::with_absolute(first, 0, first_absolute, true),
                CellAddress::with_absolute(last, MAX_COLS - 1, last_absolute, true),
            ),
            span: RefSpan::Rows,
        }
    }

    /// Attach a sheet qualifier
    pub fn with_sheet(mut self, sheet: SheetQualifier) -> Self {
        self.sheet = Some(sheet);
        self
    }

    /// Top-left cell
    pub fn first(&self) -> CellAddress {
        self.range.start
    }

    /// Bottom-right cell; `None` for a single-cell reference
    pub fn last(&self) -> Option<CellAddress> {
        match self.span {
            RefSpan::Cell => None,
            _ => Some(self.range.end),
        }
    }

    pub fn is_single_cell(&self) -> bool {
        self.span == RefSpan::Cell
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(self, ReferenceStyle::A1))
    }
}

/// Addressing style used by [`format`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceStyle {
    A1,
    /// R1C1, with relative components written as offsets from `anchor`
    R1C1 { anchor: CellAddress },
}

/// Parse an A1-style reference, optionally sheet/workbook qualified
///
/// Whitespace is tolerated around the coordinates (`Sheet1! B1 : C3 `) but not around
/// the qualifier (` Sheet1!A1`, `'Sheet1' !A1`, `'Sheet1 '!A1`) nor inside a
/// coordinate (`A 1`).
///
/// ```
/// use sheetcalc_core::{parse_a1, RefSpan};
///
/// let r = parse_a1("'John''s sales'!A1:C1").unwrap();
/// assert_eq!(r.sheet.unwrap().first, "John's sales");
/// assert_eq!(r.span, RefSpan::Area);
///
/// assert!(parse_a1("C").is_err());
/// ```
pub fn parse_a1(text: &str) -> Result<Reference, RefError> {
    let (sheet, body) = split_qualifier(text)?;
    let reference = parse_a1_body(body).map_err(|reason| RefError::new(text, reason))?;
    Ok(Reference { sheet, ..reference })
}

/// Parse an R1C1-style reference, resolving offsets against `anchor`
///
/// ```
/// use sheetcalc_core::{parse_r1c1, CellAddress, format, ReferenceStyle};
///
/// let c3 = CellAddress::new(2, 2);
/// let r = parse_r1c1("R[-1]C[1]", c3).unwrap();
/// assert_eq!(format(&r, ReferenceStyle::A1), "D2");
/// ```
pub fn parse_r1c1(text: &str, anchor: CellAddress) -> Result<Reference, RefError> {
    let (sheet, body) = split_qualifier(text)?;
    let reference =
        parse_r1c1_body(body, anchor).map_err(|reason| RefError::new(text, reason))?;
    Ok(Reference { sheet, ..reference })
}

/// Render a reference in the requested style
pub fn format(reference: &Reference, style: ReferenceStyle) -> String {
    let mut out = reference
        .sheet
        .as_ref()
        .map(|q| q.to_string())
        .unwrap_or_default();

    let range = &reference.range;
    match style {
        ReferenceStyle::A1 => match reference.span {
            RefSpan::Cell => out.push_str(&range.start.to_a1_string()),
            RefSpan::Area => {
                out.push_str(&range.start.to_a1_string());
                out.push(':');
                out.push_str(&range.end.to_a1_string());
            }
            RefSpan::Columns => {
                out.push_str(&a1_column(range.start));
                out.push(':');
                out.push_str(&a1_column(range.end));
            }
            RefSpan::Rows => {
                out.push_str(&a1_row(range.start));
                out.push(':');
                out.push_str(&a1_row(range.end));
            }
        },
        ReferenceStyle::R1C1 { anchor } => {
            let row = |a: CellAddress| r1c1_component('R', a.row as i64, a.row_absolute, anchor.row as i64);
            let col = |a: CellAddress| r1c1_component('C', a.col as i64, a.col_absolute, anchor.col as i64);
            let (first, last) = match reference.span {
                RefSpan::Cell => (row(range.start) + &col(range.start), None),
                RefSpan::Area => (
                    row(range.start) + &col(range.start),
                    Some(row(range.end) + &col(range.end)),
                ),
                RefSpan::Columns => (col(range.start), Some(col(range.end))),
                RefSpan::Rows => (row(range.start), Some(row(range.end))),
            };
            out.push_str(&first);
            if let Some(last) = last {
                let whole_line = matches!(reference.span, RefSpan::Columns | RefSpan::Rows);
                if !(whole_line && last == first) {
                    out.push(':');
                    out.push_str(&last);
                }
            }
        }
    }
    out
}

/// Quote a sheet name for use in formula text, if it needs quoting
///
/// ```
/// use sheetcalc_core::quote_sheet_name;
///
/// assert_eq!(quote_sheet_name("ProfitAndLoss"), "ProfitAndLoss");
/// assert_eq!(quote_sheet_name("my sheet"), "'my sheet'");
/// assert_eq!(quote_sheet_name("John's"), "'John''s'");
/// ```
pub fn quote_sheet_name(name: &str) -> String {
    if needs_quoting(name) {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}

fn is_unquoted_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Names that would be misread without quotes: special characters, a leading digit,
/// or something that looks like an A1 or R1C1 reference.
fn needs_quoting(name: &str) -> bool {
    if name.is_empty() || !name.chars().all(is_unquoted_name_char) {
        return true;
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return true;
    }
    if let Some((_, letters, _)) = regex_captures!(r"^([A-Za-z]{1,3})([0-9]+)$", name) {
        if CellAddress::letters_to_column(letters).is_ok() {
            return true;
        }
    }
    regex_is_match!(r"^(?i)(r[0-9]*c[0-9]*|r[0-9]*|c[0-9]*)$", name)
}

/// Split `qualifier!body`, validating the qualifier strictly
fn split_qualifier(text: &str) -> Result<(Option<SheetQualifier>, &str), RefError> {
    if let Some(rest) = text.strip_prefix('\'') {
        let mut name = String::new();
        let mut chars = rest.char_indices();
        loop {
            match chars.next() {
                Some((_, '\'')) => match chars.clone().next() {
                    Some((_, '\'')) => {
                        chars.next();
                        name.push('\'');
                    }
                    Some((i, '!')) => {
                        let qualifier = SheetQualifier::parse(&name, true)?;
                        return Ok((Some(qualifier), &rest[i + 1..]));
                    }
                    _ => {
                        return Err(RefError::new(text, "expected '!' after quoted sheet name"))
                    }
                },
                Some((_, c)) => name.push(c),
                None => return Err(RefError::new(text, "unterminated quoted sheet name")),
            }
        }
    }

    match text.split_once('!') {
        Some((prefix, body)) => Ok((Some(SheetQualifier::parse(prefix, false)?), body)),
        None => Ok((None, text)),
    }
}

fn parse_a1_body(body: &str) -> Result<Reference, String> {
    let (first, last) = match body.split_once(':') {
        Some((a, b)) => (a.trim(), Some(b.trim())),
        None => (body.trim(), None),
    };

    let Some(last) = last else {
        let addr = CellAddress::parse(first).map_err(|e| e.to_string())?;
        return Ok(Reference::cell(addr));
    };

    if let (Ok(a), Ok(b)) = (CellAddress::parse(first), CellAddress::parse(last)) {
        return Ok(Reference::area(a, b));
    }

    let column = |s: &str| -> Option<(u16, bool)> {
        let (_, dollar, letters) = regex_captures!(r"^(\$?)([A-Za-z]{1,3})$", s)?;
        let col = CellAddress::letters_to_column(letters).ok()?;
        Some((col, !dollar.is_empty()))
    };
    if let (Some((a, a_abs)), Some((b, b_abs))) = (column(first), column(last)) {
        return Ok(Reference::columns(a, b, a_abs, b_abs));
    }

    let row = |s: &str| -> Option<(u32, bool)> {
        let (_, dollar, digits) = regex_captures!(r"^(\$?)([0-9]+)$", s)?;
        let row = CellAddress::parse_row_number(digits).ok()?;
        Some((row, !dollar.is_empty()))
    };
    if let (Some((a, a_abs)), Some((b, b_abs))) = (row(first), row(last)) {
        return Ok(Reference::rows(a, b, a_abs, b_abs));
    }

    Err(format!("'{}' is not an A1 reference", body.trim()))
}

/// One side of an R1C1 reference, as parsed
enum R1C1Part {
    Cell(CellAddress),
    Row(u32, bool),
    Col(u16, bool),
}

fn parse_r1c1_body(body: &str, anchor: CellAddress) -> Result<Reference, String> {
    let (first, last) = match body.split_once(':') {
        Some((a, b)) => (a.trim(), Some(b.trim())),
        None => (body.trim(), None),
    };

    let first = parse_r1c1_part(first, anchor)?;
    let last = last.map(|s| parse_r1c1_part(s, anchor)).transpose()?;

    match (first, last) {
        (R1C1Part::Cell(a), None) => Ok(Reference::cell(a)),
        (R1C1Part::Cell(a), Some(R1C1Part::Cell(b))) => Ok(Reference::area(a, b)),
        (R1C1Part::Row(r, abs), None) => Ok(Reference::rows(r, r, abs, abs)),
        (R1C1Part::Row(a, a_abs), Some(R1C1Part::Row(b, b_abs))) => {
            Ok(Reference::rows(a, b, a_abs, b_abs))
        }
        (R1C1Part::Col(c, abs), None) => Ok(Reference::columns(c, c, abs, abs)),
        (R1C1Part::Col(a, a_abs), Some(R1C1Part::Col(b, b_abs))) => {
            Ok(Reference::columns(a, b, a_abs, b_abs))
        }
        _ => Err("mismatched R1C1 range endpoints".into()),
    }
}

fn parse_r1c1_part(text: &str, anchor: CellAddress) -> Result<R1C1Part, String> {
    if let Some((_, row_off, row_abs, col_off, col_abs)) = regex_captures!(
        r"^[Rr](?:\[([+-]?[0-9]+)\]|([0-9]+))?[Cc](?:\[([+-]?[0-9]+)\]|([0-9]+))?$",
        text
    ) {
        let (row, row_absolute) =
            resolve_component(row_off, row_abs, anchor.row as i64, MAX_ROWS as i64)?;
        let (col, col_absolute) =
            resolve_component(col_off, col_abs, anchor.col as i64, MAX_COLS as i64)?;
        return Ok(R1C1Part::Cell(CellAddress::with_absolute(
            row as u32,
            col as u16,
            row_absolute,
            col_absolute,
        )));
    }
    if let Some((_, off, abs)) = regex_captures!(r"^[Rr](?:\[([+-]?[0-9]+)\]|([0-9]+))?$", text) {
        let (row, absolute) = resolve_component(off, abs, anchor.row as i64, MAX_ROWS as i64)?;
        return Ok(R1C1Part::Row(row as u32, absolute));
    }
    if let Some((_, off, abs)) = regex_captures!(r"^[Cc](?:\[([+-]?[0-9]+)\]|([0-9]+))?$", text) {
        let (col, absolute) = resolve_component(off, abs, anchor.col as i64, MAX_COLS as i64)?;
        return Ok(R1C1Part::Col(col as u16, absolute));
    }
    Err(format!("'{}' is not an R1C1 reference", text))
}

/// Turn `[offset]`, `n` or nothing into a 0-based index and an absolute flag
fn resolve_component(
    offset: &str,
    absolute: &str,
    anchor: i64,
    limit: i64,
) -> Result<(i64, bool), String> {
    let (index, is_absolute) = if !absolute.is_empty() {
        let n: i64 = absolute
            .parse()
            .map_err(|_| format!("invalid index '{}'", absolute))?;
        (n - 1, true)
    } else if !offset.is_empty() {
        let delta: i64 = offset
            .parse()
            .map_err(|_| format!("invalid offset '{}'", offset))?;
        (anchor + delta, false)
    } else {
        (anchor, false)
    };

    if !(0..limit).contains(&index) {
        return Err(format!("position {} is outside the grid", index + 1));
    }
    Ok((index, is_absolute))
}

fn a1_column(addr: CellAddress) -> String {
    let dollar = if addr.col_absolute { "$" } else { "" };
    format!("{}{}", dollar, CellAddress::column_to_letters(addr.col))
}

fn a1_row(addr: CellAddress) -> String {
    let dollar = if addr.row_absolute { "$" } else { "" };
    format!("{}{}", dollar, addr.row + 1)
}

fn r1c1_component(axis: char, index: i64, absolute: bool, anchor: i64) -> String {
    if absolute {
        format!("{}{}", axis, index + 1)
    } else if index == anchor {
        axis.to_string()
    } else {
        format!("{}[{}]", axis, index - anchor)
    }
}
