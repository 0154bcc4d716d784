//! Functions that produce or inspect references
//!
//! ROW, COLUMN, ROWS, COLUMNS and OFFSET receive their arguments unresolved so
//! they can see the reference itself rather than the values behind it.

use log::debug;
use sheetcalc_core::{
    format, parse_a1, parse_r1c1, quote_sheet_name, CellAddress, CellRange, ErrorCode, Reference,
    ReferenceStyle, SheetQualifier, MAX_COLS, MAX_ROWS,
};

use super::{finish, optional_number, scalar};
use crate::context::EvaluationContext;
use crate::error::FormulaResult;
use crate::evaluator::evaluate_name;
use crate::value::{FormulaValue, RefValue};

/// ROW([reference]) - Row number of the top-left cell, or of the current cell
pub fn fn_row(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(match args.first() {
        None | Some(FormulaValue::Empty) => FormulaValue::Number((ctx.current_row + 1) as f64),
        Some(FormulaValue::Reference(r)) => FormulaValue::Number((r.range.start.row + 1) as f64),
        Some(FormulaValue::Error(e)) => FormulaValue::Error(*e),
        Some(_) => FormulaValue::Error(ErrorCode::Value),
    })
}

/// COLUMN([reference]) - Column number of the top-left cell, or of the current cell
pub fn fn_column(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(match args.first() {
        None | Some(FormulaValue::Empty) => FormulaValue::Number((ctx.current_col + 1) as f64),
        Some(FormulaValue::Reference(r)) => FormulaValue::Number((r.range.start.col + 1) as f64),
        Some(FormulaValue::Error(e)) => FormulaValue::Error(*e),
        Some(_) => FormulaValue::Error(ErrorCode::Value),
    })
}

/// Height and width of whatever ROWS/COLUMNS was given
///
/// Text is read as an A1 reference, so `COLUMNS("A1:C2")` is 3.
fn dimensions(value: &FormulaValue) -> Result<(u32, u32), ErrorCode> {
    match value {
        FormulaValue::Reference(r) => Ok((r.row_count(), r.col_count() as u32)),
        FormulaValue::Array(rows) => Ok((
            rows.len() as u32,
            rows.first().map_or(0, |row| row.len() as u32),
        )),
        FormulaValue::String(text) => match parse_a1(text) {
            Ok(reference) => Ok((
                reference.range.row_count(),
                reference.range.col_count() as u32,
            )),
            Err(_) => Err(ErrorCode::Value),
        },
        FormulaValue::Error(e) => Err(*e),
        _ => Ok((1, 1)),
    }
}

/// ROWS(array) - Number of rows in a reference or array
pub fn fn_rows(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let arg = args.first().unwrap_or(&FormulaValue::Empty);
    finish(dimensions(arg).map(|(rows, _)| rows as f64))
}

/// COLUMNS(array) - Number of columns in a reference or array
pub fn fn_columns(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let arg = args.first().unwrap_or(&FormulaValue::Empty);
    finish(dimensions(arg).map(|(_, cols)| cols as f64))
}

/// OFFSET(reference, rows, cols, [height], [width]) - A reference shifted and resized
///
/// Height and width default to the size of `reference`. A result that leaves
/// the grid is `#REF!`.
pub fn fn_offset(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let base = match args.first() {
        Some(FormulaValue::Reference(r)) if !r.is_3d() => r.clone(),
        Some(FormulaValue::Error(e)) => return Ok(FormulaValue::Error(*e)),
        _ => return Ok(FormulaValue::Error(ErrorCode::Value)),
    };

    // The remaining arguments arrive unresolved too
    let mut numbers = Vec::with_capacity(args.len() - 1);
    for arg in &args[1..] {
        numbers.push(ctx.deref_scalar(arg.clone())?);
    }

    let offset = || -> Result<FormulaValue, ErrorCode> {
        let rows = optional_number(&numbers, 0, 0.0)?.trunc() as i64;
        let cols = optional_number(&numbers, 1, 0.0)?.trunc() as i64;
        let height = optional_number(&numbers, 2, base.row_count() as f64)?.trunc() as i64;
        let width = optional_number(&numbers, 3, base.col_count() as f64)?.trunc() as i64;
        if height < 1 || width < 1 {
            return Err(ErrorCode::Ref);
        }

        let start = base.range.start.offset(rows, cols).ok_or(ErrorCode::Ref)?;
        let end = start.offset(height - 1, width - 1).ok_or(ErrorCode::Ref)?;
        Ok(FormulaValue::Reference(RefValue {
            range: CellRange::new(start, end),
            ..base.clone()
        }))
    };
    finish(offset())
}

/// How INDIRECT's second argument selects the reference style
fn a1_style(flag: Option<&FormulaValue>) -> Result<bool, ErrorCode> {
    match flag.map(scalar) {
        None => Ok(true),
        Some(FormulaValue::Empty) => Ok(false),
        Some(FormulaValue::Boolean(b)) => Ok(*b),
        Some(FormulaValue::Number(n)) => Ok(*n != 0.0),
        Some(FormulaValue::String(s)) if s.eq_ignore_ascii_case("TRUE") => Ok(true),
        Some(FormulaValue::String(s)) if s.eq_ignore_ascii_case("FALSE") => Ok(false),
        Some(FormulaValue::Error(e)) => Err(*e),
        Some(_) => Err(ErrorCode::Value),
    }
}

/// INDIRECT(ref_text, [a1]) - The reference named by a text
///
/// The text may be an A1 or R1C1 reference (R1C1 relative parts count from the
/// current cell) or a defined name that evaluates to a reference. Anything
/// else is `#REF!`.
pub fn fn_indirect(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let a1 = match a1_style(args.get(1)) {
        Ok(a1) => a1,
        Err(e) => return Ok(FormulaValue::Error(e)),
    };
    let text = match args.first().map(|v| ctx.to_text(scalar(v))) {
        Some(Ok(text)) => text,
        Some(Err(e)) => return Ok(FormulaValue::Error(e)),
        None => return Ok(FormulaValue::Error(ErrorCode::Value)),
    };

    let parsed = if a1 {
        parse_a1(&text)
    } else {
        parse_r1c1(&text, ctx.current_cell())
    };

    match parsed {
        Ok(reference) => ctx.resolve_reference(&reference),
        Err(err) => match evaluate_name(&text, ctx)? {
            value @ FormulaValue::Reference(_) => Ok(value),
            _ => {
                debug!("INDIRECT: {}", err);
                Ok(FormulaValue::Error(ErrorCode::Ref))
            }
        },
    }
}

/// ADDRESS(row_num, column_num, [abs_num], [a1], [sheet_text]) - A cell address as text
///
/// `abs_num` is 1 for `$A$1`, 2 for `A$1`, 3 for `$A1` and 4 for `A1`.
pub fn fn_address(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let address = || -> Result<String, ErrorCode> {
        let row = optional_number(args, 0, 0.0)?.trunc();
        let col = optional_number(args, 1, 0.0)?.trunc();
        let abs_num = optional_number(args, 2, 1.0)?.trunc();
        let a1 = match args.get(3).map(scalar) {
            None => true,
            Some(FormulaValue::Empty) => false,
            Some(v) => v.to_bool()?,
        };
        let sheet = match args.get(4).map(scalar) {
            None | Some(FormulaValue::Empty) => None,
            Some(v) => Some(v.to_text()?),
        };

        if !(1.0..=MAX_ROWS as f64).contains(&row) || !(1.0..=MAX_COLS as f64).contains(&col) {
            return Err(ErrorCode::Value);
        }
        let (row_absolute, col_absolute) = match abs_num as i64 {
            1 => (true, true),
            2 => (true, false),
            3 => (false, true),
            4 => (false, false),
            _ => return Err(ErrorCode::Value),
        };

        if a1 {
            let cell = CellAddress::with_absolute(row as u32 - 1, col as u16 - 1, row_absolute, col_absolute);
            let mut reference = Reference::cell(cell);
            if let Some(sheet) = sheet {
                reference = reference.with_sheet(SheetQualifier::sheet(sheet));
            }
            Ok(format(&reference, ReferenceStyle::A1))
        } else {
            // R1C1 relative parts are written as the given numbers, not as offsets
            let part = |axis: char, n: f64, absolute: bool| {
                if absolute {
                    format!("{}{}", axis, n)
                } else {
                    format!("{}[{}]", axis, n)
                }
            };
            let cell = part('R', row, row_absolute) + &part('C', col, col_absolute);
            Ok(match sheet {
                Some(sheet) => format!("{}!{}", quote_sheet_name(&sheet), cell),
                None => cell,
            })
        }
    };
    finish(address())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        assert_eq!(dimensions(&FormulaValue::string("A1:C2")), Ok((2, 3)));
        assert_eq!(dimensions(&FormulaValue::string("Sheet1!B:B")), Ok((MAX_ROWS, 1)));
        assert_eq!(dimensions(&FormulaValue::string("nope")), Err(ErrorCode::Value));
        assert_eq!(dimensions(&FormulaValue::Number(5.0)), Ok((1, 1)));
        let array = FormulaValue::Array(vec![vec![FormulaValue::Empty; 4]; 2]);
        assert_eq!(dimensions(&array), Ok((2, 4)));
    }

    #[test]
    fn test_a1_style_flag() {
        assert_eq!(a1_style(None), Ok(true));
        assert_eq!(a1_style(Some(&FormulaValue::Empty)), Ok(false));
        assert_eq!(a1_style(Some(&FormulaValue::Number(0.0))), Ok(false));
        assert_eq!(a1_style(Some(&FormulaValue::string("true"))), Ok(true));
        assert_eq!(a1_style(Some(&FormulaValue::string("flase"))), Err(ErrorCode::Value));
        assert_eq!(a1_style(Some(&FormulaValue::string(""))), Err(ErrorCode::Value));
    }
}
