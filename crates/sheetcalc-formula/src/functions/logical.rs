//! Logical functions

use sheetcalc_core::ErrorCode;

use super::{finish, number_arg, scalar};
use crate::context::EvaluationContext;
use crate::error::FormulaResult;
use crate::value::FormulaValue;

/// IF(condition, value_if_true, [value_if_false])
pub fn fn_if(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let condition = match args.first().map(|v| scalar(v).to_bool()) {
        Some(Ok(b)) => b,
        Some(Err(e)) => return Ok(FormulaValue::Error(e)),
        None => return Ok(FormulaValue::Error(ErrorCode::Value)),
    };

    let branch = if condition { args.get(1) } else { args.get(2) };
    Ok(match branch {
        Some(FormulaValue::Empty) => FormulaValue::Number(0.0),
        Some(value) => value.clone(),
        // Only an omitted value_if_false gets here
        None => FormulaValue::Boolean(false),
    })
}

/// CHOOSE(index, value1, [value2], ...) - Picks the index-th value
pub fn fn_choose(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let index = match number_arg(args, 0) {
        Ok(n) => n.trunc(),
        Err(e) => return Ok(FormulaValue::Error(e)),
    };
    if index < 1.0 || index >= args.len() as f64 {
        return Ok(FormulaValue::Error(ErrorCode::Value));
    }
    Ok(args[index as usize].clone())
}

/// TRUE() - Returns TRUE
pub fn fn_true(_args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(true))
}

/// FALSE() - Returns FALSE
pub fn fn_false(_args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(false))
}

/// AND(logical1, [logical2], ...) - TRUE if every value is true
pub fn fn_and(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(logicals(args).map(|values| values.iter().all(|b| *b)))
}

/// OR(logical1, [logical2], ...) - TRUE if any value is true
pub fn fn_or(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(logicals(args).map(|values| values.iter().any(|b| *b)))
}

/// XOR(logical1, [logical2], ...) - TRUE if an odd number of values are true
pub fn fn_xor(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(logicals(args).map(|values| values.iter().filter(|b| **b).count() % 2 == 1))
}

/// NOT(logical) - Reverses a logical value
pub fn fn_not(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let value = args.first().map(scalar).unwrap_or(&FormulaValue::Empty);
    finish(value.to_bool().map(|b| !b))
}

/// The truth values AND/OR/XOR work on
///
/// Direct arguments coerce like NOT does. Inside areas and arrays only numbers
/// and booleans count; text and blanks are skipped. With nothing left to look
/// at the result is `#VALUE!`.
fn logicals(args: &[FormulaValue]) -> Result<Vec<bool>, ErrorCode> {
    let mut values = Vec::new();
    for arg in args {
        match arg {
            FormulaValue::Array(rows) => {
                for value in rows.iter().flatten() {
                    match value {
                        FormulaValue::Boolean(b) => values.push(*b),
                        FormulaValue::Number(n) => values.push(*n != 0.0),
                        FormulaValue::Error(e) => return Err(*e),
                        _ => {}
                    }
                }
            }
            FormulaValue::Empty => {}
            other => values.push(other.to_bool()?),
        }
    }
    if values.is_empty() {
        Err(ErrorCode::Value)
    } else {
        Ok(values)
    }
}

/// The fallback of IFERROR and IFNA; an omitted one reads as 0
fn fallback(args: &[FormulaValue]) -> FormulaValue {
    match args.get(1) {
        Some(FormulaValue::Empty) | None => FormulaValue::Number(0.0),
        Some(value) => value.clone(),
    }
}

/// IFERROR(value, value_if_error)
pub fn fn_iferror(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match args.first() {
        Some(FormulaValue::Error(_)) => Ok(fallback(args)),
        Some(value) => Ok(value.clone()),
        None => Ok(FormulaValue::Error(ErrorCode::Value)),
    }
}

/// IFNA(value, value_if_na) - Only `#N/A` is replaced
pub fn fn_ifna(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match args.first() {
        Some(FormulaValue::Error(ErrorCode::Na)) => Ok(fallback(args)),
        Some(value) => Ok(value.clone()),
        None => Ok(FormulaValue::Error(ErrorCode::Value)),
    }
}

/// IFS(condition1, value1, [condition2, value2], ...) - Value of the first true condition
pub fn fn_ifs(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if args.len() % 2 != 0 {
        return Ok(FormulaValue::Error(ErrorCode::Value));
    }
    for pair in args.chunks(2) {
        match scalar(&pair[0]).to_bool() {
            Ok(true) => return Ok(pair[1].clone()),
            Ok(false) => {}
            Err(e) => return Ok(FormulaValue::Error(e)),
        }
    }
    Ok(FormulaValue::Error(ErrorCode::Na))
}
