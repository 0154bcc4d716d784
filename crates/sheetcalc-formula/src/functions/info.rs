//! Information functions

use sheetcalc_core::ErrorCode;

use super::scalar;
use crate::context::EvaluationContext;
use crate::error::FormulaResult;
use crate::value::FormulaValue;

fn first(args: &[FormulaValue]) -> &FormulaValue {
    args.first().map(scalar).unwrap_or(&FormulaValue::Empty)
}

/// ISBLANK(value)
pub fn fn_isblank(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(first(args).is_empty()))
}

/// ISNUMBER(value)
pub fn fn_isnumber(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(matches!(first(args), FormulaValue::Number(_))))
}

/// ISTEXT(value)
pub fn fn_istext(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(matches!(first(args), FormulaValue::String(_))))
}

/// ISNONTEXT(value) - TRUE for anything but text, blanks included
pub fn fn_isnontext(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(!matches!(first(args), FormulaValue::String(_))))
}

/// ISLOGICAL(value)
pub fn fn_islogical(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(matches!(first(args), FormulaValue::Boolean(_))))
}

/// ISERROR(value)
pub fn fn_iserror(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(first(args).is_error()))
}

/// ISERR(value) - Any error except `#N/A`
pub fn fn_iserr(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(matches!(
        first(args),
        FormulaValue::Error(e) if *e != ErrorCode::Na
    )))
}

/// ISNA(value)
pub fn fn_isna(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(matches!(
        first(args),
        FormulaValue::Error(ErrorCode::Na)
    )))
}

/// ISREF(value) - Whether the argument is a reference
pub fn fn_isref(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(matches!(
        args.first(),
        Some(FormulaValue::Reference(_))
    )))
}

/// NA()
pub fn fn_na(_args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Error(ErrorCode::Na))
}

/// ERROR.TYPE(error_val) - 1 for `#NULL!` through 7 for `#N/A`
pub fn fn_error_type(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(match first(args) {
        FormulaValue::Error(e) => FormulaValue::Number(e.type_number() as f64),
        _ => FormulaValue::Error(ErrorCode::Na),
    })
}

/// N(value) - Numbers pass, booleans become 0/1, everything else 0
pub fn fn_n(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(match first(args) {
        FormulaValue::Number(n) => FormulaValue::Number(*n),
        FormulaValue::Boolean(b) => FormulaValue::Number(if *b { 1.0 } else { 0.0 }),
        FormulaValue::Error(e) => FormulaValue::Error(*e),
        _ => FormulaValue::Number(0.0),
    })
}

/// T(value) - Text passes, everything else is ""
pub fn fn_t(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(match first(args) {
        FormulaValue::String(s) => FormulaValue::String(s.clone()),
        FormulaValue::Error(e) => FormulaValue::Error(*e),
        _ => FormulaValue::String(String::new()),
    })
}

/// FORMULATEXT(reference) - Formula of the referenced cell as text
pub fn fn_formulatext(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let r = match args.first() {
        Some(FormulaValue::Reference(r)) => r,
        Some(FormulaValue::Error(e)) => return Ok(FormulaValue::Error(*e)),
        _ => return Ok(FormulaValue::Error(ErrorCode::Value)),
    };
    Ok(match ctx.formula_text(r) {
        Some(text) if text.starts_with('=') => FormulaValue::String(text),
        Some(text) => FormulaValue::String(format!("={}", text)),
        None => FormulaValue::Error(ErrorCode::Na),
    })
}
