//! Math and aggregate functions

use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use sheetcalc_core::ErrorCode;

use super::{collect_numbers, finish, flatten, number_arg, optional_number};
use crate::context::EvaluationContext;
use crate::error::FormulaResult;
use crate::value::FormulaValue;

/// SUM(number1, [number2], ...) - Adds all numbers
pub fn fn_sum(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(collect_numbers(args).map(|numbers| numbers.iter().sum::<f64>()))
}

/// AVERAGE(number1, [number2], ...) - Arithmetic mean
pub fn fn_average(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(collect_numbers(args).and_then(|numbers| {
        if numbers.is_empty() {
            Err(ErrorCode::Div0)
        } else {
            Ok(numbers.iter().sum::<f64>() / numbers.len() as f64)
        }
    }))
}

/// MIN(number1, [number2], ...) - Smallest number, 0 if there are none
pub fn fn_min(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(collect_numbers(args).map(|numbers| {
        numbers
            .into_iter()
            .reduce(f64::min)
            .unwrap_or(0.0)
    }))
}

/// MAX(number1, [number2], ...) - Largest number, 0 if there are none
pub fn fn_max(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(collect_numbers(args).map(|numbers| {
        numbers
            .into_iter()
            .reduce(f64::max)
            .unwrap_or(0.0)
    }))
}

/// PRODUCT(number1, [number2], ...) - Multiplies all numbers
pub fn fn_product(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(collect_numbers(args).map(|numbers| {
        if numbers.is_empty() {
            0.0
        } else {
            numbers.iter().product::<f64>()
        }
    }))
}

/// COUNT(value1, [value2], ...) - Counts numbers
///
/// A value typed directly as an argument counts if it reads as a number;
/// inside areas and arrays only numbers count. Errors are never counted.
pub fn fn_count(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut count = 0;
    for arg in args {
        match arg {
            FormulaValue::Array(rows) => {
                count += rows
                    .iter()
                    .flatten()
                    .filter(|v| matches!(v, FormulaValue::Number(_)))
                    .count();
            }
            FormulaValue::Empty | FormulaValue::Error(_) => {}
            other => {
                if other.as_number().is_some() {
                    count += 1;
                }
            }
        }
    }
    Ok(FormulaValue::Number(count as f64))
}

/// COUNTA(value1, [value2], ...) - Counts non-blank values
pub fn fn_counta(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let count = flatten(args).filter(|v| !v.is_empty()).count();
    Ok(FormulaValue::Number(count as f64))
}

fn is_blank(value: &FormulaValue) -> bool {
    match value {
        FormulaValue::Empty => true,
        FormulaValue::String(s) => s.is_empty(),
        _ => false,
    }
}

/// COUNTBLANK(range) - Counts blank cells and empty strings
///
/// A reference counts its whole size, including cells past the part a large
/// area reads.
pub fn fn_countblank(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let Some(FormulaValue::Reference(r)) = args.first() else {
        let count = flatten(args).filter(|v| is_blank(v)).count();
        return Ok(FormulaValue::Number(count as f64));
    };
    let Some(rows) = ctx.read_area(r)? else {
        return Ok(FormulaValue::Error(ErrorCode::Ref));
    };
    let filled = rows.iter().flatten().filter(|v| !is_blank(v)).count() as u64;
    let sheets = (r.last_sheet - r.first_sheet + 1) as u64;
    let total = sheets * r.range.cell_count();
    Ok(FormulaValue::Number(total.saturating_sub(filled) as f64))
}

/// PI() - The constant pi
pub fn fn_pi(_args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(std::f64::consts::PI))
}

/// SQRT(number) - Square root
pub fn fn_sqrt(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(number_arg(args, 0).and_then(|n| {
        if n < 0.0 {
            Err(ErrorCode::Num)
        } else {
            Ok(n.sqrt())
        }
    }))
}

/// EXP(number) - e raised to a power
pub fn fn_exp(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(number_arg(args, 0).and_then(|n| checked(n.exp())))
}

/// LN(number) - Natural logarithm
pub fn fn_ln(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(number_arg(args, 0).and_then(|n| {
        if n <= 0.0 {
            Err(ErrorCode::Num)
        } else {
            Ok(n.ln())
        }
    }))
}

/// LOG10(number) - Base-10 logarithm
pub fn fn_log10(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(number_arg(args, 0).and_then(|n| {
        if n <= 0.0 {
            Err(ErrorCode::Num)
        } else {
            Ok(n.log10())
        }
    }))
}

/// LOG(number, [base]) - Logarithm, base 10 by default
pub fn fn_log(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let log = || -> Result<f64, ErrorCode> {
        let n = number_arg(args, 0)?;
        let base = optional_number(args, 1, 10.0)?;
        if n <= 0.0 || base <= 0.0 {
            return Err(ErrorCode::Num);
        }
        if base == 1.0 {
            return Err(ErrorCode::Div0);
        }
        Ok(n.ln() / base.ln())
    };
    finish(log())
}

/// ABS(number) - Absolute value
pub fn fn_abs(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(number_arg(args, 0).map(f64::abs))
}

/// INT(number) - Rounds down to the nearest integer
pub fn fn_int(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(number_arg(args, 0).map(f64::floor))
}

/// SIGN(number) - 1, 0 or -1
pub fn fn_sign(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(number_arg(args, 0).map(|n| {
        if n > 0.0 {
            1.0
        } else if n < 0.0 {
            -1.0
        } else {
            0.0
        }
    }))
}

/// ROUND(number, num_digits) - Rounds half away from zero
pub fn fn_round(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(round_args(args, RoundingStrategy::MidpointAwayFromZero))
}

/// ROUNDUP(number, num_digits) - Rounds away from zero
pub fn fn_roundup(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(round_args(args, RoundingStrategy::AwayFromZero))
}

/// ROUNDDOWN(number, num_digits) - Rounds toward zero
pub fn fn_rounddown(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(round_args(args, RoundingStrategy::ToZero))
}

/// TRUNC(number, [num_digits]) - Drops digits past `num_digits`
pub fn fn_trunc(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(round_args(args, RoundingStrategy::ToZero))
}

fn round_args(args: &[FormulaValue], strategy: RoundingStrategy) -> Result<f64, ErrorCode> {
    let number = number_arg(args, 0)?;
    let digits = optional_number(args, 1, 0.0)?;
    round_to(number, digits, strategy)
}

/// Round to `digits` decimal places (negative digits round left of the point)
///
/// The number is first cut to 15 significant digits, so `ROUND(2.675, 2)` sees
/// 2.675 rather than its binary neighbour 2.67499999...
pub(crate) fn round_to(number: f64, digits: f64, strategy: RoundingStrategy) -> Result<f64, ErrorCode> {
    if !number.is_finite() || digits.is_nan() {
        return Err(ErrorCode::Num);
    }
    let digits = digits.trunc().clamp(-400.0, 400.0) as i32;

    let Some(value) = to_decimal(number) else {
        return Ok(round_float(number, digits, strategy));
    };

    let rounded = if digits >= 0 {
        Some(value.round_dp_with_strategy(digits.min(28) as u32, strategy))
    } else {
        let shift = digits.unsigned_abs();
        if shift > 28 {
            return Ok(0.0);
        }
        let factor = Decimal::from_i128_with_scale(10_i128.pow(shift), 0);
        value
            .checked_div(factor)
            .map(|scaled| scaled.round_dp_with_strategy(0, strategy))
            .and_then(|scaled| scaled.checked_mul(factor))
    };

    // Through text so 3.142 comes back as the closest f64 to 3.142
    Ok(rounded
        .and_then(|d| d.to_string().parse::<f64>().ok())
        .unwrap_or_else(|| round_float(number, digits, strategy)))
}

fn to_decimal(number: f64) -> Option<Decimal> {
    Decimal::from_scientific(&format!("{:.14e}", number)).ok()
}

/// Rounding for magnitudes a `Decimal` cannot hold
fn round_float(number: f64, digits: i32, strategy: RoundingStrategy) -> f64 {
    let multiplier = 10_f64.powi(digits);
    let scaled = number * multiplier;
    if !scaled.is_finite() || multiplier == 0.0 {
        return number;
    }
    let rounded = match strategy {
        RoundingStrategy::MidpointAwayFromZero => scaled.round(),
        RoundingStrategy::AwayFromZero => {
            if scaled >= 0.0 {
                scaled.ceil()
            } else {
                scaled.floor()
            }
        }
        _ => scaled.trunc(),
    };
    rounded / multiplier
}

/// MOD(number, divisor) - Remainder with the sign of the divisor
pub fn fn_mod(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let modulo = || -> Result<f64, ErrorCode> {
        let number = number_arg(args, 0)?;
        let divisor = number_arg(args, 1)?;
        if divisor == 0.0 {
            return Err(ErrorCode::Div0);
        }
        // Excel's MOD: n - d*INT(n/d)
        checked(number - divisor * (number / divisor).floor())
    };
    finish(modulo())
}

/// POWER(number, power) - Same as the `^` operator
pub fn fn_power(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let result = number_arg(args, 0).and_then(|base| power(base, number_arg(args, 1)?));
    finish(result)
}

/// `base ^ exponent` for both POWER and the operator
pub(crate) fn power(base: f64, exponent: f64) -> Result<f64, ErrorCode> {
    if base == 0.0 {
        if exponent == 0.0 {
            return Err(ErrorCode::Num);
        }
        if exponent < 0.0 {
            return Err(ErrorCode::Div0);
        }
    }
    checked(base.powf(exponent))
}

/// RAND() - Uniform random number in [0, 1)
pub fn fn_rand(_args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(rand::thread_rng().gen::<f64>()))
}

/// RANDBETWEEN(bottom, top) - Random integer between two bounds, inclusive
pub fn fn_randbetween(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let between = || -> Result<f64, ErrorCode> {
        let bottom = number_arg(args, 0)?.ceil();
        let top = number_arg(args, 1)?.floor();
        if bottom > top {
            return Err(ErrorCode::Num);
        }
        let (bottom, top) = (bottom as i64, top as i64);
        Ok(rand::thread_rng().gen_range(bottom..=top) as f64)
    };
    finish(between())
}

/// NaN and infinities are `#NUM!`
fn checked(n: f64) -> Result<f64, ErrorCode> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(ErrorCode::Num)
    }
}
