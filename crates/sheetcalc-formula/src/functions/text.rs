//! Text functions
//!
//! Positions and lengths count characters, not bytes. Numbers are rendered
//! with the context's decimal separator before text functions see them.

use sheetcalc_core::ErrorCode;

use super::{finish, flatten, number_arg, optional_number, scalar, text_arg};
use crate::context::EvaluationContext;
use crate::error::FormulaResult;
use crate::value::{parse_number_text, FormulaValue};

/// Longest string a cell can hold
const MAX_TEXT_LEN: usize = 32_767;

fn take_left(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn take_right(s: &str, n: usize) -> String {
    let len = s.chars().count();
    if n >= len {
        return s.to_string();
    }
    s.chars().skip(len - n).collect()
}

fn take_mid(s: &str, start_1based: usize, n: usize) -> String {
    s.chars().skip(start_1based - 1).take(n).collect()
}

/// A character count argument: truncated, negative is `#VALUE!`
fn count_arg(args: &[FormulaValue], index: usize, default: f64) -> Result<usize, ErrorCode> {
    let n = optional_number(args, index, default)?.trunc();
    if n < 0.0 {
        Err(ErrorCode::Value)
    } else {
        Ok(n as usize)
    }
}

/// LEN(text)
pub fn fn_len(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(text_arg(args, 0, ctx).map(|s| s.chars().count() as f64))
}

/// LEFT(text, [num_chars])
pub fn fn_left(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let left = || -> Result<String, ErrorCode> {
        let text = text_arg(args, 0, ctx)?;
        let n = count_arg(args, 1, 1.0)?;
        Ok(take_left(&text, n))
    };
    finish(left())
}

/// RIGHT(text, [num_chars])
pub fn fn_right(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let right = || -> Result<String, ErrorCode> {
        let text = text_arg(args, 0, ctx)?;
        let n = count_arg(args, 1, 1.0)?;
        Ok(take_right(&text, n))
    };
    finish(right())
}

/// MID(text, start_num, num_chars)
pub fn fn_mid(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mid = || -> Result<String, ErrorCode> {
        let text = text_arg(args, 0, ctx)?;
        let start = number_arg(args, 1)?.trunc();
        let n = count_arg(args, 2, 0.0)?;
        if start < 1.0 {
            return Err(ErrorCode::Value);
        }
        Ok(take_mid(&text, start as usize, n))
    };
    finish(mid())
}

/// LOWER(text)
pub fn fn_lower(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(text_arg(args, 0, ctx).map(|s| s.to_lowercase()))
}

/// UPPER(text)
pub fn fn_upper(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(text_arg(args, 0, ctx).map(|s| s.to_uppercase()))
}

/// PROPER(text) - Capitalizes the first letter of each word
pub fn fn_proper(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(text_arg(args, 0, ctx).map(|text| {
        let mut result = String::with_capacity(text.len());
        let mut capitalize_next = true;
        for ch in text.chars() {
            if !ch.is_alphabetic() {
                result.push(ch);
                capitalize_next = true;
            } else if capitalize_next {
                result.extend(ch.to_uppercase());
                capitalize_next = false;
            } else {
                result.extend(ch.to_lowercase());
            }
        }
        result
    }))
}

/// TRIM(text) - Drops leading/trailing spaces and collapses inner runs to one
pub fn fn_trim(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(text_arg(args, 0, ctx).map(|s| {
        s.split(' ')
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }))
}

/// CONCATENATE(text1, [text2], ...)
pub fn fn_concatenate(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut result = String::new();
    for arg in args {
        match ctx.to_text(scalar(arg)) {
            Ok(s) => result.push_str(&s),
            Err(e) => return Ok(FormulaValue::Error(e)),
        }
    }
    finish(limit(result))
}

/// CONCAT(text1, [text2], ...) - Like CONCATENATE, but joins whole areas
pub fn fn_concat(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut result = String::new();
    for value in flatten(args) {
        match ctx.to_text(value) {
            Ok(s) => result.push_str(&s),
            Err(e) => return Ok(FormulaValue::Error(e)),
        }
    }
    finish(limit(result))
}

fn limit(text: String) -> Result<String, ErrorCode> {
    if text.chars().count() > MAX_TEXT_LEN {
        Err(ErrorCode::Value)
    } else {
        Ok(text)
    }
}

/// EXACT(text1, text2) - Case-sensitive comparison
pub fn fn_exact(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let exact = || -> Result<bool, ErrorCode> { Ok(text_arg(args, 0, ctx)? == text_arg(args, 1, ctx)?) };
    finish(exact())
}

/// REPT(text, number_times)
pub fn fn_rept(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let rept = || -> Result<String, ErrorCode> {
        let text = text_arg(args, 0, ctx)?;
        let times = count_arg(args, 1, 0.0)?;
        if text.chars().count().saturating_mul(times) > MAX_TEXT_LEN {
            return Err(ErrorCode::Value);
        }
        Ok(text.repeat(times))
    };
    finish(rept())
}

/// FIND(find_text, within_text, [start_num]) - Case-sensitive position
pub fn fn_find(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(locate(args, ctx, false))
}

/// SEARCH(find_text, within_text, [start_num]) - Case-insensitive position
pub fn fn_search(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(locate(args, ctx, true))
}

/// 1-based character position of `find_text`; `#VALUE!` when absent
fn locate(args: &[FormulaValue], ctx: &EvaluationContext, ignore_case: bool) -> Result<f64, ErrorCode> {
    let mut find_text = text_arg(args, 0, ctx)?;
    let mut within_text = text_arg(args, 1, ctx)?;
    let start = optional_number(args, 2, 1.0)?.trunc();

    let within_len = within_text.chars().count();
    if start < 1.0 || start as usize > within_len + 1 {
        return Err(ErrorCode::Value);
    }
    let skip = start as usize - 1;
    if find_text.is_empty() {
        return Ok(start);
    }
    if ignore_case {
        find_text = find_text.to_lowercase();
        within_text = within_text.to_lowercase();
    }

    let haystack: String = within_text.chars().skip(skip).collect();
    match haystack.find(&find_text) {
        Some(byte_pos) => {
            let char_pos = haystack[..byte_pos].chars().count();
            Ok((skip + char_pos + 1) as f64)
        }
        None => Err(ErrorCode::Value),
    }
}

/// SUBSTITUTE(text, old_text, new_text, [instance_num])
///
/// Without `instance_num` every occurrence is replaced.
pub fn fn_substitute(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let substitute = || -> Result<String, ErrorCode> {
        let text = text_arg(args, 0, ctx)?;
        let old_text = text_arg(args, 1, ctx)?;
        let new_text = text_arg(args, 2, ctx)?;
        let instance = match args.get(3) {
            None | Some(FormulaValue::Empty) => None,
            Some(_) => {
                let n = number_arg(args, 3)?.trunc();
                if n < 1.0 {
                    return Err(ErrorCode::Value);
                }
                Some(n as usize)
            }
        };

        if old_text.is_empty() {
            return Ok(text);
        }
        let Some(n) = instance else {
            return Ok(text.replace(&old_text, &new_text));
        };
        match text.match_indices(&old_text).nth(n - 1) {
            Some((pos, _)) => Ok(format!(
                "{}{}{}",
                &text[..pos],
                new_text,
                &text[pos + old_text.len()..]
            )),
            None => Ok(text),
        }
    };
    finish(substitute())
}

/// VALUE(text) - Text that reads as a number, as a number
pub fn fn_value(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let value = args.first().map(scalar).unwrap_or(&FormulaValue::Empty);
    finish(match value {
        FormulaValue::Number(n) => Ok(*n),
        FormulaValue::Empty => Ok(0.0),
        FormulaValue::String(s) => parse_number_text(s).ok_or(ErrorCode::Value),
        FormulaValue::Error(e) => Err(*e),
        _ => Err(ErrorCode::Value),
    })
}

/// CHAR(number) - Character for a code point (1-255 maps through Latin-1)
pub fn fn_char(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let char_of = || -> Result<String, ErrorCode> {
        let n = number_arg(args, 0)?.trunc();
        if !(1.0..=255.0).contains(&n) {
            return Err(ErrorCode::Value);
        }
        char::from_u32(n as u32)
            .map(|c| c.to_string())
            .ok_or(ErrorCode::Value)
    };
    finish(char_of())
}

/// CODE(text) - Code point of the first character
pub fn fn_code(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let code = || -> Result<f64, ErrorCode> {
        let text = text_arg(args, 0, ctx)?;
        text.chars()
            .next()
            .map(|c| c as u32 as f64)
            .ok_or(ErrorCode::Value)
    };
    finish(code())
}
