//! Date functions over Excel serial numbers
//!
//! In the 1900 date system serial 1 is 1900-01-01 and serial 60 is the
//! non-existent 1900-02-29 that Excel keeps for Lotus compatibility. In the
//! 1904 system serial 0 is 1904-01-01. Which one applies comes from the
//! provider.

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, Timelike};
use sheetcalc_core::ErrorCode;

use super::{finish, number_arg};
use crate::context::EvaluationContext;
use crate::error::FormulaResult;
use crate::value::FormulaValue;

/// Serial of 9999-12-31 in the 1900 system
const MAX_SERIAL_1900: i64 = 2_958_465;

/// Year, month and day of a serial; day 0 only for serial 0 of the 1900 system
type Ymd = (i32, u32, u32);

fn date_1904(ctx: &EvaluationContext) -> bool {
    ctx.provider().date_1904()
}

fn epoch(date_1904: bool) -> Option<NaiveDate> {
    if date_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 31)
    }
}

fn max_serial(date_1904: bool) -> i64 {
    if date_1904 {
        MAX_SERIAL_1900 - 1462
    } else {
        MAX_SERIAL_1900
    }
}

/// Serial number of a calendar date
pub(crate) fn date_to_serial(date: NaiveDate, date_1904: bool) -> Option<i64> {
    let days = (date - epoch(date_1904)?).num_days();
    if !date_1904 && date >= NaiveDate::from_ymd_opt(1900, 3, 1)? {
        // Skip over the phantom 1900-02-29
        Some(days + 1)
    } else {
        Some(days)
    }
}

/// Calendar date of a serial number
pub(crate) fn serial_to_ymd(serial: i64, date_1904: bool) -> Option<Ymd> {
    if serial < 0 || serial > max_serial(date_1904) {
        return None;
    }
    if !date_1904 {
        match serial {
            0 => return Some((1900, 1, 0)),
            60 => return Some((1900, 2, 29)),
            _ => {}
        }
    }
    let days = if !date_1904 && serial > 60 { serial - 1 } else { serial };
    let date = epoch(date_1904)?.checked_add_signed(Duration::days(days))?;
    Some((date.year(), date.month(), date.day()))
}

/// DATE(year, month, day) - Serial number of a date
///
/// Years 0-1899 are offset by 1900. Months and days outside their normal
/// range roll over into neighbouring months and years.
pub fn fn_date(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let date = || -> Result<f64, ErrorCode> {
        let mut year = number_arg(args, 0)?.trunc() as i64;
        let month = number_arg(args, 1)?.trunc() as i64;
        let day = number_arg(args, 2)?.trunc() as i64;

        if (0..1900).contains(&year) {
            year += 1900;
        }
        if !(0..10_000).contains(&year) {
            return Err(ErrorCode::Num);
        }

        // 0-based month index so negative months roll back correctly
        let total_months = year * 12 + (month - 1);
        let norm_year = i32::try_from(total_months.div_euclid(12)).map_err(|_| ErrorCode::Num)?;
        let norm_month = total_months.rem_euclid(12) as u32 + 1;

        let date_1904 = date_1904(ctx);
        let first = NaiveDate::from_ymd_opt(norm_year, norm_month, 1).ok_or(ErrorCode::Num)?;
        let serial = date_to_serial(first, date_1904).ok_or(ErrorCode::Num)? + day - 1;
        if serial < 0 || serial > max_serial(date_1904) {
            return Err(ErrorCode::Num);
        }
        Ok(serial as f64)
    };
    finish(date())
}

fn date_part(
    args: &[FormulaValue],
    ctx: &EvaluationContext,
    part: fn(Ymd) -> u32,
) -> FormulaResult<FormulaValue> {
    let extract = || -> Result<f64, ErrorCode> {
        let serial = number_arg(args, 0)?.floor() as i64;
        let ymd = serial_to_ymd(serial, date_1904(ctx)).ok_or(ErrorCode::Num)?;
        Ok(part(ymd) as f64)
    };
    finish(extract())
}

/// YEAR(serial_number)
pub fn fn_year(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    date_part(args, ctx, |(y, _, _)| y as u32)
}

/// MONTH(serial_number)
pub fn fn_month(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    date_part(args, ctx, |(_, m, _)| m)
}

/// DAY(serial_number)
pub fn fn_day(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    date_part(args, ctx, |(_, _, d)| d)
}

/// Serial number of a local date and time, with the time as a day fraction
fn datetime_to_serial(now: NaiveDateTime, date_1904: bool) -> Option<f64> {
    let days = date_to_serial(now.date(), date_1904)?;
    let seconds = now.num_seconds_from_midnight() as f64;
    Some(days as f64 + seconds / 86_400.0)
}

/// NOW() - Current date and time
pub fn fn_now(_args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let now = Local::now().naive_local();
    finish(datetime_to_serial(now, date_1904(ctx)).ok_or(ErrorCode::Num))
}

/// TODAY() - Current date
pub fn fn_today(_args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let today = Local::now().date_naive();
    finish(
        date_to_serial(today, date_1904(ctx))
            .map(|serial| serial as f64)
            .ok_or(ErrorCode::Num),
    )
}
