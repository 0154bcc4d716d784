//! Lookup functions
//!
//! All of these receive areas as arrays. Single values are treated as 1x1
//! arrays.

use sheetcalc_core::ErrorCode;
use std::cmp::Ordering;

use super::{finish, number_arg, optional_number, scalar};
use crate::context::EvaluationContext;
use crate::error::FormulaResult;
use crate::value::{compare_values, FormulaValue};

type Grid = Vec<Vec<FormulaValue>>;

fn as_grid(value: &FormulaValue) -> Grid {
    match value {
        FormulaValue::Array(rows) => rows.clone(),
        other => vec![vec![other.clone()]],
    }
}

fn grid_dims(grid: &[Vec<FormulaValue>]) -> (usize, usize) {
    let rows = grid.len();
    let cols = grid.first().map(|r| r.len()).unwrap_or(0);
    (rows, cols)
}

/// Lookups only compare values of the same type
fn same_kind(a: &FormulaValue, b: &FormulaValue) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

fn values_equal(a: &FormulaValue, b: &FormulaValue) -> bool {
    same_kind(a, b) && compare_values(a, b) == Ordering::Equal
}

/// Position of `needle` in `haystack` for the three MATCH modes
///
/// `0` finds the first equal value. `1` finds the last value not above
/// `needle`, assuming ascending order. `-1` finds the last value not below
/// `needle`, assuming descending order. Values of another type are skipped.
fn find_position(needle: &FormulaValue, haystack: &[&FormulaValue], mode: i32) -> Option<usize> {
    if mode == 0 {
        return haystack.iter().position(|v| values_equal(needle, v));
    }
    let wanted = if mode > 0 { Ordering::Greater } else { Ordering::Less };
    let mut found = None;
    for (i, value) in haystack.iter().enumerate() {
        if !same_kind(needle, value) {
            continue;
        }
        match compare_values(value, needle) {
            Ordering::Equal => found = Some(i),
            ordering if ordering == wanted => break,
            _ => found = Some(i),
        }
    }
    found
}

/// INDEX(array, row_num, [column_num])
///
/// A 0 row or column selects the whole column or row. With a one-row array
/// and a single index the index counts columns.
pub fn fn_index(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let index = || -> Result<FormulaValue, ErrorCode> {
        let grid = as_grid(args.first().ok_or(ErrorCode::Value)?);
        let (rows, cols) = grid_dims(&grid);
        if rows == 0 || cols == 0 {
            return Err(ErrorCode::Ref);
        }

        let first = number_arg(args, 1)?.trunc();
        let (row_num, col_num) = match args.get(2) {
            Some(_) => (first, optional_number(args, 2, 0.0)?.trunc()),
            None if rows == 1 => (1.0, first),
            None if cols == 1 => (first, 1.0),
            None => (first, 0.0),
        };
        if row_num < 0.0 || col_num < 0.0 {
            return Err(ErrorCode::Value);
        }
        let (r, c) = (row_num as usize, col_num as usize);
        if r > rows || c > cols {
            return Err(ErrorCode::Ref);
        }

        Ok(match (r, c) {
            (0, 0) => FormulaValue::Array(grid),
            (0, c) => FormulaValue::Array(
                grid.iter()
                    .map(|row| vec![row.get(c - 1).cloned().unwrap_or_default()])
                    .collect(),
            ),
            (r, 0) => FormulaValue::Array(vec![grid[r - 1].clone()]),
            (r, c) => grid[r - 1].get(c - 1).cloned().unwrap_or_default(),
        })
    };
    finish(index())
}

/// MATCH(lookup_value, lookup_array, [match_type]) - 1-based position
pub fn fn_match(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let position = || -> Result<f64, ErrorCode> {
        let needle = scalar(args.first().ok_or(ErrorCode::Value)?);
        if let FormulaValue::Error(e) = needle {
            return Err(*e);
        }
        let grid = as_grid(args.get(1).ok_or(ErrorCode::Value)?);
        let mode = optional_number(args, 2, 1.0)?.trunc();
        let mode = if mode > 0.0 { 1 } else if mode < 0.0 { -1 } else { 0 };

        let (rows, cols) = grid_dims(&grid);
        let haystack: Vec<&FormulaValue> = if rows == 1 {
            grid[0].iter().collect()
        } else if cols == 1 {
            grid.iter().filter_map(|row| row.first()).collect()
        } else {
            return Err(ErrorCode::Na);
        };

        find_position(needle, &haystack, mode)
            .map(|i| (i + 1) as f64)
            .ok_or(ErrorCode::Na)
    };
    finish(position())
}

/// Whether a lookup's optional range_lookup flag asks for an approximate match
fn approximate(args: &[FormulaValue], index: usize) -> Result<bool, ErrorCode> {
    match args.get(index).map(scalar) {
        None => Ok(true),
        Some(FormulaValue::Empty) => Ok(false),
        Some(v) => v.to_bool(),
    }
}

/// VLOOKUP(lookup_value, table_array, col_index_num, [range_lookup])
pub fn fn_vlookup(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let vlookup = || -> Result<FormulaValue, ErrorCode> {
        let needle = scalar(args.first().ok_or(ErrorCode::Value)?);
        if let FormulaValue::Error(e) = needle {
            return Err(*e);
        }
        let table = as_grid(args.get(1).ok_or(ErrorCode::Value)?);
        let col_index = number_arg(args, 2)?.trunc();
        let mode = if approximate(args, 3)? { 1 } else { 0 };

        let (_, cols) = grid_dims(&table);
        if col_index < 1.0 {
            return Err(ErrorCode::Value);
        }
        let col = col_index as usize - 1;
        if col >= cols {
            return Err(ErrorCode::Ref);
        }

        let keys: Vec<&FormulaValue> = table.iter().filter_map(|row| row.first()).collect();
        let row = find_position(needle, &keys, mode).ok_or(ErrorCode::Na)?;
        Ok(table[row].get(col).cloned().unwrap_or_default())
    };
    finish(vlookup())
}

/// HLOOKUP(lookup_value, table_array, row_index_num, [range_lookup])
pub fn fn_hlookup(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let hlookup = || -> Result<FormulaValue, ErrorCode> {
        let needle = scalar(args.first().ok_or(ErrorCode::Value)?);
        if let FormulaValue::Error(e) = needle {
            return Err(*e);
        }
        let table = as_grid(args.get(1).ok_or(ErrorCode::Value)?);
        let row_index = number_arg(args, 2)?.trunc();
        let mode = if approximate(args, 3)? { 1 } else { 0 };

        let (rows, _) = grid_dims(&table);
        if row_index < 1.0 {
            return Err(ErrorCode::Value);
        }
        let row = row_index as usize - 1;
        if row >= rows {
            return Err(ErrorCode::Ref);
        }

        let keys: Vec<&FormulaValue> = table.first().map(|r| r.iter().collect()).unwrap_or_default();
        let col = find_position(needle, &keys, mode).ok_or(ErrorCode::Na)?;
        Ok(table[row].get(col).cloned().unwrap_or_default())
    };
    finish(hlookup())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[f64]) -> Vec<FormulaValue> {
        values.iter().map(|n| FormulaValue::Number(*n)).collect()
    }

    #[test]
    fn test_find_position_modes() {
        let ascending = numbers(&[1.0, 3.0, 5.0, 7.0]);
        let haystack: Vec<&FormulaValue> = ascending.iter().collect();
        let needle = FormulaValue::Number(4.0);
        assert_eq!(find_position(&needle, &haystack, 0), None);
        assert_eq!(find_position(&needle, &haystack, 1), Some(1));
        assert_eq!(find_position(&FormulaValue::Number(0.5), &haystack, 1), None);
        assert_eq!(find_position(&FormulaValue::Number(7.0), &haystack, 0), Some(3));

        let descending = numbers(&[9.0, 6.0, 3.0]);
        let haystack: Vec<&FormulaValue> = descending.iter().collect();
        assert_eq!(find_position(&needle, &haystack, -1), Some(1));
    }

    #[test]
    fn test_exact_match_is_type_strict() {
        let values = vec![FormulaValue::string("1"), FormulaValue::string("Apple")];
        let haystack: Vec<&FormulaValue> = values.iter().collect();
        assert_eq!(find_position(&FormulaValue::Number(1.0), &haystack, 0), None);
        assert_eq!(find_position(&FormulaValue::string("apple"), &haystack, 0), Some(1));
    }
}
