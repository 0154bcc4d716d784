//! Tests for circular definitions and the recursion bound

use pretty_assertions::assert_eq;
use sheetcalc::prelude::*;

fn eval(wb: &Workbook, formula: &str) -> FormulaValue {
    wb.evaluate_formula(0, "J10", formula).unwrap()
}

/// Test a name that refers to itself
#[test]
fn test_self_referencing_name() {
    let mut wb = Workbook::new();
    wb.define_name("Loop", "Loop+1").unwrap();
    assert_eq!(eval(&wb, "=Loop"), FormulaValue::Error(ErrorCode::Ref));
    assert_eq!(eval(&wb, "=IFERROR(Loop, 0)"), FormulaValue::Number(0.0));
}

/// Test two names that refer to each other
#[test]
fn test_mutually_recursive_names() {
    let mut wb = Workbook::new();
    wb.define_name("Ping", "Pong").unwrap();
    wb.define_name("Pong", "Ping*2").unwrap();
    assert_eq!(eval(&wb, "=Ping"), FormulaValue::Error(ErrorCode::Ref));
    assert_eq!(eval(&wb, "=Pong+1"), FormulaValue::Error(ErrorCode::Ref));
}

/// Test a cycle that goes through INDIRECT
#[test]
fn test_cycle_through_indirect() {
    let mut wb = Workbook::new();
    wb.define_name("Again", r#"INDIRECT("Again")"#).unwrap();
    assert_eq!(eval(&wb, "=Again"), FormulaValue::Error(ErrorCode::Ref));
}

/// Test the same name used twice side by side is not a cycle
#[test]
fn test_repeated_name_is_not_a_cycle() {
    let mut wb = Workbook::new();
    wb.worksheet_mut(0).unwrap().set_cell_value("A1", 4.0).unwrap();
    wb.define_name("Four", "Sheet1!$A$1").unwrap();
    wb.define_name("Sixteen", "Four*Four").unwrap();
    assert_eq!(eval(&wb, "=Sixteen+Four"), FormulaValue::Number(20.0));
}

fn chain(length: usize) -> Workbook {
    let mut wb = Workbook::new();
    for i in 1..length {
        wb.define_name(&format!("chain_{}", i), &format!("chain_{}", i + 1))
            .unwrap();
    }
    wb.define_name(&format!("chain_{}", length), &length.to_string())
        .unwrap();
    wb
}

/// Test a long chain of names stops at the configured depth
#[test]
fn test_depth_bound() {
    let wb = chain(100);

    let shallow = EvaluatorConfig::default();
    assert_eq!(shallow.max_depth(), 64);
    let value = wb.evaluate_formula_with(&shallow, 0, "A1", "=chain_1").unwrap();
    assert_eq!(value, FormulaValue::Error(ErrorCode::Ref));

    let deep = EvaluatorConfig::default().with_max_depth(200);
    let value = wb.evaluate_formula_with(&deep, 0, "A1", "=chain_1").unwrap();
    assert_eq!(value, FormulaValue::Number(100.0));

    let short = chain(10);
    assert_eq!(eval(&short, "=chain_1"), FormulaValue::Number(10.0));
}

/// Test a formula cell that reads itself is circular
#[test]
fn test_self_referencing_cell() {
    let mut wb = Workbook::new();
    wb.worksheet_mut(0)
        .unwrap()
        .set_cell_formula("A1", "=A1+1")
        .unwrap();

    assert_eq!(wb.calculate_cell(0, "A1").unwrap(), FormulaValue::Error(ErrorCode::Ref));
    assert_eq!(wb.calculate_cell(0, "A1").unwrap(), FormulaValue::Error(ErrorCode::Ref));
    assert_eq!(wb.evaluate_formula(0, "B2", "=B2*2+1").unwrap(), FormulaValue::Error(ErrorCode::Ref));
}

/// Test an area that covers the formula's own cell is circular
#[test]
fn test_area_covering_own_cell() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", 1.0).unwrap();
    sheet.set_cell_value("A3", 3.0).unwrap();
    sheet.set_cell_formula("A2", "=SUM(A1:A3)").unwrap();

    assert_eq!(eval(&wb, "=SUM(A1:A3)"), FormulaValue::Number(4.0));
    assert_eq!(wb.calculate_cell(0, "A2").unwrap(), FormulaValue::Error(ErrorCode::Ref));
    assert_eq!(wb.evaluate_formula(0, "A5", "=SUM(A:A)").unwrap(), FormulaValue::Error(ErrorCode::Ref));
    assert_eq!(
        wb.evaluate_formula(0, "A5", "=SUM(Sheet1!B:B)").unwrap(),
        FormulaValue::Number(0.0)
    );
}

/// Test a name that leads back to the formula's cell is circular
#[test]
fn test_name_reaching_own_cell() {
    let mut wb = Workbook::new();
    wb.define_name("Here", "Sheet1!$C$3").unwrap();
    assert_eq!(wb.evaluate_formula(0, "C3", "=Here+1").unwrap(), FormulaValue::Error(ErrorCode::Ref));
    assert_eq!(wb.evaluate_formula(0, "C4", "=Here+1").unwrap(), FormulaValue::Number(1.0));
    assert_eq!(
        wb.evaluate_formula(0, "C3", r#"=INDIRECT("C3")"#).unwrap(),
        FormulaValue::Error(ErrorCode::Ref)
    );
}
