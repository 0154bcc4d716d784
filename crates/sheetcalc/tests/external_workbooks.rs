//! Tests for references between workbooks linked into one environment

use pretty_assertions::assert_eq;
use sheetcalc::prelude::*;

mod common;
use common::{figures_workbook, sales_workbook};

const FIGURES: &str = "Figures for January";

fn environment() -> WorkbookEnvironment {
    let mut env = WorkbookEnvironment::new();
    env.add_as("MyBook", sales_workbook());

    let mut figures = figures_workbook();
    figures
        .worksheet_mut(0)
        .unwrap()
        .set_cell_formula("A11", r#"=INDIRECT("[MyBook]Sheet2!A1")"#)
        .unwrap();
    figures
        .define_name("january_total", "SUM(Sheet1!A1:D1)")
        .unwrap();
    env.add_as(FIGURES, figures);
    env
}

fn eval(env: &WorkbookEnvironment, book: &str, formula: &str) -> FormulaValue {
    env.evaluate_formula(book, 0, "A11", formula).unwrap()
}

/// Test INDIRECT into a quoted external sheet, from the same and from another workbook
#[test]
fn test_indirect_across_workbooks() {
    let env = environment();
    let look_here = r#"=INDIRECT("'[Figures for January]## Look here!'!A1")"#;

    assert_eq!(eval(&env, FIGURES, look_here), FormulaValue::Number(42.0));
    assert_eq!(eval(&env, "MyBook", look_here), FormulaValue::Number(42.0));
}

/// Test a cell that reads another workbook, read in turn from that workbook
#[test]
fn test_two_level_link() {
    let mut env = environment();

    let first = env.calculate_cell(FIGURES, 0, "A11").unwrap();
    assert_eq!(first, FormulaValue::Number(50.0));

    let second = eval(&env, "MyBook", r#"=INDIRECT("'[Figures for January]Sheet1'!A11")"#);
    assert_eq!(second, FormulaValue::Number(50.0));
}

/// Test external references written directly in formula text
#[test]
fn test_parsed_external_references() {
    let env = environment();

    assert_eq!(eval(&env, "MyBook", "='[Figures for January]Sheet1'!B2"), FormulaValue::Number(460.0));
    assert_eq!(
        eval(&env, "MyBook", "=SUM('[Figures for January]Sheet2'!A1:D2)"),
        FormulaValue::Number(464.0)
    );
    assert_eq!(eval(&env, FIGURES, "=[MyBook]Sheet1!D3+1"), FormulaValue::Number(35.0));
    assert_eq!(
        eval(&env, "MyBook", "=[Elsewhere]Sheet1!A1"),
        FormulaValue::Error(ErrorCode::Ref)
    );
}

/// Test defined names are looked up in the workbook that evaluates them
#[test]
fn test_names_belong_to_their_workbook() {
    let env = environment();

    assert_eq!(eval(&env, FIGURES, "=january_total"), FormulaValue::Number(1840.0));
    assert_eq!(eval(&env, "MyBook", "=january_total"), FormulaValue::Error(ErrorCode::Name));
    assert_eq!(eval(&env, FIGURES, "=SUM(INDIRECT(\"sales1\"))"), FormulaValue::Error(ErrorCode::Ref));
}

/// Test link names are case-insensitive
#[test]
fn test_link_names_ignore_case() {
    let env = environment();
    assert_eq!(
        eval(&env, "mybook", "=INDIRECT(\"[FIGURES FOR JANUARY]Sheet1!A1\")"),
        FormulaValue::Number(400.0)
    );
}

/// Test a renamed link breaks references by the old name and serves the new one
#[test]
fn test_renamed_link() {
    let mut env = environment();
    let old = "='[Figures for January]Sheet1'!A1";
    assert_eq!(eval(&env, "MyBook", old), FormulaValue::Number(400.0));

    assert!(env.rename_link(FIGURES, "February"));
    assert_eq!(eval(&env, "MyBook", old), FormulaValue::Error(ErrorCode::Ref));
    assert_eq!(eval(&env, "MyBook", "=[February]Sheet1!A1"), FormulaValue::Number(400.0));
    assert!(!env.rename_link("February", "mybook"));
}

/// Test a removed link turns later lookups into #REF!
#[test]
fn test_removed_link() {
    let mut env = environment();
    let formula = r#"=INDIRECT("[MyBook]Sheet2!A1")"#;
    assert_eq!(eval(&env, FIGURES, formula), FormulaValue::Number(50.0));

    let removed = env.remove_link("MyBook").unwrap();
    assert_eq!(removed.name(), "MyBook");
    assert_eq!(eval(&env, FIGURES, formula), FormulaValue::Error(ErrorCode::Ref));
    assert!(matches!(
        env.evaluate_formula("MyBook", 0, "A1", "=1"),
        Err(Error::UnknownWorkbook(_))
    ));
}
