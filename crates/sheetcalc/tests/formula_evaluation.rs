//! Tests for formula evaluation with cell references

use pretty_assertions::assert_eq;
use sheetcalc::prelude::*;
use sheetcalc::{evaluate, parse, EvaluationContext};

/// Test basic formula evaluation without cell references
#[test]
fn test_evaluate_simple_formulas() {
    let wb = Workbook::new();
    let config = EvaluatorConfig::default();
    let ctx = EvaluationContext::for_workbook(&config, &wb, 0, 0, 0);

    // Arithmetic
    let formula = parse("=1+2*3").unwrap();
    assert_eq!(evaluate(&formula, &ctx).unwrap(), FormulaValue::Number(7.0));

    // String concatenation
    let formula = parse("=\"Hello \"&\"World\"").unwrap();
    assert_eq!(evaluate(&formula, &ctx).unwrap(), FormulaValue::string("Hello World"));

    // Comparison
    let formula = parse("=5>3").unwrap();
    assert_eq!(evaluate(&formula, &ctx).unwrap(), FormulaValue::Boolean(true));

    // Power is left-associative; negation binds tighter than power
    let formula = parse("=2^3^2").unwrap();
    assert_eq!(evaluate(&formula, &ctx).unwrap(), FormulaValue::Number(64.0));
    let formula = parse("=-2^2").unwrap();
    assert_eq!(evaluate(&formula, &ctx).unwrap(), FormulaValue::Number(4.0));
    let formula = parse("=50%*4").unwrap();
    assert_eq!(evaluate(&formula, &ctx).unwrap(), FormulaValue::Number(2.0));
}

/// Test IF function
#[test]
fn test_evaluate_if() {
    let wb = Workbook::new();

    assert_eq!(
        wb.evaluate_formula(0, "A1", "=IF(1>0,\"Yes\",\"No\")").unwrap(),
        FormulaValue::string("Yes")
    );
    assert_eq!(
        wb.evaluate_formula(0, "A1", "=IF(1<0,\"Yes\",\"No\")").unwrap(),
        FormulaValue::string("No")
    );
    assert_eq!(wb.evaluate_formula(0, "A1", "=IF(FALSE,1)").unwrap(), FormulaValue::Boolean(false));
}

/// Test formula evaluation with cell references
#[test]
fn test_evaluate_with_cell_references() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", 10.0).unwrap();
    sheet.set_cell_value("A2", 20.0).unwrap();
    sheet.set_cell_value("A3", 30.0).unwrap();
    sheet.set_cell_value("B1", 5.0).unwrap();

    let eval = |formula: &str| wb.evaluate_formula(0, "D1", formula).unwrap();
    assert_eq!(eval("=A1"), FormulaValue::Number(10.0));
    assert_eq!(eval("=A1+B1"), FormulaValue::Number(15.0));
    assert_eq!(eval("=A1>B1"), FormulaValue::Boolean(true));
    assert_eq!(eval("=$A$2*2"), FormulaValue::Number(40.0));
    assert_eq!(eval("=sheet1!a3"), FormulaValue::Number(30.0));
}

/// Test range references with aggregate functions
#[test]
fn test_evaluate_with_range_references() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", 10.0).unwrap();
    sheet.set_cell_value("A2", 20.0).unwrap();
    sheet.set_cell_value("A3", 30.0).unwrap();

    let eval = |formula: &str| wb.evaluate_formula(0, "D1", formula).unwrap();
    assert_eq!(eval("=SUM(A1:A3)"), FormulaValue::Number(60.0));
    assert_eq!(eval("=AVERAGE(A1:A3)"), FormulaValue::Number(20.0));
    assert_eq!(eval("=MIN(A1:A3)"), FormulaValue::Number(10.0));
    assert_eq!(eval("=MAX(A1:A3)"), FormulaValue::Number(30.0));
    assert_eq!(eval("=SUM(A:A)"), FormulaValue::Number(60.0));
    assert_eq!(eval("=SUM(A1:Sheet1!A3)"), FormulaValue::Number(60.0));
    assert_eq!(eval("=COUNT(A1:A10)"), FormulaValue::Number(3.0));
    assert_eq!(eval("=COUNTBLANK(A1:A10)"), FormulaValue::Number(7.0));
}

/// Test nested functions and operators
#[test]
fn test_evaluate_complex_formulas() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", 100.0).unwrap();
    sheet.set_cell_value("A2", 50.0).unwrap();
    sheet.set_cell_value("B1", 0.1).unwrap();

    let eval = |formula: &str| wb.evaluate_formula(0, "D1", formula).unwrap();
    assert_eq!(eval("=IF(A1>A2,A1*B1,A2*B1)"), FormulaValue::Number(10.0));
    assert_eq!(eval("=SUM(A1,A2)*2"), FormulaValue::Number(300.0));
    assert_eq!(eval("=ROUND(A2/3,2)"), FormulaValue::Number(16.67));
    assert_eq!(eval("=VLOOKUP(50,A1:B2,1,FALSE)"), FormulaValue::Number(50.0));
}

/// Test that errors propagate through operators and functions
#[test]
fn test_error_propagation() {
    let wb = Workbook::new();
    let eval = |formula: &str| wb.evaluate_formula(0, "A1", formula).unwrap();

    assert_eq!(eval("=1/0"), FormulaValue::Error(ErrorCode::Div0));
    assert_eq!(eval("=1/0+5"), FormulaValue::Error(ErrorCode::Div0));
    assert_eq!(eval("=SUM(5/0,1)"), FormulaValue::Error(ErrorCode::Div0));
    assert_eq!(eval("=#N/A+1/0"), FormulaValue::Error(ErrorCode::Na));
    assert_eq!(eval("=SQRT(-1)"), FormulaValue::Error(ErrorCode::Num));
    assert_eq!(eval("=\"abc\"*2"), FormulaValue::Error(ErrorCode::Value));
    assert_eq!(eval("=NOSUCHFUNCTION(1)"), FormulaValue::Error(ErrorCode::Name));
    assert_eq!(eval("=undefined_name"), FormulaValue::Error(ErrorCode::Name));
    assert_eq!(eval("=Nowhere!A1"), FormulaValue::Error(ErrorCode::Ref));
    assert_eq!(eval("=ISERROR(1/0)"), FormulaValue::Boolean(true));
    assert_eq!(eval("=IFERROR(1/0,)"), FormulaValue::Number(0.0));
    assert_eq!(eval("=IFNA(NA(),)"), FormulaValue::Number(0.0));
}

/// Test empty cells count as zero or as empty text
#[test]
fn test_empty_cell_handling() {
    let mut wb = Workbook::new();
    wb.worksheet_mut(0).unwrap().set_cell_value("A1", 10.0).unwrap();

    let eval = |formula: &str| wb.evaluate_formula(0, "D1", formula).unwrap();
    assert_eq!(eval("=A1+A2"), FormulaValue::Number(10.0));
    assert_eq!(eval("=SUM(A1:A3)"), FormulaValue::Number(10.0));
    assert_eq!(eval("=A2&\"x\""), FormulaValue::string("x"));
    assert_eq!(eval("=A2=0"), FormulaValue::Boolean(true));
    assert_eq!(eval("=A2=\"\""), FormulaValue::Boolean(true));
    assert_eq!(eval("=ISBLANK(A2)"), FormulaValue::Boolean(true));
}

/// Test string operations on cell values
#[test]
fn test_string_operations() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", "Hello").unwrap();
    sheet.set_cell_value("B1", "World").unwrap();
    sheet.set_cell_value("C1", 2.5).unwrap();

    let eval = |formula: &str| wb.evaluate_formula(0, "D1", formula).unwrap();
    assert_eq!(eval("=A1&\" \"&B1"), FormulaValue::string("Hello World"));
    assert_eq!(eval("=UPPER(A1)&LEN(B1)"), FormulaValue::string("HELLO5"));
    assert_eq!(eval("=A1&C1"), FormulaValue::string("Hello2.5"));
    assert_eq!(eval("=\"a\"<\"B\""), FormulaValue::Boolean(true));
    assert_eq!(eval("=A1=\"HELLO\""), FormulaValue::Boolean(true));
}

/// Test the decimal separator used when numbers become text
#[test]
fn test_decimal_separator() {
    let mut wb = Workbook::new();
    wb.worksheet_mut(0).unwrap().set_cell_value("A1", 2.5).unwrap();

    let config = EvaluatorConfig::default().with_decimal_separator(',');
    let value = wb.evaluate_formula_with(&config, 0, "B1", "=\"x\"&A1").unwrap();
    assert_eq!(value, FormulaValue::string("x2,5"));
}

/// Test boolean functions
#[test]
fn test_boolean_functions() {
    let wb = Workbook::new();
    let eval = |formula: &str| wb.evaluate_formula(0, "A1", formula).unwrap();

    assert_eq!(eval("=AND(TRUE,TRUE,TRUE)"), FormulaValue::Boolean(true));
    assert_eq!(eval("=AND(TRUE,FALSE,TRUE)"), FormulaValue::Boolean(false));
    assert_eq!(eval("=OR(FALSE,FALSE,TRUE)"), FormulaValue::Boolean(true));
    assert_eq!(eval("=NOT(FALSE)"), FormulaValue::Boolean(true));
    assert_eq!(eval("=AND(NOT(FALSE),OR(TRUE,FALSE))"), FormulaValue::Boolean(true));
}

/// Test sheet-scoped names shadow workbook names
#[test]
fn test_defined_name_scopes() {
    let mut wb = Workbook::new();
    wb.add_worksheet_with_name("Rates").unwrap();
    wb.worksheet_mut(0).unwrap().set_cell_value("A1", 0.2).unwrap();
    wb.worksheet_mut(1).unwrap().set_cell_value("A1", 0.5).unwrap();
    wb.define_name("Rate", "Sheet1!$A$1").unwrap();
    wb.define_name_for_sheet("Rate", "Rates!$A$1", 1).unwrap();

    assert_eq!(wb.evaluate_formula(0, "B1", "=Rate*10").unwrap(), FormulaValue::Number(2.0));
    assert_eq!(wb.evaluate_formula(1, "B1", "=Rate*10").unwrap(), FormulaValue::Number(5.0));
    assert_eq!(wb.evaluate_formula(1, "B1", "=RATE*10").unwrap(), FormulaValue::Number(5.0));
}

/// Test formula cells are read through their cached results
#[test]
fn test_calculate_cells_in_order() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", 10.0).unwrap();
    sheet.set_cell_formula("A2", "=A1*2").unwrap();
    sheet.set_cell_formula("A3", "=A2+1").unwrap();

    // A2 has not been calculated yet, so A3 sees a blank
    assert_eq!(wb.calculate_cell(0, "A3").unwrap(), FormulaValue::Number(1.0));

    assert_eq!(wb.calculate_cell(0, "A2").unwrap(), FormulaValue::Number(20.0));
    assert_eq!(wb.calculate_cell(0, "A3").unwrap(), FormulaValue::Number(21.0));
    assert_eq!(
        wb.worksheet(0).unwrap().get_value("A3").unwrap().effective_value(),
        &CellValue::Number(21.0)
    );
}

/// Test FORMULATEXT and ISREF see the reference rather than its value
#[test]
fn test_reference_inspection() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_formula("A1", "=1+1").unwrap();
    sheet.set_cell_value("A2", 3.0).unwrap();

    let eval = |formula: &str| wb.evaluate_formula(0, "C1", formula).unwrap();
    assert_eq!(eval("=FORMULATEXT(A1)"), FormulaValue::string("=1+1"));
    assert_eq!(eval("=FORMULATEXT(A2)"), FormulaValue::Error(ErrorCode::Na));
    assert_eq!(eval("=ISREF(A2)"), FormulaValue::Boolean(true));
    assert_eq!(eval("=ISREF(3)"), FormulaValue::Boolean(false));
}

/// Test OFFSET and ADDRESS
#[test]
fn test_offset_and_address() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("B2", 1.0).unwrap();
    sheet.set_cell_value("B3", 2.0).unwrap();
    sheet.set_cell_value("C3", 4.0).unwrap();

    let eval = |formula: &str| wb.evaluate_formula(0, "E1", formula).unwrap();
    assert_eq!(eval("=SUM(OFFSET(A1,1,1,2,2))"), FormulaValue::Number(7.0));
    assert_eq!(eval("=OFFSET(A1,2,2)"), FormulaValue::Number(4.0));
    assert_eq!(eval("=OFFSET(A1,-1,0)"), FormulaValue::Error(ErrorCode::Ref));
    assert_eq!(eval("=ADDRESS(3,2)"), FormulaValue::string("$B$3"));
    assert_eq!(eval("=ADDRESS(3,2,4)"), FormulaValue::string("B3"));
    assert_eq!(eval("=INDIRECT(ADDRESS(3,3))"), FormulaValue::Number(4.0));
}

/// Test parse failures come back as errors rather than values
#[test]
fn test_parse_errors() {
    let wb = Workbook::new();
    assert!(matches!(wb.evaluate_formula(0, "A1", "=1+"), Err(Error::Formula(_))));
    assert!(matches!(wb.evaluate_formula(0, "A1", "=SUM(1,2"), Err(Error::Formula(_))));
    assert!(matches!(wb.evaluate_formula(0, "A1", "=\"open"), Err(Error::Formula(_))));
}
