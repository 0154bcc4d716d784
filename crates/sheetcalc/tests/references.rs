//! Tests for reference text: rendering, quoting and A1/R1C1 agreement

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sheetcalc::prelude::*;
use sheetcalc::{format, parse, parse_a1, parse_r1c1, quote_sheet_name};

/// Test sheet names are quoted in rendered formulas only when needed
#[test]
fn test_sheet_names_in_rendered_formulas() {
    let rendered = |text: &str| parse(text).unwrap().to_string();

    assert_eq!(rendered("='my sheet'!A1"), "='my sheet'!A1");
    assert_eq!(rendered("=ProfitAndLoss!A1"), "=ProfitAndLoss!A1");
    assert_eq!(rendered("='profit+loss'!A1"), "='profit+loss'!A1");
    assert_eq!(rendered("='ProfitAndLoss'!A1"), "=ProfitAndLoss!A1");
    assert_eq!(rendered("='John''s sales'!$B$2:c3"), "='John''s sales'!$B$2:C3");
    assert_eq!(rendered("=SUM( Sheet1:Sheet3!a1 , 2 )"), "=SUM(Sheet1:Sheet3!A1,2)");
}

/// Test which sheet names need quotes
#[test]
fn test_quote_sheet_name() {
    assert_eq!(quote_sheet_name("Sheet1"), "Sheet1");
    assert_eq!(quote_sheet_name("my sheet"), "'my sheet'");
    assert_eq!(quote_sheet_name("2024"), "'2024'");
    assert_eq!(quote_sheet_name("A1"), "'A1'");
    assert_eq!(quote_sheet_name("R1C1"), "'R1C1'");
    assert_eq!(quote_sheet_name("John's"), "'John''s'");
}

/// Test the same reference rendered in both styles
#[test]
fn test_format_styles() {
    let anchor = CellAddress::new(4, 4);
    let reference = parse_a1("Sheet2!B3:$D$7").unwrap();

    assert_eq!(format(&reference, ReferenceStyle::A1), "Sheet2!B3:$D$7");
    assert_eq!(
        format(&reference, ReferenceStyle::R1C1 { anchor }),
        "Sheet2!R[-2]C[-3]:R7C4"
    );
    assert_eq!(format(&parse_a1("c:e").unwrap(), ReferenceStyle::A1), "C:E");
    assert_eq!(format(&parse_a1("$3:5").unwrap(), ReferenceStyle::A1), "$3:5");
}

/// Test function metadata can be found by BIFF index and by name
#[test]
fn test_function_metadata_by_index() {
    let config = EvaluatorConfig::default();
    let functions = config.functions();

    assert_eq!(functions.get_by_index(0).unwrap().name, "COUNT");
    assert_eq!(functions.get_by_index(1).unwrap().name, "IF");
    assert_eq!(functions.get("count").unwrap().biff_index, Some(0));
    assert_eq!(functions.get("if").unwrap().biff_index, Some(1));
}

fn cell_strategy() -> impl Strategy<Value = (u32, u16)> {
    (0u32..5_000, 0u16..500)
}

proptest! {
    /// INDIRECT of a fixed A1 text reads the same cell from anywhere but itself
    #[test]
    fn indirect_a1_is_position_independent((row, col) in cell_strategy()) {
        prop_assume!((row, col) != (1, 2));
        let mut wb = Workbook::new();
        wb.worksheet_mut(0).unwrap().set_cell_value("C2", 23.0).unwrap();
        let at = CellAddress::new(row, col).to_a1_string();

        let value = wb.evaluate_formula(0, &at, "=INDIRECT(\"C2\")").unwrap();
        prop_assert_eq!(value, FormulaValue::Number(23.0));
    }

    /// Relative R1C1 text formatted at an anchor and parsed back at the same
    /// anchor lands on the original cell
    #[test]
    fn r1c1_relative_text_round_trips(
        (row, col) in cell_strategy(),
        (anchor_row, anchor_col) in cell_strategy(),
    ) {
        let anchor = CellAddress::new(anchor_row, anchor_col);
        let reference = Reference::cell(CellAddress::new(row, col));
        let text = format(&reference, ReferenceStyle::R1C1 { anchor });
        let back = parse_r1c1(&text, anchor).unwrap();
        prop_assert_eq!((back.range.start.row, back.range.start.col), (row, col));
    }

    /// INDIRECT in R1C1 style and ADDRESS agree on which cell they name
    #[test]
    fn address_and_r1c1_agree((row, col) in cell_strategy()) {
        let mut wb = Workbook::new();
        wb.worksheet_mut(0).unwrap().set_cell_value_at(row, col, 7.0).unwrap();

        let a1 = format!("=INDIRECT(ADDRESS({},{}))", row + 1, col + 1);
        let r1c1 = format!("=INDIRECT(\"R{}C{}\",FALSE)", row + 1, col + 1);
        let at = "XFD1048576";
        prop_assert_eq!(wb.evaluate_formula(0, at, &a1).unwrap(), FormulaValue::Number(7.0));
        prop_assert_eq!(wb.evaluate_formula(0, at, &r1c1).unwrap(), FormulaValue::Number(7.0));
    }
}
