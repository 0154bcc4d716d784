//! Workbooks shared by the integration tests

#![allow(dead_code)]

use sheetcalc::prelude::*;

pub fn data_row(sheet: &mut Worksheet, row: u32, values: &[f64]) {
    for (col, value) in values.iter().enumerate() {
        sheet.set_cell_value_at(row, col as u16, *value).unwrap();
    }
}

/// "MyBook": three sheets of numbers, one with a name that needs quoting, and
/// two defined names whose text is also stored in A4 and B4
pub fn sales_workbook() -> Workbook {
    let mut wb = Workbook::new();
    wb.set_name("MyBook");
    wb.add_worksheet_with_name("Sheet2").unwrap();
    wb.add_worksheet_with_name("John's sales").unwrap();

    let sheet1 = wb.worksheet_mut(0).unwrap();
    data_row(sheet1, 0, &[11.0, 12.0, 13.0, 14.0]);
    data_row(sheet1, 1, &[21.0, 22.0, 23.0, 24.0]);
    data_row(sheet1, 2, &[31.0, 32.0, 33.0, 34.0]);
    sheet1.set_cell_value("A4", "sales1").unwrap();
    sheet1.set_cell_value("B4", "sales2").unwrap();

    let sheet2 = wb.worksheet_mut(1).unwrap();
    data_row(sheet2, 0, &[50.0, 55.0, 60.0, 65.0]);
    data_row(sheet2, 1, &[51.0, 56.0, 61.0, 66.0]);
    data_row(sheet2, 2, &[52.0, 57.0, 62.0, 67.0]);

    let sheet3 = wb.worksheet_mut(2).unwrap();
    data_row(sheet3, 0, &[30.0, 31.0, 32.0]);
    data_row(sheet3, 1, &[33.0, 34.0, 35.0]);

    wb.define_name("sales1", "Sheet1!A1:D1").unwrap();
    wb.define_name("sales2", "Sheet2!B1:C3").unwrap();
    wb
}

/// "Figures for January": a second workbook with a sheet name full of
/// characters that force quoting
pub fn figures_workbook() -> Workbook {
    let mut wb = Workbook::new();
    wb.set_name("Figures for January");
    wb.add_worksheet_with_name("Sheet2").unwrap();
    wb.add_worksheet_with_name("## Look here!").unwrap();

    let sheet1 = wb.worksheet_mut(0).unwrap();
    data_row(sheet1, 0, &[400.0, 440.0, 480.0, 520.0]);
    data_row(sheet1, 1, &[420.0, 460.0, 500.0, 540.0]);

    let sheet2 = wb.worksheet_mut(1).unwrap();
    data_row(sheet2, 0, &[50.0, 55.0, 60.0, 65.0]);
    data_row(sheet2, 1, &[51.0, 56.0, 61.0, 66.0]);

    let sheet3 = wb.worksheet_mut(2).unwrap();
    data_row(sheet3, 0, &[42.0]);
    wb
}
