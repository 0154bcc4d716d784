//! # sheetcalc-core
//!
//! Core data structures for the sheetcalc formula engine.
//!
//! This crate provides:
//! - [`ErrorCode`], [`CellValue`] and [`CellType`] - what a cell holds
//! - [`CellAddress`] and [`CellRange`] - grid coordinates
//! - [`Reference`] with [`parse_a1`], [`parse_r1c1`] and [`format`] - the reference model
//! - [`Workbook`], [`Worksheet`] - a small in-memory document used as a cell data provider
//!
//! ## Example
//!
//! ```rust
//! use sheetcalc_core::{parse_a1, format, ReferenceStyle};
//!
//! let reference = parse_a1("'my sheet'!b2:$c$4").unwrap();
//! assert_eq!(format(&reference, ReferenceStyle::A1), "'my sheet'!B2:$C$4");
//! ```

pub mod cell;
pub mod error;
pub mod named_range;
pub mod reference;
pub mod workbook;
pub mod worksheet;

pub use cell::{CellAddress, CellRange, CellType, CellValue, ErrorCode};
pub use error::{Error, Result};
pub use named_range::{NameScope, NamedRange, NamedRangeCollection};
pub use reference::{
    format, parse_a1, parse_r1c1, quote_sheet_name, RefError, RefSpan, Reference, ReferenceStyle,
    SheetQualifier,
};
pub use workbook::{Workbook, WorkbookSettings};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
