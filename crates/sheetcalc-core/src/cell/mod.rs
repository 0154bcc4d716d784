//! Cell-related types
//!
//! - [`CellValue`] - the value stored in a cell
//! - [`CellType`] - the kind of content a cell holds
//! - [`ErrorCode`] - spreadsheet error literals
//! - [`CellAddress`] / [`CellRange`] - grid coordinates

mod address;
mod value;

pub use address::{CellAddress, CellRange, CellRangeIterator};
pub use value::{CellType, CellValue, ErrorCode};
