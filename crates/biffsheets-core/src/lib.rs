//! # biffsheets-core
//!
//! Core data structures for the biffsheets workbook decoder.
//!
//! This crate provides the output model filled in by `biffsheets-xls`:
//! - [`CellValue`] - Decoded cell values (numbers, text, booleans, errors)
//! - [`Cell`] - A value with its coordinates and style reference
//! - [`Row`], [`Worksheet`], [`Workbook`] - The document structures
//!
//! ## Example
//!
//! ```rust
//! use biffsheets_core::{Cell, CellValue, Workbook, Worksheet};
//!
//! let mut sheet = Worksheet::new("Sheet1");
//! sheet.insert_cell(Cell::new(0, 0, 0, "Hello"));
//! sheet.insert_cell(Cell::new(0, 1, 0, 42.0));
//!
//! let mut workbook = Workbook::new();
//! workbook.add_worksheet(sheet).unwrap();
//!
//! let ws = workbook.worksheet(0).unwrap();
//! assert_eq!(ws.value_at(0, 1), &CellValue::Number(42.0));
//! ```

pub mod cell;
pub mod error;
pub mod row;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{Cell, CellError, CellValue, SharedString};
pub use error::{Error, Result};
pub use row::Row;
pub use workbook::{Workbook, WorkbookSettings};
pub use worksheet::{SheetKind, SheetVisibility, Worksheet};
