//! Cell-related types
//!
//! This module contains:
//! - [`Cell`] - A decoded cell: coordinates, style reference and value
//! - [`CellValue`] - The value stored in a cell
//! - [`CellError`] - Error literals such as `#DIV/0!`
//! - [`SharedString`] - Text shared between the string table and cells

mod value;

pub use value::{CellError, CellValue, SharedString};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cell {
    /// Row index (0-based)
    pub row: u16,
    /// Column index (0-based)
    pub col: u16,
    /// Index of the cell's XF (extended format) record
    pub style_ref: u16,
    /// Decoded value
    pub value: CellValue,
}

impl Cell {
    /// Create a new cell
    pub fn new<V: Into<CellValue>>(row: u16, col: u16, style_ref: u16, value: V) -> Self {
        Self {
            row,
            col,
            style_ref,
            value: value.into(),
        }
    }

    /// `(row, col)` coordinates of this cell
    pub fn coords(&self) -> (u16, u16) {
        (self.row, self.col)
    }
}
