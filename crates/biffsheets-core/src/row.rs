//! Row types

use std::collections::BTreeMap;

use crate::cell::{Cell, CellValue};

/// A row of cells, ordered by column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Row index (0-based)
    index: u16,
    /// Cells keyed by column index
    cells: BTreeMap<u16, Cell>,
}

impl Row {
    /// Create a new empty row
    pub fn new(index: u16) -> Self {
        Self {
            index,
            cells: BTreeMap::new(),
        }
    }

    /// Row index
    pub fn index(&self) -> u16 {
        self.index
    }

    /// Get a cell by column index
    pub fn cell(&self, col: u16) -> Option<&Cell> {
        self.cells.get(&col)
    }

    /// Get a cell's value by column index (`None` if no cell was decoded there)
    pub fn value(&self, col: u16) -> Option<&CellValue> {
        self.cells.get(&col).map(|c| &c.value)
    }

    /// Iterate over cells in column order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Insert a cell, replacing any cell already at the same column.
    ///
    /// Returns the replaced cell.
    pub fn insert(&mut self, cell: Cell) -> Option<Cell> {
        debug_assert_eq!(cell.row, self.index);
        self.cells.insert(cell.col, cell)
    }

    /// First and last used column
    pub fn column_span(&self) -> Option<(u16, u16)> {
        let first = *self.cells.keys().next()?;
        let last = *self.cells.keys().next_back()?;
        Some((first, last))
    }

    /// Check if row has any cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of cells in row
    pub fn len(&self) -> usize {
        self.cells.len()
    }
}
