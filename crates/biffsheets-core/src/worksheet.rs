//! Worksheet type

use std::collections::BTreeMap;

use crate::cell::{Cell, CellValue};
use crate::row::Row;

static EMPTY: CellValue = CellValue::Empty;

/// Sheet visibility as declared in the workbook directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetVisibility {
    /// Shown in the tab bar
    #[default]
    Visible,
    /// Hidden, can be unhidden by the user
    Hidden,
    /// Hidden, can only be unhidden programmatically
    VeryHidden,
}

impl SheetVisibility {
    /// Map the BOUNDSHEET `hsState` byte. Unknown values count as hidden.
    pub fn from_byte(b: u8) -> Self {
        match b & 0x03 {
            0 => SheetVisibility::Visible,
            1 => SheetVisibility::Hidden,
            _ => SheetVisibility::VeryHidden,
        }
    }
}

/// Kind of substream a sheet entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetKind {
    /// Worksheet or dialog sheet
    #[default]
    Worksheet,
    /// Chart sheet
    Chart,
    /// Excel 4.0 macro sheet
    Macro,
    /// VBA module or any other code
    Other(u8),
}

impl SheetKind {
    /// Map the BOUNDSHEET `dt` byte
    pub fn from_byte(b: u8) -> Self {
        match b {
            0x00 => SheetKind::Worksheet,
            0x01 => SheetKind::Macro,
            0x02 => SheetKind::Chart,
            other => SheetKind::Other(other),
        }
    }
}

/// A worksheet (single sheet in a workbook)
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Byte offset of the sheet's BOF record in the workbook stream
    offset: u32,
    /// Visibility
    visibility: SheetVisibility,
    /// Substream kind
    kind: SheetKind,
    /// Rows keyed by row index
    rows: BTreeMap<u16, Row>,
}

impl Worksheet {
    /// Create a new, visible worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the stream offset of this sheet's substream
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Set the visibility
    pub fn with_visibility(mut self, visibility: SheetVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Set the substream kind
    pub fn with_kind(mut self, kind: SheetKind) -> Self {
        self.kind = kind;
        self
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte offset of the sheet's BOF record in the workbook stream
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Sheet visibility
    pub fn visibility(&self) -> SheetVisibility {
        self.visibility
    }

    /// Check if the sheet is visible
    pub fn is_visible(&self) -> bool {
        self.visibility == SheetVisibility::Visible
    }

    /// Substream kind
    pub fn kind(&self) -> SheetKind {
        self.kind
    }

    /// Get a row by index
    pub fn row(&self, index: u16) -> Option<&Row> {
        self.rows.get(&index)
    }

    /// Iterate over rows that contain at least one cell, in row order
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    /// Get a cell by (row, col)
    pub fn cell_at(&self, row: u16, col: u16) -> Option<&Cell> {
        self.rows.get(&row).and_then(|r| r.cell(col))
    }

    /// Get a cell value by (row, col); holes read as [`CellValue::Empty`]
    pub fn value_at(&self, row: u16, col: u16) -> &CellValue {
        self.cell_at(row, col).map(|c| &c.value).unwrap_or(&EMPTY)
    }

    /// Insert a cell, replacing any cell already at the same coordinates.
    ///
    /// Returns the replaced cell.
    pub fn insert_cell(&mut self, cell: Cell) -> Option<Cell> {
        self.rows
            .entry(cell.row)
            .or_insert_with(|| Row::new(cell.row))
            .insert(cell)
    }

    /// Total number of cells in the sheet
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(Row::len).sum()
    }

    /// Number of non-empty rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Used range as `(first_row, first_col, last_row, last_col)`
    pub fn dimensions(&self) -> Option<(u16, u16, u16, u16)> {
        let first_row = *self.rows.keys().next()?;
        let last_row = *self.rows.keys().next_back()?;
        let (first_col, last_col) = self
            .rows
            .values()
            .filter_map(Row::column_span)
            .fold((u16::MAX, 0), |(lo, hi), (a, b)| (lo.min(a), hi.max(b)));
        Some((first_row, first_col, last_row, last_col))
    }
}
