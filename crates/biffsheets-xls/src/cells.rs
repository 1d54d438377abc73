//! Cell record decoding.
//!
//! Turns the payload of a cell-bearing record into [`Cell`]s without touching
//! any worksheet. FORMULA and STRING are handled by [`crate::formula`]
//! because their meaning depends on neighbouring records.

use biffsheets_core::{Cell, CellError, CellValue};

use crate::biff::parser::{read_cell_header, read_f64, read_rk, read_u16, read_u32, read_u8};
use crate::biff::records;
use crate::biff::strings::read_unicode_string;
use crate::error::{XlsError, XlsResult};
use crate::sst::SharedStringTable;

/// Cells produced by one record.
#[derive(Debug, Clone, PartialEq)]
pub enum CellRecord {
    Single(Cell),
    /// MULRK / MULBLANK: consecutive columns of one row
    Span(Vec<Cell>),
}

impl CellRecord {
    pub fn len(&self) -> usize {
        match self {
            CellRecord::Single(_) => 1,
            CellRecord::Span(cells) => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IntoIterator for CellRecord {
    type Item = Cell;
    type IntoIter = std::vec::IntoIter<Cell>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            CellRecord::Single(cell) => vec![cell].into_iter(),
            CellRecord::Span(cells) => cells.into_iter(),
        }
    }
}

/// Decode a cell-bearing record.
///
/// Returns `Ok(None)` for record types that carry no cell value.
pub fn decode_cell_record(
    record_type: u16,
    data: &[u8],
    sst: &SharedStringTable,
) -> XlsResult<Option<CellRecord>> {
    let decoded = match record_type {
        records::LABELSST => CellRecord::Single(parse_labelsst(data, sst)?),
        records::LABEL => CellRecord::Single(parse_label(data)?),
        records::NUMBER => CellRecord::Single(parse_number(data)?),
        records::RK => CellRecord::Single(parse_rk(data)?),
        records::BOOLERR => CellRecord::Single(parse_boolerr(data)?),
        records::BLANK => CellRecord::Single(parse_blank(data)?),
        records::MULRK => CellRecord::Span(parse_mulrk(data)?),
        records::MULBLANK => CellRecord::Span(parse_mulblank(data)?),
        _ => return Ok(None),
    };
    Ok(Some(decoded))
}

/// LABELSST: row(2) + col(2) + xf(2) + sst_index(4)
fn parse_labelsst(data: &[u8], sst: &SharedStringTable) -> XlsResult<Cell> {
    let mut off = 0;
    let (row, col, xf) = read_cell_header(data, &mut off)?;
    let index = read_u32(data, &mut off)?;
    let text = sst.resolve(index)?;
    Ok(Cell::new(row, col, xf, CellValue::Text(text)))
}

/// LABEL: row(2) + col(2) + xf(2) + unicode_string
fn parse_label(data: &[u8]) -> XlsResult<Cell> {
    let mut off = 0;
    let (row, col, xf) = read_cell_header(data, &mut off)?;
    let text = read_unicode_string(data, &mut off)?;
    Ok(Cell::new(row, col, xf, text))
}

/// NUMBER: row(2) + col(2) + xf(2) + f64(8)
fn parse_number(data: &[u8]) -> XlsResult<Cell> {
    let mut off = 0;
    let (row, col, xf) = read_cell_header(data, &mut off)?;
    let value = read_f64(data, &mut off)?;
    Ok(Cell::new(row, col, xf, value))
}

/// RK: row(2) + col(2) + xf(2) + rk(4)
fn parse_rk(data: &[u8]) -> XlsResult<Cell> {
    let mut off = 0;
    let (row, col, xf) = read_cell_header(data, &mut off)?;
    let value = read_rk(data, &mut off)?;
    Ok(Cell::new(row, col, xf, value))
}

/// BOOLERR: row(2) + col(2) + xf(2) + value(1) + is_error(1)
fn parse_boolerr(data: &[u8]) -> XlsResult<Cell> {
    let mut off = 0;
    let (row, col, xf) = read_cell_header(data, &mut off)?;
    let val = read_u8(data, &mut off)?;
    let is_error = read_u8(data, &mut off)?;

    let value = if is_error != 0 {
        CellValue::Error(CellError::from_code(val))
    } else {
        CellValue::Boolean(val != 0)
    };
    Ok(Cell::new(row, col, xf, value))
}

/// BLANK: row(2) + col(2) + xf(2)
fn parse_blank(data: &[u8]) -> XlsResult<Cell> {
    let mut off = 0;
    let (row, col, xf) = read_cell_header(data, &mut off)?;
    Ok(Cell::new(row, col, xf, CellValue::Empty))
}

/// Split a MULRK/MULBLANK body into `(row, first_col, last_col, items)`.
fn span_bounds(data: &[u8], name: &str) -> XlsResult<(u16, u16, u16, usize)> {
    if data.len() < 6 {
        return Err(XlsError::Parse(format!("{name} record too short")));
    }
    let mut off = 0;
    let row = read_u16(data, &mut off)?;
    let first_col = read_u16(data, &mut off)?;
    let mut tail = data.len() - 2;
    let last_col = read_u16(data, &mut tail)?;
    if last_col < first_col {
        return Err(XlsError::Parse(format!(
            "{name} last column {last_col} before first column {first_col}"
        )));
    }
    Ok((row, first_col, last_col, data.len() - 2))
}

/// MULRK: row(2) + first_col(2) + [xf(2) + rk(4)]* + last_col(2)
fn parse_mulrk(data: &[u8]) -> XlsResult<Vec<Cell>> {
    let (row, first_col, last_col, end) = span_bounds(data, "MULRK")?;
    let items = &data[..end];
    let mut off = 4;
    let mut cells = Vec::with_capacity((last_col - first_col) as usize + 1);
    for col in first_col..=last_col {
        let xf = read_u16(items, &mut off)?;
        let value = read_rk(items, &mut off)?;
        cells.push(Cell::new(row, col, xf, value));
    }
    Ok(cells)
}

/// MULBLANK: row(2) + first_col(2) + [xf(2)]* + last_col(2)
fn parse_mulblank(data: &[u8]) -> XlsResult<Vec<Cell>> {
    let (row, first_col, last_col, end) = span_bounds(data, "MULBLANK")?;
    let items = &data[..end];
    let mut off = 4;
    let mut cells = Vec::with_capacity((last_col - first_col) as usize + 1);
    for col in first_col..=last_col {
        let xf = read_u16(items, &mut off)?;
        cells.push(Cell::new(row, col, xf, CellValue::Empty));
    }
    Ok(cells)
}
