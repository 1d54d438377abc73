//! Formula cached-result resolution.
//!
//! A FORMULA record stores the last value its formula evaluated to in an
//! 8-byte field. Numbers are stored inline as an IEEE 754 double; other result
//! types are flagged by a `0xFFFF` marker. A text result is not stored in the
//! FORMULA record at all: the producer writes it into a STRING record that
//! immediately follows. One cell therefore spans two records, and the
//! resolver carries the first record's coordinates in a [`FormulaState`]
//! until the second arrives.
//!
//! FORMULA layout: row(2) + col(2) + xf(2) + result(8) + flags(2) +
//! reserved(4) + parsed expression (ignored).

use biffsheets_core::{Cell, CellError, CellValue};

use crate::biff::parser::{read_array, read_cell_header, read_u16, read_u32};
use crate::biff::records;
use crate::biff::strings::SegmentCursor;
use crate::error::{XlsError, XlsResult};

/// Marker type codes shared by both marker layouts.
const RESULT_STRING: u8 = 0x00;
const RESULT_BOOLEAN: u8 = 0x01;
const RESULT_ERROR: u8 = 0x02;
const RESULT_EMPTY: u8 = 0x03;

/// Interpretation of the 8-byte cached-result field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CachedResult {
    Number(f64),
    /// Text, delivered by the next STRING record
    String,
    Boolean(bool),
    Error(CellError),
    Empty,
}

impl CachedResult {
    /// Decode the cached-result field.
    ///
    /// Two marker layouts are recognised:
    /// - `FF FF tt vv ..`: marker first, type `tt`, value `vv`
    /// - `tt .. vv .. .. .. FF FF`: the layout Excel writes, marker last
    ///
    /// Anything else is a little-endian double, taken bit for bit. A double
    /// whose top two bytes are `FF FF` is a negative NaN, which producers do
    /// not emit as a result.
    pub fn decode(bytes: [u8; 8]) -> Self {
        if bytes[0] == 0xFF && bytes[1] == 0xFF {
            if let Some(result) = Self::from_marker(bytes[2], bytes[3]) {
                return result;
            }
        }
        if bytes[6] == 0xFF && bytes[7] == 0xFF {
            if let Some(result) = Self::from_marker(bytes[0], bytes[2]) {
                return result;
            }
        }
        CachedResult::Number(f64::from_le_bytes(bytes))
    }

    fn from_marker(kind: u8, value: u8) -> Option<Self> {
        match kind {
            RESULT_STRING => Some(CachedResult::String),
            RESULT_BOOLEAN => Some(CachedResult::Boolean(value != 0)),
            RESULT_ERROR => Some(CachedResult::Error(CellError::from_code(value))),
            RESULT_EMPTY => Some(CachedResult::Empty),
            _ => None,
        }
    }

    /// The cell value, or `None` for a deferred string.
    pub fn value(&self) -> Option<CellValue> {
        match *self {
            CachedResult::Number(n) => Some(CellValue::Number(n)),
            CachedResult::String => None,
            CachedResult::Boolean(b) => Some(CellValue::Boolean(b)),
            CachedResult::Error(e) => Some(CellValue::Error(e)),
            CachedResult::Empty => Some(CellValue::Empty),
        }
    }
}

/// The fixed-size head of a FORMULA record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormulaRecord {
    pub row: u16,
    pub col: u16,
    pub style_ref: u16,
    pub result: CachedResult,
    pub flags: u16,
}

impl FormulaRecord {
    pub fn parse(data: &[u8]) -> XlsResult<Self> {
        let mut off = 0;
        let (row, col, style_ref) = read_cell_header(data, &mut off)?;
        let result = CachedResult::decode(read_array(data, &mut off)?);
        let flags = read_u16(data, &mut off)?;
        let _reserved = read_u32(data, &mut off)?;
        Ok(Self {
            row,
            col,
            style_ref,
            result,
            flags,
        })
    }
}

/// A FORMULA record whose text result has not arrived yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingFormulaString {
    pub row: u16,
    pub col: u16,
    pub style_ref: u16,
    /// Stream offset of the FORMULA record
    pub offset: u64,
}

impl PendingFormulaString {
    fn missing(&self, found: Option<u16>, offset: u64) -> XlsError {
        XlsError::MissingCachedString {
            row: self.row,
            col: self.col,
            formula_offset: self.offset,
            found,
            offset,
        }
    }
}

/// What a FORMULA record produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The cell is complete
    Emit(Cell),
    /// The cell waits for the next STRING record
    Defer(PendingFormulaString),
}

/// Decoder state carried between the records of one substream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormulaState {
    #[default]
    Idle,
    AwaitingString(PendingFormulaString),
}

impl FormulaState {
    pub fn pending(&self) -> Option<&PendingFormulaString> {
        match self {
            FormulaState::Idle => None,
            FormulaState::AwaitingString(p) => Some(p),
        }
    }

    /// Handle a FORMULA record found at `offset`.
    ///
    /// A pending string for a different cell means its STRING record never
    /// came, which fails with [`XlsError::MissingCachedString`].
    pub fn on_formula(
        self,
        formula: &FormulaRecord,
        offset: u64,
    ) -> XlsResult<(FormulaState, Resolution)> {
        if let FormulaState::AwaitingString(p) = self {
            if (p.row, p.col) != (formula.row, formula.col) {
                return Err(p.missing(Some(records::FORMULA), offset));
            }
        }

        match formula.result.value() {
            Some(value) => Ok((
                FormulaState::Idle,
                Resolution::Emit(Cell::new(formula.row, formula.col, formula.style_ref, value)),
            )),
            None => {
                let pending = PendingFormulaString {
                    row: formula.row,
                    col: formula.col,
                    style_ref: formula.style_ref,
                    offset,
                };
                log::trace!(
                    "FORMULA ({}, {}) at {offset}: string result deferred",
                    formula.row,
                    formula.col
                );
                Ok((FormulaState::AwaitingString(pending), Resolution::Defer(pending)))
            }
        }
    }

    /// Handle a STRING record found at `offset`, completing the pending cell.
    ///
    /// `segments` is the STRING body followed by any CONTINUE bodies.
    pub fn on_string(self, segments: &[&[u8]], offset: u64) -> XlsResult<(FormulaState, Cell)> {
        let FormulaState::AwaitingString(p) = self else {
            return Err(XlsError::OrphanStringRecord { offset });
        };
        let text = SegmentCursor::new(segments).read_unicode_string()?;
        log::trace!("STRING at {offset} resolves ({}, {})", p.row, p.col);
        Ok((FormulaState::Idle, Cell::new(p.row, p.col, p.style_ref, text)))
    }

    /// Handle any other record. Only the formula companion records may sit
    /// between a FORMULA and its STRING.
    pub fn on_record(self, record_type: u16, offset: u64) -> XlsResult<FormulaState> {
        match self {
            FormulaState::Idle => Ok(self),
            FormulaState::AwaitingString(p) => match record_type {
                records::SHRFMLA | records::ARRAY | records::TABLE => Ok(self),
                other => Err(p.missing(Some(other), offset)),
            },
        }
    }

    /// Handle the end of the substream at `offset`.
    pub fn finish(self, offset: u64) -> XlsResult<()> {
        match self {
            FormulaState::Idle => Ok(()),
            FormulaState::AwaitingString(p) => Err(p.missing(None, offset)),
        }
    }
}
