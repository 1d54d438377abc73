//! Common utilities for XLS E2E tests.
//!
//! Record constructors plus a [`StreamBuilder`] that lays out a workbook
//! globals substream followed by sheet substreams and fills in the
//! BOUNDSHEET offsets.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use biffsheets_xls::biff::records;

/// Cached-result field announcing a STRING record (`FF FF 00 ..`).
pub const STRING_RESULT: [u8; 8] = [0xFF, 0xFF, 0x00, 0, 0, 0, 0, 0];

pub fn record(id: u16, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + body.len());
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(&(body.len() as u16).to_le_bytes());
    out.extend_from_slice(body);
    out
}

pub fn bof(substream: u16) -> Vec<u8> {
    bof_version(records::BIFF8_VERSION, substream)
}

pub fn bof_version(version: u16, substream: u16) -> Vec<u8> {
    let mut body = version.to_le_bytes().to_vec();
    body.extend_from_slice(&substream.to_le_bytes());
    record(records::BOF, &body)
}

pub fn eof() -> Vec<u8> {
    record(records::EOF, &[])
}

/// 2-byte-length compressed string body.
pub fn unicode_string(text: &str) -> Vec<u8> {
    let mut buf = (text.len() as u16).to_le_bytes().to_vec();
    buf.push(0x00);
    buf.extend_from_slice(text.as_bytes());
    buf
}

/// SST body: total, unique count, strings.
pub fn sst_body(strings: &[&str]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(strings.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(strings.len() as u32).to_le_bytes());
    for s in strings {
        buf.extend(unicode_string(s));
    }
    buf
}

fn cell_header(row: u16, col: u16) -> Vec<u8> {
    let mut buf = Vec::with_capacity(6);
    buf.extend_from_slice(&row.to_le_bytes());
    buf.extend_from_slice(&col.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf
}

pub fn label_sst(row: u16, col: u16, index: u32) -> Vec<u8> {
    let mut body = cell_header(row, col);
    body.extend_from_slice(&index.to_le_bytes());
    record(records::LABELSST, &body)
}

pub fn label(row: u16, col: u16, text: &str) -> Vec<u8> {
    let mut body = cell_header(row, col);
    body.extend(unicode_string(text));
    record(records::LABEL, &body)
}

pub fn number(row: u16, col: u16, value: f64) -> Vec<u8> {
    let mut body = cell_header(row, col);
    body.extend_from_slice(&value.to_le_bytes());
    record(records::NUMBER, &body)
}

pub fn rk(row: u16, col: u16, rk: u32) -> Vec<u8> {
    let mut body = cell_header(row, col);
    body.extend_from_slice(&rk.to_le_bytes());
    record(records::RK, &body)
}

pub fn mulrk(row: u16, first_col: u16, rks: &[u32]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&row.to_le_bytes());
    body.extend_from_slice(&first_col.to_le_bytes());
    for rk in rks {
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&rk.to_le_bytes());
    }
    body.extend_from_slice(&(first_col + rks.len() as u16 - 1).to_le_bytes());
    record(records::MULRK, &body)
}

pub fn boolerr(row: u16, col: u16, value: u8, is_error: bool) -> Vec<u8> {
    let mut body = cell_header(row, col);
    body.push(value);
    body.push(is_error as u8);
    record(records::BOOLERR, &body)
}

pub fn blank(row: u16, col: u16) -> Vec<u8> {
    record(records::BLANK, &cell_header(row, col))
}

pub fn mulblank(row: u16, first_col: u16, last_col: u16) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&row.to_le_bytes());
    body.extend_from_slice(&first_col.to_le_bytes());
    for _ in first_col..=last_col {
        body.extend_from_slice(&0u16.to_le_bytes());
    }
    body.extend_from_slice(&last_col.to_le_bytes());
    record(records::MULBLANK, &body)
}

pub fn formula(row: u16, col: u16, result: [u8; 8]) -> Vec<u8> {
    let mut body = cell_header(row, col);
    body.extend_from_slice(&result);
    body.extend_from_slice(&0u16.to_le_bytes()); // flags
    body.extend_from_slice(&0u32.to_le_bytes()); // reserved
    // Token array, ignored by the reader
    body.extend_from_slice(&[0x03, 0x00, 0x1E, 0x01, 0x00]);
    record(records::FORMULA, &body)
}

pub fn formula_number(row: u16, col: u16, value: f64) -> Vec<u8> {
    formula(row, col, value.to_le_bytes())
}

pub fn string(text: &str) -> Vec<u8> {
    record(records::STRING, &unicode_string(text))
}

/// One sheet entry for [`StreamBuilder`].
pub struct SheetFixture {
    pub name: String,
    pub visibility: u8,
    pub kind: u8,
    /// The full substream, BOF to EOF
    pub substream: Vec<u8>,
}

/// Lays out a workbook stream: globals first, then each sheet substream in order.
#[derive(Default)]
pub struct StreamBuilder {
    globals: Vec<u8>,
    sst: Option<Vec<u8>>,
    sheets: Vec<SheetFixture>,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to the globals substream, before the BOUNDSHEET entries.
    pub fn global(mut self, rec: Vec<u8>) -> Self {
        self.globals.extend(rec);
        self
    }

    pub fn sst(mut self, strings: &[&str]) -> Self {
        self.sst = Some(record(records::SST, &sst_body(strings)));
        self
    }

    /// Use raw bytes (SST plus any CONTINUE records) in place of the SST.
    pub fn sst_raw(mut self, bytes: Vec<u8>) -> Self {
        self.sst = Some(bytes);
        self
    }

    /// Add a visible worksheet whose body is `cells`.
    pub fn sheet(self, name: &str, cells: Vec<Vec<u8>>) -> Self {
        self.sheet_with(name, 0, 0, worksheet(cells))
    }

    pub fn sheet_with(mut self, name: &str, visibility: u8, kind: u8, substream: Vec<u8>) -> Self {
        self.sheets.push(SheetFixture {
            name: name.to_string(),
            visibility,
            kind,
            substream,
        });
        self
    }

    pub fn build(self) -> Vec<u8> {
        let boundsheet_len = |s: &SheetFixture| 4 + 4 + 1 + 1 + 1 + 1 + s.name.len();
        let sst_len = self.sst.as_ref().map_or(0, Vec::len);
        let globals_len = bof(records::BOF_WORKBOOK_GLOBALS).len()
            + self.globals.len()
            + self.sheets.iter().map(boundsheet_len).sum::<usize>()
            + sst_len
            + eof().len();

        let mut stream = bof(records::BOF_WORKBOOK_GLOBALS);
        stream.extend(&self.globals);

        let mut offset = globals_len;
        for sheet in &self.sheets {
            let mut body = (offset as u32).to_le_bytes().to_vec();
            body.push(sheet.visibility);
            body.push(sheet.kind);
            body.push(sheet.name.len() as u8);
            body.push(0x00);
            body.extend_from_slice(sheet.name.as_bytes());
            stream.extend(record(records::BOUNDSHEET, &body));
            offset += sheet.substream.len();
        }
        if let Some(sst) = &self.sst {
            stream.extend(sst);
        }
        stream.extend(eof());
        assert_eq!(stream.len(), globals_len);

        for sheet in &self.sheets {
            stream.extend(&sheet.substream);
        }
        stream
    }
}

/// Wrap cell records in a worksheet BOF/EOF pair.
pub fn worksheet(cells: Vec<Vec<u8>>) -> Vec<u8> {
    let mut out = bof(records::BOF_WORKSHEET);
    for c in cells {
        out.extend(c);
    }
    out.extend(eof());
    out
}

/// The label + string-formula + number-formula workbook.
pub fn seed_stream() -> Vec<u8> {
    StreamBuilder::new()
        .sst(&["Normal"])
        .sheet(
            "Sheet1",
            vec![
                label_sst(0, 0, 0),
                formula(0, 1, STRING_RESULT),
                string("FormulaString"),
                formula_number(0, 2, 123.45),
            ],
        )
        .build()
}

/// Store a workbook stream in a CFB container under `/Workbook`.
pub fn into_cfb(stream: &[u8]) -> Cursor<Vec<u8>> {
    let mut comp = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
    {
        let mut s = comp.create_stream("/Workbook").unwrap();
        s.write_all(stream).unwrap();
        s.flush().unwrap();
    }
    comp.flush().unwrap();
    let mut cursor = comp.into_inner();
    cursor.set_position(0);
    cursor
}
