//! XLS (BIFF8) reader.
//!
//! Decoding runs in two phases over the workbook stream:
//!
//! 1. **Directory**: walk the globals substream from offset 0, collecting
//!    BOUNDSHEET entries (sheet name + stream offset of the sheet's BOF), the
//!    shared string table and workbook settings, up to the globals EOF.
//! 2. **SheetBody**: for each BOUNDSHEET entry, start a fresh record walk at
//!    the recorded offset and fold the sheet's records into a [`Worksheet`],
//!    up to the sheet's EOF.
//!
//! The SST is complete and read-only before the first sheet pass starts.

use std::io::{Read, Seek};

use biffsheets_core::{SheetKind, SheetVisibility, Workbook, WorkbookSettings, Worksheet};

use crate::biff::parser::{read_u16, read_u32, read_u8};
use crate::biff::records;
use crate::biff::strings::read_short_string;
use crate::biff::{self, Record, RecordIter, HEADER_LEN};
use crate::cells::{decode_cell_record, CellRecord};
use crate::error::{XlsError, XlsResult};
use crate::formula::{FormulaRecord, FormulaState, Resolution};
use crate::sst::SharedStringTable;

/// XLS file reader.
pub struct XlsReader;

/// Options controlling what the reader keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Leave hidden and very hidden sheets out of the workbook.
    pub skip_hidden_sheets: bool,
    /// Keep style-only BLANK/MULBLANK cells as [`biffsheets_core::CellValue::Empty`].
    pub keep_blank_cells: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            skip_hidden_sheets: false,
            keep_blank_cells: true,
        }
    }
}

/// Phase of the decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    Directory,
    SheetBody { index: usize },
    Done,
}

/// A sheet entry from a BOUNDSHEET record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSheet {
    /// Absolute byte offset of the sheet's BOF in the workbook stream.
    pub offset: u32,
    pub visibility: SheetVisibility,
    pub kind: SheetKind,
    pub name: String,
}

/// Everything the globals substream declares.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    pub sheets: Vec<BoundSheet>,
    pub sst: SharedStringTable,
    pub settings: WorkbookSettings,
}

impl XlsReader {
    /// Read an XLS file from any `Read + Seek` source holding a CFB container.
    pub fn read<R: Read + Seek>(reader: R) -> XlsResult<Workbook> {
        Self::read_with_options(reader, &ReadOptions::default())
    }

    /// Like [`XlsReader::read`], with explicit options.
    pub fn read_with_options<R: Read + Seek>(
        reader: R,
        options: &ReadOptions,
    ) -> XlsResult<Workbook> {
        // Open CFB container
        let mut cfb = cfb::CompoundFile::open(reader)?;

        // Read the "Workbook" stream (some files use "Book" for BIFF5)
        let stream_path = if cfb.exists("/Workbook") {
            "/Workbook"
        } else if cfb.exists("/Book") {
            "/Book"
        } else {
            return Err(XlsError::InvalidFormat(
                "no Workbook or Book stream found in CFB".into(),
            ));
        };

        let mut stream_data = Vec::new();
        {
            let mut stream = cfb.open_stream(stream_path)?;
            stream.read_to_end(&mut stream_data)?;
        }

        Self::decode_stream_with_options(&stream_data, options)
    }

    /// Decode a raw BIFF8 workbook stream.
    pub fn decode_stream(stream: &[u8]) -> XlsResult<Workbook> {
        Self::decode_stream_with_options(stream, &ReadOptions::default())
    }

    /// Like [`XlsReader::decode_stream`], with explicit options.
    pub fn decode_stream_with_options(
        stream: &[u8],
        options: &ReadOptions,
    ) -> XlsResult<Workbook> {
        let mut workbook = Workbook::new();
        let mut directory = Directory::default();
        let mut state = AssemblerState::Directory;

        loop {
            state = match state {
                AssemblerState::Directory => {
                    directory = Self::read_directory(stream)?;
                    *workbook.settings_mut() = directory.settings.clone();
                    if directory.sheets.is_empty() {
                        AssemblerState::Done
                    } else {
                        AssemblerState::SheetBody { index: 0 }
                    }
                }
                AssemblerState::SheetBody { index } => {
                    let info = &directory.sheets[index];
                    if let Some(ws) = Self::read_sheet(stream, info, &directory.sst, options)? {
                        workbook.add_worksheet(ws)?;
                    }
                    if index + 1 < directory.sheets.len() {
                        AssemblerState::SheetBody { index: index + 1 }
                    } else {
                        AssemblerState::Done
                    }
                }
                AssemblerState::Done => break,
            };
        }

        Ok(workbook)
    }

    /// Walk the workbook globals substream.
    pub fn read_directory(stream: &[u8]) -> XlsResult<Directory> {
        let mut iter = RecordIter::new(stream);

        let bof = iter
            .next()
            .transpose()?
            .ok_or_else(|| XlsError::InvalidFormat("empty workbook stream".into()))?;
        if bof.record_type != records::BOF {
            return Err(XlsError::InvalidFormat(format!(
                "stream starts with record 0x{:04X}, expected BOF",
                bof.record_type
            )));
        }
        let (version, dt) =
            biff::parse_bof(bof.data).map_err(|e| e.at(bof.record_type, bof.offset))?;
        if dt != records::BOF_WORKBOOK_GLOBALS {
            return Err(XlsError::InvalidFormat(format!(
                "first substream has type 0x{dt:04X}, expected workbook globals"
            )));
        }
        if version != records::BIFF8_VERSION {
            return Err(XlsError::UnsupportedVersion(format!(
                "expected BIFF8 (0x0600), got 0x{version:04X}"
            )));
        }

        let mut directory = Directory::default();
        let mut sst_seen = false;

        for rec in iter {
            let rec = rec?;
            let at = |e: XlsError| e.at(rec.record_type, rec.offset);
            match rec.record_type {
                records::EOF => {
                    log::debug!(
                        "workbook globals: {} sheets, {} shared strings",
                        directory.sheets.len(),
                        directory.sst.len()
                    );
                    return Ok(directory);
                }
                records::BOUNDSHEET => {
                    directory.sheets.push(parse_boundsheet(rec.data).map_err(at)?);
                }
                records::SST => {
                    if sst_seen {
                        return Err(at(XlsError::MalformedSst(
                            "more than one SST record".into(),
                        )));
                    }
                    directory.sst = SharedStringTable::from_segments(&rec.segments()).map_err(at)?;
                    sst_seen = true;
                }
                records::DATEMODE => {
                    let mut off = 0;
                    directory.settings.date_1904 = read_u16(rec.data, &mut off).map_err(at)? == 1;
                }
                records::CODEPAGE => {
                    let mut off = 0;
                    directory.settings.codepage = Some(read_u16(rec.data, &mut off).map_err(at)?);
                }
                records::CONTINUE => {
                    log::warn!("ignoring CONTINUE record without a parent at offset {}", rec.offset);
                }
                _ => {}
            }
        }

        Err(XlsError::TruncatedStream {
            offset: stream.len() as u64,
            needed: HEADER_LEN,
            available: 0,
        })
    }

    /// Fold one sheet substream into a worksheet.
    ///
    /// Returns `None` for sheets the options exclude and for non-worksheet
    /// substreams.
    fn read_sheet(
        stream: &[u8],
        info: &BoundSheet,
        sst: &SharedStringTable,
        options: &ReadOptions,
    ) -> XlsResult<Option<Worksheet>> {
        if options.skip_hidden_sheets && info.visibility != SheetVisibility::Visible {
            log::debug!("skipping hidden sheet '{}'", info.name);
            return Ok(None);
        }
        if info.kind != SheetKind::Worksheet {
            log::warn!("skipping sheet '{}' of kind {:?}", info.name, info.kind);
            return Ok(None);
        }

        let start = info.offset as usize;
        let mut iter = RecordIter::at(stream, start);
        let bof = iter
            .next()
            .transpose()?
            .ok_or(XlsError::TruncatedStream {
                offset: start as u64,
                needed: HEADER_LEN,
                available: 0,
            })?;
        let at = |e: XlsError| e.at(bof.record_type, bof.offset);
        if bof.record_type != records::BOF {
            return Err(at(XlsError::InvalidFormat(format!(
                "sheet '{}' offset {} points at record 0x{:04X}, expected BOF",
                info.name, info.offset, bof.record_type
            ))));
        }
        let (_, dt) = biff::parse_bof(bof.data).map_err(at)?;
        match dt {
            records::BOF_WORKSHEET => {}
            records::BOF_CHART | records::BOF_MACRO => {
                log::warn!("skipping sheet '{}' with substream type 0x{dt:04X}", info.name);
                return Ok(None);
            }
            other => {
                return Err(at(XlsError::InvalidFormat(format!(
                    "sheet '{}' offset {} points at a BOF of substream type 0x{other:04X}",
                    info.name, info.offset
                ))));
            }
        }

        log::debug!("reading sheet '{}' at offset {}", info.name, info.offset);

        let mut ws = Worksheet::new(info.name.as_str())
            .with_offset(info.offset)
            .with_visibility(info.visibility)
            .with_kind(info.kind);
        let mut state = FormulaState::Idle;
        // Depth of embedded substreams (chart objects) being skipped
        let mut depth = 0usize;

        for rec in iter {
            let rec = rec?;
            log::trace!("{} at offset {}", records::name(rec.record_type), rec.offset);
            match rec.record_type {
                records::BOF => {
                    state = state.on_record(rec.record_type, rec.offset)?;
                    depth += 1;
                    continue;
                }
                records::EOF if depth > 0 => {
                    depth -= 1;
                    continue;
                }
                records::EOF => {
                    state.finish(rec.offset)?;
                    return Ok(Some(ws));
                }
                _ if depth > 0 => continue,
                _ => {}
            }

            let (next, cells) = Self::dispatch(state, &rec, sst)?;
            state = next;

            let blank = matches!(rec.record_type, records::BLANK | records::MULBLANK);
            if blank && !options.keep_blank_cells {
                continue;
            }
            for cell in cells.into_iter().flatten() {
                ws.insert_cell(cell);
            }
        }

        state.finish(stream.len() as u64)?;
        Err(XlsError::TruncatedStream {
            offset: stream.len() as u64,
            needed: HEADER_LEN,
            available: 0,
        })
    }

    /// One step of the sheet fold: route a record to the formula resolver or
    /// the cell decoder and return the next state with any finished cells.
    pub fn dispatch(
        state: FormulaState,
        record: &Record<'_>,
        sst: &SharedStringTable,
    ) -> XlsResult<(FormulaState, Option<CellRecord>)> {
        let at = |e: XlsError| e.at(record.record_type, record.offset);
        match record.record_type {
            records::FORMULA => {
                let formula = FormulaRecord::parse(record.data).map_err(at)?;
                let (next, resolution) = state.on_formula(&formula, record.offset)?;
                let cells = match resolution {
                    Resolution::Emit(cell) => Some(CellRecord::Single(cell)),
                    Resolution::Defer(_) => None,
                };
                Ok((next, cells))
            }
            records::STRING => {
                let (next, cell) = state.on_string(&record.segments(), record.offset).map_err(at)?;
                Ok((next, Some(CellRecord::Single(cell))))
            }
            other => {
                let next = state.on_record(other, record.offset)?;
                let cells = decode_cell_record(other, &record.body(), sst).map_err(at)?;
                Ok((next, cells))
            }
        }
    }
}

/// Parse a BOUNDSHEET record body.
fn parse_boundsheet(data: &[u8]) -> XlsResult<BoundSheet> {
    let mut off = 0;
    let offset = read_u32(data, &mut off)?;
    let visibility = SheetVisibility::from_byte(read_u8(data, &mut off)?);
    let kind = SheetKind::from_byte(read_u8(data, &mut off)?);
    let name = read_short_string(data, &mut off)?;

    Ok(BoundSheet {
        offset,
        visibility,
        kind,
        name,
    })
}
