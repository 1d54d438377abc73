//! BIFF8 (Binary Interchange File Format) handling.
//!
//! This module provides the record-level abstraction for reading BIFF8 streams.
//! A BIFF8 stream is a sequence of records, each with a 4-byte header
//! (2 bytes record type + 2 bytes body length) followed by the body.
//! There is no index: the only way to find a record is to walk from a known
//! record boundary, which is why every [`Record`] remembers the stream
//! offset of its header.
//!
//! CONTINUE records (type 0x003C) extend the body of the preceding record
//! beyond the 8224-byte per-record limit. [`RecordIter`] attaches them to
//! their parent instead of yielding them.

pub mod parser;
pub mod records;
pub mod strings;

use std::borrow::Cow;

use crate::error::{XlsError, XlsResult};

/// Size of a record header (type + length).
pub const HEADER_LEN: usize = 4;

/// A single BIFF8 record, borrowed from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'a> {
    /// Record type ID (e.g. `records::SST`, `records::FORMULA`).
    pub record_type: u16,
    /// Byte offset of this record's header in the stream.
    pub offset: u64,
    /// Record body, exactly as long as the header declares.
    pub data: &'a [u8],
    /// Bodies of the CONTINUE records that immediately followed.
    pub continuations: Vec<&'a [u8]>,
}

impl<'a> Record<'a> {
    /// The full body with continuations appended. Borrowed when there are none.
    pub fn body(&self) -> Cow<'a, [u8]> {
        if self.continuations.is_empty() {
            Cow::Borrowed(self.data)
        } else {
            let mut joined = self.data.to_vec();
            for c in &self.continuations {
                joined.extend_from_slice(c);
            }
            Cow::Owned(joined)
        }
    }

    /// The body followed by each continuation, kept separate.
    pub fn segments(&self) -> Vec<&'a [u8]> {
        std::iter::once(self.data)
            .chain(self.continuations.iter().copied())
            .collect()
    }
}

/// Lazy, forward-only iterator over the records of a BIFF8 stream.
///
/// Yields `Err(TruncatedStream)` once if a header or body runs past the end
/// of the stream, then stops.
#[derive(Debug, Clone)]
pub struct RecordIter<'a> {
    stream: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> RecordIter<'a> {
    /// Walk the stream from its first byte.
    pub fn new(stream: &'a [u8]) -> Self {
        Self::at(stream, 0)
    }

    /// Walk the stream from `offset`, which must be a record boundary.
    pub fn at(stream: &'a [u8], offset: usize) -> Self {
        Self {
            stream,
            pos: offset,
            failed: false,
        }
    }

    /// Offset of the next record header.
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    fn peek_type(&self) -> Option<u16> {
        let header = self.stream.get(self.pos..self.pos + 2)?;
        Some(u16::from_le_bytes([header[0], header[1]]))
    }

    /// Read one physical record.
    fn read_raw(&mut self) -> Option<XlsResult<(u16, u64, &'a [u8])>> {
        let start = self.pos;
        if start == self.stream.len() {
            return None;
        }
        let available = self.stream.len().saturating_sub(start);
        if available < HEADER_LEN {
            return Some(Err(XlsError::TruncatedStream {
                offset: start as u64,
                needed: HEADER_LEN,
                available,
            }));
        }

        let header = &self.stream[start..start + HEADER_LEN];
        let record_type = u16::from_le_bytes([header[0], header[1]]);
        let body_len = u16::from_le_bytes([header[2], header[3]]) as usize;

        let body_start = start + HEADER_LEN;
        let available = self.stream.len() - body_start;
        if available < body_len {
            return Some(Err(XlsError::TruncatedStream {
                offset: body_start as u64,
                needed: body_len,
                available,
            }));
        }

        self.pos = body_start + body_len;
        Some(Ok((
            record_type,
            start as u64,
            &self.stream[body_start..self.pos],
        )))
    }

    fn read_record(&mut self) -> Option<XlsResult<Record<'a>>> {
        let (record_type, offset, data) = match self.read_raw()? {
            Ok(raw) => raw,
            Err(e) => return Some(Err(e)),
        };

        let mut continuations = Vec::new();
        if record_type != records::CONTINUE {
            while self.peek_type() == Some(records::CONTINUE) {
                match self.read_raw()? {
                    Ok((_, _, body)) => continuations.push(body),
                    Err(e) => return Some(Err(e)),
                }
            }
        }

        Some(Ok(Record {
            record_type,
            offset,
            data,
            continuations,
        }))
    }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = XlsResult<Record<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.read_record();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

/// Extract the BOF record fields from a record body.
///
/// Returns `(version, substream_type)`.
/// - `version` should be `0x0600` for BIFF8
/// - `substream_type`: 0x0005 = workbook globals, 0x0010 = worksheet, etc.
pub fn parse_bof(data: &[u8]) -> XlsResult<(u16, u16)> {
    let mut off = 0;
    let version = parser::read_u16(data, &mut off)
        .map_err(|_| XlsError::InvalidFormat("BOF record too short".into()))?;
    let dt = parser::read_u16(data, &mut off)
        .map_err(|_| XlsError::InvalidFormat("BOF record too short".into()))?;
    Ok((version, dt))
}
