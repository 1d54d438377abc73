//! Shared String Table.
//!
//! The workbook globals hold one SST record listing every unique cell string.
//! Cell records (LABELSST) refer to entries by 0-based index, so the order of
//! the table must match the producer's exactly.
//!
//! SST body layout:
//! - `total` (u32): total number of string references in the workbook
//! - `count` (u32): number of unique strings in this table
//! - `count` strings, each a 2-byte-length BIFF8 string

use biffsheets_core::SharedString;

use crate::biff::strings::SegmentCursor;
use crate::error::{XlsError, XlsResult};

/// An immutable, index-addressable table of decoded strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedStringTable {
    total: u32,
    strings: Vec<SharedString>,
}

impl SharedStringTable {
    /// Build the table from a single SST body.
    pub fn build(payload: &[u8]) -> XlsResult<Self> {
        Self::from_segments(&[payload])
    }

    /// Build the table from an SST body and the bodies of its CONTINUE records.
    pub fn from_segments(segments: &[&[u8]]) -> XlsResult<Self> {
        let mut cur = SegmentCursor::new(segments);

        let (total, count) = match (cur.read_u32(), cur.read_u32()) {
            (Ok(total), Ok(count)) => (total, count as usize),
            _ => {
                return Err(XlsError::MalformedSst(
                    "record too short for string counts".into(),
                ))
            }
        };

        // Each entry needs at least its 3-byte header.
        if count > cur.remaining() / 3 {
            return Err(XlsError::MalformedSst(format!(
                "declares {count} strings but only {} bytes follow",
                cur.remaining()
            )));
        }

        let mut strings = Vec::with_capacity(count);
        for i in 0..count {
            match cur.read_unicode_string() {
                Ok(s) => strings.push(SharedString::from(s)),
                Err(e @ XlsError::UnsupportedEncoding { .. }) => return Err(e),
                Err(e) => {
                    return Err(XlsError::MalformedSst(format!(
                        "string {i} of {count}: {e}"
                    )))
                }
            }
        }

        if cur.remaining() > 0 {
            log::debug!("SST has {} trailing bytes after {count} strings", cur.remaining());
        }

        Ok(Self { total, strings })
    }

    /// Look up a string by index.
    pub fn get(&self, index: u32) -> Option<&SharedString> {
        self.strings.get(index as usize)
    }

    /// Look up a string by index, failing for out-of-range indices.
    pub fn resolve(&self, index: u32) -> XlsResult<SharedString> {
        self.get(index)
            .cloned()
            .ok_or(XlsError::DanglingSstReference {
                index,
                len: self.strings.len(),
            })
    }

    /// Declared total number of string references in the workbook.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Number of unique strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(SharedString::as_str)
    }
}
