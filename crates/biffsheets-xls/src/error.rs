//! XLS error types

use thiserror::Error;

/// Result type for XLS operations
pub type XlsResult<T> = std::result::Result<T, XlsError>;

/// Errors that can occur while decoding a BIFF8 workbook stream
#[derive(Debug, Error)]
pub enum XlsError {
    /// IO error (also covers CFB errors which use std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended inside a record header or payload
    #[error("Truncated stream at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedStream {
        offset: u64,
        needed: usize,
        available: usize,
    },

    /// SST counts disagree with its contents
    #[error("Malformed SST: {0}")]
    MalformedSst(String),

    /// LABELSST index beyond the end of the shared string table
    #[error("SST index {index} out of range (table has {len} strings)")]
    DanglingSstReference { index: u32, len: usize },

    /// Character data in an encoding this decoder does not handle
    #[error("Unsupported string encoding (flags 0x{flags:02X})")]
    UnsupportedEncoding { flags: u8 },

    /// STRING record without a preceding string-valued FORMULA
    #[error("STRING record at offset {offset} does not follow a string-valued FORMULA")]
    OrphanStringRecord { offset: u64 },

    /// A string-valued FORMULA was not followed by its STRING record
    #[error(
        "FORMULA at offset {formula_offset} for cell ({row}, {col}) has no cached string: {}",
        describe_interruption(.found, .offset)
    )]
    MissingCachedString {
        row: u16,
        col: u16,
        formula_offset: u64,
        /// Record type seen instead of STRING (`None` at a substream boundary)
        found: Option<u16>,
        offset: u64,
    },

    /// Invalid file format
    #[error("Invalid XLS format: {0}")]
    InvalidFormat(String),

    /// Unsupported version
    #[error("Unsupported XLS version: {0}")]
    UnsupportedVersion(String),

    /// Field-level parse error inside a record payload
    #[error("Parse error: {0}")]
    Parse(String),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] biffsheets_core::Error),

    /// An error raised while decoding a specific record
    #[error("Record 0x{record_type:04X} at offset {offset}: {source}")]
    Record {
        record_type: u16,
        offset: u64,
        #[source]
        source: Box<XlsError>,
    },
}

fn describe_interruption(found: &Option<u16>, offset: &u64) -> String {
    match found {
        Some(t) => format!("found record 0x{t:04X} at offset {offset}"),
        None => format!("substream ended at offset {offset}"),
    }
}

impl XlsError {
    /// Attach the record position to an error that does not carry one.
    pub fn at(self, record_type: u16, offset: u64) -> Self {
        match self {
            XlsError::Record { .. }
            | XlsError::TruncatedStream { .. }
            | XlsError::OrphanStringRecord { .. }
            | XlsError::MissingCachedString { .. } => self,
            other => XlsError::Record {
                record_type,
                offset,
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, with any record context removed
    pub fn root(&self) -> &XlsError {
        match self {
            XlsError::Record { source, .. } => source.root(),
            other => other,
        }
    }
}
