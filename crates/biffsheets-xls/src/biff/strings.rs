//! BIFF8 string decoding.
//!
//! BIFF8 strings are laid out as:
//! - Header: char_count (1 or 2 bytes) + flags (1 byte)
//! - Flags bit 0 (`fHighByte`): 0 = compressed 8-bit, 1 = UTF-16LE
//! - Flags bit 2 (`fExtSt`): 4-byte phonetic data size follows the header
//! - Flags bit 3 (`fRichSt`): 2-byte rich text run count follows the header
//! - Then the character data
//! - Then the rich text runs (4 bytes each) if fRichSt
//! - Then the phonetic data if fExtSt
//!
//! Only compressed character data is decoded. UTF-16 data is rejected with
//! [`XlsError::UnsupportedEncoding`].
//!
//! Inside the SST, character data may run past the end of a record into a
//! CONTINUE record. The continuation starts with a fresh flags byte, which
//! [`SegmentCursor`] consumes transparently.

use crate::error::{XlsError, XlsResult};

const FLAG_HIGH_BYTE: u8 = 0x01;
const FLAG_EXT: u8 = 0x04;
const FLAG_RICH: u8 = 0x08;

fn check_encoding(flags: u8) -> XlsResult<()> {
    if flags & FLAG_HIGH_BYTE != 0 {
        return Err(XlsError::UnsupportedEncoding { flags });
    }
    Ok(())
}

fn underrun(what: &str) -> XlsError {
    XlsError::Parse(format!("unexpected end of data reading {what}"))
}

/// Forward-only reader over a record payload and its CONTINUE payloads.
#[derive(Debug)]
pub struct SegmentCursor<'a> {
    segments: &'a [&'a [u8]],
    index: usize,
    pos: usize,
}

impl<'a> SegmentCursor<'a> {
    pub fn new(segments: &'a [&'a [u8]]) -> Self {
        Self {
            segments,
            index: 0,
            pos: 0,
        }
    }

    fn current(&self) -> &'a [u8] {
        self.segments.get(self.index).copied().unwrap_or(&[])
    }

    fn next_segment(&mut self) -> bool {
        if self.index + 1 < self.segments.len() {
            self.index += 1;
            self.pos = 0;
            true
        } else {
            false
        }
    }

    /// Total bytes consumed across all segments.
    pub fn consumed(&self) -> usize {
        self.segments[..self.index.min(self.segments.len())]
            .iter()
            .map(|s| s.len())
            .sum::<usize>()
            + self.pos
    }

    /// Bytes left in the current and following segments.
    pub fn remaining(&self) -> usize {
        let rest: usize = self
            .segments
            .iter()
            .skip(self.index + 1)
            .map(|s| s.len())
            .sum();
        self.current().len().saturating_sub(self.pos) + rest
    }

    pub fn read_u8(&mut self) -> XlsResult<u8> {
        while self.pos >= self.current().len() {
            if !self.next_segment() {
                return Err(underrun("byte"));
            }
        }
        let b = self.current()[self.pos];
        self.pos += 1;
        Ok(b)
    }

    pub fn read_u16(&mut self) -> XlsResult<u16> {
        Ok(u16::from_le_bytes([self.read_u8()?, self.read_u8()?]))
    }

    pub fn read_u32(&mut self) -> XlsResult<u32> {
        Ok(u32::from_le_bytes([
            self.read_u8()?,
            self.read_u8()?,
            self.read_u8()?,
            self.read_u8()?,
        ]))
    }

    /// Skip `n` bytes, crossing segment boundaries without flag bytes.
    pub fn skip(&mut self, mut n: usize) -> XlsResult<()> {
        while n > 0 {
            let available = self.current().len().saturating_sub(self.pos);
            if available == 0 {
                if !self.next_segment() {
                    return Err(underrun("string trailer"));
                }
                continue;
            }
            let step = available.min(n);
            self.pos += step;
            n -= step;
        }
        Ok(())
    }

    /// Read `count` characters of compressed data.
    ///
    /// When the data crosses into the next segment, that segment's leading
    /// flags byte is read and checked before decoding continues.
    pub fn read_chars(&mut self, count: usize, flags: u8) -> XlsResult<String> {
        check_encoding(flags)?;
        let mut text = String::with_capacity(count);
        let mut remaining = count;
        loop {
            let seg = self.current();
            let available = seg.len().saturating_sub(self.pos);
            let n = remaining.min(available);
            text.extend(seg[self.pos..self.pos + n].iter().map(|&b| b as char));
            self.pos += n;
            remaining -= n;
            if remaining == 0 {
                return Ok(text);
            }
            if !self.next_segment() {
                return Err(XlsError::Parse(format!(
                    "string data too short: {remaining} of {count} characters missing"
                )));
            }
            check_encoding(self.read_u8()?)?;
        }
    }

    /// Read a string body once its character count and flags are known:
    /// optional run count and phonetic size, the characters, then the
    /// skipped trailers.
    pub fn read_string_body(&mut self, char_count: usize, flags: u8) -> XlsResult<String> {
        let run_count = if flags & FLAG_RICH != 0 {
            self.read_u16()? as usize
        } else {
            0
        };
        let ext_size = if flags & FLAG_EXT != 0 {
            self.read_u32()? as usize
        } else {
            0
        };

        let text = self.read_chars(char_count, flags)?;

        // Rich text runs: char_pos u16 + font_idx u16
        self.skip(run_count * 4)?;
        self.skip(ext_size)?;
        Ok(text)
    }

    /// Read a string with a 2-byte character count (XLUnicodeRichExtendedString).
    pub fn read_unicode_string(&mut self) -> XlsResult<String> {
        let char_count = self.read_u16()? as usize;
        let flags = self.read_u8()?;
        self.read_string_body(char_count, flags)
    }
}

fn tail<'a>(data: &'a [u8], offset: usize) -> XlsResult<&'a [u8]> {
    data.get(offset..)
        .ok_or_else(|| XlsError::Parse(format!("string offset {offset} past end of data")))
}

/// Read a "short" string (1-byte length prefix, used in BOUNDSHEET).
pub fn read_short_string(data: &[u8], offset: &mut usize) -> XlsResult<String> {
    let segments = [tail(data, *offset)?];
    let mut cur = SegmentCursor::new(&segments);
    let char_count = cur.read_u8()? as usize;
    let flags = cur.read_u8()?;
    let text = cur.read_chars(char_count, flags)?;
    *offset += cur.consumed();
    Ok(text)
}

/// Read a string with a 2-byte length prefix (LABEL, STRING).
pub fn read_unicode_string(data: &[u8], offset: &mut usize) -> XlsResult<String> {
    let segments = [tail(data, *offset)?];
    let mut cur = SegmentCursor::new(&segments);
    let text = cur.read_unicode_string()?;
    *offset += cur.consumed();
    Ok(text)
}
