//! Low-level binary parsing helpers for BIFF8 record payloads.
//!
//! All multi-byte integers in BIFF8 are little-endian. Every reader takes the
//! payload and a cursor, and advances the cursor only on success.

use crate::error::{XlsError, XlsResult};

/// Borrow `n` bytes at `offset`, advancing `offset`.
#[inline]
pub fn take<'a>(data: &'a [u8], offset: &mut usize, n: usize) -> XlsResult<&'a [u8]> {
    let end = offset
        .checked_add(n)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            XlsError::Parse(format!(
                "unexpected end of data at offset {}, need {} bytes, have {}",
                *offset,
                n,
                data.len().saturating_sub(*offset)
            ))
        })?;
    let bytes = &data[*offset..end];
    *offset = end;
    Ok(bytes)
}

/// Read a fixed-size byte array, advancing `offset`.
#[inline]
pub fn read_array<const N: usize>(data: &[u8], offset: &mut usize) -> XlsResult<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(take(data, offset, N)?);
    Ok(out)
}

/// Read a `u8`, advancing `offset`.
#[inline]
pub fn read_u8(data: &[u8], offset: &mut usize) -> XlsResult<u8> {
    read_array::<1>(data, offset).map(|[b]| b)
}

/// Read a little-endian `u16`, advancing `offset`.
#[inline]
pub fn read_u16(data: &[u8], offset: &mut usize) -> XlsResult<u16> {
    read_array(data, offset).map(u16::from_le_bytes)
}

/// Read a little-endian `u32`, advancing `offset`.
#[inline]
pub fn read_u32(data: &[u8], offset: &mut usize) -> XlsResult<u32> {
    read_array(data, offset).map(u32::from_le_bytes)
}

/// Read an IEEE 754 double (little-endian). The bit pattern is kept exactly.
#[inline]
pub fn read_f64(data: &[u8], offset: &mut usize) -> XlsResult<f64> {
    read_array(data, offset).map(f64::from_le_bytes)
}

/// Decode an RK-encoded number.
///
/// RK encoding (4 bytes):
/// - Bit 0: if 1, the decoded number should be divided by 100
/// - Bit 1: if 1, value is an integer (bits 2..31 as signed 30-bit int)
///           if 0, value is an IEEE 754 double (bits 2..31 are the upper 30 bits,
///           lower 34 bits of the double are zero)
#[inline]
pub fn decode_rk(rk: u32) -> f64 {
    let div100 = (rk & 0x01) != 0;
    let is_integer = (rk & 0x02) != 0;

    let value = if is_integer {
        ((rk as i32) >> 2) as f64
    } else {
        f64::from_bits(((rk & 0xFFFF_FFFC) as u64) << 32)
    };

    if div100 {
        value / 100.0
    } else {
        value
    }
}

/// Read an RK value from 4 bytes at `offset`.
#[inline]
pub fn read_rk(data: &[u8], offset: &mut usize) -> XlsResult<f64> {
    read_u32(data, offset).map(decode_rk)
}

/// Read the `(row, col, xf)` triple that starts every cell record.
#[inline]
pub fn read_cell_header(data: &[u8], offset: &mut usize) -> XlsResult<(u16, u16, u16)> {
    let row = read_u16(data, offset)?;
    let col = read_u16(data, offset)?;
    let xf = read_u16(data, offset)?;
    Ok((row, col, xf))
}
