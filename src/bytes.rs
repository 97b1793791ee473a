//! fixed-width and variable-width integer decoding for the on-disk format.
//!
//! SQLite stores multi-byte integers big-endian, in widths that don't always
//! line up with native integer types (3, 6 bytes), and uses its own varint
//! encoding for record headers, payload sizes and rowids.

use byteorder::{BigEndian, ByteOrder};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("buffer of length {len} too short to read {width}-byte integer at offset {offset}")]
    OutOfRange {
        offset: usize,
        width: usize,
        len: usize,
    },
    #[error("varint at offset {offset} runs past the end of a {len}-byte buffer")]
    TruncatedVarint { offset: usize, len: usize },
}

pub type Result<T> = core::result::Result<T, Error>;

fn check(buf: &[u8], offset: usize, width: usize) -> Result<()> {
    if offset + width > buf.len() {
        return Err(Error::OutOfRange {
            offset,
            width,
            len: buf.len(),
        });
    }
    Ok(())
}

/// reads a big-endian unsigned integer of `width` bytes (1..=8) at `offset`.
pub fn read_uint(buf: &[u8], offset: usize, width: usize) -> Result<u64> {
    check(buf, offset, width)?;
    let mut acc: u64 = 0;
    for b in &buf[offset..offset + width] {
        acc = (acc << 8) | (*b as u64);
    }
    Ok(acc)
}

/// reads a big-endian two's-complement signed integer of `width` bytes (1..=8).
pub fn read_int(buf: &[u8], offset: usize, width: usize) -> Result<i64> {
    let raw = read_uint(buf, offset, width)?;
    let shift = 64 - 8 * width as u32;
    Ok(((raw << shift) as i64) >> shift)
}

pub fn read_u16(buf: &[u8], offset: usize) -> Result<u16> {
    check(buf, offset, 2)?;
    Ok(BigEndian::read_u16(&buf[offset..]))
}

pub fn read_u32(buf: &[u8], offset: usize) -> Result<u32> {
    check(buf, offset, 4)?;
    Ok(BigEndian::read_u32(&buf[offset..]))
}

/// decodes a SQLite varint starting at `buf[offset]`.
///
/// Returns the decoded value and the number of bytes it occupied (1..=9).
/// The first 8 bytes contribute 7 data bits each (high bit is a
/// continuation flag); if all 8 carry the continuation flag, a 9th byte
/// contributes all 8 of its bits.
///
/// `sqlite_varint::read_varint` does the actual bit-shuffling; we scan
/// ahead first so a truncated varint at the end of a page is reported as
/// a typed error instead of reading past the slice.
pub fn read_varint(buf: &[u8], offset: usize) -> Result<(u64, usize)> {
    if offset >= buf.len() {
        return Err(Error::TruncatedVarint {
            offset,
            len: buf.len(),
        });
    }
    let mut expected_len = 9;
    for (i, byte) in buf[offset..].iter().take(9).enumerate() {
        if i == 8 || byte & 0x80 == 0 {
            expected_len = i + 1;
            break;
        }
    }
    if offset + expected_len > buf.len() {
        return Err(Error::TruncatedVarint {
            offset,
            len: buf.len(),
        });
    }
    let (value, len) = sqlite_varint::read_varint(&buf[offset..]);
    Ok((value as u64, len))
}
