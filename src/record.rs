//! assembles a cell's payload (following overflow pages when present) and
//! splits it into a record header (serial types) and body (column bytes).

use crate::btree::cell::LocalInfo;
use crate::pager::Pager;
use crate::value::Value;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Bytes(#[from] crate::bytes::Error),
    #[error("{0}")]
    Pager(#[from] crate::pager::Error),
    #[error("record header claims {claimed} bytes but {consumed} were consumed decoding its serial types")]
    HeaderLengthMismatch { claimed: usize, consumed: usize },
    #[error("serial type {0} is reserved and cannot appear in a valid record")]
    ReservedSerialType(u64),
    #[error("serial type {0} (floating point) is not supported")]
    UnsupportedFloat(u64),
    #[error("record body is shorter than its header declares")]
    TruncatedBody,
}

pub type Result<T> = core::result::Result<T, Error>;

/// One decoded serial-type entry from a record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialType {
    Null,
    Int(usize),
    Zero,
    One,
    Blob(usize),
    Text(usize),
}

impl SerialType {
    fn from_code(code: u64) -> Result<SerialType> {
        match code {
            0 => Ok(SerialType::Null),
            1 => Ok(SerialType::Int(1)),
            2 => Ok(SerialType::Int(2)),
            3 => Ok(SerialType::Int(3)),
            4 => Ok(SerialType::Int(4)),
            5 => Ok(SerialType::Int(6)),
            6 => Ok(SerialType::Int(8)),
            7 => Err(Error::UnsupportedFloat(code)),
            8 => Ok(SerialType::Zero),
            9 => Ok(SerialType::One),
            10 | 11 => Err(Error::ReservedSerialType(code)),
            n if n >= 12 && n % 2 == 0 => Ok(SerialType::Blob(((n - 12) / 2) as usize)),
            n => Ok(SerialType::Text(((n - 13) / 2) as usize)),
        }
    }

    fn content_size(self) -> usize {
        match self {
            SerialType::Null | SerialType::Zero | SerialType::One => 0,
            SerialType::Int(w) => w,
            SerialType::Blob(n) | SerialType::Text(n) => n,
        }
    }
}

/// Walks from a page's cell-pointer array start following the overflow
/// chain, if any, to reassemble the full payload into one contiguous
/// buffer.
pub fn assemble_payload(
    pager: &Pager,
    page: &[u8],
    payload_offset: usize,
    payload_size: u64,
    local: LocalInfo,
) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(payload_size as usize);
    out.extend_from_slice(&page[payload_offset..payload_offset + local.local_bytes]);

    let mut next = local.overflow_page;
    let usable = pager.usable_size() as usize;
    while let Some(page_num) = next {
        if page_num == 0 {
            break;
        }
        let pin = pager.get_page(page_num)?;
        let ov = pin.bytes();
        let following = crate::bytes::read_u32(&ov, 0)?;
        let remaining = payload_size as usize - out.len();
        let take = std::cmp::min(remaining, usable - 4);
        out.extend_from_slice(&ov[4..4 + take]);
        next = if following == 0 { None } else { Some(following) };
    }

    if out.len() != payload_size as usize {
        return Err(Error::TruncatedBody);
    }
    Ok(out)
}

/// A decoded record: serial types plus the body bytes they describe.
pub struct Record<'a> {
    pub types: Vec<SerialType>,
    pub body: &'a [u8],
}

/// Splits an assembled payload into its header (serial types) and body.
///
/// The header's declared length must be consumed exactly by its sequence
/// of varints; any mismatch is a corrupt-record error, per the format's
/// invariant that `header_size` and the serial-type list agree exactly.
pub fn decode_record(payload: &[u8]) -> Result<Record<'_>> {
    let (header_size, n0) = crate::bytes::read_varint(payload, 0)?;
    let mut offset = n0;
    let mut types = vec![];
    while offset < header_size as usize {
        let (code, n) = crate::bytes::read_varint(payload, offset)?;
        types.push(SerialType::from_code(code)?);
        offset += n;
    }
    if offset != header_size as usize {
        return Err(Error::HeaderLengthMismatch {
            claimed: header_size as usize,
            consumed: offset,
        });
    }
    let body = &payload[header_size as usize..];
    Ok(Record { types, body })
}

/// Produces one [`Value`] per serial type in `record`, slicing `record.body`
/// in order.
pub fn decode_values(record: &Record<'_>) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(record.types.len());
    let mut offset = 0usize;
    for st in &record.types {
        let size = st.content_size();
        if offset + size > record.body.len() {
            return Err(Error::TruncatedBody);
        }
        let slice = &record.body[offset..offset + size];
        let value = match st {
            SerialType::Null => Value::Null,
            SerialType::Zero => Value::Int(0),
            SerialType::One => Value::Int(1),
            SerialType::Int(w) => Value::Int(crate::bytes::read_int(slice, 0, *w)?),
            SerialType::Text(_) => Value::Text(slice.to_vec()),
            SerialType::Blob(_) => Value::Text(slice.to_vec()),
        };
        values.push(value);
        offset += size;
    }
    Ok(values)
}
