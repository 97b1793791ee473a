//! decodes the four on-disk cell shapes and the local/overflow split of
//! their payloads.

use super::{PageType, Result, RowId};

/// the portion of a payload-bearing cell stored on-page, plus the page
/// number of the first overflow page when the payload spills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalInfo {
    pub local_bytes: usize,
    pub overflow_page: Option<u32>,
}

/// Computes how much of a `payload_size`-byte payload is stored locally
/// given the page's usable size, per the SQLite file format's spill rules.
///
/// `is_table_leaf` selects between the table-leaf max-local formula
/// (`U - 35`) and the index formula (`((U-12)*64/255) - 23`); both variants
/// share the same min-local (`((U-12)*32/255) - 23`) and spill formula.
pub fn compute_local(payload_size: u64, usable_size: u32, is_table_leaf: bool) -> usize {
    let u = usable_size as i64;
    let max_local: i64 = if is_table_leaf {
        u - 35
    } else {
        (u - 12) * 64 / 255 - 23
    };
    let min_local: i64 = (u - 12) * 32 / 255 - 23;

    if (payload_size as i64) <= max_local {
        return payload_size as usize;
    }
    let k = min_local + ((payload_size as i64 - min_local) % (u - 4));
    if k <= max_local {
        k as usize
    } else {
        min_local as usize
    }
}

fn local_info(
    total_payload: u64,
    local_bytes: usize,
    remaining: &[u8],
) -> Result<LocalInfo> {
    if (local_bytes as u64) < total_payload {
        let overflow_page = crate::bytes::read_u32(remaining, 0)?;
        Ok(LocalInfo {
            local_bytes,
            overflow_page: Some(overflow_page),
        })
    } else {
        Ok(LocalInfo {
            local_bytes,
            overflow_page: None,
        })
    }
}

/// A decoded cell, positioned within its page but not yet holding the
/// reassembled (possibly-overflowing) payload bytes.
#[derive(Debug, Clone)]
pub enum Cell {
    TableLeaf {
        rowid: RowId,
        payload_size: u64,
        /// offset within the page where local payload bytes begin.
        payload_offset: usize,
        local: LocalInfo,
    },
    TableInterior {
        left_child: u32,
        rowid: RowId,
    },
    IndexLeaf {
        payload_size: u64,
        payload_offset: usize,
        local: LocalInfo,
    },
    IndexInterior {
        left_child: u32,
        payload_size: u64,
        payload_offset: usize,
        local: LocalInfo,
    },
}

/// Decodes the cell at `offset` within `page`, whose containing page has
/// type `page_type` and usable size `usable_size`.
pub fn decode_cell(page: &[u8], offset: usize, page_type: PageType, usable_size: u32) -> Result<Cell> {
    match page_type {
        PageType::TableLeaf => {
            let (payload_size, n1) = crate::bytes::read_varint(page, offset)?;
            let (rowid, n2) = crate::bytes::read_varint(page, offset + n1)?;
            let payload_offset = offset + n1 + n2;
            let local_bytes = compute_local(payload_size, usable_size, true);
            let local = local_info(payload_size, local_bytes, &page[payload_offset + local_bytes..])?;
            Ok(Cell::TableLeaf {
                rowid: rowid as RowId,
                payload_size,
                payload_offset,
                local,
            })
        }
        PageType::TableInterior => {
            let left_child = crate::bytes::read_u32(page, offset)?;
            let (rowid, _) = crate::bytes::read_varint(page, offset + 4)?;
            Ok(Cell::TableInterior {
                left_child,
                rowid: rowid as RowId,
            })
        }
        PageType::IndexLeaf => {
            let (payload_size, n1) = crate::bytes::read_varint(page, offset)?;
            let payload_offset = offset + n1;
            let local_bytes = compute_local(payload_size, usable_size, false);
            let local = local_info(payload_size, local_bytes, &page[payload_offset + local_bytes..])?;
            Ok(Cell::IndexLeaf {
                payload_size,
                payload_offset,
                local,
            })
        }
        PageType::IndexInterior => {
            let left_child = crate::bytes::read_u32(page, offset)?;
            let (payload_size, n1) = crate::bytes::read_varint(page, offset + 4)?;
            let payload_offset = offset + 4 + n1;
            let local_bytes = compute_local(payload_size, usable_size, false);
            let local = local_info(payload_size, local_bytes, &page[payload_offset + local_bytes..])?;
            Ok(Cell::IndexInterior {
                left_child,
                payload_size,
                payload_offset,
                local,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_local_fits_on_page() {
        // small payload always fits locally regardless of shape.
        assert_eq!(compute_local(10, 4096, true), 10);
        assert_eq!(compute_local(10, 4096, false), 10);
    }

    #[test]
    fn test_compute_local_table_leaf_max() {
        let usable = 4096u32;
        let max_local = usable as i64 - 35;
        assert_eq!(compute_local(max_local as u64, usable, true), max_local as usize);
        // one byte over max spills; result is the spill formula, not payload_size.
        let spilled = compute_local(max_local as u64 + 1, usable, true);
        assert!(spilled < (max_local + 1) as usize);
    }

    #[test]
    fn test_compute_local_large_overflowing_payload() {
        // 8000-byte payload on a 4096-byte usable page spills.
        let local = compute_local(8000, 4096, true);
        assert!(local < 8000);
        assert!(local > 0);
    }

    fn build_table_leaf_cell(rowid: i64, payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![];
        let (psize_bytes, _) = (payload.len() as u64, 0);
        buf.extend(encode_varint(psize_bytes));
        buf.extend(encode_varint(rowid as u64));
        buf.extend_from_slice(payload);
        buf
    }

    // minimal varint encoder for building test fixtures (values < 2^28, plenty for tests).
    fn encode_varint(mut v: u64) -> Vec<u8> {
        if v == 0 {
            return vec![0];
        }
        let mut bytes = vec![];
        while v > 0 {
            bytes.push((v & 0x7f) as u8);
            v >>= 7;
        }
        bytes.reverse();
        let last = bytes.len() - 1;
        for b in &mut bytes[..last] {
            *b |= 0x80;
        }
        bytes
    }

    #[test]
    fn test_decode_table_leaf_cell_no_overflow() {
        let payload = b"hello world";
        let mut page = vec![0u8; 4096];
        let cell_bytes = build_table_leaf_cell(42, payload);
        page[100..100 + cell_bytes.len()].copy_from_slice(&cell_bytes);
        let cell = decode_cell(&page, 100, PageType::TableLeaf, 4096).unwrap();
        match cell {
            Cell::TableLeaf {
                rowid,
                payload_size,
                local,
                ..
            } => {
                assert_eq!(rowid, 42);
                assert_eq!(payload_size, payload.len() as u64);
                assert_eq!(local.local_bytes, payload.len());
                assert_eq!(local.overflow_page, None);
            }
            _ => panic!("wrong cell variant"),
        }
    }

    #[test]
    fn test_decode_table_interior_cell() {
        let mut page = vec![0u8; 4096];
        page[0..4].copy_from_slice(&99u32.to_be_bytes());
        page[4] = 7; // varint rowid = 7
        let cell = decode_cell(&page, 0, PageType::TableInterior, 4096).unwrap();
        match cell {
            Cell::TableInterior { left_child, rowid } => {
                assert_eq!(left_child, 99);
                assert_eq!(rowid, 7);
            }
            _ => panic!("wrong cell variant"),
        }
    }
}
