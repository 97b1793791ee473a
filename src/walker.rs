//! the tree walker: drives a table B-tree (and, when an index was chosen,
//! an index B-tree) to produce rows in order.
//!
//! Two independent cursors compose here. The *table* cursor always exists
//! and either enumerates every leaf cell left-to-right (full scan) or
//! performs one point lookup by rowid per call (index-driven). The *index*
//! cursor, present only when [`crate::index_select`] chose an index, is a
//! stack of page frames mirroring the path from the index root to the
//! current leaf — the same shape the table cursor's full-scan stack uses,
//! generalized to index pages and predicate-driven descent.

use crate::ast::CmpOp;
use crate::btree::cell::Cell as BtreeCell;
use crate::btree::header::{read_cell_pointers, read_header, Header};
use crate::btree::{self, PageType};
use crate::pager::Pager;
use crate::record;
use crate::value::{self, Value};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Pager(#[from] crate::pager::Error),
    #[error("{0}")]
    Btree(#[from] btree::Error),
    #[error("{0}")]
    Record(#[from] record::Error),
    #[error("non-integer rowid in table B-tree")]
    NonIntegerRowid,
    #[error("index record has fewer columns than expected")]
    ShortIndexRecord,
}

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone)]
pub struct Row {
    pub rowid: i64,
    pub values: Vec<Value>,
}

/// one loaded page plus decode state shared by the table and index
/// walkers: the header, its cell-pointer array, and how far we've
/// progressed through those pointers.
struct Frame {
    page_type: PageType,
    page: Vec<u8>,
    pointers: Vec<u16>,
    idx: usize,
    rightmost_pointer: Option<u32>,
    /// true once the interior page's right-most child has been descended
    /// (always true for leaf pages, which have none).
    rightmost_done: bool,
}

fn load_frame(pager: &Pager, page_num: u32) -> Result<Frame> {
    let pin = pager.get_page(page_num)?;
    let page = pin.bytes().to_vec();
    let offset = if page_num == 1 { 100 } else { 0 };
    let header: Header = read_header(&page, offset)?;
    let pointers = read_cell_pointers(&page, &header)?;
    Ok(Frame {
        page_type: header.page_type,
        page,
        pointers,
        idx: 0,
        rightmost_pointer: header.rightmost_pointer,
        rightmost_done: header.rightmost_pointer.is_none(),
    })
}

fn decode_row_from_payload(
    pager: &Pager,
    page: &[u8],
    payload_offset: usize,
    payload_size: u64,
    local: crate::btree::cell::LocalInfo,
) -> Result<Vec<Value>> {
    let payload = record::assemble_payload(pager, page, payload_offset, payload_size, local)?;
    let decoded = record::decode_record(&payload)?;
    Ok(record::decode_values(&decoded)?)
}

// ---------------------------------------------------------------------
// Table cursor: full scan
// ---------------------------------------------------------------------

/// Enumerates every row of a table B-tree in ascending rowid order by
/// descending leftmost first and resuming at each interior page's next
/// child (or right-most pointer) once a subtree is exhausted.
pub struct TableScanCursor<'p> {
    pager: &'p Pager,
    stack: Vec<Frame>,
}

impl<'p> TableScanCursor<'p> {
    pub fn new(pager: &'p Pager, root_page: u32) -> Result<TableScanCursor<'p>> {
        let mut cursor = TableScanCursor {
            pager,
            stack: vec![],
        };
        cursor.push_leftmost(root_page)?;
        Ok(cursor)
    }

    fn push_leftmost(&mut self, mut page_num: u32) -> Result<()> {
        loop {
            let frame = load_frame(self.pager, page_num)?;
            let is_interior = !frame.page_type.is_leaf();
            let first_child = if is_interior {
                frame.pointers.first().copied()
            } else {
                None
            };
            self.stack.push(frame);
            match first_child {
                Some(offset) => {
                    let top = self.stack.last_mut().expect("just pushed");
                    let cell = crate::btree::cell::decode_cell(
                        &top.page,
                        offset as usize,
                        top.page_type,
                        self.pager.usable_size(),
                    )?;
                    match cell {
                        BtreeCell::TableInterior { left_child, .. } => {
                            top.idx = 1;
                            page_num = left_child;
                        }
                        _ => unreachable!("table interior page only holds TableInterior cells"),
                    }
                }
                None => return Ok(()),
            }
        }
    }

    pub fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            let Some(top) = self.stack.last_mut() else {
                return Ok(None);
            };
            if top.page_type.is_leaf() {
                if top.idx >= top.pointers.len() {
                    self.stack.pop();
                    continue;
                }
                let offset = top.pointers[top.idx];
                top.idx += 1;
                let page = top.page.clone();
                let cell = crate::btree::cell::decode_cell(
                    &page,
                    offset as usize,
                    PageType::TableLeaf,
                    self.pager.usable_size(),
                )?;
                let BtreeCell::TableLeaf {
                    rowid,
                    payload_size,
                    payload_offset,
                    local,
                } = cell
                else {
                    unreachable!("table leaf page only holds TableLeaf cells")
                };
                let values = decode_row_from_payload(self.pager, &page, payload_offset, payload_size, local)?;
                return Ok(Some(Row { rowid, values }));
            }

            // Interior frame: advance to the next child, or the
            // right-most pointer, or pop if both are exhausted.
            if top.idx < top.pointers.len() {
                let offset = top.pointers[top.idx];
                top.idx += 1;
                let cell = crate::btree::cell::decode_cell(
                    &top.page,
                    offset as usize,
                    PageType::TableInterior,
                    self.pager.usable_size(),
                )?;
                let BtreeCell::TableInterior { left_child, .. } = cell else {
                    unreachable!("table interior page only holds TableInterior cells")
                };
                self.push_leftmost(left_child)?;
                continue;
            }
            if !top.rightmost_done {
                top.rightmost_done = true;
                let rightmost = top.rightmost_pointer.expect("interior page always has one");
                self.push_leftmost(rightmost)?;
                continue;
            }
            self.stack.pop();
        }
    }
}

/// Performs one point lookup of `target` by descending the table B-tree
/// from `root_page`, per §4.8.2's binary-search-per-level algorithm. Does
/// not retain any cursor state between calls — each call is a fresh
/// descent, matching how the index cursor and table cursor compose (the
/// index cursor drives rowids; the table cursor looks each one up).
pub fn seek_rowid(pager: &Pager, root_page: u32, target: i64) -> Result<Option<Row>> {
    let mut page_num = root_page;
    loop {
        let frame = load_frame(pager, page_num)?;
        match frame.page_type {
            PageType::TableLeaf => {
                let mut lo = 0usize;
                let mut hi = frame.pointers.len();
                while lo < hi {
                    let mid = lo + (hi - lo) / 2;
                    let cell = crate::btree::cell::decode_cell(
                        &frame.page,
                        frame.pointers[mid] as usize,
                        PageType::TableLeaf,
                        pager.usable_size(),
                    )?;
                    let BtreeCell::TableLeaf { rowid, .. } = cell else {
                        unreachable!()
                    };
                    if rowid < target {
                        lo = mid + 1;
                    } else {
                        hi = mid;
                    }
                }
                if lo >= frame.pointers.len() {
                    return Ok(None);
                }
                let cell = crate::btree::cell::decode_cell(
                    &frame.page,
                    frame.pointers[lo] as usize,
                    PageType::TableLeaf,
                    pager.usable_size(),
                )?;
                let BtreeCell::TableLeaf {
                    rowid,
                    payload_size,
                    payload_offset,
                    local,
                } = cell
                else {
                    unreachable!()
                };
                if rowid != target {
                    return Ok(None);
                }
                let values = decode_row_from_payload(pager, &frame.page, payload_offset, payload_size, local)?;
                return Ok(Some(Row { rowid, values }));
            }
            PageType::TableInterior => {
                let mut lo = 0usize;
                let mut hi = frame.pointers.len();
                while lo < hi {
                    let mid = lo + (hi - lo) / 2;
                    let cell = crate::btree::cell::decode_cell(
                        &frame.page,
                        frame.pointers[mid] as usize,
                        PageType::TableInterior,
                        pager.usable_size(),
                    )?;
                    let BtreeCell::TableInterior { rowid, .. } = cell else {
                        unreachable!()
                    };
                    if rowid < target {
                        lo = mid + 1;
                    } else {
                        hi = mid;
                    }
                }
                if lo >= frame.pointers.len() {
                    page_num = frame.rightmost_pointer.expect("interior page always has one");
                } else {
                    let cell = crate::btree::cell::decode_cell(
                        &frame.page,
                        frame.pointers[lo] as usize,
                        PageType::TableInterior,
                        pager.usable_size(),
                    )?;
                    let BtreeCell::TableInterior { left_child, .. } = cell else {
                        unreachable!()
                    };
                    page_num = left_child;
                }
                continue;
            }
            _ => unreachable!("table B-tree only contains table page types"),
        }
    }
}

// ---------------------------------------------------------------------
// Index cursor: predicate-driven rowid production
// ---------------------------------------------------------------------

/// Compares an index key's leading column against the probe value for
/// `op`'s three possible outcomes: emit this row, skip it and keep
/// scanning forward, or stop the whole cursor (nothing further in
/// ascending key order can match).
enum Decision {
    Emit,
    Skip,
    Stop,
}

fn decide(op: CmpOp, key: &Value, probe: &Value) -> Decision {
    match op {
        CmpOp::Eq => {
            if value::compare(key, CmpOp::Lt, probe) {
                Decision::Skip
            } else if value::compare(key, CmpOp::Eq, probe) {
                Decision::Emit
            } else {
                Decision::Stop
            }
        }
        CmpOp::Lt => {
            if value::compare(key, CmpOp::Lt, probe) {
                Decision::Emit
            } else {
                Decision::Stop
            }
        }
        CmpOp::Gt => {
            if value::compare(key, CmpOp::Gt, probe) {
                Decision::Emit
            } else {
                Decision::Skip
            }
        }
    }
}

/// true if a candidate match could lie at or past this key in ascending
/// key order: the canonical lower-bound predicate each binary search in
/// `push_start`/`leaf_lower_bound` narrows on. `=` and `<` look for the
/// first key that is `>= probe`; `>` looks for the first key that is
/// `> probe` outright, since a key equal to the probe never satisfies `>`.
fn is_candidate(op: CmpOp, key: &Value, probe: &Value) -> bool {
    match op {
        CmpOp::Eq => !value::compare(key, CmpOp::Lt, probe),
        CmpOp::Lt => true,
        CmpOp::Gt => value::compare(key, CmpOp::Gt, probe),
    }
}

fn index_cell_key_and_rowid(
    pager: &Pager,
    page: &[u8],
    offset: usize,
    page_type: PageType,
) -> Result<(Value, i64, u64, usize, crate::btree::cell::LocalInfo)> {
    let cell = crate::btree::cell::decode_cell(page, offset, page_type, pager.usable_size())?;
    let (payload_size, payload_offset, local) = match cell {
        BtreeCell::IndexLeaf {
            payload_size,
            payload_offset,
            local,
        } => (payload_size, payload_offset, local),
        BtreeCell::IndexInterior {
            payload_size,
            payload_offset,
            local,
            ..
        } => (payload_size, payload_offset, local),
        _ => unreachable!("index page only holds index cells"),
    };
    let values = decode_row_from_payload(pager, page, payload_offset, payload_size, local)?;
    if values.is_empty() {
        return Err(Error::ShortIndexRecord);
    }
    let rowid = match values.last().expect("checked non-empty") {
        Value::Int(i) => *i,
        _ => return Err(Error::NonIntegerRowid),
    };
    Ok((values[0].clone(), rowid, payload_size, payload_offset, local))
}

/// An index-driven rowid producer: a stack of [`Frame`]s mirroring the
/// path from the index root to the current leaf, positioned by an initial
/// predicate-guided descent and advanced left-to-right thereafter.
pub struct IndexScanCursor<'p> {
    pager: &'p Pager,
    stack: Vec<Frame>,
    op: CmpOp,
    probe: Value,
    stopped: bool,
}

impl<'p> IndexScanCursor<'p> {
    pub fn new(pager: &'p Pager, root_page: u32, op: CmpOp, probe: Value) -> Result<IndexScanCursor<'p>> {
        let mut cursor = IndexScanCursor {
            pager,
            stack: vec![],
            op,
            probe,
            stopped: false,
        };
        cursor.push_start(root_page)?;
        Ok(cursor)
    }

    /// descends from `page_num`, at each interior level choosing the
    /// first child that could contain a qualifying key (canonical
    /// lower-bound binary search — not the off-by-one-prone `lo < hi`
    /// variant some implementations of this algorithm use).
    fn push_start(&mut self, mut page_num: u32) -> Result<()> {
        loop {
            let frame = load_frame(self.pager, page_num)?;
            if frame.page_type.is_leaf() {
                let start = self.leaf_lower_bound(&frame)?;
                let mut frame = frame;
                frame.idx = start;
                self.stack.push(frame);
                return Ok(());
            }

            let mut lo = 0usize;
            let mut hi = frame.pointers.len();
            while lo < hi {
                let mid = lo + (hi - lo) / 2;
                let (key, ..) =
                    index_cell_key_and_rowid(self.pager, &frame.page, frame.pointers[mid] as usize, frame.page_type)?;
                if is_candidate(self.op, &key, &self.probe) {
                    hi = mid;
                } else {
                    lo = mid + 1;
                }
            }

            let mut frame = frame;
            if lo >= frame.pointers.len() {
                frame.idx = frame.pointers.len();
                let next = Self::descend_target(self.pager, &frame, frame.pointers.len())?;
                self.stack.push(frame);
                page_num = next;
            } else {
                let offset = frame.pointers[lo];
                frame.idx = lo + 1;
                let cell = crate::btree::cell::decode_cell(
                    &frame.page,
                    offset as usize,
                    frame.page_type,
                    self.pager.usable_size(),
                )?;
                let BtreeCell::IndexInterior { left_child, .. } = cell else {
                    unreachable!()
                };
                self.stack.push(frame);
                page_num = left_child;
            }
        }
    }

    fn descend_target(pager: &Pager, frame: &Frame, cell_slot: usize) -> Result<u32> {
        if cell_slot < frame.pointers.len() {
            let cell = crate::btree::cell::decode_cell(
                &frame.page,
                frame.pointers[cell_slot] as usize,
                frame.page_type,
                pager.usable_size(),
            )?;
            let BtreeCell::IndexInterior { left_child, .. } = cell else {
                unreachable!()
            };
            Ok(left_child)
        } else {
            Ok(frame.rightmost_pointer.expect("interior page always has one"))
        }
    }

    fn leaf_lower_bound(&self, frame: &Frame) -> Result<usize> {
        let mut lo = 0usize;
        let mut hi = frame.pointers.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let (key, ..) =
                index_cell_key_and_rowid(self.pager, &frame.page, frame.pointers[mid] as usize, frame.page_type)?;
            if is_candidate(self.op, &key, &self.probe) {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        Ok(lo)
    }

    pub fn next_rowid(&mut self) -> Result<Option<i64>> {
        if self.stopped {
            return Ok(None);
        }
        loop {
            let Some(top) = self.stack.last_mut() else {
                return Ok(None);
            };
            if top.page_type.is_leaf() {
                if top.idx >= top.pointers.len() {
                    self.stack.pop();
                    continue;
                }
                let offset = top.pointers[top.idx];
                let page = top.page.clone();
                let page_type = top.page_type;
                let (key, rowid, ..) = index_cell_key_and_rowid(self.pager, &page, offset as usize, page_type)?;
                match decide(self.op, &key, &self.probe) {
                    Decision::Emit => {
                        let top = self.stack.last_mut().expect("checked above");
                        top.idx += 1;
                        return Ok(Some(rowid));
                    }
                    Decision::Skip => {
                        let top = self.stack.last_mut().expect("checked above");
                        top.idx += 1;
                        continue;
                    }
                    Decision::Stop => {
                        self.stack.clear();
                        self.stopped = true;
                        return Ok(None);
                    }
                }
            }

            // Interior: move to the next sibling subtree, descending
            // leftmost within it to find its next qualifying leaf.
            if top.idx < top.pointers.len() || !top.rightmost_done {
                let cell_slot = top.idx;
                let next_page = if cell_slot < top.pointers.len() {
                    top.idx += 1;
                    Self::descend_target(self.pager, top, cell_slot)?
                } else {
                    top.rightmost_done = true;
                    Self::descend_target(self.pager, top, top.pointers.len())?
                };
                self.push_leftmost_index_leaf(next_page)?;
                continue;
            }
            self.stack.pop();
        }
    }

    fn push_leftmost_index_leaf(&mut self, mut page_num: u32) -> Result<()> {
        loop {
            let frame = load_frame(self.pager, page_num)?;
            if frame.page_type.is_leaf() {
                self.stack.push(frame);
                return Ok(());
            }
            let first = frame.pointers.first().copied();
            match first {
                Some(offset) => {
                    let cell = crate::btree::cell::decode_cell(
                        &frame.page,
                        offset as usize,
                        frame.page_type,
                        self.pager.usable_size(),
                    )?;
                    let BtreeCell::IndexInterior { left_child, .. } = cell else {
                        unreachable!()
                    };
                    let mut frame = frame;
                    frame.idx = 1;
                    self.stack.push(frame);
                    page_num = left_child;
                }
                None => {
                    // Degenerate interior page with no cells: still has a
                    // right-most child per the format, so descend into it.
                    let rightmost = frame.rightmost_pointer.expect("interior page always has one");
                    let mut frame = frame;
                    frame.idx = 0;
                    frame.rightmost_done = true;
                    self.stack.push(frame);
                    page_num = rightmost;
                }
            }
        }
    }
}
