//! decoders for B-tree page headers and cells.
//!
//! A page is either a table or index B-tree page, and either a leaf or an
//! interior node; the four combinations share a common on-page layout
//! (header, then a cell-pointer array, then cell content growing down from
//! the top of the page) but decode their cells differently.

pub mod cell;
pub mod header;

pub type RowId = i64;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unrecognized B-tree page type tag {0:#04x}")]
    BadPageType(u8),
    #[error("{0}")]
    Bytes(#[from] crate::bytes::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    IndexInterior,
    TableInterior,
    IndexLeaf,
    TableLeaf,
}

impl PageType {
    pub fn from_tag(tag: u8) -> Result<PageType> {
        match tag {
            0x02 => Ok(PageType::IndexInterior),
            0x05 => Ok(PageType::TableInterior),
            0x0a => Ok(PageType::IndexLeaf),
            0x0d => Ok(PageType::TableLeaf),
            other => Err(Error::BadPageType(other)),
        }
    }

    pub fn is_leaf(self) -> bool {
        matches!(self, PageType::IndexLeaf | PageType::TableLeaf)
    }

    pub fn is_table(self) -> bool {
        matches!(self, PageType::TableInterior | PageType::TableLeaf)
    }
}
