//! crate-wide error type gluing together each layer's own error enum.
//!
//! Internal modules return their own `thiserror` enums so tests can match on
//! specific kinds; `driver` collects everything into this enum via `?` and
//! prints `Display` text to stderr.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("bytes: {0}")]
    Bytes(#[from] crate::bytes::Error),
    #[error("pager: {0}")]
    Pager(#[from] crate::pager::Error),
    #[error("btree: {0}")]
    Btree(#[from] crate::btree::Error),
    #[error("record: {0}")]
    Record(#[from] crate::record::Error),
    #[error("schema: {0}")]
    Schema(#[from] crate::schema::Error),
    #[error("parser: {0}")]
    Parser(#[from] crate::parser::Error),
    #[error("{0}")]
    PtToAst(#[from] crate::pt_to_ast::Error),
    #[error("index_select: {0}")]
    IndexSelect(#[from] crate::index_select::Error),
    #[error("walker: {0}")]
    Walker(#[from] crate::walker::Error),
    #[error("plan: {0}")]
    Plan(#[from] crate::plan::Error),
    #[error("resolver: {0}")]
    Resolver(#[from] crate::resolver::Error),
    #[error("usage: {0} <database-file> <.dbinfo|.tables|SQL statement>")]
    Usage(String),
    #[error("only SELECT statements can be run as queries")]
    NotASelect,
}

pub type Result<T> = core::result::Result<T, Error>;
