//! the parse result the rest of the pipeline consumes: a `SELECT`, a
//! `CREATE TABLE`, or a `CREATE INDEX` statement.
//!
//! `Expr::Column` carries a `resolved` cell the resolver stamps with the
//! column's ordinal position once it knows which row shape (pre- or
//! post-aggregate) the expression is evaluated against.

use std::cell::Cell;

pub use crate::value::CmpOp;

#[derive(Debug, Clone)]
pub enum Expr {
    Star,
    IntLiteral(i64),
    StringLiteral(String),
    Column {
        name: String,
        resolved: Cell<Option<usize>>,
    },
    Function {
        name: String,
        args: Vec<Expr>,
    },
    Binary {
        op: CmpOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Expr {
        Expr::Column {
            name: name.into(),
            resolved: Cell::new(None),
        }
    }

    /// true if this is `count(...)`  — the only recognized aggregate.
    pub fn is_count_aggregate(&self) -> bool {
        matches!(self, Expr::Function { name, .. } if name.eq_ignore_ascii_case("count"))
    }
}

#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct CreateTableStatement {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Clone)]
pub struct CreateIndexStatement {
    pub index_name: String,
    pub table_name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SelectStatement {
    pub select_list: Vec<Expr>,
    pub from_table: String,
    pub where_list: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub enum Statement {
    Select(SelectStatement),
    CreateTable(CreateTableStatement),
    CreateIndex(CreateIndexStatement),
}
