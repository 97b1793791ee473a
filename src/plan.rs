//! the pull-model physical plan: each operator pulls one row at a time
//! from the one beneath it, mirroring [`streaming_iterator::StreamingIterator`]'s
//! `advance`/`get` split rather than returning owned rows from `next`.
//!
//! `TableScan` sits at the bottom, either walking every row of a table or
//! driving an [`crate::walker::IndexScanCursor`] and looking each rowid up.
//! `Filter` re-checks the full `WHERE` conjunction (including whatever
//! columns the chosen index didn't cover). `Aggregate` collapses its input
//! to a single `count(*)` row. `Projection` narrows to the `SELECT` list.

use crate::ast::{CmpOp, Expr};
use crate::pager::Pager;
use crate::value::{self, Value};
use crate::walker::{self, IndexScanCursor, Row, TableScanCursor};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Walker(#[from] walker::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

/// Where a column's value comes from once resolved: a row's rowid, or an
/// ordinal position in its value list. Shared by [`ResolvedPredicate`] and
/// [`Projection`] since both need to handle the `id`-aliases-rowid
/// heuristic [`crate::resolver`] applies the same way.
#[derive(Debug, Clone, Copy)]
pub enum ColumnRef {
    Rowid,
    Ordinal(usize),
}

fn read_column<'r>(row: &'r Row, col: &ColumnRef) -> Value {
    match col {
        ColumnRef::Rowid => Value::Int(row.rowid),
        ColumnRef::Ordinal(i) => row.values.get(*i).cloned().unwrap_or(Value::Null),
    }
}

/// A resolved `WHERE` predicate: where the compared column's value comes
/// from, the operator, and the literal it's compared against.
#[derive(Debug, Clone)]
pub struct ResolvedPredicate {
    pub source: ColumnRef,
    pub op: CmpOp,
    pub literal: Value,
}

/// An operator in the physical plan. Like `StreamingIterator`, callers must
/// call `advance` before the first `get`, and `get` after `advance` returns
/// `Ok(true)` borrows from the operator rather than handing back an owned
/// value — there is exactly one live row per operator at a time.
pub trait Operator {
    fn advance(&mut self) -> Result<bool>;
    fn get(&self) -> Option<&Row>;
}

/// Scans a table, either row by row (no usable index) or by driving an
/// index cursor and looking up each rowid it produces.
pub enum TableScan<'p> {
    Full {
        cursor: TableScanCursor<'p>,
        current: Option<Row>,
    },
    Indexed {
        pager: &'p Pager,
        table_root: u32,
        index_cursor: IndexScanCursor<'p>,
        current: Option<Row>,
    },
}

impl<'p> TableScan<'p> {
    pub fn full(pager: &'p Pager, table_root: u32) -> Result<TableScan<'p>> {
        Ok(TableScan::Full {
            cursor: TableScanCursor::new(pager, table_root)?,
            current: None,
        })
    }

    pub fn indexed(
        pager: &'p Pager,
        table_root: u32,
        index_root: u32,
        op: CmpOp,
        probe: Value,
    ) -> Result<TableScan<'p>> {
        Ok(TableScan::Indexed {
            pager,
            table_root,
            index_cursor: IndexScanCursor::new(pager, index_root, op, probe)?,
            current: None,
        })
    }
}

impl<'p> Operator for TableScan<'p> {
    fn advance(&mut self) -> Result<bool> {
        match self {
            TableScan::Full { cursor, current } => {
                *current = cursor.next_row()?;
                Ok(current.is_some())
            }
            TableScan::Indexed {
                pager,
                table_root,
                index_cursor,
                current,
            } => loop {
                let Some(rowid) = index_cursor.next_rowid()? else {
                    *current = None;
                    return Ok(false);
                };
                if let Some(row) = walker::seek_rowid(pager, *table_root, rowid)? {
                    *current = Some(row);
                    return Ok(true);
                }
                // The index referenced a rowid the table no longer has;
                // keep pulling from the index cursor rather than surfacing
                // a gap to the caller.
            },
        }
    }

    fn get(&self) -> Option<&Row> {
        match self {
            TableScan::Full { current, .. } => current.as_ref(),
            TableScan::Indexed { current, .. } => current.as_ref(),
        }
    }
}

/// Re-evaluates a conjunction of resolved predicates against each row from
/// its input, skipping rows that fail any of them.
pub struct Filter<O: Operator> {
    input: O,
    predicates: Vec<ResolvedPredicate>,
}

impl<O: Operator> Filter<O> {
    pub fn new(input: O, predicates: Vec<ResolvedPredicate>) -> Filter<O> {
        Filter { input, predicates }
    }

    fn row_matches(&self, row: &Row) -> bool {
        self.predicates
            .iter()
            .all(|p| value::compare(&read_column(row, &p.source), p.op, &p.literal))
    }
}

impl<O: Operator> Operator for Filter<O> {
    fn advance(&mut self) -> Result<bool> {
        loop {
            if !self.input.advance()? {
                return Ok(false);
            }
            // `row_matches` needs the row but `get()` borrows `self.input`
            // immutably, which is fine here since `advance` already
            // returned before we look at it.
            let matches = match self.input.get() {
                Some(row) => self.row_matches(row),
                None => false,
            };
            if matches {
                return Ok(true);
            }
        }
    }

    fn get(&self) -> Option<&Row> {
        self.input.get()
    }
}

/// Collapses its input to exactly one row holding the `count(*)` of rows
/// seen — the only aggregate this crate supports.
pub struct CountAggregate<O: Operator> {
    input: O,
    emitted: bool,
    result: Option<Row>,
}

impl<O: Operator> CountAggregate<O> {
    pub fn new(input: O) -> CountAggregate<O> {
        CountAggregate {
            input,
            emitted: false,
            result: None,
        }
    }
}

impl<O: Operator> Operator for CountAggregate<O> {
    fn advance(&mut self) -> Result<bool> {
        if self.emitted {
            self.result = None;
            return Ok(false);
        }
        let mut count = 0i64;
        while self.input.advance()? {
            count += 1;
        }
        self.emitted = true;
        self.result = Some(Row {
            rowid: 0,
            values: vec![Value::Int(count)],
        });
        Ok(true)
    }

    fn get(&self) -> Option<&Row> {
        self.result.as_ref()
    }
}

/// Narrows each upstream row down to the `SELECT` list's resolved columns.
pub struct Projection<O: Operator> {
    input: O,
    columns: Vec<ColumnRef>,
    current: Option<Row>,
}

impl<O: Operator> Projection<O> {
    pub fn new(input: O, columns: Vec<ColumnRef>) -> Projection<O> {
        Projection {
            input,
            columns,
            current: None,
        }
    }
}

impl<O: Operator> Operator for Projection<O> {
    fn advance(&mut self) -> Result<bool> {
        if !self.input.advance()? {
            self.current = None;
            return Ok(false);
        }
        let row = self.input.get().expect("advance returned true");
        let values = self.columns.iter().map(|c| read_column(row, c)).collect();
        self.current = Some(Row {
            rowid: row.rowid,
            values,
        });
        Ok(true)
    }

    fn get(&self) -> Option<&Row> {
        self.current.as_ref()
    }
}

/// Builds the resolved-predicate list a [`Filter`] needs from a `WHERE`
/// conjunction already stamped by [`crate::resolver`].
pub fn resolve_predicates(where_list: &[Expr]) -> Vec<ResolvedPredicate> {
    where_list
        .iter()
        .filter_map(|e| match e {
            Expr::Binary { op, lhs, rhs } => {
                let (column, literal) = match (lhs.as_ref(), rhs.as_ref()) {
                    (Expr::Column { resolved, .. }, other) => (resolved.get(), literal_value(other)?),
                    (other, Expr::Column { resolved, .. }) => (resolved.get(), literal_value(other)?),
                    _ => return None,
                };
                column.map(|ordinal| ResolvedPredicate {
                    source: crate::resolver::column_ref(ordinal),
                    op: *op,
                    literal,
                })
            }
            _ => None,
        })
        .collect()
}

fn literal_value(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::IntLiteral(i) => Some(Value::Int(*i)),
        Expr::StringLiteral(s) => Some(Value::Text(s.clone().into_bytes())),
        _ => None,
    }
}
