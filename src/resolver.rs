//! resolves column names in a parsed `SELECT` against a table's declared
//! column order, stamping each [`Expr::Column`]'s `resolved` cell with the
//! ordinal position [`crate::plan`]'s operators index into.
//!
//! One column gets special treatment: if the table declares a column
//! literally named `id`, that column is treated as an alias for the
//! table's rowid (mirroring how `INTEGER PRIMARY KEY` columns store no
//! value of their own on disk — the true value lives in the cell's rowid
//! field). This is a narrow, name-based heuristic rather than parsing
//! `INTEGER PRIMARY KEY` out of the column definition; it gets the common
//! case right without widening the `CREATE TABLE` grammar.

use crate::ast::{Expr, SelectStatement};
use crate::plan::ColumnRef;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no such column: {0:?}")]
    UnknownColumn(String),
    #[error("SELECT list mixes count(*) with other columns")]
    MixedAggregateSelectList,
    #[error("{0}(...) is not a recognized aggregate function")]
    UnknownFunction(String),
}

pub type Result<T> = core::result::Result<T, Error>;

/// Sentinel stashed in an `Expr::Column`'s `resolved` cell to mark it as
/// the rowid alias rather than an ordinal into the row's value list.
pub const ROWID_SENTINEL: usize = usize::MAX;

pub fn column_ref(resolved: usize) -> ColumnRef {
    if resolved == ROWID_SENTINEL {
        ColumnRef::Rowid
    } else {
        ColumnRef::Ordinal(resolved)
    }
}

pub struct ResolvedQuery {
    pub is_count_aggregate: bool,
    pub projection: Vec<ColumnRef>,
}

struct Columns<'a> {
    names: &'a [String],
    rowid_alias: Option<usize>,
}

impl<'a> Columns<'a> {
    fn new(names: &'a [String]) -> Columns<'a> {
        let rowid_alias = names.iter().position(|n| n == "id");
        Columns { names, rowid_alias }
    }

    fn lookup(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn column_ref_for(&self, ordinal: usize) -> ColumnRef {
        if self.rowid_alias == Some(ordinal) {
            ColumnRef::Rowid
        } else {
            ColumnRef::Ordinal(ordinal)
        }
    }

    fn resolved_value_for(&self, ordinal: usize) -> usize {
        if self.rowid_alias == Some(ordinal) {
            ROWID_SENTINEL
        } else {
            ordinal
        }
    }
}

fn stamp(columns: &Columns<'_>, expr: &Expr) -> Result<()> {
    match expr {
        Expr::Column { name, resolved } => {
            let ordinal = columns.lookup(name).ok_or_else(|| Error::UnknownColumn(name.clone()))?;
            resolved.set(Some(columns.resolved_value_for(ordinal)));
            Ok(())
        }
        Expr::Binary { lhs, rhs, .. } => {
            stamp(columns, lhs)?;
            stamp(columns, rhs)
        }
        Expr::Function { name, args } => {
            if !name.eq_ignore_ascii_case("count") {
                return Err(Error::UnknownFunction(name.clone()));
            }
            for a in args {
                stamp(columns, a)?;
            }
            Ok(())
        }
        Expr::Star | Expr::IntLiteral(_) | Expr::StringLiteral(_) => Ok(()),
    }
}

/// Resolves `select` against `table_columns` (the declared column order
/// from the table's `CREATE TABLE` statement), stamping every column
/// reference in both the select list and the `WHERE` list.
pub fn resolve(select: &SelectStatement, table_columns: &[String]) -> Result<ResolvedQuery> {
    let columns = Columns::new(table_columns);

    for expr in &select.where_list {
        stamp(&columns, expr)?;
    }

    let is_count_aggregate = select.select_list.len() == 1 && select.select_list[0].is_count_aggregate();
    if !is_count_aggregate && select.select_list.iter().any(|e| e.is_count_aggregate()) {
        return Err(Error::MixedAggregateSelectList);
    }

    let projection = if is_count_aggregate {
        // The aggregate operator always emits its single count value as
        // ordinal 0 of its output row; the projection after it just
        // passes that through.
        vec![ColumnRef::Ordinal(0)]
    } else {
        let mut out = vec![];
        for expr in &select.select_list {
            match expr {
                Expr::Star => {
                    for i in 0..columns.names.len() {
                        out.push(columns.column_ref_for(i));
                    }
                }
                Expr::Column { name, resolved } => {
                    let ordinal = columns.lookup(name).ok_or_else(|| Error::UnknownColumn(name.clone()))?;
                    resolved.set(Some(columns.resolved_value_for(ordinal)));
                    out.push(columns.column_ref_for(ordinal));
                }
                other => stamp(&columns, other).map(|_| ())?,
            }
        }
        out
    };

    Ok(ResolvedQuery {
        is_count_aggregate,
        projection,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::CmpOp;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_star_expands_all_columns_in_order() {
        let select = SelectStatement {
            select_list: vec![Expr::Star],
            from_table: "t".to_string(),
            where_list: vec![],
        };
        let resolved = resolve(&select, &cols(&["id", "name", "color"])).unwrap();
        assert_eq!(resolved.projection.len(), 3);
        assert!(matches!(resolved.projection[0], ColumnRef::Rowid));
        assert!(matches!(resolved.projection[1], ColumnRef::Ordinal(1)));
        assert!(matches!(resolved.projection[2], ColumnRef::Ordinal(2)));
    }

    #[test]
    fn test_resolve_plain_column_list() {
        let select = SelectStatement {
            select_list: vec![Expr::column("color"), Expr::column("name")],
            from_table: "t".to_string(),
            where_list: vec![],
        };
        let resolved = resolve(&select, &cols(&["id", "name", "color"])).unwrap();
        assert!(matches!(resolved.projection[0], ColumnRef::Ordinal(2)));
        assert!(matches!(resolved.projection[1], ColumnRef::Ordinal(1)));
    }

    #[test]
    fn test_resolve_count_star_is_a_single_aggregate_column() {
        let select = SelectStatement {
            select_list: vec![Expr::Function {
                name: "count".to_string(),
                args: vec![Expr::Star],
            }],
            from_table: "t".to_string(),
            where_list: vec![],
        };
        let resolved = resolve(&select, &cols(&["id", "name"])).unwrap();
        assert!(resolved.is_count_aggregate);
        assert_eq!(resolved.projection.len(), 1);
    }

    #[test]
    fn test_resolve_unknown_column_is_an_error() {
        let select = SelectStatement {
            select_list: vec![Expr::column("bogus")],
            from_table: "t".to_string(),
            where_list: vec![],
        };
        assert!(matches!(resolve(&select, &cols(&["id"])), Err(Error::UnknownColumn(_))));
    }

    #[test]
    fn test_resolve_stamps_where_predicate_columns() {
        let select = SelectStatement {
            select_list: vec![Expr::Star],
            from_table: "t".to_string(),
            where_list: vec![Expr::Binary {
                op: CmpOp::Eq,
                lhs: Box::new(Expr::column("color")),
                rhs: Box::new(Expr::StringLiteral("red".to_string())),
            }],
        };
        let resolved = resolve(&select, &cols(&["id", "color"])).unwrap();
        assert_eq!(resolved.projection.len(), 2);
        match &select.where_list[0] {
            Expr::Binary { lhs, .. } => match lhs.as_ref() {
                Expr::Column { resolved, .. } => assert_eq!(resolved.get(), Some(1)),
                _ => panic!("expected column"),
            },
            _ => panic!("expected binary"),
        }
    }

    #[test]
    fn test_resolve_where_on_rowid_alias_uses_sentinel() {
        let select = SelectStatement {
            select_list: vec![Expr::Star],
            from_table: "t".to_string(),
            where_list: vec![Expr::Binary {
                op: CmpOp::Eq,
                lhs: Box::new(Expr::column("id")),
                rhs: Box::new(Expr::IntLiteral(5)),
            }],
        };
        resolve(&select, &cols(&["id", "color"])).unwrap();
        match &select.where_list[0] {
            Expr::Binary { lhs, .. } => match lhs.as_ref() {
                Expr::Column { resolved, .. } => assert_eq!(resolved.get(), Some(ROWID_SENTINEL)),
                _ => panic!("expected column"),
            },
            _ => panic!("expected binary"),
        }
    }
}
