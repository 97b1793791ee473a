//! picks the best usable index for a `WHERE` conjunction: the index whose
//! declared column list has the longest predicate-covering prefix.

use std::collections::HashSet;

use crate::ast::Expr;
use crate::schema::IndexDef;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("WHERE predicate does not reference a plain column on one side")]
    PredicateHasNoColumn,
}

pub type Result<T> = core::result::Result<T, Error>;

/// A binary predicate from the `WHERE` list, decomposed for index matching.
#[derive(Debug, Clone)]
pub struct Predicate<'a> {
    pub column: String,
    pub expr: &'a Expr,
}

fn column_of(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Binary { lhs, rhs, .. } => match (lhs.as_ref(), rhs.as_ref()) {
            (Expr::Column { name, .. }, _) => Some(name.as_str()),
            (_, Expr::Column { name, .. }) => Some(name.as_str()),
            _ => None,
        },
        _ => None,
    }
}

/// The outcome of index selection: either a chosen index plus the
/// predicates it can drive, or a full scan with all predicates left for
/// `Filter` to evaluate.
pub enum Selection<'a> {
    Index {
        index: IndexDef,
        predicates: Vec<Predicate<'a>>,
    },
    FullScan,
}

/// Selects the index covering the longest predicate-matching column
/// prefix. Ties keep the first index encountered with the current
/// maximum. Predicates with no plain-column operand are ignored for
/// index-selection purposes (they still apply later, in `Filter`).
pub fn select<'a>(where_list: &'a [Expr], indexes: &[IndexDef]) -> Selection<'a> {
    let predicate_columns: HashSet<&str> = where_list.iter().filter_map(column_of).collect();

    let mut best: Option<(usize, &IndexDef)> = None;
    for index in indexes {
        let mut count = 0;
        for col in &index.columns {
            if predicate_columns.contains(col.as_str()) {
                count += 1;
            } else {
                break;
            }
        }
        if count > 0 {
            match &best {
                Some((best_count, _)) if *best_count >= count => {}
                _ => best = Some((count, index)),
            }
        }
    }

    match best {
        None => Selection::FullScan,
        Some((count, index)) => {
            let winning_columns: HashSet<&str> = index.columns[..count].iter().map(|s| s.as_str()).collect();
            let predicates = where_list
                .iter()
                .filter_map(|e| column_of(e).map(|c| (c, e)))
                .filter(|(c, _)| winning_columns.contains(c))
                .map(|(c, e)| Predicate {
                    column: c.to_string(),
                    expr: e,
                })
                .collect();
            log::debug!("selected index {:?} with prefix match {}", index.name, count);
            Selection::Index {
                index: index.clone(),
                predicates,
            }
        }
    }
}
