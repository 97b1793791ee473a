//! CLI entry point: opens the database named on the command line and
//! dispatches the second argument as either a dot-command (`.dbinfo`,
//! `.tables`) or a SQL statement.

use crate::ast::Statement;
use crate::error::{Error, Result};
use crate::pager::Pager;
use crate::plan::{self, CountAggregate, Filter, Operator, Projection, TableScan};
use crate::schema::{self, Catalog};
use crate::{ast, index_select, pt_to_ast, resolver, value};

pub fn run(args: &[String]) -> Result<()> {
    let [_, db_path, command] = args else {
        return Err(Error::Usage(args.first().cloned().unwrap_or_default()));
    };

    let pager = Pager::open(db_path)?;

    match command.as_str() {
        ".dbinfo" => run_dbinfo(&pager),
        ".tables" => run_tables(&pager),
        sql => run_sql(&pager, sql),
    }
}

fn run_dbinfo(pager: &Pager) -> Result<()> {
    let header = pager.header();
    let page1 = pager.get_page(schema::SCHEMA_ROOT_PAGE)?;
    let schema_header = crate::btree::header::read_header(&page1.bytes(), 100)?;
    println!("database page size: {}", header.page_size);
    println!("number of tables: {}", schema_header.num_cells);
    Ok(())
}

fn run_tables(pager: &Pager) -> Result<()> {
    let catalog = Catalog::load(pager)?;
    println!("{}", catalog.table_names().join(" "));
    Ok(())
}

fn run_sql(pager: &Pager, sql: &str) -> Result<()> {
    let statement = pt_to_ast::parse_statement(sql)?;
    let select = match statement {
        Statement::Select(s) => s,
        _ => return Err(Error::NotASelect),
    };

    let catalog = Catalog::load(pager)?;
    let table = catalog.find_table(&select.from_table)?;
    let table_columns = table_column_names(&table.sql)?;
    let resolved = resolver::resolve(&select, &table_columns)?;

    let indexes = catalog.find_indexes_for_table(&table.name);
    let selection = index_select::select(&select.where_list, &indexes);

    let leading_predicate = match &selection {
        index_select::Selection::Index { predicates, .. } => predicates.first().and_then(|p| match p.expr {
            ast::Expr::Binary { op, lhs, rhs } => {
                let literal = match (lhs.as_ref(), rhs.as_ref()) {
                    (ast::Expr::Column { .. }, other) => literal_of(other),
                    (other, ast::Expr::Column { .. }) => literal_of(other),
                    _ => None,
                };
                literal.map(|l| (*op, l))
            }
            _ => None,
        }),
        index_select::Selection::FullScan => None,
    };

    let scan: TableScan<'_> = match (&selection, leading_predicate) {
        (index_select::Selection::Index { index, .. }, Some((op, probe))) => {
            TableScan::indexed(pager, table.root_page, index.root_page, op, probe)?
        }
        _ => TableScan::full(pager, table.root_page)?,
    };

    let predicates = plan::resolve_predicates(&select.where_list);
    let filtered = Filter::new(scan, predicates);

    if resolved.is_count_aggregate {
        let mut agg = CountAggregate::new(filtered);
        print_rows(&mut agg)?;
    } else {
        let mut projected = Projection::new(filtered, resolved.projection);
        print_rows(&mut projected)?;
    }
    Ok(())
}

fn literal_of(expr: &ast::Expr) -> Option<value::Value> {
    match expr {
        ast::Expr::IntLiteral(i) => Some(value::Value::Int(*i)),
        ast::Expr::StringLiteral(s) => Some(value::Value::Text(s.clone().into_bytes())),
        _ => None,
    }
}

fn table_column_names(create_table_sql: &str) -> Result<Vec<String>> {
    match pt_to_ast::parse_statement(create_table_sql)? {
        Statement::CreateTable(t) => Ok(t.columns.into_iter().map(|c| c.name).collect()),
        _ => Err(Error::NotASelect),
    }
}

/// Prints each row bar-joined, in column order, with no header and no
/// column padding — the format this crate's `.db` fixtures are checked
/// against, deliberately plainer than a human-facing table layout.
fn print_rows<O: Operator>(op: &mut O) -> Result<()> {
    while op.advance()? {
        let row = op.get().expect("advance returned true");
        let line = row
            .values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("|");
        println!("{}", line);
    }
    Ok(())
}
