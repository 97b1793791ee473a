//! converts a pest parse tree produced by [`crate::parser`] into the
//! [`crate::ast`] types the rest of the pipeline consumes.
//!
//! A pest parse tree has one enum variant per grammar rule; our AST groups
//! related rules into a handful of types and discards lexical detail
//! (case, exact source position) that downstream code doesn't need.

use itertools::Itertools;
use pest::iterators::Pair;

use crate::ast;
use crate::parser::{self, Rule};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Parser(#[from] parser::Error),
    #[error("unexpected rule {0:?} while converting parse tree to AST")]
    UnexpectedRule(Rule),
}

pub type Result<T> = core::result::Result<T, Error>;

/// parses `sql` and converts it to a [`ast::Statement`].
pub fn parse_statement(sql: &str) -> Result<ast::Statement> {
    let top = parser::parse(sql)?;
    let inner = top.into_inner().next().expect("statement wraps exactly one alternative");
    match inner.as_rule() {
        Rule::select_stmt => Ok(ast::Statement::Select(select_stmt_to_ast(inner))),
        Rule::create_table_stmt => Ok(ast::Statement::CreateTable(create_table_stmt_to_ast(inner))),
        Rule::create_index_stmt => Ok(ast::Statement::CreateIndex(create_index_stmt_to_ast(inner))),
        other => Err(Error::UnexpectedRule(other)),
    }
}

fn select_stmt_to_ast(pair: Pair<'_, Rule>) -> ast::SelectStatement {
    let mut select_list = vec![];
    let mut from_table = String::new();
    let mut where_list = vec![];
    let mut parts = pair.into_inner();

    let select_list_pair = parts.next().expect("select_stmt always has a select_list");
    for item in select_list_pair.into_inner() {
        select_list.push(select_item_to_expr(item));
    }

    for p in parts {
        match p.as_rule() {
            Rule::identifier => from_table = p.as_str().to_string(),
            Rule::where_clause => {
                let where_list_pair = p.into_inner().next().expect("where_clause wraps a where_list");
                where_list = where_list_pair.into_inner().map(expr_to_ast).collect_vec();
            }
            _ => unreachable!("unexpected child of select_stmt: {:?}", p.as_rule()),
        }
    }

    ast::SelectStatement {
        select_list,
        from_table,
        where_list,
    }
}

fn select_item_to_expr(pair: Pair<'_, Rule>) -> ast::Expr {
    let inner = pair.into_inner().next().expect("select_item wraps one alternative");
    match inner.as_rule() {
        Rule::star => ast::Expr::Star,
        Rule::function_call => function_call_to_ast(inner),
        Rule::identifier => ast::Expr::column(inner.as_str()),
        other => unreachable!("unexpected select_item child: {:?}", other),
    }
}

fn function_call_to_ast(pair: Pair<'_, Rule>) -> ast::Expr {
    let mut parts = pair.into_inner();
    let name = parts.next().expect("function_call always names a function").as_str().to_string();
    let args = parts
        .next()
        .map(|expr_list| expr_list.into_inner().map(expr_to_ast).collect_vec())
        .unwrap_or_default();
    ast::Expr::Function { name, args }
}

fn expr_to_ast(pair: Pair<'_, Rule>) -> ast::Expr {
    // `expr` wraps exactly one of: comparison, function_call, literal, star, identifier.
    let inner = pair.into_inner().next().expect("expr wraps one alternative");
    match inner.as_rule() {
        Rule::comparison => comparison_to_ast(inner),
        Rule::function_call => function_call_to_ast(inner),
        Rule::literal => literal_to_ast(inner),
        Rule::star => ast::Expr::Star,
        Rule::identifier => ast::Expr::column(inner.as_str()),
        other => unreachable!("unexpected expr child: {:?}", other),
    }
}

fn comparison_to_ast(pair: Pair<'_, Rule>) -> ast::Expr {
    let (lhs, op, rhs) = pair
        .into_inner()
        .collect_tuple()
        .expect("comparison always has exactly three children");
    let op = match op.as_str() {
        "=" => ast::CmpOp::Eq,
        "<" => ast::CmpOp::Lt,
        ">" => ast::CmpOp::Gt,
        other => unreachable!("unrecognized comparison operator {:?}", other),
    };
    ast::Expr::Binary {
        op,
        lhs: Box::new(operand_to_ast(lhs)),
        rhs: Box::new(operand_to_ast(rhs)),
    }
}

fn operand_to_ast(pair: Pair<'_, Rule>) -> ast::Expr {
    let inner = pair.into_inner().next().expect("operand wraps one alternative");
    match inner.as_rule() {
        Rule::literal => literal_to_ast(inner),
        Rule::identifier => ast::Expr::column(inner.as_str()),
        other => unreachable!("unexpected operand child: {:?}", other),
    }
}

fn literal_to_ast(pair: Pair<'_, Rule>) -> ast::Expr {
    let inner = pair.into_inner().next().expect("literal wraps one alternative");
    match inner.as_rule() {
        Rule::int_literal => ast::Expr::IntLiteral(inner.as_str().parse().expect("int_literal is all digits")),
        Rule::string_literal => ast::Expr::StringLiteral(unquote(inner.as_str())),
        other => unreachable!("unexpected literal child: {:?}", other),
    }
}

/// strips the surrounding single quotes a `string_literal` token carries.
fn unquote(s: &str) -> String {
    s[1..s.len() - 1].to_string()
}

fn create_table_stmt_to_ast(pair: Pair<'_, Rule>) -> ast::CreateTableStatement {
    let mut parts = pair.into_inner();
    let table_name = parts.next().expect("create_table_stmt always names a table").as_str().to_string();
    let column_defs = parts.next().expect("create_table_stmt always has column_defs");
    let columns = column_defs
        .into_inner()
        .map(|cd| {
            let name = cd
                .into_inner()
                .next()
                .expect("column_def always starts with an identifier")
                .as_str()
                .to_string();
            ast::ColumnDef { name }
        })
        .collect_vec();
    ast::CreateTableStatement { table_name, columns }
}

fn create_index_stmt_to_ast(pair: Pair<'_, Rule>) -> ast::CreateIndexStatement {
    let mut index_name = String::new();
    let mut table_name = String::new();
    let mut columns = vec![];
    let mut seen_identifiers = 0;

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::unique | Rule::if_not_exists => {}
            Rule::identifier => {
                seen_identifiers += 1;
                if seen_identifiers == 1 {
                    index_name = p.as_str().to_string();
                } else {
                    table_name = p.as_str().to_string();
                }
            }
            Rule::column_list => {
                columns = p.into_inner().map(|c| c.as_str().to_string()).collect_vec();
            }
            other => unreachable!("unexpected child of create_index_stmt: {:?}", other),
        }
    }

    ast::CreateIndexStatement {
        index_name,
        table_name,
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Case {
        desc: &'static str,
        input: &'static str,
    }

    #[test]
    fn test_parse_select_statements() {
        let cases = [
            Case {
                desc: "star select, no where",
                input: "SELECT * FROM t",
            },
            Case {
                desc: "single column with where equality",
                input: "SELECT name FROM t WHERE color = 'red'",
            },
            Case {
                desc: "count aggregate",
                input: "SELECT count(*) FROM t",
            },
            Case {
                desc: "conjunction of two predicates",
                input: "SELECT name FROM t WHERE id = 1, color = 'blue'",
            },
        ];
        for c in cases {
            let stmt = parse_statement(c.input).unwrap_or_else(|e| panic!("case {:?}: {:?}", c.desc, e));
            match stmt {
                ast::Statement::Select(_) => {}
                _ => panic!("case {:?}: expected a Select statement", c.desc),
            }
        }
    }

    #[test]
    fn test_select_list_and_from_table() {
        let stmt = match parse_statement("SELECT name FROM widgets").unwrap() {
            ast::Statement::Select(s) => s,
            _ => panic!("expected select"),
        };
        assert_eq!(stmt.from_table, "widgets");
        assert_eq!(stmt.select_list.len(), 1);
        match &stmt.select_list[0] {
            ast::Expr::Column { name, .. } => assert_eq!(name, "name"),
            other => panic!("expected a column expr, got {:?}", other),
        }
    }

    #[test]
    fn test_where_conjunction_parses_each_predicate() {
        let stmt = match parse_statement("SELECT name FROM t WHERE id = 1, color = 'blue'").unwrap() {
            ast::Statement::Select(s) => s,
            _ => panic!("expected select"),
        };
        assert_eq!(stmt.where_list.len(), 2);
    }

    #[test]
    fn test_count_is_recognized_as_aggregate() {
        let stmt = match parse_statement("SELECT count(*) FROM t").unwrap() {
            ast::Statement::Select(s) => s,
            _ => panic!("expected select"),
        };
        assert!(stmt.select_list[0].is_count_aggregate());
    }

    #[test]
    fn test_create_table_retains_only_column_names() {
        let stmt = match parse_statement("CREATE TABLE t (id integer primary key, name text not null)").unwrap() {
            ast::Statement::CreateTable(s) => s,
            _ => panic!("expected create table"),
        };
        assert_eq!(stmt.table_name, "t");
        let names: Vec<_> = stmt.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_create_index() {
        let stmt = match parse_statement("CREATE UNIQUE INDEX IF NOT EXISTS idx_color ON t (color)").unwrap() {
            ast::Statement::CreateIndex(s) => s,
            _ => panic!("expected create index"),
        };
        assert_eq!(stmt.index_name, "idx_color");
        assert_eq!(stmt.table_name, "t");
        assert_eq!(stmt.columns, vec!["color".to_string()]);
    }

    #[test]
    fn test_string_literal_unquoting() {
        let stmt = match parse_statement("SELECT name FROM t WHERE color = 'red'").unwrap() {
            ast::Statement::Select(s) => s,
            _ => panic!("expected select"),
        };
        match &stmt.where_list[0] {
            ast::Expr::Binary { rhs, .. } => match rhs.as_ref() {
                ast::Expr::StringLiteral(s) => assert_eq!(s, "red"),
                other => panic!("expected string literal, got {:?}", other),
            },
            other => panic!("expected binary expr, got {:?}", other),
        }
    }
}
