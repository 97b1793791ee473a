//! pest-generated parser for the accepted SQL subset.
//!
//! This module owns only the grammar binding; [`crate::pt_to_ast`] walks
//! the resulting parse tree into [`crate::ast`] types.

use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "sql.pest"]
pub struct SQLParser;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("SQL syntax error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),
}

pub type Result<T> = core::result::Result<T, Error>;

pub fn parse(input: &str) -> Result<pest::iterators::Pair<'_, Rule>> {
    use pest::Parser;
    let mut pairs = SQLParser::parse(Rule::statement, input).map_err(|e| Error::Syntax(Box::new(e)))?;
    Ok(pairs.next().expect("statement rule always produces one pair"))
}
