pub mod ast;
pub mod bytes;
pub mod driver;
pub mod error;
pub mod index_select;
pub mod logging;
pub mod pager;
pub mod parser;
pub mod plan;
pub mod pt_to_ast;
pub mod record;
pub mod resolver;
pub mod schema;
pub mod value;
pub mod walker;

mod btree;

extern crate pest;
#[macro_use]
extern crate pest_derive;
