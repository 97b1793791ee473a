//! the runtime value type flowing through the plan pipeline, and the
//! comparison semantics `Filter` uses to evaluate `WHERE` predicates.

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Int(i64),
    Text(Vec<u8>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Text(b) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Lt,
    Gt,
}

/// Evaluates `lhs <op> rhs` with SQLite's type-aware comparison semantics:
/// values of different variants are never equal and never ordered relative
/// to one another (so `1 = '1'` is false, and so is `1 < '1'`); text
/// compares by byte-prefix (memcmp of the shorter length, shorter-is-less
/// on a tie); NULL compares equal only to NULL and is never less/greater
/// than anything, including another NULL.
pub fn compare(lhs: &Value, op: CmpOp, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Null, Value::Null) => op == CmpOp::Eq,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Int(a), Value::Int(b)) => match op {
            CmpOp::Eq => a == b,
            CmpOp::Lt => a < b,
            CmpOp::Gt => a > b,
        },
        (Value::Text(a), Value::Text(b)) => match text_cmp(a, b) {
            Ordering::Equal => op == CmpOp::Eq,
            Ordering::Less => op == CmpOp::Lt,
            Ordering::Greater => op == CmpOp::Gt,
        },
        _ => false,
    }
}

fn text_cmp(a: &[u8], b: &[u8]) -> Ordering {
    let n = std::cmp::min(a.len(), b.len());
    match a[..n].cmp(&b[..n]) {
        Ordering::Equal => a.len().cmp(&b.len()),
        other => other,
    }
}
