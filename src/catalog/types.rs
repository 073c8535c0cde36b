//! Shared catalog types: qualified names and index descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a database, table, column or handle name.
pub const MAX_NAME_LEN: usize = 64;

/// The two index families a column can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    Sorted,
    BTree,
}

/// Whether an index order matches the base-array order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Clustering {
    Clustered,
    Unclustered,
}

/// Index descriptor as written in `create(col, ...)` / `create(idx, ...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub kind: IndexKind,
    pub clustering: Clustering,
}

impl IndexSpec {
    pub fn is_clustered(&self) -> bool {
        self.clustering == Clustering::Clustered
    }
}

/// Fully-qualified table name `db.table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub db: String,
    pub table: String,
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.db, self.table)
    }
}

/// Fully-qualified column name `db.table.column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub db: String,
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn table_ref(&self) -> TableRef {
        TableRef {
            db: self.db.clone(),
            table: self.table.clone(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.db, self.table, self.column)
    }
}
