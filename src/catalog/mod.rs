//! The catalog: databases, tables and columns.
//!
//! All catalog records live in plain `Vec` arenas addressed by position, and
//! the "current" database is an index into the arena rather than a pointer,
//! so back-references and the db list never form ownership cycles. Operators
//! carry qualified names; resolution happens here at execution time.
//!
//! The catalog is process-wide and mutated only by create, insert and load.
//! Sessions are serialised by the server, so no interior locking is needed.

pub mod column;
pub mod types;

#[cfg(test)]
mod catalog_test;

pub use column::{Column, ColumnIndex};
pub use types::{Clustering, ColumnRef, IndexKind, IndexSpec, TableRef, MAX_NAME_LEN};

use crate::error::{BasaltError, BasaltResult};
use crate::index::{BPlusTree, SortedIndex};

/// An ordered list of columns sharing a common length.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    /// Number of columns declared at `create(tbl, ...)` time.
    pub declared_columns: usize,
    pub columns: Vec<Column>,
    pub row_count: usize,
    /// Position of the clustered (primary) column, if any.
    pub primary: Option<usize>,
}

impl Table {
    fn new(name: &str, declared_columns: usize) -> Self {
        Self {
            name: name.to_string(),
            declared_columns,
            columns: Vec::with_capacity(declared_columns),
            row_count: 0,
            primary: None,
        }
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

/// A named set of tables with unique table names.
#[derive(Debug, Clone)]
pub struct Database {
    pub name: String,
    pub tables: Vec<Table>,
}

/// The process-wide catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub dbs: Vec<Database>,
    /// Index of the current database, selected by `create(db, ...)` or load.
    pub current: Option<usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a database and makes it current.
    pub fn create_db(&mut self, name: &str) -> BasaltResult<()> {
        if self.dbs.iter().any(|db| db.name == name) {
            return Err(BasaltError::ObjectAlreadyExists {
                name: name.to_string(),
            });
        }
        self.dbs.push(Database {
            name: name.to_string(),
            tables: Vec::new(),
        });
        self.current = Some(self.dbs.len() - 1);
        Ok(())
    }

    /// Returns the current database, checking it matches `name`.
    ///
    /// Queries always name their database explicitly; only the current one
    /// is addressable.
    fn valid_db(&self, name: &str) -> BasaltResult<usize> {
        match self.current {
            Some(idx) if self.dbs[idx].name == name => Ok(idx),
            _ => Err(BasaltError::ObjectNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Creates a table with `declared_columns` column slots.
    pub fn create_table(
        &mut self,
        db_name: &str,
        name: &str,
        declared_columns: usize,
    ) -> BasaltResult<()> {
        let db_idx = self.valid_db(db_name)?;
        let db = &mut self.dbs[db_idx];
        if db.tables.iter().any(|t| t.name == name) {
            return Err(BasaltError::ObjectAlreadyExists {
                name: format!("{}.{}", db_name, name),
            });
        }
        db.tables.push(Table::new(name, declared_columns));
        Ok(())
    }

    /// Creates a column in the next free slot of a table, optionally with
    /// an index built at creation time.
    pub fn create_column(
        &mut self,
        table: &TableRef,
        name: &str,
        index: Option<IndexSpec>,
    ) -> BasaltResult<()> {
        let (db_idx, tbl_idx) = self.locate_table(table)?;
        let tbl = &mut self.dbs[db_idx].tables[tbl_idx];
        if tbl.column_position(name).is_some() {
            return Err(BasaltError::ObjectAlreadyExists {
                name: format!("{}.{}", table, name),
            });
        }
        if tbl.columns.len() == tbl.declared_columns {
            return Err(BasaltError::ExecutionError {
                reason: format!(
                    "table '{}' already has its {} declared columns",
                    table, tbl.declared_columns
                ),
            });
        }
        tbl.columns.push(Column::new(name));
        if let Some(spec) = index {
            let cref = ColumnRef {
                db: table.db.clone(),
                table: table.table.clone(),
                column: name.to_string(),
            };
            self.create_index(&cref, spec)?;
        }
        Ok(())
    }

    /// Builds an index over a column's existing base data.
    ///
    /// A clustered index requires the base array to already be sorted and
    /// claims the table's primary slot; only one primary per table.
    pub fn create_index(&mut self, cref: &ColumnRef, spec: IndexSpec) -> BasaltResult<()> {
        let (db_idx, tbl_idx, col_idx) = self.locate_column(cref)?;
        let tbl = &mut self.dbs[db_idx].tables[tbl_idx];

        if tbl.columns[col_idx].index.is_some() {
            return Err(BasaltError::IndexAlreadyExists {
                table: format!("{}.{}", cref.db, cref.table),
                column: cref.column.clone(),
            });
        }
        if spec.is_clustered() {
            if let Some(primary) = tbl.primary {
                if primary != col_idx {
                    return Err(BasaltError::QueryUnsupported {
                        reason: format!(
                            "table '{}.{}' already has a clustered column",
                            cref.db, cref.table
                        ),
                    });
                }
            }
            let data = &tbl.columns[col_idx].data;
            if data.windows(2).any(|w| w[0] > w[1]) {
                return Err(BasaltError::ExecutionError {
                    reason: format!(
                        "cannot cluster '{}': base data is not sorted",
                        cref
                    ),
                });
            }
        }

        let col = &mut tbl.columns[col_idx];
        let index = match (spec.kind, spec.is_clustered()) {
            (IndexKind::Sorted, true) => ColumnIndex::Sorted(SortedIndex::new_clustered()),
            (IndexKind::Sorted, false) => {
                ColumnIndex::Sorted(SortedIndex::build_unclustered(&col.data))
            }
            (IndexKind::BTree, clustered) => {
                let mut tree = BPlusTree::new(clustered);
                for (pos, &value) in col.data.iter().enumerate() {
                    tree.insert(value, pos, false);
                }
                ColumnIndex::BTree(tree)
            }
        };
        col.index = Some(index);
        if spec.is_clustered() {
            tbl.primary = Some(col_idx);
        }
        Ok(())
    }

    pub fn locate_table(&self, tref: &TableRef) -> BasaltResult<(usize, usize)> {
        let db_idx = self.valid_db(&tref.db)?;
        let tbl_idx = self.dbs[db_idx]
            .tables
            .iter()
            .position(|t| t.name == tref.table)
            .ok_or_else(|| BasaltError::ObjectNotFound {
                name: tref.to_string(),
            })?;
        Ok((db_idx, tbl_idx))
    }

    pub fn locate_column(&self, cref: &ColumnRef) -> BasaltResult<(usize, usize, usize)> {
        let (db_idx, tbl_idx) = self.locate_table(&cref.table_ref())?;
        let col_idx = self.dbs[db_idx].tables[tbl_idx]
            .column_position(&cref.column)
            .ok_or_else(|| BasaltError::ObjectNotFound {
                name: cref.to_string(),
            })?;
        Ok((db_idx, tbl_idx, col_idx))
    }

    pub fn table(&self, tref: &TableRef) -> BasaltResult<&Table> {
        let (db_idx, tbl_idx) = self.locate_table(tref)?;
        Ok(&self.dbs[db_idx].tables[tbl_idx])
    }

    pub fn table_mut(&mut self, tref: &TableRef) -> BasaltResult<&mut Table> {
        let (db_idx, tbl_idx) = self.locate_table(tref)?;
        Ok(&mut self.dbs[db_idx].tables[tbl_idx])
    }

    pub fn column(&self, cref: &ColumnRef) -> BasaltResult<&Column> {
        let (db_idx, tbl_idx, col_idx) = self.locate_column(cref)?;
        Ok(&self.dbs[db_idx].tables[tbl_idx].columns[col_idx])
    }
}
