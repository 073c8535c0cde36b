//! On-disk state: the catalog record stream, raw column files and index
//! dumps, plus the data-directory lock.
//!
//! ```text
//! <data_dir>/
//! ├── database.bin            bincode catalog records + crc32 trailer
//! ├── <db>.<tbl>.<col>.data   raw little-endian i32 base array
//! ├── <db>.<tbl>.<col>.idx    bincode index dump (sorted pairs or BFS tree)
//! └── basalt.lock             advisory lock held while a server runs
//! ```
//!
//! `database.bin` is written to a temp file and renamed into place; its
//! crc32 trailer is verified on load. Column files are read through a
//! memory map and copied into the in-memory arrays.

pub mod loader;

#[cfg(test)]
mod persist_test;

use crate::catalog::{Catalog, Column, ColumnIndex, Database, Table};
use crate::error::{BasaltError, BasaltResult};
use crate::index::btree::TreeDump;
use crate::index::{BPlusTree, SortedIndex};
use fs2::FileExt;
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

const CATALOG_FILE: &str = "database.bin";
const LOCK_FILE: &str = "basalt.lock";

#[derive(Debug, Serialize, Deserialize)]
struct CatalogDump {
    current: Option<usize>,
    dbs: Vec<DbRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DbRecord {
    name: String,
    tables: Vec<TableRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TableRecord {
    name: String,
    declared_columns: usize,
    row_count: usize,
    primary: Option<usize>,
    columns: Vec<ColumnRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ColumnRecord {
    name: String,
    has_index: bool,
}

/// One column's index file payload.
#[derive(Debug, Serialize, Deserialize)]
enum IndexDump {
    Sorted(SortedIndex),
    BTree(TreeDump),
}

/// Advisory lock on the data directory (RAII; released on drop).
#[derive(Debug)]
pub struct DirLock {
    _file: File,
}

/// Takes the exclusive data-directory lock so two servers cannot share it.
pub fn lock_data_dir(dir: &Path) -> BasaltResult<DirLock> {
    std::fs::create_dir_all(dir).map_err(|e| BasaltError::IoError {
        operation: "create_data_dir".to_string(),
        reason: e.to_string(),
    })?;
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .open(dir.join(LOCK_FILE))
        .map_err(|e| BasaltError::IoError {
            operation: "open_lock_file".to_string(),
            reason: e.to_string(),
        })?;
    file.try_lock_exclusive()
        .map_err(|_| BasaltError::ExecutionError {
            reason: format!("data directory '{}' is locked by another server", dir.display()),
        })?;
    Ok(DirLock { _file: file })
}

fn column_stem(db: &str, table: &str, column: &str) -> String {
    format!("{}.{}.{}", db, table, column)
}

/// Flushes the whole catalog to `dir`.
///
/// ## Input
/// - `catalog`: The in-memory catalog to persist
/// - `dir`: Data directory (created if missing)
///
/// ## Output
/// - `Ok(())`: Catalog, column and index files written
/// - `Err(BasaltError)`: I/O or serialization failure
///
/// ## Side Effects
/// - Rewrites every `.data` and `.idx` file
/// - Replaces `database.bin` via temp-file rename
pub fn save(catalog: &Catalog, dir: &Path) -> BasaltResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| BasaltError::IoError {
        operation: "create_data_dir".to_string(),
        reason: e.to_string(),
    })?;

    let mut dump = CatalogDump {
        current: catalog.current,
        dbs: Vec::with_capacity(catalog.dbs.len()),
    };

    for db in &catalog.dbs {
        let mut tables = Vec::with_capacity(db.tables.len());
        for table in &db.tables {
            let mut columns = Vec::with_capacity(table.columns.len());
            for column in &table.columns {
                let stem = column_stem(&db.name, &table.name, &column.name);
                write_column_data(dir, &stem, &column.data)?;
                if let Some(index) = &column.index {
                    write_index(dir, &stem, index)?;
                }
                columns.push(ColumnRecord {
                    name: column.name.clone(),
                    has_index: column.index.is_some(),
                });
            }
            tables.push(TableRecord {
                name: table.name.clone(),
                declared_columns: table.declared_columns,
                row_count: table.row_count,
                primary: table.primary,
                columns,
            });
        }
        dump.dbs.push(DbRecord {
            name: db.name.clone(),
            tables,
        });
    }

    let body = bincode::serialize(&dump).map_err(|e| BasaltError::ExecutionError {
        reason: format!("catalog serialization: {}", e),
    })?;
    let crc = crc32fast::hash(&body);

    let tmp = dir.join(format!("{}.tmp", CATALOG_FILE));
    let mut file = File::create(&tmp).map_err(|e| BasaltError::IoError {
        operation: "create_catalog_tmp".to_string(),
        reason: e.to_string(),
    })?;
    file.write_all(&body)
        .and_then(|_| file.write_all(&crc.to_le_bytes()))
        .and_then(|_| file.sync_all())
        .map_err(|e| BasaltError::IoError {
            operation: "write_catalog".to_string(),
            reason: e.to_string(),
        })?;
    std::fs::rename(&tmp, dir.join(CATALOG_FILE)).map_err(|e| BasaltError::IoError {
        operation: "rename_catalog".to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

fn write_column_data(dir: &Path, stem: &str, data: &[i32]) -> BasaltResult<()> {
    let mut bytes = Vec::with_capacity(data.len() * 4);
    for v in data {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    std::fs::write(dir.join(format!("{}.data", stem)), bytes).map_err(|e| {
        BasaltError::IoError {
            operation: format!("write_column '{}'", stem),
            reason: e.to_string(),
        }
    })
}

fn write_index(dir: &Path, stem: &str, index: &ColumnIndex) -> BasaltResult<()> {
    let dump = match index {
        ColumnIndex::Sorted(idx) => IndexDump::Sorted(idx.clone()),
        ColumnIndex::BTree(tree) => IndexDump::BTree(tree.dump()),
    };
    let bytes = bincode::serialize(&dump).map_err(|e| BasaltError::ExecutionError {
        reason: format!("index serialization: {}", e),
    })?;
    std::fs::write(dir.join(format!("{}.idx", stem)), bytes).map_err(|e| {
        BasaltError::IoError {
            operation: format!("write_index '{}'", stem),
            reason: e.to_string(),
        }
    })
}

/// Loads a catalog from `dir`; `Ok(None)` when no catalog file exists.
///
/// ## Error Conditions
/// - Checksum mismatch or undecodable records (`IncorrectFileFormat`)
/// - Column files shorter than the recorded row count
/// - Index dumps with dangling node references
pub fn load(dir: &Path) -> BasaltResult<Option<Catalog>> {
    let catalog_path = dir.join(CATALOG_FILE);
    if !catalog_path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(&catalog_path).map_err(|e| BasaltError::IoError {
        operation: "read_catalog".to_string(),
        reason: e.to_string(),
    })?;
    if bytes.len() < 4 {
        return Err(BasaltError::IncorrectFileFormat {
            reason: "catalog file is truncated".to_string(),
        });
    }
    let (body, trailer) = bytes.split_at(bytes.len() - 4);
    let stored = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    if crc32fast::hash(body) != stored {
        return Err(BasaltError::IncorrectFileFormat {
            reason: "catalog checksum mismatch".to_string(),
        });
    }
    let dump: CatalogDump =
        bincode::deserialize(body).map_err(|e| BasaltError::IncorrectFileFormat {
            reason: format!("catalog records: {}", e),
        })?;

    let mut catalog = Catalog::new();
    catalog.current = dump.current;
    for db_record in dump.dbs {
        let mut tables = Vec::with_capacity(db_record.tables.len());
        for table_record in db_record.tables {
            let mut columns = Vec::with_capacity(table_record.columns.len());
            for column_record in &table_record.columns {
                let stem = column_stem(&db_record.name, &table_record.name, &column_record.name);
                let data = read_column_data(dir, &stem, table_record.row_count)?;
                let index = if column_record.has_index {
                    Some(read_index(dir, &stem)?)
                } else {
                    None
                };
                columns.push(Column {
                    name: column_record.name.clone(),
                    data,
                    index,
                });
            }
            tables.push(Table {
                name: table_record.name,
                declared_columns: table_record.declared_columns,
                columns,
                row_count: table_record.row_count,
                primary: table_record.primary,
            });
        }
        catalog.dbs.push(Database {
            name: db_record.name,
            tables,
        });
    }
    if catalog.current.is_some_and(|c| c >= catalog.dbs.len()) {
        return Err(BasaltError::IncorrectFileFormat {
            reason: "catalog current-db reference out of range".to_string(),
        });
    }
    Ok(Some(catalog))
}

fn read_column_data(dir: &Path, stem: &str, row_count: usize) -> BasaltResult<Vec<i32>> {
    let path = dir.join(format!("{}.data", stem));
    let file = File::open(&path).map_err(|e| BasaltError::IoError {
        operation: format!("open_column '{}'", stem),
        reason: e.to_string(),
    })?;
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| BasaltError::IoError {
        operation: format!("mmap_column '{}'", stem),
        reason: e.to_string(),
    })?;
    if mmap.len() < row_count * 4 {
        return Err(BasaltError::IncorrectFileFormat {
            reason: format!(
                "column file '{}' holds {} bytes, need {}",
                stem,
                mmap.len(),
                row_count * 4
            ),
        });
    }
    Ok(mmap[..row_count * 4]
        .chunks_exact(4)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn read_index(dir: &Path, stem: &str) -> BasaltResult<ColumnIndex> {
    let bytes = std::fs::read(dir.join(format!("{}.idx", stem))).map_err(|e| {
        BasaltError::IoError {
            operation: format!("read_index '{}'", stem),
            reason: e.to_string(),
        }
    })?;
    let dump: IndexDump =
        bincode::deserialize(&bytes).map_err(|e| BasaltError::IncorrectFileFormat {
            reason: format!("index dump '{}': {}", stem, e),
        })?;
    Ok(match dump {
        IndexDump::Sorted(idx) => ColumnIndex::Sorted(idx),
        IndexDump::BTree(tree_dump) => ColumnIndex::BTree(BPlusTree::from_dump(tree_dump)?),
    })
}
