//! CSV bulk loader.
//!
//! The first line is a header of fully-qualified column names identifying
//! one table; every following line is one comma-separated row of integers.
//! Rows go through the insert coordinator, so clustered tables stay sorted
//! and every index stays in lock-step with the base arrays.

use crate::catalog::Catalog;
use crate::engine::insert;
use crate::error::{BasaltError, BasaltResult};
use std::io::{BufRead, BufReader};

/// Loads a CSV file into the table its header names.
///
/// ## Input
/// - `catalog`: Catalog holding the target table
/// - `path`: CSV file whose header is `db.tbl.col1,db.tbl.col2,...`
///
/// ## Output
/// - `Ok(rows)`: Number of rows inserted
/// - `Err(FileNotFound)`: No file at `path`
/// - `Err(IncorrectFileFormat)`: Bad header, non-integer cell, or a row
///   with the wrong arity
pub fn load_csv(catalog: &mut Catalog, path: &str) -> BasaltResult<usize> {
    let file = std::fs::File::open(path).map_err(|_| BasaltError::FileNotFound {
        path: path.to_string(),
    })?;
    let mut reader = BufReader::new(file);

    let mut header = String::new();
    reader
        .read_line(&mut header)
        .map_err(|e| BasaltError::IoError {
            operation: "read_load_header".to_string(),
            reason: e.to_string(),
        })?;
    let header = header.trim();
    if header.is_empty() {
        return Err(BasaltError::IncorrectFileFormat {
            reason: "load file has no header".to_string(),
        });
    }

    // header columns must be this table's columns, in order
    let mut names = Vec::new();
    for token in header.split(',') {
        let parts: Vec<&str> = token.trim().split('.').collect();
        match parts.as_slice() {
            [db, table, column] => {
                names.push((db.to_string(), table.to_string(), column.to_string()))
            }
            _ => {
                return Err(BasaltError::IncorrectFileFormat {
                    reason: format!("'{}' is not a qualified column name", token),
                })
            }
        }
    }
    let table_ref = crate::catalog::types::TableRef {
        db: names[0].0.clone(),
        table: names[0].1.clone(),
    };
    let table = catalog.table(&table_ref)?;
    if names.len() != table.columns.len()
        || names
            .iter()
            .zip(&table.columns)
            .any(|((db, tbl, col), column)| {
                *db != table_ref.db || *tbl != table_ref.table || *col != column.name
            })
    {
        return Err(BasaltError::IncorrectFileFormat {
            reason: format!(
                "header does not match the columns of '{}'",
                table_ref
            ),
        });
    }

    let mut values = Vec::with_capacity(names.len());
    let mut rows = 0usize;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| BasaltError::IoError {
            operation: "read_load_row".to_string(),
            reason: e.to_string(),
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        values.clear();
        for token in line.split(',') {
            values.push(token.trim().parse::<i32>().map_err(|_| {
                BasaltError::IncorrectFileFormat {
                    reason: format!("line {}: '{}' is not an integer", line_no + 2, token),
                }
            })?);
        }
        if values.len() != names.len() {
            return Err(BasaltError::IncorrectFileFormat {
                reason: format!(
                    "line {}: {} values for {} columns",
                    line_no + 2,
                    values.len(),
                    names.len()
                ),
            });
        }
        insert::insert_row(catalog, &table_ref, &values)?;
        rows += 1;
    }
    Ok(rows)
}
