//! The insert coordinator: one row into base arrays and every index.
//!
//! Without a primary index the row appends. With one, the primary column's
//! index names the row's sorted position; base arrays of every column shift
//! their tails down one slot, and every index is told to renumber its
//! stored positions (`shift_positions`) so it keeps agreeing with the base
//! arrays. Insertion is not transactional: a failure mid-row is surfaced
//! and leaves the table as far as it got.

use crate::catalog::types::TableRef;
use crate::catalog::{Catalog, ColumnIndex};
use crate::error::{BasaltError, BasaltResult};
use crate::index::SortedIndex;

/// Routes one row into a table.
pub fn insert_row(catalog: &mut Catalog, table: &TableRef, values: &[i32]) -> BasaltResult<()> {
    let tbl = catalog.table_mut(table)?;
    if tbl.columns.len() != tbl.declared_columns {
        return Err(BasaltError::ExecutionError {
            reason: format!(
                "table '{}' has {} of {} declared columns",
                table,
                tbl.columns.len(),
                tbl.declared_columns
            ),
        });
    }
    if values.len() != tbl.columns.len() {
        return Err(BasaltError::IncorrectFormat {
            reason: format!(
                "row has {} values, table '{}' has {} columns",
                values.len(),
                table,
                tbl.columns.len()
            ),
        });
    }

    let row_count = tbl.row_count;
    let (row_idx, shift) = match tbl.primary {
        None => (row_count, false),
        Some(primary_idx) => {
            let insert_val = values[primary_idx];
            placement(&tbl.columns[primary_idx], insert_val, row_count)
        }
    };

    for (col, &value) in tbl.columns.iter_mut().zip(values) {
        match &mut col.index {
            Some(ColumnIndex::BTree(tree)) => tree.insert(value, row_idx, shift),
            Some(ColumnIndex::Sorted(idx)) if !idx.is_clustered() => {
                idx.insert(value, row_idx)?;
            }
            // a clustered sorted index reads through the base array
            _ => {}
        }
        col.place_at(row_idx, value);
    }
    tbl.row_count += 1;
    Ok(())
}

/// Where the new row lands in a clustered table, and whether existing
/// positions must shift. Appends skip the position walk entirely.
fn placement(
    primary: &crate::catalog::Column,
    insert_val: i32,
    row_count: usize,
) -> (usize, bool) {
    let data = &primary.data;
    if row_count == 0 || data[row_count - 1] <= insert_val {
        return (row_count, false);
    }
    if data[0] > insert_val {
        return (0, true);
    }
    let row_idx = match &primary.index {
        Some(ColumnIndex::BTree(tree)) => tree
            .find_insert_position(insert_val)
            .unwrap_or(row_count),
        Some(ColumnIndex::Sorted(_)) => SortedIndex::find_insert_position(data, insert_val),
        // primary without an index: place by the base array
        None => data.partition_point(|&v| v <= insert_val),
    };
    (row_idx, row_idx < row_count)
}
