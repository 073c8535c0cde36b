//! Selection: scan, index-accelerated and shared-scan paths.
//!
//! A select produces a position result. Base columns go through their index
//! when they have one; a result-column select restricts a prior fetch by a
//! companion position vector. While a batch is open, base-column selects
//! are queued on the context and drained by `batch_execute` in one pass
//! over the column.

use crate::bql::types::SelectOperator;
use crate::catalog::{Catalog, Column, ColumnIndex};
use crate::context::{ClientContext, GenCol, PendingScan, ResultColumn, ResultPayload};
use crate::error::{BasaltError, BasaltResult};

/// Executes (or queues) one select.
pub fn select(
    catalog: &mut Catalog,
    ctx: &mut ClientContext,
    op: SelectOperator,
) -> BasaltResult<()> {
    if ctx.batch_active() {
        // only plain base-column scans are batchable
        let column = match (&op.filter, &op.target) {
            (None, GenCol::Base(cref)) => cref.clone(),
            _ => {
                return Err(BasaltError::InvariantViolation {
                    reason: "only base-column selects may join a batch".to_string(),
                })
            }
        };
        catalog.column(&column)?; // fail fast on unknown columns
        return ctx.queue_scan(PendingScan {
            handle: op.handle,
            column,
            low: op.low,
            high: op.high,
        });
    }

    let positions = match (&op.filter, &op.target) {
        (None, GenCol::Base(cref)) => {
            let col = catalog.column(cref)?;
            select_from_column(col, op.low, op.high)
        }
        (Some(pos_handle), GenCol::Derived(val_handle)) => {
            select_from_selection(ctx, pos_handle, val_handle, op.low, op.high)?
        }
        _ => {
            return Err(BasaltError::QueryUnsupported {
                reason: "select needs a base column or a (positions, values) pair".to_string(),
            })
        }
    };
    ctx.bind(&op.handle, ResultColumn::positions(positions))
}

/// Base-column selection, delegating to the column's index when present.
fn select_from_column(col: &Column, low: i64, high: i64) -> Vec<usize> {
    match &col.index {
        Some(ColumnIndex::Sorted(idx)) => idx.get_range(&col.data, low, high),
        Some(ColumnIndex::BTree(tree)) => {
            if tree.is_clustered() {
                tree.range_clustered(low, high)
            } else {
                tree.range_unclustered(low, high)
            }
        }
        None => scan_positions(&col.data, low, high),
    }
}

/// Single unindexed pass: `low <= v < high`.
fn scan_positions(data: &[i32], low: i64, high: i64) -> Vec<usize> {
    let mut positions = Vec::with_capacity(data.len());
    for (idx, &v) in data.iter().enumerate() {
        if (v as i64) >= low && (v as i64) < high {
            positions.push(idx);
        }
    }
    positions.shrink_to_fit();
    positions
}

/// Positional restriction: keep `positions[i]` where `values[i]` is in
/// range. Both inputs must have identical length.
fn select_from_selection(
    ctx: &ClientContext,
    pos_handle: &str,
    val_handle: &str,
    low: i64,
    high: i64,
) -> BasaltResult<Vec<usize>> {
    let positions = ctx
        .result(pos_handle)?
        .as_positions()
        .ok_or_else(|| BasaltError::QueryUnsupported {
            reason: format!("'{}' is not a position vector", pos_handle),
        })?;
    let values = match &ctx.result(val_handle)?.payload {
        ResultPayload::Int32(v) => v,
        _ => {
            return Err(BasaltError::QueryUnsupported {
                reason: format!("'{}' is not an i32 value vector", val_handle),
            })
        }
    };
    if positions.len() != values.len() {
        return Err(BasaltError::QueryUnsupported {
            reason: format!(
                "positions ({}) and values ({}) differ in length",
                positions.len(),
                values.len()
            ),
        });
    }
    let mut out = Vec::with_capacity(values.len());
    for (idx, &v) in values.iter().enumerate() {
        if (v as i64) >= low && (v as i64) < high {
            out.push(positions[idx]);
        }
    }
    out.shrink_to_fit();
    Ok(out)
}

/// Drains the open batch: one pass over the shared base column feeding
/// every queued comparator, then one handle bound per queued select.
///
/// Values outside the union interval of all comparators are skipped before
/// any per-comparator work; output is identical to running each select
/// individually.
pub fn execute_batch(catalog: &Catalog, ctx: &mut ClientContext) -> BasaltResult<usize> {
    let scans = ctx.batch_take()?;
    if scans.is_empty() {
        return Ok(0);
    }
    if scans.iter().any(|s| s.column != scans[0].column) {
        return Err(BasaltError::InvariantViolation {
            reason: "batched selects target differing columns".to_string(),
        });
    }

    let data = &catalog.column(&scans[0].column)?.data;
    let global_low = scans.iter().map(|s| s.low).min().unwrap_or(i64::MIN);
    let global_high = scans.iter().map(|s| s.high).max().unwrap_or(i64::MAX);

    let mut buffers: Vec<Vec<usize>> = scans
        .iter()
        .map(|_| Vec::with_capacity(data.len()))
        .collect();

    for (idx, &raw) in data.iter().enumerate() {
        let v = raw as i64;
        if v < global_low || v >= global_high {
            continue;
        }
        for (scan, buffer) in scans.iter().zip(buffers.iter_mut()) {
            if v >= scan.low && v < scan.high {
                buffer.push(idx);
            }
        }
    }

    let count = scans.len();
    for (scan, mut buffer) in scans.into_iter().zip(buffers) {
        buffer.shrink_to_fit();
        ctx.bind(&scan.handle, ResultColumn::positions(buffer))?;
    }
    Ok(count)
}
