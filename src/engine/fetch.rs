//! Fetch: gather `column[positions]` into a new value result.

use crate::catalog::types::ColumnRef;
use crate::catalog::Catalog;
use crate::context::{ClientContext, ResultColumn};
use crate::error::{BasaltError, BasaltResult};

/// Produces an `i32` result the same length as the position vector, with
/// entry `i` equal to `column[positions[i]]`.
pub fn fetch(
    catalog: &Catalog,
    ctx: &mut ClientContext,
    handle: &str,
    column: &ColumnRef,
    pos_handle: &str,
) -> BasaltResult<()> {
    let data = &catalog.column(column)?.data;
    let positions = ctx
        .result(pos_handle)?
        .as_positions()
        .ok_or_else(|| BasaltError::QueryUnsupported {
            reason: format!("'{}' is not a position vector", pos_handle),
        })?;

    let mut values = Vec::with_capacity(positions.len());
    for &pos in positions {
        let v = data.get(pos).ok_or_else(|| BasaltError::InvariantViolation {
            reason: format!(
                "position {} outside column '{}' of length {}",
                pos,
                column,
                data.len()
            ),
        })?;
        values.push(*v);
    }
    ctx.bind(handle, ResultColumn::int32(values))
}
