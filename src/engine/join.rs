//! Equality joins over matched `(positions, values)` pairs.
//!
//! Both variants produce two aligned position results: row `k` of the pair
//! is one match `(left_pos[k], right_pos[k])`. The hash join radix-
//! partitions both inputs, builds an extendible hash table over the smaller
//! side of each partition and probes with the other, freeing each table
//! before the next partition so peak memory is one partition plus the
//! output buffers. The nested-loop join iterates page-sized blocks.

use crate::bql::types::JoinMethod;
use crate::catalog::Catalog;
use crate::context::{ClientContext, GenCol, ResultColumn, ResultPayload};
use crate::error::{BasaltError, BasaltResult};
use crate::index::hash::{mix, ExtendibleHashTable};
use crate::PAGE_SIZE;

/// Partition fan-out of the hash join.
pub const NUM_PARTITIONS: usize = 256;

/// Keys per block in the nested-loop join (one page of `i32`).
const BLOCK_KEYS: usize = PAGE_SIZE / std::mem::size_of::<i32>();

/// One side of a join: values aligned with base positions.
#[derive(Debug, Clone, Copy)]
pub struct JoinInput<'a> {
    pub values: &'a [i32],
    pub positions: &'a [usize],
}

/// Executes a join operator and binds both output handles.
pub fn join(
    catalog: &Catalog,
    ctx: &mut ClientContext,
    left_handle: &str,
    right_handle: &str,
    method: JoinMethod,
    left: (&GenCol, &GenCol),
    right: (&GenCol, &GenCol),
) -> BasaltResult<()> {
    let (left_in, right_in) = (
        resolve_input(catalog, ctx, left.0, left.1)?,
        resolve_input(catalog, ctx, right.0, right.1)?,
    );

    let (left_out, right_out) = match method {
        JoinMethod::Hash => hash_join(left_in, right_in)?,
        JoinMethod::NestedLoop => nested_loop_join(left_in, right_in),
    };

    ctx.bind(left_handle, ResultColumn::positions(left_out))?;
    ctx.bind(right_handle, ResultColumn::positions(right_out))
}

fn resolve_input<'a>(
    catalog: &'a Catalog,
    ctx: &'a ClientContext,
    values: &GenCol,
    positions: &GenCol,
) -> BasaltResult<JoinInput<'a>> {
    let values = match values {
        GenCol::Base(cref) => catalog.column(cref)?.data.as_slice(),
        GenCol::Derived(handle) => match &ctx.result(handle)?.payload {
            ResultPayload::Int32(v) => v.as_slice(),
            _ => {
                return Err(BasaltError::QueryUnsupported {
                    reason: format!("join values '{}' must be i32", handle),
                })
            }
        },
    };
    let positions = match positions {
        GenCol::Derived(handle) => ctx.result(handle)?.as_positions().ok_or_else(|| {
            BasaltError::QueryUnsupported {
                reason: format!("join positions '{}' must be a position vector", handle),
            }
        })?,
        GenCol::Base(_) => {
            return Err(BasaltError::QueryUnsupported {
                reason: "join positions must come from a select".to_string(),
            })
        }
    };
    if values.len() != positions.len() {
        return Err(BasaltError::QueryUnsupported {
            reason: format!(
                "join side has {} values but {} positions",
                values.len(),
                positions.len()
            ),
        });
    }
    Ok(JoinInput { values, positions })
}

#[derive(Debug, Default)]
struct Partition {
    left_keys: Vec<i32>,
    left_pos: Vec<usize>,
    right_keys: Vec<i32>,
    right_pos: Vec<usize>,
}

/// Grace-style partitioned hash join.
pub fn hash_join(
    left: JoinInput<'_>,
    right: JoinInput<'_>,
) -> BasaltResult<(Vec<usize>, Vec<usize>)> {
    let mut partitions: Vec<Partition> = (0..NUM_PARTITIONS).map(|_| Partition::default()).collect();

    for (&key, &pos) in left.values.iter().zip(left.positions) {
        let p = &mut partitions[mix(key as u32) as usize % NUM_PARTITIONS];
        p.left_keys.push(key);
        p.left_pos.push(pos);
    }
    for (&key, &pos) in right.values.iter().zip(right.positions) {
        let p = &mut partitions[mix(key as u32) as usize % NUM_PARTITIONS];
        p.right_keys.push(key);
        p.right_pos.push(pos);
    }

    let mut left_out = Vec::new();
    let mut right_out = Vec::new();
    for partition in partitions {
        join_partition(partition, &mut left_out, &mut right_out)?;
        // partition buffers and the build table drop here, capping memory
        // at one partition beyond the output
    }
    Ok((left_out, right_out))
}

/// Builds the smaller side of one partition into an extendible hash table
/// and probes it with the whole other side.
fn join_partition(
    partition: Partition,
    left_out: &mut Vec<usize>,
    right_out: &mut Vec<usize>,
) -> BasaltResult<()> {
    if partition.left_keys.is_empty() || partition.right_keys.is_empty() {
        return Ok(());
    }

    let left_is_build = partition.left_keys.len() <= partition.right_keys.len();
    let (build_keys, build_pos, probe_keys, probe_pos) = if left_is_build {
        (
            &partition.left_keys,
            &partition.left_pos,
            &partition.right_keys,
            &partition.right_pos,
        )
    } else {
        (
            &partition.right_keys,
            &partition.right_pos,
            &partition.left_keys,
            &partition.left_pos,
        )
    };

    let mut table = ExtendibleHashTable::new();
    for (&key, &pos) in build_keys.iter().zip(build_pos) {
        table.put(key, pos)?;
    }

    for (&key, &pos) in probe_keys.iter().zip(probe_pos) {
        for matched in table.get(key) {
            if left_is_build {
                left_out.push(matched);
                right_out.push(pos);
            } else {
                left_out.push(pos);
                right_out.push(matched);
            }
        }
    }
    Ok(())
}

/// Page-blocked nested-loop join.
pub fn nested_loop_join(
    left: JoinInput<'_>,
    right: JoinInput<'_>,
) -> (Vec<usize>, Vec<usize>) {
    let mut left_out = Vec::with_capacity(PAGE_SIZE);
    let mut right_out = Vec::with_capacity(PAGE_SIZE);

    for left_block in (0..left.values.len()).step_by(BLOCK_KEYS) {
        let left_end = (left_block + BLOCK_KEYS).min(left.values.len());
        for right_block in (0..right.values.len()).step_by(BLOCK_KEYS) {
            let right_end = (right_block + BLOCK_KEYS).min(right.values.len());
            for l in left_block..left_end {
                for r in right_block..right_end {
                    if left.values[l] == right.values[r] {
                        left_out.push(left.positions[l]);
                        right_out.push(right.positions[r]);
                    }
                }
            }
        }
    }

    left_out.shrink_to_fit();
    right_out.shrink_to_fit();
    (left_out, right_out)
}
