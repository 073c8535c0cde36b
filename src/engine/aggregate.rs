//! Aggregates and pairwise arithmetic.
//!
//! `sum` yields `i64`, `avg` yields `f64`; both yield an empty vector over
//! empty input rather than zero or NaN. `min`/`max` come in a scalar shape
//! and an indexed shape returning every `(position, value)` that attains
//! the extremum. `add`/`sub` are elementwise with `f64` output when either
//! side is `f64`, otherwise `i64`.

use crate::bql::types::{AggKind, ArithKind};
use crate::catalog::Catalog;
use crate::context::{ClientContext, GenCol, ResultColumn};
use crate::engine::{resolve_view, ColumnView};
use crate::error::{BasaltError, BasaltResult};

/// sum/avg and the scalar min/max forms.
pub fn aggregate(
    catalog: &Catalog,
    ctx: &mut ClientContext,
    handle: &str,
    kind: AggKind,
    input: &GenCol,
) -> BasaltResult<()> {
    let view = resolve_view(catalog, ctx, input)?;
    let n = view.len();

    let result = match kind {
        AggKind::Sum => {
            if n == 0 {
                ResultColumn::int64(Vec::new())
            } else if view.is_float() {
                let total: f64 = (0..n).map(|i| view.value_f64(i)).sum();
                ResultColumn::int64(vec![total as i64])
            } else {
                let total: i64 = (0..n).map(|i| view.value_i64(i)).sum();
                ResultColumn::int64(vec![total])
            }
        }
        AggKind::Avg => {
            if n == 0 {
                ResultColumn::float64(Vec::new())
            } else {
                let total: f64 = if view.is_float() {
                    (0..n).map(|i| view.value_f64(i)).sum()
                } else {
                    (0..n).map(|i| view.value_i64(i)).sum::<i64>() as f64
                };
                ResultColumn::float64(vec![total / n as f64])
            }
        }
        AggKind::Min | AggKind::Max => scalar_bound(&view, kind),
    };
    ctx.bind(handle, result)
}

/// Length-1 extremum of the input's own element type (empty in, empty out).
fn scalar_bound(view: &ColumnView<'_>, kind: AggKind) -> ResultColumn {
    let take_max = kind == AggKind::Max;
    match view {
        ColumnView::Int32(v) => ResultColumn::int32(extremum(v, take_max)),
        ColumnView::Int64(v) => ResultColumn::int64(extremum(v, take_max)),
        ColumnView::Float64(v) => ResultColumn::float64(extremum(v, take_max)),
        // positions aggregate as plain integers
        ColumnView::Positions(v) => {
            let as_i64: Vec<i64> = v.iter().map(|&p| p as i64).collect();
            ResultColumn::int64(extremum(&as_i64, take_max))
        }
    }
}

fn extremum<T: PartialOrd + Copy>(values: &[T], take_max: bool) -> Vec<T> {
    let mut iter = values.iter().copied();
    let Some(first) = iter.next() else {
        return Vec::new();
    };
    let best = iter.fold(first, |best, v| {
        if (take_max && v > best) || (!take_max && v < best) {
            v
        } else {
            best
        }
    });
    vec![best]
}

/// Indexed min/max: binds a position result and a value result holding
/// every `(position, value)` tuple attaining the extremum, in first-seen
/// order. Both accumulators are seeded from element 0; a strictly better
/// value resets them.
pub fn min_max_indexed(
    catalog: &Catalog,
    ctx: &mut ClientContext,
    pos_handle: &str,
    val_handle: &str,
    kind: AggKind,
    positions: Option<&GenCol>,
    values: &GenCol,
) -> BasaltResult<()> {
    if !matches!(kind, AggKind::Min | AggKind::Max) {
        return Err(BasaltError::QueryUnsupported {
            reason: "indexed form exists only for min and max".to_string(),
        });
    }
    let take_max = kind == AggKind::Max;
    let value_view = resolve_view(catalog, ctx, values)?;

    let position_source: Option<&[usize]> = match positions {
        None => None,
        Some(gcol) => match resolve_view(catalog, ctx, gcol)? {
            ColumnView::Positions(p) => Some(p),
            _ => {
                return Err(BasaltError::QueryUnsupported {
                    reason: "indexed min/max needs a position vector".to_string(),
                })
            }
        },
    };
    if let Some(p) = position_source {
        if p.len() != value_view.len() {
            return Err(BasaltError::QueryUnsupported {
                reason: format!(
                    "positions ({}) and values ({}) differ in length",
                    p.len(),
                    value_view.len()
                ),
            });
        }
    }

    let (out_positions, out_values) = match value_view {
        ColumnView::Int32(v) => {
            let (p, vals) = arg_extremes(v, position_source, take_max);
            (p, ResultColumn::int32(vals))
        }
        ColumnView::Int64(v) => {
            let (p, vals) = arg_extremes(v, position_source, take_max);
            (p, ResultColumn::int64(vals))
        }
        ColumnView::Float64(v) => {
            let (p, vals) = arg_extremes(v, position_source, take_max);
            (p, ResultColumn::float64(vals))
        }
        ColumnView::Positions(v) => {
            let as_i64: Vec<i64> = v.iter().map(|&x| x as i64).collect();
            let (p, vals) = arg_extremes(&as_i64, position_source, take_max);
            (p, ResultColumn::int64(vals))
        }
    };
    ctx.bind(pos_handle, ResultColumn::positions(out_positions))?;
    ctx.bind(val_handle, out_values)
}

/// Every `(position, value)` attaining the extremum, ties in first-seen
/// order. With no explicit position vector the element index stands in.
fn arg_extremes<T: PartialOrd + Copy>(
    values: &[T],
    positions: Option<&[usize]>,
    take_max: bool,
) -> (Vec<usize>, Vec<T>) {
    let mut out_pos = Vec::new();
    let mut out_val = Vec::new();
    let Some(&first) = values.first() else {
        return (out_pos, out_val);
    };
    let pos_of = |i: usize| positions.map_or(i, |p| p[i]);

    let mut best = first;
    out_pos.push(pos_of(0));
    out_val.push(first);

    for (i, &v) in values.iter().enumerate().skip(1) {
        let better = if take_max { v > best } else { v < best };
        if better {
            best = v;
            out_pos.clear();
            out_val.clear();
        }
        if v == best {
            out_pos.push(pos_of(i));
            out_val.push(v);
        }
    }
    (out_pos, out_val)
}

/// Elementwise add/sub over two equal-length vectors.
pub fn arith(
    catalog: &Catalog,
    ctx: &mut ClientContext,
    handle: &str,
    kind: ArithKind,
    left: &GenCol,
    right: &GenCol,
) -> BasaltResult<()> {
    let lhs = resolve_view(catalog, ctx, left)?;
    let rhs = resolve_view(catalog, ctx, right)?;
    if lhs.len() != rhs.len() {
        return Err(BasaltError::QueryUnsupported {
            reason: format!(
                "cannot combine vectors of lengths {} and {}",
                lhs.len(),
                rhs.len()
            ),
        });
    }

    let n = lhs.len();
    let result = if lhs.is_float() || rhs.is_float() {
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let (a, b) = (lhs.value_f64(i), rhs.value_f64(i));
            out.push(match kind {
                ArithKind::Add => a + b,
                ArithKind::Sub => a - b,
            });
        }
        ResultColumn::float64(out)
    } else {
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let (a, b) = (lhs.value_i64(i), rhs.value_i64(i));
            out.push(match kind {
                ArithKind::Add => a + b,
                ArithKind::Sub => a - b,
            });
        }
        ResultColumn::int64(out)
    };
    ctx.bind(handle, result)
}
