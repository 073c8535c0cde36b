//! Query execution: one entry point per operator kind.
//!
//! [`execute`] maps a parsed [`Operator`] onto the engines and owns the
//! operator for its lifetime. Engines read base columns from the catalog
//! and session results from the client context, and register their outputs
//! back into the context. [`Session`] bundles a catalog with one context,
//! the shape the server and the tests drive.

pub mod aggregate;
pub mod fetch;
pub mod insert;
pub mod join;
pub mod select;

#[cfg(test)]
mod engine_test;

use crate::bql::types::Operator;
use crate::catalog::Catalog;
use crate::context::{ClientContext, GenCol, ResultColumn, ResultPayload};
use crate::error::{BasaltError, BasaltResult};
use crate::metrics::{Metric, MetricUnit, MetricsCollector};
use crate::persist;
use std::fmt::Write as _;
use std::time::Instant;

/// What the executor hands back to the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Operator finished; payload is a short status message (may be empty).
    Done(String),
    /// Print output, streamed to the client in chunks.
    Print(String),
    /// The client asked the server to stop.
    Shutdown,
}

/// A catalog plus one session's context: the unit the server serves and
/// the tests script against.
#[derive(Debug, Default)]
pub struct Session {
    pub catalog: Catalog,
    pub context: ClientContext,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_catalog(catalog: Catalog) -> Self {
        Self {
            catalog,
            context: ClientContext::new(),
        }
    }

    /// Drops all session state (handles, open batch) between clients.
    pub fn reset_context(&mut self) {
        self.context = ClientContext::new();
    }

    /// Parses and executes one line.
    pub fn run(&mut self, line: &str) -> BasaltResult<Response> {
        match crate::bql::parse(line)? {
            None => Ok(Response::Done(String::new())),
            Some(op) => execute(&mut self.catalog, &mut self.context, op),
        }
    }
}

/// Executes one operator, recording its duration.
pub fn execute(
    catalog: &mut Catalog,
    ctx: &mut ClientContext,
    op: Operator,
) -> BasaltResult<Response> {
    let started = Instant::now();
    let name = op_name(&op);
    let result = dispatch(catalog, ctx, op);
    MetricsCollector::global().record(
        Metric::new(
            "query_duration_us",
            started.elapsed().as_micros() as f64,
            MetricUnit::Microseconds,
        )
        .with_tag("operator", name),
    );
    result
}

fn op_name(op: &Operator) -> &'static str {
    match op {
        Operator::CreateDb { .. } => "create_db",
        Operator::CreateTable { .. } => "create_tbl",
        Operator::CreateColumn { .. } => "create_col",
        Operator::CreateIndex { .. } => "create_idx",
        Operator::Insert { .. } => "insert",
        Operator::Load { .. } => "load",
        Operator::Select(_) => "select",
        Operator::Fetch { .. } => "fetch",
        Operator::Aggregate { .. } => "aggregate",
        Operator::MinMaxIndexed { .. } => "min_max_indexed",
        Operator::Arith { .. } => "arith",
        Operator::Join { .. } => "join",
        Operator::Print { .. } => "print",
        Operator::BatchBegin => "batch_queries",
        Operator::BatchExecute => "batch_execute",
        Operator::Shutdown => "shutdown",
    }
}

fn dispatch(
    catalog: &mut Catalog,
    ctx: &mut ClientContext,
    op: Operator,
) -> BasaltResult<Response> {
    match op {
        Operator::CreateDb { name } => {
            catalog.create_db(&name)?;
            Ok(Response::Done(format!("Created database '{}'.", name)))
        }
        Operator::CreateTable {
            db,
            name,
            column_count,
        } => {
            catalog.create_table(&db, &name, column_count)?;
            Ok(Response::Done(format!("Created table '{}.{}'.", db, name)))
        }
        Operator::CreateColumn { table, name, index } => {
            catalog.create_column(&table, &name, index)?;
            Ok(Response::Done(format!("Created column '{}.{}'.", table, name)))
        }
        Operator::CreateIndex { column, spec } => {
            catalog.create_index(&column, spec)?;
            Ok(Response::Done(format!("Created index on '{}'.", column)))
        }
        Operator::Insert { table, values } => {
            insert::insert_row(catalog, &table, &values)?;
            Ok(Response::Done("1 row inserted.".to_string()))
        }
        Operator::Load { path } => {
            let rows = persist::loader::load_csv(catalog, &path)?;
            Ok(Response::Done(format!("Loaded {} rows.", rows)))
        }
        Operator::Select(op) => {
            select::select(catalog, ctx, op)?;
            Ok(Response::Done(String::new()))
        }
        Operator::BatchBegin => {
            ctx.batch_begin()?;
            Ok(Response::Done(String::new()))
        }
        Operator::BatchExecute => {
            select::execute_batch(catalog, ctx)?;
            Ok(Response::Done(String::new()))
        }
        Operator::Fetch {
            handle,
            column,
            positions,
        } => {
            fetch::fetch(catalog, ctx, &handle, &column, &positions)?;
            Ok(Response::Done(String::new()))
        }
        Operator::Aggregate {
            handle,
            kind,
            input,
        } => {
            aggregate::aggregate(catalog, ctx, &handle, kind, &input)?;
            Ok(Response::Done(String::new()))
        }
        Operator::MinMaxIndexed {
            pos_handle,
            val_handle,
            kind,
            positions,
            values,
        } => {
            aggregate::min_max_indexed(
                catalog,
                ctx,
                &pos_handle,
                &val_handle,
                kind,
                positions.as_ref(),
                &values,
            )?;
            Ok(Response::Done(String::new()))
        }
        Operator::Arith {
            handle,
            kind,
            left,
            right,
        } => {
            aggregate::arith(catalog, ctx, &handle, kind, &left, &right)?;
            Ok(Response::Done(String::new()))
        }
        Operator::Join {
            left_handle,
            right_handle,
            method,
            left_values,
            left_positions,
            right_values,
            right_positions,
        } => {
            join::join(
                catalog,
                ctx,
                &left_handle,
                &right_handle,
                method,
                (&left_values, &left_positions),
                (&right_values, &right_positions),
            )?;
            Ok(Response::Done(String::new()))
        }
        Operator::Print { items } => Ok(Response::Print(format_print(catalog, ctx, &items)?)),
        Operator::Shutdown => Ok(Response::Shutdown),
    }
}

/// A read-only, typed view over a generalized column.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ColumnView<'a> {
    Int32(&'a [i32]),
    Int64(&'a [i64]),
    Float64(&'a [f64]),
    Positions(&'a [usize]),
}

impl ColumnView<'_> {
    pub fn len(&self) -> usize {
        match self {
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::Positions(v) => v.len(),
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float64(_))
    }

    pub fn value_i64(&self, idx: usize) -> i64 {
        match self {
            Self::Int32(v) => v[idx] as i64,
            Self::Int64(v) => v[idx],
            Self::Float64(v) => v[idx] as i64,
            Self::Positions(v) => v[idx] as i64,
        }
    }

    pub fn value_f64(&self, idx: usize) -> f64 {
        match self {
            Self::Int32(v) => v[idx] as f64,
            Self::Int64(v) => v[idx] as f64,
            Self::Float64(v) => v[idx],
            Self::Positions(v) => v[idx] as f64,
        }
    }
}

/// Resolves a generalized column to a typed view: dotted names read base
/// columns from the catalog, bare names read session results.
pub(crate) fn resolve_view<'a>(
    catalog: &'a Catalog,
    ctx: &'a ClientContext,
    gcol: &GenCol,
) -> BasaltResult<ColumnView<'a>> {
    match gcol {
        GenCol::Base(cref) => Ok(ColumnView::Int32(&catalog.column(cref)?.data)),
        GenCol::Derived(handle) => Ok(match &ctx.result(handle)?.payload {
            ResultPayload::Int32(v) => ColumnView::Int32(v),
            ResultPayload::Int64(v) => ColumnView::Int64(v),
            ResultPayload::Float64(v) => ColumnView::Float64(v),
            ResultPayload::Positions(v) => ColumnView::Positions(v),
        }),
    }
}

/// Builds the `print` payload: one comma-joined row per tuple, newline
/// separated. All printed columns must share a length.
fn format_print(
    catalog: &Catalog,
    ctx: &ClientContext,
    items: &[GenCol],
) -> BasaltResult<String> {
    enum Item<'a> {
        Base(&'a [i32]),
        Result(&'a ResultColumn),
    }

    let mut resolved = Vec::with_capacity(items.len());
    for gcol in items {
        resolved.push(match gcol {
            GenCol::Base(cref) => Item::Base(&catalog.column(cref)?.data),
            GenCol::Derived(handle) => Item::Result(ctx.result(handle)?),
        });
    }

    let rows = match resolved.first() {
        Some(Item::Base(d)) => d.len(),
        Some(Item::Result(r)) => r.len(),
        None => 0,
    };
    for item in &resolved {
        let len = match item {
            Item::Base(d) => d.len(),
            Item::Result(r) => r.len(),
        };
        if len != rows {
            return Err(BasaltError::QueryUnsupported {
                reason: "cannot print columns of differing lengths".to_string(),
            });
        }
    }

    let mut out = String::with_capacity(rows * resolved.len() * 4);
    for row in 0..rows {
        for (i, item) in resolved.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            match item {
                Item::Base(d) => {
                    let _ = write!(out, "{}", d[row]);
                }
                Item::Result(r) => r.write_value(row, &mut out),
            }
        }
        out.push('\n');
    }
    Ok(out)
}
