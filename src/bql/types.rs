//! Operator tree produced by the parser and consumed by the executor.

use crate::catalog::types::{ColumnRef, IndexSpec, TableRef};
use crate::context::GenCol;

/// Aggregate verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggKind {
    Sum,
    Avg,
    Min,
    Max,
}

/// Elementwise arithmetic verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithKind {
    Add,
    Sub,
}

/// Join algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMethod {
    Hash,
    NestedLoop,
}

/// A select: either a range over a base column, or a positional
/// restriction of a prior fetch (`filter` holds the companion position
/// handle and `target` the value handle).
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOperator {
    pub handle: String,
    pub filter: Option<String>,
    pub target: GenCol,
    pub low: i64,
    pub high: i64,
}

/// One parsed query.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    CreateDb {
        name: String,
    },
    CreateTable {
        db: String,
        name: String,
        column_count: usize,
    },
    CreateColumn {
        table: TableRef,
        name: String,
        index: Option<IndexSpec>,
    },
    CreateIndex {
        column: ColumnRef,
        spec: IndexSpec,
    },
    Insert {
        table: TableRef,
        values: Vec<i32>,
    },
    Load {
        path: String,
    },
    Select(SelectOperator),
    Fetch {
        handle: String,
        column: ColumnRef,
        positions: String,
    },
    /// sum/avg and the one-handle min/max forms.
    Aggregate {
        handle: String,
        kind: AggKind,
        input: GenCol,
    },
    /// Two-handle min/max: binds every argmin/argmax `(position, value)`.
    MinMaxIndexed {
        pos_handle: String,
        val_handle: String,
        kind: AggKind,
        positions: Option<GenCol>,
        values: GenCol,
    },
    Arith {
        handle: String,
        kind: ArithKind,
        left: GenCol,
        right: GenCol,
    },
    Join {
        left_handle: String,
        right_handle: String,
        method: JoinMethod,
        left_values: GenCol,
        left_positions: GenCol,
        right_values: GenCol,
        right_positions: GenCol,
    },
    Print {
        items: Vec<GenCol>,
    },
    BatchBegin,
    BatchExecute,
    Shutdown,
}
