//! Per-session state: the handle registry and the shared-scan batch buffer.
//!
//! A handle is a name (≤ 64 bytes) bound to a result column. Binding an
//! existing name frees the prior result; all handles die with the session.
//! While a batch is open, select operators over one base column accumulate
//! here instead of executing (see `engine::select`).

pub mod result;

pub use result::{ElementType, ResultColumn, ResultPayload};

use crate::catalog::types::{ColumnRef, MAX_NAME_LEN};
use crate::error::{BasaltError, BasaltResult};
use std::collections::HashMap;

/// A generalized column: either a base column in the catalog or a result
/// bound in the session, resolved by name at use time.
#[derive(Debug, Clone, PartialEq)]
pub enum GenCol {
    Base(ColumnRef),
    Derived(String),
}

/// A select queued during shared-scan batching.
#[derive(Debug, Clone)]
pub struct PendingScan {
    pub handle: String,
    pub column: ColumnRef,
    pub low: i64,
    pub high: i64,
}

/// Session-scoped registry of result columns.
#[derive(Debug, Default)]
pub struct ClientContext {
    handles: HashMap<String, ResultColumn>,
    batch: Option<Vec<PendingScan>>,
}

impl ClientContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a result to a handle, overwriting (and freeing) any prior
    /// binding of the same name.
    pub fn bind(&mut self, handle: &str, result: ResultColumn) -> BasaltResult<()> {
        if handle.is_empty() || handle.len() > MAX_NAME_LEN {
            return Err(BasaltError::IncorrectFormat {
                reason: format!("handle '{}' is empty or longer than {} bytes", handle, MAX_NAME_LEN),
            });
        }
        self.handles.insert(handle.to_string(), result);
        Ok(())
    }

    pub fn result(&self, handle: &str) -> BasaltResult<&ResultColumn> {
        self.handles
            .get(handle)
            .ok_or_else(|| BasaltError::ObjectNotFound {
                name: handle.to_string(),
            })
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.handles.contains_key(handle)
    }

    // -- shared-scan batching -------------------------------------------

    pub fn batch_active(&self) -> bool {
        self.batch.is_some()
    }

    /// Opens the shared-scan accumulator (`batch_queries()`).
    pub fn batch_begin(&mut self) -> BasaltResult<()> {
        if self.batch.is_some() {
            return Err(BasaltError::InvariantViolation {
                reason: "batch_queries() while a batch is already open".to_string(),
            });
        }
        self.batch = Some(Vec::new());
        Ok(())
    }

    /// Queues a select for the open batch. Every queued scan must target
    /// the same base column.
    pub fn queue_scan(&mut self, scan: PendingScan) -> BasaltResult<()> {
        let batch = self
            .batch
            .as_mut()
            .ok_or_else(|| BasaltError::InvariantViolation {
                reason: "select queued with no open batch".to_string(),
            })?;
        if let Some(first) = batch.first() {
            if first.column != scan.column {
                return Err(BasaltError::InvariantViolation {
                    reason: format!(
                        "batched selects must share one column; got {} then {}",
                        first.column, scan.column
                    ),
                });
            }
        }
        batch.push(scan);
        Ok(())
    }

    /// Closes the batch and returns the queued scans (`batch_execute()`).
    pub fn batch_take(&mut self) -> BasaltResult<Vec<PendingScan>> {
        self.batch
            .take()
            .ok_or_else(|| BasaltError::InvariantViolation {
                reason: "batch_execute() with no open batch".to_string(),
            })
    }
}
