//! Basalt - single-node column-oriented analytical database.
//!
//! Data is organised as databases → tables → columns of `i32`. Columns may
//! carry one secondary structure (a page-blocked sorted index or a B+-tree,
//! clustered or unclustered) that selection and insertion keep in lock-step
//! with the base arrays. Queries arrive as text over a Unix-domain socket,
//! are parsed into an operator tree, and run through the execution engines.
//!
//! ## Architecture
//!
//! ```text
//! client ──socket──▶ net (framing, serial accept loop)
//!                      │
//!                      ▼
//!                    bql (parser: text → Operator)
//!                      │
//!                      ▼
//!                    engine (dispatch → select/fetch/aggregate/join/insert)
//!                    │            │
//!                    ▼            ▼
//!                  catalog      context (session handles → result columns)
//!                  (columns)
//!                    │
//!                    ▼
//!                  index (sorted / B+-tree / extendible hash)
//! ```
//!
//! ## Modules
//!
//! - **catalog**: databases, tables, dense `i32` column arrays
//! - **index**: sorted index, B+-tree, extendible hash table
//! - **context**: typed result columns and the per-session handle registry
//! - **engine**: selection, fetch, aggregates, joins, insert coordinator,
//!   operator dispatch
//! - **bql**: the Basalt query language parser
//! - **net**: wire framing and the serve loop
//! - **persist**: catalog/column/index files and the CSV bulk loader
//! - **metrics**: lightweight performance monitoring

pub mod bql;
pub mod catalog;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod index;
pub mod metrics;
pub mod net;
pub mod persist;

/// Page size (bytes) governing index fan-out and scan block sizes.
pub const PAGE_SIZE: usize = 4096;

// Re-export commonly used types
pub use catalog::{Catalog, Column, Database, Table};
pub use config::ServerConfig;
pub use context::{ClientContext, GenCol, ResultColumn};
pub use engine::{Response, Session};
pub use error::{BasaltError, BasaltResult};
pub use index::{BPlusTree, ExtendibleHashTable, SortedIndex};
