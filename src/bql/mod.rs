//! BQL, the Basalt query language.
//!
//! Hand-written single-pass parser, no parser library. One line of client
//! text maps to at most one [`Operator`]; comment and blank lines map to
//! none.
//!
//! ## Grammar
//!
//! ```text
//! command  := [handles "="] verb "(" args ")"
//!           | "batch_queries()" | "batch_execute()" | "shutdown"
//! handles  := handle | handle "," handle
//! verb     := create | relational_insert | load | select | fetch
//!           | sum | avg | min | max | add | sub | join | print
//! ```
//!
//! Names are `[A-Za-z_][A-Za-z0-9_]*`, at most 64 bytes. A dotted name
//! (`db.tbl.col`) addresses the catalog; a bare name addresses a session
//! handle. `null` range endpoints mean an open bound.

pub mod parser;
pub mod types;


pub use parser::parse;
pub use types::{AggKind, ArithKind, JoinMethod, Operator, SelectOperator};
