//! Error types for Basalt operations.
//!
//! One enum covers the whole failure taxonomy; every variant carries the
//! context needed to build a useful client-facing message. The wire status
//! word is derived from these in `net::protocol`.

use std::fmt;

/// Standard Result type for all Basalt operations.
pub type BasaltResult<T> = Result<T, BasaltError>;

/// Error types for Basalt operations.
#[derive(Debug, Clone, PartialEq)]
pub enum BasaltError {
    /// Query verb not recognised.
    UnknownCommand { command: String },

    /// Query recognised but malformed (wrong arity, bad literal, bad name).
    IncorrectFormat { reason: String },

    /// Database, table, column or handle lookup failed.
    ObjectNotFound { name: String },

    /// Database or table with this name already exists.
    ObjectAlreadyExists { name: String },

    /// Column already carries an index.
    IndexAlreadyExists { table: String, column: String },

    /// Query is well-formed but not executable (length mismatch, bad types).
    QueryUnsupported { reason: String },

    /// Load file does not exist.
    FileNotFound { path: String },

    /// Load or catalog file exists but cannot be decoded.
    IncorrectFileFormat { reason: String },

    /// Allocation failed while growing a table.
    MemAllocFailed,

    /// Operation failed during execution.
    ExecutionError { reason: String },

    /// An internal structural invariant was broken.
    InvariantViolation { reason: String },

    /// I/O error during file or socket operations.
    IoError { operation: String, reason: String },
}

impl fmt::Display for BasaltError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand { command } => {
                write!(f, "Unknown command: '{}'", command)
            }
            Self::IncorrectFormat { reason } => {
                write!(f, "Incorrect format: {}", reason)
            }
            Self::ObjectNotFound { name } => {
                write!(f, "Object '{}' not found", name)
            }
            Self::ObjectAlreadyExists { name } => {
                write!(f, "Object '{}' already exists", name)
            }
            Self::IndexAlreadyExists { table, column } => {
                write!(f, "Column '{}.{}' already has an index", table, column)
            }
            Self::QueryUnsupported { reason } => {
                write!(f, "Query unsupported: {}", reason)
            }
            Self::FileNotFound { path } => {
                write!(f, "File '{}' not found", path)
            }
            Self::IncorrectFileFormat { reason } => {
                write!(f, "Incorrect file format: {}", reason)
            }
            Self::MemAllocFailed => {
                write!(f, "Memory allocation failed")
            }
            Self::ExecutionError { reason } => {
                write!(f, "Execution error: {}", reason)
            }
            Self::InvariantViolation { reason } => {
                write!(f, "Invariant violation: {}", reason)
            }
            Self::IoError { operation, reason } => {
                write!(f, "I/O error during '{}': {}", operation, reason)
            }
        }
    }
}

impl std::error::Error for BasaltError {}

impl From<std::io::Error> for BasaltError {
    fn from(err: std::io::Error) -> Self {
        BasaltError::IoError {
            operation: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}
