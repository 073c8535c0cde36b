//! Wire framing and status codes.
//!
//! A frame is a little-endian header `{status: u32, length: u32}` followed
//! by `length` bytes of UTF-8 payload. Requests carry the query text with
//! status 0; responses carry a status from [`Status`] and either a message
//! or a print chunk. Print output streams as `OkWaitForResponse` frames
//! terminated by one `OkDone` frame.

use crate::error::{BasaltError, BasaltResult};
use std::io::{ErrorKind, Read, Write};

/// Upper bound on a frame payload; anything larger is a corrupt header.
pub const MAX_FRAME_LEN: usize = 1 << 26;

/// Status word of a response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Status {
    OkDone = 0,
    OkWaitForResponse = 1,
    ShutdownServer = 2,
    UnknownCommand = 3,
    IncorrectFormat = 4,
    IncorrectFileFormat = 5,
    FileNotFound = 6,
    QueryUnsupported = 7,
    ObjectAlreadyExists = 8,
    ObjectNotFound = 9,
    IndexAlreadyExists = 10,
    MemAllocFailed = 11,
    ExecutionError = 12,
    InvariantViolation = 13,
}

impl Status {
    pub fn from_u32(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::OkDone,
            1 => Self::OkWaitForResponse,
            2 => Self::ShutdownServer,
            3 => Self::UnknownCommand,
            4 => Self::IncorrectFormat,
            5 => Self::IncorrectFileFormat,
            6 => Self::FileNotFound,
            7 => Self::QueryUnsupported,
            8 => Self::ObjectAlreadyExists,
            9 => Self::ObjectNotFound,
            10 => Self::IndexAlreadyExists,
            11 => Self::MemAllocFailed,
            12 => Self::ExecutionError,
            13 => Self::InvariantViolation,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OkDone => "OK_DONE",
            Self::OkWaitForResponse => "OK_WAIT_FOR_RESPONSE",
            Self::ShutdownServer => "SHUTDOWN_SERVER",
            Self::UnknownCommand => "UNKNOWN_COMMAND",
            Self::IncorrectFormat => "INCORRECT_FORMAT",
            Self::IncorrectFileFormat => "INCORRECT_FILE_FORMAT",
            Self::FileNotFound => "FILE_NOT_FOUND",
            Self::QueryUnsupported => "QUERY_UNSUPPORTED",
            Self::ObjectAlreadyExists => "OBJECT_ALREADY_EXISTS",
            Self::ObjectNotFound => "OBJECT_NOT_FOUND",
            Self::IndexAlreadyExists => "INDEX_ALREADY_EXISTS",
            Self::MemAllocFailed => "MEM_ALLOC_FAILED",
            Self::ExecutionError => "EXECUTION_ERROR",
            Self::InvariantViolation => "INVARIANT_VIOLATION",
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            Self::OkDone | Self::OkWaitForResponse | Self::ShutdownServer
        )
    }
}

impl From<&BasaltError> for Status {
    fn from(err: &BasaltError) -> Self {
        match err {
            BasaltError::UnknownCommand { .. } => Self::UnknownCommand,
            BasaltError::IncorrectFormat { .. } => Self::IncorrectFormat,
            BasaltError::ObjectNotFound { .. } => Self::ObjectNotFound,
            BasaltError::ObjectAlreadyExists { .. } => Self::ObjectAlreadyExists,
            BasaltError::IndexAlreadyExists { .. } => Self::IndexAlreadyExists,
            BasaltError::QueryUnsupported { .. } => Self::QueryUnsupported,
            BasaltError::FileNotFound { .. } => Self::FileNotFound,
            BasaltError::IncorrectFileFormat { .. } => Self::IncorrectFileFormat,
            BasaltError::MemAllocFailed => Self::MemAllocFailed,
            BasaltError::ExecutionError { .. } => Self::ExecutionError,
            BasaltError::InvariantViolation { .. } => Self::InvariantViolation,
            BasaltError::IoError { .. } => Self::ExecutionError,
        }
    }
}

/// Writes one frame.
pub fn write_frame(writer: &mut impl Write, status: Status, payload: &[u8]) -> BasaltResult<()> {
    let mut header = [0u8; 8];
    header[..4].copy_from_slice(&(status as u32).to_le_bytes());
    header[4..].copy_from_slice(&(payload.len() as u32).to_le_bytes());
    writer
        .write_all(&header)
        .and_then(|_| writer.write_all(payload))
        .and_then(|_| writer.flush())
        .map_err(|e| BasaltError::IoError {
            operation: "write_frame".to_string(),
            reason: e.to_string(),
        })
}

/// Reads one frame; `Ok(None)` on a clean EOF before the header.
pub fn read_frame(reader: &mut impl Read) -> BasaltResult<Option<(u32, Vec<u8>)>> {
    let mut header = [0u8; 8];
    match reader.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => {
            return Err(BasaltError::IoError {
                operation: "read_frame_header".to_string(),
                reason: e.to_string(),
            })
        }
    }
    let status = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let length = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
    if length > MAX_FRAME_LEN {
        return Err(BasaltError::IncorrectFormat {
            reason: format!("frame length {} exceeds limit", length),
        });
    }
    let mut payload = vec![0u8; length];
    reader
        .read_exact(&mut payload)
        .map_err(|e| BasaltError::IoError {
            operation: "read_frame_payload".to_string(),
            reason: e.to_string(),
        })?;
    Ok(Some((status, payload)))
}
