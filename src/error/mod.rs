//! Error types for the wipe engine
//!
//! Every failure the engine can meet falls into one of two classes:
//!
//! ```text
//! ┌──────────────────────────────┐      ┌──────────────────────────────┐
//! │ Fatal                        │      │ Counted                      │
//! │  - hard read/write/flush     │      │  - short read / short write  │
//! │  - seek failure              │      │  - verification mismatch     │
//! │  - entropy short read        │      │                              │
//! │  - bad pattern table         │      │  tallied into pass_errors /  │
//! │  - cancellation              │      │  verify_errors, wipe goes on │
//! │  aborts the device           │      │                              │
//! └──────────────────────────────┘      └──────────────────────────────┘
//! ```
//!
//! Fatal conditions travel as `Err(WipeError)`. Counted conditions never become
//! errors; pass routines report them through [`PassStatus`].
pub mod classification;

pub use classification::{ErrorClass, PassStatus, ResultCode};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WipeError {
    #[error("{op} failed on {device}: {source}")]
    Io {
        op: IoOp,
        device: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Entropy source '{source_name}' returned {got} of {wanted} bytes")]
    EntropyShortRead {
        source_name: String,
        wanted: usize,
        got: usize,
    },

    #[error("Invalid pattern at index {index}: {reason}")]
    InvalidPattern { index: usize, reason: String },

    #[error("Pattern table has no terminator")]
    MissingTerminator,

    #[error("Invalid wipe options: {0}")]
    InvalidOptions(String),

    #[error("Operation cancelled")]
    Cancelled { signal: Option<i32> },
}

impl WipeError {
    pub(crate) fn io(op: IoOp, device: &str, source: std::io::Error) -> Self {
        WipeError::Io {
            op,
            device: device.to_string(),
            source,
        }
    }

    /// Every `WipeError` aborts the device; this only distinguishes the reason.
    pub fn class(&self) -> ErrorClass {
        match self {
            WipeError::Cancelled { .. } => ErrorClass::UserInterrupted,
            _ => ErrorClass::Fatal,
        }
    }

    /// Result code recorded for a device whose wipe ended with this error.
    pub fn result_code(&self) -> ResultCode {
        match self {
            WipeError::Cancelled { .. } => ResultCode::Cancelled,
            _ => ResultCode::Fatal,
        }
    }
}

/// Device operation that produced an I/O error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Seek,
    Read,
    Write,
    Flush,
    Open,
}

impl std::fmt::Display for IoOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IoOp::Seek => "seek",
            IoOp::Read => "read",
            IoOp::Write => "write",
            IoOp::Flush => "flush",
            IoOp::Open => "open",
        };
        f.write_str(name)
    }
}

pub type WipeResult<T> = Result<T, WipeError>;
