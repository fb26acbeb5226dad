//! Outcome classification for passes and devices
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Aborts the device wipe (hard I/O error, entropy short read, sanity violation)
    Fatal,

    /// Tallied into a counter; the pass carries on
    Counted,

    /// Cancellation requested through the session token
    UserInterrupted,
}

impl ErrorClass {
    pub fn description(&self) -> &'static str {
        match self {
            ErrorClass::Fatal => "Unrecoverable error, device wipe aborted",
            ErrorClass::Counted => "Recorded error, wipe continued",
            ErrorClass::UserInterrupted => "Operation cancelled by user",
        }
    }

    pub fn aborts(&self) -> bool {
        !matches!(self, ErrorClass::Counted)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Fatal => write!(f, "Fatal"),
            ErrorClass::Counted => write!(f, "Counted"),
            ErrorClass::UserInterrupted => write!(f, "UserInterrupted"),
        }
    }
}

/// Non-fatal result of one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    /// Every block moved and matched
    Clean,
    /// Short transfers or mismatches were recorded
    ErrorsCounted,
}

impl PassStatus {
    pub(crate) fn from_errors(errors: u64) -> Self {
        if errors == 0 {
            PassStatus::Clean
        } else {
            PassStatus::ErrorsCounted
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, PassStatus::Clean)
    }
}

/// Final per-device result
///
/// Numeric values: 0 clean, 1 completed with recorded errors, negative when the
/// wipe was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultCode {
    Pending,
    Clean,
    CompletedWithErrors,
    Fatal,
    Cancelled,
}

impl ResultCode {
    pub const PENDING_RAW: i32 = i32::MIN;

    pub fn code(&self) -> i32 {
        match self {
            ResultCode::Pending => Self::PENDING_RAW,
            ResultCode::Clean => 0,
            ResultCode::CompletedWithErrors => 1,
            ResultCode::Fatal => -1,
            ResultCode::Cancelled => -2,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ResultCode::Clean,
            1 => ResultCode::CompletedWithErrors,
            -2 => ResultCode::Cancelled,
            c if c < 0 && c != Self::PENDING_RAW => ResultCode::Fatal,
            _ => ResultCode::Pending,
        }
    }

    /// Result for a wipe that ran to completion with the given error total
    pub fn for_completion(total_errors: u64) -> Self {
        if total_errors == 0 {
            ResultCode::Clean
        } else {
            ResultCode::CompletedWithErrors
        }
    }

    pub fn is_failure(&self) -> bool {
        self.code() < 0 && !matches!(self, ResultCode::Pending)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultCode::Pending => write!(f, "pending"),
            ResultCode::Clean => write!(f, "success"),
            ResultCode::CompletedWithErrors => write!(f, "completed with errors"),
            ResultCode::Fatal => write!(f, "failed"),
            ResultCode::Cancelled => write!(f, "cancelled"),
        }
    }
}
