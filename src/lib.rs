pub mod algorithms;
pub mod context;
pub mod crypto;
pub mod error;
pub mod io;
pub mod logging;
pub mod report;
pub mod session;
pub mod ui;
pub mod wipe_orchestrator;

// Re-export the main entry points for convenience
pub use algorithms::{Method, MethodClass, Pattern};
pub use context::{PassType, WipeContext, WipeProgress};
pub use crypto::{EntropySource, PrngKind, Seed};
pub use error::{ErrorClass, PassStatus, ResultCode, WipeError, WipeResult};
pub use io::{BlockDevice, FileDevice};
pub use logging::{EventLog, LogLevel};
pub use report::DeviceReport;
pub use session::WipeSession;
pub use wipe_orchestrator::{run_method, sizing::round_size, WipeOutcome};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

/// Which passes are read back and compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VerifyLevel {
    None,
    Last,
    All,
}

impl VerifyLevel {
    /// True for LAST and ALL, the levels that verify the final pass
    pub fn verifies_last(&self) -> bool {
        *self >= VerifyLevel::Last
    }
}

impl fmt::Display for VerifyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyLevel::None => write!(f, "off"),
            VerifyLevel::Last => write!(f, "last"),
            VerifyLevel::All => write!(f, "all"),
        }
    }
}

impl FromStr for VerifyLevel {
    type Err = WipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(VerifyLevel::None),
            "last" => Ok(VerifyLevel::Last),
            "all" => Ok(VerifyLevel::All),
            other => Err(WipeError::InvalidOptions(format!(
                "unknown verify level '{}' (expected off, last or all)",
                other
            ))),
        }
    }
}

/// Options shared by every device in a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WipeOptions {
    pub method: Method,
    pub rounds: u32,
    pub verify: VerifyLevel,
    pub noblank: bool,
    pub prng: PrngKind,
    /// Overrides the block size reported by the device
    pub block_size: Option<usize>,
}

impl Default for WipeOptions {
    fn default() -> Self {
        Self {
            method: Method::DodShort,
            rounds: 1,
            verify: VerifyLevel::Last,
            noblank: false,
            prng: PrngKind::Isaac64,
            block_size: None,
        }
    }
}

impl WipeOptions {
    /// Normalize the options against what the selected method allows.
    ///
    /// Rounds are clamped to at least one; Zero always blanks, One and the
    /// verify-only methods never do.
    pub fn validate(mut self) -> WipeResult<Self> {
        if self.rounds == 0 {
            self.rounds = 1;
        }
        if let Some(0) = self.block_size {
            return Err(WipeError::InvalidOptions(
                "block size must be greater than zero".to_string(),
            ));
        }
        match self.method {
            Method::Zero => self.noblank = false,
            Method::One | Method::VerifyZero | Method::VerifyOne => self.noblank = true,
            _ => {}
        }
        Ok(self)
    }
}

/// Cooperative cancellation shared by a session's workers and aggregator
///
/// Cloning yields another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    signal: Arc<AtomicI32>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Cancel and remember the signal that caused it
    pub fn cancel_with_signal(&self, signal: i32) {
        self.signal.store(signal, Ordering::SeqCst);
        self.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Signal number recorded by `cancel_with_signal`, if any
    pub fn signal(&self) -> Option<i32> {
        match self.signal.load(Ordering::SeqCst) {
            0 => None,
            s => Some(s),
        }
    }

    /// Block-boundary check point used by the pass loops
    pub fn check(&self) -> WipeResult<()> {
        if self.is_cancelled() {
            Err(WipeError::Cancelled {
                signal: self.signal(),
            })
        } else {
            Ok(())
        }
    }
}
