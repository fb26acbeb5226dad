// Read-only summaries built after each device's wipe returns

use crate::algorithms::Method;
use crate::crypto::PrngKind;
use crate::error::{ErrorClass, ResultCode};
use crate::logging::LogEntry;
use crate::wipe_orchestrator::WipeOutcome;
use crate::{VerifyLevel, WipeOptions};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Final state of one device's wipe
#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    pub device: String,
    pub method: Method,
    pub prng: PrngKind,
    pub rounds: u32,
    pub verify: VerifyLevel,
    pub noblank: bool,
    pub result: ResultCode,
    pub result_code: i32,
    pub error: Option<String>,
    pub error_class: Option<ErrorClass>,
    pub signal: Option<i32>,
    pub pass_count: u32,
    pub pass_errors: u64,
    pub round_errors: u64,
    pub verify_errors: u64,
    pub bytes_processed: u64,
    pub bytes_planned: u64,
    pub elapsed: Duration,
    pub finished_at: DateTime<Utc>,
}

impl DeviceReport {
    pub fn from_outcome(outcome: &WipeOutcome, options: &WipeOptions) -> Self {
        let progress = &outcome.progress;
        Self {
            device: outcome.device.clone(),
            method: outcome.method,
            prng: options.prng,
            rounds: options.rounds,
            verify: options.verify,
            noblank: options.noblank,
            result: outcome.result,
            result_code: outcome.result.code(),
            error: outcome.error.as_ref().map(|e| e.to_string()),
            error_class: outcome.error_class(),
            signal: outcome.signal,
            pass_count: progress.pass_count,
            pass_errors: progress.pass_errors,
            round_errors: progress.round_errors,
            verify_errors: progress.verify_errors,
            bytes_processed: progress.round_done,
            bytes_planned: progress.round_size,
            elapsed: outcome.elapsed,
            finished_at: Utc::now(),
        }
    }

    /// Report for a device whose worker died without returning an outcome
    pub fn worker_failed(device: &str, options: &WipeOptions, message: impl Into<String>) -> Self {
        Self {
            device: device.to_string(),
            method: options.method,
            prng: options.prng,
            rounds: options.rounds,
            verify: options.verify,
            noblank: options.noblank,
            result: ResultCode::Fatal,
            result_code: ResultCode::Fatal.code(),
            error: Some(message.into()),
            error_class: Some(ErrorClass::Fatal),
            signal: None,
            pass_count: 0,
            pass_errors: 0,
            round_errors: 0,
            verify_errors: 0,
            bytes_processed: 0,
            bytes_planned: 0,
            elapsed: Duration::ZERO,
            finished_at: Utc::now(),
        }
    }

    /// True when the wipe stopped before its last pass
    pub fn aborted(&self) -> bool {
        self.error_class.map_or(false, |class| class.aborts())
    }

    pub fn total_errors(&self) -> u64 {
        self.pass_errors + self.round_errors + self.verify_errors
    }

    pub fn summary_line(&self) -> String {
        let status = match self.result {
            ResultCode::Clean => "Erased".to_string(),
            ResultCode::CompletedWithErrors => format!("Erased with {} errors", self.total_errors()),
            ResultCode::Cancelled => match self.signal {
                Some(s) => format!("Cancelled (signal {})", s),
                None => "Cancelled".to_string(),
            },
            ResultCode::Fatal => format!(
                "FAILED: {}",
                self.error.as_deref().unwrap_or("unknown error")
            ),
            ResultCode::Pending => "Incomplete".to_string(),
        };

        format!(
            "{}: {} [{}, {} rounds, verify {}, prng {}] in {}",
            self.device,
            status,
            self.method,
            self.rounds,
            self.verify,
            self.prng,
            humantime::format_duration(Duration::from_secs(self.elapsed.as_secs()))
        )
    }
}

/// Everything a session produced, in device slot order
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub devices: Vec<DeviceReport>,
    pub log: Vec<LogEntry>,
}

impl SessionReport {
    pub fn all_clean(&self) -> bool {
        self.devices.iter().all(|d| d.result == ResultCode::Clean)
    }

    /// Worst result across devices: fatal, then cancelled, then errors
    pub fn worst_result(&self) -> ResultCode {
        let rank = |r: &ResultCode| match r {
            ResultCode::Fatal => 4,
            ResultCode::Cancelled => 3,
            ResultCode::Pending => 2,
            ResultCode::CompletedWithErrors => 1,
            ResultCode::Clean => 0,
        };
        self.devices
            .iter()
            .map(|d| d.result)
            .max_by_key(rank)
            .unwrap_or(ResultCode::Clean)
    }
}
