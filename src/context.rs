// Per-device wipe state
//
// A `WipeContext` belongs to exactly one worker. The counters it updates live in a
// shared `WipeProgress` built from atomics: the worker is the only writer, the
// progress aggregator and report builders only load from it.

use crate::crypto::{EntropySource, PrngKind, Seed};
use crate::error::{IoOp, ResultCode, WipeError, WipeResult};
use crate::io::BlockDevice;
use crate::logging::{EventLog, LogLevel};
use crate::CancelToken;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI32, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// What the worker is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PassType {
    None = 0,
    Write = 1,
    Verify = 2,
    FinalBlank = 3,
    FinalOps2 = 4,
}

impl PassType {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => PassType::Write,
            2 => PassType::Verify,
            3 => PassType::FinalBlank,
            4 => PassType::FinalOps2,
            _ => PassType::None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PassType::None => "idle",
            PassType::Write => "writing",
            PassType::Verify => "verifying",
            PassType::FinalBlank => "blanking",
            PassType::FinalOps2 => "final random",
        }
    }
}

/// Counters for one device, readable from any thread
#[derive(Debug)]
pub struct WipeProgress {
    pass_type: AtomicU8,
    pass_working: AtomicU32,
    pass_count: AtomicU32,
    round_working: AtomicU32,
    round_count: AtomicU32,
    pass_size: AtomicU64,
    round_size: AtomicU64,
    /// Bytes moved since the wipe began
    pass_done: AtomicU64,
    /// `pass_done` when the current pass started
    pass_mark: AtomicU64,
    round_done: AtomicU64,
    pass_errors: AtomicU64,
    round_errors: AtomicU64,
    verify_errors: AtomicU64,
    result: AtomicI32,
}

impl Default for WipeProgress {
    fn default() -> Self {
        Self {
            pass_type: AtomicU8::new(PassType::None as u8),
            pass_working: AtomicU32::new(0),
            pass_count: AtomicU32::new(0),
            round_working: AtomicU32::new(0),
            round_count: AtomicU32::new(0),
            pass_size: AtomicU64::new(0),
            round_size: AtomicU64::new(0),
            pass_done: AtomicU64::new(0),
            pass_mark: AtomicU64::new(0),
            round_done: AtomicU64::new(0),
            pass_errors: AtomicU64::new(0),
            round_errors: AtomicU64::new(0),
            verify_errors: AtomicU64::new(0),
            result: AtomicI32::new(ResultCode::PENDING_RAW),
        }
    }
}

impl WipeProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_plan(&self, pass_count: u32, round_count: u32, pass_size: u64, round_size: u64) {
        self.pass_count.store(pass_count, Ordering::Relaxed);
        self.round_count.store(round_count, Ordering::Relaxed);
        self.pass_size.store(pass_size, Ordering::Relaxed);
        self.round_size.store(round_size, Ordering::Relaxed);
    }

    pub(crate) fn begin_round(&self, round: u32) {
        self.round_working.store(round, Ordering::Relaxed);
    }

    pub(crate) fn begin_pass(&self, pass: u32, pass_type: PassType) {
        self.pass_working.store(pass, Ordering::Relaxed);
        self.set_pass_type(pass_type);
    }

    pub(crate) fn set_pass_type(&self, pass_type: PassType) {
        self.pass_type.store(pass_type as u8, Ordering::Relaxed);
        self.pass_mark
            .store(self.pass_done.load(Ordering::Relaxed), Ordering::Relaxed);
    }

    pub(crate) fn add_done(&self, bytes: u64) {
        self.pass_done.fetch_add(bytes, Ordering::Relaxed);
        self.round_done.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn add_pass_errors(&self, count: u64) {
        self.pass_errors.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn add_verify_errors(&self, count: u64) {
        self.verify_errors.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn add_round_error(&self) {
        self.round_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn finish(&self, code: ResultCode) {
        self.pass_type.store(PassType::None as u8, Ordering::Relaxed);
        self.result.store(code.code(), Ordering::Release);
    }

    pub fn pass_type(&self) -> PassType {
        PassType::from_raw(self.pass_type.load(Ordering::Relaxed))
    }

    pub fn round_done(&self) -> u64 {
        self.round_done.load(Ordering::Relaxed)
    }

    pub fn round_size(&self) -> u64 {
        self.round_size.load(Ordering::Relaxed)
    }

    /// Errors of every kind counted so far
    pub fn total_errors(&self) -> u64 {
        self.pass_errors.load(Ordering::Relaxed)
            + self.round_errors.load(Ordering::Relaxed)
            + self.verify_errors.load(Ordering::Relaxed)
    }

    pub fn result(&self) -> ResultCode {
        ResultCode::from_code(self.result.load(Ordering::Acquire))
    }

    pub fn is_finished(&self) -> bool {
        self.result() != ResultCode::Pending
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let pass_done = self.pass_done.load(Ordering::Relaxed);
        ProgressSnapshot {
            pass_type: self.pass_type(),
            pass_working: self.pass_working.load(Ordering::Relaxed),
            pass_count: self.pass_count.load(Ordering::Relaxed),
            round_working: self.round_working.load(Ordering::Relaxed),
            round_count: self.round_count.load(Ordering::Relaxed),
            pass_size: self.pass_size.load(Ordering::Relaxed),
            round_size: self.round_size(),
            pass_done,
            pass_bytes: pass_done.saturating_sub(self.pass_mark.load(Ordering::Relaxed)),
            round_done: self.round_done(),
            pass_errors: self.pass_errors.load(Ordering::Relaxed),
            round_errors: self.round_errors.load(Ordering::Relaxed),
            verify_errors: self.verify_errors.load(Ordering::Relaxed),
            result: self.result(),
        }
    }
}

/// Point-in-time copy of a device's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub pass_type: PassType,
    pub pass_working: u32,
    pub pass_count: u32,
    pub round_working: u32,
    pub round_count: u32,
    pub pass_size: u64,
    pub round_size: u64,
    pub pass_done: u64,
    /// Bytes moved in the current pass
    pub pass_bytes: u64,
    pub round_done: u64,
    pub pass_errors: u64,
    pub round_errors: u64,
    pub verify_errors: u64,
    pub result: ResultCode,
}

impl ProgressSnapshot {
    pub fn total_errors(&self) -> u64 {
        self.pass_errors + self.round_errors + self.verify_errors
    }

    /// Completed share of the whole wipe, 0.0 to 100.0
    pub fn percent(&self) -> f64 {
        if self.round_size == 0 {
            return 0.0;
        }
        (self.round_done as f64 / self.round_size as f64 * 100.0).min(100.0)
    }
}

/// Everything one worker needs to wipe one device
pub struct WipeContext {
    pub(crate) device: Box<dyn BlockDevice>,
    pub(crate) name: String,
    pub(crate) size: u64,
    pub(crate) block_size: usize,
    pub(crate) entropy: Arc<dyn EntropySource>,
    pub(crate) prng: PrngKind,
    pub(crate) progress: Arc<WipeProgress>,
    pub(crate) cancel: CancelToken,
    pub(crate) log: EventLog,
    /// Seed of the most recent random pass, kept so that pass can be read back later
    pub(crate) seed: Option<Seed>,
}

impl WipeContext {
    pub fn new(
        device: Box<dyn BlockDevice>,
        size: u64,
        block_size: usize,
        entropy: Arc<dyn EntropySource>,
        prng: PrngKind,
    ) -> WipeResult<Self> {
        if block_size == 0 {
            return Err(WipeError::InvalidOptions(format!(
                "block size of {} must be positive",
                device.name()
            )));
        }

        Ok(Self {
            name: device.name().to_string(),
            device,
            size,
            block_size,
            entropy,
            prng,
            progress: Arc::new(WipeProgress::new()),
            cancel: CancelToken::new(),
            log: EventLog::disabled(),
            seed: None,
        })
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn prng(&self) -> PrngKind {
        self.prng
    }

    pub fn progress(&self) -> Arc<WipeProgress> {
        Arc::clone(&self.progress)
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Draw a fresh seed for the next random pass, replacing the retained one
    pub(crate) fn reseed(&mut self) -> WipeResult<Seed> {
        self.seed = None;
        let seed = Seed::draw(self.entropy.as_ref())?;
        self.seed = Some(seed.clone());
        Ok(seed)
    }

    pub(crate) fn note(&self, level: LogLevel, message: impl Into<String>) {
        self.log.device(level, &self.name, message);
    }

    pub(crate) fn io_error(&self, op: IoOp, source: std::io::Error) -> WipeError {
        WipeError::io(op, &self.name, source)
    }

    /// Drop the retained seed and anything else scoped to one run
    pub(crate) fn release(&mut self) {
        self.seed = None;
    }
}

impl std::fmt::Debug for WipeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WipeContext")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("block_size", &self.block_size)
            .field("prng", &self.prng)
            .field("entropy", &self.entropy.name())
            .finish()
    }
}
