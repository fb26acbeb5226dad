// Wipe Orchestrator - Drives rounds and passes of one method over one device
//
// The orchestrator resolves the method into a pattern table once, walks it for the
// requested number of rounds and appends the method's final pass. A fatal error from
// any pass aborts the device; counted errors are tallied and the wipe goes on.

pub mod sizing;

use crate::algorithms::{gutmann, Method, MethodClass, MethodPlan, Pattern};
use crate::context::{PassType, ProgressSnapshot, WipeContext};
use crate::error::{ErrorClass, PassStatus, ResultCode, WipeError, WipeResult};
use crate::io::pass_executor::{verify_random, verify_static, write_random, write_static};
use crate::logging::LogLevel;
use crate::{VerifyLevel, WipeOptions};
use std::time::{Duration, Instant};

/// Blanking pattern appended after the last round
const BLANK: [u8; 1] = [0x00];

/// How one device's wipe ended
#[derive(Debug)]
pub struct WipeOutcome {
    pub device: String,
    pub method: Method,
    pub result: ResultCode,
    /// The error that aborted the wipe, if any
    pub error: Option<WipeError>,
    /// Signal that cancelled the wipe, if any
    pub signal: Option<i32>,
    pub progress: ProgressSnapshot,
    pub elapsed: Duration,
}

impl WipeOutcome {
    pub fn is_success(&self) -> bool {
        self.result == ResultCode::Clean
    }

    /// How the worst failure of this wipe was handled, if there was one
    pub fn error_class(&self) -> Option<ErrorClass> {
        match &self.error {
            Some(e) => Some(e.class()),
            None if self.progress.total_errors() > 0 => Some(ErrorClass::Counted),
            None => None,
        }
    }
}

/// Main wipe orchestrator for one device
pub struct WipeOrchestrator<'a> {
    ctx: &'a mut WipeContext,
    options: WipeOptions,
}

impl<'a> WipeOrchestrator<'a> {
    pub fn new(ctx: &'a mut WipeContext, options: WipeOptions) -> WipeResult<Self> {
        let options = options.validate()?;
        Ok(Self { ctx, options })
    }

    /// Run the whole method and record the result on the device's progress
    pub fn execute(mut self) -> WipeOutcome {
        let started = Instant::now();
        let result = self.run();
        self.ctx.release();

        let progress = self.ctx.progress();
        let (result, error) = match result {
            Ok(()) => (ResultCode::for_completion(progress.total_errors()), None),
            Err(e) => (e.result_code(), Some(e)),
        };
        progress.finish(result);

        match (&result, &error) {
            (_, Some(e @ WipeError::Cancelled { signal })) => self.ctx.note(
                LogLevel::Warning,
                match signal {
                    Some(s) => format!("{} (signal {})", e.class().description(), s),
                    None => e.class().description().to_string(),
                },
            ),
            (_, Some(e)) => self
                .ctx
                .note(LogLevel::Fatal, format!("{}: {}", e.class().description(), e)),
            (ResultCode::Clean, None) => self.ctx.note(
                LogLevel::Notice,
                format!("{} completed without errors", self.options.method),
            ),
            (_, None) => self.ctx.note(
                LogLevel::Error,
                format!(
                    "{} completed with {} errors",
                    self.options.method,
                    progress.total_errors()
                ),
            ),
        }

        WipeOutcome {
            device: self.ctx.name().to_string(),
            method: self.options.method,
            result,
            error,
            signal: self.ctx.cancel.signal(),
            progress: progress.snapshot(),
            elapsed: started.elapsed(),
        }
    }

    fn run(&mut self) -> WipeResult<()> {
        let method = self.options.method;
        let class = method.class();
        let plan = method.plan(self.options.rounds, self.ctx.entropy.as_ref())?;
        let rounds = self.options.rounds.max(1);
        let passes_per_round = plan.passes_per_round();

        let base_pass_size = passes_per_round as u64 * self.ctx.size;
        let (round_size, pass_size) = sizing::round_size(
            base_pass_size,
            self.ctx.size,
            self.options.rounds,
            self.options.noblank,
            self.options.verify,
            class,
        );
        self.ctx
            .progress
            .set_plan(passes_per_round as u32, rounds, pass_size, round_size);

        self.ctx.note(
            LogLevel::Notice,
            format!(
                "Invoking method '{}' with {} passes, {} rounds, verify {}, prng {}, {} bytes to process",
                method,
                passes_per_round,
                rounds,
                self.options.verify,
                self.ctx.prng,
                round_size
            ),
        );

        if class == MethodClass::VerifyOnly {
            return self.verify_only(&plan);
        }

        for round in 1..=rounds {
            self.ctx.progress.begin_round(round);
            self.ctx
                .note(LogLevel::Info, format!("Starting round {} of {}", round, rounds));

            let mut round_clean = true;
            for (index, pattern) in plan.round_passes(round).iter().enumerate() {
                self.ctx.progress.begin_pass(index as u32 + 1, PassType::Write);
                let read_back = self.options.verify == VerifyLevel::All
                    || (class == MethodClass::Enhanced && *pattern == Pattern::Random);
                let status = self.run_pass(index, pattern, read_back)?;
                round_clean &= status.is_clean();
            }

            if !round_clean {
                self.ctx.progress.add_round_error();
                self.ctx
                    .note(LogLevel::Error, format!("Round {} recorded errors", round));
            }
        }

        self.final_pass(&plan, class)
    }

    /// One ordinary pass, optionally read back straight after writing
    fn run_pass(&mut self, index: usize, pattern: &Pattern, read_back: bool) -> WipeResult<PassStatus> {
        let message = match self.options.method {
            Method::Gutmann => format!(
                "Pass {}: writing {} ({})",
                index + 1,
                pattern,
                gutmann::describe(pattern)
            ),
            _ => format!("Pass {}: writing {}", index + 1, pattern),
        };
        self.ctx.note(LogLevel::Info, message);

        let (written, verified) = match pattern {
            Pattern::Static(bytes) => {
                let written = write_static(self.ctx, bytes)?;
                let verified = if read_back {
                    self.ctx.progress.set_pass_type(PassType::Verify);
                    verify_static(self.ctx, bytes)?
                } else {
                    PassStatus::Clean
                };
                (written, verified)
            }
            Pattern::Random => {
                let seed = self.ctx.reseed()?;
                let written = write_random(self.ctx, &seed)?;
                let verified = if read_back {
                    self.ctx.progress.set_pass_type(PassType::Verify);
                    verify_random(self.ctx, &seed)?
                } else {
                    PassStatus::Clean
                };
                (written, verified)
            }
            Pattern::End => {
                return Err(WipeError::InvalidPattern {
                    index,
                    reason: "terminator inside the pass list".to_string(),
                })
            }
        };

        Ok(combine(written, verified))
    }

    fn final_pass(&mut self, plan: &MethodPlan, class: MethodClass) -> WipeResult<()> {
        let verify_last = self.options.verify.verifies_last();
        let final_index = plan.passes_per_round() as u32 + 1;

        if class == MethodClass::Ops2 {
            self.ctx.progress.begin_pass(final_index, PassType::FinalOps2);
            self.ctx.note(LogLevel::Info, "Final pass: writing random data");
            let seed = self.ctx.reseed()?;
            write_random(self.ctx, &seed)?;
            if verify_last {
                self.ctx.progress.set_pass_type(PassType::Verify);
                verify_random(self.ctx, &seed)?;
            }
            return Ok(());
        }

        if !self.options.noblank {
            self.ctx.progress.begin_pass(final_index, PassType::FinalBlank);
            self.ctx.note(LogLevel::Info, "Final pass: blanking device");
            write_static(self.ctx, &BLANK)?;
            if verify_last {
                self.ctx.progress.set_pass_type(PassType::Verify);
                verify_static(self.ctx, &BLANK)?;
            }
            return Ok(());
        }

        // No blank to check, so read back the last ordinary pass instead
        if self.options.verify == VerifyLevel::Last && class == MethodClass::Default {
            if let Some(last) = plan.passes().last() {
                self.ctx.progress.set_pass_type(PassType::Verify);
                self.ctx
                    .note(LogLevel::Info, format!("Verifying last pass ({})", last));
                match last {
                    Pattern::Static(bytes) => {
                        verify_static(self.ctx, bytes)?;
                    }
                    Pattern::Random => {
                        let seed = self.ctx.seed.clone().ok_or_else(|| WipeError::InvalidPattern {
                            index: plan.pass_count - 1,
                            reason: "no retained seed for the last random pass".to_string(),
                        })?;
                        verify_random(self.ctx, &seed)?;
                    }
                    Pattern::End => {}
                }
            }
        }
        Ok(())
    }

    fn verify_only(&mut self, plan: &MethodPlan) -> WipeResult<()> {
        let Some(Pattern::Static(bytes)) = plan.passes().first() else {
            return Err(WipeError::InvalidPattern {
                index: 0,
                reason: "verify-only method needs a static pattern".to_string(),
            });
        };

        self.ctx.progress.begin_round(1);
        self.ctx.progress.begin_pass(1, PassType::Verify);
        self.ctx
            .note(LogLevel::Info, format!("Verifying device holds {}", plan.passes()[0]));
        if !verify_static(self.ctx, bytes)?.is_clean() {
            self.ctx.progress.add_round_error();
        }
        Ok(())
    }
}

fn combine(a: PassStatus, b: PassStatus) -> PassStatus {
    if a.is_clean() && b.is_clean() {
        PassStatus::Clean
    } else {
        PassStatus::ErrorsCounted
    }
}

/// Wipe the device behind `ctx` with `options` and report how it ended.
///
/// Invalid options end the wipe with a fatal result before the device is touched.
pub fn run_method(ctx: &mut WipeContext, options: &WipeOptions) -> WipeOutcome {
    match WipeOrchestrator::new(ctx, options.clone()) {
        Ok(orchestrator) => orchestrator.execute(),
        Err(e) => {
            let progress = ctx.progress();
            progress.finish(e.result_code());
            ctx.note(LogLevel::Fatal, format!("Rejected wipe options: {}", e));
            WipeOutcome {
                device: ctx.name().to_string(),
                method: options.method,
                result: e.result_code(),
                error: Some(e),
                signal: None,
                progress: progress.snapshot(),
                elapsed: Duration::ZERO,
            }
        }
    }
}
