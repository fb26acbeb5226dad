pub mod dod;
pub mod gutmann;
pub mod ops2;
pub mod random;
pub mod zero;


use crate::crypto::{fill_exact, EntropySource};
use crate::error::{WipeError, WipeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One entry of a resolved method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Fixed byte sequence repeated across the device
    Static(Vec<u8>),
    /// Bytes drawn from the active PRNG
    Random,
    /// Table terminator; appears exactly once, last
    End,
}

impl Pattern {
    /// Classic pattern length: bytes for a static pattern, -1 for random, 0 for the end
    pub fn length(&self) -> isize {
        match self {
            Pattern::Static(bytes) => bytes.len() as isize,
            Pattern::Random => -1,
            Pattern::End => 0,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Pattern::End)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Static(bytes) => {
                for b in bytes {
                    write!(f, "{:02X}", b)?;
                }
                Ok(())
            }
            Pattern::Random => write!(f, "random"),
            Pattern::End => write!(f, "end"),
        }
    }
}

/// Constant description of a method entry, resolved against per-run random bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSpec {
    Fixed(&'static [u8]),
    /// The n-th byte drawn for this invocation
    RandomByte(usize),
    /// Bitwise complement of the n-th drawn byte
    Complement(usize),
    Stream,
    End,
}

/// Resolve a constant table into concrete patterns
pub fn resolve(table: &[PatternSpec], drawn: &[u8]) -> WipeResult<Vec<Pattern>> {
    table
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let byte = |n: usize| {
                drawn.get(n).copied().ok_or_else(|| WipeError::InvalidPattern {
                    index,
                    reason: format!("needs drawn byte {} but only {} were drawn", n, drawn.len()),
                })
            };
            Ok(match *spec {
                PatternSpec::Fixed(bytes) => Pattern::Static(bytes.to_vec()),
                PatternSpec::RandomByte(n) => Pattern::Static(vec![byte(n)?]),
                PatternSpec::Complement(n) => Pattern::Static(vec![!byte(n)?]),
                PatternSpec::Stream => Pattern::Random,
                PatternSpec::End => Pattern::End,
            })
        })
        .collect()
}

/// Check a pattern table and return the number of passes it describes.
///
/// The table must end with exactly one terminator, and no static pattern may be empty.
pub fn validate_table(patterns: &[Pattern]) -> WipeResult<usize> {
    match patterns.last() {
        Some(Pattern::End) => {}
        _ => return Err(WipeError::MissingTerminator),
    }

    let body = &patterns[..patterns.len() - 1];
    for (index, pattern) in body.iter().enumerate() {
        // Only the terminator may have length 0
        if pattern.length() == 0 {
            let reason = if pattern.is_end() {
                "terminator before the end of the table"
            } else {
                "zero-length static pattern"
            };
            return Err(WipeError::InvalidPattern {
                index,
                reason: reason.to_string(),
            });
        }
    }
    Ok(body.len())
}

/// Draw `count` bytes for a method's random-byte entries
pub(crate) fn draw_bytes(entropy: &dyn EntropySource, count: usize) -> WipeResult<Vec<u8>> {
    let mut drawn = vec![0u8; count];
    fill_exact(entropy, &mut drawn)?;
    Ok(drawn)
}

/// Wipe method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Zero,
    One,
    DodShort,
    Dod522022M,
    Ops2,
    Gutmann,
    Random,
    Is5Enhanced,
    VerifyZero,
    VerifyOne,
}

/// Accounting and final-pass behavior shared by groups of methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodClass {
    Default,
    /// Ends on a random pass instead of a blank
    Ops2,
    /// Always reads back its random pass
    Enhanced,
    /// Never writes
    VerifyOnly,
}

impl Method {
    pub const ALL: [Method; 10] = [
        Method::Zero,
        Method::One,
        Method::DodShort,
        Method::Dod522022M,
        Method::Ops2,
        Method::Gutmann,
        Method::Random,
        Method::Is5Enhanced,
        Method::VerifyZero,
        Method::VerifyOne,
    ];

    pub fn class(&self) -> MethodClass {
        match self {
            Method::Ops2 => MethodClass::Ops2,
            Method::Is5Enhanced => MethodClass::Enhanced,
            Method::VerifyZero | Method::VerifyOne => MethodClass::VerifyOnly,
            _ => MethodClass::Default,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Method::Zero => "zero",
            Method::One => "one",
            Method::DodShort => "dodshort",
            Method::Dod522022M => "dod522022m",
            Method::Ops2 => "ops2",
            Method::Gutmann => "gutmann",
            Method::Random => "random",
            Method::Is5Enhanced => "is5enh",
            Method::VerifyZero => "verify_zero",
            Method::VerifyOne => "verify_one",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Method::Zero => "Fill With Zeros",
            Method::One => "Fill With Ones",
            Method::DodShort => "DoD Short",
            Method::Dod522022M => "DoD 5220.22-M",
            Method::Ops2 => "RCMP TSSIT OPS-II",
            Method::Gutmann => "Gutmann Wipe",
            Method::Random => "PRNG Stream",
            Method::Is5Enhanced => "HMG IS5 Enhanced",
            Method::VerifyZero => "Verify Zeros",
            Method::VerifyOne => "Verify Ones",
        }
    }

    /// Passes in one round, not counting the final pass
    pub fn passes_per_round(&self) -> usize {
        match self {
            Method::Zero => 0,
            Method::One | Method::Random | Method::VerifyZero | Method::VerifyOne => 1,
            Method::DodShort | Method::Is5Enhanced => 3,
            Method::Dod522022M => 7,
            Method::Ops2 => ops2::PASSES_PER_ROUND,
            Method::Gutmann => gutmann::BOOK_LEN,
        }
    }

    /// Build this invocation's pattern table.
    ///
    /// Random bytes, the Gutmann order and the OPS-II bytes are drawn here, once.
    pub fn plan(&self, rounds: u32, entropy: &dyn EntropySource) -> WipeResult<MethodPlan> {
        let patterns = match self {
            Method::Zero => resolve(&zero::ZERO, &[])?,
            Method::One => resolve(&zero::ONE, &[])?,
            Method::VerifyZero => resolve(&zero::VERIFY_ZERO, &[])?,
            Method::VerifyOne => resolve(&zero::VERIFY_ONE, &[])?,
            Method::DodShort => {
                let drawn = draw_bytes(entropy, dod::DOD_SHORT_DRAW)?;
                resolve(&dod::DOD_SHORT, &drawn)?
            }
            Method::Dod522022M => {
                let drawn = draw_bytes(entropy, dod::DOD_522022M_DRAW)?;
                resolve(&dod::DOD_522022M, &drawn)?
            }
            Method::Ops2 => ops2::build(rounds, entropy)?,
            Method::Gutmann => gutmann::permute(entropy)?,
            Method::Random => resolve(&random::RANDOM_STREAM, &[])?,
            Method::Is5Enhanced => resolve(&random::IS5_ENHANCED, &[])?,
        };

        let pass_count = validate_table(&patterns)?;
        Ok(MethodPlan {
            method: *self,
            patterns,
            pass_count,
        })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Method {
    type Err = WipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zero" | "quick" => Ok(Method::Zero),
            "one" => Ok(Method::One),
            "dodshort" | "dod3pass" => Ok(Method::DodShort),
            "dod522022m" | "dod" => Ok(Method::Dod522022M),
            "ops2" => Ok(Method::Ops2),
            "gutmann" => Ok(Method::Gutmann),
            "random" | "prng" | "stream" => Ok(Method::Random),
            "is5enh" => Ok(Method::Is5Enhanced),
            "verify_zero" => Ok(Method::VerifyZero),
            "verify_one" => Ok(Method::VerifyOne),
            other => Err(WipeError::InvalidOptions(format!("unknown method '{}'", other))),
        }
    }
}

/// Resolved pattern table for one invocation of a method
#[derive(Debug, Clone)]
pub struct MethodPlan {
    pub method: Method,
    /// Terminated table
    pub patterns: Vec<Pattern>,
    /// Entries before the terminator
    pub pass_count: usize,
}

impl MethodPlan {
    /// Patterns without the terminator
    pub fn passes(&self) -> &[Pattern] {
        &self.patterns[..self.pass_count]
    }

    /// Passes written in one round, not counting the final pass
    pub fn passes_per_round(&self) -> usize {
        self.method.passes_per_round()
    }

    /// Passes of the 1-based `round`.
    ///
    /// OPS-II unrolls its rounds into consecutive slices of the table, each with its
    /// own byte; every other method repeats the whole table.
    pub fn round_passes(&self, round: u32) -> &[Pattern] {
        match self.method.class() {
            MethodClass::Ops2 => {
                let per_round = ops2::PASSES_PER_ROUND;
                let start = (round.max(1) as usize - 1) * per_round;
                self.passes().get(start..start + per_round).unwrap_or(&[])
            }
            _ => self.passes(),
        }
    }
}
