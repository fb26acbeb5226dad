use super::PatternSpec::{self, End, Fixed, Stream};

/// One pass of the PRNG stream
pub const RANDOM_STREAM: [PatternSpec; 2] = [Stream, End];

/// HMG IS5 enhanced: zeros, ones, then a random pass that is always read back
pub const IS5_ENHANCED: [PatternSpec; 4] = [Fixed(&[0x00]), Fixed(&[0xFF]), Stream, End];
