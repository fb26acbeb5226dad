// RCMP TSSIT OPS-II
//
// Each round writes one random byte and its complement, alternating, four times each.
// All rounds are unrolled into a single table up front.

use super::{draw_bytes, Pattern};
use crate::crypto::EntropySource;
use crate::error::WipeResult;

pub const PASSES_PER_ROUND: usize = 8;

pub fn build(rounds: u32, entropy: &dyn EntropySource) -> WipeResult<Vec<Pattern>> {
    let rounds = rounds.max(1) as usize;
    let drawn = draw_bytes(entropy, rounds)?;
    Ok(layout(&drawn))
}

/// Lay out the table for the given per-round bytes
pub(crate) fn layout(drawn: &[u8]) -> Vec<Pattern> {
    let mut patterns = Vec::with_capacity(drawn.len() * PASSES_PER_ROUND + 1);
    for &byte in drawn {
        for i in 0..PASSES_PER_ROUND {
            let value = if i % 2 == 0 { byte } else { !byte };
            patterns.push(Pattern::Static(vec![value]));
        }
    }
    patterns.push(Pattern::End);
    patterns
}
