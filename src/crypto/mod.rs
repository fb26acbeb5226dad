pub mod entropy;
pub mod prng;

#[cfg(test)]
mod prng_tests;

// Re-export
pub use entropy::{fill_exact, EntropySource, FileEntropy, RingEntropy, Seed, SEED_LEN};
pub use prng::{PrngKind, PrngState, RandomStream};
