use super::PatternSpec::{self, Complement, End, RandomByte, Stream};

/// Bytes drawn per DoD-short invocation
pub const DOD_SHORT_DRAW: usize = 3;

/// Bytes drawn per DoD 5220.22-M invocation; only indices 0, 3 and 4 are used
pub const DOD_522022M_DRAW: usize = 7;

/// DoD 5220.22-M short: random byte, its complement, random stream
pub const DOD_SHORT: [PatternSpec; 4] = [RandomByte(0), Complement(0), Stream, End];

/// DoD 5220.22-M, seven passes
pub const DOD_522022M: [PatternSpec; 8] = [
    RandomByte(0),
    Complement(0),
    Stream,
    RandomByte(3),
    RandomByte(4),
    Complement(4),
    Stream,
    End,
];
