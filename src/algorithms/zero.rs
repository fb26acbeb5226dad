use super::PatternSpec::{self, End, Fixed};

/// Quick erase: no ordinary passes, only the final blank
pub const ZERO: [PatternSpec; 1] = [End];

/// Single 0xFF fill; never followed by a blank
pub const ONE: [PatternSpec; 2] = [Fixed(&[0xFF]), End];

/// Read-only check that the device is all zeros
pub const VERIFY_ZERO: [PatternSpec; 2] = [Fixed(&[0x00]), End];

/// Read-only check that the device is all ones
pub const VERIFY_ONE: [PatternSpec; 2] = [Fixed(&[0xFF]), End];
