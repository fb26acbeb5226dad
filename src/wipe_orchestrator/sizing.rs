// Byte accounting for a whole wipe
//
// `round_size` predicts every byte the orchestrator will move, so progress and
// ETA can be measured against a fixed total before the first block is written.

use crate::algorithms::MethodClass;
use crate::VerifyLevel;

/// Returns `(round_size, effective_pass_size)`.
///
/// `base_pass_size` is one traversal of the method's pattern list. It doubles when
/// every pass is read back. On top of the rounds come the final pass and its
/// read-back, which depend on the method class.
pub fn round_size(
    base_pass_size: u64,
    device_size: u64,
    rounds: u32,
    noblank: bool,
    verify: VerifyLevel,
    class: MethodClass,
) -> (u64, u64) {
    let rounds = u64::from(rounds.max(1));

    if class == MethodClass::VerifyOnly {
        return (device_size, device_size);
    }

    let pass_size = if verify == VerifyLevel::All {
        base_pass_size * 2
    } else {
        base_pass_size
    };
    let mut total = pass_size * rounds;

    match class {
        MethodClass::Ops2 => {
            // Final random pass replaces the blank
            total += device_size;
            if verify.verifies_last() {
                total += device_size;
            }
        }
        _ => {
            if !noblank {
                total += device_size;
                if verify.verifies_last() {
                    total += device_size;
                }
            } else if verify == VerifyLevel::Last {
                total += device_size;
            }
        }
    }

    if class == MethodClass::Enhanced {
        if verify != VerifyLevel::All {
            total += device_size * rounds;
        }
        if verify == VerifyLevel::Last && noblank {
            total = total.saturating_sub(device_size);
        }
    }

    (total, pass_size)
}
