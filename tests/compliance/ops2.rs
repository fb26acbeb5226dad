//! RCMP TSSIT OPS-II compliance tests
//!
//! Each round alternates one drawn byte and its complement over eight passes,
//! and the wipe always ends on a random pass instead of a blank.
use crate::common::mock_device::{Fault, MockDevice};
use crate::common::test_helpers::{context_with, ScriptedEntropy};
use blockwipe::crypto::{PrngKind, RingEntropy, SEED_LEN};
use blockwipe::{run_method, Method, ResultCode, VerifyLevel, WipeOptions};
use std::sync::Arc;

const SIZE: usize = 8 * 1024;
const BLOCK: usize = 4096;

#[test]
fn test_ops2_two_rounds_then_random() {
    let mut script = vec![0x3C, 0x81];
    script.extend(std::iter::repeat(0x42).take(SEED_LEN));
    let (device, handle) = MockDevice::new(SIZE, 0x00);
    let mut ctx = context_with(
        device,
        SIZE as u64,
        BLOCK,
        Arc::new(ScriptedEntropy::new(script)),
        PrngKind::AesCtr,
    );
    let opts = WipeOptions {
        method: Method::Ops2,
        rounds: 2,
        verify: VerifyLevel::Last,
        // Ignored: OPS-II never blanks
        noblank: false,
        ..Default::default()
    };

    let outcome = run_method(&mut ctx, &opts);
    assert_eq!(outcome.result, ResultCode::Clean);
    assert_eq!(outcome.progress.pass_count, 8);
    assert_eq!(outcome.progress.round_count, 2);

    let heads: Vec<Option<u8>> = handle.write_passes().iter().map(|p| p.uniform).collect();
    let mut expected = Vec::new();
    for byte in [0x3C, 0x81] {
        for i in 0..8 {
            expected.push(Some(if i % 2 == 0 { byte } else { !byte }));
        }
    }
    expected.push(None);
    assert_eq!(heads, expected);

    // Final random pass is read back, nothing else
    let passes = handle.passes();
    assert_eq!(passes.len(), 18);
    assert_eq!(passes[17].bytes_read, SIZE);
    assert!(handle.data().iter().any(|&b| b != 0));
}

#[test]
fn test_ops2_charges_errors_to_their_own_round() {
    // Two blocks per pass: round 1 spans write calls 1-16, round 3 calls 33-48
    let (device, _handle) = MockDevice::with_faults(
        SIZE,
        0x00,
        vec![
            Fault::ShortWrite {
                call: 3,
                shortfall: 10,
            },
            Fault::ShortWrite {
                call: 40,
                shortfall: 20,
            },
        ],
    );
    let mut ctx = context_with(
        device,
        SIZE as u64,
        BLOCK,
        Arc::new(RingEntropy::new()),
        PrngKind::AesCtr,
    );
    let opts = WipeOptions {
        method: Method::Ops2,
        rounds: 3,
        verify: VerifyLevel::None,
        ..Default::default()
    };

    let outcome = run_method(&mut ctx, &opts);
    let progress = outcome.progress;

    assert_eq!(outcome.result, ResultCode::CompletedWithErrors);
    assert_eq!(progress.round_count, 3);
    assert_eq!(progress.pass_count, 8);
    assert_eq!(progress.pass_size, u64::from(progress.pass_count) * SIZE as u64);
    assert_eq!(progress.pass_errors, 30);
    assert_eq!(progress.round_errors, 2, "Rounds 1 and 3 each recorded errors");
}
