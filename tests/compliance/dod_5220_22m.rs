//! DoD 5220.22-M compliance tests
//!
//! The seven-pass variant writes b, !b, random, c, d, !d, random; the short
//! variant writes b, !b, random. Both blank the device afterwards unless told not to.
use crate::common::mock_device::MockDevice;
use crate::common::test_helpers::{context_with, ScriptedEntropy};
use blockwipe::crypto::{PrngKind, SEED_LEN};
use blockwipe::{run_method, Method, ResultCode, VerifyLevel, WipeOptions};
use std::sync::Arc;

const SIZE: usize = 16 * 1024;
const BLOCK: usize = 4096;

/// Pattern bytes first, then enough seed material for every random pass
fn entropy(pattern_bytes: &[u8], seeds: usize) -> Arc<ScriptedEntropy> {
    let mut script = pattern_bytes.to_vec();
    script.extend((0..seeds * SEED_LEN).map(|i| (i * 7 + 3) as u8));
    Arc::new(ScriptedEntropy::new(script))
}

fn options(method: Method, verify: VerifyLevel, noblank: bool) -> WipeOptions {
    WipeOptions {
        method,
        verify,
        noblank,
        prng: PrngKind::Isaac64,
        ..Default::default()
    }
}

#[test]
fn test_dod_522022m_pass_sequence() {
    let (device, handle) = MockDevice::new(SIZE, 0x3C);
    let mut ctx = context_with(
        device,
        SIZE as u64,
        BLOCK,
        entropy(&[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77], 2),
        PrngKind::Isaac64,
    );

    let outcome = run_method(&mut ctx, &options(Method::Dod522022M, VerifyLevel::None, false));
    assert_eq!(outcome.result, ResultCode::Clean);

    let heads: Vec<Option<u8>> = handle.write_passes().iter().map(|p| p.uniform).collect();
    assert_eq!(
        heads,
        vec![
            Some(0x11), // b
            Some(0xEE), // !b
            None,       // random
            Some(0x44), // c, the fourth drawn byte
            Some(0x55), // d, the fifth drawn byte
            Some(0xAA), // !d
            None,       // random
            Some(0x00), // blank
        ]
    );
    for pass in handle.write_passes() {
        assert_eq!(pass.bytes_written, SIZE, "Every pass covers the whole device");
    }
}

#[test]
fn test_dod_short_pass_sequence_with_verify_all() {
    let (device, handle) = MockDevice::new(SIZE, 0x3C);
    let mut ctx = context_with(
        device,
        SIZE as u64,
        BLOCK,
        entropy(&[0xF0, 0x00, 0x00], 1),
        PrngKind::Isaac64,
    );

    let outcome = run_method(&mut ctx, &options(Method::DodShort, VerifyLevel::All, false));
    assert_eq!(outcome.result, ResultCode::Clean);

    let passes = handle.passes();
    // Each write is followed by its read-back, the blank included
    assert_eq!(passes.len(), 8);
    for pair in passes.chunks(2) {
        assert!(pair[0].is_write());
        assert_eq!(pair[1].bytes_read, SIZE);
        assert_eq!(pair[1].bytes_written, 0);
    }
    let heads: Vec<Option<u8>> = handle.write_passes().iter().map(|p| p.uniform).collect();
    assert_eq!(heads, vec![Some(0xF0), Some(0x0F), None, Some(0x00)]);
    assert!(handle.data().iter().all(|&b| b == 0));
}

#[test]
fn test_dod_noblank_keeps_last_random_pass() {
    let (device, handle) = MockDevice::new(SIZE, 0x00);
    let mut ctx = context_with(
        device,
        SIZE as u64,
        BLOCK,
        entropy(&[0x5A, 0x00, 0x00], 1),
        PrngKind::Isaac64,
    );

    let outcome = run_method(&mut ctx, &options(Method::DodShort, VerifyLevel::Last, true));
    assert_eq!(outcome.result, ResultCode::Clean);

    let passes = handle.passes();
    assert_eq!(passes.len(), 4, "Three writes, then the last one read back");
    assert_eq!(passes[3].bytes_read, SIZE);
    assert!(handle.data().iter().any(|&b| b != 0));
}

#[test]
fn test_dod_fails_on_exhausted_entropy() {
    let (device, handle) = MockDevice::new(SIZE, 0x3C);
    let mut ctx = context_with(
        device,
        SIZE as u64,
        BLOCK,
        Arc::new(ScriptedEntropy::new(vec![0x01, 0x02])),
        PrngKind::Isaac64,
    );

    let outcome = run_method(&mut ctx, &options(Method::Dod522022M, VerifyLevel::Last, false));

    assert_eq!(outcome.result, ResultCode::Fatal);
    assert_eq!(outcome.result.code(), -1);
    assert!(handle.passes().is_empty(), "Nothing is written without the draw");
}
