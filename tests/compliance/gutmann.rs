//! Gutmann method compliance tests
//!
//! All 35 book entries are written exactly once per round, in an order drawn
//! from the entropy source.
use crate::common::mock_device::MockDevice;
use crate::common::test_helpers::{context_with, ScriptedEntropy};
use blockwipe::crypto::{PrngKind, RingEntropy};
use blockwipe::{run_method, Method, ResultCode, VerifyLevel, WipeOptions};
use std::sync::Arc;

const SIZE: usize = 8 * 1024;
const BLOCK: usize = 4096;

fn gutmann(noblank: bool) -> WipeOptions {
    WipeOptions {
        method: Method::Gutmann,
        verify: VerifyLevel::None,
        noblank,
        prng: PrngKind::Xoroshiro256,
        ..Default::default()
    }
}

/// Single-byte book entries, as multiset
fn uniform_entries() -> Vec<u8> {
    let mut expected = vec![0x55, 0xAA];
    expected.extend((0..16u8).map(|n| n * 0x11));
    expected.sort_unstable();
    expected
}

#[test]
fn test_gutmann_writes_every_book_entry_once() {
    let (device, handle) = MockDevice::new(SIZE, 0xE7);
    let mut ctx = context_with(
        device,
        SIZE as u64,
        BLOCK,
        Arc::new(RingEntropy::new()),
        PrngKind::Xoroshiro256,
    );

    let outcome = run_method(&mut ctx, &gutmann(true));
    assert_eq!(outcome.result, ResultCode::Clean);

    let passes = handle.write_passes();
    assert_eq!(passes.len(), 35);

    let mut uniform: Vec<u8> = passes.iter().filter_map(|p| p.uniform).collect();
    uniform.sort_unstable();
    assert_eq!(uniform, uniform_entries());
    assert_eq!(passes.iter().filter(|p| p.uniform.is_none()).count(), 17);
}

#[test]
fn test_zero_draws_keep_book_order() {
    // 35 zero draws pick the first unused entry each time; the rest seeds the PRNG
    let (device, handle) = MockDevice::new(SIZE, 0xE7);
    let mut ctx = context_with(
        device,
        SIZE as u64,
        BLOCK,
        Arc::new(ScriptedEntropy::repeat(0x00, 35 * 2 + 8 * 64)),
        PrngKind::ChaCha20,
    );

    let outcome = run_method(&mut ctx, &gutmann(false));
    assert_eq!(outcome.result, ResultCode::Clean);

    let heads: Vec<Option<u8>> = handle.write_passes().iter().map(|p| p.uniform).collect();
    assert_eq!(heads.len(), 36);
    assert!(heads[..4].iter().all(Option::is_none), "Book opens with four random passes");
    assert_eq!(heads[4], Some(0x55));
    assert_eq!(heads[5], Some(0xAA));
    assert_eq!(heads[9], Some(0x00));
    assert_eq!(heads[24], Some(0xFF));
    assert!(heads[31..35].iter().all(Option::is_none));
    assert_eq!(heads[35], Some(0x00), "Blank after the book");
}

#[test]
fn test_gutmann_rounds_reuse_one_order() {
    let (device, handle) = MockDevice::new(SIZE, 0xE7);
    let mut ctx = context_with(
        device,
        SIZE as u64,
        BLOCK,
        Arc::new(RingEntropy::new()),
        PrngKind::Xoroshiro256,
    );
    let opts = WipeOptions {
        rounds: 2,
        ..gutmann(true)
    };

    let outcome = run_method(&mut ctx, &opts);
    assert_eq!(outcome.result, ResultCode::Clean);

    let heads: Vec<Option<u8>> = handle.write_passes().iter().map(|p| p.uniform).collect();
    assert_eq!(heads.len(), 70);
    assert_eq!(heads[..35], heads[35..]);
}
