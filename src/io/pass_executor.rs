// Pass executor
//
// Four routines stream one full pass over a device: write a static pattern, verify
// a static pattern, write a PRNG stream, verify a PRNG stream. All of them share
// `run_blocks`, which walks the device in `block_size` steps from offset 0:
//
//   - a hard I/O error aborts the pass with `Err`
//   - a short write adds the shortfall to `pass_errors`
//   - a short read, or any mismatch in a block, adds exactly 1 to `verify_errors`
//   - after a short transfer the position skips forward by the shortfall
//   - the cancellation token is checked after every block
//
// Buffers are owned by the routine and dropped on every exit path.

use crate::context::WipeContext;
use crate::crypto::{PrngState, Seed};
use crate::error::{IoOp, PassStatus, WipeError, WipeResult};
use crate::logging::LogLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Write,
    Verify,
}

/// Supplies the bytes expected at each successive block
trait BlockSource {
    fn next_block(&mut self, len: usize) -> &[u8];
}

/// A pattern tiled across `block_size + 2 * pattern_len` bytes
///
/// Slices start at a rotating offset so the pattern phase carries across block
/// boundaries even when the pattern length does not divide the block size.
struct PatternWindow {
    window: Vec<u8>,
    pattern_len: usize,
    offset: usize,
}

impl PatternWindow {
    fn new(pattern: &[u8], block_size: usize) -> Self {
        let pattern_len = pattern.len();
        let window = pattern
            .iter()
            .copied()
            .cycle()
            .take(block_size + 2 * pattern_len)
            .collect();
        Self {
            window,
            pattern_len,
            offset: 0,
        }
    }
}

impl BlockSource for PatternWindow {
    fn next_block(&mut self, len: usize) -> &[u8] {
        let start = self.offset;
        self.offset = (len + self.offset) % self.pattern_len;
        &self.window[start..start + len]
    }
}

/// Block-by-block output of a freshly seeded PRNG
struct PrngBlocks {
    state: PrngState,
    buf: Vec<u8>,
}

impl PrngBlocks {
    fn new(ctx: &WipeContext, seed: &Seed) -> Self {
        Self {
            state: ctx.prng.init(seed.as_bytes()),
            buf: vec![0u8; ctx.block_size],
        }
    }
}

impl BlockSource for PrngBlocks {
    fn next_block(&mut self, len: usize) -> &[u8] {
        let block = &mut self.buf[..len];
        self.state.read(block);
        block
    }
}

fn check_pattern(pattern: &[u8]) -> WipeResult<()> {
    if pattern.is_empty() {
        return Err(WipeError::InvalidPattern {
            index: 0,
            reason: "zero-length static pattern".to_string(),
        });
    }
    Ok(())
}

/// Write `pattern` repeatedly across the whole device, then flush
pub fn write_static(ctx: &mut WipeContext, pattern: &[u8]) -> WipeResult<PassStatus> {
    check_pattern(pattern)?;
    let mut source = PatternWindow::new(pattern, ctx.block_size);
    run_blocks(ctx, Direction::Write, &mut source)
}

/// Read the device back and compare it against `pattern` in the same phase it was written
pub fn verify_static(ctx: &mut WipeContext, pattern: &[u8]) -> WipeResult<PassStatus> {
    check_pattern(pattern)?;
    let mut source = PatternWindow::new(pattern, ctx.block_size);
    run_blocks(ctx, Direction::Verify, &mut source)
}

/// Seed the PRNG once and write its stream across the whole device
pub fn write_random(ctx: &mut WipeContext, seed: &Seed) -> WipeResult<PassStatus> {
    let mut source = PrngBlocks::new(ctx, seed);
    run_blocks(ctx, Direction::Write, &mut source)
}

/// Reseed with the same `seed`, regenerate the stream and compare it with the device
pub fn verify_random(ctx: &mut WipeContext, seed: &Seed) -> WipeResult<PassStatus> {
    let mut source = PrngBlocks::new(ctx, seed);
    run_blocks(ctx, Direction::Verify, &mut source)
}

fn run_blocks<S: BlockSource>(
    ctx: &mut WipeContext,
    direction: Direction,
    source: &mut S,
) -> WipeResult<PassStatus> {
    let block_size = ctx.block_size as u64;
    let progress = ctx.progress();

    if direction == Direction::Verify {
        ctx.device
            .flush_to_storage()
            .map_err(|e| ctx.io_error(IoOp::Flush, e))?;
    }
    ctx.device
        .seek_to(0)
        .map_err(|e| ctx.io_error(IoOp::Seek, e))?;

    let mut readback = match direction {
        Direction::Verify => vec![0u8; ctx.block_size],
        Direction::Write => Vec::new(),
    };
    let mut counted: u64 = 0;
    let mut offset: u64 = 0;
    let mut remaining = ctx.size;

    while remaining > 0 {
        let len = block_size.min(remaining) as usize;
        let expected = source.next_block(len);

        let moved = match direction {
            Direction::Write => {
                let written = ctx
                    .device
                    .write_block(expected)
                    .map_err(|e| ctx.io_error(IoOp::Write, e))?;
                let written = written.min(len);
                if written < len {
                    let shortfall = (len - written) as u64;
                    progress.add_pass_errors(shortfall);
                    counted += shortfall;
                    ctx.note(
                        LogLevel::Warning,
                        format!("Short write at offset {}: {} of {} bytes", offset, written, len),
                    );
                    ctx.device
                        .seek_forward(shortfall)
                        .map_err(|e| ctx.io_error(IoOp::Seek, e))?;
                }
                written
            }
            Direction::Verify => {
                let block = &mut readback[..len];
                let read = ctx
                    .device
                    .read_block(block)
                    .map_err(|e| ctx.io_error(IoOp::Read, e))?;
                let read = read.min(len);
                if read < len {
                    progress.add_verify_errors(1);
                    counted += 1;
                    ctx.note(
                        LogLevel::Warning,
                        format!("Short read at offset {}: {} of {} bytes", offset, read, len),
                    );
                    ctx.device
                        .seek_forward((len - read) as u64)
                        .map_err(|e| ctx.io_error(IoOp::Seek, e))?;
                } else if block != expected {
                    progress.add_verify_errors(1);
                    counted += 1;
                    ctx.note(
                        LogLevel::Error,
                        format!("Verification mismatch in block at offset {}", offset),
                    );
                }
                read
            }
        };

        progress.add_done(moved as u64);
        offset += len as u64;
        remaining -= len as u64;
        ctx.cancel.check()?;
    }

    if direction == Direction::Write {
        ctx.device
            .flush_to_storage()
            .map_err(|e| ctx.io_error(IoOp::Flush, e))?;
    }

    Ok(PassStatus::from_errors(counted))
}
