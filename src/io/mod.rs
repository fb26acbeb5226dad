pub mod device;
pub mod pass_executor;


// Re-exports
pub use device::FileDevice;
pub use pass_executor::{verify_random, verify_static, write_random, write_static};

use std::io;

/// Default transfer size when a device reports none
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Sequential byte-addressed storage the pass loops stream over
///
/// Reads and writes are single calls that may move fewer bytes than asked; the
/// caller decides what a short transfer means. Any `Err` is a hard failure.
pub trait BlockDevice: Send {
    /// Position at an absolute offset from the start of the device
    fn seek_to(&mut self, offset: u64) -> io::Result<u64>;

    /// Move the position forward, skipping bytes a short transfer left behind
    fn seek_forward(&mut self, delta: u64) -> io::Result<u64>;

    fn write_block(&mut self, buf: &[u8]) -> io::Result<usize>;

    fn read_block(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Push written data to stable storage
    fn flush_to_storage(&mut self) -> io::Result<()>;

    /// Device name for logs and reports
    fn name(&self) -> &str;
}

impl<D: BlockDevice + ?Sized> BlockDevice for Box<D> {
    fn seek_to(&mut self, offset: u64) -> io::Result<u64> {
        (**self).seek_to(offset)
    }

    fn seek_forward(&mut self, delta: u64) -> io::Result<u64> {
        (**self).seek_forward(delta)
    }

    fn write_block(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write_block(buf)
    }

    fn read_block(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_block(buf)
    }

    fn flush_to_storage(&mut self) -> io::Result<()> {
        (**self).flush_to_storage()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
