// File-backed block device
//
// Works on block-special files and on regular files. Size comes from the
// BLKGETSIZE64 ioctl for block devices and from metadata otherwise; the transfer
// size defaults to the preferred I/O size the kernel reports.

use super::{BlockDevice, DEFAULT_BLOCK_SIZE};
use crate::error::{IoOp, WipeError, WipeResult};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

#[cfg(target_os = "linux")]
mod ioctl {
    nix::ioctl_read!(blkgetsize64, 0x12, 114, u64);
}

pub struct FileDevice {
    file: File,
    path: PathBuf,
    name: String,
    size: u64,
    block_size: usize,
    is_block_device: bool,
}

impl FileDevice {
    /// Open `path` read/write and query its size and preferred block size
    pub fn open(path: impl AsRef<Path>) -> WipeResult<Self> {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| WipeError::io(IoOp::Open, &name, e))?;
        let metadata = file
            .metadata()
            .map_err(|e| WipeError::io(IoOp::Open, &name, e))?;

        let is_block_device = metadata.file_type().is_block_device();
        let size = if is_block_device {
            block_device_size(&file).map_err(|e| WipeError::io(IoOp::Open, &name, e))?
        } else {
            metadata.len()
        };

        let block_size = match metadata.blksize() {
            0 => DEFAULT_BLOCK_SIZE,
            n => n as usize,
        };

        tracing::debug!(device = %name, size, block_size, is_block_device, "Opened device");

        Ok(Self {
            file,
            path,
            name,
            size,
            block_size,
            is_block_device,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Preferred transfer size reported by the kernel
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn is_block_device(&self) -> bool {
        self.is_block_device
    }
}

#[cfg(target_os = "linux")]
fn block_device_size(file: &File) -> io::Result<u64> {
    use std::os::unix::io::AsRawFd;

    let mut size: u64 = 0;
    // SAFETY: the descriptor is open for the lifetime of `file` and `size` is a valid u64.
    unsafe { ioctl::blkgetsize64(file.as_raw_fd(), &mut size) }.map_err(io::Error::from)?;
    Ok(size)
}

#[cfg(not(target_os = "linux"))]
fn block_device_size(file: &File) -> io::Result<u64> {
    let mut handle = file;
    let size = handle.seek(SeekFrom::End(0))?;
    handle.seek(SeekFrom::Start(0))?;
    Ok(size)
}

impl BlockDevice for FileDevice {
    fn seek_to(&mut self, offset: u64) -> io::Result<u64> {
        self.file.seek(SeekFrom::Start(offset))
    }

    fn seek_forward(&mut self, delta: u64) -> io::Result<u64> {
        let delta = i64::try_from(delta)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "seek distance overflows i64"))?;
        self.file.seek(SeekFrom::Current(delta))
    }

    fn write_block(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn read_block(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn flush_to_storage(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_data()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for FileDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDevice")
            .field("path", &self.path)
            .field("size", &self.size)
            .field("block_size", &self.block_size)
            .finish()
    }
}
