use crate::error::{IoOp, WipeError, WipeResult};
use ring::rand::{SecureRandom, SystemRandom};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Length of every seed drawn for a random pass
pub const SEED_LEN: usize = 64;

/// Byte-stream entropy provider
pub trait EntropySource: Send + Sync {
    /// Perform one read into `dest` and return how many bytes were produced.
    ///
    /// A count lower than `dest.len()` is a short read; callers treat it as fatal.
    fn read_entropy(&self, dest: &mut [u8]) -> std::io::Result<usize>;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// Fill `dest` completely from `source` in a single read
pub fn fill_exact(source: &dyn EntropySource, dest: &mut [u8]) -> WipeResult<()> {
    let got = source
        .read_entropy(dest)
        .map_err(|e| WipeError::io(IoOp::Read, source.name(), e))?;

    if got != dest.len() {
        return Err(WipeError::EntropyShortRead {
            source_name: source.name().to_string(),
            wanted: dest.len(),
            got,
        });
    }
    Ok(())
}

/// Entropy read from a character device such as `/dev/urandom`
pub struct FileEntropy {
    file: File,
    name: String,
}

impl FileEntropy {
    pub const DEFAULT_PATH: &'static str = "/dev/urandom";

    pub fn open(path: impl AsRef<Path>) -> WipeResult<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        let file = File::open(&path).map_err(|e| WipeError::io(IoOp::Open, &name, e))?;
        Ok(Self { file, name })
    }

    pub fn urandom() -> WipeResult<Self> {
        Self::open(Self::DEFAULT_PATH)
    }
}

impl EntropySource for FileEntropy {
    fn read_entropy(&self, dest: &mut [u8]) -> std::io::Result<usize> {
        (&self.file).read(dest)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Ring-based system random (uses OS facilities)
pub struct RingEntropy {
    rng: SystemRandom,
}

impl Default for RingEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl RingEntropy {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl EntropySource for RingEntropy {
    fn read_entropy(&self, dest: &mut [u8]) -> std::io::Result<usize> {
        self.rng
            .fill(dest)
            .map_err(|_| std::io::Error::other("ring SystemRandom failed"))?;
        Ok(dest.len())
    }

    fn name(&self) -> &str {
        "ring-system-random"
    }
}

/// Entropy bytes that initialize a PRNG for exactly one pass
///
/// The buffer is zeroized when the seed is dropped.
#[derive(Clone)]
pub struct Seed {
    bytes: Zeroizing<Vec<u8>>,
}

impl Seed {
    /// Read a fresh seed of `SEED_LEN` bytes
    pub fn draw(source: &dyn EntropySource) -> WipeResult<Self> {
        let mut bytes = Zeroizing::new(vec![0u8; SEED_LEN]);
        fill_exact(source, &mut bytes)?;
        Ok(Self { bytes })
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: Zeroizing::new(bytes.to_vec()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Seed").field("len", &self.bytes.len()).finish()
    }
}
