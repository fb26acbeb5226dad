//! Common test helper functions
use blockwipe::crypto::{EntropySource, PrngKind, RingEntropy};
use blockwipe::io::BlockDevice;
use blockwipe::WipeContext;
use std::fs;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Entropy that replays a fixed byte script and then runs dry
#[allow(dead_code)]
pub struct ScriptedEntropy {
    script: Mutex<Vec<u8>>,
}

#[allow(dead_code)]
impl ScriptedEntropy {
    pub fn new(script: Vec<u8>) -> Self {
        Self {
            script: Mutex::new(script),
        }
    }

    /// Script of `n` copies of `byte`
    pub fn repeat(byte: u8, n: usize) -> Self {
        Self::new(vec![byte; n])
    }
}

impl EntropySource for ScriptedEntropy {
    fn read_entropy(&self, dest: &mut [u8]) -> std::io::Result<usize> {
        let mut script = self.script.lock().unwrap();
        let n = dest.len().min(script.len());
        dest[..n].copy_from_slice(&script[..n]);
        script.drain(..n);
        Ok(n)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Context over any device with OS entropy
#[allow(dead_code)]
pub fn context(device: impl BlockDevice + 'static, size: u64, block_size: usize) -> WipeContext {
    context_with(device, size, block_size, Arc::new(RingEntropy::new()), PrngKind::Isaac64)
}

#[allow(dead_code)]
pub fn context_with(
    device: impl BlockDevice + 'static,
    size: u64,
    block_size: usize,
    entropy: Arc<dyn EntropySource>,
    prng: PrngKind,
) -> WipeContext {
    WipeContext::new(Box::new(device), size, block_size, entropy, prng)
        .expect("Failed to build wipe context")
}

/// Temp file filled with `fill`, standing in for a used drive
#[allow(dead_code)]
pub fn temp_drive(size: usize, fill: u8) -> std::io::Result<NamedTempFile> {
    let mut temp = NamedTempFile::new()?;
    temp.write_all(&vec![fill; size])?;
    temp.flush()?;
    Ok(temp)
}

/// Verify that a file contains only zeros
#[allow(dead_code)]
pub fn verify_all_zeros(path: &std::path::Path) -> std::io::Result<bool> {
    verify_pattern(path, &[0x00])
}

/// Verify that a file contains a specific pattern
#[allow(dead_code)]
pub fn verify_pattern(path: &std::path::Path, pattern: &[u8]) -> std::io::Result<bool> {
    let mut file = fs::File::open(path)?;
    let mut buffer = vec![0u8; 4096];
    let mut offset = 0usize;

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }

        for &byte in &buffer[..bytes_read] {
            if byte != pattern[offset % pattern.len()] {
                return Ok(false);
            }
            offset += 1;
        }
    }

    Ok(true)
}

/// Shannon entropy of a buffer, in bits per byte
#[allow(dead_code)]
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut counts = [0usize; 256];
    for &b in data {
        counts[b as usize] += 1;
    }
    let len = data.len() as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / len;
            -p * p.log2()
        })
        .sum()
}
