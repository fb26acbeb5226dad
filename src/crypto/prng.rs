// Pseudorandom stream adapter
//
// Every generator exposes the same two operations: build a state from a seed, and
// read an arbitrary number of bytes from it. Generators emit output in fixed native
// blocks; `fill_tiled` serves whole blocks directly and takes an odd tail from one
// extra block whose remainder is discarded. Two states built from the same seed and
// read with the same sequence of request sizes therefore produce identical bytes,
// which is what random-pass verification relies on.

use crate::error::WipeError;
use aes::Aes256;
use ascon_hash::{AsconXof, ExtendableOutput, Update, XofReader};
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_isaac::{Isaac64Rng, IsaacRng};
use rand_mt::Mt;
use rand_xoshiro::Xoshiro256StarStar;
use rc4::{consts::U32, KeyInit, Rc4};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Largest native block of any generator
pub const MAX_NATIVE_BLOCK: usize = 64;

/// A seeded generator with a fixed native output size
pub trait RandomStream: Send {
    const BLOCK_SIZE: usize;

    fn from_seed(seed: &[u8]) -> Self
    where
        Self: Sized;

    /// Fill `block`, which is exactly `BLOCK_SIZE` bytes long
    fn next_block(&mut self, block: &mut [u8]);
}

/// Fill `dest` from `stream`, truncating the final native block if needed
pub fn fill_tiled<S: RandomStream>(stream: &mut S, dest: &mut [u8]) {
    let mut chunks = dest.chunks_exact_mut(S::BLOCK_SIZE);
    for chunk in &mut chunks {
        stream.next_block(chunk);
    }

    let tail = chunks.into_remainder();
    if !tail.is_empty() {
        let mut scratch = [0u8; MAX_NATIVE_BLOCK];
        stream.next_block(&mut scratch[..S::BLOCK_SIZE]);
        let n = tail.len();
        tail.copy_from_slice(&scratch[..n]);
    }
}

/// Condense a seed of any length into a 32-byte key
fn key32(seed: &[u8]) -> [u8; 32] {
    Sha256::digest(seed).into()
}

/// Derive a second, independent 32-byte value from the seed
fn key32_tagged(seed: &[u8], tag: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    Digest::update(&mut hasher, tag);
    Digest::update(&mut hasher, seed);
    hasher.finalize().into()
}

/// Mersenne Twister (MT19937), 4-byte output
pub struct MersenneTwister(Mt);

impl RandomStream for MersenneTwister {
    const BLOCK_SIZE: usize = 4;

    fn from_seed(seed: &[u8]) -> Self {
        let mut words: Vec<u32> = seed
            .chunks(4)
            .map(|c| {
                let mut w = [0u8; 4];
                w[..c.len()].copy_from_slice(c);
                u32::from_le_bytes(w)
            })
            .collect();
        if words.is_empty() {
            words = key32(seed)
                .chunks(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
        }
        MersenneTwister(Mt::new_with_key(words.iter().copied()))
    }

    fn next_block(&mut self, block: &mut [u8]) {
        block.copy_from_slice(&self.0.next_u32().to_le_bytes());
    }
}

/// ISAAC, 4-byte output
pub struct Isaac(IsaacRng);

impl RandomStream for Isaac {
    const BLOCK_SIZE: usize = 4;

    fn from_seed(seed: &[u8]) -> Self {
        Isaac(IsaacRng::from_seed(key32(seed)))
    }

    fn next_block(&mut self, block: &mut [u8]) {
        block.copy_from_slice(&self.0.next_u32().to_le_bytes());
    }
}

/// ISAAC-64, 8-byte output
pub struct Isaac64(Isaac64Rng);

impl RandomStream for Isaac64 {
    const BLOCK_SIZE: usize = 8;

    fn from_seed(seed: &[u8]) -> Self {
        Isaac64(Isaac64Rng::from_seed(key32(seed)))
    }

    fn next_block(&mut self, block: &mut [u8]) {
        block.copy_from_slice(&self.0.next_u64().to_le_bytes());
    }
}

/// Additive lagged Fibonacci generator, lags (24, 55), 8-byte output
pub struct LaggedFibonacci {
    state: [u64; LFG_LONG_LAG],
    pos: usize,
}

const LFG_LONG_LAG: usize = 55;
const LFG_SHORT_LAG: usize = 24;

impl RandomStream for LaggedFibonacci {
    const BLOCK_SIZE: usize = 8;

    fn from_seed(seed: &[u8]) -> Self {
        let mut state = [0u64; LFG_LONG_LAG];
        let mut counter = 0u32;
        let mut filled = 0usize;
        while filled < LFG_LONG_LAG {
            let digest = key32_tagged(seed, &counter.to_le_bytes());
            for word in digest.chunks_exact(8) {
                if filled == LFG_LONG_LAG {
                    break;
                }
                let mut w = [0u8; 8];
                w.copy_from_slice(word);
                state[filled] = u64::from_le_bytes(w);
                filled += 1;
            }
            counter += 1;
        }
        // At least one odd element keeps the period maximal
        state[0] |= 1;
        Self { state, pos: 0 }
    }

    fn next_block(&mut self, block: &mut [u8]) {
        let short = (self.pos + LFG_LONG_LAG - LFG_SHORT_LAG) % LFG_LONG_LAG;
        let value = self.state[self.pos].wrapping_add(self.state[short]);
        self.state[self.pos] = value;
        self.pos = (self.pos + 1) % LFG_LONG_LAG;
        block.copy_from_slice(&value.to_le_bytes());
    }
}

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// AES-256 in counter mode, two cipher blocks per step
pub struct AesCtr(Aes256Ctr);

impl RandomStream for AesCtr {
    const BLOCK_SIZE: usize = 32;

    fn from_seed(seed: &[u8]) -> Self {
        let key = key32(seed);
        let iv_material = key32_tagged(seed, b"aes-ctr-iv");
        let mut iv = [0u8; 16];
        iv.copy_from_slice(&iv_material[..16]);
        AesCtr(Aes256Ctr::new(&key.into(), &iv.into()))
    }

    fn next_block(&mut self, block: &mut [u8]) {
        block.fill(0);
        self.0.apply_keystream(block);
    }
}

/// ChaCha20, one 64-byte keystream block per step
pub struct ChaCha20(ChaCha20Rng);

impl RandomStream for ChaCha20 {
    const BLOCK_SIZE: usize = 64;

    fn from_seed(seed: &[u8]) -> Self {
        ChaCha20(ChaCha20Rng::from_seed(key32(seed)))
    }

    fn next_block(&mut self, block: &mut [u8]) {
        self.0.fill_bytes(block);
    }
}

/// Ascon XOF keyed by the seed, read 40 bytes (one permutation state) at a time
pub struct AsconPrf(<AsconXof as ExtendableOutput>::Reader);

impl RandomStream for AsconPrf {
    const BLOCK_SIZE: usize = 40;

    fn from_seed(seed: &[u8]) -> Self {
        let mut xof = AsconXof::default();
        Update::update(&mut xof, seed);
        AsconPrf(xof.finalize_xof())
    }

    fn next_block(&mut self, block: &mut [u8]) {
        self.0.read(block);
    }
}

/// RC4 keystream with the first 3072 bytes dropped
pub struct Rc4Stream(Rc4<U32>);

impl Rc4Stream {
    const DROP: usize = 3072;
}

impl RandomStream for Rc4Stream {
    const BLOCK_SIZE: usize = 32;

    fn from_seed(seed: &[u8]) -> Self {
        let key = key32(seed);
        let mut cipher = Rc4::<U32>::new(&key.into());
        let mut discard = [0u8; Self::DROP];
        cipher.apply_keystream(&mut discard);
        Rc4Stream(cipher)
    }

    fn next_block(&mut self, block: &mut [u8]) {
        block.fill(0);
        self.0.apply_keystream(block);
    }
}

/// xoshiro256**, 8-byte output
pub struct Xoroshiro256(Xoshiro256StarStar);

impl RandomStream for Xoroshiro256 {
    const BLOCK_SIZE: usize = 8;

    fn from_seed(seed: &[u8]) -> Self {
        Xoroshiro256(Xoshiro256StarStar::from_seed(key32(seed)))
    }

    fn next_block(&mut self, block: &mut [u8]) {
        block.copy_from_slice(&self.0.next_u64().to_le_bytes());
    }
}

/// Minimal HMAC-SHA256 helper
fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    const BLOCK_SIZE: usize = 64;
    let mut key_block = if key.len() > BLOCK_SIZE {
        Sha256::digest(key).to_vec()
    } else {
        key.to_vec()
    };
    key_block.resize(BLOCK_SIZE, 0u8);

    let mut ipad = [0x36u8; BLOCK_SIZE];
    let mut opad = [0x5cu8; BLOCK_SIZE];
    for i in 0..BLOCK_SIZE {
        ipad[i] ^= key_block[i];
        opad[i] ^= key_block[i];
    }

    let mut inner = Sha256::new();
    Digest::update(&mut inner, ipad);
    Digest::update(&mut inner, data);
    let inner_res = inner.finalize();

    let mut outer = Sha256::new();
    Digest::update(&mut outer, opad);
    Digest::update(&mut outer, inner_res);
    outer.finalize().into()
}

/// HMAC-DRBG (SHA-256) instantiated from the seed, 32-byte output
pub struct ShaDrbg {
    k: [u8; 32],
    v: [u8; 32],
}

impl ShaDrbg {
    fn update(&mut self, provided_data: &[u8]) {
        // K = HMAC(K, V || 0x00 || data); V = HMAC(K, V)
        let mut t = Vec::with_capacity(33 + provided_data.len());
        t.extend_from_slice(&self.v);
        t.push(0x00);
        t.extend_from_slice(provided_data);
        self.k = hmac_sha256(&self.k, &t);
        self.v = hmac_sha256(&self.k, &self.v);

        if !provided_data.is_empty() {
            let mut t2 = Vec::with_capacity(33 + provided_data.len());
            t2.extend_from_slice(&self.v);
            t2.push(0x01);
            t2.extend_from_slice(provided_data);
            self.k = hmac_sha256(&self.k, &t2);
            self.v = hmac_sha256(&self.k, &self.v);
        }
    }
}

impl RandomStream for ShaDrbg {
    const BLOCK_SIZE: usize = 32;

    fn from_seed(seed: &[u8]) -> Self {
        let mut drbg = Self {
            k: [0u8; 32],
            v: [0x01u8; 32],
        };
        drbg.update(seed);
        drbg
    }

    fn next_block(&mut self, block: &mut [u8]) {
        self.v = hmac_sha256(&self.k, &self.v);
        block.copy_from_slice(&self.v);
    }
}

/// Selectable generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrngKind {
    MersenneTwister,
    Isaac,
    Isaac64,
    LaggedFibonacci,
    AesCtr,
    ChaCha20,
    AsconPrf,
    Rc4,
    Xoroshiro256,
    ShaDrbg,
}

impl PrngKind {
    pub const ALL: [PrngKind; 10] = [
        PrngKind::MersenneTwister,
        PrngKind::Isaac,
        PrngKind::Isaac64,
        PrngKind::LaggedFibonacci,
        PrngKind::AesCtr,
        PrngKind::ChaCha20,
        PrngKind::AsconPrf,
        PrngKind::Rc4,
        PrngKind::Xoroshiro256,
        PrngKind::ShaDrbg,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PrngKind::MersenneTwister => "twister",
            PrngKind::Isaac => "isaac",
            PrngKind::Isaac64 => "isaac64",
            PrngKind::LaggedFibonacci => "lagged_fibonacci",
            PrngKind::AesCtr => "aes_ctr",
            PrngKind::ChaCha20 => "chacha20",
            PrngKind::AsconPrf => "ascon_prf",
            PrngKind::Rc4 => "rc4",
            PrngKind::Xoroshiro256 => "xoroshiro256",
            PrngKind::ShaDrbg => "sha_drbg",
        }
    }

    pub fn native_block_size(&self) -> usize {
        match self {
            PrngKind::MersenneTwister => MersenneTwister::BLOCK_SIZE,
            PrngKind::Isaac => Isaac::BLOCK_SIZE,
            PrngKind::Isaac64 => Isaac64::BLOCK_SIZE,
            PrngKind::LaggedFibonacci => LaggedFibonacci::BLOCK_SIZE,
            PrngKind::AesCtr => AesCtr::BLOCK_SIZE,
            PrngKind::ChaCha20 => ChaCha20::BLOCK_SIZE,
            PrngKind::AsconPrf => AsconPrf::BLOCK_SIZE,
            PrngKind::Rc4 => Rc4Stream::BLOCK_SIZE,
            PrngKind::Xoroshiro256 => Xoroshiro256::BLOCK_SIZE,
            PrngKind::ShaDrbg => ShaDrbg::BLOCK_SIZE,
        }
    }

    /// Build a fresh generator state from `seed`
    pub fn init(&self, seed: &[u8]) -> PrngState {
        match self {
            PrngKind::MersenneTwister => PrngState::MersenneTwister(MersenneTwister::from_seed(seed)),
            PrngKind::Isaac => PrngState::Isaac(Isaac::from_seed(seed)),
            PrngKind::Isaac64 => PrngState::Isaac64(Isaac64::from_seed(seed)),
            PrngKind::LaggedFibonacci => PrngState::LaggedFibonacci(Box::new(
                LaggedFibonacci::from_seed(seed),
            )),
            PrngKind::AesCtr => PrngState::AesCtr(Box::new(AesCtr::from_seed(seed))),
            PrngKind::ChaCha20 => PrngState::ChaCha20(ChaCha20::from_seed(seed)),
            PrngKind::AsconPrf => PrngState::AsconPrf(AsconPrf::from_seed(seed)),
            PrngKind::Rc4 => PrngState::Rc4(Box::new(Rc4Stream::from_seed(seed))),
            PrngKind::Xoroshiro256 => PrngState::Xoroshiro256(Xoroshiro256::from_seed(seed)),
            PrngKind::ShaDrbg => PrngState::ShaDrbg(ShaDrbg::from_seed(seed)),
        }
    }
}

impl fmt::Display for PrngKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrngKind {
    type Err = WipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase();
        PrngKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| WipeError::InvalidOptions(format!("unknown prng '{}'", s)))
    }
}

/// Opaque generator state, one variant per algorithm
pub enum PrngState {
    MersenneTwister(MersenneTwister),
    Isaac(Isaac),
    Isaac64(Isaac64),
    LaggedFibonacci(Box<LaggedFibonacci>),
    AesCtr(Box<AesCtr>),
    ChaCha20(ChaCha20),
    AsconPrf(AsconPrf),
    Rc4(Box<Rc4Stream>),
    Xoroshiro256(Xoroshiro256),
    ShaDrbg(ShaDrbg),
}

impl PrngState {
    /// Fill `dest` with the next `dest.len()` bytes of the stream
    pub fn read(&mut self, dest: &mut [u8]) {
        match self {
            PrngState::MersenneTwister(s) => fill_tiled(s, dest),
            PrngState::Isaac(s) => fill_tiled(s, dest),
            PrngState::Isaac64(s) => fill_tiled(s, dest),
            PrngState::LaggedFibonacci(s) => fill_tiled(s.as_mut(), dest),
            PrngState::AesCtr(s) => fill_tiled(s.as_mut(), dest),
            PrngState::ChaCha20(s) => fill_tiled(s, dest),
            PrngState::AsconPrf(s) => fill_tiled(s, dest),
            PrngState::Rc4(s) => fill_tiled(s.as_mut(), dest),
            PrngState::Xoroshiro256(s) => fill_tiled(s, dest),
            PrngState::ShaDrbg(s) => fill_tiled(s, dest),
        }
    }
}
