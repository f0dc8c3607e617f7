//! The 64-byte generator state block.
//!
//! Layout (sixteen little-endian 32-bit words, byte offsets):
//!
//! ```text
//! 0..16    constant domain-separation tag "expand 32-byte k" (never mutated)
//! 16..64   48-byte secret region: key material + counter + nonce
//! 48..52   word 12, the block counter (incremented before each keystream block)
//! 52..56   word 13, the jitter word (XORed with a timer sample on every rekey)
//! ```
//!
//! The secret region round-trips through persisted storage, so the byte
//! layout here is a wire format and must not change.

use zeroize::Zeroize;

/// Size of the full state block and of every keystream block.
pub const BLOCK_SIZE: usize = 64;

/// Size of the constant tag prefix.
pub const TAG_SIZE: usize = 16;

/// Size of the secret region (and of the persisted seed payload).
pub const SECRET_SIZE: usize = 48;

const COUNTER_OFFSET: usize = 48;
const JITTER_OFFSET: usize = 52;

/// Tag for 256-bit ChaCha20 keys. Always occupies the first 16 bytes.
pub const TAG: [u8; TAG_SIZE] = *b"expand 32-byte k";

/// Initialization seed: the ChaCha20 hash of the tag followed by the bytes
/// 1..=48, truncated to 48 bytes. Starts the generator in a semi-chaotic
/// state when no persisted seed is available.
pub const INIT_SEED: [u8; SECRET_SIZE] = [
    0xB0, 0x2A, 0xAE, 0x7D, 0xEE, 0xCB, 0xBB, 0xB1, 0xFC, 0x03, 0x6F, 0xDD, 0xDC, 0x7D, 0x76,
    0x67, 0x0C, 0xE8, 0x1F, 0x0D, 0xA3, 0xA0, 0xAA, 0x1E, 0xB0, 0xBD, 0x72, 0x6B, 0x2B, 0x4C,
    0x8A, 0x7E, 0x34, 0xFC, 0x37, 0x60, 0xF4, 0x1E, 0x22, 0xA0, 0x0B, 0xFB, 0x18, 0x84, 0x60,
    0xA5, 0x77, 0x72,
];

/// The generator's evolving 64-byte state.
///
/// Named accessors replace the manual byte/word aliasing of the original
/// single buffer: the tag, secret region, counter word, and jitter word each
/// have a dedicated entry point, while the underlying bytes stay contiguous
/// so the whole block can be fed to the block-hash core.
pub struct StateBlock {
    bytes: [u8; BLOCK_SIZE],
}

impl StateBlock {
    /// A zeroed block. Call [`reset`](Self::reset) before use.
    pub fn new() -> Self {
        Self {
            bytes: [0u8; BLOCK_SIZE],
        }
    }

    /// Install the constant tag and initializer.
    pub fn reset(&mut self) {
        self.bytes[..TAG_SIZE].copy_from_slice(&TAG);
        self.bytes[TAG_SIZE..].copy_from_slice(&INIT_SEED);
    }

    /// Full 64-byte view, for hashing.
    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.bytes
    }

    /// The 48-byte secret region.
    pub fn secret(&self) -> &[u8] {
        &self.bytes[TAG_SIZE..]
    }

    /// Mutable view of the secret region, for stirring and rekeying.
    pub fn secret_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[TAG_SIZE..]
    }

    /// Overwrite the secret region. The tag is untouched.
    pub fn set_secret(&mut self, secret: &[u8]) {
        self.bytes[TAG_SIZE..].copy_from_slice(&secret[..SECRET_SIZE]);
    }

    /// Increment the block counter word (wrapping).
    pub fn increment_counter(&mut self) {
        let word = self.word(COUNTER_OFFSET).wrapping_add(1);
        self.set_word(COUNTER_OFFSET, word);
    }

    /// XOR a fine-grained timer sample into the jitter word.
    pub fn xor_jitter(&mut self, sample: u32) {
        let word = self.word(JITTER_OFFSET) ^ sample;
        self.set_word(JITTER_OFFSET, word);
    }

    fn word(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.bytes[offset],
            self.bytes[offset + 1],
            self.bytes[offset + 2],
            self.bytes[offset + 3],
        ])
    }

    fn set_word(&mut self, offset: usize, value: u32) {
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
}

impl Default for StateBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl Zeroize for StateBlock {
    fn zeroize(&mut self) {
        self.bytes.zeroize();
    }
}
