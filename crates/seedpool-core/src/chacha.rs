//! ChaCha block function run in hashing mode.
//!
//! The generator treats this as a sealed one-way primitive: it maps a 64-byte
//! input block to a 64-byte output block and cannot be inverted in practice
//! because the final feed-forward addition of the input words destroys the
//! permutation structure. Only [`hash_core`] is visible to the rest of the
//! crate; the round function is an implementation detail.

use crate::block::BLOCK_SIZE;

#[inline(always)]
fn quarter_round(x: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    x[a] = x[a].wrapping_add(x[b]);
    x[d] = (x[d] ^ x[a]).rotate_left(16);
    x[c] = x[c].wrapping_add(x[d]);
    x[b] = (x[b] ^ x[c]).rotate_left(12);
    x[a] = x[a].wrapping_add(x[b]);
    x[d] = (x[d] ^ x[a]).rotate_left(8);
    x[c] = x[c].wrapping_add(x[d]);
    x[b] = (x[b] ^ x[c]).rotate_left(7);
}

/// Run the ChaCha block function over `input` for the given number of rounds
/// and write the 64-byte result to `output`.
///
/// Words are interpreted little-endian, matching the serialized state block
/// layout. `rounds` must be even; the generator always passes 20.
pub fn hash_core(output: &mut [u8; BLOCK_SIZE], input: &[u8; BLOCK_SIZE], rounds: u8) {
    let mut x = [0u32; 16];
    for (word, chunk) in x.iter_mut().zip(input.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    let saved = x;

    for _ in 0..rounds / 2 {
        // Column round.
        quarter_round(&mut x, 0, 4, 8, 12);
        quarter_round(&mut x, 1, 5, 9, 13);
        quarter_round(&mut x, 2, 6, 10, 14);
        quarter_round(&mut x, 3, 7, 11, 15);
        // Diagonal round.
        quarter_round(&mut x, 0, 5, 10, 15);
        quarter_round(&mut x, 1, 6, 11, 12);
        quarter_round(&mut x, 2, 7, 8, 13);
        quarter_round(&mut x, 3, 4, 9, 14);
    }

    for (word, save) in x.iter_mut().zip(saved.iter()) {
        *word = word.wrapping_add(*save);
    }
    for (chunk, word) in output.chunks_exact_mut(4).zip(x.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a ChaCha20 input block from key / counter / nonce the way
    /// RFC 7539 lays it out: constant, 32-byte key, 4-byte counter, 12-byte nonce.
    fn rfc_block(key: &[u8; 32], counter: u32, nonce: &[u8; 12]) -> [u8; 64] {
        let mut input = [0u8; 64];
        input[..16].copy_from_slice(b"expand 32-byte k");
        input[16..48].copy_from_slice(key);
        input[48..52].copy_from_slice(&counter.to_le_bytes());
        input[52..64].copy_from_slice(nonce);
        input
    }

    #[test]
    fn rfc7539_keystream_block() {
        let key: [u8; 32] = core::array::from_fn(|i| i as u8);
        let nonce: [u8; 12] = [0, 0, 0, 9, 0, 0, 0, 0x4a, 0, 0, 0, 0];
        let input = rfc_block(&key, 1, &nonce);

        let mut output = [0u8; 64];
        hash_core(&mut output, &input, 20);

        let expected: [u8; 64] = [
            0x10, 0xf1, 0xe7, 0xe4, 0xd1, 0x3b, 0x59, 0x15, 0x50, 0x0f, 0xdd, 0x1f, 0xa3, 0x20,
            0x71, 0xc4, 0xc7, 0xd1, 0xf4, 0xc7, 0x33, 0xc0, 0x68, 0x03, 0x04, 0x22, 0xaa, 0x9a,
            0xc3, 0xd4, 0x6c, 0x4e, 0xd2, 0x82, 0x64, 0x46, 0x07, 0x9f, 0xaa, 0x09, 0x14, 0xc2,
            0xd7, 0x05, 0xd9, 0x8b, 0x02, 0xa2, 0xb5, 0x12, 0x9c, 0xd1, 0xde, 0x16, 0x4e, 0xb9,
            0xcb, 0xd0, 0x83, 0xe8, 0xa2, 0x50, 0x3c, 0x4e,
        ];
        assert_eq!(output, expected);
    }

    #[test]
    fn counter_changes_whole_block() {
        let key = [0x42u8; 32];
        let nonce = [7u8; 12];
        let mut out_a = [0u8; 64];
        let mut out_b = [0u8; 64];
        hash_core(&mut out_a, &rfc_block(&key, 1, &nonce), 20);
        hash_core(&mut out_b, &rfc_block(&key, 2, &nonce), 20);
        assert_ne!(out_a, out_b);
        // Diffusion: a one-word counter change should flip roughly half the bits.
        let flipped: u32 = out_a
            .iter()
            .zip(out_b.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();
        assert!(flipped > 160, "only {flipped} bits flipped");
    }

    #[test]
    fn output_differs_from_input() {
        let input = [0u8; 64];
        let mut output = [0u8; 64];
        hash_core(&mut output, &input, 20);
        assert_ne!(output, input);
    }
}
