//! The Rang-JPEG engine: a difference-image steganography scheme. A "clear"
//! and a near-identical "modified" companion image (see [`blur::modify_image`])
//! are decoded in lockstep; every coefficient where they differ is a
//! candidate carrier. Payload bits are the keyed XOR-hash of which carriers
//! currently hold an odd coefficient; embedding solves, over GF(2), for
//! which carriers to flip so that hash matches the desired data.

pub mod blur;

use crate::bitset::BitSet;
use crate::container::Container;
use crate::error::{CoverError, Result};
use crate::gf2::{self, Row};
use cipher::{KeyIvInit, StreamCipher};
use salsa20::Salsa12;

/// The fixed zero seed the reference tool keys its public "strings PRNG"
/// with — this is a domain-separation constant, not a secret; every
/// implementation must use the same one for `extract` to agree, but no
/// caller-facing key ever feeds it.
const STRINGS_KEY: [u8; 32] = [0u8; 32];

/// The fixed zero nonce the "randomization PRNG" (keyed with the caller's
/// embed-time entropy) is run with.
const RANDOMIZATION_NONCE: [u8; 8] = [0u8; 8];

/// Builds the 8-byte Salsa nonce for `H(index)`: little-endian index in the
/// low 4 bytes, zero padding in the high 4 — `Cover_Rang_xor_string` in the
/// reference tool.
fn nonce_for_index(index: u32) -> [u8; 8] {
    let b = index.to_le_bytes();
    [b[0], b[1], b[2], b[3], 0, 0, 0, 0]
}

/// `H(index)`: `length` bytes of Salsa20r12 keystream under `key`, with the
/// nonce derived from `index`. Equivalent to XORing `index`'s pseudorandom
/// string into a zeroed buffer, since XOR against zero is a no-op.
fn hash_string(key: &[u8; 32], index: u32, length: usize) -> Vec<u8> {
    let nonce = nonce_for_index(index);
    let mut cipher = Salsa12::new_from_slices(key, &nonce).expect("fixed-size key and nonce");
    let mut buf = vec![0u8; length];
    cipher.apply_keystream(&mut buf);
    buf
}

/// Reduces a raw 64-bit draw into `[0, last_index)`, the same
/// signed/unsigned split as [`crate::permutation::reduce`] generalized to 64
/// bits (the reference's randomization draws are 64-bit rather than 32-bit;
/// no literal reference text for the wider reduction was available, so this
/// mirrors the documented 32-bit rule at twice the width).
fn reduce64(raw: u64, last_index: u64) -> u64 {
    if last_index < (1u64 << 63) {
        let signed = raw as i64;
        let modulus = last_index as i64;
        let mut r = signed % modulus;
        if r < 0 {
            r += modulus;
        }
        r as u64
    } else {
        raw % last_index
    }
}

/// A Rang-JPEG engine context over one clear image and (for embedding) its
/// modified companion.
pub struct Rang {
    coefficients_count: usize,
    payload: BitSet,
    usable: Vec<usize>,
    direction: BitSet,
    changes: BitSet,
    randomization_key: [u8; 32],
}

impl Rang {
    /// Decodes `clear` into the public `payload` hash domain. If `modified`
    /// is supplied, also builds the carrier list (`usable`) and per-carrier
    /// `direction` from where the two images' coefficients differ, and keys
    /// the randomization PRNG from `entropy` (defaulting to an all-zero key,
    /// documented as a deliberate placeholder — the reference requires a
    /// caller-supplied secret here and treats an absent one as the caller's
    /// mistake, not this engine's).
    pub fn initialize(clear: &Container, modified: Option<&Container>, entropy: Option<[u8; 32]>) -> Rang {
        let count = clear.coefficients_count();
        let mut payload = BitSet::zeroed(count);
        for i in 0..count {
            payload.set(i, clear.get(i) & 1 != 0);
        }

        let mut usable = Vec::new();
        let mut direction = BitSet::zeroed(count);
        if let Some(modified) = modified {
            debug_assert_eq!(modified.coefficients_count(), count);
            for i in 0..count {
                let c = clear.get(i);
                let m = modified.get(i);
                if c != m {
                    usable.push(i);
                    direction.set(i, m > c);
                }
            }
        }

        Rang {
            coefficients_count: count,
            payload,
            usable,
            direction,
            changes: BitSet::zeroed(count),
            randomization_key: entropy.unwrap_or([0u8; 32]),
        }
    }

    /// Number of candidate carrier coefficients (indices where clear and
    /// modified differ). Zero unless the context was built with a modified
    /// image.
    pub fn usable_count(&self) -> usize {
        self.usable.len()
    }

    /// `out ← XOR of H(i) for every index i whose payload bit is set` —
    /// the public hash, computable from the clear image alone.
    pub fn extract(&self, length: usize) -> Vec<u8> {
        let mut out = vec![0u8; length];
        for i in 0..self.coefficients_count {
            if self.payload.get(i) {
                let h = hash_string(&STRINGS_KEY, i as u32, length);
                for (o, b) in out.iter_mut().zip(h.iter()) {
                    *o ^= b;
                }
            }
        }
        out
    }

    /// Solves for a set of carrier flips whose hash difference equals
    /// `data`, sampling `data.len()*8 + padding_bits_count` distinct
    /// carriers from `usable` via a randomization-PRNG-driven partial
    /// Fisher-Yates. On success, replaces `changes`; on
    /// [`CoverError::MatrixSingular`], `changes` from any previous
    /// successful embed is left untouched so the caller can retry with
    /// fresh entropy.
    pub fn embed(&mut self, data: &[u8], padding_bits_count: usize) -> Result<()> {
        let length = data.len();
        let width = length * 8;
        let sample_count = width + padding_bits_count;
        if sample_count > self.usable.len() {
            return Err(CoverError::CapacityExceeded {
                requested: sample_count,
                embedded: self.usable.len(),
            });
        }

        let mut rng = Salsa12::new_from_slices(&self.randomization_key, &RANDOMIZATION_NONCE)
            .expect("fixed-size key and nonce");

        let n = self.usable.len();
        for step in 0..sample_count {
            let remaining = (n - step) as u64;
            let mut buf = [0u8; 8];
            rng.apply_keystream(&mut buf);
            let raw = u64::from_le_bytes(buf);
            let draw = step + reduce64(raw, remaining) as usize;
            self.usable.swap(step, draw);
        }
        let sample = self.usable[..sample_count].to_vec();

        let mut prefill_bytes = vec![0u8; (padding_bits_count + 7) / 8];
        rng.apply_keystream(&mut prefill_bytes);
        let padding_prefill: Vec<bool> = (0..padding_bits_count)
            .map(|i| (prefill_bytes[i / 8] >> (i % 8)) & 1 == 1)
            .collect();

        let current_hash = self.extract(length);
        let target_bytes: Vec<u8> = data.iter().zip(current_hash.iter()).map(|(d, h)| d ^ h).collect();
        let target_bits: Vec<bool> = (0..width).map(|i| (target_bytes[i / 8] >> (i % 8)) & 1 == 1).collect();

        let candidate_hash = |tag: usize| -> Row {
            let idx = sample[tag];
            let bytes = hash_string(&STRINGS_KEY, idx as u32, length);
            Row::from_bytes(&bytes, width)
        };

        let resolved = gf2::unhash(width, &target_bits, &padding_prefill, true, candidate_hash)?;

        self.changes.clear();
        for (tag, &toggled) in resolved.iter().enumerate() {
            if toggled {
                self.changes.set(sample[tag], true);
            }
        }
        Ok(())
    }

    /// Increments or decrements each flipped coefficient per its recorded
    /// `direction` — no clamping needed, since carriers were only ever drawn
    /// from cells where clear and modified already differed. Returns the
    /// number of coefficients changed.
    pub fn apply(&self, container: &mut Container) -> usize {
        let mut changed = 0;
        for i in 0..self.coefficients_count {
            if self.changes.get(i) {
                let value = container.get(i);
                let updated = if self.direction.get(i) { value + 1 } else { value - 1 };
                container.set(i, updated);
                changed += 1;
            }
        }
        changed
    }
}
