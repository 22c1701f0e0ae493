//! Keyed permutation and keystream generation shared by Eph5's coefficient
//! traversal order and its payload encryption.
//!
//! Wire-exact contract: a Fisher-Yates shuffle drawing indices from a single
//! continued ARCFOUR stream (not re-keyed between the permutation and the
//! keystream), 4-byte big-endian chunks reduced into `[0, last_index)` by
//! the rule below. Any deviation here makes previously embedded data
//! unrecoverable by a compatible implementation.

use crate::arcfour::Arcfour;

/// Reduces a raw 32-bit draw into `[0, last_index)`.
///
/// Below `2^31`, `last_index` fits a signed `i32` and the raw draw is
/// reinterpreted as signed and reduced with C's truncating-toward-zero
/// semantics (negative remainders are shifted up by `last_index`) — which is
/// exactly what Rust's `%` on `i32` already does. At or above `2^31` the
/// draw is reduced as an unsigned value instead.
fn reduce(raw: u32, last_index: u32) -> u32 {
    if last_index < (1u32 << 31) {
        let signed = raw as i32;
        let modulus = last_index as i32;
        let mut r = signed % modulus;
        if r < 0 {
            r += modulus;
        }
        r as u32
    } else {
        raw % last_index
    }
}

/// Generates the keyed coefficient permutation over `[0, n)` together with
/// `keystream_len` bytes of keystream, drawn from one continued ARCFOUR
/// stream keyed with `key`. `permutation[step]` is the coefficient index
/// visited at traversal position `step`.
pub fn generate(key: &[u8], n: usize, keystream_len: usize) -> (Vec<u32>, Vec<u8>) {
    let mut cipher = Arcfour::new(key);
    let mut perm: Vec<u32> = (0..n as u32).collect();

    let mut last_index = n as u32;
    for _ in 0..n.saturating_sub(1) {
        let raw_bytes = cipher.next_bytes(4);
        let raw = u32::from_be_bytes([raw_bytes[0], raw_bytes[1], raw_bytes[2], raw_bytes[3]]);
        let draw = reduce(raw, last_index);
        perm.swap(draw as usize, (last_index - 1) as usize);
        last_index -= 1;
    }

    let keystream = cipher.next_bytes(keystream_len);
    (perm, keystream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn permutation_is_a_bijection() {
        let (perm, _) = generate(b"some key material", 1000, 0);
        let set: HashSet<u32> = perm.iter().copied().collect();
        assert_eq!(set.len(), 1000);
        assert_eq!(*set.iter().max().unwrap(), 999);
    }

    #[test]
    fn same_key_same_n_is_deterministic() {
        let (perm_a, stream_a) = generate(b"key", 256, 16);
        let (perm_b, stream_b) = generate(b"key", 256, 16);
        assert_eq!(perm_a, perm_b);
        assert_eq!(stream_a, stream_b);
    }

    #[test]
    fn different_keys_diverge_in_most_positions() {
        let (perm_a, _) = generate(b"key one", 500, 0);
        let (perm_b, _) = generate(b"key two", 500, 0);
        let matching = perm_a.iter().zip(perm_b.iter()).filter(|(a, b)| a == b).count();
        assert!(matching < 500 / 4, "permutations should differ in most positions");
    }

    #[test]
    fn degenerate_single_element_permutation() {
        let (perm, keystream) = generate(b"key", 1, 4);
        assert_eq!(perm, vec![0]);
        assert_eq!(keystream.len(), 4);
    }

    #[test]
    fn reduce_below_threshold_matches_truncating_remainder() {
        assert_eq!(reduce(10, 7), 3);
        assert_eq!(reduce(0x8000_0000u32.wrapping_sub(1), 7), reduce(0x7FFF_FFFE, 7));
    }
}
