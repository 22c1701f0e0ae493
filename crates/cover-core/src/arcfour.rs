//! ARCFOUR (RC4), byte-accurate to Nettle's `arcfour`: 256-byte state,
//! standard key-scheduling and pseudo-random generation. The permutation
//! generator and the keystream both draw from one continued stream rather
//! than re-keying per use, so this type exposes raw byte production instead
//! of a one-shot `encrypt` call.

pub const MAX_KEY_SIZE: usize = 256;

/// A running ARCFOUR keystream generator.
pub struct Arcfour {
    s: [u8; 256],
    i: u8,
    j: u8,
}

impl Arcfour {
    /// Runs the key-scheduling algorithm over `key` (1-256 bytes).
    pub fn new(key: &[u8]) -> Self {
        debug_assert!(!key.is_empty() && key.len() <= MAX_KEY_SIZE);

        let mut s = [0u8; 256];
        for (idx, slot) in s.iter_mut().enumerate() {
            *slot = idx as u8;
        }

        let mut j: u8 = 0;
        for i in 0..256usize {
            j = j.wrapping_add(s[i]).wrapping_add(key[i % key.len()]);
            s.swap(i, j as usize);
        }

        Arcfour { s, i: 0, j: 0 }
    }

    /// Produces the next keystream byte (PRGA).
    #[inline]
    pub fn next_byte(&mut self) -> u8 {
        self.i = self.i.wrapping_add(1);
        self.j = self.j.wrapping_add(self.s[self.i as usize]);
        self.s.swap(self.i as usize, self.j as usize);
        let k = self.s[self.i as usize].wrapping_add(self.s[self.j as usize]);
        self.s[k as usize]
    }

    /// Xors `count` keystream bytes into a fresh buffer, consuming the stream.
    pub fn next_bytes(&mut self, count: usize) -> Vec<u8> {
        (0..count).map(|_| self.next_byte()).collect()
    }

    /// Xors `buf` in place with the next `buf.len()` keystream bytes.
    pub fn apply_keystream(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            *byte ^= self.next_byte();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6229 test vector: key "Key", first 16 keystream bytes.
    #[test]
    fn matches_rfc6229_test_vector() {
        let mut cipher = Arcfour::new(b"Key");
        let keystream = cipher.next_bytes(16);
        assert_eq!(
            keystream,
            vec![
                0xEB, 0x9F, 0x77, 0x81, 0xB7, 0x34, 0xCA, 0x72, 0xA7, 0x19, 0xA6, 0x4A, 0xDE, 0xDF,
                0x1D, 0x75,
            ]
        );
    }

    #[test]
    fn stream_continues_across_calls() {
        let mut a = Arcfour::new(b"somekey");
        let mut b = Arcfour::new(b"somekey");

        let first_half = a.next_bytes(8);
        let second_half = a.next_bytes(8);

        let whole: Vec<u8> = b.next_bytes(16);
        assert_eq!(whole[..8], first_half[..]);
        assert_eq!(whole[8..], second_half[..]);
    }
}
