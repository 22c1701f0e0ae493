//! The Eph5 engine: F5-style matrix encoding with shrinkage handling over a
//! keyed permutation of a container's non-DC coefficients.

mod tables;

use crate::bitset::BitSet;
use crate::container::Container;
use crate::permutation;
use tables::magic_table;

/// Per-`k` (`k = 1..=7`, index `k-1`) capacity figures in bytes, except
/// `expected` which is a real-valued estimate clamped to `[guaranteed,
/// maximum]`.
#[derive(Debug, Clone, Copy)]
pub struct Capacities {
    pub guaranteed: [usize; 7],
    pub maximum: [usize; 7],
    pub expected: [f64; 7],
}

fn compute_capacities(usable_count: usize, one_count: usize) -> Capacities {
    let mut guaranteed = [0usize; 7];
    let mut maximum = [0usize; 7];
    let mut expected = [0f64; 7];

    for k in 1u8..=7 {
        let n = (1usize << k) - 1;
        let idx = k as usize - 1;
        maximum[idx] = (usable_count / n) * k as usize / 8;
        guaranteed[idx] = ((usable_count - one_count) / n) * k as usize / 8;
    }

    let u = usable_count as f64;
    let o = one_count as f64;
    expected[0] = (u - o / 2.0) / 8.0;

    let ratio = if usable_count == 0 { 1.0 } else { o / u };
    for k in 2u8..=7 {
        let idx = k as usize - 1;
        if ratio >= 1.0 {
            expected[idx] = 0.0;
            continue;
        }
        let n = (1usize << k) - 1;
        let mut m = n as f64;
        let mut t = 1.0f64;
        for v in magic_table(k) {
            t *= v * ratio;
            m += t;
        }
        m += t * ratio / (1.0 - ratio);
        let mut e = u / m * (k as f64) / 8.0;
        if e < guaranteed[idx] as f64 {
            e = guaranteed[idx] as f64;
        }
        if e > maximum[idx] as f64 {
            e = maximum[idx] as f64;
        }
        expected[idx] = e;
    }

    Capacities { guaranteed, maximum, expected }
}

/// A keyed Eph5 context over one container: its usable/payload/one bitmaps,
/// the derived permutation and keystream, capacity figures, and the
/// `changes` plan built up by [`Eph5::embed`].
pub struct Eph5 {
    usable: BitSet,
    payload: BitSet,
    one: BitSet,
    changes: BitSet,
    permutation: Vec<u32>,
    keystream: Vec<u8>,
    usable_count: usize,
    one_count: usize,
    capacities: Capacities,
}

impl Eph5 {
    /// Scans every non-DC coefficient of `container`, derives the
    /// usable/payload/one bitmaps and per-`k` capacities, and generates the
    /// keyed permutation and keystream used by embed/extract.
    pub fn initialize(container: &Container, key: &[u8]) -> Eph5 {
        let n = container.coefficients_count();
        let mut usable = BitSet::zeroed(n);
        let mut payload = BitSet::zeroed(n);
        let mut one = BitSet::zeroed(n);

        let mut usable_count = 0usize;
        let mut one_count = 0usize;

        let total_blocks = n / 64;
        for block in 0..total_blocks {
            for pos in 1..64 {
                let index = block * 64 + pos;
                let c = container.get(index);
                if c != 0 {
                    usable.set(index, true);
                    usable_count += 1;
                    payload.set(index, (c % 2 != 0) == (c > 0));
                    if c == 1 || c == -1 {
                        one.set(index, true);
                        one_count += 1;
                    }
                }
            }
        }

        let capacities = compute_capacities(usable_count, one_count);
        let (perm, keystream) = permutation::generate(key, n, capacities.maximum[0]);

        Eph5 {
            usable,
            payload,
            one,
            changes: BitSet::zeroed(n),
            permutation: perm,
            keystream,
            usable_count,
            one_count,
            capacities,
        }
    }

    pub fn capacities(&self) -> &Capacities {
        &self.capacities
    }

    pub fn usable_count(&self) -> usize {
        self.usable_count
    }

    pub fn one_count(&self) -> usize {
        self.one_count
    }

    fn next_usable(&self, pos: &mut usize) -> Option<usize> {
        while *pos < self.permutation.len() {
            let idx = self.permutation[*pos] as usize;
            *pos += 1;
            if self.usable.get(idx) {
                return Some(idx);
            }
        }
        None
    }

    /// Embeds `data` with matrix-coding parameter `k` (`1..=7`), resetting
    /// `changes` first. Returns the number of whole bytes actually embedded,
    /// which is less than `data.len()` if the permutation (or keystream) is
    /// exhausted first.
    pub fn embed(&mut self, data: &[u8], k: u8) -> usize {
        self.changes = BitSet::zeroed(self.changes.len());

        if k == 1 {
            self.embed_k1(data)
        } else {
            self.embed_matrix(data, k)
        }
    }

    fn embed_k1(&mut self, data: &[u8]) -> usize {
        let total_bits = data.len() * 8;
        let mut pos = 0usize;
        let mut bit_pos = 0usize;

        loop {
            if bit_pos >= total_bits {
                break;
            }
            let byte_i = bit_pos / 8;
            if byte_i >= self.keystream.len() {
                break;
            }
            let bit_i = bit_pos % 8;
            let data_bit = ((data[byte_i] ^ self.keystream[byte_i]) >> bit_i) & 1 == 1;

            let idx = match self.next_usable(&mut pos) {
                Some(idx) => idx,
                None => break,
            };

            if self.payload.get(idx) != data_bit {
                self.changes.set(idx, true);
                if self.one.get(idx) {
                    // Shrinks to zero: re-embed the same bit from the next cell.
                    continue;
                }
            }
            bit_pos += 1;
        }

        bit_pos / 8
    }

    fn embed_matrix(&mut self, data: &[u8], k: u8) -> usize {
        let n = (1usize << k) - 1;
        let mut indexes = [0usize; 127];

        let mut byte: u32 = 0;
        let mut l: u32 = 0;
        let mut e: u32 = 0;
        let mut data_pos = 0usize;
        let mut bytes_embedded = 0usize;
        let mut pos = 0usize;

        loop {
            while (l as usize) < k as usize && data_pos < data.len() {
                if data_pos >= self.keystream.len() {
                    break;
                }
                let is_last = data_pos == data.len() - 1;
                let b = data[data_pos] ^ self.keystream[data_pos];
                byte |= (b as u32) << l;
                l += 8;
                if is_last {
                    l += 7 + k as u32;
                }
                data_pos += 1;
            }

            if (l as usize) < k as usize {
                break;
            }

            let mut bits = (byte & (n as u32)) as usize;
            let mut block_length = n;
            let mut i = 0usize;
            let mut exhausted = false;
            while i < block_length {
                match self.next_usable(&mut pos) {
                    Some(idx) => {
                        indexes[i] = idx;
                        if self.payload.get(idx) {
                            bits ^= i + 1;
                        }
                        i += 1;
                    }
                    None => {
                        exhausted = true;
                        break;
                    }
                }
            }
            if exhausted {
                break;
            }

            loop {
                if bits == 0 {
                    break;
                }
                let target_pos = bits - 1;
                let coeff_idx = indexes[target_pos];
                self.changes.set(coeff_idx, true);

                if self.one.get(coeff_idx) {
                    if self.payload.get(coeff_idx) {
                        bits = 0;
                    }
                    for j in target_pos..block_length - 1 {
                        indexes[j] = indexes[j + 1];
                        if self.payload.get(indexes[j]) {
                            bits ^= (j + 1) ^ (j + 2);
                        }
                    }
                    block_length -= 1;

                    match self.next_usable(&mut pos) {
                        Some(idx) => {
                            indexes[block_length] = idx;
                            if self.payload.get(idx) {
                                bits ^= block_length + 1;
                            }
                            block_length += 1;
                        }
                        None => return bytes_embedded,
                    }
                    continue;
                } else {
                    break;
                }
            }

            byte >>= k;
            l -= k as u32;
            e += k as u32;
            while e >= 8 {
                bytes_embedded += 1;
                e -= 8;
            }
        }

        bytes_embedded
    }

    /// Single pass through the permutation, decoding every `k` stream
    /// (`1..=7`, index `k-1`) in parallel from one traversal of usable
    /// coefficients.
    pub fn extract_all(&self) -> [Vec<u8>; 7] {
        let ns: [usize; 7] = std::array::from_fn(|ki| (1usize << (ki + 1)) - 1);
        let targets: [usize; 7] = std::array::from_fn(|ki| self.capacities.maximum[ki]);
        let mut out: [Vec<u8>; 7] = std::array::from_fn(|_| Vec::new());

        let mut byte_acc = [0u32; 7];
        let mut l = [0u32; 7];
        let mut bits_acc = [0usize; 7];
        let mut i_in_block = [0usize; 7];
        let mut emitted = [0usize; 7];

        let mut pos = 0usize;
        loop {
            let idx = match self.next_usable(&mut pos) {
                Some(idx) => idx,
                None => break,
            };
            let bit = self.payload.get(idx);

            for ki in 0..7 {
                if emitted[ki] >= targets[ki] {
                    continue;
                }
                if bit {
                    bits_acc[ki] ^= i_in_block[ki] + 1;
                }
                i_in_block[ki] += 1;

                if i_in_block[ki] == ns[ki] {
                    byte_acc[ki] |= (bits_acc[ki] as u32) << l[ki];
                    l[ki] += (ki + 1) as u32;
                    bits_acc[ki] = 0;
                    i_in_block[ki] = 0;

                    while l[ki] >= 8 {
                        let b = (byte_acc[ki] & 0xFF) as u8;
                        byte_acc[ki] >>= 8;
                        l[ki] -= 8;
                        out[ki].push(b ^ self.keystream[emitted[ki]]);
                        emitted[ki] += 1;
                        if emitted[ki] >= targets[ki] {
                            break;
                        }
                    }
                }
            }

            if (0..7).all(|ki| emitted[ki] >= targets[ki]) {
                break;
            }
        }

        out
    }

    /// Extracts just the `k` stream (`1..=7`).
    pub fn extract(&self, k: u8) -> Vec<u8> {
        let mut all = self.extract_all();
        std::mem::take(&mut all[k as usize - 1])
    }

    /// Applies the `changes` plan to `container`: decrements positive
    /// coefficients and increments negative ones, mapping every marked `±1`
    /// to zero. Returns the count of cells that became zero.
    pub fn apply(&self, container: &mut Container) -> usize {
        let mut zeroed = 0usize;
        for i in 0..self.changes.len() {
            if self.changes.get(i) {
                let c = container.get(i);
                let new_c = if c > 0 { c - 1 } else { c + 1 };
                container.set(i, new_c);
                if new_c == 0 {
                    zeroed += 1;
                }
            }
        }
        zeroed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cover_codec::{Component, FrameInfo, ScanCoefficients};
    use cover_codec::JpegSegments;

    fn grayscale_container(blocks_side: usize, coefficient: i16) -> Container {
        let blocks = blocks_side * blocks_side;
        let segments = JpegSegments {
            frame: Some(FrameInfo {
                sof_type: 0,
                precision: 8,
                height: (blocks_side * 8) as u16,
                width: (blocks_side * 8) as u16,
                components: vec![Component {
                    id: 1,
                    h_sampling: 1,
                    v_sampling: 1,
                    quant_table_id: 0,
                    dc_table_id: 0,
                    ac_table_id: 0,
                }],
            }),
            ..Default::default()
        };

        let mut data = vec![0i16; blocks * 64];
        for b in 0..blocks {
            for pos in 1..64 {
                data[b * 64 + pos] = coefficient;
            }
        }
        let coefficients = ScanCoefficients {
            data,
            blocks_per_component: vec![blocks],
            total_blocks: blocks,
            width: (blocks_side * 8) as u16,
            height: (blocks_side * 8) as u16,
        };

        Container::from_parts(segments, coefficients).unwrap()
    }

    #[test]
    fn sixteen_by_sixteen_all_ones_matches_reference_capacities() {
        let container = grayscale_container(2, 1);
        let eph5 = Eph5::initialize(&container, b"any key");

        assert_eq!(eph5.usable_count(), 16128);
        assert_eq!(eph5.one_count(), 16128);

        let caps = eph5.capacities();
        assert_eq!(caps.guaranteed[0], 0);
        assert_eq!(caps.maximum[0], 2016);
        assert_eq!(caps.expected[0], 1008.0);
    }

    #[test]
    fn capacities_are_monotonic() {
        let container = grayscale_container(4, 5);
        let eph5 = Eph5::initialize(&container, b"key material");
        let caps = eph5.capacities();
        for k in 0..7 {
            assert!(caps.guaranteed[k] as f64 <= caps.expected[k]);
            assert!(caps.expected[k] <= caps.maximum[k] as f64);
        }
    }

    #[test]
    fn k1_round_trip_recovers_data() {
        let mut container = grayscale_container(8, 5);
        let key = crate::keys::default_key();
        let mut eph5 = Eph5::initialize(&container, &key);

        let data = b"hello, eph5!";
        let embedded = eph5.embed(data, 1);
        assert_eq!(embedded, data.len());
        eph5.apply(&mut container);

        // Extraction reads back the now-modified coefficients, so it must
        // come from a freshly initialized context, same as a separate
        // decode-then-extract invocation would see.
        let reloaded = Eph5::initialize(&container, &key);
        let extracted = reloaded.extract(1);
        assert_eq!(&extracted[..data.len()], data);
    }

    #[test]
    fn k3_round_trip_recovers_data() {
        let mut container = grayscale_container(8, 5);
        let key = crate::keys::default_key();
        let mut eph5 = Eph5::initialize(&container, &key);

        let data = [0u8; 10];
        let embedded = eph5.embed(&data, 3);
        assert_eq!(embedded, data.len());
        eph5.apply(&mut container);

        let reloaded = Eph5::initialize(&container, &key);
        let extracted = reloaded.extract(3);
        assert_eq!(&extracted[..data.len()], &data[..]);
    }

    #[test]
    fn embed_is_idempotent_given_same_inputs() {
        let container = grayscale_container(8, 5);
        let key = crate::keys::default_key();
        let mut eph5 = Eph5::initialize(&container, &key);

        let data = b"repeat me";
        eph5.embed(data, 2);
        let first = eph5.changes.clone();
        eph5.embed(data, 2);
        assert_eq!(first.as_bytes(), eph5.changes.as_bytes());
    }

    #[test]
    fn apply_moves_marked_coefficients_toward_zero_and_nothing_else() {
        let mut container = grayscale_container(8, 5);
        let key = crate::keys::default_key();
        let mut eph5 = Eph5::initialize(&container, &key);
        eph5.embed(b"x", 1);

        let before: Vec<i16> = (0..container.coefficients_count()).map(|i| container.get(i)).collect();
        eph5.apply(&mut container);
        let after: Vec<i16> = (0..container.coefficients_count()).map(|i| container.get(i)).collect();

        for i in 0..before.len() {
            if eph5.changes.get(i) {
                let expected = if before[i] > 0 { before[i] - 1 } else { before[i] + 1 };
                assert_eq!(after[i], expected);
            } else {
                assert_eq!(after[i], before[i]);
            }
        }
    }
}
