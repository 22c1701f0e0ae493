//! Entropy-coded scan data to/from DCT coefficients, without dequantization
//! or the IDCT — the coefficient-level access the steganographic engines need.

mod baseline;

use crate::error::{CodecError, Result};
use crate::parser::{JpegSegments, ZIGZAG_TO_NATURAL};

pub use baseline::{decode_scan_baseline, encode_scan_baseline};

/// Decoded DCT coefficients for every block of every component, in scan
/// (block-major) order. Each block holds 64 values in zigzag order.
#[derive(Debug, Clone)]
pub struct ScanCoefficients {
    pub data: Vec<i16>,
    pub blocks_per_component: Vec<usize>,
    pub total_blocks: usize,
    pub width: u16,
    pub height: u16,
}

impl ScanCoefficients {
    #[inline]
    pub fn as_slice(&self) -> &[i16] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [i16] {
        &mut self.data
    }

    #[inline]
    pub fn block(&self, index: usize) -> &[i16] {
        let start = index * 64;
        &self.data[start..start + 64]
    }

    #[inline]
    pub fn block_mut(&mut self, index: usize) -> &mut [i16] {
        let start = index * 64;
        &mut self.data[start..start + 64]
    }

    pub fn to_natural_order(&self) -> Vec<i16> {
        let mut result = vec![0i16; self.data.len()];
        for block_idx in 0..self.total_blocks {
            let base = block_idx * 64;
            for i in 0..64 {
                result[base + ZIGZAG_TO_NATURAL[i]] = self.data[base + i];
            }
        }
        result
    }
}

/// Decode scan data from a parsed JPEG. Dispatches on frame type; progressive
/// frames are rejected rather than partially decoded.
pub fn decode_scan(segments: &JpegSegments) -> Result<ScanCoefficients> {
    let frame = segments
        .frame
        .as_ref()
        .ok_or_else(|| CodecError::malformed("missing frame info (SOF)"))?;

    if frame.is_progressive() {
        return Err(CodecError::ProgressiveUnsupported);
    }

    baseline::decode_scan_baseline(segments)
}

/// Re-encode DCT coefficients into entropy-coded scan bytes using the
/// source's Huffman tables.
pub fn encode_scan(coefficients: &ScanCoefficients, segments: &JpegSegments) -> Result<Vec<u8>> {
    let frame = segments
        .frame
        .as_ref()
        .ok_or_else(|| CodecError::malformed("missing frame info (SOF)"))?;

    if frame.is_progressive() {
        return Err(CodecError::ProgressiveUnsupported);
    }

    baseline::encode_scan_baseline(coefficients, segments)
}
