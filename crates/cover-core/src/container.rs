//! A logical view over one color component of a JPEG: a flat, block-major
//! array of coefficients (DC first, frequency-ascending within each block)
//! plus the padded block geometry the engines need to compute indices.

use crate::error::{CoverError, Result};
use cover_codec::{decode_scan, encode_scan, parse_jpeg, write_jpeg, JpegSegments, ScanCoefficients};

/// The component selected when a container is read from a multi-component
/// (YCbCr) image. Steganographic embedding always targets luminance.
const LUMINANCE_COMPONENT: usize = 0;

/// A single-component coefficient view over a JPEG, with enough geometry to
/// address any block by row and enough of the original segments retained to
/// write a modified copy back out.
pub struct Container {
    segments: JpegSegments,
    coefficients: ScanCoefficients,
    component_index: usize,
    block_offset: usize,
    width_in_blocks: usize,
    height_in_blocks: usize,
    coefficients_count: usize,
}

impl Container {
    /// Parses `data` as a JPEG and builds a container over its luminance
    /// component. Rejects anything that isn't grayscale or YCbCr, anything
    /// whose geometry would overflow a coefficient index, and (via the
    /// underlying codec) progressive frames.
    pub fn read(data: &[u8]) -> Result<Container> {
        let segments = parse_jpeg(data)?;
        let coefficients = decode_scan(&segments)?;
        Self::from_parts(segments, coefficients)
    }

    pub(crate) fn from_parts(segments: JpegSegments, coefficients: ScanCoefficients) -> Result<Container> {
        let frame = segments
            .frame
            .as_ref()
            .ok_or(CoverError::InvalidColorSpace)?;

        let num_components = frame.components.len();
        if num_components != 1 && num_components != 3 {
            return Err(CoverError::InvalidColorSpace);
        }

        let h_max = frame.components.iter().map(|c| c.h_sampling as usize).max().unwrap_or(1);
        let v_max = frame.components.iter().map(|c| c.v_sampling as usize).max().unwrap_or(1);
        let mcu_width = h_max * 8;
        let mcu_height = v_max * 8;
        if mcu_width == 0 || mcu_height == 0 {
            return Err(CoverError::InvalidBlockSize);
        }

        let mcu_cols = (frame.width as usize + mcu_width - 1) / mcu_width;
        let mcu_rows = (frame.height as usize + mcu_height - 1) / mcu_height;

        let component_index = LUMINANCE_COMPONENT.min(num_components - 1);
        let component = &frame.components[component_index];

        let width_in_blocks = mcu_cols * component.h_sampling as usize;
        let height_in_blocks = mcu_rows * component.v_sampling as usize;

        let coefficients_count = width_in_blocks
            .checked_mul(height_in_blocks)
            .and_then(|blocks| blocks.checked_mul(64))
            .ok_or(CoverError::TooBigImage)?;
        if coefficients_count > u32::MAX as usize {
            return Err(CoverError::TooBigImage);
        }

        let block_offset: usize = coefficients.blocks_per_component[..component_index].iter().sum();

        Ok(Container {
            segments,
            coefficients,
            component_index,
            block_offset,
            width_in_blocks,
            height_in_blocks,
            coefficients_count,
        })
    }

    #[inline]
    pub fn width_in_blocks(&self) -> usize {
        self.width_in_blocks
    }

    #[inline]
    pub fn height_in_blocks(&self) -> usize {
        self.height_in_blocks
    }

    #[inline]
    pub fn coefficients_count(&self) -> usize {
        self.coefficients_count
    }

    /// Coefficient `index` of the luminance component, in block-major,
    /// frequency-ascending order (index 0 of each block is the DC term).
    #[inline]
    pub fn get(&self, index: usize) -> i16 {
        let block = self.block_offset + index / 64;
        self.coefficients.block(block)[index % 64]
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: i16) {
        let block = self.block_offset + index / 64;
        self.coefficients.block_mut(block)[index % 64] = value;
    }

    /// Returns the `width_in_blocks` 8x8 blocks making up row `y` (0-indexed
    /// in block units), each as a 64-entry frequency-ascending slice.
    pub fn access_row(&self, y: usize) -> &[i16] {
        debug_assert!(y < self.height_in_blocks);
        let first_block = self.block_offset + y * self.width_in_blocks;
        let start = first_block * 64;
        let end = start + self.width_in_blocks * 64;
        &self.coefficients.as_slice()[start..end]
    }

    pub fn access_row_mut(&mut self, y: usize) -> &mut [i16] {
        debug_assert!(y < self.height_in_blocks);
        let first_block = self.block_offset + y * self.width_in_blocks;
        let start = first_block * 64;
        let end = start + self.width_in_blocks * 64;
        &mut self.coefficients.as_mut_slice()[start..end]
    }

    /// Re-encodes the (possibly modified) coefficients into a new JPEG file,
    /// reusing the source's quantization and Huffman tables. The frame's
    /// reported dimensions are widened to the MCU-padded block geometry so
    /// the encoder never has to special-case a partial last block.
    pub fn write(&self) -> Result<Vec<u8>> {
        let mut segments = self.segments.clone();
        if let Some(frame) = segments.frame.as_mut() {
            let h_max = frame.components.iter().map(|c| c.h_sampling as usize).max().unwrap_or(1);
            let v_max = frame.components.iter().map(|c| c.v_sampling as usize).max().unwrap_or(1);
            let mcu_width = (h_max * 8) as u16;
            let mcu_height = (v_max * 8) as u16;
            frame.width = ((frame.width + mcu_width - 1) / mcu_width) * mcu_width;
            frame.height = ((frame.height + mcu_height - 1) / mcu_height) * mcu_height;
        }

        let scan_data = encode_scan(&self.coefficients, &segments)?;
        Ok(write_jpeg(&segments, scan_data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cover_codec::{Component, FrameInfo};

    fn grayscale_segments(width: u16, height: u16) -> JpegSegments {
        JpegSegments {
            frame: Some(FrameInfo {
                sof_type: 0,
                precision: 8,
                height,
                width,
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
        }
    }

    fn grayscale_coefficients(blocks: usize) -> ScanCoefficients {
        ScanCoefficients {
            data: vec![0i16; blocks * 64],
            blocks_per_component: vec![blocks],
            total_blocks: blocks,
            width: 16,
            height: 16,
        }
    }

    #[test]
    fn sixteen_by_sixteen_grayscale_has_four_blocks() {
        let container =
            Container::from_parts(grayscale_segments(16, 16), grayscale_coefficients(4)).unwrap();
        assert_eq!(container.width_in_blocks(), 2);
        assert_eq!(container.height_in_blocks(), 2);
        assert_eq!(container.coefficients_count(), 4 * 64);
    }

    #[test]
    fn rejects_unusual_component_counts() {
        let mut segments = grayscale_segments(8, 8);
        segments.frame.as_mut().unwrap().components.push(cover_codec::Component {
            id: 2,
            h_sampling: 1,
            v_sampling: 1,
            quant_table_id: 0,
            dc_table_id: 0,
            ac_table_id: 0,
        });
        let err = Container::from_parts(segments, grayscale_coefficients(1)).unwrap_err();
        assert!(matches!(err, CoverError::InvalidColorSpace));
    }

    #[test]
    fn get_and_set_roundtrip_through_block_offset() {
        let mut container =
            Container::from_parts(grayscale_segments(16, 16), grayscale_coefficients(4)).unwrap();
        container.set(65, 7); // block 1, position 1
        assert_eq!(container.get(65), 7);
        assert_eq!(container.access_row(0)[64 + 1], 7);
    }
}
