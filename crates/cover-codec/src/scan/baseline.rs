//! Baseline (sequential, SOF0) scan encoding and decoding.

use super::ScanCoefficients;
use crate::error::{CodecError, Result};
use crate::huffman::{encode_coefficient, BitReader, BitWriter, HuffmanEncoder, HuffmanLookup};
use crate::parser::{FrameInfo, JpegSegments};

pub fn decode_scan_baseline(segments: &JpegSegments) -> Result<ScanCoefficients> {
    let frame = segments
        .frame
        .as_ref()
        .ok_or_else(|| CodecError::malformed("missing frame info (SOF)"))?;

    let mut dc_tables: [Option<HuffmanLookup>; 4] = [None, None, None, None];
    let mut ac_tables: [Option<HuffmanLookup>; 4] = [None, None, None, None];

    for (i, table) in segments.dc_huff_tables.iter().enumerate() {
        if let Some(t) = table {
            dc_tables[i] = Some(HuffmanLookup::from_table(t)?);
        }
    }
    for (i, table) in segments.ac_huff_tables.iter().enumerate() {
        if let Some(t) = table {
            ac_tables[i] = Some(HuffmanLookup::from_table(t)?);
        }
    }

    let (mcu_width, mcu_height, _blocks_per_mcu, blocks_per_component) = calculate_mcu_info(frame)?;

    let mcu_cols = (frame.width as usize + mcu_width - 1) / mcu_width;
    let mcu_rows = (frame.height as usize + mcu_height - 1) / mcu_height;
    let total_mcus = mcu_cols * mcu_rows;

    let total_blocks: usize = blocks_per_component.iter().sum();

    let mut coefficients = ScanCoefficients {
        data: vec![0i16; total_blocks * 64],
        blocks_per_component: blocks_per_component.clone(),
        total_blocks,
        width: frame.width,
        height: frame.height,
    };

    let mut reader = BitReader::new(&segments.scan_data);
    let mut dc_predictors = vec![0i16; frame.components.len()];
    let mut block_idx = 0;

    let restart_interval = segments.restart_interval as usize;
    let mut restart_count = 0;

    for _mcu in 0..total_mcus {
        if restart_interval > 0 && restart_count == restart_interval {
            dc_predictors.fill(0);
            restart_count = 0;
        }

        for (comp_idx, component) in frame.components.iter().enumerate() {
            let num_blocks = component.h_sampling as usize * component.v_sampling as usize;

            let dc_table = dc_tables[component.dc_table_id as usize]
                .as_ref()
                .ok_or_else(|| CodecError::malformed(format!("missing DC Huffman table {}", component.dc_table_id)))?;

            let ac_table = ac_tables[component.ac_table_id as usize]
                .as_ref()
                .ok_or_else(|| CodecError::malformed(format!("missing AC Huffman table {}", component.ac_table_id)))?;

            for _ in 0..num_blocks {
                if block_idx >= coefficients.total_blocks {
                    break;
                }

                let block = coefficients.block_mut(block_idx);
                decode_block(&mut reader, block, dc_table, ac_table, &mut dc_predictors[comp_idx])?;
                block_idx += 1;
            }
        }

        restart_count += 1;
    }

    Ok(coefficients)
}

pub fn encode_scan_baseline(coefficients: &ScanCoefficients, segments: &JpegSegments) -> Result<Vec<u8>> {
    let frame = segments
        .frame
        .as_ref()
        .ok_or_else(|| CodecError::malformed("missing frame info (SOF)"))?;

    let mut dc_encoders: [Option<HuffmanEncoder>; 4] = [None, None, None, None];
    let mut ac_encoders: [Option<HuffmanEncoder>; 4] = [None, None, None, None];

    for (i, table) in segments.dc_huff_tables.iter().enumerate() {
        if let Some(t) = table {
            dc_encoders[i] = Some(HuffmanEncoder::from_table(t)?);
        }
    }
    for (i, table) in segments.ac_huff_tables.iter().enumerate() {
        if let Some(t) = table {
            ac_encoders[i] = Some(HuffmanEncoder::from_table(t)?);
        }
    }

    let (mcu_width, mcu_height, _blocks_per_mcu, _blocks_per_component) = calculate_mcu_info(frame)?;

    let mcu_cols = (frame.width as usize + mcu_width - 1) / mcu_width;
    let mcu_rows = (frame.height as usize + mcu_height - 1) / mcu_height;
    let total_mcus = mcu_cols * mcu_rows;

    let mut writer = BitWriter::with_capacity(segments.scan_data.len());
    let mut dc_predictors = vec![0i16; frame.components.len()];
    let mut block_idx = 0;
    let mut blocks_encoded = 0;

    for _mcu in 0..total_mcus {
        for (comp_idx, component) in frame.components.iter().enumerate() {
            let num_blocks = component.h_sampling as usize * component.v_sampling as usize;

            let dc_encoder = dc_encoders[component.dc_table_id as usize]
                .as_ref()
                .ok_or_else(|| CodecError::malformed(format!("missing DC Huffman table {}", component.dc_table_id)))?;

            let ac_encoder = ac_encoders[component.ac_table_id as usize]
                .as_ref()
                .ok_or_else(|| CodecError::malformed(format!("missing AC Huffman table {}", component.ac_table_id)))?;

            for _ in 0..num_blocks {
                if block_idx >= coefficients.total_blocks {
                    break;
                }

                let block = coefficients.block(block_idx);
                encode_block(&mut writer, block, dc_encoder, ac_encoder, &mut dc_predictors[comp_idx])?;
                block_idx += 1;
                blocks_encoded += 1;
            }
        }
    }

    let data = writer.into_bytes();
    log::debug!(
        "encoded scan: total_blocks={}, blocks_encoded={}, bytes={}",
        coefficients.total_blocks,
        blocks_encoded,
        data.len()
    );
    Ok(data)
}

fn encode_block(
    writer: &mut BitWriter,
    block: &[i16],
    dc_encoder: &HuffmanEncoder,
    ac_encoder: &HuffmanEncoder,
    dc_predictor: &mut i16,
) -> Result<()> {
    let dc_value = block[0];
    let dc_diff = dc_value.wrapping_sub(*dc_predictor);
    *dc_predictor = dc_value;

    let (dc_size, dc_bits) = encode_coefficient(dc_diff);
    writer.write_huffman(dc_size, dc_encoder)?;
    if dc_size > 0 {
        writer.write_bits(dc_bits, dc_size);
    }

    let mut zero_run = 0u8;

    for k in 1..64 {
        let coeff = block[k];

        if coeff == 0 {
            zero_run += 1;
        } else {
            while zero_run >= 16 {
                writer.write_huffman(0xF0, ac_encoder)?; // ZRL
                zero_run -= 16;
            }

            let (size, bits) = encode_coefficient(coeff);
            let symbol = (zero_run << 4) | size;
            writer.write_huffman(symbol, ac_encoder)?;
            writer.write_bits(bits, size);

            zero_run = 0;
        }
    }

    if zero_run > 0 {
        writer.write_huffman(0x00, ac_encoder)?; // EOB
    }

    Ok(())
}

fn decode_block(
    reader: &mut BitReader,
    block: &mut [i16],
    dc_table: &HuffmanLookup,
    ac_table: &HuffmanLookup,
    dc_predictor: &mut i16,
) -> Result<()> {
    block.fill(0);

    let dc_size = reader.decode_huffman(dc_table)?;
    if dc_size > 11 {
        return Err(CodecError::malformed(format!("invalid DC coefficient size: {}", dc_size)));
    }

    let dc_diff = reader.receive_extend(dc_size)?;
    *dc_predictor = dc_predictor.wrapping_add(dc_diff);
    block[0] = *dc_predictor;

    let mut k = 1;
    while k < 64 {
        let symbol = reader.decode_huffman(ac_table)?;
        let run = symbol >> 4;
        let size = symbol & 0x0F;

        if size == 0 {
            if run == 0 {
                break; // EOB
            } else if run == 0x0F {
                k += 16; // ZRL
            } else {
                return Err(CodecError::malformed(format!("invalid AC run/size: {:02X}", symbol)));
            }
        } else {
            k += run as usize;
            if k >= 64 {
                return Err(CodecError::malformed("AC coefficient index out of bounds"));
            }

            block[k] = reader.receive_extend(size)?;
            k += 1;
        }
    }

    Ok(())
}

/// MCU geometry: (mcu width px, mcu height px, blocks-per-mcu per component,
/// total blocks per component).
pub(crate) fn calculate_mcu_info(frame: &FrameInfo) -> Result<(usize, usize, Vec<usize>, Vec<usize>)> {
    let h_max = frame.components.iter().map(|c| c.h_sampling as usize).max().unwrap_or(1);
    let v_max = frame.components.iter().map(|c| c.v_sampling as usize).max().unwrap_or(1);

    let mcu_width = h_max * 8;
    let mcu_height = v_max * 8;

    let blocks_per_mcu: Vec<usize> = frame
        .components
        .iter()
        .map(|c| c.h_sampling as usize * c.v_sampling as usize)
        .collect();

    let mcu_cols = (frame.width as usize + mcu_width - 1) / mcu_width;
    let mcu_rows = (frame.height as usize + mcu_height - 1) / mcu_height;
    let total_mcus = mcu_cols * mcu_rows;

    let blocks_per_component: Vec<usize> = blocks_per_mcu.iter().map(|&b| b * total_mcus).collect();

    Ok((mcu_width, mcu_height, blocks_per_mcu, blocks_per_component))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Component, FrameInfo};

    fn single_component_frame(width: u16, height: u16) -> FrameInfo {
        FrameInfo {
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
        }
    }

    #[test]
    fn mcu_info_for_16x16_grayscale_is_four_blocks() {
        let frame = single_component_frame(16, 16);
        let (mcu_w, mcu_h, _, blocks_per_component) = calculate_mcu_info(&frame).unwrap();
        assert_eq!(mcu_w, 8);
        assert_eq!(mcu_h, 8);
        assert_eq!(blocks_per_component, vec![4]);
    }

    #[test]
    fn encode_decode_roundtrip_preserves_coefficients() {
        // Standard baseline DC/AC luminance tables (JPEG Annex K, abbreviated here).
        let dc_table = crate::parser::HuffmanTable {
            class: 0,
            id: 0,
            code_lengths: [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0],
            values: vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        };
        // Standard AC luminance table, JPEG Annex K Table K.5.
        let ac_table = crate::parser::HuffmanTable {
            class: 1,
            id: 0,
            code_lengths: [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7d],
            values: vec![
                0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51,
                0x61, 0x07, 0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08, 0x23, 0x42, 0xb1, 0xc1,
                0x15, 0x52, 0xd1, 0xf0, 0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16, 0x17, 0x18,
                0x19, 0x1a, 0x25, 0x26, 0x27, 0x28, 0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39,
                0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57,
                0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x6a, 0x73, 0x74, 0x75,
                0x76, 0x77, 0x78, 0x79, 0x7a, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8a, 0x92,
                0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7,
                0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3,
                0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8,
                0xd9, 0xda, 0xe1, 0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf1, 0xf2,
                0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9, 0xfa,
            ],
        };

        let mut segments = JpegSegments {
            frame: Some(single_component_frame(8, 8)),
            ..Default::default()
        };
        segments.dc_huff_tables[0] = Some(dc_table);
        segments.ac_huff_tables[0] = Some(ac_table);

        let mut coefficients = ScanCoefficients {
            data: vec![0i16; 64],
            blocks_per_component: vec![1],
            total_blocks: 1,
            width: 8,
            height: 8,
        };
        coefficients.data[0] = 12;
        coefficients.data[1] = 1;
        coefficients.data[5] = -3;

        let scan_data = encode_scan_baseline(&coefficients, &segments).unwrap();
        segments.scan_data = scan_data;
        let decoded = decode_scan_baseline(&segments).unwrap();

        assert_eq!(decoded.data, coefficients.data);
    }
}
