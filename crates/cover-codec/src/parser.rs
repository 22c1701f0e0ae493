//! JPEG segment parsing: quantization tables, Huffman tables, frame geometry
//! and raw entropy-coded scan bytes.

use crate::error::{CodecError, Result};
use crate::marker::Marker;
use std::io::{Read, Seek};

/// Zigzag order to natural (row-major) order mapping.
pub const ZIGZAG_TO_NATURAL: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27, 20,
    13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58, 59,
    52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// Natural (row-major) order to zigzag order mapping.
pub const NATURAL_TO_ZIGZAG: [usize; 64] = [
    0, 1, 5, 6, 14, 15, 27, 28, 2, 4, 7, 13, 16, 26, 29, 42, 3, 8, 12, 17, 25, 30, 41, 43, 9, 11,
    18, 24, 31, 40, 44, 53, 10, 19, 23, 32, 39, 45, 52, 54, 20, 22, 33, 38, 46, 51, 55, 60, 21, 34,
    37, 47, 50, 56, 59, 61, 35, 36, 48, 49, 57, 58, 62, 63,
];

/// Reversed zig-zag order: frequency-ascending traversal used by the
/// steganographic engines, with index 0 the DC coefficient. This differs
/// from the JPEG bitstream's own zigzag order only in naming convention here
/// — both start at DC and proceed low-to-high frequency — but is kept as its
/// own table since the engines index coefficients by this exact sequence.
pub const REVERSED_ZIG_ZAG: [usize; 64] = ZIGZAG_TO_NATURAL;

/// A JPEG quantization table (8x8 = 64 values).
#[derive(Debug, Clone)]
pub struct QuantizationTable {
    pub id: u8,
    pub precision: u8,
    /// Values in zigzag order, as stored in the JPEG bitstream.
    pub values: [u16; 64],
}

impl QuantizationTable {
    #[inline]
    pub fn get_zigzag(&self, index: usize) -> u16 {
        self.values[index]
    }

    #[inline]
    pub fn get_natural(&self, row: usize, col: usize) -> u16 {
        self.values[NATURAL_TO_ZIGZAG[row * 8 + col]]
    }
}

/// Huffman table as read from a DHT segment.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    /// 0 = DC, 1 = AC.
    pub class: u8,
    pub id: u8,
    /// Number of codes of each bit length (1-16).
    pub code_lengths: [u8; 16],
    pub values: Vec<u8>,
}

/// One component's entry in the SOF/SOS headers.
#[derive(Debug, Clone)]
pub struct Component {
    pub id: u8,
    pub h_sampling: u8,
    pub v_sampling: u8,
    pub quant_table_id: u8,
    pub dc_table_id: u8,
    pub ac_table_id: u8,
}

/// Frame geometry parsed from the SOF marker.
#[derive(Debug, Clone)]
pub struct FrameInfo {
    /// SOF type: 0 = baseline, 2 = progressive, etc.
    pub sof_type: u8,
    pub precision: u8,
    pub height: u16,
    pub width: u16,
    pub components: Vec<Component>,
}

impl FrameInfo {
    pub fn is_baseline(&self) -> bool {
        self.sof_type == 0
    }

    pub fn is_progressive(&self) -> bool {
        self.sof_type == 2
    }
}

/// A raw marker segment, retained verbatim for re-serialization.
#[derive(Debug, Clone)]
pub struct Segment {
    pub marker: Marker,
    pub data: Vec<u8>,
}

/// Everything needed to reconstruct a JPEG file after coefficient edits.
#[derive(Debug, Clone, Default)]
pub struct JpegSegments {
    /// All segments in file order (SOS excluded; rebuilt from `frame`).
    pub segments: Vec<Segment>,
    pub quant_tables: [Option<QuantizationTable>; 4],
    pub dc_huff_tables: [Option<HuffmanTable>; 4],
    pub ac_huff_tables: [Option<HuffmanTable>; 4],
    pub frame: Option<FrameInfo>,
    pub restart_interval: u16,
    /// Raw entropy-coded bytes after the SOS header, byte-stuffing intact.
    pub scan_data: Vec<u8>,
    pub sos_header: Vec<u8>,
}

/// Parse a complete JPEG file into its segments.
pub fn parse_jpeg(data: &[u8]) -> Result<JpegSegments> {
    let mut cursor = std::io::Cursor::new(data);
    parse_jpeg_reader(&mut cursor)
}

/// Parse a JPEG from any seekable reader.
pub fn parse_jpeg_reader<R: Read + Seek>(reader: &mut R) -> Result<JpegSegments> {
    let mut segments = JpegSegments::default();

    let mut marker_bytes = [0u8; 2];
    reader.read_exact(&mut marker_bytes)?;
    if marker_bytes != [0xFF, 0xD8] {
        return Err(CodecError::malformed("missing SOI marker"));
    }

    loop {
        let marker = read_marker(reader)?;

        match marker {
            Marker::EOI => break,

            Marker::SOS => {
                let length = read_length(reader)?;
                let mut header = vec![0u8; length];
                reader.read_exact(&mut header)?;

                parse_sos_header(&header, &mut segments)?;
                segments.sos_header = header;
                segments.scan_data = read_scan_data(reader)?;
                break;
            }

            Marker::DQT => {
                let length = read_length(reader)?;
                let mut data = vec![0u8; length];
                reader.read_exact(&mut data)?;
                parse_dqt(&data, &mut segments)?;
                segments.segments.push(Segment { marker, data });
            }

            Marker::DHT => {
                let length = read_length(reader)?;
                let mut data = vec![0u8; length];
                reader.read_exact(&mut data)?;
                parse_dht(&data, &mut segments)?;
                segments.segments.push(Segment { marker, data });
            }

            Marker::SOF(n) => {
                let length = read_length(reader)?;
                let mut data = vec![0u8; length];
                reader.read_exact(&mut data)?;
                segments.frame = Some(parse_sof(n, &data)?);
                segments.segments.push(Segment { marker, data });
            }

            Marker::DRI => {
                let length = read_length(reader)?;
                let mut data = vec![0u8; length];
                reader.read_exact(&mut data)?;
                if data.len() >= 2 {
                    segments.restart_interval = u16::from_be_bytes([data[0], data[1]]);
                }
                segments.segments.push(Segment { marker, data });
            }

            _ if marker.has_length() => {
                let length = read_length(reader)?;
                let mut data = vec![0u8; length];
                reader.read_exact(&mut data)?;
                segments.segments.push(Segment { marker, data });
            }

            _ => {
                // Markers without a length field (RST, etc) do not occur
                // before the first SOS.
            }
        }
    }

    log::debug!(
        "parsed JPEG: {:?}, restart_interval={}, scan bytes={}",
        segments.frame.as_ref().map(|f| (f.width, f.height)),
        segments.restart_interval,
        segments.scan_data.len()
    );

    Ok(segments)
}

fn read_marker<R: Read>(reader: &mut R) -> Result<Marker> {
    let mut buf = [0u8; 1];

    loop {
        reader.read_exact(&mut buf)?;
        if buf[0] == 0xFF {
            break;
        }
    }

    loop {
        reader.read_exact(&mut buf)?;
        if buf[0] != 0xFF {
            break;
        }
    }

    Marker::from_u8(buf[0]).ok_or_else(|| CodecError::malformed(format!("invalid marker byte: 0x{:02X}", buf[0])))
}

/// Read a segment length (2 bytes, big-endian, includes the length field itself).
fn read_length<R: Read>(reader: &mut R) -> Result<usize> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    let length = u16::from_be_bytes(buf) as usize;
    if length < 2 {
        return Err(CodecError::malformed("segment length too small"));
    }
    Ok(length - 2)
}

/// Read entropy-coded scan bytes up to (but excluding) the next non-restart
/// marker. Byte stuffing (`0xFF 0x00`) is preserved; the bit reader undoes it.
fn read_scan_data<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut buf = [0u8; 1];

    loop {
        if reader.read_exact(&mut buf).is_err() {
            break;
        }

        if buf[0] == 0xFF {
            data.push(0xFF);

            if reader.read_exact(&mut buf).is_err() {
                break;
            }

            match buf[0] {
                0x00 => data.push(0x00),
                0xD0..=0xD7 => data.push(buf[0]),
                0xD9 => {
                    data.pop();
                    break;
                }
                0xFF => continue,
                _ => {
                    data.pop();
                    break;
                }
            }
        } else {
            data.push(buf[0]);
        }
    }

    Ok(data)
}

fn parse_dqt(data: &[u8], segments: &mut JpegSegments) -> Result<()> {
    let mut pos = 0;

    while pos < data.len() {
        let pq_tq = data[pos];
        let precision = (pq_tq >> 4) & 0x0F;
        let id = pq_tq & 0x0F;
        pos += 1;

        if id > 3 {
            return Err(CodecError::malformed(format!("invalid quantization table ID: {}", id)));
        }

        let mut values = [0u16; 64];
        if precision == 0 {
            for v in values.iter_mut() {
                if pos >= data.len() {
                    return Err(CodecError::malformed("DQT segment too short"));
                }
                *v = data[pos] as u16;
                pos += 1;
            }
        } else {
            for v in values.iter_mut() {
                if pos + 1 >= data.len() {
                    return Err(CodecError::malformed("DQT segment too short"));
                }
                *v = u16::from_be_bytes([data[pos], data[pos + 1]]);
                pos += 2;
            }
        }

        segments.quant_tables[id as usize] = Some(QuantizationTable { id, precision, values });
    }

    Ok(())
}

fn parse_dht(data: &[u8], segments: &mut JpegSegments) -> Result<()> {
    let mut pos = 0;

    while pos < data.len() {
        let tc_th = data[pos];
        let class = (tc_th >> 4) & 0x0F;
        let id = tc_th & 0x0F;
        pos += 1;

        if class > 1 || id > 3 {
            return Err(CodecError::malformed(format!("invalid Huffman table: class={}, id={}", class, id)));
        }

        let mut code_lengths = [0u8; 16];
        if pos + 16 > data.len() {
            return Err(CodecError::malformed("DHT segment too short for code lengths"));
        }
        code_lengths.copy_from_slice(&data[pos..pos + 16]);
        pos += 16;

        let total_codes: usize = code_lengths.iter().map(|&n| n as usize).sum();

        if pos + total_codes > data.len() {
            return Err(CodecError::malformed("DHT segment too short for symbol values"));
        }
        let values = data[pos..pos + total_codes].to_vec();
        pos += total_codes;

        let table = HuffmanTable { class, id, code_lengths, values };

        if class == 0 {
            segments.dc_huff_tables[id as usize] = Some(table);
        } else {
            segments.ac_huff_tables[id as usize] = Some(table);
        }
    }

    Ok(())
}

fn parse_sof(sof_type: u8, data: &[u8]) -> Result<FrameInfo> {
    if data.len() < 6 {
        return Err(CodecError::malformed("SOF segment too short"));
    }

    let precision = data[0];
    let height = u16::from_be_bytes([data[1], data[2]]);
    let width = u16::from_be_bytes([data[3], data[4]]);
    let num_components = data[5] as usize;

    if data.len() < 6 + num_components * 3 {
        return Err(CodecError::malformed("SOF segment too short for components"));
    }

    let mut components = Vec::with_capacity(num_components);
    for i in 0..num_components {
        let offset = 6 + i * 3;
        let id = data[offset];
        let sampling = data[offset + 1];
        let quant_table_id = data[offset + 2];

        components.push(Component {
            id,
            h_sampling: (sampling >> 4) & 0x0F,
            v_sampling: sampling & 0x0F,
            quant_table_id,
            dc_table_id: 0,
            ac_table_id: 0,
        });
    }

    Ok(FrameInfo { sof_type, precision, height, width, components })
}

fn parse_sos_header(data: &[u8], segments: &mut JpegSegments) -> Result<()> {
    if data.is_empty() {
        return Err(CodecError::malformed("SOS header empty"));
    }

    let num_components = data[0] as usize;
    if data.len() < 1 + num_components * 2 + 3 {
        return Err(CodecError::malformed("SOS header too short"));
    }

    if let Some(ref mut frame) = segments.frame {
        for i in 0..num_components {
            let offset = 1 + i * 2;
            let component_id = data[offset];
            let table_ids = data[offset + 1];
            let dc_table = (table_ids >> 4) & 0x0F;
            let ac_table = table_ids & 0x0F;

            for comp in frame.components.iter_mut() {
                if comp.id == component_id {
                    comp.dc_table_id = dc_table;
                    comp.ac_table_id = ac_table;
                    break;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zigzag_tables_are_inverses() {
        assert_eq!(ZIGZAG_TO_NATURAL[0], 0);
        assert_eq!(NATURAL_TO_ZIGZAG[0], 0);
        for i in 0..64 {
            assert_eq!(NATURAL_TO_ZIGZAG[ZIGZAG_TO_NATURAL[i]], i);
        }
    }

    #[test]
    fn parses_minimal_soi_eoi() {
        let data = [0xFF, 0xD8, 0xFF, 0xD9];
        assert!(parse_jpeg(&data).is_ok());
    }

    #[test]
    fn rejects_non_jpeg() {
        let data = [0x00, 0x00, 0x00, 0x00];
        assert!(parse_jpeg(&data).is_err());
    }
}
