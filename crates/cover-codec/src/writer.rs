//! Re-serializes parsed segments plus fresh scan data into a complete JPEG file.

use crate::marker::Marker;
use crate::parser::JpegSegments;

/// Write a complete JPEG file from parsed segments and new scan data.
/// Every original segment (APPn, COM, DQT, DHT, ...) is preserved verbatim;
/// only the scan bytes are replaced.
pub fn write_jpeg(segments: &JpegSegments, new_scan_data: &[u8]) -> Vec<u8> {
    let estimated_size = segments.segments.iter().map(|s| s.data.len() + 4).sum::<usize>()
        + new_scan_data.len()
        + 100;

    let mut output = Vec::with_capacity(estimated_size);

    output.push(0xFF);
    output.push(Marker::SOI.to_u8());

    for segment in &segments.segments {
        if segment.marker == Marker::SOS {
            continue;
        }

        write_marker(&mut output, segment.marker);

        if segment.marker.has_length() {
            let length = (segment.data.len() + 2) as u16;
            output.push((length >> 8) as u8);
            output.push(length as u8);
        }

        output.extend_from_slice(&segment.data);
    }

    write_sos_header(&mut output, segments);
    output.extend_from_slice(new_scan_data);

    output.push(0xFF);
    output.push(Marker::EOI.to_u8());

    output
}

fn write_marker(output: &mut Vec<u8>, marker: Marker) {
    output.push(0xFF);
    output.push(marker.to_u8());
}

fn write_sos_header(output: &mut Vec<u8>, segments: &JpegSegments) {
    write_marker(output, Marker::SOS);

    let frame = match &segments.frame {
        Some(f) => f,
        None => return,
    };

    let num_components = frame.components.len() as u8;
    let length = 6 + 2 * num_components as u16;

    output.push((length >> 8) as u8);
    output.push(length as u8);
    output.push(num_components);

    for component in &frame.components {
        output.push(component.id);
        output.push((component.dc_table_id << 4) | component.ac_table_id);
    }

    output.push(0); // spectral selection start
    output.push(63); // spectral selection end
    output.push(0); // successive approximation
}
