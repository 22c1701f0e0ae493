//! A minimal baseline-JPEG codec exposing DCT coefficients directly, without
//! dequantization or inverse transform.
//!
//! This is the external collaborator a steganographic engine needs: parse a
//! JPEG into a flat, block-major array of quantized coefficients, let the
//! caller perturb them, and re-serialize using the source's own quantization
//! and Huffman tables. Only baseline (SOF0, sequential, Huffman) frames are
//! supported — progressive frames are parsed for geometry but rejected
//! before scan decode ([`error::CodecError::ProgressiveUnsupported`]).

pub mod error;
pub mod huffman;
pub mod marker;
pub mod parser;
pub mod scan;
pub mod writer;

pub use error::{CodecError, Result};
pub use huffman::{encode_coefficient, BitReader, BitWriter, HuffmanEncoder, HuffmanLookup};
pub use marker::Marker;
pub use parser::{
    parse_jpeg, parse_jpeg_reader, Component, FrameInfo, HuffmanTable, JpegSegments,
    QuantizationTable, Segment, NATURAL_TO_ZIGZAG, REVERSED_ZIG_ZAG, ZIGZAG_TO_NATURAL,
};
pub use scan::{decode_scan, encode_scan, ScanCoefficients};
pub use writer::write_jpeg;
