//! FlateDecode (zlib/deflate) implementation.
//!
//! Uses the flate2 crate for zlib decompression, falling back to a raw
//! deflate stream when the zlib wrapper is damaged.

use crate::decoders::StreamDecoder;
use crate::error::{Error, Result};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use std::io::Read;

/// FlateDecode filter implementation.
pub struct FlateDecoder;

impl StreamDecoder for FlateDecoder {
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let zlib_err = match ZlibDecoder::new(input).read_to_end(&mut output) {
            Ok(_) => return Ok(output),
            Err(e) => e,
        };

        // Some producers write a bad header or checksum around valid deflate data.
        log::debug!("Zlib decode failed ({}), trying raw deflate", zlib_err);
        let candidates: [&[u8]; 2] = [input, input.get(2..).unwrap_or_default()];
        for candidate in candidates {
            let mut raw = Vec::new();
            if DeflateDecoder::new(candidate).read_to_end(&mut raw).is_ok() && !raw.is_empty() {
                log::info!("Raw deflate recovery succeeded: {} bytes", raw.len());
                return Ok(raw);
            }
        }

        Err(Error::StreamDecode(format!("FlateDecode failed: {}", zlib_err)))
    }

    fn name(&self) -> &str {
        "FlateDecode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{DeflateEncoder, ZlibEncoder};
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_flate_decode_simple() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"BT /F1 12 Tf (made in India) Tj ET").unwrap();
        let compressed = encoder.finish().unwrap();

        let decoded = FlateDecoder.decode(&compressed).unwrap();
        assert_eq!(decoded, b"BT /F1 12 Tf (made in India) Tj ET");
    }

    #[test]
    fn test_flate_decode_raw_deflate() {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"no zlib wrapper here").unwrap();
        let compressed = encoder.finish().unwrap();

        let decoded = FlateDecoder.decode(&compressed).unwrap();
        assert_eq!(decoded, b"no zlib wrapper here");
    }

    #[test]
    fn test_flate_decode_large_data() {
        let original = vec![b'A'; 100_000];
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&original).unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(FlateDecoder.decode(&compressed).unwrap(), original);
    }

    #[test]
    fn test_flate_decode_invalid_data() {
        let result = FlateDecoder.decode(&[0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(matches!(result, Err(Error::StreamDecode(_))));
    }

    #[test]
    fn test_flate_decoder_name() {
        assert_eq!(FlateDecoder.name(), "FlateDecode");
    }
}
