//! Stream decoder implementations for PDF filters.
//!
//! Only FlateDecode is decoded. Image filters such as DCTDecode are never
//! decoded here because nothing in the reader needs image samples.
//!
//! Decoders can be chained together in a filter pipeline.

use crate::error::{Error, Result};

mod flate;
mod predictor;

pub use flate::FlateDecoder;
pub use predictor::{decode_predictor, DecodeParams};

/// Largest allowed ratio of decoded to encoded size.
const MAX_DECOMPRESSION_RATIO: usize = 100;
/// Largest allowed decoded stream, in bytes.
const MAX_DECOMPRESSED_SIZE: usize = 100 * 1024 * 1024;

/// Trait for PDF stream decoders.
pub trait StreamDecoder {
    /// Decode the input data.
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Filter name as it appears in `/Filter` (e.g. "FlateDecode").
    fn name(&self) -> &str;
}

fn decoder_for(filter_name: &str) -> Result<Box<dyn StreamDecoder>> {
    match filter_name {
        "FlateDecode" | "Fl" => Ok(Box::new(FlateDecoder)),
        other => Err(Error::UnsupportedFilter(other.to_string())),
    }
}

/// Decode stream data through a filter pipeline without decode parameters.
///
/// ```
/// use pdf_annotator::decoders::decode_stream;
///
/// assert_eq!(decode_stream(b"plain", &[]).unwrap(), b"plain");
/// ```
pub fn decode_stream(data: &[u8], filters: &[String]) -> Result<Vec<u8>> {
    decode_stream_with_params(data, filters, None)
}

/// Decode stream data, then reverse any predictor named in `params`.
///
/// # Errors
///
/// Fails on an unsupported filter, corrupt data, or output that exceeds the
/// decompression limits (100:1 ratio, 100 MB).
pub fn decode_stream_with_params(
    data: &[u8],
    filters: &[String],
    params: Option<&DecodeParams>,
) -> Result<Vec<u8>> {
    let compressed_size = data.len().max(1);
    let mut current = data.to_vec();

    for filter_name in filters {
        let decoder = decoder_for(filter_name)?;
        current = decoder.decode(&current)?;

        let ratio = current.len() / compressed_size;
        if ratio > MAX_DECOMPRESSION_RATIO {
            return Err(Error::StreamDecode(format!(
                "Decompression bomb detected: ratio {}:1 exceeds limit {}:1 (compressed: {} bytes, decompressed: {} bytes)",
                ratio,
                MAX_DECOMPRESSION_RATIO,
                data.len(),
                current.len()
            )));
        }
        if current.len() > MAX_DECOMPRESSED_SIZE {
            return Err(Error::StreamDecode(format!(
                "Decompression bomb detected: decompressed size {} bytes exceeds limit {} bytes",
                current.len(),
                MAX_DECOMPRESSED_SIZE
            )));
        }
    }

    if let Some(params) = params {
        if params.predictor != 1 {
            current = decode_predictor(&current, params)?;
        }
    }

    Ok(current)
}
