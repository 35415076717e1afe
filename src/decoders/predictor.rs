//! Predictor reversal for Flate-compressed streams.
//!
//! Xref streams and object streams written by most producers use PNG
//! predictors (10-15). TIFF predictor 2 shows up occasionally in older files.

use crate::error::{Error, Result};

/// Decode parameters read from a stream's `/DecodeParms`.
#[derive(Debug, Clone)]
pub struct DecodeParams {
    /// Predictor algorithm (1 = none, 2 = TIFF, 10-15 = PNG)
    pub predictor: i64,
    /// Number of samples per row
    pub columns: usize,
    /// Number of colour components per sample
    pub colors: usize,
    /// Bits per component
    pub bits_per_component: usize,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            columns: 1,
            colors: 1,
            bits_per_component: 8,
        }
    }
}

impl DecodeParams {
    /// Bytes of sample data per row, excluding any PNG tag byte.
    pub fn pixel_bytes_per_row(&self) -> usize {
        (self.columns * self.colors * self.bits_per_component).div_ceil(8)
    }

    /// Bytes per complete sample, at least one.
    fn bytes_per_pixel(&self) -> usize {
        (self.colors * self.bits_per_component).div_ceil(8).max(1)
    }
}

/// Reverse the predictor named in `params`.
pub fn decode_predictor(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    match params.predictor {
        1 => Ok(data.to_vec()),
        2 => decode_tiff_predictor(data, params),
        10..=15 => decode_png_predictor(data, params),
        other => Err(Error::StreamDecode(format!("Unsupported predictor: {}", other))),
    }
}

fn decode_tiff_predictor(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    if params.bits_per_component != 8 {
        return Err(Error::StreamDecode(format!(
            "TIFF predictor with {} bits per component",
            params.bits_per_component
        )));
    }

    let row_len = params.pixel_bytes_per_row();
    let colors = params.colors;
    let mut output = Vec::with_capacity(data.len());

    for row in data.chunks(row_len) {
        let row_start = output.len();
        for (i, &byte) in row.iter().enumerate() {
            let left = if i >= colors { output[row_start + i - colors] } else { 0 };
            output.push(byte.wrapping_add(left));
        }
    }

    Ok(output)
}

/// Every PNG row starts with its own filter tag, whatever predictor value
/// the dictionary names.
fn decode_png_predictor(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    let pixel_bytes = params.pixel_bytes_per_row();
    let row_len = pixel_bytes + 1;
    let bpp = params.bytes_per_pixel();

    if data.len() % row_len != 0 {
        log::debug!(
            "Predictor data length {} is not a multiple of row size {}, truncating",
            data.len(),
            row_len
        );
    }

    let mut output: Vec<u8> = Vec::with_capacity(data.len());
    let mut previous = vec![0u8; pixel_bytes];

    for row in data.chunks_exact(row_len) {
        let tag = row[0];
        let encoded = &row[1..];
        let mut current = vec![0u8; pixel_bytes];

        for i in 0..pixel_bytes {
            let left = if i >= bpp { current[i - bpp] } else { 0 };
            let up = previous[i];
            let up_left = if i >= bpp { previous[i - bpp] } else { 0 };

            let predicted = match tag {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((u16::from(left) + u16::from(up)) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => {
                    return Err(Error::StreamDecode(format!(
                        "Invalid PNG predictor tag: {}",
                        other
                    )))
                },
            };
            current[i] = encoded[i].wrapping_add(predicted);
        }

        output.extend_from_slice(&current);
        previous = current;
    }

    Ok(output)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
