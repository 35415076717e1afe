//! Image decoding for PDF embedding.
//!
//! Images become Image XObjects:
//!
//! - **JPEG** is embedded as-is under `DCTDecode` once a full decode has
//!   proven the data is readable.
//! - **Everything else** the `image` crate can decode is expanded to 8-bit
//!   RGB or gray samples and Flate-compressed, with any alpha channel split
//!   into a soft mask.

use crate::error::{Error, Result};
use crate::object::{Dict, Object};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::GenericImageView;
use std::io::Write;

/// How the sample data is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Original JPEG bytes (DCTDecode)
    Jpeg,
    /// Zlib-compressed samples (FlateDecode)
    Flate,
}

/// Color space of the samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Grayscale (1 component per pixel)
    DeviceGray,
    /// RGB color (3 components per pixel)
    DeviceRGB,
    /// CMYK color (4 components per pixel)
    DeviceCMYK,
}

impl ColorSpace {
    /// Get the PDF name for this color space.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceCMYK => "DeviceCMYK",
        }
    }
}

/// A decoded image ready to be written as an XObject.
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Color space
    pub color_space: ColorSpace,
    /// Storage format of `data`
    pub format: ImageFormat,
    /// Encoded sample data
    pub data: Vec<u8>,
    /// Flate-compressed alpha channel, one byte per pixel
    pub soft_mask: Option<Vec<u8>>,
    /// CMYK samples are stored inverted, as Adobe applications write them
    pub inverted_cmyk: bool,
}

impl ImageData {
    /// Decode `data`, detecting the format from its contents.
    ///
    /// # Errors
    ///
    /// [`Error::Decode`] when the bytes are not an image the `image` crate
    /// can fully decode, or when the image has a zero dimension.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let format = image::guess_format(data).map_err(|e| Error::Decode(e.to_string()))?;
        let image = if format == image::ImageFormat::Jpeg {
            Self::from_jpeg(data)?
        } else {
            Self::from_decoded(data, format)?
        };

        if image.width == 0 || image.height == 0 {
            return Err(Error::Decode(format!("image has zero size ({}x{})", image.width, image.height)));
        }
        log::debug!(
            "Decoded {:?} image {}x{} as {}",
            format,
            image.width,
            image.height,
            image.color_space.pdf_name()
        );
        Ok(image)
    }

    fn from_jpeg(data: &[u8]) -> Result<Self> {
        // Full decode: a readable header with corrupt scan data must still fail.
        image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
            .map_err(|e| Error::Decode(e.to_string()))?;
        let header = parse_jpeg_header(data)?;

        Ok(Self {
            width: header.width,
            height: header.height,
            color_space: header.color_space,
            format: ImageFormat::Jpeg,
            data: data.to_vec(),
            soft_mask: None,
            inverted_cmyk: header.color_space == ColorSpace::DeviceCMYK && header.adobe,
        })
    }

    fn from_decoded(data: &[u8], format: image::ImageFormat) -> Result<Self> {
        let img = image::load_from_memory_with_format(data, format).map_err(|e| Error::Decode(e.to_string()))?;
        let (width, height) = img.dimensions();

        let (color_space, pixels, alpha) = match img.color() {
            image::ColorType::L8 | image::ColorType::L16 => (ColorSpace::DeviceGray, img.to_luma8().into_raw(), None),
            image::ColorType::La8 | image::ColorType::La16 => {
                let la = img.to_luma_alpha8();
                let mut gray = Vec::with_capacity(la.len() / 2);
                let mut alpha = Vec::with_capacity(la.len() / 2);
                for pixel in la.pixels() {
                    gray.push(pixel.0[0]);
                    alpha.push(pixel.0[1]);
                }
                (ColorSpace::DeviceGray, gray, Some(alpha))
            },
            color if color.has_alpha() => {
                let rgba = img.to_rgba8();
                let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
                let mut alpha = Vec::with_capacity(rgba.len() / 4);
                for pixel in rgba.pixels() {
                    rgb.extend_from_slice(&pixel.0[..3]);
                    alpha.push(pixel.0[3]);
                }
                (ColorSpace::DeviceRGB, rgb, Some(alpha))
            },
            _ => (ColorSpace::DeviceRGB, img.to_rgb8().into_raw(), None),
        };

        // Fully opaque masks add nothing.
        let alpha = alpha.filter(|a| a.iter().any(|&v| v != 0xFF));

        Ok(Self {
            width,
            height,
            color_space,
            format: ImageFormat::Flate,
            data: compress(&pixels)?,
            soft_mask: alpha.map(|a| compress(&a)).transpose()?,
            inverted_cmyk: false,
        })
    }

    /// The Image XObject stream, without its `/SMask` entry.
    pub fn xobject(&self) -> Object {
        let mut dict = self.image_dict(self.color_space, 8);
        let filter = match self.format {
            ImageFormat::Jpeg => "DCTDecode",
            ImageFormat::Flate => "FlateDecode",
        };
        dict.insert("Filter".to_string(), Object::Name(filter.to_string()));
        if self.inverted_cmyk {
            let decode = [1, 0, 1, 0, 1, 0, 1, 0].into_iter().map(Object::Integer).collect();
            dict.insert("Decode".to_string(), Object::Array(decode));
        }
        Object::Stream {
            dict,
            data: bytes::Bytes::from(self.data.clone()),
        }
    }

    /// The soft mask XObject, when the image has transparency.
    pub fn soft_mask_xobject(&self) -> Option<Object> {
        self.soft_mask.as_ref().map(|mask| {
            let mut dict = self.image_dict(ColorSpace::DeviceGray, 8);
            dict.insert("Filter".to_string(), Object::Name("FlateDecode".to_string()));
            Object::Stream {
                dict,
                data: bytes::Bytes::from(mask.clone()),
            }
        })
    }

    fn image_dict(&self, color_space: ColorSpace, bits: i64) -> Dict {
        let mut dict = Dict::new();
        dict.insert("Type".to_string(), Object::Name("XObject".to_string()));
        dict.insert("Subtype".to_string(), Object::Name("Image".to_string()));
        dict.insert("Width".to_string(), Object::Integer(self.width as i64));
        dict.insert("Height".to_string(), Object::Integer(self.height as i64));
        dict.insert("ColorSpace".to_string(), Object::Name(color_space.pdf_name().to_string()));
        dict.insert("BitsPerComponent".to_string(), Object::Integer(bits));
        dict
    }
}

/// What the XObject dictionary needs from a JPEG's markers.
#[derive(Debug, PartialEq)]
struct JpegHeader {
    width: u32,
    height: u32,
    color_space: ColorSpace,
    /// An APP14 "Adobe" segment precedes the frame
    adobe: bool,
}

/// Dimensions and color space from the first SOF marker.
fn parse_jpeg_header(data: &[u8]) -> Result<JpegHeader> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return Err(Error::Decode("Not a valid JPEG".to_string()));
    }

    let mut pos = 2;
    let mut adobe = false;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];
        pos += 2;

        if marker == 0xFF {
            // Fill byte; the next 0xFF may start the real marker.
            pos -= 1;
            continue;
        }
        if marker == 0x00 || (0xD0..=0xD8).contains(&marker) {
            continue;
        }

        // SOF0..SOF15, minus DHT (C4), JPG (C8) and DAC (CC)
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            if pos + 8 > data.len() {
                return Err(Error::Decode("Truncated JPEG header".to_string()));
            }
            let height = u16::from_be_bytes([data[pos + 3], data[pos + 4]]) as u32;
            let width = u16::from_be_bytes([data[pos + 5], data[pos + 6]]) as u32;
            let color_space = match data[pos + 7] {
                1 => ColorSpace::DeviceGray,
                3 => ColorSpace::DeviceRGB,
                4 => ColorSpace::DeviceCMYK,
                n => return Err(Error::Decode(format!("unsupported JPEG component count {}", n))),
            };
            return Ok(JpegHeader {
                width,
                height,
                color_space,
                adobe,
            });
        }
        if marker == 0xEE && data.get(pos + 2..pos + 7) == Some(&b"Adobe"[..]) {
            adobe = true;
        }

        if pos + 2 > data.len() {
            break;
        }
        let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
        pos += length;
    }

    Err(Error::Decode("Could not find JPEG dimensions".to_string()))
}

fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
