//! Reading annotations from existing pages.
//!
//! Annotations hang off a page's `/Annots` array, either inline or through
//! indirect references. Text entries (`/Contents`, `/T`, `/M`) are PDF text
//! strings: UTF-16BE when they start with a byte order mark, PDFDocEncoding
//! otherwise.

use crate::annotation_types::{AnnotationColor, AnnotationFlags, AnnotationSubtype, TextAnnotationIcon};
use crate::document::{rect_from_array, Page, PdfDocument};
use crate::error::Result;
use crate::geometry::Rect;
use crate::object::{Dict, Object};

/// A PDF annotation as read from a page.
#[derive(Debug, Clone)]
pub struct Annotation {
    /// Raw `/Subtype` name, when present
    pub subtype: Option<String>,

    /// Parsed subtype
    pub subtype_enum: AnnotationSubtype,

    /// Text contents (`/Contents`)
    pub contents: Option<String>,

    /// Author or title (`/T`)
    pub title: Option<String>,

    /// Modification date (`/M`), verbatim
    pub modified: Option<String>,

    /// Creation date (`/CreationDate`), verbatim
    pub creation_date: Option<String>,

    /// Annotation rectangle (`/Rect`)
    pub rect: Option<Rect>,

    /// Colour (`/C`)
    pub color: AnnotationColor,

    /// Whether the pop-up starts open (`/Open`)
    pub open: bool,

    /// Icon of a point comment (`/Name`)
    pub icon: Option<TextAnnotationIcon>,

    /// Flags (`/F`)
    pub flags: AnnotationFlags,
}

impl PdfDocument {
    /// Annotations of the page at zero-based `page_index`.
    ///
    /// # Errors
    ///
    /// Fails only when the page does not exist.
    pub fn get_annotations(&mut self, page_index: usize) -> Result<Vec<Annotation>> {
        let page = self.page(page_index)?;
        self.annotations_of_page(&page)
    }

    /// Annotations of `page`, in `/Annots` order.
    ///
    /// A missing or unusable `/Annots` entry means no annotations. Entries
    /// that are not dictionaries, or references that cannot be loaded, are
    /// skipped with a warning so the remaining annotations are still read.
    pub fn annotations_of_page(&mut self, page: &Page) -> Result<Vec<Annotation>> {
        let annots = match page.dict.get("Annots") {
            Some(annots) => self.resolve(annots),
            None => return Ok(Vec::new()),
        };
        let entries = match annots {
            Ok(Object::Array(entries)) => entries,
            Ok(Object::Null) => return Ok(Vec::new()),
            Ok(other) => {
                log::warn!("Ignoring /Annots of type {}", other.type_name());
                return Ok(Vec::new());
            },
            Err(e) => {
                log::warn!("Ignoring unreadable /Annots: {}", e);
                return Ok(Vec::new());
            },
        };

        let mut result = Vec::with_capacity(entries.len());
        for entry in &entries {
            match self.resolve(entry) {
                Ok(Object::Dictionary(dict)) => result.push(self.parse_annotation(&dict)),
                Ok(Object::Null) => log::debug!("Skipping null /Annots entry"),
                Ok(other) => log::warn!("Skipping /Annots entry of type {}", other.type_name()),
                Err(e) => log::warn!("Skipping unreadable /Annots entry: {}", e),
            }
        }
        Ok(result)
    }

    fn parse_annotation(&mut self, dict: &Dict) -> Annotation {
        let subtype = dict.get("Subtype").and_then(Object::as_name).map(str::to_string);
        let subtype_enum = subtype
            .as_deref()
            .map(AnnotationSubtype::from_pdf_name)
            .unwrap_or_else(|| AnnotationSubtype::Other(String::new()));

        let rect = self.entry(dict, "Rect").as_ref().and_then(rect_from_array);
        let color = match self.entry(dict, "C") {
            Some(obj) => {
                let values: Vec<f32> = obj
                    .as_array()
                    .map(|arr| arr.iter().filter_map(Object::as_number).map(|n| n as f32).collect())
                    .unwrap_or_default();
                AnnotationColor::from_components(&values)
            },
            None => AnnotationColor::None,
        };

        let flags = dict
            .get("F")
            .and_then(Object::as_integer)
            .map(|f| AnnotationFlags::new(f as u32))
            .unwrap_or_default();

        Annotation {
            subtype,
            subtype_enum,
            contents: self.text_entry(dict, "Contents"),
            title: self.text_entry(dict, "T"),
            modified: self.text_entry(dict, "M"),
            creation_date: self.text_entry(dict, "CreationDate"),
            rect,
            color,
            open: dict.get("Open").and_then(Object::as_bool).unwrap_or(false),
            icon: dict
                .get("Name")
                .and_then(Object::as_name)
                .map(TextAnnotationIcon::from_pdf_name),
            flags,
        }
    }

    /// An entry with references followed; `None` when it cannot be loaded.
    fn entry(&mut self, dict: &Dict, key: &str) -> Option<Object> {
        let value = dict.get(key)?;
        match self.resolve(value) {
            Ok(obj) => Some(obj),
            Err(e) => {
                log::warn!("Ignoring unreadable /{} entry: {}", key, e);
                None
            },
        }
    }

    /// A text string entry; anything other than a string reads as absent.
    fn text_entry(&mut self, dict: &Dict, key: &str) -> Option<String> {
        match self.entry(dict, key)? {
            Object::String(bytes) => Some(decode_text_string(&bytes)),
            Object::Null => None,
            other => {
                log::debug!("Ignoring /{} of type {}", key, other.type_name());
                None
            },
        }
    }
}

/// Decode a PDF text string.
///
/// Bytes starting with `FE FF` are UTF-16BE; anything else is
/// PDFDocEncoding. Unpaired surrogates become U+FFFD and undefined
/// PDFDocEncoding codes are dropped.
///
/// ```
/// use pdf_annotator::annotations::decode_text_string;
///
/// assert_eq!(decode_text_string(b"Nice view"), "Nice view");
/// assert_eq!(decode_text_string(&[0xFE, 0xFF, 0x09, 0x2D]), "\u{92D}");
/// assert_eq!(decode_text_string(&[0xA0, b'5']), "\u{20AC}5");
/// ```
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().filter_map(|&b| pdfdoc_char(b)).collect()
}

/// Encode `text` as a PDF text string.
///
/// Text representable in PDFDocEncoding stays single-byte; everything else
/// becomes UTF-16BE with a byte order mark.
///
/// ```
/// use pdf_annotator::annotations::{decode_text_string, encode_text_string};
///
/// assert_eq!(encode_text_string("made in India"), b"made in India");
/// let encoded = encode_text_string("भारत");
/// assert_eq!(&encoded[..2], &[0xFE, 0xFF]);
/// assert_eq!(decode_text_string(&encoded), "भारत");
/// ```
pub fn encode_text_string(text: &str) -> Vec<u8> {
    let single_byte: Option<Vec<u8>> = text.chars().map(pdfdoc_byte).collect();
    match single_byte {
        Some(bytes) => bytes,
        None => {
            let mut out = vec![0xFE, 0xFF];
            for unit in text.encode_utf16() {
                out.extend_from_slice(&unit.to_be_bytes());
            }
            out
        },
    }
}

/// PDFDocEncoding lookup. Codes 0x20-0x7E and 0xA1-0xFF (except 0xAD)
/// match Latin-1; the rest is either remapped or undefined.
fn pdfdoc_char(code: u8) -> Option<char> {
    let c = match code {
        b'\t' | b'\n' | b'\r' => code as char,
        0x18 => '\u{02D8}', // breve
        0x19 => '\u{02C7}', // caron
        0x1A => '\u{02C6}', // circumflex
        0x1B => '\u{02D9}', // dotaccent
        0x1C => '\u{02DD}', // hungarumlaut
        0x1D => '\u{02DB}', // ogonek
        0x1E => '\u{02DA}', // ring
        0x1F => '\u{02DC}', // tilde
        0x20..=0x7E => code as char,
        0x80 => '\u{2022}', // bullet
        0x81 => '\u{2020}', // dagger
        0x82 => '\u{2021}', // daggerdbl
        0x83 => '\u{2026}', // ellipsis
        0x84 => '\u{2014}', // emdash
        0x85 => '\u{2013}', // endash
        0x86 => '\u{0192}', // florin
        0x87 => '\u{2044}', // fraction
        0x88 => '\u{2039}', // guilsinglleft
        0x89 => '\u{203A}', // guilsinglright
        0x8A => '\u{2212}', // minus
        0x8B => '\u{2030}', // perthousand
        0x8C => '\u{201E}', // quotedblbase
        0x8D => '\u{201C}', // quotedblleft
        0x8E => '\u{201D}', // quotedblright
        0x8F => '\u{2018}', // quoteleft
        0x90 => '\u{2019}', // quoteright
        0x91 => '\u{201A}', // quotesinglbase
        0x92 => '\u{2122}', // trademark
        0x93 => '\u{FB01}', // fi
        0x94 => '\u{FB02}', // fl
        0x95 => '\u{0141}', // Lslash
        0x96 => '\u{0152}', // OE
        0x97 => '\u{0160}', // Scaron
        0x98 => '\u{0178}', // Ydieresis
        0x99 => '\u{017D}', // Zcaron
        0x9A => '\u{0131}', // dotlessi
        0x9B => '\u{0142}', // lslash
        0x9C => '\u{0153}', // oe
        0x9D => '\u{0161}', // scaron
        0x9E => '\u{017E}', // zcaron
        0xA0 => '\u{20AC}', // Euro
        0xAD => return None,
        0xA1..=0xFF => code as char,
        _ => return None,
    };
    Some(c)
}

fn pdfdoc_byte(c: char) -> Option<u8> {
    match c as u32 {
        0x09 | 0x0A | 0x0D | 0x20..=0x7E => Some(c as u8),
        0xA1..=0xFF if c as u32 != 0xAD => Some(c as u8),
        _ => (0x18..=0xA0u8).find(|&b| !(0x20..=0x7E).contains(&b) && pdfdoc_char(b) == Some(c)),
    }
}
