//! Base-14 bold fonts used for inline captions.
//!
//! Captions are shown with a standard Type1 font, so nothing is embedded:
//! the viewer supplies the glyphs and this module supplies the advance
//! widths (from the Adobe AFM files) needed to centre the text. Text is
//! encoded with WinAnsiEncoding.

use crate::error::{Error, Result};

/// Bold standard fonts available for captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum CaptionFont {
    /// Times-Bold (bold serif)
    #[default]
    TimesBold,
    /// Helvetica-Bold (bold sans)
    HelveticaBold,
}

/// Advance widths for WinAnsi codes 32..=126, in 1/1000 em.
const TIMES_BOLD_ASCII: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278, // space - /
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, // 0 - 9
    333, 333, 570, 570, 570, 500, 930, // : - @
    722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, // A - M
    722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, // N - Z
    333, 278, 333, 581, 500, 333, // [ - `
    500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, // a - m
    556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, // n - z
    394, 220, 394, 520, // { - ~
];

const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // space - /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0 - 9
    333, 333, 584, 584, 584, 611, 975, // : - @
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A - M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N - Z
    333, 278, 333, 584, 556, 333, // [ - `
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a - m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n - z
    389, 280, 389, 584, // { - ~
];

impl CaptionFont {
    /// PostScript name used as `/BaseFont`.
    pub fn base_font(&self) -> &'static str {
        match self {
            Self::TimesBold => "Times-Bold",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Name of the font in a page's `/Resources /Font` dictionary.
    pub fn resource_name(&self) -> &'static str {
        match self {
            Self::TimesBold => "TimesBold",
            Self::HelveticaBold => "HelveticaBold",
        }
    }

    fn ascii_widths(&self) -> &'static [u16; 95] {
        match self {
            Self::TimesBold => &TIMES_BOLD_ASCII,
            Self::HelveticaBold => &HELVETICA_BOLD_ASCII,
        }
    }

    /// Advance width of `ch` in 1/1000 em, or `None` when WinAnsi cannot encode it.
    pub fn char_width(&self, ch: char) -> Option<u16> {
        let code = winansi_code(ch)?;
        if (32..=126).contains(&code) {
            return Some(self.ascii_widths()[(code - 32) as usize]);
        }
        if let Some(width) = self.symbol_width(ch) {
            return Some(width);
        }
        // Accented letters share the advance of their base letter.
        match base_letter(ch) {
            Some(base) => self.char_width(base),
            None => Some(self.ascii_widths()[0]),
        }
    }

    fn symbol_width(&self, ch: char) -> Option<u16> {
        let times = matches!(self, Self::TimesBold);
        let width = match ch {
            '\u{A0}' => return Some(self.ascii_widths()[0]),
            '\u{AD}' => 333,
            '\u{20AC}' => if times { 500 } else { 556 },
            '\u{2013}' => if times { 500 } else { 556 },
            '\u{2014}' | '\u{2026}' | '\u{2030}' => 1000,
            '\u{2018}' | '\u{2019}' | '\u{201A}' => if times { 333 } else { 278 },
            '\u{201C}' | '\u{201D}' | '\u{201E}' => 500,
            '\u{2022}' => 350,
            '\u{2122}' => 1000,
            '\u{00A9}' | '\u{00AE}' => if times { 747 } else { 737 },
            '\u{00B0}' => 400,
            '\u{00D7}' | '\u{00F7}' | '\u{00B1}' => if times { 570 } else { 584 },
            '\u{00C6}' | '\u{0152}' => 1000,
            '\u{00E6}' | '\u{0153}' => if times { 722 } else { 889 },
            '\u{00DF}' => if times { 556 } else { 611 },
            _ => return None,
        };
        Some(width)
    }

    /// Encode `text` in WinAnsiEncoding.
    ///
    /// # Errors
    ///
    /// [`Error::Font`] naming the first character the encoding cannot represent.
    ///
    /// ```
    /// use pdf_annotator::writer::CaptionFont;
    ///
    /// assert_eq!(CaptionFont::TimesBold.encode("caf\u{e9}").unwrap(), b"caf\xe9");
    /// assert!(CaptionFont::TimesBold.encode("\u{92D}\u{93E}\u{930}\u{924}").is_err());
    /// ```
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        text.chars()
            .map(|ch| {
                winansi_code(ch).ok_or_else(|| {
                    Error::Font(format!("{} cannot show character {:?} (U+{:04X})", self.base_font(), ch, ch as u32))
                })
            })
            .collect()
    }

    /// Width of `text` at `size` points: `Σ width / 1000 × size`.
    pub fn text_width(&self, text: &str, size: f32) -> Result<f32> {
        let mut total = 0u32;
        for ch in text.chars() {
            let width = self.char_width(ch).ok_or_else(|| {
                Error::Font(format!("{} cannot show character {:?}", self.base_font(), ch))
            })?;
            total += u32::from(width);
        }
        Ok(total as f32 / 1000.0 * size)
    }
}

/// WinAnsiEncoding code of `ch`. Control characters are not encodable.
fn winansi_code(ch: char) -> Option<u8> {
    let code = match ch {
        ' '..='~' => ch as u8,
        '\u{A0}'..='\u{FF}' => ch as u8,
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(code)
}

fn base_letter(ch: char) -> Option<char> {
    let base = match ch {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ð' => 'D',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' | 'Ÿ' => 'Y',
        'Þ' => 'P',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ð' | 'ò'..='ö' | 'ø' => 'o',
        'ñ' => 'n',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'þ' => 'p',
        'Š' => 'S',
        'š' => 's',
        'Ž' => 'Z',
        'ž' => 'z',
        _ => return None,
    };
    Some(base)
}
