//! Text annotations (sticky notes) for PDF generation.
//!
//! A text annotation shows an icon at a point on the page; opening it shows
//! a pop-up with the note's contents. Caption comments are text annotations
//! that start collapsed.
//!
//! ```
//! use pdf_annotator::annotation_types::TextAnnotationIcon;
//! use pdf_annotator::geometry::Rect;
//! use pdf_annotator::writer::TextAnnotation;
//!
//! let note = TextAnnotation::new(Rect::new(277.0, 811.0, 40.0, 20.0), "made in India")
//!     .with_icon(TextAnnotationIcon::Comment)
//!     .with_author("Asha");
//! assert!(!note.open);
//! ```

use crate::annotation_types::{AnnotationColor, AnnotationFlags, TextAnnotationIcon};
use crate::annotations::encode_text_string;
use crate::date::format_pdf_date;
use crate::geometry::Rect;
use crate::object::{Dict, Object};
use chrono::{DateTime, FixedOffset};

/// A text annotation (sticky note).
#[derive(Debug, Clone)]
pub struct TextAnnotation {
    /// Icon rectangle
    pub rect: Rect,
    /// Text shown in the pop-up
    pub contents: String,
    /// Icon shown while collapsed
    pub icon: TextAnnotationIcon,
    /// Whether the pop-up starts open
    pub open: bool,
    /// Icon and pop-up colour
    pub color: AnnotationColor,
    /// Author (`/T`)
    pub author: Option<String>,
    /// Annotation flags
    pub flags: AnnotationFlags,
    /// Creation time
    pub created: Option<DateTime<FixedOffset>>,
    /// Last modification time
    pub modified: Option<DateTime<FixedOffset>>,
}

impl TextAnnotation {
    /// A collapsed, printable note with the default icon and no colour.
    pub fn new(rect: Rect, contents: impl Into<String>) -> Self {
        Self {
            rect,
            contents: contents.into(),
            icon: TextAnnotationIcon::Note,
            open: false,
            color: AnnotationColor::None,
            author: None,
            flags: AnnotationFlags::printable(),
            created: None,
            modified: None,
        }
    }

    /// Set the icon.
    pub fn with_icon(mut self, icon: TextAnnotationIcon) -> Self {
        self.icon = icon;
        self
    }

    /// Set whether the pop-up starts open.
    pub fn with_open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    /// Set the colour.
    pub fn with_color(mut self, color: AnnotationColor) -> Self {
        self.color = color;
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Stamp both creation and modification time.
    pub fn with_timestamp(mut self, time: DateTime<FixedOffset>) -> Self {
        self.created = Some(time);
        self.modified = Some(time);
        self
    }

    /// Build the annotation dictionary. `/P` is left to the page writer.
    pub fn build(&self) -> Dict {
        let mut dict = Dict::new();

        dict.insert("Type".to_string(), Object::Name("Annot".to_string()));
        dict.insert("Subtype".to_string(), Object::Name("Text".to_string()));
        dict.insert(
            "Rect".to_string(),
            Object::Array(self.rect.to_pdf_array().iter().map(|&v| Object::Real(v as f64)).collect()),
        );
        dict.insert("Contents".to_string(), Object::String(encode_text_string(&self.contents)));
        dict.insert("Name".to_string(), Object::Name(self.icon.pdf_name().to_string()));
        dict.insert("Open".to_string(), Object::Boolean(self.open));

        if self.flags.bits() != 0 {
            dict.insert("F".to_string(), Object::Integer(self.flags.bits() as i64));
        }

        let components = self.color.components();
        if !components.is_empty() {
            dict.insert(
                "C".to_string(),
                Object::Array(components.into_iter().map(|v| Object::Real(v as f64)).collect()),
            );
        }

        if let Some(author) = &self.author {
            dict.insert("T".to_string(), Object::String(encode_text_string(author)));
        }
        if let Some(created) = &self.created {
            dict.insert("CreationDate".to_string(), Object::String(format_pdf_date(created).into_bytes()));
        }
        if let Some(modified) = &self.modified {
            dict.insert("M".to_string(), Object::String(format_pdf_date(modified).into_bytes()));
        }

        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults() {
        let note = TextAnnotation::new(Rect::new(72.0, 720.0, 24.0, 24.0), "Test note");
        let dict = note.build();

        assert_eq!(dict.get("Subtype"), Some(&Object::Name("Text".to_string())));
        assert_eq!(dict.get("Name"), Some(&Object::Name("Note".to_string())));
        assert_eq!(dict.get("Open"), Some(&Object::Boolean(false)));
        assert_eq!(dict.get("F"), Some(&Object::Integer(4)));
        assert!(!dict.contains_key("C"));
        assert!(!dict.contains_key("T"));
        assert!(!dict.contains_key("M"));
    }

    #[test]
    fn test_caption_comment() {
        let time = FixedOffset::east_opt(19800).unwrap().with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let note = TextAnnotation::new(Rect::from_points(277.6, 811.9, 317.6, 831.9), "made in India")
            .with_icon(TextAnnotationIcon::Comment)
            .with_color(AnnotationColor::pale_yellow())
            .with_author("Asha")
            .with_timestamp(time);
        let dict = note.build();

        assert_eq!(dict.get("Contents"), Some(&Object::String(b"made in India".to_vec())));
        assert_eq!(dict.get("Name"), Some(&Object::Name("Comment".to_string())));
        assert_eq!(dict.get("T"), Some(&Object::String(b"Asha".to_vec())));
        assert_eq!(dict.get("M"), Some(&Object::String(b"D:20240102030405+05'30'".to_vec())));
        assert_eq!(dict.get("M"), dict.get("CreationDate"));

        let color = dict["C"].as_array().unwrap();
        assert_eq!(color.len(), 3);
        assert!((color[2].as_number().unwrap() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_unicode_contents_use_utf16() {
        let dict = TextAnnotation::new(Rect::new(0.0, 0.0, 1.0, 1.0), "\u{092D}\u{093E}\u{0930}\u{0924}").build();
        let Some(Object::String(bytes)) = dict.get("Contents") else {
            panic!("contents missing");
        };
        assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
    }
}
