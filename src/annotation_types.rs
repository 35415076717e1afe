//! Annotation vocabulary shared by the annotation reader and writer.

/// Annotation subtype (`/Subtype`).
///
/// Only the subtypes this crate reasons about get their own variant;
/// everything else keeps its name in [`AnnotationSubtype::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnnotationSubtype {
    /// Point comment ("sticky note") shown as an icon
    Text,
    /// Text drawn directly on the page
    FreeText,
    /// Pop-up window attached to another annotation
    Popup,
    /// Hyperlink
    Link,
    /// Form field widget
    Widget,
    /// Any other subtype, by its PDF name
    Other(String),
}

impl AnnotationSubtype {
    /// PDF name for this subtype.
    pub fn pdf_name(&self) -> &str {
        match self {
            Self::Text => "Text",
            Self::FreeText => "FreeText",
            Self::Popup => "Popup",
            Self::Link => "Link",
            Self::Widget => "Widget",
            Self::Other(name) => name,
        }
    }

    /// Parse a subtype name, ignoring ASCII case.
    ///
    /// Producers are inconsistent about the case of `/Subtype` values, so
    /// `/text` and `/FREETEXT` are accepted.
    ///
    /// ```
    /// use pdf_annotator::annotation_types::AnnotationSubtype;
    ///
    /// assert_eq!(AnnotationSubtype::from_pdf_name("freetext"), AnnotationSubtype::FreeText);
    /// assert_eq!(
    ///     AnnotationSubtype::from_pdf_name("Highlight"),
    ///     AnnotationSubtype::Other("Highlight".to_string())
    /// );
    /// ```
    pub fn from_pdf_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "freetext" => Self::FreeText,
            "popup" => Self::Popup,
            "link" => Self::Link,
            "widget" => Self::Widget,
            _ => Self::Other(name.to_string()),
        }
    }

    /// Point comments and free-text boxes: the kinds users write notes in.
    pub fn is_comment(&self) -> bool {
        matches!(self, Self::Text | Self::FreeText)
    }
}

/// Annotation flags (`/F`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnnotationFlags(u32);

impl AnnotationFlags {
    /// Do not display an unknown annotation type without an appearance.
    pub const INVISIBLE: u32 = 1 << 0;
    /// Do not display or print.
    pub const HIDDEN: u32 = 1 << 1;
    /// Print the annotation when the page is printed.
    pub const PRINT: u32 = 1 << 2;
    /// Do not scale the icon with page zoom.
    pub const NO_ZOOM: u32 = 1 << 3;
    /// Do not rotate the icon with the page.
    pub const NO_ROTATE: u32 = 1 << 4;

    /// Create flags from the raw value.
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Only the print flag set.
    pub fn printable() -> Self {
        Self(Self::PRINT)
    }

    /// Raw value.
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Whether `flag` is set.
    pub fn contains(&self, flag: u32) -> bool {
        (self.0 & flag) != 0
    }

    /// Check if hidden.
    pub fn is_hidden(&self) -> bool {
        self.contains(Self::HIDDEN)
    }

    /// Check if printable.
    pub fn is_printable(&self) -> bool {
        self.contains(Self::PRINT)
    }
}

/// Annotation colour (`/C`), components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AnnotationColor {
    /// Transparent
    #[default]
    None,
    /// Grayscale
    Gray(f32),
    /// RGB
    Rgb(f32, f32, f32),
    /// CMYK
    Cmyk(f32, f32, f32, f32),
}

impl AnnotationColor {
    /// The pale yellow used behind caption comments.
    pub fn pale_yellow() -> Self {
        Self::Rgb(1.0, 1.0, 0.8)
    }

    /// Components as written in a `/C` array; empty means transparent.
    pub fn components(&self) -> Vec<f32> {
        match *self {
            Self::None => Vec::new(),
            Self::Gray(g) => vec![g],
            Self::Rgb(r, g, b) => vec![r, g, b],
            Self::Cmyk(c, m, y, k) => vec![c, m, y, k],
        }
    }

    /// Parse from the components of a `/C` array.
    pub fn from_components(values: &[f32]) -> Self {
        match *values {
            [g] => Self::Gray(g),
            [r, g, b] => Self::Rgb(r, g, b),
            [c, m, y, k] => Self::Cmyk(c, m, y, k),
            _ => Self::None,
        }
    }
}

/// Icon of a point comment (`/Name`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAnnotationIcon {
    /// Speech bubble
    Comment,
    /// Key
    Key,
    /// Note; what viewers show when `/Name` is absent
    #[default]
    Note,
    /// Question mark
    Help,
    /// New paragraph mark
    NewParagraph,
    /// Paragraph mark
    Paragraph,
    /// Caret
    Insert,
}

impl TextAnnotationIcon {
    /// Get PDF name.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Comment => "Comment",
            Self::Key => "Key",
            Self::Note => "Note",
            Self::Help => "Help",
            Self::NewParagraph => "NewParagraph",
            Self::Paragraph => "Paragraph",
            Self::Insert => "Insert",
        }
    }

    /// Parse from PDF name; unknown names fall back to `Note`.
    pub fn from_pdf_name(name: &str) -> Self {
        match name {
            "Comment" => Self::Comment,
            "Key" => Self::Key,
            "Help" => Self::Help,
            "NewParagraph" => Self::NewParagraph,
            "Paragraph" => Self::Paragraph,
            "Insert" => Self::Insert,
            _ => Self::Note,
        }
    }
}
