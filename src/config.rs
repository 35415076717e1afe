//! Configuration for composing and reading annotated documents.

use crate::composer::{CaptionMode, DEFAULT_CAPTION};
use crate::error::{Error, Result};
use crate::writer::CaptionFont;
use std::path::{Path, PathBuf};

/// How an incoming document is recognised as a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfDetection {
    /// The path or URI ends with `.pdf` (any case)
    Extension,
    /// The declared type is `application/pdf`
    MimeType,
    /// Either of the above
    #[default]
    ExtensionOrMime,
    /// Both of the above
    ExtensionAndMime,
}

impl PdfDetection {
    /// Whether `location` with the declared `mime` type counts as a PDF.
    ///
    /// ```
    /// use pdf_annotator::config::PdfDetection;
    ///
    /// assert!(PdfDetection::Extension.accepts("content://docs/Report.PDF", None));
    /// assert!(!PdfDetection::MimeType.accepts("report.pdf", Some("text/plain")));
    /// assert!(PdfDetection::ExtensionOrMime.accepts("blob", Some("application/pdf")));
    /// ```
    pub fn accepts(&self, location: &str, mime: Option<&str>) -> bool {
        let by_extension = has_pdf_extension(location);
        let by_mime = mime.map(is_pdf_mime).unwrap_or(false);
        match self {
            PdfDetection::Extension => by_extension,
            PdfDetection::MimeType => by_mime,
            PdfDetection::ExtensionOrMime => by_extension || by_mime,
            PdfDetection::ExtensionAndMime => by_extension && by_mime,
        }
    }
}

/// Filesystem path of an incoming document location.
///
/// `file://` URIs are percent-decoded. Query strings and fragments are not
/// part of the path. Other URI schemes have no local path.
///
/// ```
/// use pdf_annotator::config::incoming_path;
/// use std::path::Path;
///
/// assert_eq!(incoming_path("/tmp/a.pdf#page=2").unwrap(), Path::new("/tmp/a.pdf"));
/// assert_eq!(incoming_path("file:///tmp/My%20Notes.pdf").unwrap(), Path::new("/tmp/My Notes.pdf"));
/// assert!(incoming_path("content://media/42").is_err());
/// ```
pub fn incoming_path(location: &str) -> Result<PathBuf> {
    let unsupported = || Error::UnsupportedLocation(location.to_string());
    match url::Url::parse(location) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().map_err(|_| unsupported()),
        // One-letter schemes are drive letters.
        Ok(url) if url.scheme().len() > 1 => Err(unsupported()),
        _ => Ok(PathBuf::from(without_query(location))),
    }
}

fn without_query(location: &str) -> &str {
    location.split(['?', '#']).next().unwrap_or(location)
}

fn has_pdf_extension(location: &str) -> bool {
    without_query(location).to_ascii_lowercase().ends_with(".pdf")
}

fn is_pdf_mime(mime: &str) -> bool {
    let essence = mime.split(';').next().unwrap_or(mime).trim();
    essence.eq_ignore_ascii_case("application/pdf")
}

/// Annotator configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Private storage root; holds `Pictures/` and `pdfs/`.
    pub storage_root: PathBuf,

    /// Caption used when the request has none.
    pub default_caption: String,

    /// Number of images a compose request must provide.
    pub required_images: usize,

    /// Caption mode when the request does not choose one.
    pub mode: CaptionMode,

    /// Font of inline captions.
    pub caption_font: CaptionFont,

    /// Author stored on caption comments.
    pub annotation_author: Option<String>,

    /// Flate-compress page content streams. Images are always stored
    /// compressed (Flate, or the JPEG data as is).
    pub compress: bool,

    /// Predicate for incoming documents.
    pub pdf_detection: PdfDetection,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotatorConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            storage_root: default_storage_root(),
            default_caption: DEFAULT_CAPTION.to_string(),
            required_images: 5,
            mode: CaptionMode::Annotated,
            caption_font: CaptionFont::TimesBold,
            annotation_author: None,
            compress: true,
            pdf_detection: PdfDetection::ExtensionOrMime,
        }
    }

    /// Set the storage root.
    pub fn with_storage_root(mut self, root: impl AsRef<Path>) -> Self {
        self.storage_root = root.as_ref().to_path_buf();
        self
    }

    /// Set the default caption.
    pub fn with_default_caption(mut self, caption: impl Into<String>) -> Self {
        self.default_caption = caption.into();
        self
    }

    /// Set the required image count.
    pub fn with_required_images(mut self, count: usize) -> Self {
        self.required_images = count;
        self
    }

    /// Set the default caption mode.
    pub fn with_mode(mut self, mode: CaptionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the inline caption font.
    pub fn with_caption_font(mut self, font: CaptionFont) -> Self {
        self.caption_font = font;
        self
    }

    /// Set the comment author.
    pub fn with_annotation_author(mut self, author: impl Into<String>) -> Self {
        self.annotation_author = Some(author.into());
        self
    }

    /// Enable or disable content stream compression.
    pub fn with_compress(mut self, enable: bool) -> Self {
        self.compress = enable;
        self
    }

    /// Set the PDF detection predicate.
    pub fn with_pdf_detection(mut self, detection: PdfDetection) -> Self {
        self.pdf_detection = detection;
        self
    }
}

fn default_storage_root() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(crate::NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnnotatorConfig::default();
        assert_eq!(config.default_caption, "made in India");
        assert_eq!(config.required_images, 5);
        assert_eq!(config.mode, CaptionMode::Annotated);
        assert_eq!(config.caption_font, CaptionFont::TimesBold);
        assert!(config.annotation_author.is_none());
        assert!(config.compress);
        assert_eq!(config.pdf_detection, PdfDetection::ExtensionOrMime);
        assert!(config.storage_root.ends_with("pdf_annotator") || config.storage_root == Path::new("."));
    }

    #[test]
    fn test_builders() {
        let config = AnnotatorConfig::new()
            .with_storage_root("/tmp/store")
            .with_default_caption("hello")
            .with_required_images(2)
            .with_mode(CaptionMode::Inline)
            .with_caption_font(CaptionFont::HelveticaBold)
            .with_annotation_author("Asha")
            .with_compress(false)
            .with_pdf_detection(PdfDetection::MimeType);
        assert_eq!(config.storage_root, PathBuf::from("/tmp/store"));
        assert_eq!(config.default_caption, "hello");
        assert_eq!(config.required_images, 2);
        assert_eq!(config.mode, CaptionMode::Inline);
        assert_eq!(config.caption_font, CaptionFont::HelveticaBold);
        assert_eq!(config.annotation_author.as_deref(), Some("Asha"));
        assert!(!config.compress);
        assert_eq!(config.pdf_detection, PdfDetection::MimeType);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnnotatorConfig =
            serde_json::from_str(r#"{"required_images": 3, "mode": "inline", "pdf_detection": "extension"}"#).unwrap();
        assert_eq!(config.required_images, 3);
        assert_eq!(config.mode, CaptionMode::Inline);
        assert_eq!(config.pdf_detection, PdfDetection::Extension);
        assert_eq!(config.default_caption, "made in India");
    }

    #[test]
    fn test_json_round_trip() {
        let config = AnnotatorConfig::new().with_annotation_author("A");
        let json = serde_json::to_string(&config).unwrap();
        let back: AnnotatorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_incoming_paths() {
        assert_eq!(incoming_path("notes.pdf").unwrap(), PathBuf::from("notes.pdf"));
        assert_eq!(incoming_path("/tmp/a.pdf?download=1").unwrap(), PathBuf::from("/tmp/a.pdf"));
        assert_eq!(incoming_path("file:///tmp/a.pdf#page=2").unwrap(), PathBuf::from("/tmp/a.pdf"));
        assert_eq!(incoming_path(r"C:\docs\a.pdf").unwrap(), PathBuf::from(r"C:\docs\a.pdf"));

        for remote in ["content://docs/Report.PDF", "https://example.com/a.pdf", "file://server/share/a.pdf"] {
            assert!(matches!(incoming_path(remote), Err(Error::UnsupportedLocation(_))), "{}", remote);
        }
    }

    #[test]
    fn test_detection_predicates() {
        let cases = [
            ("scan.pdf", None, [true, false, true, false]),
            ("scan.PDF?x=1", Some("application/pdf"), [true, true, true, true]),
            ("content://media/42", Some("application/pdf; charset=binary"), [false, true, true, false]),
            ("notes.txt", Some("text/plain"), [false, false, false, false]),
            ("pdf", None, [false, false, false, false]),
        ];
        let modes = [
            PdfDetection::Extension,
            PdfDetection::MimeType,
            PdfDetection::ExtensionOrMime,
            PdfDetection::ExtensionAndMime,
        ];
        for (location, mime, expected) in cases {
            for (mode, want) in modes.iter().zip(expected) {
                assert_eq!(mode.accepts(location, mime), want, "{:?} {} {:?}", mode, location, mime);
            }
        }
    }
}
