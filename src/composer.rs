//! Composing captioned image documents.
//!
//! Each image becomes one A4 page: drawn at full page width with its aspect
//! ratio kept, 40pt below the top edge. The caption is either drawn as bold
//! text centred near the top ([`CaptionMode::Inline`]) or attached as a
//! collapsed comment icon ([`CaptionMode::Annotated`]).
//!
//! ```
//! use pdf_annotator::composer::image_layout;
//! use pdf_annotator::geometry::PageSize;
//!
//! let rect = image_layout(PageSize::A4, 1000, 500).unwrap();
//! assert!((rect.width - PageSize::A4.width()).abs() < 1e-3);
//! assert!((rect.height - PageSize::A4.width() / 2.0).abs() < 1e-3);
//! ```

use crate::annotation_types::{AnnotationColor, TextAnnotationIcon};
use crate::engine::{DocumentSettings, PdfEngine};
use crate::error::{Error, Result};
use crate::geometry::{PageSize, Rect};
use crate::writer::{CaptionFont, TextAnnotation};
use chrono::{DateTime, FixedOffset};
use std::path::{Path, PathBuf};

/// Caption used when none (or a blank one) is supplied.
pub const DEFAULT_CAPTION: &str = "made in India";

/// Gap between the page top and the image's top edge.
pub const IMAGE_TOP_MARGIN: f32 = 40.0;

/// Distance of the inline caption baseline below the page top.
pub const CAPTION_BASELINE_OFFSET: f32 = 30.0;

/// Inline caption font size.
pub const CAPTION_FONT_SIZE: f32 = 12.0;

/// Width of the comment icon rectangle.
pub const NOTE_WIDTH: f32 = 40.0;

/// Vertical span of the comment icon, measured down from the page top.
pub const NOTE_SPAN: (f32, f32) = (10.0, 30.0);

/// How the caption is attached to each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionMode {
    /// Drawn into the page content
    Inline,
    /// Stored as a collapsed point comment
    #[default]
    Annotated,
}

impl std::fmt::Display for CaptionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptionMode::Inline => write!(f, "inline"),
            CaptionMode::Annotated => write!(f, "annotated"),
        }
    }
}

/// Options for one composition run.
#[derive(Debug, Clone)]
pub struct ComposeOptions {
    /// Caption shared by every page
    pub caption: String,
    /// Caption used when `caption` is blank
    pub default_caption: String,
    /// Caption mode
    pub mode: CaptionMode,
    /// Font for inline captions
    pub font: CaptionFont,
    /// Author stored on caption comments
    pub author: Option<String>,
    /// Timestamp of the document and its comments
    pub created: DateTime<FixedOffset>,
    /// Whether page content streams are Flate-compressed
    pub compress: bool,
    /// Size of every page
    pub page_size: PageSize,
}

impl ComposeOptions {
    /// Annotated A4 pages with `caption`, stamped now.
    pub fn new(caption: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
            default_caption: DEFAULT_CAPTION.to_string(),
            mode: CaptionMode::default(),
            font: CaptionFont::default(),
            author: None,
            created: chrono::Local::now().fixed_offset(),
            compress: true,
            page_size: PageSize::A4,
        }
    }

    /// Set the caption mode.
    pub fn with_mode(mut self, mode: CaptionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the fallback caption.
    pub fn with_default_caption(mut self, caption: impl Into<String>) -> Self {
        self.default_caption = caption.into();
        self
    }

    /// Set the inline caption font.
    pub fn with_font(mut self, font: CaptionFont) -> Self {
        self.font = font;
        self
    }

    /// Set the comment author.
    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }

    /// Set the timestamp.
    pub fn with_created(mut self, created: DateTime<FixedOffset>) -> Self {
        self.created = created;
        self
    }

    /// Enable or disable content stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    /// The caption actually placed on the pages.
    pub fn effective_caption(&self) -> String {
        resolve_caption(Some(&self.caption), &self.default_caption)
    }
}

/// Where an image's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A file on disk
    Path(PathBuf),
    /// Bytes already in memory
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Read the whole source.
    pub fn read(&self) -> Result<Vec<u8>> {
        match self {
            ImageSource::Path(path) => Ok(std::fs::read(path)?),
            ImageSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }

    /// Short description for log lines.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

/// Summary of a finished composition.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeReport {
    /// Pages produced, one per image
    pub pages: usize,
    /// Caption placed on every page
    pub caption: String,
    /// Caption mode used
    pub mode: CaptionMode,
    /// Saved document, for [`compose_to_file`]
    pub output: Option<PathBuf>,
}

/// `caption` trimmed for blankness, or `default` when absent or blank.
///
/// A non-blank caption is returned unchanged, surrounding spaces included.
pub fn resolve_caption(caption: Option<&str>, default: &str) -> String {
    match caption {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => default.to_string(),
    }
}

/// Rectangle an image of `width`×`height` pixels occupies on a page.
pub fn image_layout(page: PageSize, width: u32, height: u32) -> Result<Rect> {
    if width == 0 || height == 0 {
        return Err(Error::Decode(format!("image has no area ({}x{})", width, height)));
    }
    let (page_width, page_height) = page.dimensions();
    let scale = page_width / width as f32;
    let rendered_height = height as f32 * scale;
    Ok(Rect::new(0.0, page_height - rendered_height - IMAGE_TOP_MARGIN, page_width, rendered_height))
}

/// Baseline origin of a centred inline caption.
pub fn caption_position(page: PageSize, font: CaptionFont, caption: &str) -> Result<(f32, f32)> {
    let (page_width, page_height) = page.dimensions();
    let text_width = font.text_width(caption, CAPTION_FONT_SIZE)?;
    Ok(((page_width - text_width) / 2.0, page_height - CAPTION_BASELINE_OFFSET))
}

/// Rectangle of the caption comment icon, centred at the top edge.
pub fn note_rect(page: PageSize) -> Rect {
    let (page_width, page_height) = page.dimensions();
    let center = page_width / 2.0;
    Rect::from_points(
        center - NOTE_WIDTH / 2.0,
        page_height - NOTE_SPAN.1,
        center + NOTE_WIDTH / 2.0,
        page_height - NOTE_SPAN.0,
    )
}

/// The caption comment placed on annotated pages.
pub fn caption_note(page: PageSize, caption: &str, options: &ComposeOptions) -> TextAnnotation {
    let note = TextAnnotation::new(note_rect(page), caption)
        .with_icon(TextAnnotationIcon::Comment)
        .with_open(false)
        .with_color(AnnotationColor::pale_yellow())
        .with_timestamp(options.created);
    match &options.author {
        Some(author) => note.with_author(author.clone()),
        None => note,
    }
}

/// Build one page per image into a fresh document on `engine`.
///
/// Nothing is saved; see [`compose_to_file`]. Any unreadable image aborts
/// the whole run.
pub fn compose<E: PdfEngine + ?Sized>(
    engine: &mut E,
    images: &[ImageSource],
    options: &ComposeOptions,
) -> Result<ComposeReport> {
    if images.is_empty() {
        return Err(Error::NoImages);
    }

    let caption = options.effective_caption();
    let page_size = options.page_size;

    // Checked before the first page so unencodable captions add nothing.
    let inline_origin = match options.mode {
        CaptionMode::Inline => Some(caption_position(page_size, options.font, &caption)?),
        CaptionMode::Annotated => None,
    };

    engine.new_document(&DocumentSettings {
        created: options.created,
        compress: options.compress,
    })?;

    for (index, source) in images.iter().enumerate() {
        let data = source.read()?;
        let page = engine.add_page(page_size)?;
        let image = engine.embed_image(&data)?;
        let rect = image_layout(page_size, image.width, image.height)?;
        log::debug!(
            "Page {}: {} ({}x{}) drawn at {:?}",
            index + 1,
            source.describe(),
            image.width,
            image.height,
            rect
        );
        engine.draw_image(page, &image, rect)?;

        match inline_origin {
            Some((x, y)) => engine.draw_text(page, &caption, x, y, options.font, CAPTION_FONT_SIZE)?,
            None => engine.add_annotation(page, &caption_note(page_size, &caption, options))?,
        }
    }

    Ok(ComposeReport {
        pages: images.len(),
        caption,
        mode: options.mode,
        output: None,
    })
}

/// [`compose`] then save to `path`.
pub fn compose_to_file<E: PdfEngine + ?Sized>(
    engine: &mut E,
    images: &[ImageSource],
    options: &ComposeOptions,
    path: &Path,
) -> Result<ComposeReport> {
    let mut report = compose(engine, images, options)?;
    engine.save(path)?;
    log::info!(
        "Composed {} page(s) with {} caption into {}",
        report.pages,
        report.mode,
        path.display()
    );
    report.output = Some(path.to_path_buf());
    Ok(report)
}
