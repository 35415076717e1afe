//! The narrow PDF engine interface composition and extraction run against.
//!
//! [`PdfEngine`] is the whole surface the composer and extractor need from a
//! PDF library. [`NativeEngine`] implements it with this crate's writer and
//! reader; tests substitute recording fakes.

use crate::annotations::Annotation;
use crate::document::{Page, PdfDocument};
use crate::error::{Error, Result};
use crate::geometry::{PageSize, Rect};
use crate::writer::{CaptionFont, ImageData, ImageHandle, PdfWriter, PdfWriterConfig, TextAnnotation};
use chrono::{DateTime, FixedOffset};
use std::path::Path;

/// Index of a page in the document being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId(pub usize);

/// An image embedded in the document being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedImage {
    /// Engine-specific identifier
    pub id: usize,
    /// Native width in pixels
    pub width: u32,
    /// Native height in pixels
    pub height: u32,
}

/// Document-wide settings for a new document.
#[derive(Debug, Clone)]
pub struct DocumentSettings {
    /// Creation time recorded in the document
    pub created: DateTime<FixedOffset>,
    /// Whether streams may be compressed
    pub compress: bool,
}

/// Operations a PDF back end provides.
///
/// The build half (`new_document` .. `save`) works on one document at a
/// time; `save` releases it. The read half works on the last document
/// passed to `load`.
pub trait PdfEngine {
    /// Start a new, empty document, discarding any unsaved one.
    fn new_document(&mut self, settings: &DocumentSettings) -> Result<()>;

    /// Append a page.
    fn add_page(&mut self, size: PageSize) -> Result<PageId>;

    /// Decode and embed an image, reporting its native size.
    fn embed_image(&mut self, data: &[u8]) -> Result<EmbeddedImage>;

    /// Draw an embedded image into `rect`.
    fn draw_image(&mut self, page: PageId, image: &EmbeddedImage, rect: Rect) -> Result<()>;

    /// Draw text with its baseline starting at (`x`, `y`).
    fn draw_text(&mut self, page: PageId, text: &str, x: f32, y: f32, font: CaptionFont, size: f32) -> Result<()>;

    /// Attach a point-comment annotation.
    fn add_annotation(&mut self, page: PageId, annotation: &TextAnnotation) -> Result<()>;

    /// Serialize the document to `path` and release it.
    fn save(&mut self, path: &Path) -> Result<()>;

    /// Open an existing document for reading.
    fn load(&mut self, path: &Path) -> Result<()>;

    /// Number of pages of the loaded document.
    fn pages_of(&mut self) -> Result<usize>;

    /// Annotations of the loaded document's page at zero-based `index`, in stored order.
    fn annotations_of(&mut self, index: usize) -> Result<Vec<Annotation>>;
}

/// [`PdfEngine`] backed by [`PdfWriter`] and [`PdfDocument`].
#[derive(Default)]
pub struct NativeEngine {
    writer: Option<PdfWriter>,
    images: Vec<ImageHandle>,
    loaded: Option<(PdfDocument, Vec<Page>)>,
}

impl NativeEngine {
    /// Create an engine with nothing open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from an already-open document.
    pub fn from_document(mut document: PdfDocument) -> Result<Self> {
        let pages = document.pages()?;
        Ok(Self {
            loaded: Some((document, pages)),
            ..Self::default()
        })
    }

    fn writer(&mut self) -> Result<&mut PdfWriter> {
        self.writer
            .as_mut()
            .ok_or_else(|| Error::InvalidPdf("no document is being built".to_string()))
    }

    fn image(&self, image: &EmbeddedImage) -> Result<ImageHandle> {
        self.images
            .get(image.id)
            .cloned()
            .ok_or_else(|| Error::InvalidPdf(format!("unknown image {}", image.id)))
    }

    fn loaded(&mut self) -> Result<&mut (PdfDocument, Vec<Page>)> {
        self.loaded
            .as_mut()
            .ok_or_else(|| Error::InvalidPdf("no document is loaded".to_string()))
    }
}

impl std::fmt::Debug for NativeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeEngine")
            .field("building", &self.writer.as_ref().map(PdfWriter::page_count))
            .field("images", &self.images.len())
            .field("loaded", &self.loaded.as_ref().map(|(_, pages)| pages.len()))
            .finish()
    }
}

impl PdfEngine for NativeEngine {
    fn new_document(&mut self, settings: &DocumentSettings) -> Result<()> {
        let config = PdfWriterConfig::default()
            .with_creation_date(settings.created)
            .with_compress(settings.compress);
        self.writer = Some(PdfWriter::with_config(config));
        self.images.clear();
        Ok(())
    }

    fn add_page(&mut self, size: PageSize) -> Result<PageId> {
        let (width, height) = size.dimensions();
        let page = self.writer()?.add_page(width, height);
        Ok(PageId(page.index()))
    }

    fn embed_image(&mut self, data: &[u8]) -> Result<EmbeddedImage> {
        let image = ImageData::from_bytes(data)?;
        let handle = self.writer()?.embed_image(&image);
        let embedded = EmbeddedImage {
            id: self.images.len(),
            width: handle.width,
            height: handle.height,
        };
        self.images.push(handle);
        Ok(embedded)
    }

    fn draw_image(&mut self, page: PageId, image: &EmbeddedImage, rect: Rect) -> Result<()> {
        let handle = self.image(image)?;
        self.writer()?
            .page(page.0)?
            .draw_image(&handle, rect.x, rect.y, rect.width, rect.height);
        Ok(())
    }

    fn draw_text(&mut self, page: PageId, text: &str, x: f32, y: f32, font: CaptionFont, size: f32) -> Result<()> {
        self.writer()?.page(page.0)?.add_text(text, x, y, font, size)?;
        Ok(())
    }

    fn add_annotation(&mut self, page: PageId, annotation: &TextAnnotation) -> Result<()> {
        self.writer()?.page(page.0)?.add_annotation(annotation);
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| Error::InvalidPdf("no document is being built".to_string()))?;
        self.images.clear();
        writer.save(path)
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        self.loaded = None;
        let mut document = PdfDocument::open(path)?;
        let pages = document.pages()?;
        self.loaded = Some((document, pages));
        Ok(())
    }

    fn pages_of(&mut self) -> Result<usize> {
        Ok(self.loaded()?.1.len())
    }

    fn annotations_of(&mut self, index: usize) -> Result<Vec<Annotation>> {
        let (document, pages) = self.loaded()?;
        let page = pages
            .get(index)
            .ok_or_else(|| Error::InvalidPdf(format!("page {} out of range ({} pages)", index, pages.len())))?;
        document.annotations_of_page(page)
    }
}
