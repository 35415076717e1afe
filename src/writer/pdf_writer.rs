//! PDF document writer.
//!
//! Assembles complete documents: header, body, classic xref table and
//! trailer. Images and fonts become objects as soon as they are registered;
//! pages, their content streams and annotations get object numbers when the
//! document is finished.

use super::content_stream::ContentStreamBuilder;
use super::font_metrics::CaptionFont;
use super::image_handler::ImageData;
use super::object_serializer::ObjectSerializer;
use super::text_annotations::TextAnnotation;
use crate::date::format_pdf_date;
use crate::error::{Error, Result};
use crate::object::{Dict, Object, ObjectRef};
use chrono::{DateTime, FixedOffset};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Configuration for PDF generation.
#[derive(Debug, Clone)]
pub struct PdfWriterConfig {
    /// PDF version written in the header (e.g., "1.7")
    pub version: String,
    /// Producer recorded in the Info dictionary
    pub producer: Option<String>,
    /// Creation time recorded in the Info dictionary
    pub creation_date: Option<DateTime<FixedOffset>>,
    /// Whether to Flate-compress content streams
    pub compress: bool,
}

impl Default for PdfWriterConfig {
    fn default() -> Self {
        Self {
            version: "1.7".to_string(),
            producer: Some(format!("{} {}", crate::NAME, crate::VERSION)),
            creation_date: None,
            compress: true,
        }
    }
}

impl PdfWriterConfig {
    /// Set the creation time.
    pub fn with_creation_date(mut self, time: DateTime<FixedOffset>) -> Self {
        self.creation_date = Some(time);
        self
    }

    /// Enable or disable content stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

/// An image registered with a writer, ready to be drawn on any page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    /// Name under `/Resources /XObject`
    pub resource_name: String,
    /// Image XObject
    pub object_ref: ObjectRef,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// A page being built.
pub struct PageBuilder<'a> {
    writer: &'a mut PdfWriter,
    page_index: usize,
}

impl<'a> PageBuilder<'a> {
    /// Zero-based index of this page.
    pub fn index(&self) -> usize {
        self.page_index
    }

    /// Draw `image` into the rectangle at (`x`, `y`) with the given size.
    pub fn draw_image(&mut self, image: &ImageHandle, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        let page = &mut self.writer.pages[self.page_index];
        page.images.insert(image.resource_name.clone(), image.object_ref);
        page.content.draw_image(&image.resource_name, x, y, width, height);
        self
    }

    /// Show `text` with its baseline starting at (`x`, `y`).
    ///
    /// # Errors
    ///
    /// [`Error::Font`] when `font` cannot encode the text; the page is left
    /// unchanged.
    pub fn add_text(&mut self, text: &str, x: f32, y: f32, font: CaptionFont, size: f32) -> Result<&mut Self> {
        let encoded = font.encode(text)?;
        let font_ref = self.writer.font_ref(font);
        let page = &mut self.writer.pages[self.page_index];
        page.fonts.insert(font.resource_name().to_string(), font_ref);
        page.content.text(font.resource_name(), size, &encoded, x, y);
        Ok(self)
    }

    /// Attach a text annotation.
    pub fn add_annotation(&mut self, annotation: &TextAnnotation) -> &mut Self {
        self.writer.pages[self.page_index].annotations.push(annotation.build());
        self
    }

    /// Finish building this page and return to the writer.
    pub fn finish(self) -> &'a mut PdfWriter {
        self.writer
    }
}

struct PageData {
    width: f32,
    height: f32,
    content: ContentStreamBuilder,
    images: BTreeMap<String, ObjectRef>,
    fonts: BTreeMap<String, ObjectRef>,
    annotations: Vec<Dict>,
}

/// PDF document writer.
pub struct PdfWriter {
    config: PdfWriterConfig,
    pages: Vec<PageData>,
    next_obj_id: u32,
    objects: BTreeMap<u32, Object>,
    fonts: HashMap<CaptionFont, ObjectRef>,
    image_count: usize,
}

impl PdfWriter {
    /// Create a new PDF writer with default config.
    pub fn new() -> Self {
        Self::with_config(PdfWriterConfig::default())
    }

    /// Create a PDF writer with custom config.
    pub fn with_config(config: PdfWriterConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            next_obj_id: 1,
            objects: BTreeMap::new(),
            fonts: HashMap::new(),
            image_count: 0,
        }
    }

    fn alloc_obj_id(&mut self) -> ObjectRef {
        let id = self.next_obj_id;
        self.next_obj_id += 1;
        ObjectRef::new(id, 0)
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Add an empty page of `width` × `height` points.
    pub fn add_page(&mut self, width: f32, height: f32) -> PageBuilder<'_> {
        let page_index = self.pages.len();
        self.pages.push(PageData {
            width,
            height,
            content: ContentStreamBuilder::new(),
            images: BTreeMap::new(),
            fonts: BTreeMap::new(),
            annotations: Vec::new(),
        });
        PageBuilder {
            writer: self,
            page_index,
        }
    }

    /// Reopen the page at `index` for more content.
    pub fn page(&mut self, index: usize) -> Result<PageBuilder<'_>> {
        if index >= self.pages.len() {
            return Err(Error::InvalidPdf(format!(
                "page {} out of range ({} pages)",
                index,
                self.pages.len()
            )));
        }
        Ok(PageBuilder {
            writer: self,
            page_index: index,
        })
    }

    /// Register an image; the returned handle can be drawn on any page.
    pub fn embed_image(&mut self, image: &ImageData) -> ImageHandle {
        let object_ref = self.alloc_obj_id();
        let mut xobject = image.xobject();

        if let Some(mask) = image.soft_mask_xobject() {
            let mask_ref = self.alloc_obj_id();
            self.objects.insert(mask_ref.id, mask);
            if let Object::Stream { dict, .. } = &mut xobject {
                dict.insert("SMask".to_string(), Object::Reference(mask_ref));
            }
        }
        self.objects.insert(object_ref.id, xobject);

        self.image_count += 1;
        ImageHandle {
            resource_name: format!("Im{}", self.image_count),
            object_ref,
            width: image.width,
            height: image.height,
        }
    }

    fn font_ref(&mut self, font: CaptionFont) -> ObjectRef {
        if let Some(font_ref) = self.fonts.get(&font) {
            return *font_ref;
        }

        let font_ref = self.alloc_obj_id();
        let font_obj = ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Font")),
            ("Subtype", ObjectSerializer::name("Type1")),
            ("BaseFont", ObjectSerializer::name(font.base_font())),
            ("Encoding", ObjectSerializer::name("WinAnsiEncoding")),
        ]);
        self.objects.insert(font_ref.id, font_obj);
        self.fonts.insert(font, font_ref);
        font_ref
    }

    /// Serialize the complete document.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let catalog_ref = self.alloc_obj_id();
        let pages_ref = self.alloc_obj_id();

        let pages = std::mem::take(&mut self.pages);
        let mut kids = Vec::with_capacity(pages.len());

        for mut page in pages {
            let page_ref = self.alloc_obj_id();
            let content_ref = self.alloc_obj_id();
            kids.push(Object::Reference(page_ref));

            let raw_content = page.content.build()?;
            let mut content_dict = Dict::new();
            let content_bytes = if self.config.compress {
                content_dict.insert("Filter".to_string(), Object::Name("FlateDecode".to_string()));
                compress_data(&raw_content)?
            } else {
                raw_content
            };
            self.objects.insert(
                content_ref.id,
                Object::Stream {
                    dict: content_dict,
                    data: bytes::Bytes::from(content_bytes),
                },
            );

            let mut resources = Dict::new();
            if !page.fonts.is_empty() {
                resources.insert("Font".to_string(), resource_dict(&page.fonts));
            }
            if !page.images.is_empty() {
                resources.insert("XObject".to_string(), resource_dict(&page.images));
            }

            let mut page_dict = ObjectSerializer::dict_map(vec![
                ("Type", ObjectSerializer::name("Page")),
                ("Parent", ObjectSerializer::reference(pages_ref)),
                (
                    "MediaBox",
                    ObjectSerializer::rect(&crate::geometry::Rect::new(0.0, 0.0, page.width, page.height)),
                ),
                ("Contents", ObjectSerializer::reference(content_ref)),
                ("Resources", Object::Dictionary(resources)),
            ]);

            if !page.annotations.is_empty() {
                let mut annots = Vec::with_capacity(page.annotations.len());
                for mut annot in page.annotations {
                    let annot_ref = self.alloc_obj_id();
                    annot.insert("P".to_string(), Object::Reference(page_ref));
                    self.objects.insert(annot_ref.id, Object::Dictionary(annot));
                    annots.push(Object::Reference(annot_ref));
                }
                page_dict.insert("Annots".to_string(), Object::Array(annots));
            }
            self.objects.insert(page_ref.id, Object::Dictionary(page_dict));
        }

        let page_count = kids.len();
        self.objects.insert(
            pages_ref.id,
            ObjectSerializer::dict(vec![
                ("Type", ObjectSerializer::name("Pages")),
                ("Kids", Object::Array(kids)),
                ("Count", ObjectSerializer::integer(page_count as i64)),
            ]),
        );
        self.objects.insert(
            catalog_ref.id,
            ObjectSerializer::dict(vec![
                ("Type", ObjectSerializer::name("Catalog")),
                ("Pages", ObjectSerializer::reference(pages_ref)),
            ]),
        );

        let info_ref = self.alloc_obj_id();
        let mut info = Dict::new();
        if let Some(producer) = &self.config.producer {
            info.insert("Producer".to_string(), ObjectSerializer::string(producer.as_bytes()));
        }
        if let Some(created) = &self.config.creation_date {
            info.insert("CreationDate".to_string(), ObjectSerializer::string(format_pdf_date(created)));
        }
        self.objects.insert(info_ref.id, Object::Dictionary(info));

        let serializer = ObjectSerializer::compact();
        let mut output = Vec::new();
        writeln!(output, "%PDF-{}", self.config.version)?;
        output.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(self.objects.len());
        for (&id, obj) in &self.objects {
            offsets.push((id, output.len()));
            serializer.write_indirect(&mut output, ObjectRef::new(id, 0), obj)?;
        }

        let xref_start = output.len();
        writeln!(output, "xref")?;
        writeln!(output, "0 {}", self.next_obj_id)?;
        writeln!(output, "0000000000 65535 f ")?;
        // Every allocated number was written, so entries 1.. are contiguous.
        for (_, offset) in &offsets {
            writeln!(output, "{:010} 00000 n ", offset)?;
        }

        let trailer = ObjectSerializer::dict(vec![
            ("Size", ObjectSerializer::integer(self.next_obj_id as i64)),
            ("Root", ObjectSerializer::reference(catalog_ref)),
            ("Info", ObjectSerializer::reference(info_ref)),
        ]);
        writeln!(output, "trailer")?;
        serializer.write_object(&mut output, &trailer)?;
        writeln!(output)?;
        writeln!(output, "startxref")?;
        writeln!(output, "{}", xref_start)?;
        write!(output, "%%EOF")?;

        log::debug!("Serialized {} pages into {} bytes", page_count, output.len());
        Ok(output)
    }

    /// Serialize the document and write it to `path` atomically.
    pub fn save(self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.finish()?;
        write_atomic(path.as_ref(), &bytes)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn resource_dict(entries: &BTreeMap<String, ObjectRef>) -> Object {
    Object::Dictionary(
        entries
            .iter()
            .map(|(name, r)| (name.clone(), Object::Reference(*r)))
            .collect(),
    )
}

/// Write `bytes` to `<path>.part`, then rename it over `path`.
///
/// On failure the partial file is removed and nothing appears at `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    let result = std::fs::write(&part, bytes).and_then(|_| std::fs::rename(&part, path));
    if let Err(e) = result {
        if let Err(cleanup) = std::fs::remove_file(&part) {
            log::debug!("Could not remove {}: {}", part.display(), cleanup);
        }
        return Err(e.into());
    }
    Ok(())
}
