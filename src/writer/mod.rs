//! PDF writing.
//!
//! ## Architecture
//!
//! ```text
//! ImageData / caption text / TextAnnotation
//!     ↓
//! [PageBuilder] (per-page drawing calls)
//!     ↓
//! [ContentStreamBuilder] (operators → content stream bytes)
//!     ↓
//! [PdfWriter] (pages, resources, annotations, Info, xref)
//!     ↓
//! [ObjectSerializer] (objects → PDF syntax)
//!     ↓
//! PDF bytes
//! ```
//!
//! ```
//! use pdf_annotator::writer::{CaptionFont, PdfWriter};
//!
//! let mut writer = PdfWriter::new();
//! writer
//!     .add_page(595.27563, 841.8898)
//!     .add_text("made in India", 230.0, 811.9, CaptionFont::TimesBold, 12.0)?;
//! let bytes = writer.finish()?;
//! assert!(bytes.starts_with(b"%PDF-1.7"));
//! # Ok::<(), pdf_annotator::Error>(())
//! ```

mod content_stream;
mod font_metrics;
mod image_handler;
mod object_serializer;
mod pdf_writer;
mod text_annotations;

pub use content_stream::{ContentStreamBuilder, ContentStreamOp};
pub use font_metrics::CaptionFont;
pub use image_handler::{ColorSpace, ImageData, ImageFormat};
pub use object_serializer::ObjectSerializer;
pub use pdf_writer::{write_atomic, ImageHandle, PageBuilder, PdfWriter, PdfWriterConfig};
pub use text_annotations::TextAnnotation;
