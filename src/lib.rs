// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::should_implement_trait)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # PDF Annotator
//!
//! Turn a handful of photos into a captioned PDF, and list the comments of
//! existing PDFs.
//!
//! ## Features
//!
//! ### Composing
//! - **One page per image**: A4 pages, image at full page width with its
//!   aspect ratio kept, 40pt below the top edge
//! - **Inline captions**: bold base-14 text centred near the top of every page
//! - **Annotated captions**: a collapsed pale-yellow comment icon carrying the
//!   caption, so viewers list it as a comment
//! - **All or nothing**: the document is written atomically after every image
//!   decoded
//!
//! ### Extracting
//! - **Comment listing**: point comments and free-text annotations with
//!   visible content, page by page
//! - **Robust reading**: classic and stream cross-reference tables, object
//!   streams, reconstruction of damaged files
//! - **Restricted documents**: files encrypted with an empty user password
//!   (RC4, AES-128, AES-256) open without prompting
//!
//! ### Service
//! - **Single worker**: one background thread with a one-slot queue; busy
//!   requests are refused rather than queued
//! - **Last outcome**: result path, error message and listed comments of the
//!   most recent request
//!
//! ## Architecture
//!
//! ```text
//! service (worker, storage paths)
//!   ├── composer ──┐
//!   └── extractor ─┴── engine::PdfEngine
//!                         └── NativeEngine ── writer (output) / document + annotations (input)
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_annotator::composer::{compose_to_file, CaptionMode, ComposeOptions, ImageSource};
//! use pdf_annotator::engine::NativeEngine;
//! use pdf_annotator::extractor::extract_file;
//! use std::path::{Path, PathBuf};
//!
//! # fn main() -> pdf_annotator::Result<()> {
//! let images: Vec<ImageSource> = (1..=5)
//!     .map(|i| ImageSource::Path(PathBuf::from(format!("photo{}.jpg", i))))
//!     .collect();
//! let options = ComposeOptions::new("made in India").with_mode(CaptionMode::Annotated);
//!
//! let mut engine = NativeEngine::new();
//! compose_to_file(&mut engine, &images, &options, Path::new("album.pdf"))?;
//!
//! for record in extract_file(&mut engine, Path::new("album.pdf"))? {
//!     println!("{}\n", record);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Core PDF parsing
pub mod document;
pub mod lexer;
pub mod object;
pub mod objstm;
pub mod parser;
pub mod xref;
pub mod xref_reconstruction;

// Stream decoders
pub mod decoders;

// Standard security handler
pub mod encryption;

// Geometry
pub mod geometry;

// Annotations
/// Annotation subtypes, flags, colours and icons
pub mod annotation_types;
pub mod annotations;
pub mod date;

// PDF writing
pub mod writer;

// Composition and extraction
pub mod composer;
pub mod engine;
pub mod extractor;

// Application layer
pub mod config;
pub mod service;
pub mod storage;

// Re-exports
pub use annotation_types::{AnnotationColor, AnnotationFlags, AnnotationSubtype, TextAnnotationIcon};
pub use annotations::Annotation;
pub use composer::{compose, compose_to_file, CaptionMode, ComposeOptions, ComposeReport, ImageSource};
pub use config::{AnnotatorConfig, PdfDetection};
pub use document::PdfDocument;
pub use engine::{NativeEngine, PdfEngine};
pub use error::{DocumentError, Error, ErrorKind, Result};
pub use extractor::{extract, extract_file, AnnotationKind, AnnotationRecord};
pub use service::{AnnotationService, LastOutcome, Outcome, Request};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
