//! Listing the comments of an existing document.
//!
//! Pages are walked in order and every point comment or free-text
//! annotation with visible content becomes an [`AnnotationRecord`].

use crate::annotation_types::AnnotationSubtype;
use crate::annotations::Annotation;
use crate::date::parse_pdf_date;
use crate::engine::PdfEngine;
use crate::error::Result;
use chrono::{DateTime, FixedOffset};
use std::fmt;
use std::path::Path;

/// Shown when a document has nothing to list.
pub const NO_ANNOTATIONS_MESSAGE: &str = "No visible annotations found.";

/// Kinds of annotation that are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnotationKind {
    /// `/Text`, a sticky note
    PointComment,
    /// `/FreeText`, text drawn directly on the page
    FreeText,
}

impl AnnotationKind {
    /// The listed kind of `subtype`, if any.
    pub fn from_subtype(subtype: &AnnotationSubtype) -> Option<Self> {
        match subtype {
            AnnotationSubtype::Text => Some(AnnotationKind::PointComment),
            AnnotationSubtype::FreeText => Some(AnnotationKind::FreeText),
            _ => None,
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationKind::PointComment => write!(f, "point-comment"),
            AnnotationKind::FreeText => write!(f, "free-text"),
        }
    }
}

/// One listed annotation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnnotationRecord {
    /// 1-based page number
    pub page_number: usize,
    /// Kind
    pub kind: AnnotationKind,
    /// Content, verbatim
    pub content: String,
    /// Title (usually the author), verbatim
    pub title: Option<String>,
    /// Modification timestamp, verbatim
    pub modified: Option<String>,
}

impl AnnotationRecord {
    /// Build a record from a page annotation, or `None` when it is not listed.
    pub fn from_annotation(page_number: usize, annotation: &Annotation) -> Option<Self> {
        let kind = AnnotationKind::from_subtype(&annotation.subtype_enum)?;
        let content = annotation.contents.as_ref().filter(|c| !c.trim().is_empty())?;
        Some(Self {
            page_number,
            kind,
            content: content.clone(),
            title: annotation.title.clone(),
            modified: annotation.modified.clone(),
        })
    }

    /// Timestamp for display, with the `D:` marker removed.
    pub fn display_modified(&self) -> Option<String> {
        self.modified.as_ref().map(|m| m.replace("D:", ""))
    }

    /// Parsed timestamp, when it is a well-formed PDF date.
    pub fn modified_at(&self) -> Option<DateTime<FixedOffset>> {
        self.modified.as_deref().and_then(parse_pdf_date)
    }

    /// Text carried by copy and share actions.
    pub fn share_text(&self) -> &str {
        &self.content
    }
}

impl fmt::Display for AnnotationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Page {}", self.page_number)?;
        if let Some(title) = &self.title {
            writeln!(f, "{}", title)?;
        }
        write!(f, "{}", self.content)?;
        if let Some(modified) = self.display_modified() {
            write!(f, "\n{}", modified)?;
        }
        Ok(())
    }
}

/// List the comments of the document loaded in `engine`.
///
/// Records come out page by page, then in stored order within a page. Any
/// failure discards everything collected so far.
pub fn extract<E: PdfEngine + ?Sized>(engine: &mut E) -> Result<Vec<AnnotationRecord>> {
    let page_count = engine.pages_of()?;
    let mut records = Vec::new();

    for index in 0..page_count {
        let annotations = engine.annotations_of(index)?;
        let before = records.len();
        records.extend(
            annotations
                .iter()
                .filter_map(|annotation| AnnotationRecord::from_annotation(index + 1, annotation)),
        );
        log::debug!(
            "Page {}: {} annotation(s), {} listed",
            index + 1,
            annotations.len(),
            records.len() - before
        );
    }

    Ok(records)
}

/// Load `path` into `engine` and [`extract`] it.
pub fn extract_file<E: PdfEngine + ?Sized>(engine: &mut E, path: &Path) -> Result<Vec<AnnotationRecord>> {
    engine.load(path)?;
    let records = extract(engine)?;
    log::info!("Extracted {} annotation(s) from {}", records.len(), path.display());
    Ok(records)
}
