//! Read-only access to an existing PDF document.
//!
//! [`PdfDocument`] holds the whole file in memory, resolves indirect objects
//! on demand through the cross-reference table and walks the page tree. It is
//! the reading half of the native engine; annotation reading builds on it.
//! Documents encrypted with an empty user password are decrypted as objects
//! load.

use crate::encryption::EncryptionHandler;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::object::{Dict, Object, ObjectRef};
use crate::parser::parse_indirect_object;
use crate::xref::{find_xref_offset, parse_xref, CrossRefTable, XRefEntryType};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Maximum nesting of object loads (object stream -> stream length -> ...).
const MAX_RECURSION_DEPTH: u32 = 100;

/// Maximum depth of the page tree.
const MAX_PAGE_TREE_DEPTH: usize = 64;

/// How far into the file the `%PDF-` marker may appear.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// A page reached through the page tree.
#[derive(Debug, Clone)]
pub struct Page {
    /// Indirect reference of the page object, when it has one
    pub object_ref: Option<ObjectRef>,
    /// The page dictionary
    pub dict: Dict,
    /// Effective media box, honouring inheritance from parent nodes
    pub media_box: Option<Rect>,
}

/// A parsed, read-only PDF document.
pub struct PdfDocument {
    data: Vec<u8>,
    version: (u8, u8),
    xref: CrossRefTable,
    trailer: Dict,
    object_cache: HashMap<ObjectRef, Object>,
    objstm_cache: HashMap<u32, HashMap<u32, Object>>,
    resolving_stack: Vec<ObjectRef>,
    encryption: Option<EncryptionHandler>,
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("version", &self.version)
            .field("size", &self.data.len())
            .field("xref_entries", &self.xref.len())
            .field("cached_objects", &self.object_cache.len())
            .field("encrypted", &self.encryption.is_some())
            .finish()
    }
}

impl PdfDocument {
    /// Open a PDF document from a file path.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, the header is missing, neither the
    /// cross-reference table nor a reconstruction yields a document catalog,
    /// or the document is encrypted and needs a password.
    ///
    /// ```no_run
    /// use pdf_annotator::document::PdfDocument;
    ///
    /// let mut doc = PdfDocument::open("annotated.pdf")?;
    /// println!("{} pages", doc.page_count()?);
    /// # Ok::<(), pdf_annotator::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        log::debug!("Read {} bytes from {}", data.len(), path.as_ref().display());
        Self::from_bytes(data)
    }

    /// Parse a PDF document held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let version = parse_header(&data)?;

        let (xref, trailer) = match Self::try_open_regular(&data) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("Regular xref parsing failed: {}, attempting reconstruction", e);
                match crate::xref_reconstruction::reconstruct_xref(&data) {
                    Ok((xref, trailer)) => (xref, trailer),
                    Err(recon_err) => {
                        log::error!("XRef reconstruction also failed: {}", recon_err);
                        return Err(e);
                    },
                }
            },
        };

        let mut document = Self {
            data,
            version,
            xref,
            trailer,
            object_cache: HashMap::new(),
            objstm_cache: HashMap::new(),
            resolving_stack: Vec::new(),
            encryption: None,
        };
        document.init_encryption()?;
        Ok(document)
    }

    /// Set up decryption when the trailer has `/Encrypt`.
    fn init_encryption(&mut self) -> Result<()> {
        let Some(entry) = self.trailer.get("Encrypt").cloned() else {
            return Ok(());
        };
        let file_id = match self.trailer.get("ID") {
            Some(Object::Array(ids)) => ids.first().and_then(Object::as_string).map(<[u8]>::to_vec),
            _ => None,
        };
        let file_id = file_id.unwrap_or_else(|| {
            log::warn!("Encrypted document has no usable /ID, using an empty file ID");
            Vec::new()
        });

        // Loaded before the handler exists, so it stays as written.
        let encrypt = into_dict(self.resolve(&entry)?)?;
        self.encryption = Some(EncryptionHandler::open(&encrypt, &file_id, entry.as_reference())?);
        Ok(())
    }

    /// Whether strings and streams are decrypted on load.
    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_some()
    }

    fn try_open_regular(data: &[u8]) -> Result<(CrossRefTable, Dict)> {
        let offset = find_xref_offset(data)?;
        let xref = parse_xref(data, offset)?;
        let trailer = xref
            .trailer()
            .filter(|t| t.contains_key("Root"))
            .cloned()
            .ok_or_else(|| Error::InvalidPdf("trailer has no /Root".to_string()))?;
        if xref.is_empty() {
            return Err(Error::InvalidXref);
        }
        Ok((xref, trailer))
    }

    /// PDF version from the header, as (major, minor).
    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    /// The trailer dictionary.
    pub fn trailer(&self) -> &Dict {
        &self.trailer
    }

    /// Load an indirect object.
    ///
    /// Results are cached. Loading detects reference cycles and bounds the
    /// nesting depth, so a malicious file fails instead of overflowing.
    pub fn load_object(&mut self, obj_ref: ObjectRef) -> Result<Object> {
        if let Some(cached) = self.object_cache.get(&obj_ref) {
            return Ok(cached.clone());
        }
        if self.resolving_stack.len() >= MAX_RECURSION_DEPTH as usize {
            return Err(Error::RecursionLimitExceeded(MAX_RECURSION_DEPTH));
        }
        if self.resolving_stack.contains(&obj_ref) {
            log::error!("Circular reference detected for object {}", obj_ref);
            return Err(Error::CircularReference(obj_ref));
        }

        self.resolving_stack.push(obj_ref);
        let result = self.load_uncached(obj_ref);
        self.resolving_stack.pop();

        let object = result?;
        self.object_cache.insert(obj_ref, object.clone());
        Ok(object)
    }

    fn load_uncached(&mut self, obj_ref: ObjectRef) -> Result<Object> {
        let entry = match self.xref.get(obj_ref.id) {
            Some(entry) if entry.in_use() => entry.clone(),
            Some(_) => return Err(Error::ObjectNotFound(obj_ref.id, obj_ref.gen)),
            None => {
                log::warn!("Object {} not in xref table, scanning file", obj_ref);
                let offset = self.scan_for_object(obj_ref)?;
                return self.load_at_offset(obj_ref, offset);
            },
        };

        match entry.entry_type {
            XRefEntryType::Uncompressed => match self.load_at_offset(obj_ref, entry.offset) {
                Ok(obj) => Ok(obj),
                Err(e) => {
                    log::warn!("Object {} not at recorded offset {}: {}", obj_ref, entry.offset, e);
                    let offset = self.scan_for_object(obj_ref).map_err(|_| e)?;
                    self.load_at_offset(obj_ref, offset)
                },
            },
            XRefEntryType::Compressed => {
                self.load_compressed_object(obj_ref, entry.offset as u32, entry.generation)
            },
            XRefEntryType::Free => Err(Error::ObjectNotFound(obj_ref.id, obj_ref.gen)),
        }
    }

    fn load_at_offset(&self, obj_ref: ObjectRef, offset: u64) -> Result<Object> {
        let start = usize::try_from(offset)
            .ok()
            .filter(|&o| o < self.data.len())
            .ok_or(Error::UnexpectedEof)?;

        let (found_ref, object) = parse_indirect_object(&self.data[start..])
            .map(|(_, parsed)| parsed)
            .map_err(|e| crate::parser::to_parse_error(e, start))?;

        if found_ref.id != obj_ref.id {
            return Err(Error::ParseError {
                offset: start,
                reason: format!("expected object {}, found {}", obj_ref, found_ref),
            });
        }

        // Objects inside object streams are covered by their container.
        match &self.encryption {
            Some(handler) => handler.decrypt_object(object, obj_ref),
            None => Ok(object),
        }
    }

    fn load_compressed_object(
        &mut self,
        obj_ref: ObjectRef,
        stream_num: u32,
        index: u16,
    ) -> Result<Object> {
        if !self.objstm_cache.contains_key(&stream_num) {
            let stream = self.load_object(ObjectRef::new(stream_num, 0))?;
            let objects = crate::objstm::parse_object_stream(&stream)?;
            self.objstm_cache.insert(stream_num, objects);
        }

        self.objstm_cache
            .get(&stream_num)
            .and_then(|objects| objects.get(&obj_ref.id))
            .cloned()
            .ok_or_else(|| {
                log::warn!("Object {} missing from object stream {} (index {})", obj_ref, stream_num, index);
                Error::ObjectNotFound(obj_ref.id, obj_ref.gen)
            })
    }

    /// Find `id gen obj` at the start of a line when the xref is wrong.
    fn scan_for_object(&self, obj_ref: ObjectRef) -> Result<u64> {
        let pattern = format!("{} {} obj", obj_ref.id, obj_ref.gen);
        let pattern = pattern.as_bytes();

        let mut pos = 0;
        while let Some(rel) = crate::parser::find_keyword(&self.data[pos..], pattern) {
            let at = pos + rel;
            let starts_line = at == 0 || matches!(self.data[at - 1], b'\n' | b'\r');
            let ends_token = self
                .data
                .get(at + pattern.len())
                .map_or(true, |&c| c.is_ascii_whitespace() || c == b'<' || c == b'[');
            if starts_line && ends_token {
                log::info!("Found object {} by scanning at byte {}", obj_ref, at);
                return Ok(at as u64);
            }
            pos = at + 1;
        }

        Err(Error::ObjectNotFound(obj_ref.id, obj_ref.gen))
    }

    /// Follow `obj` if it is a reference; otherwise return a copy of it.
    pub fn resolve(&mut self, obj: &Object) -> Result<Object> {
        match obj {
            Object::Reference(r) => self.load_object(*r),
            other => Ok(other.clone()),
        }
    }

    /// The document catalog (`/Root`).
    pub fn catalog(&mut self) -> Result<Dict> {
        let root = self
            .trailer
            .get("Root")
            .cloned()
            .ok_or_else(|| Error::InvalidPdf("trailer has no /Root".to_string()))?;
        let catalog = self.resolve(&root)?;
        into_dict(catalog)
    }

    /// Every page in document order.
    ///
    /// # Errors
    ///
    /// Fails when the catalog has no page tree, when a page tree node is not a
    /// dictionary, or when the tree contains a cycle.
    pub fn pages(&mut self) -> Result<Vec<Page>> {
        let catalog = self.catalog()?;
        let root = catalog
            .get("Pages")
            .cloned()
            .ok_or_else(|| Error::InvalidPdf("Catalog missing /Pages entry".to_string()))?;

        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        self.collect_pages(&root, None, 0, &mut visited, &mut pages)?;
        log::debug!("Page tree holds {} pages", pages.len());
        Ok(pages)
    }

    fn collect_pages(
        &mut self,
        node: &Object,
        inherited_media_box: Option<Rect>,
        depth: usize,
        visited: &mut HashSet<ObjectRef>,
        pages: &mut Vec<Page>,
    ) -> Result<()> {
        if depth > MAX_PAGE_TREE_DEPTH {
            return Err(Error::InvalidPdf(format!(
                "page tree deeper than {} levels",
                MAX_PAGE_TREE_DEPTH
            )));
        }

        let node_ref = node.as_reference();
        if let Some(r) = node_ref {
            if !visited.insert(r) {
                return Err(Error::CircularReference(r));
            }
        }

        let dict = into_dict(self.resolve(node)?)?;
        let media_box = match dict.get("MediaBox") {
            Some(mb) => {
                let mb = self.resolve(mb)?;
                rect_from_array(&mb).or(inherited_media_box)
            },
            None => inherited_media_box,
        };

        let node_type = dict.get("Type").and_then(Object::as_name);
        let is_pages_node = node_type == Some("Pages") || (node_type.is_none() && dict.contains_key("Kids"));

        if is_pages_node {
            let kids = match dict.get("Kids") {
                Some(kids) => self.resolve(kids)?,
                None => return Err(Error::InvalidPdf("Pages node missing /Kids".to_string())),
            };
            let kids = kids.as_array().cloned().ok_or_else(|| Error::InvalidObjectType {
                expected: "Array".to_string(),
                found: kids.type_name().to_string(),
            })?;
            for kid in &kids {
                self.collect_pages(kid, media_box, depth + 1, visited, pages)?;
            }
        } else {
            pages.push(Page {
                object_ref: node_ref,
                dict,
                media_box,
            });
        }

        Ok(())
    }

    /// Number of pages reached by walking the page tree.
    pub fn page_count(&mut self) -> Result<usize> {
        Ok(self.pages()?.len())
    }

    /// The page at zero-based `index`.
    pub fn page(&mut self, index: usize) -> Result<Page> {
        let mut pages = self.pages()?;
        if index >= pages.len() {
            return Err(Error::InvalidPdf(format!(
                "page {} out of range ({} pages)",
                index,
                pages.len()
            )));
        }
        Ok(pages.swap_remove(index))
    }
}

/// Parse the `%PDF-M.m` header.
///
/// Some producers put junk before the marker, so it may start anywhere in
/// the first kilobyte.
///
/// ```
/// use pdf_annotator::document::parse_header;
///
/// assert_eq!(parse_header(b"%PDF-1.7\n").unwrap(), (1, 7));
/// assert!(parse_header(b"GIF89a").is_err());
/// ```
pub fn parse_header(data: &[u8]) -> Result<(u8, u8)> {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    let start = crate::parser::find_keyword(window, b"%PDF-")
        .ok_or_else(|| Error::InvalidHeader("missing %PDF- marker".to_string()))?;

    let version = &data[start + 5..];
    let digits = |bytes: &[u8]| -> Option<u8> {
        let end = bytes.iter().position(|c| !c.is_ascii_digit()).unwrap_or(bytes.len());
        std::str::from_utf8(&bytes[..end]).ok()?.parse().ok()
    };

    let major = digits(version);
    let minor = version
        .iter()
        .position(|&c| c == b'.')
        .and_then(|dot| digits(&version[dot + 1..]));

    match (major, minor) {
        (Some(major), Some(minor)) => Ok((major, minor)),
        _ => Err(Error::InvalidHeader(
            String::from_utf8_lossy(&version[..version.len().min(8)]).into_owned(),
        )),
    }
}

fn into_dict(obj: Object) -> Result<Dict> {
    match obj {
        Object::Dictionary(dict) => Ok(dict),
        Object::Stream { dict, .. } => Ok(dict),
        other => Err(Error::InvalidObjectType {
            expected: "Dictionary".to_string(),
            found: other.type_name().to_string(),
        }),
    }
}

/// `[llx lly urx ury]` into a [`Rect`].
pub(crate) fn rect_from_array(obj: &Object) -> Option<Rect> {
    let values: Vec<f32> = obj
        .as_array()?
        .iter()
        .map(|v| v.as_number().map(|n| n as f32))
        .collect::<Option<_>>()?;
    match values[..] {
        [x0, y0, x1, y1] => Some(Rect::from_points(x0, y0, x1, y1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble a classic-xref PDF from numbered object bodies.
    fn build_pdf(objects: &[&str], root: u32) -> Vec<u8> {
        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }
        let xref_offset = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                root,
                xref_offset
            )
            .as_bytes(),
        );
        pdf
    }

    fn two_page_pdf() -> Vec<u8> {
        build_pdf(
            &[
                "<< /Type /Catalog /Pages 2 0 R >>",
                "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 /MediaBox [0 0 595.27563 841.8898] >>",
                "<< /Type /Page /Parent 2 0 R >>",
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>",
            ],
            1,
        )
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(parse_header(b"%PDF-1.4\n").unwrap(), (1, 4));
        assert_eq!(parse_header(b"junk\n%PDF-2.0\n").unwrap(), (2, 0));
        assert!(matches!(parse_header(b"not a pdf"), Err(Error::InvalidHeader(_))));
        assert!(parse_header(b"%PDF-x").is_err());
    }

    #[test]
    fn test_open_and_walk_pages() {
        let mut doc = PdfDocument::from_bytes(two_page_pdf()).unwrap();
        assert_eq!(doc.version(), (1, 4));
        assert_eq!(doc.page_count().unwrap(), 2);

        let pages = doc.pages().unwrap();
        assert_eq!(pages[0].object_ref, Some(ObjectRef::new(3, 0)));
        let inherited = pages[0].media_box.unwrap();
        assert!((inherited.width - 595.275_63).abs() < 1e-3);
        assert_eq!(pages[1].media_box.unwrap().width, 612.0);
    }

    #[test]
    fn test_page_out_of_range() {
        let mut doc = PdfDocument::from_bytes(two_page_pdf()).unwrap();
        assert!(doc.page(1).is_ok());
        assert!(doc.page(2).is_err());
    }

    #[test]
    fn test_nested_page_tree_order() {
        let pdf = build_pdf(
            &[
                "<< /Type /Catalog /Pages 2 0 R >>",
                "<< /Type /Pages /Kids [3 0 R 5 0 R] /Count 3 >>",
                "<< /Type /Pages /Kids [4 0 R 6 0 R] /Count 2 >>",
                "<< /Type /Page /Marker 1 >>",
                "<< /Type /Page /Marker 3 >>",
                "<< /Type /Page /Marker 2 >>",
            ],
            1,
        );
        let mut doc = PdfDocument::from_bytes(pdf).unwrap();
        let markers: Vec<i64> = doc
            .pages()
            .unwrap()
            .iter()
            .map(|p| p.dict["Marker"].as_integer().unwrap())
            .collect();
        assert_eq!(markers, vec![1, 2, 3]);
    }

    #[test]
    fn test_page_tree_cycle_is_an_error() {
        let pdf = build_pdf(
            &[
                "<< /Type /Catalog /Pages 2 0 R >>",
                "<< /Type /Pages /Kids [2 0 R] /Count 1 >>",
            ],
            1,
        );
        let mut doc = PdfDocument::from_bytes(pdf).unwrap();
        assert!(matches!(doc.pages(), Err(Error::CircularReference(_))));
    }

    #[test]
    fn test_load_object_does_not_follow_stored_reference() {
        let pdf = build_pdf(&["<< /Type /Catalog /Pages 2 0 R >>", "2 0 R"], 1);
        let mut doc = PdfDocument::from_bytes(pdf).unwrap();
        assert_eq!(
            doc.load_object(ObjectRef::new(2, 0)).unwrap(),
            Object::Reference(ObjectRef::new(2, 0))
        );
    }

    #[test]
    fn test_object_stream_cycle_is_detected() {
        let mut doc = PdfDocument::from_bytes(two_page_pdf()).unwrap();
        // Object 9 claims to live inside object stream 9.
        doc.xref.add_entry(9, crate::xref::XRefEntry::compressed(9, 0));
        assert!(matches!(
            doc.load_object(ObjectRef::new(9, 0)),
            Err(Error::CircularReference(_))
        ));
    }

    #[test]
    fn test_objects_are_cached() {
        let mut doc = PdfDocument::from_bytes(two_page_pdf()).unwrap();
        let first = doc.load_object(ObjectRef::new(3, 0)).unwrap();
        assert!(doc.object_cache.contains_key(&ObjectRef::new(3, 0)));
        assert_eq!(doc.load_object(ObjectRef::new(3, 0)).unwrap(), first);
    }

    #[test]
    fn test_broken_xref_falls_back_to_reconstruction() {
        let mut pdf = two_page_pdf();
        let pos = crate::parser::find_keyword(&pdf, b"startxref").unwrap();
        pdf.truncate(pos);
        pdf.extend_from_slice(b"startxref\n999999\n%%EOF\n");

        let mut doc = PdfDocument::from_bytes(pdf).unwrap();
        assert_eq!(doc.page_count().unwrap(), 2);
    }

    #[test]
    fn test_wrong_xref_offset_recovers_by_scanning() {
        let pdf = two_page_pdf();
        let text = String::from_utf8_lossy(&pdf).into_owned();
        // Shift object 3's recorded offset by one byte.
        let obj3 = text.find("3 0 obj").unwrap();
        let wrong = text.replacen(&format!("{:010} 00000 n", obj3), &format!("{:010} 00000 n", obj3 + 1), 1);

        let mut doc = PdfDocument::from_bytes(wrong.into_bytes()).unwrap();
        assert_eq!(doc.page_count().unwrap(), 2);
    }

    /// Three pages, one encrypted comment on the first and the `/Encrypt`
    /// dictionary as object 5.
    fn encrypted_pdf(fixture: &crate::encryption::handler_tests::Fixture) -> Vec<u8> {
        let hex = |bytes: &[u8]| bytes.iter().map(|b| format!("{:02X}", b)).collect::<String>();
        let mut encrypt = Vec::new();
        crate::writer::ObjectSerializer::compact()
            .write_object(&mut encrypt, &Object::Dictionary(fixture.encrypt.clone()))
            .unwrap();

        let annot = format!(
            "<< /Type /Annot /Subtype /Text /Contents <{}> /T <{}> >>",
            hex(&fixture.seal(b"made in India", 4)),
            hex(&fixture.seal(b"Asha", 4))
        );
        let encrypt = String::from_utf8(encrypt).unwrap();
        let pdf = build_pdf(
            &[
                "<< /Type /Catalog /Pages 2 0 R >>",
                "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 10 10] >>",
                "<< /Type /Page /Parent 2 0 R /Annots [4 0 R] >>",
                annot.as_str(),
                encrypt.as_str(),
            ],
            1,
        );
        let id = hex(&fixture.file_id);
        String::from_utf8_lossy(&pdf)
            .replace("/Root 1 0 R", &format!("/Root 1 0 R /Encrypt 5 0 R /ID [<{}> <{}>]", id, id))
            .into_bytes()
    }

    #[test]
    fn test_empty_user_password_documents_open() {
        use crate::encryption::handler_tests::Fixture;

        for fixture in [Fixture::rc4(), Fixture::aes128(), Fixture::aes256()] {
            let mut doc = PdfDocument::from_bytes(encrypted_pdf(&fixture)).unwrap();
            assert!(doc.is_encrypted());
            let annots = doc.get_annotations(0).unwrap();
            assert_eq!(annots.len(), 1);
            assert_eq!(annots[0].contents.as_deref(), Some("made in India"));
            assert_eq!(annots[0].title.as_deref(), Some("Asha"));
        }
    }

    #[test]
    fn test_password_protected_document_is_a_parse_error() {
        use crate::encryption::handler_tests::Fixture;

        let mut fixture = Fixture::rc4();
        fixture.encrypt.insert("U".into(), Object::String(vec![0x42; 32]));
        match PdfDocument::from_bytes(encrypted_pdf(&fixture)) {
            Err(e @ Error::InvalidPdf(_)) => {
                assert!(e.to_string().contains("password"));
                assert_eq!(e.kind(), crate::error::ErrorKind::Parse);
            },
            other => panic!("expected a password error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_catalog_pages() {
        let pdf = build_pdf(&["<< /Type /Catalog >>"], 1);
        let mut doc = PdfDocument::from_bytes(pdf).unwrap();
        assert!(doc.pages().is_err());
    }

    #[test]
    fn test_not_a_pdf() {
        assert!(matches!(
            PdfDocument::from_bytes(b"\xFF\xD8\xFF\xE0 jpeg data".to_vec()),
            Err(Error::InvalidHeader(_))
        ));
    }
}
