//! Cross-reference table reconstruction for damaged PDFs.
//!
//! When the xref table is corrupted or missing, scan the whole file for
//! `N G obj` headers and rebuild the table from what is found. This is a
//! fallback used only when regular xref parsing fails.

use crate::error::{Error, Result};
use crate::object::{Dict, Object, ObjectRef};
use crate::parser::{parse_indirect_object, parse_object};
use crate::xref::{CrossRefTable, XRefEntry};
use lazy_static::lazy_static;

lazy_static! {
    static ref RE_OBJ_PATTERN: regex::bytes::Regex =
        regex::bytes::Regex::new(r"(?-u)\b(\d{1,10})\s+(\d{1,5})\s+obj\b")
            .expect("object header pattern is valid");
    static ref RE_TRAILER: regex::bytes::Regex =
        regex::bytes::Regex::new(r"trailer\s*<<").expect("trailer pattern is valid");
}

/// Rebuild the cross-reference table by scanning `data` for object headers.
///
/// Later headers win over earlier ones with the same number, matching the
/// way incremental updates append newer revisions. The trailer is the last
/// parseable `trailer` dictionary, or a minimal one pointing at the first
/// `/Type /Catalog` object found.
///
/// # Errors
///
/// Fails when no object header is found or no catalog can be identified.
pub fn reconstruct_xref(data: &[u8]) -> Result<(CrossRefTable, Dict)> {
    log::info!("Reconstructing xref table by scanning {} bytes", data.len());

    let mut xref = CrossRefTable::new();
    for capture in RE_OBJ_PATTERN.captures_iter(data) {
        let (Some(whole), Some(num), Some(gen)) = (capture.get(0), capture.get(1), capture.get(2))
        else {
            continue;
        };
        let parsed = std::str::from_utf8(num.as_bytes())
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .zip(std::str::from_utf8(gen.as_bytes()).ok().and_then(|s| s.parse::<u16>().ok()));
        let Some((obj_num, gen_num)) = parsed else {
            continue;
        };

        // A header must be followed by something that can start an object.
        let after = crate::lexer::skip_ws(&data[whole.end()..]);
        let plausible = after.first().is_some_and(|&b| {
            matches!(b, b'<' | b'[' | b'(' | b'/' | b't' | b'f' | b'n' | b'-' | b'+' | b'.')
                || b.is_ascii_digit()
        });
        if !plausible {
            log::debug!("Skipping false object header at offset {}", whole.start());
            continue;
        }

        xref.add_entry(obj_num, XRefEntry::uncompressed(whole.start() as u64, gen_num));
    }

    if xref.is_empty() {
        return Err(Error::InvalidPdf("No objects found during xref reconstruction".to_string()));
    }
    log::info!("Reconstructed xref with {} objects", xref.len());

    let trailer = match find_trailer(data) {
        Some(trailer) => trailer,
        None => minimal_trailer(data, &xref)?,
    };
    Ok((xref, trailer))
}

fn find_trailer(data: &[u8]) -> Option<Dict> {
    RE_TRAILER
        .find_iter(data)
        .filter_map(|m| match parse_object(&data[m.start() + "trailer".len()..]) {
            Ok((_, Object::Dictionary(dict))) if dict.contains_key("Root") => Some(dict),
            _ => None,
        })
        .last()
}

fn minimal_trailer(data: &[u8], xref: &CrossRefTable) -> Result<Dict> {
    let mut numbers: Vec<u32> = xref.all_object_numbers().collect();
    numbers.sort_unstable();

    let catalog = numbers.into_iter().find_map(|num| {
        let entry = xref.get(num)?;
        let (_, (_, obj)) = parse_indirect_object(data.get(entry.offset as usize..)?).ok()?;
        let is_catalog = obj
            .as_dict()
            .and_then(|d| d.get("Type"))
            .and_then(Object::as_name)
            == Some("Catalog");
        is_catalog.then(|| ObjectRef::new(num, entry.generation))
    });

    let root = catalog
        .ok_or_else(|| Error::InvalidPdf("Could not find catalog in reconstructed xref".to_string()))?;
    log::info!("Using reconstructed trailer with /Root {}", root);

    let mut trailer = Dict::new();
    trailer.insert("Root".to_string(), Object::Reference(root));
    trailer.insert("Size".to_string(), Object::Integer(xref.len() as i64 + 1));
    Ok(trailer)
}
