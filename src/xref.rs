//! Cross-reference table parser.
//!
//! The xref table maps object numbers to byte offsets in the PDF file,
//! enabling random access to PDF objects.
//!
//! Supports traditional xref tables, cross-reference streams (PDF 1.5+),
//! hybrid files that carry both (`/XRefStm`), and `/Prev` chains left by
//! incremental updates.

use crate::error::{Error, Result};
use crate::object::{Dict, Object};
use crate::parser::{parse_indirect_object, parse_object};

/// Longest `/Prev` chain followed before the file is declared corrupt.
const MAX_PREV_DEPTH: u32 = 100;

/// Cross-reference table entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntryType {
    /// Entry for a free object
    Free,
    /// Entry for an uncompressed object (traditional)
    Uncompressed,
    /// Entry for an object in an object stream (PDF 1.5+)
    Compressed,
}

/// Cross-reference table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XRefEntry {
    /// Type of entry
    pub entry_type: XRefEntryType,
    /// Byte offset (for uncompressed) or object stream number (for compressed)
    pub offset: u64,
    /// Generation number (for uncompressed) or index within stream (for compressed)
    pub generation: u16,
}

impl XRefEntry {
    /// An object stored directly at `offset`.
    pub fn uncompressed(offset: u64, generation: u16) -> Self {
        Self {
            entry_type: XRefEntryType::Uncompressed,
            offset,
            generation,
        }
    }

    /// An object stored at `index` inside object stream `stream_obj_num`.
    pub fn compressed(stream_obj_num: u64, index: u16) -> Self {
        Self {
            entry_type: XRefEntryType::Compressed,
            offset: stream_obj_num,
            generation: index,
        }
    }

    /// A free entry.
    pub fn free(next_free: u64, generation: u16) -> Self {
        Self {
            entry_type: XRefEntryType::Free,
            offset: next_free,
            generation,
        }
    }

    /// Whether the entry points at a live object.
    pub fn in_use(&self) -> bool {
        self.entry_type != XRefEntryType::Free
    }
}

/// Cross-reference table that maps object numbers to their locations.
#[derive(Debug, Clone, Default)]
pub struct CrossRefTable {
    entries: std::collections::HashMap<u32, XRefEntry>,
    trailer: Option<Dict>,
}

impl CrossRefTable {
    /// Create a new empty cross-reference table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the trailer dictionary.
    pub fn set_trailer(&mut self, trailer: Dict) {
        self.trailer = Some(trailer);
    }

    /// Get the trailer dictionary if present.
    pub fn trailer(&self) -> Option<&Dict> {
        self.trailer.as_ref()
    }

    /// Add an entry, replacing any previous entry for the same number.
    pub fn add_entry(&mut self, object_number: u32, entry: XRefEntry) {
        self.entries.insert(object_number, entry);
    }

    /// Get an entry by object number.
    pub fn get(&self, object_number: u32) -> Option<&XRefEntry> {
        self.entries.get(&object_number)
    }

    /// All object numbers in the table.
    pub fn all_object_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    /// Merge an older section into this one. Entries already present win,
    /// which is how incremental updates override earlier revisions.
    pub fn merge_from(&mut self, older: CrossRefTable) {
        for (obj_num, entry) in older.entries {
            self.entries.entry(obj_num).or_insert(entry);
        }
        if self.trailer.is_none() {
            self.trailer = older.trailer;
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Find the byte offset named by the last `startxref` keyword.
///
/// # Errors
///
/// Returns [`Error::InvalidXref`] when the keyword or its offset is missing.
pub fn find_xref_offset(data: &[u8]) -> Result<u64> {
    let tail_start = data.len().saturating_sub(2048);
    let tail = String::from_utf8_lossy(&data[tail_start..]);

    let startxref_pos = tail.rfind("startxref").ok_or(Error::InvalidXref)?;
    let after_keyword = &tail[startxref_pos + "startxref".len()..];

    after_keyword
        .split(|c: char| c == '\r' || c == '\n')
        .map(str::trim)
        .find(|line| !line.is_empty())
        .filter(|line| line.chars().all(|c| c.is_ascii_digit()))
        .and_then(|line| line.parse::<u64>().ok())
        .ok_or(Error::InvalidXref)
}

/// Parse the cross-reference section at `offset` and every older section
/// reachable through `/Prev`.
pub fn parse_xref(data: &[u8], offset: u64) -> Result<CrossRefTable> {
    parse_xref_recursive(data, offset, 0)
}

fn parse_xref_recursive(data: &[u8], offset: u64, depth: u32) -> Result<CrossRefTable> {
    if depth > MAX_PREV_DEPTH {
        return Err(Error::InvalidPdf(format!(
            "xref /Prev chain depth exceeded {}",
            MAX_PREV_DEPTH
        )));
    }

    let start = usize::try_from(offset)
        .ok()
        .filter(|&o| o < data.len())
        .ok_or(Error::InvalidXref)?;
    let section = crate::lexer::skip_ws(&data[start..]);

    log::debug!("Parsing xref at offset {}", offset);

    let mut xref = if section.starts_with(b"xref") {
        let mut table = parse_traditional_xref(section, start)?;
        // Hybrid files list compressed objects in a separate stream.
        let xref_stm = table
            .trailer()
            .and_then(|t| t.get("XRefStm"))
            .and_then(Object::as_integer);
        if let Some(stm_offset) = xref_stm {
            match parse_xref_stream_at(data, stm_offset as u64) {
                Ok(stream_table) => table.merge_from(stream_table),
                Err(e) => log::warn!("Ignoring unreadable /XRefStm at {}: {}", stm_offset, e),
            }
        }
        table
    } else if section.first().is_some_and(u8::is_ascii_digit) {
        parse_xref_stream(section, start)?
    } else {
        return Err(Error::InvalidXref);
    };

    let prev = xref
        .trailer()
        .and_then(|t| t.get("Prev"))
        .and_then(Object::as_integer);
    if let Some(prev_offset) = prev {
        log::debug!("Following /Prev {} from xref at {}", prev_offset, offset);
        let older = parse_xref_recursive(data, prev_offset as u64, depth + 1)?;
        xref.merge_from(older);
    }

    Ok(xref)
}

/// Parse a traditional table starting at the `xref` keyword.
///
/// ```text
/// xref
/// 0 6
/// 0000000000 65535 f
/// 0000000018 00000 n
/// trailer
/// << /Size 6 /Root 1 0 R >>
/// ```
fn parse_traditional_xref(section: &[u8], base_offset: usize) -> Result<CrossRefTable> {
    let mut xref = CrossRefTable::new();
    let mut rest = &section[b"xref".len()..];

    loop {
        rest = crate::lexer::skip_ws(rest);
        if rest.starts_with(b"trailer") {
            rest = &rest[b"trailer".len()..];
            break;
        }

        let (after_header, header) = take_line(rest);
        let mut parts = header.split_ascii_whitespace();
        let (start_obj, count) = match (parts.next(), parts.next(), parts.next()) {
            (Some(s), Some(c), None) => (
                s.parse::<u32>().map_err(|_| Error::InvalidXref)?,
                c.parse::<u32>().map_err(|_| Error::InvalidXref)?,
            ),
            _ => return Err(Error::InvalidXref),
        };
        if count > 1_000_000 {
            return Err(Error::InvalidPdf("xref subsection count exceeds limit".to_string()));
        }
        rest = after_header;

        for i in 0..count {
            rest = crate::lexer::skip_ws(rest);
            if rest.starts_with(b"trailer") {
                log::warn!("Expected {} xref entries but found {} before trailer", count, i);
                break;
            }
            let (after_entry, line) = take_line(rest);
            rest = after_entry;
            xref.add_entry(start_obj + i, parse_table_entry(&line)?);
        }
    }

    let trailer_offset = base_offset + (section.len() - rest.len());
    let (_, trailer) = parse_object(rest)
        .map_err(|e| crate::parser::to_parse_error(e, trailer_offset))?;
    match trailer {
        Object::Dictionary(dict) => xref.set_trailer(dict),
        other => {
            return Err(Error::InvalidObjectType {
                expected: "Dictionary".to_string(),
                found: other.type_name().to_string(),
            })
        },
    }

    Ok(xref)
}

fn take_line(input: &[u8]) -> (&[u8], String) {
    let end = input
        .iter()
        .position(|&c| c == b'\r' || c == b'\n')
        .unwrap_or(input.len());
    (&input[end..], String::from_utf8_lossy(&input[..end]).into_owned())
}

/// One `nnnnnnnnnn ggggg n` row.
fn parse_table_entry(line: &str) -> Result<XRefEntry> {
    let mut parts = line.split_ascii_whitespace();
    let (offset, generation, flag) = match (parts.next(), parts.next(), parts.next()) {
        (Some(o), Some(g), Some(f)) => (o, g, f),
        _ => return Err(Error::InvalidXref),
    };
    let offset: u64 = offset.parse().map_err(|_| Error::InvalidXref)?;
    let generation: u16 = generation.parse().map_err(|_| Error::InvalidXref)?;

    match flag {
        "n" => Ok(XRefEntry::uncompressed(offset, generation)),
        "f" => Ok(XRefEntry::free(offset, generation)),
        _ => Err(Error::InvalidXref),
    }
}

fn parse_xref_stream_at(data: &[u8], offset: u64) -> Result<CrossRefTable> {
    let start = usize::try_from(offset)
        .ok()
        .filter(|&o| o < data.len())
        .ok_or(Error::InvalidXref)?;
    parse_xref_stream(&data[start..], start)
}

/// Parse a `/Type /XRef` stream object.
///
/// Each row holds three big-endian fields whose widths come from `/W`:
/// type (0 free, 1 uncompressed, 2 compressed), then offset or object stream
/// number, then generation or index within the stream.
fn parse_xref_stream(section: &[u8], base_offset: usize) -> Result<CrossRefTable> {
    let (_, (_, obj)) = parse_indirect_object(section)
        .map_err(|e| crate::parser::to_parse_error(e, base_offset))?;

    let dict = match obj.as_dict() {
        Some(dict) if matches!(obj, Object::Stream { .. }) => dict.clone(),
        _ => return Err(Error::InvalidPdf("xref stream is not a stream object".to_string())),
    };
    if let Some(type_name) = dict.get("Type").and_then(Object::as_name) {
        if type_name != "XRef" {
            return Err(Error::InvalidPdf(format!("expected /Type /XRef, got /Type /{}", type_name)));
        }
    }

    let widths: Vec<usize> = dict
        .get("W")
        .and_then(Object::as_array)
        .map(|w| {
            w.iter()
                .filter_map(Object::as_integer)
                .filter(|&n| (0..=8).contains(&n))
                .map(|n| n as usize)
                .collect()
        })
        .unwrap_or_default();
    let [w1, w2, w3] = widths[..] else {
        return Err(Error::InvalidPdf("invalid /W array in xref stream".to_string()));
    };
    let entry_size = w1 + w2 + w3;
    if entry_size == 0 {
        return Err(Error::InvalidPdf("empty /W array in xref stream".to_string()));
    }

    let size = dict
        .get("Size")
        .and_then(Object::as_integer)
        .ok_or_else(|| Error::InvalidPdf("missing /Size in xref stream".to_string()))?;

    let ranges: Vec<(u32, u32)> = match dict.get("Index").and_then(Object::as_array) {
        Some(index) => index
            .chunks_exact(2)
            .map(|pair| match (pair[0].as_integer(), pair[1].as_integer()) {
                (Some(s), Some(c)) if s >= 0 && c >= 0 => Ok((s as u32, c as u32)),
                _ => Err(Error::InvalidPdf("invalid /Index in xref stream".to_string())),
            })
            .collect::<Result<_>>()?,
        None => vec![(0, size.max(0) as u32)],
    };

    let decoded = obj.decode_stream_data()?;
    let mut rows = decoded.chunks_exact(entry_size);
    let mut xref = CrossRefTable::new();

    for (start_obj, count) in ranges {
        for i in 0..count {
            let row = rows
                .next()
                .ok_or_else(|| Error::InvalidPdf("truncated xref stream data".to_string()))?;
            let entry_type = if w1 > 0 { read_int(&row[..w1]) } else { 1 };
            let field2 = read_int(&row[w1..w1 + w2]);
            let field3 = read_int(&row[w1 + w2..]);

            let entry = match entry_type {
                0 => XRefEntry::free(field2, field3 as u16),
                1 => XRefEntry::uncompressed(field2, field3 as u16),
                2 => XRefEntry::compressed(field2, field3 as u16),
                other => {
                    return Err(Error::InvalidPdf(format!("invalid xref entry type: {}", other)))
                },
            };
            xref.add_entry(start_obj + i, entry);
        }
    }

    xref.set_trailer(dict);
    Ok(xref)
}

fn read_int(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASSIC: &[u8] = b"%PDF-1.4\n\
xref\n\
0 3\n\
0000000000 65535 f \n\
0000000009 00000 n \n\
0000000058 00000 n \n\
trailer\n\
<< /Size 3 /Root 1 0 R >>\n\
startxref\n\
9\n\
%%EOF\n";

    #[test]
    fn test_find_xref_offset() {
        assert_eq!(find_xref_offset(CLASSIC).unwrap(), 9);
    }

    #[test]
    fn test_find_xref_offset_missing() {
        assert!(matches!(find_xref_offset(b"%PDF-1.4\n%%EOF"), Err(Error::InvalidXref)));
    }

    #[test]
    fn test_find_xref_offset_cr_line_endings() {
        assert_eq!(find_xref_offset(b"startxref\r1234\r%%EOF").unwrap(), 1234);
    }

    #[test]
    fn test_parse_traditional_xref() {
        let xref = parse_xref(CLASSIC, 9).unwrap();
        assert_eq!(xref.len(), 3);
        assert!(!xref.get(0).unwrap().in_use());
        assert_eq!(xref.get(1).unwrap(), &XRefEntry::uncompressed(9, 0));
        assert_eq!(xref.get(2).unwrap().offset, 58);
        let trailer = xref.trailer().unwrap();
        assert_eq!(trailer.get("Size").and_then(Object::as_integer), Some(3));
    }

    #[test]
    fn test_bad_xref_offset() {
        assert!(parse_xref(CLASSIC, 10_000).is_err());
        assert!(parse_xref(CLASSIC, 3).is_err());
    }

    #[test]
    fn test_prev_chain_newer_entries_win() {
        let mut pdf = b"%PDF-1.4\n".to_vec();
        let first = pdf.len();
        pdf.extend_from_slice(
            b"xref\n0 2\n0000000000 65535 f \n0000000100 00000 n \ntrailer\n<< /Size 2 >>\n",
        );
        let second = pdf.len();
        pdf.extend_from_slice(
            format!(
                "xref\n1 1\n0000000200 00000 n \ntrailer\n<< /Size 2 /Prev {} >>\n",
                first
            )
            .as_bytes(),
        );

        let xref = parse_xref(&pdf, second as u64).unwrap();
        assert_eq!(xref.get(1).unwrap().offset, 200);
        assert!(xref.get(0).is_some());
    }

    #[test]
    fn test_prev_cycle_is_bounded() {
        let mut pdf = b"%PDF-1.4\n".to_vec();
        let start = pdf.len();
        pdf.extend_from_slice(
            format!("xref\n0 1\n0000000000 65535 f \ntrailer\n<< /Size 1 /Prev {} >>\n", start)
                .as_bytes(),
        );
        assert!(matches!(parse_xref(&pdf, start as u64), Err(Error::InvalidPdf(_))));
    }

    #[test]
    fn test_parse_xref_stream() {
        // Rows: type 1 offset 15 gen 0; type 2 stream 5 index 3.
        let rows = [1u8, 0, 15, 0, 2, 0, 5, 3];
        let mut pdf = b"%PDF-1.5\n".to_vec();
        let offset = pdf.len();
        pdf.extend_from_slice(
            b"9 0 obj\n<< /Type /XRef /Size 3 /Index [1 2] /W [1 2 1] /Length 8 >>\nstream\n",
        );
        pdf.extend_from_slice(&rows);
        pdf.extend_from_slice(b"\nendstream\nendobj\n");

        let xref = parse_xref(&pdf, offset as u64).unwrap();
        assert_eq!(xref.get(1).unwrap(), &XRefEntry::uncompressed(15, 0));
        assert_eq!(xref.get(2).unwrap(), &XRefEntry::compressed(5, 3));
        assert!(xref.get(0).is_none());
    }

    #[test]
    fn test_read_int() {
        assert_eq!(read_int(&[0x01, 0x02]), 0x0102);
        assert_eq!(read_int(&[]), 0);
    }
}
