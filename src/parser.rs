//! PDF object parser.
//!
//! Recursive descent over lexer tokens: primitives, arrays, dictionaries,
//! indirect references, streams and complete `N G obj ... endobj` wrappers.
//! All functions return nom `IResult`s; callers convert failures into
//! [`Error::ParseError`] with the byte offset they were parsing at.

use crate::error::{Error, Result};
use crate::lexer::{token, Token};
use crate::object::{Dict, Object, ObjectRef};
use nom::IResult;

fn tag_error(input: &[u8]) -> nom::Err<nom::error::Error<&[u8]>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag))
}

fn eof_error(input: &[u8]) -> nom::Err<nom::error::Error<&[u8]>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Eof))
}

/// Decode escape sequences in a literal string body.
///
/// Handles `\n \r \t \b \f \( \) \\`, one to three digit octal escapes and
/// backslash line continuations. Unknown escapes drop the backslash.
///
/// ```
/// # use pdf_annotator::parser::decode_literal_string_escapes;
/// assert_eq!(decode_literal_string_escapes(b"caf\\351"), b"caf\xe9");
/// ```
pub fn decode_literal_string_escapes(raw: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        let c = raw[i];
        if c != b'\\' || i + 1 >= raw.len() {
            result.push(c);
            i += 1;
            continue;
        }

        let next = raw[i + 1];
        i += 2;
        match next {
            b'n' => result.push(b'\n'),
            b'r' => result.push(b'\r'),
            b't' => result.push(b'\t'),
            b'b' => result.push(0x08),
            b'f' => result.push(0x0C),
            b'\n' => {},
            b'\r' => {
                if raw.get(i) == Some(&b'\n') {
                    i += 1;
                }
            },
            b'0'..=b'7' => {
                let mut octal = u32::from(next - b'0');
                let mut digits = 1;
                while digits < 3 {
                    match raw.get(i) {
                        Some(&d @ b'0'..=b'7') => {
                            octal = octal * 8 + u32::from(d - b'0');
                            i += 1;
                            digits += 1;
                        },
                        _ => break,
                    }
                }
                result.push((octal & 0xFF) as u8);
            },
            other => result.push(other),
        }
    }

    result
}

/// Decode the body of a hex string; an odd trailing digit is padded with 0.
///
/// ```
/// # use pdf_annotator::parser::decode_hex;
/// assert_eq!(decode_hex(b"48 65 6C 6C 6F").unwrap(), b"Hello");
/// assert_eq!(decode_hex(b"7").unwrap(), vec![0x70]);
/// ```
pub fn decode_hex(hex_bytes: &[u8]) -> Result<Vec<u8>> {
    let digits: Vec<u8> = hex_bytes
        .iter()
        .copied()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let nibble = |c: u8| -> Result<u8> {
        (c as char)
            .to_digit(16)
            .map(|d| d as u8)
            .ok_or_else(|| Error::ParseError {
                offset: 0,
                reason: format!("Invalid hex digit: {:?}", c as char),
            })
    };

    digits
        .chunks(2)
        .map(|pair| {
            let high = nibble(pair[0])?;
            let low = match pair.get(1) {
                Some(&c) => nibble(c)?,
                None => 0,
            };
            Ok(high << 4 | low)
        })
        .collect()
}

/// Parse one PDF object.
///
/// ```
/// use pdf_annotator::parser::parse_object;
///
/// let (_, obj) = parse_object(b"<< /Subtype /Text /Open false >>").unwrap();
/// assert_eq!(obj.as_dict().unwrap()["Subtype"].as_name(), Some("Text"));
/// ```
pub fn parse_object(input: &[u8]) -> IResult<&[u8], Object> {
    let (rest, tok) = token(input)?;

    match tok {
        Token::Null => Ok((rest, Object::Null)),
        Token::True => Ok((rest, Object::Boolean(true))),
        Token::False => Ok((rest, Object::Boolean(false))),
        Token::Integer(i) => {
            // "id gen R" is a reference; anything else leaves the integer alone.
            if let Ok((after_gen, Token::Integer(gen))) = token(rest) {
                if let Ok((after_r, Token::R)) = token(after_gen) {
                    if (0..=u32::MAX as i64).contains(&i) && (0..=u16::MAX as i64).contains(&gen) {
                        return Ok((after_r, Object::Reference(ObjectRef::new(i as u32, gen as u16))));
                    }
                }
            }
            Ok((rest, Object::Integer(i)))
        },
        Token::Real(r) => Ok((rest, Object::Real(r))),
        Token::LiteralString(raw) => Ok((rest, Object::String(decode_literal_string_escapes(raw)))),
        Token::HexString(raw) => match decode_hex(raw) {
            Ok(bytes) => Ok((rest, Object::String(bytes))),
            Err(_) => Err(nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::HexDigit,
            ))),
        },
        Token::Name(name) => Ok((rest, Object::Name(name))),
        Token::ArrayStart => parse_array(rest),
        Token::DictStart => {
            let (after_dict, dict) = parse_dictionary(rest)?;
            match token(after_dict) {
                Ok((stream_input, Token::StreamStart)) => {
                    let (after_stream, data) = parse_stream_data(stream_input, &dict)?;
                    Ok((
                        after_stream,
                        Object::Stream {
                            dict,
                            data: bytes::Bytes::copy_from_slice(data),
                        },
                    ))
                },
                _ => Ok((after_dict, Object::Dictionary(dict))),
            }
        },
        _ => Err(tag_error(input)),
    }
}

/// Stream payload after the `stream` keyword, up to and including `endstream`.
///
/// A direct `/Length` is trusted when `endstream` follows it; otherwise the
/// payload runs to the next `endstream` keyword.
fn parse_stream_data<'a>(input: &'a [u8], dict: &Dict) -> IResult<&'a [u8], &'a [u8]> {
    let input = if input.starts_with(b"\r\n") {
        &input[2..]
    } else if input.starts_with(b"\n") || input.starts_with(b"\r") {
        &input[1..]
    } else {
        input
    };

    if let Some(length) = dict.get("Length").and_then(|l| l.as_integer()) {
        let length = usize::try_from(length).unwrap_or(usize::MAX);
        if length <= input.len() {
            if let Ok((after, Token::StreamEnd)) = token(&input[length..]) {
                return Ok((after, &input[..length]));
            }
        }
        log::debug!("Stream /Length {} does not land on endstream, scanning", length);
    }

    let pos = find_keyword(input, b"endstream").ok_or_else(|| eof_error(input))?;
    let mut data = &input[..pos];
    // The EOL before endstream belongs to the syntax, not the data.
    if data.ends_with(b"\r\n") {
        data = &data[..data.len() - 2];
    } else if data.ends_with(b"\n") || data.ends_with(b"\r") {
        data = &data[..data.len() - 1];
    }
    Ok((&input[pos + b"endstream".len()..], data))
}

pub(crate) fn find_keyword(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn parse_array(input: &[u8]) -> IResult<&[u8], Object> {
    let mut items = Vec::new();
    let mut remaining = input;

    loop {
        match token(remaining) {
            Ok((rest, Token::ArrayEnd)) => return Ok((rest, Object::Array(items))),
            Ok(_) => {
                let (rest, item) = parse_object(remaining)?;
                items.push(item);
                remaining = rest;
            },
            Err(_) if crate::lexer::skip_ws(remaining).is_empty() => {
                return Err(eof_error(remaining));
            },
            Err(e) => return Err(e),
        }
    }
}

fn parse_dictionary(input: &[u8]) -> IResult<&[u8], Dict> {
    let mut dict = Dict::new();
    let mut remaining = input;

    loop {
        match token(remaining) {
            Ok((rest, Token::DictEnd)) => return Ok((rest, dict)),
            Ok((rest, Token::Name(key))) => {
                let (rest, value) = parse_object(rest)?;
                // A null value is equivalent to an absent key.
                if !value.is_null() {
                    dict.insert(key, value);
                }
                remaining = rest;
            },
            Ok(_) => return Err(tag_error(remaining)),
            Err(_) if crate::lexer::skip_ws(remaining).is_empty() => {
                return Err(eof_error(remaining));
            },
            Err(e) => return Err(e),
        }
    }
}

/// Parse an indirect object `id gen obj <object> endobj`.
///
/// A missing `endobj` is tolerated; the object body must still be complete.
pub fn parse_indirect_object(input: &[u8]) -> IResult<&[u8], (ObjectRef, Object)> {
    let (rest, id) = match token(input)? {
        (rest, Token::Integer(id)) if id >= 0 => (rest, id),
        _ => return Err(tag_error(input)),
    };
    let (rest, gen) = match token(rest)? {
        (rest, Token::Integer(gen)) if (0..=u16::MAX as i64).contains(&gen) => (rest, gen),
        _ => return Err(tag_error(input)),
    };
    let rest = match token(rest)? {
        (rest, Token::ObjStart) => rest,
        _ => return Err(tag_error(input)),
    };

    let (rest, object) = parse_object(rest)?;
    let rest = match token(rest) {
        Ok((after, Token::ObjEnd)) => after,
        _ => rest,
    };

    Ok((rest, (ObjectRef::new(id as u32, gen as u16), object)))
}

/// Convert a nom failure into a crate error at `offset`.
pub(crate) fn to_parse_error(err: nom::Err<nom::error::Error<&[u8]>>, offset: usize) -> Error {
    let reason = match err {
        nom::Err::Incomplete(_) => "incomplete input".to_string(),
        nom::Err::Error(e) | nom::Err::Failure(e) => match e.code {
            nom::error::ErrorKind::Eof => "unexpected end of data".to_string(),
            nom::error::ErrorKind::HexDigit => "invalid hex string".to_string(),
            code => format!("unexpected syntax ({:?})", code),
        },
    };
    Error::ParseError { offset, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &[u8]) -> Object {
        parse_object(input).unwrap().1
    }

    // ========================================================================
    // Primitives
    // ========================================================================

    #[test]
    fn test_parse_primitives() {
        assert_eq!(parse(b"null"), Object::Null);
        assert_eq!(parse(b"true"), Object::Boolean(true));
        assert_eq!(parse(b"-17"), Object::Integer(-17));
        assert_eq!(parse(b"0.8"), Object::Real(0.8));
        assert_eq!(parse(b"/Comment"), Object::Name("Comment".into()));
    }

    #[test]
    fn test_parse_literal_string_escapes() {
        assert_eq!(parse(br"(a\(b\)c)"), Object::String(b"a(b)c".to_vec()));
        assert_eq!(parse(br"(line\nbreak)"), Object::String(b"line\nbreak".to_vec()));
        assert_eq!(parse(b"(\\101\\102)"), Object::String(b"AB".to_vec()));
        assert_eq!(parse(b"(split \\\nline)"), Object::String(b"split line".to_vec()));
    }

    #[test]
    fn test_octal_escape_stops_at_non_octal() {
        assert_eq!(decode_literal_string_escapes(b"\\0538"), vec![0o53, b'8']);
    }

    #[test]
    fn test_parse_hex_string() {
        assert_eq!(parse(b"<FEFF0048>"), Object::String(vec![0xFE, 0xFF, 0x00, 0x48]));
        assert_eq!(parse(b"<>"), Object::String(Vec::new()));
    }

    // ========================================================================
    // References and composites
    // ========================================================================

    #[test]
    fn test_parse_reference() {
        assert_eq!(parse(b"12 0 R"), Object::Reference(ObjectRef::new(12, 0)));
    }

    #[test]
    fn test_integer_followed_by_integer_is_not_reference() {
        let (rest, obj) = parse_object(b"12 0 obj").unwrap();
        assert_eq!(obj, Object::Integer(12));
        assert_eq!(rest, b" 0 obj");
    }

    #[test]
    fn test_parse_array_mixed() {
        let obj = parse(b"[1 0.5 /Name (s) 3 0 R [2]]");
        let arr = obj.as_array().unwrap();
        assert_eq!(arr.len(), 6);
        assert_eq!(arr[4], Object::Reference(ObjectRef::new(3, 0)));
        assert_eq!(arr[5], Object::Array(vec![Object::Integer(2)]));
    }

    #[test]
    fn test_parse_nested_dictionary() {
        let obj = parse(b"<< /Type /Annot /C [1 1 0.8] /AP << /N 9 0 R >> >>");
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict["Type"].as_name(), Some("Annot"));
        assert_eq!(dict["C"].as_array().unwrap().len(), 3);
        assert!(dict["AP"].as_dict().unwrap().contains_key("N"));
    }

    #[test]
    fn test_null_dictionary_value_is_dropped() {
        let obj = parse(b"<< /T null /Contents (x) >>");
        let dict = obj.as_dict().unwrap();
        assert!(!dict.contains_key("T"));
        assert!(dict.contains_key("Contents"));
    }

    #[test]
    fn test_unclosed_containers_fail() {
        assert!(parse_object(b"[1 2").is_err());
        assert!(parse_object(b"<< /Type /Page").is_err());
    }

    #[test]
    fn test_non_name_key_fails() {
        assert!(parse_object(b"<< 1 2 >>").is_err());
    }

    // ========================================================================
    // Streams and indirect objects
    // ========================================================================

    #[test]
    fn test_parse_stream_with_length() {
        let obj = parse(b"<< /Length 5 >>\nstream\nhello\nendstream");
        match obj {
            Object::Stream { data, .. } => assert_eq!(&data[..], b"hello"),
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_stream_with_indirect_length() {
        let obj = parse(b"<< /Length 8 0 R >>\r\nstream\r\nbinary\x00data\r\nendstream");
        match obj {
            Object::Stream { data, .. } => assert_eq!(&data[..], b"binary\x00data"),
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_indirect_object() {
        let (rest, (obj_ref, obj)) =
            parse_indirect_object(b"4 0 obj\n<< /Type /Page >>\nendobj\n5 0 obj").unwrap();
        assert_eq!(obj_ref, ObjectRef::new(4, 0));
        assert_eq!(obj.as_dict().unwrap()["Type"].as_name(), Some("Page"));
        assert!(rest.starts_with(b"\n5 0 obj"));
    }

    #[test]
    fn test_parse_indirect_object_requires_header() {
        assert!(parse_indirect_object(b"<< /Type /Page >>").is_err());
    }

    #[test]
    fn test_to_parse_error_keeps_offset() {
        let err = parse_object(b"[1").unwrap_err();
        match to_parse_error(err, 77) {
            Error::ParseError { offset, .. } => assert_eq!(offset, 77),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
