//! Object stream parsing (PDF 1.5+).
//!
//! Object streams (`/Type /ObjStm`) pack several objects into one
//! compressed stream. The decoded data starts with `/N` pairs of integers
//! (object number, offset relative to `/First`), followed by the objects.
//!
//! ```text
//! 10 0 11 15        % object 10 at First+0, object 11 at First+15
//! << /Type /Annot >> [1 2 3]
//! ```

use crate::error::{Error, Result};
use crate::lexer::{token, Token};
use crate::object::Object;
use crate::parser::parse_object;
use std::collections::HashMap;

/// Upper bound on `/N`, well beyond anything a real producer writes.
const MAX_OBJECTS_PER_STREAM: i64 = 1_000_000;

/// Parse an object stream into its contained objects, keyed by object number.
///
/// # Errors
///
/// Fails when `stream_obj` is not an object stream, when `/N` or `/First`
/// are missing or out of range, or when any contained object is malformed.
pub fn parse_object_stream(stream_obj: &Object) -> Result<HashMap<u32, Object>> {
    let dict = match stream_obj {
        Object::Stream { dict, .. } => dict,
        _ => return Err(Error::InvalidPdf("object stream is not a Stream object".to_string())),
    };

    if let Some(type_name) = dict.get("Type").and_then(Object::as_name) {
        if type_name != "ObjStm" {
            return Err(Error::InvalidPdf(format!("expected /Type /ObjStm, got /Type /{}", type_name)));
        }
    }

    let n = dict
        .get("N")
        .and_then(Object::as_integer)
        .filter(|n| (0..=MAX_OBJECTS_PER_STREAM).contains(n))
        .ok_or_else(|| Error::InvalidPdf("object stream missing or invalid /N".to_string()))?;
    let first = dict
        .get("First")
        .and_then(Object::as_integer)
        .filter(|&f| f >= 0)
        .ok_or_else(|| Error::InvalidPdf("object stream missing or invalid /First".to_string()))?
        as usize;

    let data = stream_obj.decode_stream_data()?;
    if first > data.len() {
        return Err(Error::InvalidPdf(format!(
            "object stream /First {} beyond data length {}",
            first,
            data.len()
        )));
    }

    let header = read_header(&data[..first], n as usize)?;
    let mut objects = HashMap::with_capacity(header.len());

    for (obj_num, rel_offset) in header {
        let start = first + rel_offset;
        let body = data.get(start..).ok_or_else(|| {
            Error::InvalidPdf(format!("object {} offset {} outside object stream", obj_num, start))
        })?;
        let (_, obj) = parse_object(body).map_err(|e| crate::parser::to_parse_error(e, start))?;
        objects.insert(obj_num, obj);
    }

    log::debug!("Parsed {} objects from object stream", objects.len());
    Ok(objects)
}

fn read_header(mut input: &[u8], count: usize) -> Result<Vec<(u32, usize)>> {
    let mut pairs = Vec::with_capacity(count);

    for _ in 0..count {
        let mut next_int = || -> Result<i64> {
            match token(input) {
                Ok((rest, Token::Integer(value))) if value >= 0 => {
                    input = rest;
                    Ok(value)
                },
                _ => Err(Error::InvalidPdf("malformed object stream header".to_string())),
            }
        };
        let obj_num = next_int()?;
        let offset = next_int()?;
        let obj_num = u32::try_from(obj_num)
            .map_err(|_| Error::InvalidPdf(format!("object number {} out of range", obj_num)))?;
        pairs.push((obj_num, offset as usize));
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Dict;

    fn objstm(n: i64, first: i64, data: &[u8]) -> Object {
        let mut dict = Dict::new();
        dict.insert("Type".to_string(), Object::Name("ObjStm".to_string()));
        dict.insert("N".to_string(), Object::Integer(n));
        dict.insert("First".to_string(), Object::Integer(first));
        Object::Stream {
            dict,
            data: bytes::Bytes::copy_from_slice(data),
        }
    }

    #[test]
    fn test_parse_object_stream() {
        let stream = objstm(2, 10, b"10 0 11 18<< /Type /Annot >> [1 2 3]");
        let objects = parse_object_stream(&stream).unwrap();

        assert_eq!(objects.len(), 2);
        assert_eq!(objects[&10].as_dict().unwrap()["Type"].as_name(), Some("Annot"));
        assert_eq!(objects[&11].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_rejects_wrong_type() {
        let mut stream = objstm(0, 0, b"");
        if let Object::Stream { dict, .. } = &mut stream {
            dict.insert("Type".to_string(), Object::Name("XRef".to_string()));
        }
        assert!(parse_object_stream(&stream).is_err());
    }

    #[test]
    fn test_rejects_missing_n() {
        let mut stream = objstm(1, 4, b"1 0 null");
        if let Object::Stream { dict, .. } = &mut stream {
            dict.remove("N");
        }
        assert!(parse_object_stream(&stream).is_err());
    }

    #[test]
    fn test_first_beyond_data() {
        assert!(parse_object_stream(&objstm(1, 50, b"1 0 null")).is_err());
    }

    #[test]
    fn test_truncated_header() {
        assert!(parse_object_stream(&objstm(2, 4, b"1 0 null")).is_err());
    }

    #[test]
    fn test_not_a_stream() {
        assert!(parse_object_stream(&Object::Null).is_err());
    }
}
