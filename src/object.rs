//! PDF object model shared by the writer and the reader.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// A PDF dictionary.
pub type Dict = HashMap<String, Object>;

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array)
    String(Vec<u8>),
    /// Name (without the leading /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (key-value pairs)
    Dictionary(Dict),
    /// Stream (dictionary + raw, still-encoded data)
    Stream {
        /// Stream dictionary
        dict: Dict,
        /// Stream data
        data: bytes::Bytes,
    },
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

impl Object {
    /// Human-readable type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream { .. } => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value of an integer or real.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Dictionary of a dictionary or a stream.
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Raw bytes of a string object.
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check if object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Decode stream data using the filters named in the stream dictionary.
    ///
    /// # Errors
    ///
    /// Fails when this is not a stream, when a filter is unsupported, or when
    /// the encoded data is corrupt.
    pub fn decode_stream_data(&self) -> Result<Vec<u8>> {
        match self {
            Object::Stream { dict, data } => {
                let filters = dict
                    .get("Filter")
                    .map(extract_filter_names)
                    .unwrap_or_default();

                if filters.is_empty() {
                    return Ok(data.to_vec());
                }

                let decode_params = extract_decode_params(dict.get("DecodeParms"));
                crate::decoders::decode_stream_with_params(data, &filters, decode_params.as_ref())
            },
            _ => Err(Error::InvalidObjectType {
                expected: "Stream".to_string(),
                found: self.type_name().to_string(),
            }),
        }
    }
}

/// Filter names from a `/Filter` entry (single name or array of names).
fn extract_filter_names(filter_obj: &Object) -> Vec<String> {
    match filter_obj {
        Object::Name(name) => vec![name.clone()],
        Object::Array(arr) => arr
            .iter()
            .filter_map(|obj| obj.as_name().map(|s| s.to_string()))
            .collect(),
        _ => vec![],
    }
}

/// Predictor parameters from a `/DecodeParms` dictionary, or the first
/// dictionary of a `/DecodeParms` array.
pub(crate) fn extract_decode_params(
    params_obj: Option<&Object>,
) -> Option<crate::decoders::DecodeParams> {
    let dict = match params_obj? {
        Object::Dictionary(d) => d,
        Object::Array(arr) => arr.iter().filter_map(|obj| obj.as_dict()).next()?,
        _ => return None,
    };

    let int_or = |key: &str, default: i64| {
        dict.get(key)
            .and_then(|obj| obj.as_integer())
            .unwrap_or(default)
    };

    Some(crate::decoders::DecodeParams {
        predictor: int_or("Predictor", 1),
        columns: int_or("Columns", 1).max(1) as usize,
        colors: int_or("Colors", 1).max(1) as usize,
        bits_per_component: int_or("BitsPerComponent", 8).max(1) as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_accessors() {
        assert_eq!(Object::Integer(42).as_integer(), Some(42));
        assert_eq!(Object::Name("Type".into()).as_name(), Some("Type"));
        assert_eq!(Object::Boolean(false).as_bool(), Some(false));
        assert_eq!(Object::String(b"hi".to_vec()).as_string(), Some(&b"hi"[..]));
        assert!(Object::Null.is_null());
        assert_eq!(Object::Integer(1).as_name(), None);
    }

    #[test]
    fn test_as_number_accepts_integer_and_real() {
        assert_eq!(Object::Integer(12).as_number(), Some(12.0));
        assert_eq!(Object::Real(0.8).as_number(), Some(0.8));
        assert_eq!(Object::Name("x".into()).as_number(), None);
    }

    #[test]
    fn test_stream_dict_access() {
        let mut dict = Dict::new();
        dict.insert("Length".to_string(), Object::Integer(3));
        let stream = Object::Stream {
            dict,
            data: bytes::Bytes::from_static(b"abc"),
        };
        assert_eq!(
            stream
                .as_dict()
                .and_then(|d| d.get("Length"))
                .and_then(|l| l.as_integer()),
            Some(3)
        );
    }

    #[test]
    fn test_object_ref_display() {
        assert_eq!(ObjectRef::new(12, 0).to_string(), "12 0 R");
    }

    #[test]
    fn test_decode_stream_no_filter() {
        let stream = Object::Stream {
            dict: Dict::new(),
            data: bytes::Bytes::from_static(b"plain"),
        };
        assert_eq!(stream.decode_stream_data().unwrap(), b"plain");
    }

    #[test]
    fn test_decode_stream_flate() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"1 0 obj").unwrap();
        let compressed = encoder.finish().unwrap();

        let mut dict = Dict::new();
        dict.insert(
            "Filter".to_string(),
            Object::Array(vec![Object::Name("FlateDecode".into())]),
        );
        let stream = Object::Stream {
            dict,
            data: bytes::Bytes::from(compressed),
        };
        assert_eq!(stream.decode_stream_data().unwrap(), b"1 0 obj");
    }

    #[test]
    fn test_decode_stream_not_a_stream() {
        let result = Object::Integer(1).decode_stream_data();
        assert!(matches!(result, Err(Error::InvalidObjectType { .. })));
    }

    #[test]
    fn test_extract_decode_params_from_array() {
        let mut parms = Dict::new();
        parms.insert("Predictor".to_string(), Object::Integer(12));
        parms.insert("Columns".to_string(), Object::Integer(5));
        let params =
            extract_decode_params(Some(&Object::Array(vec![Object::Null, Object::Dictionary(parms)])))
                .unwrap();
        assert_eq!(params.predictor, 12);
        assert_eq!(params.columns, 5);
        assert_eq!(params.colors, 1);
        assert_eq!(params.bits_per_component, 8);
    }
}
