//! Error types for composing and reading annotated PDFs.
//!
//! Every failure surfaced by the crate is an [`Error`]. Callers that only care
//! about the broad category (unreadable image, filesystem problem, malformed
//! PDF, refused request) use [`Error::kind`].

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Name used for composition and extraction failures at the API boundary.
pub type DocumentError = Error;

/// Broad failure categories reported to the interactive layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An input image could not be decoded, or its content cannot be placed on a page.
    Decode,
    /// A filesystem read, write or directory creation failed.
    Io,
    /// An existing PDF is malformed or unreadable.
    Parse,
    /// The request was refused before any work was done.
    Rejected,
}

/// Error types that can occur while composing or extracting.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// Image bytes could not be decoded
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Caption text cannot be shown with the selected font
    #[error("Font error: {0}")]
    Font(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid PDF header (expected '%PDF-')
    #[error("Invalid PDF header: {0}")]
    InvalidHeader(String),

    /// Parse error at specific byte offset
    #[error("Failed to parse object at byte {offset}: {reason}")]
    ParseError {
        /// Byte offset where error occurred
        offset: usize,
        /// Reason for parse failure
        reason: String,
    },

    /// Invalid cross-reference table
    #[error("Invalid cross-reference table")]
    InvalidXref,

    /// Referenced object not found in cross-reference table
    #[error("Object not found: {0} {1} R")]
    ObjectNotFound(u32, u16),

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Unexpected end of file
    #[error("End of file reached unexpectedly")]
    UnexpectedEof,

    /// Invalid PDF structure (generic)
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// Stream decoding error
    #[error("Stream decoding error: {0}")]
    StreamDecode(String),

    /// Unsupported stream filter
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Circular reference detected in object graph
    #[error("Circular reference detected: object {0}")]
    CircularReference(crate::object::ObjectRef),

    /// Recursion depth limit exceeded
    #[error("Recursion depth limit exceeded (max: {0})")]
    RecursionLimitExceeded(u32),

    /// A compose request arrived without any image
    #[error("No images provided")]
    NoImages,

    /// Fewer (or more) images survived caching than the batch requires
    #[error("Expected {expected} images but processed {actual}")]
    ImageCount {
        /// Required number of images
        expected: usize,
        /// Number of images actually processed
        actual: usize,
    },

    /// An incoming document was not recognised as a PDF
    #[error("Not a PDF document: {0}")]
    NotPdf(String),

    /// An incoming document is not a local file
    #[error("Cannot open {0}: only local files are supported")]
    UnsupportedLocation(String),

    /// A request is already queued or running
    #[error("Another request is still in progress")]
    Busy,

    /// The background worker is no longer accepting work
    #[error("Worker has stopped")]
    WorkerStopped,
}

impl Error {
    /// Classify this error into the reported taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Decode(_) | Error::Font(_) => ErrorKind::Decode,
            Error::Io(_) => ErrorKind::Io,
            Error::InvalidHeader(_)
            | Error::ParseError { .. }
            | Error::InvalidXref
            | Error::ObjectNotFound(..)
            | Error::InvalidObjectType { .. }
            | Error::UnexpectedEof
            | Error::InvalidPdf(_)
            | Error::StreamDecode(_)
            | Error::UnsupportedFilter(_)
            | Error::CircularReference(_)
            | Error::RecursionLimitExceeded(_) => ErrorKind::Parse,
            Error::NoImages
            | Error::ImageCount { .. }
            | Error::NotPdf(_)
            | Error::UnsupportedLocation(_)
            | Error::Busy
            | Error::WorkerStopped => ErrorKind::Rejected,
        }
    }

    /// The single message string shown to the user.
    pub fn user_message(&self) -> String {
        format!("Error: {}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_count_message() {
        let err = Error::ImageCount {
            expected: 5,
            actual: 3,
        };
        assert_eq!(err.user_message(), "Error: Expected 5 images but processed 3");
        assert_eq!(err.kind(), ErrorKind::Rejected);
    }

    #[test]
    fn test_parse_error() {
        let err = Error::ParseError {
            offset: 1234,
            reason: "invalid token".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("1234"));
        assert!(msg.contains("invalid token"));
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_object_not_found_error() {
        let err = Error::ObjectNotFound(10, 0);
        assert!(format!("{}", err).contains("10 0 R"));
    }

    #[test]
    fn test_io_error_kind() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.user_message().starts_with("Error: IO error"));
    }

    #[test]
    fn test_decode_kinds() {
        assert_eq!(Error::Decode("bad jpeg".into()).kind(), ErrorKind::Decode);
        assert_eq!(Error::Font("no glyph".into()).kind(), ErrorKind::Decode);
        assert_eq!(Error::NoImages.user_message(), "Error: No images provided");
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
