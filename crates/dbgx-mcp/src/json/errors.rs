//! Error types for the field extractor.

use thiserror::Error;

/// Failures reported while extracting fields from JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsonError {
    /// The input bytes are not valid UTF-8.
    #[error("body is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 {
        /// Length of the longest valid UTF-8 prefix.
        valid_up_to: usize,
    },
    /// The top-level value is not an object.
    #[error("top-level JSON value must be an object")]
    NotAnObject,
    /// Non-whitespace content follows the closing brace.
    #[error("unexpected trailing content at offset {offset}")]
    TrailingContent {
        /// Byte offset of the first trailing byte.
        offset: usize,
    },
    /// An object key is not followed by a colon.
    #[error("expected ':' after key at offset {offset}")]
    ExpectedColon {
        /// Byte offset where the colon was expected.
        offset: usize,
    },
    /// An object member is followed by something other than `,` or `}`.
    #[error("expected ',' or '}}' at offset {offset}")]
    ExpectedObjectSeparator {
        /// Byte offset of the offending byte.
        offset: usize,
    },
    /// An array element is followed by something other than `,` or `]`.
    #[error("expected ',' or ']' in array at offset {offset}")]
    ExpectedArraySeparator {
        /// Byte offset of the offending byte.
        offset: usize,
    },
    /// Input ended inside an object.
    #[error("unterminated object")]
    UnterminatedObject,
    /// Input ended inside an array.
    #[error("unterminated array")]
    UnterminatedArray,
    /// A string was required but the next byte is not a quote.
    #[error("expected JSON string at offset {offset}")]
    ExpectedString {
        /// Byte offset where the string was expected.
        offset: usize,
    },
    /// Input ended directly after a backslash.
    #[error("unterminated escape sequence")]
    UnterminatedEscape,
    /// A `\u` escape is truncated or contains non-hex digits.
    #[error("invalid unicode escape at offset {offset}")]
    InvalidUnicodeEscape {
        /// Byte offset of the escape's first hex digit.
        offset: usize,
    },
    /// A backslash is followed by an unknown escape letter.
    #[error("unsupported escape sequence '\\{escape}'")]
    UnsupportedEscape {
        /// Character following the backslash.
        escape: char,
    },
    /// A raw control character appears inside a string.
    #[error("control character is not allowed in JSON string (offset {offset})")]
    ControlCharacter {
        /// Byte offset of the control character.
        offset: usize,
    },
    /// Input ended inside a string.
    #[error("unterminated JSON string")]
    UnterminatedString,
    /// A value was required but none is present.
    #[error("expected JSON value at offset {offset}")]
    ExpectedValue {
        /// Byte offset where the value was expected.
        offset: usize,
    },
    /// Nested objects or arrays exceed the supported depth.
    #[error("JSON nesting exceeds {limit} levels")]
    TooDeep {
        /// Maximum supported nesting depth.
        limit: usize,
    },
    /// The requested field is absent.
    #[error("field '{key}' is missing")]
    MissingField {
        /// Name of the missing field.
        key: String,
    },
    /// The requested field exists but does not hold an object.
    #[error("field '{key}' is not an object: {source}")]
    FieldNotObject {
        /// Name of the offending field.
        key: String,
        /// Parse failure for the field's raw value.
        #[source]
        source: Box<JsonError>,
    },
}
