//! Flat JSON object-field extraction.
//!
//! [`FieldMap::parse`] walks one JSON object and records each member's value
//! as the verbatim source substring. Nested values are validated structurally
//! but never materialised; callers that need an inner object re-run the
//! extractor on the raw value with [`FieldMap::object_field`]. This keeps the
//! wire layer free of a general-purpose document model.

mod errors;
mod scanner;
mod text;

use std::collections::HashMap;

pub use self::errors::JsonError;
pub use self::scanner::MAX_NESTING_DEPTH;
pub use self::text::{escape, is_null, trim};

use self::scanner::Scanner;

/// Members of one JSON object, keyed by decoded name, holding raw value text.
///
/// Duplicate keys keep the last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: HashMap<String, String>,
}

impl FieldMap {
    /// Extracts the members of the object in `text`.
    ///
    /// Leading and trailing whitespace is allowed; anything else outside the
    /// object is rejected. Failure never yields a partial map.
    ///
    /// # Errors
    ///
    /// Returns a [`JsonError`] describing the first structural problem found.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbgx_mcp::json::FieldMap;
    ///
    /// let fields = FieldMap::parse(r#"{"id": 7, "params": {"a": [1, 2]}}"#)?;
    /// assert_eq!(fields.raw_field("params"), Some(r#"{"a": [1, 2]}"#));
    /// # Ok::<(), dbgx_mcp::json::JsonError>(())
    /// ```
    pub fn parse(text: &str) -> Result<Self, JsonError> {
        let mut scanner = Scanner::new(text);
        let mut fields = HashMap::new();

        scanner.skip_whitespace();
        if !scanner.eat(b'{') {
            return Err(JsonError::NotAnObject);
        }
        scanner.skip_whitespace();
        if scanner.eat(b'}') {
            return finish(&mut scanner, fields);
        }

        while !scanner.is_at_end() {
            let key = scanner.parse_string()?;
            scanner.skip_whitespace();
            if !scanner.eat(b':') {
                return Err(JsonError::ExpectedColon {
                    offset: scanner.position(),
                });
            }
            scanner.skip_whitespace();

            let value_start = scanner.position();
            scanner.skip_value(0)?;
            let raw = scanner.slice(value_start, scanner.position());
            fields.insert(key, raw.to_owned());

            scanner.skip_whitespace();
            match scanner.peek() {
                None => return Err(JsonError::UnterminatedObject),
                Some(b',') => {
                    scanner.eat(b',');
                    scanner.skip_whitespace();
                }
                Some(b'}') => {
                    scanner.eat(b'}');
                    return finish(&mut scanner, fields);
                }
                Some(_) => {
                    return Err(JsonError::ExpectedObjectSeparator {
                        offset: scanner.position(),
                    });
                }
            }
        }
        Err(JsonError::UnterminatedObject)
    }

    /// Extracts members from raw bytes, rejecting invalid UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError::InvalidUtf8`] for undecodable input, otherwise the
    /// same errors as [`FieldMap::parse`].
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, JsonError> {
        let text = std::str::from_utf8(bytes).map_err(|error| JsonError::InvalidUtf8 {
            valid_up_to: error.valid_up_to(),
        })?;
        Self::parse(text)
    }

    /// Decodes `key` as a JSON string.
    ///
    /// Returns `None` when the key is absent or its value is not exactly one
    /// string.
    #[must_use]
    pub fn string_field(&self, key: &str) -> Option<String> {
        let raw = self.fields.get(key)?;
        let mut scanner = Scanner::new(raw);
        let decoded = scanner.parse_string().ok()?;
        scanner.skip_whitespace();
        scanner.is_at_end().then_some(decoded)
    }

    /// Extracts the members of the object stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError::MissingField`] when the key is absent and
    /// [`JsonError::FieldNotObject`] when its value is not an object.
    pub fn object_field(&self, key: &str) -> Result<Self, JsonError> {
        let raw = self.fields.get(key).ok_or_else(|| JsonError::MissingField {
            key: key.to_owned(),
        })?;
        Self::parse(raw).map_err(|source| JsonError::FieldNotObject {
            key: key.to_owned(),
            source: Box::new(source),
        })
    }

    /// Returns the trimmed raw text of `key`'s value, unmodified otherwise.
    #[must_use]
    pub fn raw_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(|raw| trim(raw))
    }

    /// Reports whether `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of distinct members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Reports whether the object had no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over member names in unspecified order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

fn finish(scanner: &mut Scanner<'_>, fields: HashMap<String, String>) -> Result<FieldMap, JsonError> {
    scanner.skip_whitespace();
    if scanner.is_at_end() {
        Ok(FieldMap { fields })
    } else {
        Err(JsonError::TrailingContent {
            offset: scanner.position(),
        })
    }
}
