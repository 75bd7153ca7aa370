//! Request and response values exchanged with the route handler.

use std::collections::HashMap;
use std::io::{self, Write};

use crate::json;

/// Content type used for every JSON body the endpoint produces.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// One framed HTTP request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl HttpRequest {
    /// Builds a request with no headers and an empty body.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Adds a header. Names are stored lower-cased and values trimmed; a
    /// repeated name replaces the earlier value.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.insert_header(name, value);
        self
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub(crate) fn insert_header(&mut self, name: &str, value: &str) {
        self.headers
            .insert(json::trim(name).to_ascii_lowercase(), json::trim(value).to_owned());
    }

    /// Request method exactly as sent (`POST`, `GET`, ...).
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request target exactly as sent.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Looks up a header case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// All headers, keyed by lower-cased name.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Response produced by a route handler.
///
/// A response without a body (`202 Accepted` for notifications) is distinct
/// from one with an empty body: the former omits `Content-Type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// `Content-Type` sent when a body is present.
    pub content_type: String,
    /// Body text, if any.
    pub body: Option<String>,
}

impl HttpResponse {
    /// Builds a JSON response.
    #[must_use]
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: JSON_CONTENT_TYPE.to_owned(),
            body: Some(body.into()),
        }
    }

    /// Builds a `202 Accepted` response with no body.
    #[must_use]
    pub fn accepted() -> Self {
        Self {
            status: 202,
            content_type: JSON_CONTENT_TYPE.to_owned(),
            body: None,
        }
    }

    /// Builds a plain `{"error": ...}` JSON body with `status`.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, format!("{{\"error\":\"{}\"}}", json::escape(message)))
    }

    /// Reports whether the response carries a body.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Body text, if any.
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Serialises the response with `Connection: close` framing.
    pub(crate) fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\nConnection: close\r\n",
            self.status,
            reason_phrase(self.status)
        );
        if self.has_body() {
            head.push_str(&format!("Content-Type: {}\r\n", self.content_type));
        }
        let length = self.body.as_deref().map_or(0, str::len);
        head.push_str(&format!("Content-Length: {length}\r\n\r\n"));

        writer.write_all(head.as_bytes())?;
        if let Some(body) = self.body.as_deref() {
            writer.write_all(body.as_bytes())?;
        }
        writer.flush()
    }
}

/// Reason phrase for the status codes the endpoint emits.
#[must_use]
pub const fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        202 => "Accepted",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Error",
    }
}
