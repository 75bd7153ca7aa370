//! Reads exactly one HTTP/1.1 request from a connection.

use std::io::{self, Read};

use thiserror::Error;

use super::message::HttpRequest;
use crate::json;

/// Largest accepted header block, request line included.
pub const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Largest accepted `Content-Length`.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const READ_CHUNK_BYTES: usize = 4096;

/// Reasons a connection could not be framed into a request.
#[derive(Debug, Error)]
pub enum FramingError {
    /// The request line is empty or not text.
    #[error("malformed request line")]
    MalformedRequestLine,
    /// The request line lacks a method, target, or version.
    #[error("invalid request line")]
    InvalidRequestLine,
    /// A header line has no colon or is not text.
    #[error("malformed header")]
    MalformedHeader,
    /// `Content-Length` is not a plain decimal number.
    #[error("invalid Content-Length")]
    InvalidContentLength,
    /// The declared body exceeds [`MAX_BODY_BYTES`].
    #[error("request is too large: body of {length} bytes exceeds {limit}")]
    BodyTooLarge {
        /// Declared body length.
        length: usize,
        /// Configured ceiling.
        limit: usize,
    },
    /// The header block exceeds [`MAX_HEADER_BYTES`].
    #[error("request is too large: header block exceeds {limit} bytes")]
    HeadersTooLarge {
        /// Configured ceiling.
        limit: usize,
    },
    /// The peer closed the connection mid-request.
    #[error("connection closed before full request was received")]
    Incomplete,
    /// Reading from the socket failed.
    #[error("failed to read request: {source}")]
    Io {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl From<io::Error> for FramingError {
    fn from(source: io::Error) -> Self {
        Self::Io { source }
    }
}

/// Reads one request.
///
/// Returns `Ok(None)` when the peer closes the connection without sending a
/// single byte.
pub(crate) fn read_request<R: Read>(reader: &mut R) -> Result<Option<HttpRequest>, FramingError> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; READ_CHUNK_BYTES];

    let header_end = loop {
        if let Some(position) = find_header_end(&buffer) {
            break position;
        }
        if buffer.len() > MAX_HEADER_BYTES {
            return Err(FramingError::HeadersTooLarge {
                limit: MAX_HEADER_BYTES,
            });
        }
        let bytes_read = read_with_retry(reader, &mut chunk)?;
        if bytes_read == 0 {
            return if buffer.is_empty() {
                Ok(None)
            } else {
                Err(FramingError::Incomplete)
            };
        }
        buffer.extend_from_slice(chunk.get(..bytes_read).unwrap_or_default());
    };

    if header_end > MAX_HEADER_BYTES {
        return Err(FramingError::HeadersTooLarge {
            limit: MAX_HEADER_BYTES,
        });
    }

    let head = buffer
        .get(..header_end)
        .and_then(|bytes| std::str::from_utf8(bytes).ok())
        .ok_or(FramingError::MalformedRequestLine)?;
    let (mut request, length) = parse_head(head)?;

    let body_start = header_end + HEADER_TERMINATOR.len();
    let body_end = body_start + length;
    while buffer.len() < body_end {
        let bytes_read = read_with_retry(reader, &mut chunk)?;
        if bytes_read == 0 {
            return Err(FramingError::Incomplete);
        }
        buffer.extend_from_slice(chunk.get(..bytes_read).unwrap_or_default());
    }

    let body = buffer.get(body_start..body_end).unwrap_or_default().to_vec();
    request = request.with_body(body);
    Ok(Some(request))
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

/// Parses the request line and headers, returning the declared body length.
fn parse_head(head: &str) -> Result<(HttpRequest, usize), FramingError> {
    let mut lines = head.split("\r\n");
    let request_line = lines
        .next()
        .filter(|line| !line.is_empty())
        .ok_or(FramingError::MalformedRequestLine)?;

    let mut parts = request_line.splitn(3, ' ');
    // The version token is not interpreted and may be empty.
    let (Some(method), Some(path), Some(_)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(FramingError::InvalidRequestLine);
    };
    if method.is_empty() || path.is_empty() {
        return Err(FramingError::InvalidRequestLine);
    }

    let mut request = HttpRequest::new(method, path);
    let mut content_length: Option<usize> = None;
    for line in lines.filter(|line| !line.is_empty()) {
        let (name, value) = line.split_once(':').ok_or(FramingError::MalformedHeader)?;
        if name.trim().is_empty() {
            return Err(FramingError::MalformedHeader);
        }
        if name.trim().eq_ignore_ascii_case("content-length") {
            let length = parse_content_length(json::trim(value))?;
            if content_length.is_some_and(|previous| previous != length) {
                return Err(FramingError::InvalidContentLength);
            }
            content_length = Some(length);
        }
        request.insert_header(name, value);
    }
    Ok((request, content_length.unwrap_or(0)))
}

fn parse_content_length(value: &str) -> Result<usize, FramingError> {
    if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(FramingError::InvalidContentLength);
    }
    let length = value
        .parse::<usize>()
        .map_err(|_| FramingError::BodyTooLarge {
            length: usize::MAX,
            limit: MAX_BODY_BYTES,
        })?;
    if length > MAX_BODY_BYTES {
        return Err(FramingError::BodyTooLarge {
            length,
            limit: MAX_BODY_BYTES,
        });
    }
    Ok(length)
}

/// Reads from the stream, retrying on interrupts.
fn read_with_retry<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    fn frame(raw: &[u8]) -> Result<Option<HttpRequest>, FramingError> {
        read_request(&mut Cursor::new(raw.to_vec()))
    }

    /// Yields the input a few bytes at a time to exercise reassembly.
    struct Trickle {
        data: Vec<u8>,
        offset: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let remaining = self.data.get(self.offset..).unwrap_or_default();
            let count = remaining.len().min(buf.len()).min(3);
            if let (Some(target), Some(source)) = (buf.get_mut(..count), remaining.get(..count)) {
                target.copy_from_slice(source);
            }
            self.offset += count;
            Ok(count)
        }
    }

    #[test]
    fn frames_method_path_headers_and_body() {
        let request = frame(
            b"POST /mcp HTTP/1.1\r\nHost: 127.0.0.1\r\nContent-Length: 4\r\nOrigin:  http://localhost \r\n\r\nbody",
        )
        .expect("frame")
        .expect("request present");

        assert_eq!(request.method(), "POST");
        assert_eq!(request.path(), "/mcp");
        assert_eq!(request.header("origin"), Some("http://localhost"));
        assert_eq!(request.body(), b"body");
    }

    #[test]
    fn requests_without_headers_are_accepted() {
        let request = frame(b"GET /mcp HTTP/1.1\r\n\r\n")
            .expect("frame")
            .expect("request present");
        assert_eq!(request.method(), "GET");
        assert!(request.body().is_empty());
    }

    #[test]
    fn bytes_past_content_length_are_ignored() {
        let request = frame(b"POST / HTTP/1.1\r\nContent-Length: 2\r\n\r\nabcdef")
            .expect("frame")
            .expect("request present");
        assert_eq!(request.body(), b"ab");
    }

    #[test]
    fn reassembles_requests_split_across_reads() {
        let data = b"POST /mcp HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello world".to_vec();
        let request = read_request(&mut Trickle { data, offset: 0 })
            .expect("frame")
            .expect("request present");
        assert_eq!(request.body(), b"hello world");
    }

    #[test]
    fn silent_peers_yield_no_request() {
        assert!(matches!(frame(b""), Ok(None)));
    }

    #[rstest]
    #[case::truncated_head(b"POST /mcp HTTP/1.1\r\nContent-Le".as_slice())]
    #[case::truncated_body(b"POST /mcp HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc".as_slice())]
    fn early_close_is_incomplete(#[case] raw: &[u8]) {
        assert!(matches!(frame(raw), Err(FramingError::Incomplete)));
    }

    #[rstest]
    #[case::signed("-1")]
    #[case::alpha("12a")]
    #[case::empty("")]
    #[case::spaced("1 2")]
    fn non_numeric_content_length_is_rejected(#[case] value: &str) {
        let raw = format!("POST /mcp HTTP/1.1\r\nContent-Length: {value}\r\n\r\n");
        assert!(matches!(
            frame(raw.as_bytes()),
            Err(FramingError::InvalidContentLength)
        ));
    }

    #[rstest]
    #[case::invalid_then_valid("abc", "2")]
    #[case::valid_then_invalid("2", "abc")]
    #[case::conflicting("2", "3")]
    fn every_content_length_line_is_checked(#[case] first: &str, #[case] second: &str) {
        let raw = format!(
            "POST /mcp HTTP/1.1\r\nContent-Length: {first}\r\ncontent-length: {second}\r\n\r\nabc"
        );
        assert!(matches!(
            frame(raw.as_bytes()),
            Err(FramingError::InvalidContentLength)
        ));
    }

    #[test]
    fn repeated_matching_content_lengths_are_accepted() {
        let request = frame(b"POST /mcp HTTP/1.1\r\nContent-Length: 2\r\nContent-Length: 2\r\n\r\nab")
            .expect("frame")
            .expect("request present");
        assert_eq!(request.body(), b"ab");
    }

    #[rstest]
    #[case::over_limit("2097153")]
    #[case::overflow("99999999999999999999999999")]
    fn oversized_content_length_is_rejected(#[case] value: &str) {
        let raw = format!("POST /mcp HTTP/1.1\r\nContent-Length: {value}\r\n\r\n");
        assert!(matches!(
            frame(raw.as_bytes()),
            Err(FramingError::BodyTooLarge { .. })
        ));
    }

    #[test]
    fn oversized_header_blocks_are_rejected() {
        let mut raw = b"POST /mcp HTTP/1.1\r\nX-Fill: ".to_vec();
        raw.extend(std::iter::repeat_n(b'a', MAX_HEADER_BYTES + 10));
        raw.extend_from_slice(b"\r\n\r\n");
        assert!(matches!(
            frame(&raw),
            Err(FramingError::HeadersTooLarge { .. })
        ));
    }

    #[rstest]
    #[case::missing_target(b"POST\r\nHost: x\r\n\r\n".as_slice())]
    #[case::missing_version(b"POST /mcp\r\nHost: x\r\n\r\n".as_slice())]
    #[case::empty_method(b" /mcp HTTP/1.1\r\n\r\n".as_slice())]
    fn incomplete_request_lines_are_rejected(#[case] raw: &[u8]) {
        assert!(matches!(frame(raw), Err(FramingError::InvalidRequestLine)));
    }

    #[test]
    fn empty_version_token_is_accepted() {
        let request = frame(b"POST /mcp \r\n\r\n")
            .expect("frame")
            .expect("request present");
        assert_eq!(request.method(), "POST");
        assert_eq!(request.path(), "/mcp");
    }

    #[test]
    fn empty_request_line_is_malformed() {
        assert!(matches!(
            frame(b"\r\nHost: x\r\n\r\n"),
            Err(FramingError::MalformedRequestLine)
        ));
    }

    #[test]
    fn header_without_colon_is_rejected() {
        assert!(matches!(
            frame(b"POST /mcp HTTP/1.1\r\nNoColonHere\r\n\r\n"),
            Err(FramingError::MalformedHeader)
        ));
    }
}
