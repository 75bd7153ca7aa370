//! Minimal loopback HTTP client for driving the endpoint in scenarios.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Status and body of one HTTP exchange.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// POSTs `body` to `/mcp` on the loopback port and reads the full response.
pub fn post_json(port: u16, body: &str) -> RawResponse {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).expect("connect to endpoint");
    stream
        .set_read_timeout(Some(IO_TIMEOUT))
        .expect("set read timeout");
    let request = format!(
        "POST /mcp HTTP/1.1\r\nHost: 127.0.0.1\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).expect("send request");
    stream.shutdown(Shutdown::Write).expect("half-close request");

    let mut text = String::new();
    stream.read_to_string(&mut text).expect("read response");
    let (head, payload) = text
        .split_once("\r\n\r\n")
        .expect("response should contain a header terminator");
    let status = head
        .split(' ')
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("status line should carry a numeric code");
    RawResponse {
        status,
        body: payload.to_owned(),
    }
}
