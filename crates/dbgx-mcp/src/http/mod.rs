//! Minimal HTTP/1.1 server for the MCP endpoint.
//!
//! The server binds a loopback address with deterministic port fallback,
//! then serves connections on one background worker: an acceptor polls the
//! non-blocking listener and hands each connection to a single consumer that
//! frames one request, calls the [`RequestHandler`], writes the response
//! with `Connection: close`, and closes the socket. Persistent connections,
//! chunked transfer, and TLS are out of scope.

mod bind;
mod framing;
mod message;
mod origin;
mod server;

pub use self::bind::{DEFAULT_MAX_PORT_ATTEMPTS, StartError, StartOptions, StartReport};
pub use self::framing::{FramingError, MAX_BODY_BYTES, MAX_HEADER_BYTES};
pub use self::message::{HttpRequest, HttpResponse, JSON_CONTENT_TYPE, reason_phrase};
pub use self::origin::is_origin_allowed;
pub use self::server::{HttpServer, RequestHandler};

pub(crate) const HTTP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::http");
