//! JSON-RPC 2.0 response envelopes, built as text.

use crate::json;

/// Error codes used in JSON-RPC error envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcErrorCode {
    /// The body is not a JSON object (-32700).
    ParseError,
    /// The envelope is not a valid request (-32600).
    InvalidRequest,
    /// The method is unknown (-32601).
    MethodNotFound,
    /// The method's parameters are invalid (-32602).
    InvalidParams,
    /// The server failed while handling the request (-32603).
    InternalError,
    /// Implementation-defined server error (-32000).
    ServerError,
}

impl RpcErrorCode {
    /// Numeric code sent on the wire.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ServerError => -32000,
        }
    }
}

/// Raw `id` used when a message has none or it cannot be echoed.
pub const NULL_ID: &str = "null";

/// Builds `{"jsonrpc":"2.0","id":<id>,"result":<result>}`.
///
/// Both `id_raw` and `result_json` are inserted verbatim and must already be
/// valid JSON.
#[must_use]
pub fn success_envelope(id_raw: &str, result_json: &str) -> String {
    format!("{{\"jsonrpc\":\"2.0\",\"id\":{id_raw},\"result\":{result_json}}}")
}

/// Builds `{"jsonrpc":"2.0","id":<id>,"error":{"code":N,"message":"..."}}`.
///
/// `id_raw` is inserted verbatim; `message` is escaped.
#[must_use]
pub fn error_envelope(id_raw: &str, code: RpcErrorCode, message: &str) -> String {
    format!(
        "{{\"jsonrpc\":\"2.0\",\"id\":{id_raw},\"error\":{{\"code\":{},\"message\":\"{}\"}}}}",
        code.code(),
        json::escape(message)
    )
}
