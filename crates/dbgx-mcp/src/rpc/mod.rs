//! JSON-RPC 2.0 routing for the MCP tool surface.
//!
//! [`JsonRpcRouter::handle_post`] turns one POST body into the exact HTTP
//! status and body to send back. It enforces the request/notification
//! contract: messages without an `id` never receive a success body, and
//! invalid messages receive error envelopes rather than transport failures.
//! Tool execution failures are reported inside the tool result
//! (`isError: true`), never as JSON-RPC errors.

mod envelope;
mod methods;

use std::sync::Arc;

use tracing::debug;

use crate::executor::CommandExecutor;
use crate::http::HttpResponse;
use crate::json::FieldMap;

pub use self::envelope::{NULL_ID, RpcErrorCode, error_envelope, success_envelope};
pub use self::methods::{PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION, TOOL_NAME};

pub(crate) const RPC_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::rpc");

/// Maps JSON-RPC messages onto method handlers backed by a command executor.
#[derive(Clone)]
pub struct JsonRpcRouter {
    executor: Arc<dyn CommandExecutor>,
}

impl std::fmt::Debug for JsonRpcRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcRouter").finish_non_exhaustive()
    }
}

impl JsonRpcRouter {
    /// Creates a router that runs `tools/call` commands on `executor`.
    #[must_use]
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Handles one POSTed JSON-RPC message.
    ///
    /// The executor is invoked at most once, and only for a fully valid
    /// `tools/call` request.
    #[must_use]
    pub fn handle_post(&self, body: &[u8]) -> HttpResponse {
        let root = match FieldMap::parse_bytes(body) {
            Ok(fields) => fields,
            Err(error) => {
                debug!(target: RPC_TARGET, %error, "rejecting unparseable message");
                return HttpResponse::json(
                    400,
                    error_envelope(
                        NULL_ID,
                        RpcErrorCode::ParseError,
                        &format!("Parse error: {error}"),
                    ),
                );
            }
        };

        let raw_id = root.raw_field("id");
        let id = raw_id.unwrap_or(NULL_ID);

        if root.string_field("jsonrpc").as_deref() != Some("2.0") {
            return HttpResponse::json(
                200,
                error_envelope(
                    id,
                    RpcErrorCode::InvalidRequest,
                    "Invalid Request: jsonrpc must be 2.0",
                ),
            );
        }

        let Some(method) = root.string_field("method") else {
            // Id-less messages without a method are treated like notifications.
            return match raw_id {
                None => HttpResponse::accepted(),
                Some(request_id) => HttpResponse::json(
                    200,
                    error_envelope(
                        request_id,
                        RpcErrorCode::InvalidRequest,
                        "Invalid Request: missing method",
                    ),
                ),
            };
        };

        debug!(
            target: RPC_TARGET,
            method = method.as_str(),
            notification = raw_id.is_none(),
            "dispatching message"
        );

        match (methods::dispatch(&method, &root, self.executor.as_ref()), raw_id) {
            (Ok(_), None) => HttpResponse::accepted(),
            (Ok(result), Some(request_id)) => {
                HttpResponse::json(200, success_envelope(request_id, &result))
            }
            (Err(failure), _) => HttpResponse::json(
                failure.http_status,
                error_envelope(id, failure.code, &failure.message),
            ),
        }
    }
}
