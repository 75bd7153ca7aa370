//! Protocol layer that exposes a debugging session as a JSON-RPC 2.0 tool
//! service over loopback HTTP.
//!
//! The crate has three parts, each usable on its own:
//!
//! - [`json`]: a flat object-field extractor that validates JSON structure
//!   and hands back raw value text, so the router can read the few fields it
//!   needs without a document model.
//! - [`rpc`]: the [`JsonRpcRouter`](rpc::JsonRpcRouter), which implements
//!   `initialize`, `tools/list`, and `tools/call` for a single `windbg.eval`
//!   tool and enforces the request/notification/error contract.
//! - [`http`]: a one-request-per-connection HTTP/1.1 server with
//!   deterministic port fallback and a single background worker.
//!
//! Debugger commands run through the [`CommandExecutor`] seam; hosts supply
//! the implementation.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dbgx_mcp::http::{HttpRequest, HttpServer, StartOptions};
//! use dbgx_mcp::rpc::JsonRpcRouter;
//! use dbgx_mcp::{CommandExecutor, CommandOutcome};
//!
//! struct Echo;
//!
//! impl CommandExecutor for Echo {
//!     fn execute(&self, command: &str) -> CommandOutcome {
//!         CommandOutcome::succeeded(command)
//!     }
//! }
//!
//! let router = JsonRpcRouter::new(Arc::new(Echo));
//! let server = HttpServer::new();
//! let report = server.start(
//!     "127.0.0.1",
//!     5678,
//!     Arc::new(move |request: &HttpRequest| router.handle_post(request.body())),
//!     StartOptions::default(),
//! )?;
//! println!("listening on {}", report.bound_port);
//! server.stop();
//! # Ok::<(), dbgx_mcp::http::StartError>(())
//! ```

mod executor;
pub mod http;
pub mod json;
pub mod rpc;

pub use executor::{CommandExecutor, CommandOutcome};

#[cfg(test)]
mod tests;
