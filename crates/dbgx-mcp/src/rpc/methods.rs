//! Method table for the MCP tool surface.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use super::RPC_TARGET;
use super::envelope::RpcErrorCode;
use crate::executor::CommandExecutor;
use crate::json::{self, FieldMap};

/// Protocol revision announced by `initialize`.
pub const PROTOCOL_VERSION: &str = "2025-11-25";

/// Name of the only tool the endpoint exposes.
pub const TOOL_NAME: &str = "windbg.eval";

/// Server name announced by `initialize`.
pub const SERVER_NAME: &str = "dbgx-mcp";

/// Server version announced by `initialize`.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const TOOL_DESCRIPTION: &str = "Execute one WinDbg command at a time and return text output; \
     clients MUST run calls serially and wait for each call to finish before sending the next";
const COMMAND_DESCRIPTION: &str = "WinDbg command to execute; send commands one by one and wait \
     for completion before the next command";
const EMPTY_OUTPUT_TEXT: &str = "(no output)";
const FALLBACK_FAILURE_TEXT: &str = "Command execution failed";

/// Method failure mapped onto a JSON-RPC error envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RpcFailure {
    pub(crate) code: RpcErrorCode,
    pub(crate) message: String,
    pub(crate) http_status: u16,
}

impl RpcFailure {
    fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            http_status: 200,
        }
    }

    fn invalid_params(detail: &str) -> Self {
        Self::new(
            RpcErrorCode::InvalidParams,
            format!("Invalid params: {detail}"),
        )
    }
}

/// Result JSON text, or the failure to report.
pub(crate) type MethodResult = Result<String, RpcFailure>;

pub(crate) fn dispatch(method: &str, root: &FieldMap, executor: &dyn CommandExecutor) -> MethodResult {
    match method {
        "initialize" => Ok(initialize_result()),
        "initialized" | "notifications/initialized" => Ok("{}".to_owned()),
        "tools/list" => Ok(tools_list_result()),
        "tools/call" => call_tool(root, executor),
        _ => Err(RpcFailure::new(
            RpcErrorCode::MethodNotFound,
            "Method not found",
        )),
    }
}

fn initialize_result() -> String {
    format!(
        "{{\"protocolVersion\":\"{PROTOCOL_VERSION}\",\
         \"capabilities\":{{\"tools\":{{\"listChanged\":false,\"availableTools\":[\"{TOOL_NAME}\"]}}}},\
         \"serverInfo\":{{\"name\":\"{SERVER_NAME}\",\"version\":\"{SERVER_VERSION}\"}}}}"
    )
}

fn tools_list_result() -> String {
    format!(
        "{{\"tools\":[{{\"name\":\"{TOOL_NAME}\",\"description\":\"{TOOL_DESCRIPTION}\",\
         \"inputSchema\":{{\"type\":\"object\",\
         \"properties\":{{\"command\":{{\"type\":\"string\",\"description\":\"{COMMAND_DESCRIPTION}\"}}}},\
         \"required\":[\"command\"],\"additionalProperties\":false}}}}]}}"
    )
}

/// Validates `params` for `tools/call` and returns the command to run.
fn tool_command(root: &FieldMap) -> Result<String, RpcFailure> {
    let params = root
        .object_field("params")
        .map_err(|_| RpcFailure::invalid_params("params must be an object"))?;

    let name = params
        .string_field("name")
        .ok_or_else(|| RpcFailure::invalid_params("missing tool name"))?;
    if name != TOOL_NAME {
        return Err(RpcFailure::invalid_params("unknown tool name"));
    }

    let arguments = params
        .object_field("arguments")
        .map_err(|_| RpcFailure::invalid_params("arguments must be an object"))?;

    arguments
        .string_field("command")
        .filter(|command| !command.is_empty())
        .ok_or_else(|| RpcFailure::invalid_params("command must be a non-empty string"))
}

fn call_tool(root: &FieldMap, executor: &dyn CommandExecutor) -> MethodResult {
    let command = tool_command(root)?;
    debug!(target: RPC_TARGET, tool = TOOL_NAME, %command, "executing tool call");

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| executor.execute(&command)))
        .map_err(|_| {
            warn!(target: RPC_TARGET, %command, "command executor panicked");
            RpcFailure::new(RpcErrorCode::InternalError, "Command executor failed")
        })?;

    let text = match (outcome.success, outcome.output.is_empty(), outcome.error_message.is_empty()) {
        (true, true, _) => EMPTY_OUTPUT_TEXT,
        (true, false, _) => outcome.output.as_str(),
        (false, _, true) => FALLBACK_FAILURE_TEXT,
        (false, _, false) => outcome.error_message.as_str(),
    };
    debug!(
        target: RPC_TARGET,
        success = outcome.success,
        output_bytes = outcome.output.len(),
        "tool call finished"
    );

    Ok(format!(
        "{{\"content\":[{{\"type\":\"text\",\"text\":\"{}\"}}],\"isError\":{}}}",
        json::escape(text),
        !outcome.success
    ))
}
