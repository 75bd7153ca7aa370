//! Single-line I/O echo summaries for MCP traffic.
//!
//! Every request that reaches `/mcp` produces an `mcp.request` line, zero or
//! more `mcp.stage` lines, and an `mcp.response` line. Values are flattened
//! onto one line and truncated so a large tool output cannot flood the log,
//! and credentials carried in headers are reported by name only.

use dbgx_mcp::http::{HttpRequest, HttpResponse};
use dbgx_mcp::json::{self, FieldMap};
use tracing::info;

const ECHO_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::echo");

/// Characters kept from each summary value before truncation.
pub const SUMMARY_VALUE_LIMIT: usize = 160;

/// Marker appended to truncated values.
pub const TRUNCATED_SUFFIX: &str = "...(truncated)";

const SENSITIVE_HEADERS: [&str; 3] = ["authorization", "proxy-authorization", "x-api-key"];
const MISSING: &str = "(missing)";
const TOOLS_CALL: &str = "tools/call";

/// Receives finished summary lines.
pub trait EchoSink: Send + Sync {
    /// Records one summary line.
    fn echo(&self, summary: &str);
}

/// Sink that writes summaries through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEchoSink;

impl EchoSink for TracingEchoSink {
    fn echo(&self, summary: &str) {
        info!(target: ECHO_TARGET, "{summary}");
    }
}

/// JSON-RPC metadata read from a request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIoMeta {
    /// Whether the body is a JSON object.
    pub parseable: bool,
    /// String `method`, when present.
    pub rpc_method: Option<String>,
    /// Raw `id` text, when present.
    pub rpc_id: Option<String>,
    /// `params.name` for `tools/call` requests.
    pub tool_name: Option<String>,
}

impl RequestIoMeta {
    /// Extracts metadata from `body`; unparseable bodies yield the default.
    #[must_use]
    pub fn parse(body: &[u8]) -> Self {
        let Ok(root) = FieldMap::parse_bytes(body) else {
            return Self::default();
        };
        let rpc_method = root.string_field("method");
        let tool_name = if rpc_method.as_deref() == Some(TOOLS_CALL) {
            root.object_field("params")
                .ok()
                .and_then(|params| params.string_field("name"))
        } else {
            None
        };
        Self {
            parseable: true,
            rpc_method,
            rpc_id: root.raw_field("id").map(str::to_owned),
            tool_name,
        }
    }
}

/// Per-request trace state stamped onto each summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IoTraceContext {
    /// `rpc:<id>` or `local-<n>`; empty omits the field.
    pub trace_id: String,
    /// Lifecycle stage, such as `request_received`.
    pub stage: Option<&'static str>,
    /// Method recorded for the request.
    pub rpc_method: Option<String>,
    /// Raw request id.
    pub rpc_id: Option<String>,
    /// Tool named by a `tools/call` request.
    pub tool_name: Option<String>,
    /// Stage outcome, such as `in_progress`.
    pub outcome: Option<&'static str>,
    /// Milliseconds since the request was received.
    pub duration_ms: u64,
}

/// Flattens line breaks and tabs to spaces and truncates to
/// [`SUMMARY_VALUE_LIMIT`] characters.
#[must_use]
pub fn truncate_for_summary(value: &str) -> String {
    let flattened = value.replace(['\r', '\n', '\t'], " ");
    if flattened.chars().count() <= SUMMARY_VALUE_LIMIT {
        return flattened;
    }
    let mut truncated: String = flattened.chars().take(SUMMARY_VALUE_LIMIT).collect();
    truncated.push_str(TRUNCATED_SUFFIX);
    truncated
}

/// Builds the `mcp.request` line.
#[must_use]
pub fn request_summary(request: &HttpRequest, context: &IoTraceContext) -> String {
    let mut summary = String::from("mcp.request");
    push_field(&mut summary, "method", request.method());
    push_trace(&mut summary, context);
    push_field(&mut summary, "path", request.path());

    let meta = RequestIoMeta::parse(request.body());
    if meta.parseable {
        let rpc_method = context
            .rpc_method
            .as_deref()
            .or(meta.rpc_method.as_deref())
            .unwrap_or(MISSING);
        push_field(&mut summary, "rpc_method", rpc_method);
        let rpc_id = context
            .rpc_id
            .as_deref()
            .or(meta.rpc_id.as_deref())
            .unwrap_or(MISSING);
        push_field(&mut summary, "rpc_id", rpc_id);
        let tool = context.tool_name.as_deref().or(meta.tool_name.as_deref());
        if tool.is_some() || rpc_method == TOOLS_CALL {
            push_field(&mut summary, "tool", tool.unwrap_or(MISSING));
        }
    } else {
        summary.push_str(" rpc_meta=unparseable");
        push_context_rpc(&mut summary, context);
    }

    summary.push_str(&format!(" body_bytes={}", request.body().len()));
    summary.push(' ');
    summary.push_str(&sensitive_headers_summary(request));
    summary
}

/// Builds the `mcp.response` line.
#[must_use]
pub fn response_summary(response: &HttpResponse, context: &IoTraceContext) -> String {
    let mut summary = format!("mcp.response status={}", response.status);
    push_trace(&mut summary, context);

    let Some(body) = response.body_text() else {
        summary.push_str(" has_body=false");
        push_optional(&mut summary, "rpc_id", context.rpc_id.as_deref());
        push_optional(&mut summary, "rpc_outcome", context.outcome);
        push_optional(&mut summary, "tool", context.tool_name.as_deref());
        return summary;
    };
    summary.push_str(" has_body=true");

    let Some(meta) = ResponseIoMeta::parse(body) else {
        summary.push_str(" rpc_meta=unparseable");
        push_optional(&mut summary, "rpc_id", context.rpc_id.as_deref());
        push_optional(&mut summary, "rpc_outcome", context.outcome);
        push_optional(&mut summary, "tool", context.tool_name.as_deref());
        push_field(
            &mut summary,
            "body",
            if body.is_empty() { "(empty)" } else { body },
        );
        return summary;
    };

    push_optional(
        &mut summary,
        "rpc_id",
        context.rpc_id.as_deref().or(meta.rpc_id.as_deref()),
    );
    push_field(
        &mut summary,
        "rpc_outcome",
        context.outcome.unwrap_or_else(|| meta.outcome()),
    );
    push_optional(&mut summary, "tool", context.tool_name.as_deref());
    match &meta.payload {
        RpcPayload::Error(raw) => push_field(&mut summary, "error", raw),
        RpcPayload::Result { raw, .. } => push_field(&mut summary, "result", raw),
        RpcPayload::Missing => {}
    }
    summary
}

/// Builds an `mcp.stage` line.
#[must_use]
pub fn stage_summary(context: &IoTraceContext, message: &str) -> String {
    let mut summary = String::from("mcp.stage");
    push_trace(&mut summary, context);
    push_context_rpc(&mut summary, context);
    push_optional(&mut summary, "outcome", context.outcome);
    if !message.is_empty() {
        push_field(&mut summary, "msg", message);
    }
    summary
}

enum RpcPayload {
    Error(String),
    Result { raw: String, is_error: bool },
    Missing,
}

struct ResponseIoMeta {
    rpc_id: Option<String>,
    payload: RpcPayload,
}

impl ResponseIoMeta {
    fn parse(body: &str) -> Option<Self> {
        let root = FieldMap::parse(body).ok()?;
        let payload = if let Some(error) = root.raw_field("error") {
            RpcPayload::Error(error.to_owned())
        } else if let Some(result) = root.raw_field("result") {
            let is_error = FieldMap::parse(result)
                .ok()
                .and_then(|fields| fields.raw_field("isError").map(|raw| json::trim(raw) == "true"))
                .unwrap_or(false);
            RpcPayload::Result {
                raw: result.to_owned(),
                is_error,
            }
        } else {
            RpcPayload::Missing
        };
        Some(Self {
            rpc_id: root.raw_field("id").map(str::to_owned),
            payload,
        })
    }

    const fn outcome(&self) -> &'static str {
        match self.payload {
            RpcPayload::Error(_) | RpcPayload::Result { is_error: true, .. } => "error",
            RpcPayload::Result { is_error: false, .. } => "success",
            RpcPayload::Missing => "unknown",
        }
    }
}

fn push_field(summary: &mut String, key: &str, value: &str) {
    summary.push(' ');
    summary.push_str(key);
    summary.push('=');
    summary.push_str(&truncate_for_summary(value));
}

fn push_optional(summary: &mut String, key: &str, value: Option<&str>) {
    if let Some(text) = value.filter(|text| !text.is_empty()) {
        push_field(summary, key, text);
    }
}

fn push_trace(summary: &mut String, context: &IoTraceContext) {
    push_optional(summary, "trace_id", Some(context.trace_id.as_str()));
    push_optional(summary, "stage", context.stage);
    summary.push_str(&format!(" duration_ms={}", context.duration_ms));
}

fn push_context_rpc(summary: &mut String, context: &IoTraceContext) {
    push_optional(summary, "rpc_method", context.rpc_method.as_deref());
    push_optional(summary, "rpc_id", context.rpc_id.as_deref());
    push_optional(summary, "tool", context.tool_name.as_deref());
}

fn sensitive_headers_summary(request: &HttpRequest) -> String {
    let mut masked: Vec<String> = request
        .headers()
        .keys()
        .filter(|name| SENSITIVE_HEADERS.contains(&name.as_str()))
        .map(|name| format!("{name}=<masked>"))
        .collect();
    if masked.is_empty() {
        return "sensitive_headers=none".to_owned();
    }
    masked.sort();
    format!("sensitive_headers={}", masked.join(","))
}
