//! `/mcp` route handling: origin and protocol checks, method gating, and I/O
//! echo around the JSON-RPC router.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dbgx_mcp::http::{HttpRequest, HttpResponse, RequestHandler, is_origin_allowed};
use dbgx_mcp::rpc::{JsonRpcRouter, NULL_ID, RpcErrorCode, error_envelope};

use crate::echo::{
    EchoSink, IoTraceContext, RequestIoMeta, request_summary, response_summary, stage_summary,
};

/// Only path served by the handler.
pub const MCP_PATH: &str = "/mcp";

/// Values accepted in the `Mcp-Protocol-Version` header.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 2] = ["2025-11-25", "2025-03-26"];

const TOOLS_CALL: &str = "tools/call";

/// Routes HTTP requests onto a [`JsonRpcRouter`] and echoes each exchange to
/// an [`EchoSink`].
pub struct McpRequestHandler {
    router: JsonRpcRouter,
    echo: Arc<dyn EchoSink>,
    next_local_trace: AtomicU64,
}

impl std::fmt::Debug for McpRequestHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpRequestHandler")
            .field("router", &self.router)
            .field("next_local_trace", &self.next_local_trace)
            .finish_non_exhaustive()
    }
}

impl McpRequestHandler {
    /// Creates a handler that dispatches to `router`.
    #[must_use]
    pub fn new(router: JsonRpcRouter, echo: Arc<dyn EchoSink>) -> Self {
        Self {
            router,
            echo,
            next_local_trace: AtomicU64::new(1),
        }
    }

    fn begin_trace(&self, request: &HttpRequest) -> RequestTrace {
        let meta = RequestIoMeta::parse(request.body());
        let trace_id = match &meta.rpc_id {
            Some(id) => format!("rpc:{id}"),
            None => format!(
                "local-{}",
                self.next_local_trace.fetch_add(1, Ordering::Relaxed)
            ),
        };
        RequestTrace {
            trace_id,
            rpc_method: meta.rpc_method,
            rpc_id: meta.rpc_id,
            tool_name: meta.tool_name,
            started_at: Instant::now(),
        }
    }

    fn route(&self, request: &HttpRequest, trace: &RequestTrace) -> HttpResponse {
        if let Some(origin) = request.header("origin")
            && !is_origin_allowed(origin)
        {
            return HttpResponse::json(
                403,
                error_envelope(NULL_ID, RpcErrorCode::ServerError, "Forbidden origin"),
            );
        }

        if let Some(version) = request.header("mcp-protocol-version")
            && !SUPPORTED_PROTOCOL_VERSIONS.contains(&version)
        {
            return HttpResponse::json(
                400,
                error_envelope(
                    NULL_ID,
                    RpcErrorCode::InvalidRequest,
                    "Unsupported MCP protocol version",
                ),
            );
        }

        match request.method() {
            "POST" => {}
            "GET" => return HttpResponse::error(405, "GET stream is not implemented"),
            _ => return HttpResponse::error(405, "Method Not Allowed"),
        }

        self.stage(trace, "route_dispatch", "dispatching JSON-RPC request");
        let tool_call = trace.rpc_method.as_deref() == Some(TOOLS_CALL);
        if tool_call {
            self.stage(trace, "tool_execute_start", "entering tool executor");
        }

        let response = self.router.handle_post(request.body());
        if tool_call {
            self.echo.echo(&response_summary(
                &response,
                &trace.context("tool_execute_end", None),
            ));
        }
        response
    }

    fn stage(&self, trace: &RequestTrace, stage: &'static str, message: &str) {
        self.echo.echo(&stage_summary(
            &trace.context(stage, Some("in_progress")),
            message,
        ));
    }
}

impl RequestHandler for McpRequestHandler {
    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        if request.path() != MCP_PATH {
            return HttpResponse::error(404, "Not Found");
        }

        let trace = self.begin_trace(request);
        self.echo.echo(&request_summary(
            request,
            &trace.context("request_received", None),
        ));
        let response = self.route(request, &trace);
        self.echo.echo(&response_summary(
            &response,
            &trace.context("response_sent", None),
        ));
        response
    }
}

struct RequestTrace {
    trace_id: String,
    rpc_method: Option<String>,
    rpc_id: Option<String>,
    tool_name: Option<String>,
    started_at: Instant,
}

impl RequestTrace {
    fn context(&self, stage: &'static str, outcome: Option<&'static str>) -> IoTraceContext {
        IoTraceContext {
            trace_id: self.trace_id.clone(),
            stage: Some(stage),
            rpc_method: self.rpc_method.clone(),
            rpc_id: self.rpc_id.clone(),
            tool_name: self.tool_name.clone(),
            outcome,
            duration_ms: u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use dbgx_mcp::{CommandExecutor, CommandOutcome};
    use mockall::mock;
    use rstest::{fixture, rstest};
    use serde_json::Value;

    use super::*;

    mock! {
        pub Executor {}

        impl CommandExecutor for Executor {
            fn execute(&self, command: &str) -> CommandOutcome;
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        lines: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().expect("echo mutex poisoned").clone()
        }
    }

    impl EchoSink for RecordingSink {
        fn echo(&self, summary: &str) {
            self.lines
                .lock()
                .expect("echo mutex poisoned")
                .push(summary.to_owned());
        }
    }

    fn idle_executor() -> MockExecutor {
        let mut executor = MockExecutor::new();
        executor.expect_execute().times(0);
        executor
    }

    fn handler_with(executor: MockExecutor, sink: &Arc<RecordingSink>) -> McpRequestHandler {
        McpRequestHandler::new(JsonRpcRouter::new(Arc::new(executor)), sink.clone())
    }

    #[fixture]
    fn sink() -> Arc<RecordingSink> {
        Arc::new(RecordingSink::default())
    }

    fn post(body: &str) -> HttpRequest {
        HttpRequest::new("POST", MCP_PATH).with_body(body)
    }

    fn body_json(response: &HttpResponse) -> Value {
        serde_json::from_str(response.body_text().expect("response body")).expect("valid JSON")
    }

    #[rstest]
    fn other_paths_are_not_found_and_not_echoed(sink: Arc<RecordingSink>) {
        let handler = handler_with(idle_executor(), &sink);
        let response = handler.handle(&HttpRequest::new("POST", "/other"));
        assert_eq!(response.status, 404);
        assert_eq!(response.body_text(), Some(r#"{"error":"Not Found"}"#));
        assert!(sink.lines().is_empty());
    }

    #[rstest]
    fn forbidden_origins_get_403_envelopes(sink: Arc<RecordingSink>) {
        let handler = handler_with(idle_executor(), &sink);
        let request = post(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#)
            .with_header("Origin", "https://evil.example");
        let response = handler.handle(&request);

        assert_eq!(response.status, 403);
        let body = body_json(&response);
        assert_eq!(body["id"], Value::Null);
        assert_eq!(body["error"]["code"], -32000);
        assert_eq!(body["error"]["message"], "Forbidden origin");
    }

    #[rstest]
    #[case::localhost("http://localhost:3000")]
    #[case::loopback("http://127.0.0.1")]
    fn loopback_origins_are_allowed(sink: Arc<RecordingSink>, #[case] origin: &str) {
        let handler = handler_with(idle_executor(), &sink);
        let request = post(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
            .with_header("Origin", origin);
        assert_eq!(handler.handle(&request).status, 200);
    }

    #[rstest]
    #[case::current("2025-11-25", 200)]
    #[case::previous("2025-03-26", 200)]
    #[case::unsupported("2024-11-05", 400)]
    fn protocol_header_is_checked(
        sink: Arc<RecordingSink>,
        #[case] version: &str,
        #[case] status: u16,
    ) {
        let handler = handler_with(idle_executor(), &sink);
        let request = post(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#)
            .with_header("MCP-Protocol-Version", version);
        let response = handler.handle(&request);
        assert_eq!(response.status, status);
        if status == 400 {
            let body = body_json(&response);
            assert_eq!(body["error"]["code"], -32600);
            assert_eq!(body["error"]["message"], "Unsupported MCP protocol version");
        }
    }

    #[rstest]
    #[case::get("GET", "GET stream is not implemented")]
    #[case::delete("DELETE", "Method Not Allowed")]
    #[case::lowercase_post("post", "Method Not Allowed")]
    fn non_post_methods_are_rejected(
        sink: Arc<RecordingSink>,
        #[case] method: &str,
        #[case] message: &str,
    ) {
        let handler = handler_with(idle_executor(), &sink);
        let response = handler.handle(&HttpRequest::new(method, MCP_PATH));
        assert_eq!(response.status, 405);
        assert_eq!(body_json(&response)["error"], message);
    }

    #[rstest]
    fn tool_calls_echo_every_stage(sink: Arc<RecordingSink>) {
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .withf(|command| command == "k")
            .times(1)
            .returning(|_| CommandOutcome::succeeded("frame 0"));
        let handler = handler_with(executor, &sink);

        let response = handler.handle(&post(
            r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"windbg.eval","arguments":{"command":"k"}}}"#,
        ));
        assert_eq!(response.status, 200);

        let lines = sink.lines();
        let stages: Vec<&str> = lines
            .iter()
            .filter_map(|line| {
                line.split(' ')
                    .find_map(|field| field.strip_prefix("stage="))
            })
            .collect();
        assert_eq!(
            stages,
            [
                "request_received",
                "route_dispatch",
                "tool_execute_start",
                "tool_execute_end",
                "response_sent"
            ]
        );
        assert!(lines.iter().all(|line| line.contains("trace_id=rpc:9")));
        assert!(
            lines
                .last()
                .is_some_and(|line| line.contains("rpc_outcome=success"))
        );
    }

    #[rstest]
    fn requests_without_ids_get_local_trace_ids(sink: Arc<RecordingSink>) {
        let handler = handler_with(idle_executor(), &sink);
        let notification = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;

        assert_eq!(handler.handle(&post(notification)).status, 202);
        assert_eq!(handler.handle(&post(notification)).status, 202);

        let lines = sink.lines();
        assert!(lines.first().is_some_and(|line| line.contains("trace_id=local-1")));
        assert!(lines.last().is_some_and(|line| line.contains("trace_id=local-2")));
        assert!(lines.iter().all(|line| !line.contains("tool_execute")));
    }

    #[rstest]
    fn rejected_requests_still_echo_the_response(sink: Arc<RecordingSink>) {
        let handler = handler_with(idle_executor(), &sink);
        let response = handler.handle(&HttpRequest::new("GET", MCP_PATH));
        assert_eq!(response.status, 405);

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines.first().is_some_and(|line| line.starts_with("mcp.request method=GET")));
        assert!(lines.last().is_some_and(|line| line.starts_with("mcp.response status=405")));
    }
}
