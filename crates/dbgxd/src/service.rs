//! The assembled MCP endpoint and its start/stop lifecycle.

use std::sync::Arc;

use dbgx_config::Config;
use dbgx_mcp::CommandExecutor;
use dbgx_mcp::http::{HttpServer, StartError, StartOptions, StartReport};
use dbgx_mcp::rpc::JsonRpcRouter;

use crate::echo::EchoSink;
use crate::handler::McpRequestHandler;
use crate::health::HealthReporter;
use crate::telemetry::TelemetryHandle;

/// Owns the executor, router, handler, and server for one endpoint.
///
/// Fields drop in declaration order, so teardown runs server, handler (with
/// its router), then executor: the reverse of construction.
pub struct McpService {
    server: HttpServer,
    handler: Arc<McpRequestHandler>,
    executor: Arc<dyn CommandExecutor>,
    config: Config,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl std::fmt::Debug for McpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpService")
            .field("server", &self.server)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl McpService {
    pub(crate) fn new(
        config: Config,
        executor: Arc<dyn CommandExecutor>,
        echo: Arc<dyn EchoSink>,
        telemetry: TelemetryHandle,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        let router = JsonRpcRouter::new(Arc::clone(&executor));
        let handler = Arc::new(McpRequestHandler::new(router, echo));
        Self {
            server: HttpServer::new(),
            handler,
            executor,
            config,
            telemetry,
            reporter,
        }
    }

    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Executor backing `tools/call`.
    #[must_use]
    pub fn executor(&self) -> Arc<dyn CommandExecutor> {
        Arc::clone(&self.executor)
    }

    /// Binds the configured host and port, falling back across the
    /// configured attempt budget, and starts serving `/mcp`.
    ///
    /// # Errors
    ///
    /// Returns the server's [`StartError`], with its report, when binding or
    /// spawning fails or the service is already running.
    pub fn start(&self) -> Result<StartReport, StartError> {
        let options = StartOptions::with_max_port_attempts(self.config.max_port_attempts());
        match self.server.start(
            self.config.bind_host(),
            self.config.bind_port(),
            self.handler.clone(),
            options,
        ) {
            Ok(report) => {
                self.reporter
                    .server_listening(&self.config.endpoint_url(report.bound_port), &report);
                Ok(report)
            }
            Err(error) => {
                self.reporter.server_start_failed(&error);
                Err(error)
            }
        }
    }

    /// Stops the server and waits for its worker. Idempotent.
    pub fn stop(&self) {
        let was_running = self.server.is_running();
        self.server.stop();
        if was_running {
            self.reporter.server_stopped();
        }
    }

    /// Reports whether the server worker is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.server.is_running()
    }

    /// Listening URL, while running.
    #[must_use]
    pub fn endpoint_url(&self) -> Option<String> {
        self.server
            .bound_port()
            .map(|port| self.config.endpoint_url(port))
    }
}

impl Drop for McpService {
    fn drop(&mut self) {
        self.stop();
    }
}
