//! Structured health reporting for host lifecycle events.

use std::sync::Arc;

use dbgx_config::Config;
use dbgx_mcp::http::{StartError, StartReport};

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the MCP endpoint is accepting connections.
    fn server_listening(&self, url: &str, report: &StartReport);

    /// Invoked when the MCP endpoint fails to bind or spawn.
    fn server_start_failed(&self, error: &StartError);

    /// Invoked after the MCP endpoint has been torn down.
    fn server_stopped(&self);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn server_listening(&self, url: &str, report: &StartReport) {
        (**self).server_listening(url, report);
    }

    fn server_start_failed(&self, error: &StartError) {
        (**self).server_start_failed(error);
    }

    fn server_stopped(&self) {
        (**self).server_stopped();
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting host bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            bind_host = config.bind_host(),
            bind_port = config.bind_port(),
            max_port_attempts = config.max_port_attempts(),
            debugger = config.debugger_program().unwrap_or("(detached)"),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "host bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "host bootstrap failed"
        );
    }

    fn server_listening(&self, url: &str, report: &StartReport) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "server_listening",
            url,
            requested_port = report.initial_port,
            bound_port = report.bound_port,
            attempts = report.attempt_count,
            conflicts = report.conflict_count,
            fallback_used = report.fallback_used,
            "HTTP MCP server listening on {url}"
        );
    }

    fn server_start_failed(&self, error: &StartError) {
        let report = error.report();
        tracing::error!(
            target: HEALTH_TARGET,
            event = "server_start_failed",
            error = %error,
            requested_port = report.initial_port,
            last_attempted_port = report.last_attempted_port,
            attempts = report.attempt_count,
            conflicts = report.conflict_count,
            exhausted_conflicts = report.exhausted_conflicts,
            last_error_code = report.last_error_code,
            "failed to start HTTP server"
        );
    }

    fn server_stopped(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "server_stopped",
            "HTTP MCP server stopped"
        );
    }
}
