//! Host daemon for the dbgx MCP endpoint.
//!
//! The daemon loads layered configuration through [`dbgx_config`], installs
//! structured telemetry, picks a debugger backend, and serves the
//! [`dbgx_mcp`] JSON-RPC router on loopback HTTP until it receives a
//! termination signal.
//!
//! Assembly order is explicit and owned by [`McpService`]: executor, router,
//! route handler, then server. Stopping reverses it. Nothing is kept in
//! process-global state apart from the tracing subscriber.
//!
//! Every request that reaches `/mcp` is echoed as single-line summaries
//! (`mcp.request`, `mcp.stage`, `mcp.response`) through an [`EchoSink`]; see
//! the [`echo`] module for the format.

mod bootstrap;
pub mod echo;
mod executor;
mod handler;
mod health;
mod process;
mod service;
pub mod telemetry;

pub use bootstrap::{
    BootstrapError, ConfigLoader, ConfiguredExecutorFactory, ExecutorFactory, StaticConfigLoader,
    SystemConfigLoader, bootstrap_with,
};
pub use echo::{EchoSink, TracingEchoSink};
pub use executor::{
    DETACHED_MESSAGE, DetachedExecutor, EMPTY_COMMAND_MESSAGE, ProcessCommandExecutor,
    executor_from_config,
};
pub use handler::{MCP_PATH, McpRequestHandler, SUPPORTED_PROTOCOL_VERSIONS};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_service};
pub use service::McpService;
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
