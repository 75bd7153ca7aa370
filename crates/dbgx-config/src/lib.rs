//! Shared configuration for the dbgx MCP endpoint and its host daemon.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then a
//! TOML file (discovered or passed with `--config-path`), then `DBGX_*`
//! environment variables, then command-line flags. Later layers win.

mod defaults;
mod logging;

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_BIND_HOST, DEFAULT_BIND_PORT, DEFAULT_LOG_FILTER, DEFAULT_MAX_PORT_ATTEMPTS,
    default_bind_host, default_bind_port, default_log_filter, default_log_filter_string,
    default_log_format, default_max_port_attempts,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Placeholder replaced by the debugger command inside `debugger_args`.
pub const COMMAND_PLACEHOLDER: &str = "{command}";

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DBGX")]
pub struct Config {
    /// Numeric address the MCP endpoint binds to.
    #[ortho_config(default = default_bind_host())]
    #[serde(default = "default_bind_host")]
    pub bind_host: String,
    /// First port tried when binding.
    #[ortho_config(default = default_bind_port())]
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
    /// Consecutive ports tried when the requested one is in use.
    #[ortho_config(default = default_max_port_attempts())]
    #[serde(default = "default_max_port_attempts")]
    pub max_port_attempts: u16,
    /// `tracing` filter expression.
    #[ortho_config(default = default_log_filter_string())]
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format for log records.
    #[ortho_config(default = default_log_format())]
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Debugger front-end executed once per command. Empty leaves the
    /// endpoint without a backend.
    #[ortho_config(default = String::new())]
    #[serde(default)]
    pub debugger_program: String,
    /// Whitespace separated arguments for `debugger_program`.
    #[ortho_config(default = String::new())]
    #[serde(default)]
    pub debugger_args: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            bind_port: default_bind_port(),
            max_port_attempts: default_max_port_attempts(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            debugger_program: String::new(),
            debugger_args: String::new(),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns the loader error when any layer is malformed.
    pub fn load() -> Result<Self, Arc<OrthoError>> {
        <Self as OrthoConfig>::load()
    }

    /// Loads configuration from an explicit argument iterator. The first item
    /// is treated as the program name.
    ///
    /// # Errors
    ///
    /// Returns the loader error when any layer is malformed.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Host the endpoint binds to.
    #[must_use]
    pub fn bind_host(&self) -> &str {
        &self.bind_host
    }

    /// First port tried when binding.
    #[must_use]
    pub fn bind_port(&self) -> u16 {
        self.bind_port
    }

    /// Port attempt budget.
    #[must_use]
    pub fn max_port_attempts(&self) -> u16 {
        self.max_port_attempts
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Debugger program, if one is configured.
    #[must_use]
    pub fn debugger_program(&self) -> Option<&str> {
        let program = self.debugger_program.trim();
        (!program.is_empty()).then_some(program)
    }

    /// Debugger arguments split on whitespace.
    #[must_use]
    pub fn debugger_args(&self) -> Vec<String> {
        self.debugger_args
            .split_whitespace()
            .map(str::to_owned)
            .collect()
    }

    /// URL clients use to reach the endpoint once bound to `port`.
    #[must_use]
    pub fn endpoint_url(&self, port: u16) -> String {
        format!("http://{}:{port}/mcp", self.bind_host)
    }
}
