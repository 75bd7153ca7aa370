use crate::logging::LogFormat;

/// Loopback address the MCP endpoint binds to by default.
pub const DEFAULT_BIND_HOST: &str = "127.0.0.1";

/// First port tried when binding the MCP endpoint.
pub const DEFAULT_BIND_PORT: u16 = 5678;

/// Number of consecutive ports tried before giving up on address conflicts.
pub const DEFAULT_MAX_PORT_ATTEMPTS: u16 = 16;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default bind host as an owned string (serde default).
pub fn default_bind_host() -> String {
    DEFAULT_BIND_HOST.to_owned()
}

/// Default bind port (serde default).
pub const fn default_bind_port() -> u16 {
    DEFAULT_BIND_PORT
}

/// Default port attempt budget (serde default).
pub const fn default_max_port_attempts() -> u16 {
    DEFAULT_MAX_PORT_ATTEMPTS
}

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}
