//! Unified error surface for running the host process.

use dbgx_mcp::http::StartError;
use thiserror::Error;

use crate::bootstrap::BootstrapError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the host.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrapping the host failed.
    #[error("host bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[source]
        source: BootstrapError,
    },
    /// The MCP endpoint could not be started.
    #[error("failed to start MCP endpoint: {source}")]
    Start {
        /// Underlying server error, including its start report.
        #[source]
        source: StartError,
    },
    /// Waiting for shutdown failed.
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
}

impl From<BootstrapError> for LaunchError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

impl From<StartError> for LaunchError {
    fn from(source: StartError) -> Self {
        Self::Start { source }
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}
