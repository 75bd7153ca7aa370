//! Host bootstrap orchestration.

use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

use dbgx_config::Config;
use dbgx_mcp::CommandExecutor;

use crate::echo::TracingEchoSink;
use crate::executor::executor_from_config;
use crate::health::HealthReporter;
use crate::service::McpService;
use crate::telemetry::{self, TelemetryError};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the host configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader error when any configuration layer is malformed.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that hands out an already resolved configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Builds the command executor for a resolved configuration.
pub trait ExecutorFactory: Send + Sync {
    /// Returns the executor the router will call.
    fn build(&self, config: &Config) -> Arc<dyn CommandExecutor>;
}

impl<F> ExecutorFactory for F
where
    F: Fn(&Config) -> Arc<dyn CommandExecutor> + Send + Sync,
{
    fn build(&self, config: &Config) -> Arc<dyn CommandExecutor> {
        self(config)
    }
}

/// Factory that spawns the configured debugger, or detaches when none is set.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfiguredExecutorFactory;

impl ExecutorFactory for ConfiguredExecutorFactory {
    fn build(&self, config: &Config) -> Arc<dyn CommandExecutor> {
        executor_from_config(config)
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Bootstraps the host using the supplied collaborators.
///
/// Loads configuration, installs telemetry, then assembles the service in
/// dependency order: executor, router, handler, server. The server is not
/// started; call [`McpService::start`].
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration or telemetry fails. The
/// reporter sees the failure before it is returned.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    executors: &dyn ExecutorFactory,
) -> Result<McpService, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let executor = executors.build(&config);
    reporter.bootstrap_succeeded(&config);

    Ok(McpService::new(
        config,
        executor,
        Arc::new(TracingEchoSink),
        telemetry,
        reporter,
    ))
}
