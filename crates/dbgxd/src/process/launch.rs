//! Sequences bootstrap, endpoint start, shutdown wait, and teardown.

use std::sync::Arc;

use tracing::info;

use crate::bootstrap::{
    ConfigLoader, ConfiguredExecutorFactory, ExecutorFactory, SystemConfigLoader, bootstrap_with,
};
use crate::health::{HealthReporter, StructuredHealthReporter};

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Collaborators required to run the host.
pub(crate) struct LaunchPlan<L, E, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) executors: E,
    pub(crate) shutdown: S,
}

/// Runs the host with the production collaborators until a termination
/// signal arrives.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap fails, the endpoint cannot bind,
/// or signal handlers cannot be installed.
pub fn run_service() -> Result<(), LaunchError> {
    run_service_with(LaunchPlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        executors: ConfiguredExecutorFactory,
        shutdown: SystemShutdownSignal::new(),
    })
}

/// Runs the host with injected collaborators.
pub(crate) fn run_service_with<L, E, S>(plan: LaunchPlan<L, E, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    E: ExecutorFactory,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        reporter,
        executors,
        shutdown,
    } = plan;

    let service = bootstrap_with(&loader, reporter, &executors)?;
    let report = service.start()?;
    info!(
        target: PROCESS_TARGET,
        bound_port = report.bound_port,
        "host running; waiting for shutdown signal"
    );

    let waited = shutdown.wait();
    service.stop();
    drop(service);
    waited?;
    info!(
        target: PROCESS_TARGET,
        "shutdown sequence completed"
    );
    Ok(())
}
