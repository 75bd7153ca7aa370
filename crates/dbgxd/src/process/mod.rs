//! Process-level supervision: start the endpoint, wait for a termination
//! signal, and stop it again.

mod errors;
mod launch;
pub(crate) mod shutdown;

pub use errors::LaunchError;
pub use launch::run_service;
#[cfg(test)]
pub(crate) use launch::{LaunchPlan, run_service_with};
pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
