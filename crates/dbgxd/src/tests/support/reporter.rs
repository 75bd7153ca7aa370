//! Test double for [`HealthReporter`] that records lifecycle events for
//! assertions.

use std::sync::Mutex;

use dbgx_config::Config;
use dbgx_mcp::http::{StartError, StartReport};

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;

/// Lifecycle events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ServerListening { url: String, port: u16 },
    ServerStartFailed { exhausted_conflicts: bool },
    ServerStopped,
}

impl HealthEvent {
    /// Event name as reported by the structured reporter.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BootstrapStarting => "bootstrap_starting",
            Self::BootstrapSucceeded => "bootstrap_succeeded",
            Self::BootstrapFailed(_) => "bootstrap_failed",
            Self::ServerListening { .. } => "server_listening",
            Self::ServerStartFailed { .. } => "server_start_failed",
            Self::ServerStopped => "server_stopped",
        }
    }
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Names of the recorded events, in order.
    pub fn event_names(&self) -> Vec<&'static str> {
        self.events().iter().map(HealthEvent::name).collect()
    }

    /// Port announced by the most recent `server_listening` event.
    pub fn listening_port(&self) -> Option<u16> {
        self.events().iter().rev().find_map(|event| match event {
            HealthEvent::ServerListening { port, .. } => Some(*port),
            _ => None,
        })
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn server_listening(&self, url: &str, report: &StartReport) {
        self.record(HealthEvent::ServerListening {
            url: url.to_owned(),
            port: report.bound_port,
        });
    }

    fn server_start_failed(&self, error: &StartError) {
        self.record(HealthEvent::ServerStartFailed {
            exhausted_conflicts: error.report().exhausted_conflicts,
        });
    }

    fn server_stopped(&self) {
        self.record(HealthEvent::ServerStopped);
    }
}
