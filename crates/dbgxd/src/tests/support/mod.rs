//! Test harness utilities shared by the host behavioural suites.

mod client;
mod config_loader;
mod environment;
mod reporter;

pub use client::post_json;
pub use config_loader::{
    BareArgsConfigLoader, FailingConfigLoader, OccupiedPort, TestConfigLoader,
};
pub use environment::IsolatedEnvironment;
pub use reporter::{HealthEvent, RecordingHealthReporter};
