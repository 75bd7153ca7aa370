//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::net::TcpListener;
use std::sync::Arc;

use ortho_config::OrthoError;

use dbgx_config::Config;

use crate::bootstrap::ConfigLoader;

/// Loader that binds an ephemeral loopback port with a single attempt.
#[derive(Debug, Clone)]
pub struct TestConfigLoader {
    port: u16,
}

impl TestConfigLoader {
    #[must_use]
    pub const fn ephemeral() -> Self {
        Self { port: 0 }
    }

    #[must_use]
    pub const fn pinned(port: u16) -> Self {
        Self { port }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            bind_port: self.port,
            max_port_attempts: 1,
            ..Config::default()
        })
    }
}

/// Loader that resolves the layered configuration with no flags, as the
/// daemon does when launched bare.
pub struct BareArgsConfigLoader;

impl ConfigLoader for BareArgsConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter([OsString::from("dbgxd")])
    }
}

/// Loader that intentionally fails by passing an invalid CLI value.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("dbgxd"),
            OsString::from("--bind-port"),
            OsString::from("not-a-port"),
        ];
        Config::load_from_iter(args)
    }
}

/// Loopback port held open for the lifetime of the value.
pub struct OccupiedPort {
    listener: TcpListener,
}

impl OccupiedPort {
    pub fn new() -> Self {
        Self {
            listener: TcpListener::bind(("127.0.0.1", 0)).expect("bind blocking listener"),
        }
    }

    pub fn port(&self) -> u16 {
        self.listener
            .local_addr()
            .expect("blocking listener address")
            .port()
    }
}
