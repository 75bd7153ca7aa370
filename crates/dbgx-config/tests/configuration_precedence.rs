use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use dbgx_config::{Config, default_bind_port, default_log_filter, default_log_format};

const PORT_ENV: &str = "DBGX_BIND_PORT";

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct Harness {
    temp_dir: TempDir,
    cli_args: RefCell<Vec<OsString>>,
    previous_port: RefCell<Option<Option<OsString>>>,
    loaded: RefCell<Option<Config>>,
    error: RefCell<Option<String>>,
    _env_guard: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let env_guard = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        let temp_dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("failed to create temporary directory: {error}"),
        };
        Self {
            temp_dir,
            cli_args: RefCell::new(vec![OsString::from("dbgxd")]),
            previous_port: RefCell::new(None),
            loaded: RefCell::new(None),
            error: RefCell::new(None),
            _env_guard: env_guard,
        }
    }

    fn write_config(&self, port: u16) {
        let path = self.temp_dir.path().join("dbgx.toml");
        if let Err(error) = fs::write(&path, format!("bind_port = {port}\n")) {
            panic!("failed to write configuration: {error}");
        }
        let mut args = self.cli_args.borrow_mut();
        args.push(OsString::from("--config-path"));
        args.push(path.into_os_string());
    }

    fn set_port_env(&self, value: &str) {
        let mut previous = self.previous_port.borrow_mut();
        if previous.is_none() {
            *previous = Some(std::env::var_os(PORT_ENV));
        }
        // Environment mutation is `unsafe` on edition 2024; the harness holds
        // `ENV_MUTEX` and restores the variable on drop.
        unsafe { std::env::set_var(PORT_ENV, value) };
    }

    fn push_cli_arg(&self, arg: impl Into<OsString>) {
        self.cli_args.borrow_mut().push(arg.into());
    }

    fn load(&self) {
        if self.loaded.borrow().is_some() || self.error.borrow().is_some() {
            return;
        }

        let args = self.cli_args.borrow().clone();
        match Config::load_from_iter(args) {
            Ok(config) => *self.loaded.borrow_mut() = Some(config),
            Err(error) => *self.error.borrow_mut() = Some(error.to_string()),
        }
    }

    fn loaded_config(&self) -> Config {
        self.load();
        if let Some(error) = self.error.borrow().as_ref() {
            panic!("configuration failed to load: {error}");
        }
        match self.loaded.borrow().as_ref() {
            Some(config) => config.clone(),
            None => panic!("configuration was not loaded"),
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        if let Some(previous) = self.previous_port.borrow_mut().take() {
            match previous {
                Some(value) => unsafe { std::env::set_var(PORT_ENV, value) },
                None => unsafe { std::env::remove_var(PORT_ENV) },
            }
        }
    }
}

fn parse_port(text: &str) -> u16 {
    match text.parse::<u16>() {
        Ok(port) => port,
        Err(error) => panic!("invalid port '{text}': {error}"),
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("a configuration file setting the bind port to \"{port}\"")]
fn given_configuration_file(harness: &Harness, port: String) {
    harness.write_config(parse_port(&port));
}

#[given("the environment overrides the bind port to \"{port}\"")]
fn given_environment_override(harness: &Harness, port: String) {
    harness.set_port_env(&port);
}

#[when("the CLI sets the bind port to \"{port}\"")]
fn when_cli_override(harness: &Harness, port: String) {
    harness.push_cli_arg("--bind-port");
    harness.push_cli_arg(port);
}

#[when("the configuration loads without overrides")]
fn when_load_without_overrides(harness: &Harness) {
    harness.load();
}

#[then("loading the configuration resolves the bind port to \"{port}\"")]
fn then_resolved_port(harness: &Harness, port: String) {
    let config = harness.loaded_config();
    assert_eq!(config.bind_port(), parse_port(&port));
}

#[then("loading the configuration applies the built-in defaults")]
fn then_defaults_applied(harness: &Harness) {
    let config = harness.loaded_config();
    assert_eq!(config.bind_port(), default_bind_port());
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), default_log_format());
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Built-in defaults apply without overrides"
)]
fn defaults_apply(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Configuration file overrides the default port"
)]
fn file_overrides_defaults(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Environment overrides the configuration file"
)]
fn environment_overrides_file(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Command line overrides every other layer"
)]
fn cli_overrides_everything(#[from(harness)] harness: Harness) {
    let _ = harness;
}
