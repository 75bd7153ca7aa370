//! Debugger command backends for the MCP tool.
//!
//! [`ProcessCommandExecutor`] runs a debugger front end once per command and
//! returns its captured output. [`DetachedExecutor`] answers every call with
//! a failure so the endpoint stays usable when no debugger is configured.

use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

use dbgx_config::{COMMAND_PLACEHOLDER, Config};
use dbgx_mcp::{CommandExecutor, CommandOutcome};
use tracing::{debug, warn};

const EXECUTOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::executor");

/// Failure reported by [`DetachedExecutor`].
pub const DETACHED_MESSAGE: &str = "no debugger backend is configured";

/// Failure reported for an empty command.
pub const EMPTY_COMMAND_MESSAGE: &str = "Command cannot be empty";

/// Builds the executor described by `config`.
#[must_use]
pub fn executor_from_config(config: &Config) -> Arc<dyn CommandExecutor> {
    match config.debugger_program() {
        Some(program) => Arc::new(ProcessCommandExecutor::new(program, config.debugger_args())),
        None => Arc::new(DetachedExecutor),
    }
}

/// Executor used when no debugger program is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedExecutor;

impl CommandExecutor for DetachedExecutor {
    fn execute(&self, command: &str) -> CommandOutcome {
        debug!(target: EXECUTOR_TARGET, command, "rejecting command without a backend");
        CommandOutcome::failed(DETACHED_MESSAGE)
    }
}

/// Runs a debugger front end once per command.
///
/// Arguments containing `{command}` have it replaced with the command text;
/// when no argument carries the placeholder the command is appended as the
/// final argument. Calls are serialised, so at most one debugger process runs
/// at a time.
#[derive(Debug)]
pub struct ProcessCommandExecutor {
    program: String,
    args: Vec<String>,
    serial: Mutex<()>,
}

impl ProcessCommandExecutor {
    /// Creates an executor for `program` with argument template `args`.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            serial: Mutex::new(()),
        }
    }

    /// Program that will be spawned.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program for `command`.
    #[must_use]
    pub fn command_args(&self, command: &str) -> Vec<String> {
        if self.args.iter().any(|arg| arg.contains(COMMAND_PLACEHOLDER)) {
            return self
                .args
                .iter()
                .map(|arg| arg.replace(COMMAND_PLACEHOLDER, command))
                .collect();
        }
        let mut args = self.args.clone();
        args.push(command.to_owned());
        args
    }
}

impl CommandExecutor for ProcessCommandExecutor {
    fn execute(&self, command: &str) -> CommandOutcome {
        if command.is_empty() {
            return CommandOutcome::failed(EMPTY_COMMAND_MESSAGE);
        }

        let _serial = self
            .serial
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        debug!(
            target: EXECUTOR_TARGET,
            program = %self.program,
            command,
            "spawning debugger"
        );
        let output = match Command::new(&self.program)
            .args(self.command_args(command))
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) => output,
            Err(error) => {
                warn!(
                    target: EXECUTOR_TARGET,
                    program = %self.program,
                    %error,
                    "failed to spawn debugger"
                );
                return CommandOutcome::failed(format!(
                    "failed to launch debugger '{}': {error}",
                    self.program
                ));
            }
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        debug!(
            target: EXECUTOR_TARGET,
            status = %output.status,
            output_bytes = text.len(),
            "debugger finished"
        );

        if output.status.success() {
            CommandOutcome::succeeded(text)
        } else {
            CommandOutcome::failed(format!("debugger exited with {}", output.status))
                .with_output(text)
        }
    }
}
