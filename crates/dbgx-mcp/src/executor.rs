//! Seam between the router and whatever actually runs debugger commands.

/// Result of executing one debugger command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Whether the command completed successfully.
    pub success: bool,
    /// Text the command produced.
    pub output: String,
    /// Failure description; empty on success.
    pub error_message: String,
}

impl CommandOutcome {
    /// Builds a successful outcome carrying `output`.
    #[must_use]
    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error_message: String::new(),
        }
    }

    /// Builds a failed outcome with no captured output.
    #[must_use]
    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error_message: error_message.into(),
        }
    }

    /// Attaches output captured before the failure.
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }
}

/// Runs one debugger command and reports its textual result.
///
/// Implementations are not required to be re-entrant; the server invokes the
/// executor from a single worker and the router calls it at most once per
/// request.
pub trait CommandExecutor: Send + Sync {
    /// Executes `command` and returns its outcome.
    fn execute(&self, command: &str) -> CommandOutcome;
}
