//! Entry point for the dbgx host daemon.

use std::process::ExitCode;

fn main() -> ExitCode {
    match dbgxd::run_service() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(target: "dbgxd", %error, "host exited with an error");
            eprintln!("dbgxd: {error}");
            ExitCode::FAILURE
        }
    }
}
