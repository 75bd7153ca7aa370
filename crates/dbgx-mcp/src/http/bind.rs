//! Port selection with conflict fallback.

use std::io;
use std::net::{AddrParseError, IpAddr, SocketAddr, TcpListener};

use thiserror::Error;
use tracing::debug;

use super::HTTP_TARGET;

/// Port attempt budget used when none (or zero) is requested.
pub const DEFAULT_MAX_PORT_ATTEMPTS: u16 = 16;

/// Tunables for [`HttpServer::start`](super::HttpServer::start).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartOptions {
    /// Consecutive ports tried, starting at the requested one. Zero selects
    /// [`DEFAULT_MAX_PORT_ATTEMPTS`].
    pub max_port_attempts: u16,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            max_port_attempts: DEFAULT_MAX_PORT_ATTEMPTS,
        }
    }
}

impl StartOptions {
    /// Options with an explicit attempt budget.
    #[must_use]
    pub const fn with_max_port_attempts(max_port_attempts: u16) -> Self {
        Self { max_port_attempts }
    }

    const fn attempt_budget(self) -> u16 {
        if self.max_port_attempts == 0 {
            DEFAULT_MAX_PORT_ATTEMPTS
        } else {
            self.max_port_attempts
        }
    }
}

/// Diagnostics describing how a start call selected its port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartReport {
    /// Port the caller asked for.
    pub initial_port: u16,
    /// Last port a bind was attempted on.
    pub last_attempted_port: u16,
    /// Port actually bound; zero when binding failed.
    pub bound_port: u16,
    /// Number of bind attempts made.
    pub attempt_count: u16,
    /// Attempts that failed because the address was in use.
    pub conflict_count: u16,
    /// Whether the bound port differs from a non-zero requested port.
    pub fallback_used: bool,
    /// Whether every attempt failed with address-in-use.
    pub exhausted_conflicts: bool,
    /// Raw OS error code of the last failed attempt, zero when none.
    pub last_error_code: i32,
}

impl StartReport {
    pub(crate) const fn requested(port: u16) -> Self {
        Self {
            initial_port: port,
            last_attempted_port: 0,
            bound_port: 0,
            attempt_count: 0,
            conflict_count: 0,
            fallback_used: false,
            exhausted_conflicts: false,
            last_error_code: 0,
        }
    }
}

/// Errors returned by [`HttpServer::start`](super::HttpServer::start).
///
/// Every variant carries the [`StartReport`] gathered before the failure.
#[derive(Debug, Error)]
pub enum StartError {
    /// The server already has a running worker.
    #[error("server is already running")]
    AlreadyRunning {
        /// Report for the rejected call.
        report: StartReport,
    },
    /// The host is not a numeric IP address.
    #[error("invalid bind host '{host}': {source}")]
    InvalidHost {
        /// Host text supplied by the caller.
        host: String,
        /// Parse failure.
        #[source]
        source: AddrParseError,
        /// Report for the rejected call.
        report: StartReport,
    },
    /// Binding failed for a reason other than address-in-use.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address of the failed attempt.
        addr: SocketAddr,
        /// Underlying IO error.
        #[source]
        source: io::Error,
        /// Report up to and including the failed attempt.
        report: StartReport,
    },
    /// Every permitted port was unavailable.
    #[error(
        "failed to bind HTTP server starting at port {start_port} after {attempts} attempt(s){}",
        exhaustion_suffix(.report)
    )]
    PortsExhausted {
        /// First port tried.
        start_port: u16,
        /// Number of attempts made.
        attempts: u16,
        /// Final report.
        report: StartReport,
    },
    /// The bound listener could not be inspected or configured.
    #[error("failed to configure listener: {source}")]
    Configure {
        /// Underlying IO error.
        #[source]
        source: io::Error,
        /// Report describing the bound port.
        report: StartReport,
    },
    /// The worker thread could not be spawned.
    #[error("failed to spawn server worker: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
        /// Report describing the bound port.
        report: StartReport,
    },
}

impl StartError {
    /// Report gathered before the failure.
    #[must_use]
    pub const fn report(&self) -> &StartReport {
        match self {
            Self::AlreadyRunning { report }
            | Self::InvalidHost { report, .. }
            | Self::Bind { report, .. }
            | Self::PortsExhausted { report, .. }
            | Self::Configure { report, .. }
            | Self::Spawn { report, .. } => report,
        }
    }
}

const fn exhaustion_suffix(report: &StartReport) -> &'static str {
    if report.exhausted_conflicts {
        " (all attempts hit address-in-use)"
    } else {
        ""
    }
}

pub(crate) fn parse_host(host: &str, port: u16) -> Result<IpAddr, StartError> {
    host.parse::<IpAddr>()
        .map_err(|source| StartError::InvalidHost {
            host: host.to_owned(),
            source,
            report: StartReport::requested(port),
        })
}

/// Binds the first free port in `port..port + budget`.
///
/// Only address-in-use failures move on to the next port; any other error
/// ends the search. The range stops early rather than wrapping past 65535.
pub(crate) fn bind_with_retry(
    ip: IpAddr,
    port: u16,
    options: StartOptions,
) -> Result<(TcpListener, StartReport), StartError> {
    let mut report = StartReport::requested(port);

    for offset in 0..options.attempt_budget() {
        let Some(candidate) = port.checked_add(offset) else {
            break;
        };
        report.attempt_count += 1;
        report.last_attempted_port = candidate;

        let addr = SocketAddr::new(ip, candidate);
        match TcpListener::bind(addr) {
            Ok(listener) => {
                let bound = match listener.local_addr() {
                    Ok(local) => local.port(),
                    Err(source) => return Err(StartError::Configure { source, report }),
                };
                report.bound_port = bound;
                report.fallback_used = port != 0 && bound != port;
                return Ok((listener, report));
            }
            Err(error) if error.kind() == io::ErrorKind::AddrInUse => {
                report.conflict_count += 1;
                report.last_error_code = error.raw_os_error().unwrap_or_default();
                debug!(
                    target: HTTP_TARGET,
                    port = candidate,
                    attempt = report.attempt_count,
                    "port in use; trying next"
                );
            }
            Err(source) => {
                report.last_error_code = source.raw_os_error().unwrap_or_default();
                return Err(StartError::Bind {
                    addr,
                    source,
                    report,
                });
            }
        }
    }

    report.exhausted_conflicts =
        report.conflict_count > 0 && report.conflict_count == report.attempt_count;
    Err(StartError::PortsExhausted {
        start_port: port,
        attempts: report.attempt_count,
        report,
    })
}
