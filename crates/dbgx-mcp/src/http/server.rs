//! Lifecycle and accept loop for the single-worker HTTP server.

use std::io;
use std::net::{Shutdown, TcpListener, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::HTTP_TARGET;
use super::bind::{StartError, StartOptions, StartReport, bind_with_retry, parse_host};
use super::framing::read_request;
use super::message::{HttpRequest, HttpResponse};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Produces a response for one framed request.
pub trait RequestHandler: Send + Sync {
    /// Handles `request`. Called on the server's worker thread, one request
    /// at a time.
    fn handle(&self, request: &HttpRequest) -> HttpResponse;
}

impl<F> RequestHandler for F
where
    F: Fn(&HttpRequest) -> HttpResponse + Send + Sync,
{
    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        self(request)
    }
}

/// Loopback HTTP server serving one request per connection on a single
/// background worker.
///
/// Start and stop are serialised by an internal lock; dropping the server
/// stops it.
#[derive(Debug, Default)]
pub struct HttpServer {
    state: Mutex<Option<Worker>>,
}

#[derive(Debug)]
struct Worker {
    shutdown: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
    bound_port: u16,
}

impl HttpServer {
    /// Creates a stopped server.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(None),
        }
    }

    /// Binds `host` starting at `port` and starts the worker.
    ///
    /// `host` must be a numeric IP address. When `port` is in use the next
    /// ports are tried, up to `options.max_port_attempts` in total. Port 0
    /// lets the operating system choose.
    ///
    /// # Errors
    ///
    /// Returns [`StartError`] when the server is already running, the host is
    /// not numeric, binding fails, or the worker cannot be spawned. The error
    /// carries the [`StartReport`] gathered so far.
    pub fn start(
        &self,
        host: &str,
        port: u16,
        handler: Arc<dyn RequestHandler>,
        options: StartOptions,
    ) -> Result<StartReport, StartError> {
        let mut state = self.lock_state();
        reap_finished(&mut state);
        if state.is_some() {
            return Err(StartError::AlreadyRunning {
                report: StartReport::requested(port),
            });
        }

        let ip = parse_host(host, port)?;
        let (listener, report) = bind_with_retry(ip, port, options)?;
        if let Err(source) = listener.set_nonblocking(true) {
            return Err(StartError::Configure { source, report });
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));
        let worker_shutdown = Arc::clone(&shutdown);
        let worker_running = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("dbgx-http".to_owned())
            .spawn(move || run_worker(listener, &worker_shutdown, &worker_running, handler.as_ref()))
            .map_err(|source| StartError::Spawn { source, report })?;

        info!(
            target: HTTP_TARGET,
            host,
            requested_port = report.initial_port,
            bound_port = report.bound_port,
            attempts = report.attempt_count,
            conflicts = report.conflict_count,
            fallback_used = report.fallback_used,
            "http server listening"
        );
        *state = Some(Worker {
            shutdown,
            running,
            handle,
            bound_port: report.bound_port,
        });
        Ok(report)
    }

    /// Stops the worker and releases the listening socket.
    ///
    /// Blocks until the worker exits. Calling this on a stopped server does
    /// nothing.
    pub fn stop(&self) {
        let mut state = self.lock_state();
        let Some(worker) = state.take() else {
            return;
        };
        worker.shutdown.store(true, Ordering::SeqCst);
        if worker.handle.join().is_err() {
            warn!(target: HTTP_TARGET, "http worker panicked");
        }
        info!(target: HTTP_TARGET, port = worker.bound_port, "http server stopped");
    }

    /// Reports whether the worker is serving connections.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lock_state()
            .as_ref()
            .is_some_and(|worker| worker.running.load(Ordering::SeqCst))
    }

    /// Port the running server is bound to.
    #[must_use]
    pub fn bound_port(&self) -> Option<u16> {
        self.lock_state()
            .as_ref()
            .filter(|worker| worker.running.load(Ordering::SeqCst))
            .map(|worker| worker.bound_port)
    }

    fn lock_state(&self) -> MutexGuard<'_, Option<Worker>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Joins a worker that exited on its own so the server can start again.
fn reap_finished(state: &mut Option<Worker>) {
    if state
        .as_ref()
        .is_some_and(|worker| !worker.running.load(Ordering::SeqCst))
        && let Some(worker) = state.take()
        && worker.handle.join().is_err()
    {
        warn!(target: HTTP_TARGET, "http worker panicked");
    }
}

fn run_worker(
    listener: TcpListener,
    shutdown: &AtomicBool,
    running: &AtomicBool,
    handler: &dyn RequestHandler,
) {
    for stream in Acceptor::new(listener, shutdown) {
        serve_connection(stream, handler);
    }
    running.store(false, Ordering::SeqCst);
    debug!(target: HTTP_TARGET, "http worker exited");
}

/// Yields accepted connections until shutdown is requested.
///
/// The listener is non-blocking; idle polls sleep for a short back-off so the
/// shutdown flag is observed promptly. Dropping the acceptor closes the
/// listening socket.
struct Acceptor<'a> {
    listener: TcpListener,
    shutdown: &'a AtomicBool,
    last_error: Option<io::ErrorKind>,
}

impl<'a> Acceptor<'a> {
    const fn new(listener: TcpListener, shutdown: &'a AtomicBool) -> Self {
        Self {
            listener,
            shutdown,
            last_error: None,
        }
    }
}

impl Iterator for Acceptor<'_> {
    type Item = TcpStream;

    fn next(&mut self) -> Option<TcpStream> {
        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    self.last_error = None;
                    if let Err(error) = stream.set_nonblocking(false) {
                        warn!(target: HTTP_TARGET, %peer, %error, "failed to configure connection");
                        continue;
                    }
                    debug!(target: HTTP_TARGET, %peer, "connection accepted");
                    return Some(stream);
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_BACKOFF);
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => {
                    let kind = error.kind();
                    if self.last_error != Some(kind) {
                        warn!(target: HTTP_TARGET, %error, "accept failed");
                    }
                    self.last_error = Some(kind);
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }
        None
    }
}

/// Frames one request, runs the handler, and writes the response.
fn serve_connection(mut stream: TcpStream, handler: &dyn RequestHandler) {
    let response = match read_request(&mut stream) {
        Ok(Some(request)) => {
            debug!(
                target: HTTP_TARGET,
                method = request.method(),
                path = request.path(),
                body_bytes = request.body().len(),
                "request received"
            );
            invoke_handler(handler, &request)
        }
        Ok(None) => {
            debug!(target: HTTP_TARGET, "client disconnected without request");
            return;
        }
        Err(error) => {
            warn!(target: HTTP_TARGET, %error, "rejecting malformed request");
            HttpResponse::error(400, &error.to_string())
        }
    };

    if let Err(error) = response.write_to(&mut stream) {
        warn!(target: HTTP_TARGET, %error, status = response.status, "failed to write response");
        return;
    }
    if let Err(error) = stream.shutdown(Shutdown::Write) {
        debug!(target: HTTP_TARGET, %error, "failed to half-close connection");
    }
}

fn invoke_handler(handler: &dyn RequestHandler, request: &HttpRequest) -> HttpResponse {
    panic::catch_unwind(AssertUnwindSafe(|| handler.handle(request))).unwrap_or_else(|_| {
        warn!(target: HTTP_TARGET, path = request.path(), "request handler panicked");
        HttpResponse::error(500, "Internal Server Error")
    })
}
