//! Local preview server.
//!
//! Serves the output root statically, plus two generated endpoints:
//!
//! - `/who/<app>`: JSON manifest of the bundles an application page loads
//! - `/define_patch.js`: runtime patch dropping the host's empty template stubs
//!
//! Requests are handled on a small thread pool; the accept loop polls its
//! cancellation token so [`ServerHandle::stop`] and Ctrl+C both end it.

mod manifest;
mod patch;
mod path;
mod response;

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{Context, Result};
use tiny_http::{Method, Request, Server};
use tokio_util::sync::CancellationToken;

pub use manifest::{WHO_PREFIX, manifest};
pub use patch::{DEFINE_PATCH_PATH, define_patch};

use crate::log;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// How often the accept loop checks for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Request handler threads.
const WORKERS: usize = 4;

/// Bind to the specified interface and port, with automatic port retry.
///
/// Returns the address actually bound, so port `0` resolves to the
/// ephemeral port the OS picked.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                let bound = server.server_addr().to_ip().unwrap_or(addr);
                return Ok((server, bound));
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Server configuration, not yet bound.
#[derive(Debug, Clone)]
pub struct LocalServer {
    output_root: PathBuf,
    interface: IpAddr,
    port: u16,
}

/// State shared by request handlers.
struct ServeState {
    output_root: PathBuf,
    addr: SocketAddr,
    token: CancellationToken,
}

impl LocalServer {
    pub fn new(output_root: impl Into<PathBuf>, interface: IpAddr, port: u16) -> Self {
        Self {
            output_root: output_root.into(),
            interface,
            port,
        }
    }

    /// Bind and start accepting requests on a background thread.
    pub fn start(self) -> Result<ServerHandle> {
        let (server, addr) = bind_with_retry(self.interface, self.port)?;
        let server = Arc::new(server);
        let token = CancellationToken::new();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(WORKERS)
            .thread_name(|i| format!("vitrine-http-{i}"))
            .build()
            .context("failed to create request thread pool")?;

        let state = Arc::new(ServeState {
            output_root: self.output_root,
            addr,
            token: token.clone(),
        });

        let thread = thread::Builder::new()
            .name("vitrine-serve".into())
            .spawn({
                let server = Arc::clone(&server);
                move || run_request_loop(&server, &pool, &state)
            })
            .context("failed to spawn server thread")?;

        log!("serve"; "http://{}", addr);
        Ok(ServerHandle {
            addr,
            token,
            server,
            thread,
        })
    }
}

/// A running server.
pub struct ServerHandle {
    addr: SocketAddr,
    token: CancellationToken,
    server: Arc<Server>,
    thread: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server is bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Token whose cancellation stops the server.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stop accepting requests and wait for the accept loop to exit.
    pub fn stop(self) {
        self.token.cancel();
        self.server.unblock();
        self.wait();
    }

    /// Block until the server stops (its token is cancelled).
    pub fn wait(self) {
        if self.thread.join().is_err() {
            log!("serve"; "server thread panicked");
        }
        crate::debug!("serve"; "stopped");
    }
}

fn run_request_loop(server: &Server, pool: &rayon::ThreadPool, state: &Arc<ServeState>) {
    while !state.token.is_cancelled() {
        match server.recv_timeout(POLL_INTERVAL) {
            Ok(Some(request)) => {
                let state = Arc::clone(state);
                pool.spawn(move || {
                    if let Err(e) = handle_request(request, &state) {
                        log!("serve"; "request error: {e}");
                    }
                });
            }
            Ok(None) => {}
            Err(e) => {
                if !state.token.is_cancelled() {
                    log!("serve"; "accept error: {e}");
                }
                break;
            }
        }
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, state: &ServeState) -> Result<()> {
    if crate::core::is_shutdown() || state.token.is_cancelled() {
        return response::respond_unavailable(request);
    }

    match request.method() {
        Method::Get | Method::Head => {}
        Method::Options => return response::respond_preflight(request),
        _ => return response::respond_method_not_allowed(request),
    }

    let path = path::request_path(request.url());
    crate::debug!("serve"; "{} {}", request.method(), path);

    if path == DEFINE_PATCH_PATH {
        return response::respond_script(request, define_patch());
    }

    if path.starts_with(WHO_PREFIX) {
        let Some(app) = manifest::requested_app(&path) else {
            return response::respond_not_found(request);
        };
        let host = response::header_value(&request, "Host");
        let base = manifest::base_url(host.as_deref(), state.addr);
        return response::respond_json(request, &manifest(app, &base));
    }

    if let Some(file) = path::resolve_path(request.url(), &state.output_root) {
        return response::respond_file(request, &file);
    }

    response::respond_not_found(request)
}
