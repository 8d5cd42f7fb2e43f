//! Listener lifecycle for a [`Router`] served over `may_minihttp`.

use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};

use may::coroutine::JoinHandle;
use tracing::{debug, info};

use super::service::AppService;
use crate::router::Router;
use crate::runtime_config::ServiceConfig;

const READY_TIMEOUT: Duration = Duration::from_secs(1);
const READY_PROBE: Duration = Duration::from_millis(50);

/// Router plus transport limits, ready to bind.
#[derive(Clone)]
pub struct HttpServer {
    service: AppService,
}

impl HttpServer {
    /// Serve `router` with the default body limit.
    #[must_use]
    pub fn new(router: Arc<Router>) -> Self {
        Self {
            service: AppService::new(router),
        }
    }

    /// Serve `router` with the limits from a loaded service config.
    #[must_use]
    pub fn from_config(router: Arc<Router>, config: &ServiceConfig) -> Self {
        Self::new(router).with_max_body_bytes(config.http.max_body_bytes)
    }

    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.service = self.service.with_max_body_bytes(max_body_bytes);
        self
    }

    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.service.router
    }

    /// Bind `addr` and start accepting in a coroutine.
    ///
    /// # Errors
    ///
    /// The address does not resolve, or the port cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing")
        })?;
        let routes = self.service.router.len();
        let max_body_bytes = self.service.max_body_bytes;

        let handle = may_minihttp::HttpServer(self.service).start(addr)?;
        info!(
            addr = %addr,
            routes = routes,
            max_body_bytes = max_body_bytes,
            "Router listening"
        );
        Ok(ServerHandle { addr, handle })
    }

    /// [`HttpServer::start`] on the address named by the config.
    ///
    /// # Errors
    ///
    /// See [`HttpServer::start`].
    pub fn start_with(router: Arc<Router>, config: &ServiceConfig) -> io::Result<ServerHandle> {
        Self::from_config(router, config).start(config.addr.as_str())
    }
}

/// A running listener.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until the listener accepts a connection.
    ///
    /// # Errors
    ///
    /// The last connect error once the readiness deadline has passed.
    pub fn wait_ready(&self) -> io::Result<()> {
        let deadline = Instant::now() + READY_TIMEOUT;
        loop {
            match TcpStream::connect_timeout(&self.addr, READY_PROBE) {
                Ok(_) => {
                    debug!(addr = %self.addr, "Listener ready");
                    return Ok(());
                }
                Err(e) if Instant::now() >= deadline => return Err(e),
                Err(_) => std::thread::sleep(Duration::from_millis(5)),
            }
        }
    }

    /// Cancel the accept coroutine and wait for it to unwind.
    pub fn shutdown(self) {
        // SAFETY: the accept coroutine is owned by this handle and nothing else joins it.
        unsafe { self.handle.coroutine().cancel() };
        let _ = self.handle.join();
        info!(addr = %self.addr, "Router listener shut down");
    }

    /// Block until the accept coroutine exits on its own.
    ///
    /// # Errors
    ///
    /// The coroutine panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}
