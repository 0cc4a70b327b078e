use may::coroutine::JoinHandle;
use may_minihttp::HttpService;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// How long [`ServerHandle::wait_ready`] waits for the listener.
pub const READY_TIMEOUT: Duration = Duration::from_millis(500);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// An HTTP server around a `may_minihttp` service.
pub struct HttpServer<T>(pub T);

/// A running server.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until the listener accepts connections.
    ///
    /// # Errors
    ///
    /// `TimedOut` after [`READY_TIMEOUT`].
    pub fn wait_ready(&self) -> io::Result<()> {
        let deadline = Instant::now() + READY_TIMEOUT;
        while Instant::now() < deadline {
            if TcpStream::connect(self.addr).is_ok() {
                debug!(addr = %self.addr, "Server accepting connections");
                return Ok(());
            }
            thread::sleep(READY_POLL_INTERVAL);
        }
        Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("server on {} not ready", self.addr),
        ))
    }

    /// Cancel the accept loop and wait for it to end.
    pub fn stop(self) {
        // SAFETY: the handle is owned here and the coroutine is not touched
        // again after cancellation.
        unsafe {
            self.handle.coroutine().cancel();
        }
        let _ = self.handle.join();
        info!(addr = %self.addr, "Server stopped");
    }

    /// Wait for the server to end on its own.
    ///
    /// # Errors
    ///
    /// The server coroutine panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Bind `addr` and start accepting.
    ///
    /// # Errors
    ///
    /// The address does not resolve or cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let handle = may_minihttp::HttpServer(self.0).start(addr)?;
        info!(addr = %addr, "Server listening");
        Ok(ServerHandle { addr, handle })
    }
}
