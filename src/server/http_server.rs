use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

use may::coroutine::JoinHandle;
use may_minihttp::HttpService;
use tracing::info;

/// Typed wrapper around `may_minihttp::HttpServer`
pub struct HttpServer<T>(pub T);

/// Handle to a running HTTP server
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server is bound to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Poll the listening address until it accepts connections.
    ///
    /// # Errors
    ///
    /// `TimedOut` if the server is not accepting after ~250ms.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Cancel the accept loop and wait for it to finish
    pub fn stop(self) {
        // SAFETY: the handle is owned here and cancellation only unwinds the
        // server's own accept coroutine, which is joined right after.
        unsafe {
            self.handle.coroutine().cancel();
        }
        let _ = self.handle.join();
        info!(addr = %self.addr, "Server stopped");
    }

    /// Block until the server coroutine completes
    ///
    /// # Errors
    ///
    /// Returns the panic payload if the server coroutine panicked.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Bind `addr` and start serving.
    ///
    /// # Errors
    ///
    /// Fails if the address does not resolve or cannot be bound.
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
